//! CLI subcommands and the helpers they share.

pub mod batch;
pub mod config;
pub mod extract;
pub mod output;

use std::path::{Path, PathBuf};

use tracing::debug;

use docex_core::{DocexConfig, Pipeline};

/// Default profile file location.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docex")
        .join("profiles.json")
}

/// Resolve the profile file: the `--config` flag, else the default location.
pub fn resolve_config_path(config_path: Option<&Path>) -> PathBuf {
    config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(default_config_path)
}

/// Load the profile file and build its pipeline.
pub fn load_pipeline(config_path: Option<&Path>) -> anyhow::Result<Pipeline> {
    let path = resolve_config_path(config_path);
    if !path.exists() {
        anyhow::bail!(
            "Profile file not found at {}. Run 'docex config init' to create one.",
            path.display()
        );
    }

    let config = DocexConfig::from_file(&path)?;
    let pipeline = config.build_pipeline()?;
    debug!("Loaded {} profiles from {}", config.profiles.len(), path.display());

    Ok(pipeline)
}
