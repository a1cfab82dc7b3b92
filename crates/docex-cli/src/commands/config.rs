//! Config command - manage the profile file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use docex_core::{read_document, DocexConfig};

use super::resolve_config_path;

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the current profile file
    Show,

    /// Write a sample profile file
    Init(InitArgs),

    /// Show profile file path
    Path,

    /// Validate the profile file, optionally reporting the profiles a
    /// document would select
    Check {
        /// Document to run profile selection against
        document: Option<PathBuf>,
    },
}

#[derive(Args)]
struct InitArgs {
    /// Output path for the profile file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

pub async fn run(args: ConfigArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let path = resolve_config_path(config_path);
    match args.command {
        ConfigCommand::Show => show_config(&path),
        ConfigCommand::Init(init_args) => init_config(init_args, &path),
        ConfigCommand::Path => show_path(&path),
        ConfigCommand::Check { document } => check_config(&path, document.as_deref()),
    }
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    let config = if path.exists() {
        DocexConfig::from_file(path)?
    } else {
        println!(
            "{} No profile file found, showing the sample.",
            style("ℹ").blue()
        );
        DocexConfig::sample()
    };

    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(args: InitArgs, default_path: &Path) -> anyhow::Result<()> {
    let output_path = args.output.unwrap_or_else(|| default_path.to_path_buf());

    if output_path.exists() && !args.force {
        anyhow::bail!(
            "Profile file already exists at {}. Use --force to overwrite.",
            output_path.display()
        );
    }

    // Create parent directory if needed
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    DocexConfig::sample().save(&output_path)?;

    println!(
        "{} Created profile file at {}",
        style("✓").green(),
        output_path.display()
    );

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Profile file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'docex config init' to create a profile file.");
    }

    Ok(())
}

fn check_config(path: &Path, document: Option<&Path>) -> anyhow::Result<()> {
    let config = DocexConfig::from_file(path)?;
    let pipeline = config.build_pipeline()?;

    println!(
        "{} {} profiles valid (default: {})",
        style("✓").green(),
        config.profiles.len(),
        pipeline.extractors().default_profile().name()
    );

    if let Some(document) = document {
        let text = read_document(document)?;
        println!(
            "Extractor profile: {}",
            pipeline.extractors().select(&text).name()
        );
        println!(
            "Formatter profile: {}",
            pipeline.formatters().select(&text).name()
        );
    }

    Ok(())
}
