//! Extract command - run one document through the profile pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use docex_core::read_document;

use super::load_pipeline;
use super::output::{render, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input document (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Output values as matched, before formatting
    #[arg(long)]
    raw: bool,

    /// Report which profiles were selected
    #[arg(long)]
    show_profile: bool,
}

pub async fn run(args: ExtractArgs, config_path: Option<&Path>) -> anyhow::Result<()> {
    let start = Instant::now();

    let pipeline = load_pipeline(config_path)?;

    // Check input file exists
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );

    pb.set_message("Reading document...");
    let text = read_document(&args.input)?;
    if text.trim().is_empty() {
        pb.finish_and_clear();
        anyhow::bail!("No text extracted from {}", args.input.display());
    }

    pb.set_message("Extracting entities...");
    let processed = pipeline.process(&text);
    pb.finish_and_clear();
    let processed = processed?;

    let extraction = if args.raw {
        &processed.raw
    } else {
        &processed.formatted
    };
    let output = render(extraction, args.format)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_profile {
        eprintln!(
            "{} Extractor profile: {}",
            style("ℹ").blue(),
            processed.extractor
        );
        eprintln!(
            "{} Formatter profile: {}",
            style("ℹ").blue(),
            processed.formatter
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
