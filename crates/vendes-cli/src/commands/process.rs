//! Process command - extract and summarize a single sales report.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use vendes_core::VendesError;

use super::{load_config, run_document, BackendSource};
use crate::export::{format_text, write_outputs};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or extracted text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output directory for CSV files (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Skip the per-category summary
    #[arg(long)]
    no_summary: bool,

    /// Use a saved backend reply instead of calling the service
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Save the backend reply to this file
    #[arg(long)]
    save_reply: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// CSV files in the output directory
    Csv,
    /// JSON on stdout
    Json,
    /// Plain text tables on stdout
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let source = BackendSource::from_args(&config, args.replay.as_deref())?;

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.set_message("Extracting sales lines...");
    pb.enable_steady_tick(Duration::from_millis(120));

    let input = args.input.clone();
    let task_config = config.clone();
    let with_summary = !args.no_summary;
    let result = tokio::task::spawn_blocking(move || {
        run_document(&input, &source, &task_config, with_summary)
    })
    .await?;

    pb.finish_and_clear();

    let output = match result {
        Ok(output) => output,
        Err(e) => {
            if let Some(VendesError::ResponseFormat(format_err)) = e.downcast_ref::<VendesError>() {
                eprintln!("{}", style("Backend reply could not be parsed:").red());
                eprintln!("{}", format_err.raw_text());
                if let Some(path) = &args.save_reply {
                    fs::write(path, format_err.raw_text())?;
                }
            }
            return Err(e);
        }
    };

    if let Some(path) = &args.save_reply {
        fs::write(path, &output.raw_reply)?;
        debug!("Saved backend reply to {}", path.display());
    }

    match args.format {
        OutputFormat::Csv => {
            let dir = args.output_dir.as_ref().unwrap_or(&config.output.dir);
            let paths = write_outputs(dir, &config.output, &output, None)?;

            println!(
                "{} {} sales lines written to {}",
                style("✓").green(),
                output.records.len(),
                paths.records.display()
            );
            if let Some(summary) = &paths.summary {
                println!(
                    "{} Summary written to {}",
                    style("✓").green(),
                    summary.display()
                );
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormat::Text => print!("{}", format_text(&output)),
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
