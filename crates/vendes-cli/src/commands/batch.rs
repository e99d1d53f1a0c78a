//! Batch processing command for multiple sales reports.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, warn};

use vendes_core::models::config::VendesConfig;
use vendes_core::sales::format_decimal;
use vendes_core::SummaryTable;

use super::{is_supported, load_config, run_document, BackendSource};
use crate::export::{write_outputs, ExportPaths};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory (default: from config)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of documents processed at once
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Use a saved backend reply for every document
    #[arg(long)]
    replay: Option<PathBuf>,
}

/// Outcome of one document.
struct ProcessResult {
    path: PathBuf,
    outcome: Result<Processed, String>,
    processing_time_ms: u64,
}

struct Processed {
    records: usize,
    summary: Option<SummaryTable>,
    paths: ExportPaths,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = Arc::new(load_config(config_path)?);

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| is_supported(p))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let output_dir = Arc::new(args.output_dir.clone().unwrap_or_else(|| config.output.dir.clone()));
    let source = Arc::new(BackendSource::from_args(&config, args.replay.as_deref())?);

    let multi_progress = MultiProgress::new();
    let overall_pb = multi_progress.add(ProgressBar::new(files.len() as u64));
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let stems = output_stems(&files);
    let semaphore = Arc::new(Semaphore::new(args.jobs.max(1)));
    let cancelled = Arc::new(AtomicBool::new(false));
    let mut tasks = JoinSet::new();

    for (index, (path, stem)) in files.into_iter().zip(stems).enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let config = Arc::clone(&config);
        let source = Arc::clone(&source);
        let output_dir = Arc::clone(&output_dir);
        let cancelled = Arc::clone(&cancelled);

        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let file_start = Instant::now();

            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || {
                process_single_file(&task_path, &stem, &source, &config, &output_dir, &cancelled)
            })
            .await
            .map_err(anyhow::Error::from)
            .and_then(|r| r)
            .map_err(|e| e.to_string());

            let result = ProcessResult {
                path,
                outcome,
                processing_time_ms: file_start.elapsed().as_millis() as u64,
            };
            (index, result)
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined?;
        overall_pb.inc(1);

        if let Err(message) = &result.outcome {
            if args.continue_on_error {
                warn!("Failed to process {}: {}", result.path.display(), message);
            } else {
                error!("Failed to process {}: {}", result.path.display(), message);
                // Running documents finish extraction but write nothing
                cancelled.store(true, Ordering::SeqCst);
                tasks.abort_all();
                overall_pb.abandon();
                anyhow::bail!("Processing failed for {}: {}", result.path.display(), message);
            }
        }

        results.push((index, result));
    }

    overall_pb.finish_with_message("Complete");

    results.sort_by_key(|(index, _)| *index);
    let results: Vec<ProcessResult> = results.into_iter().map(|(_, r)| r).collect();

    let report_path = output_dir.join("batch_report.csv");
    write_report(&report_path, &results)?;

    let failed: Vec<_> = results.iter().filter(|r| r.outcome.is_err()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );
    println!(
        "{} Report written to {}",
        style("✓").green(),
        report_path.display()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            if let Err(message) = &result.outcome {
                println!("  - {}: {}", result.path.display(), message);
            }
        }
    }

    Ok(())
}

/// File name stem per input, unique within the batch.
///
/// Inputs sharing a stem keep their extension (`march_txt`), and any
/// remaining clash gets a numeric suffix (`march_txt_2`).
fn output_stems(files: &[PathBuf]) -> Vec<String> {
    let stem_of = |path: &PathBuf| {
        path.file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("report")
            .to_string()
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in files {
        *counts.entry(stem_of(path)).or_default() += 1;
    }

    let mut taken = HashSet::new();
    files
        .iter()
        .map(|path| {
            let stem = stem_of(path);
            let base = match path.extension().and_then(|e| e.to_str()) {
                Some(ext) if counts[&stem] > 1 => format!("{}_{}", stem, ext.to_lowercase()),
                _ => stem,
            };

            let mut candidate = base.clone();
            let mut n = 2;
            while !taken.insert(candidate.clone()) {
                candidate = format!("{}_{}", base, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

fn process_single_file(
    path: &Path,
    stem: &str,
    source: &BackendSource,
    config: &VendesConfig,
    output_dir: &Path,
    cancelled: &AtomicBool,
) -> anyhow::Result<Processed> {
    let output = run_document(path, source, config, true)?;

    if cancelled.load(Ordering::SeqCst) {
        anyhow::bail!("batch cancelled before {} was written", path.display());
    }

    let paths = write_outputs(output_dir, &config.output, &output, Some(stem))?;
    debug!("Wrote outputs for {}", path.display());

    Ok(Processed {
        records: output.records.len(),
        summary: output.summary,
        paths,
    })
}

fn write_report(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "records",
        "categories",
        "totals",
        "summary_file",
        "processing_time_ms",
        "error",
    ])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.outcome {
            Ok(processed) => {
                let totals = processed
                    .summary
                    .as_ref()
                    .map(|summary| {
                        summary
                            .total()
                            .values
                            .iter()
                            .map(|v| format_decimal(*v))
                            .collect::<Vec<_>>()
                            .join(" / ")
                    })
                    .unwrap_or_default();
                let categories = processed
                    .summary
                    .as_ref()
                    .map(|summary| summary.category_rows().len().to_string())
                    .unwrap_or_default();
                let summary_file = processed
                    .paths
                    .summary
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default();

                wtr.write_record([
                    filename,
                    "success",
                    &processed.records.to_string(),
                    &categories,
                    &totals,
                    &summary_file,
                    &result.processing_time_ms.to_string(),
                    "",
                ])?;
            }
            Err(message) => {
                wtr.write_record([
                    filename,
                    "error",
                    "",
                    "",
                    "",
                    "",
                    &result.processing_time_ms.to_string(),
                    message,
                ])?;
            }
        }
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const REPLY: &str = r#"[{"Article": "1", "Descripció": "VISITA", "Quantitat": "2 U", "Import": "20,00", "Cost": "0,00", "% Marge": "100,00"}]"#;

    #[test]
    fn test_output_stems_unique() {
        let files: Vec<PathBuf> = ["in/march.txt", "in/march.text", "in/april.pdf", "other/march.txt"]
            .iter()
            .map(PathBuf::from)
            .collect();

        assert_eq!(
            output_stems(&files),
            vec!["march_txt", "march_text", "april", "march_txt_2"]
        );
    }

    #[test]
    fn test_output_stems_keep_plain_stem_without_clash() {
        let files = vec![PathBuf::from("a/march.pdf"), PathBuf::from("a/april.pdf")];
        assert_eq!(output_stems(&files), vec!["march", "april"]);
    }

    #[test]
    fn test_cancelled_batch_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("march.txt");
        let reply = dir.path().join("reply.json");
        fs::write(&input, "1 VISITA 2 U 20,00").unwrap();
        fs::write(&reply, REPLY).unwrap();

        let source = BackendSource::Replay(reply);
        let config = VendesConfig::default();
        let out = dir.path().join("out");

        let cancelled = AtomicBool::new(true);
        let err = process_single_file(&input, "march", &source, &config, &out, &cancelled)
            .err()
            .unwrap();
        assert!(err.to_string().contains("cancelled"));
        assert!(!out.join("march_articles.csv").exists());

        let running = AtomicBool::new(false);
        let processed = process_single_file(&input, "march", &source, &config, &out, &running).unwrap();
        assert_eq!(processed.records, 1);
        assert!(out.join("march_articles.csv").exists());
    }
}
