//! Export of records and summaries to CSV, JSON and plain text.

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use tracing::debug;

use vendes_core::models::config::OutputConfig;
use vendes_core::models::record::columns;
use vendes_core::sales::format_decimal;
use vendes_core::{PipelineOutput, SalesLineRecord, SummaryTable};

/// Files written for one document.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub records: PathBuf,
    pub summary: Option<PathBuf>,
}

/// `<prefix>_<timestamp>.csv`, e.g. `articles_20250314_101500.csv`.
pub fn timestamped_name(prefix: &str, timestamp_format: &str, now: DateTime<Local>) -> String {
    format!("{}_{}.csv", prefix, now.format(timestamp_format))
}

/// Write records as CSV: the six source columns, then any extra columns.
pub fn write_records_csv<W: Write>(writer: W, records: &[SalesLineRecord]) -> anyhow::Result<()> {
    let extra: BTreeSet<&str> = records
        .iter()
        .flat_map(|r| r.extra.keys().map(String::as_str))
        .collect();

    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(columns::ALL.iter().copied().chain(extra.iter().copied()))?;

    for record in records {
        let row = columns::ALL
            .iter()
            .chain(extra.iter())
            .map(|column| record.column(column).unwrap_or(""));
        wtr.write_record(row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write a summary table as CSV, numbers with a decimal comma.
pub fn write_summary_csv<W: Write>(writer: W, table: &SummaryTable) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.headers())?;

    for row in table.rows() {
        let values = row.values.iter().map(|v| format_decimal(*v));
        wtr.write_record(std::iter::once(row.category.clone()).chain(values))?;
    }

    wtr.flush()?;
    Ok(())
}

/// Write `content` next to `path` first, then move it into place.
fn write_atomic(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let tmp = path.with_extension("csv.part");
    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    debug!("Wrote {}", path.display());
    Ok(())
}

fn to_bytes(write: impl FnOnce(&mut Vec<u8>) -> anyhow::Result<()>) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    write(&mut buf)?;
    Ok(buf)
}

/// Write the record CSV of one document into `dir`, and the summary CSV
/// when the run produced one.
///
/// With a `stem`, files are named `<stem>_<prefix>.csv`; otherwise they
/// carry the current timestamp.
pub fn write_outputs(
    dir: &Path,
    config: &OutputConfig,
    output: &PipelineOutput,
    stem: Option<&str>,
) -> anyhow::Result<ExportPaths> {
    fs::create_dir_all(dir)?;

    let now = Local::now();
    let name = |prefix: &str| match stem {
        Some(stem) => format!("{}_{}.csv", stem, prefix),
        None => timestamped_name(prefix, &config.timestamp_format, now),
    };

    // Render everything before touching the directory
    let records = to_bytes(|buf| write_records_csv(buf, &output.records))?;
    let summary = match &output.summary {
        Some(table) => Some(to_bytes(|buf| write_summary_csv(buf, table))?),
        None => None,
    };

    let records_path = dir.join(name(&config.records_prefix));
    write_atomic(&records_path, &records)?;

    let summary_path = match summary {
        Some(content) => {
            let path = dir.join(name(&config.summary_prefix));
            write_atomic(&path, &content)?;
            Some(path)
        }
        None => None,
    };

    Ok(ExportPaths {
        records: records_path,
        summary: summary_path,
    })
}

/// Plain text rendering: record list followed by the summary table.
pub fn format_text(output: &PipelineOutput) -> String {
    let mut text = String::new();

    text.push_str(&format!("Sales lines: {}\n", output.records.len()));
    for classified in &output.classified {
        let r = &classified.record;
        text.push_str(&format!(
            "  {:<8} {:<40} {:>8} {:>12} {:>12} {:>8}  [{}]\n",
            r.article_code,
            r.description,
            r.quantity,
            r.import_amount,
            r.cost_amount,
            r.margin_percent,
            classified.category
        ));
    }

    if let Some(table) = &output.summary {
        text.push('\n');
        text.push_str("Summary:\n");
        let headers = table.headers();
        text.push_str(&format!("  {:<36}", headers[0]));
        for header in &headers[1..] {
            text.push_str(&format!(" {:>12}", header));
        }
        text.push('\n');

        for row in table.rows() {
            text.push_str(&format!("  {:<36}", row.category));
            for value in &row.values {
                text.push_str(&format!(" {:>12}", format_decimal(*value)));
            }
            text.push('\n');
        }
    }

    text
}
