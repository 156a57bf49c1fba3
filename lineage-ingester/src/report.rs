//! Rendering of batch summaries for the terminal and for files.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::*;
use lineage_shared::{BatchSummary, OutcomeState};

/// How the summary is printed on stdout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

pub fn render(summary: &BatchSummary, template: &str, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(summary, template)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(summary).context("Failed to serialise summary")
        }
    }
}

/// Write the JSON summary to `path`.
pub fn write_json(summary: &BatchSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary).context("Failed to serialise summary")?;
    fs::write(path, json).with_context(|| format!("Failed to write report to {:?}", path))
}

pub fn render_text(summary: &BatchSummary, template: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    lines.push("=".repeat(80));
    lines.push(format!("INGESTION RESULTS: {}", template.to_uppercase()));
    lines.push("=".repeat(80));
    lines.push(String::new());

    let elapsed = summary.finished_at - summary.started_at;
    lines.push(format!("  Total rows: {}", summary.total_rows));
    lines.push(format!(
        "  Created:    {}",
        count(summary.created, |s| s.green())
    ));
    if summary.duplicates > 0 {
        lines.push(format!("    (already present: {})", summary.duplicates));
    }
    lines.push(format!("  Failed:     {}", count(summary.failed, |s| s.red())));
    lines.push(format!(
        "  Skipped:    {}",
        count(summary.skipped, |s| s.yellow())
    ));
    lines.push(format!(
        "  Duration:   {:.2}s",
        elapsed.num_milliseconds() as f64 / 1000.0
    ));
    lines.push(String::new());

    if let Some(reason) = &summary.aborted {
        lines.push(format!("{} {}", "Batch aborted:".red().bold(), reason));
        lines.push(String::new());
    }
    if summary.cancelled {
        lines.push("Batch cancelled before all rows were submitted".yellow().to_string());
        lines.push(String::new());
    }

    if !summary.errors.is_empty() {
        lines.push("Errors:".bold().to_string());
        for error in &summary.errors {
            lines.push(format!("  row {}: {}", error.row_index, error.message));
        }
        lines.push(String::new());
    }

    let skipped: Vec<_> = summary
        .outcomes
        .iter()
        .filter(|o| o.state == OutcomeState::Skipped)
        .collect();
    if !skipped.is_empty() {
        lines.push("Skipped:".bold().to_string());
        for outcome in skipped {
            lines.push(format!(
                "  row {}: {}",
                outcome.row_index,
                outcome.error_detail.as_deref().unwrap_or("skipped")
            ));
        }
        lines.push(String::new());
    }

    let status = if summary.is_clean() {
        "✓ All rows ingested".green().bold()
    } else {
        "✗ Batch finished with problems".red().bold()
    };
    lines.push(status.to_string());

    lines.join("\n")
}

fn count(n: usize, paint: impl Fn(&str) -> ColoredString) -> String {
    if n == 0 {
        n.to_string()
    } else {
        paint(&n.to_string()).to_string()
    }
}
