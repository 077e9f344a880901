//! Markdown summary generation
//!
//! This module generates a human-readable markdown report of a run,
//! including per-partition results, field coverage, and a listing table.

use crate::crawler::CrawlReport;
use crate::output::stats::RunStatistics;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Maximum number of listings shown in the listing table
const MAX_LISTING_ROWS: usize = 50;

/// Generates a markdown summary of a run and writes it to `output_path`
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `config_hash` - Hash of the configuration that produced the run
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    report: &CrawlReport,
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(report, config_hash);

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    tracing::info!("Wrote summary to {}", output_path.display());
    Ok(())
}

/// Formats a run as markdown
pub fn format_markdown_summary(report: &CrawlReport, config_hash: &str) -> String {
    let stats = RunStatistics::from_report(report);
    let mut md = String::new();

    md.push_str("# Listing Harvest Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
    md.push_str(&format!("- **Finished**: {}\n", report.finished_at.to_rfc3339()));
    md.push_str(&format!(
        "- **Duration**: {} seconds\n",
        report.duration().num_seconds()
    ));
    md.push_str(&format!(
        "- **Status**: {}\n",
        if report.cancelled { "cancelled" } else { "completed" }
    ));
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Total Listings**: {}\n", stats.total_records));
    md.push_str(&format!("- **Search Pages Fetched**: {}\n", stats.total_pages));
    md.push_str(&format!(
        "- **Detail Pages Failed**: {}\n",
        stats.detail_failures
    ));
    md.push_str(&format!("- **Filtered Out**: {}\n", stats.filtered_out));
    md.push_str(&format!("- **Franchises**: {}\n", stats.franchise_count));
    if let Some(median) = stats.median_price {
        md.push_str(&format!("- **Median Asking Price**: ${:.0}\n", median));
    }
    md.push('\n');

    // Partition breakdown
    md.push_str("## Partitions\n\n");
    md.push_str("| Partition | Listings | Pages | Failed Details | Filtered | Ended |\n");
    md.push_str("|-----------|----------|-------|----------------|----------|-------|\n");
    for partition in &report.partitions {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            escape_cell(&partition.partition),
            partition.records_collected,
            partition.pages_fetched,
            partition.detail_failures,
            partition.filtered_out,
            partition.termination
        ));
    }
    md.push('\n');

    // Field coverage
    if stats.total_records > 0 {
        md.push_str("## Field Coverage\n\n");
        md.push_str("| Field | Records | Coverage |\n");
        md.push_str("|-------|---------|----------|\n");
        for (column, count) in &stats.field_coverage {
            md.push_str(&format!(
                "| {} | {} | {:.1}% |\n",
                column,
                count,
                stats.coverage_percent(*count)
            ));
        }
        md.push('\n');
    }

    // Listings
    if !report.records.is_empty() {
        md.push_str(&format!(
            "## Listings (first {})\n\n",
            MAX_LISTING_ROWS.min(report.records.len())
        ));
        md.push_str("| Business | Partition | Price | Location | URL |\n");
        md.push_str("|----------|-----------|-------|----------|-----|\n");
        for record in report.records.iter().take(MAX_LISTING_ROWS) {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                escape_cell(&record.business_name),
                escape_cell(&record.partition),
                escape_cell(&record.price),
                escape_cell(&record.location),
                record.url
            ));
        }
        if report.records.len() > MAX_LISTING_ROWS {
            md.push_str(&format!(
                "\n... and {} more\n",
                report.records.len() - MAX_LISTING_ROWS
            ));
        }
        md.push('\n');
    }

    md
}

/// Makes free text safe for a single markdown table cell
fn escape_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}
