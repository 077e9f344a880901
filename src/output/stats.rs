//! Run statistics
//!
//! This module derives summary figures from a finished [`CrawlReport`] and
//! prints them to stdout.

use crate::crawler::CrawlReport;
use crate::filter::parse_money;
use crate::record::{Record, COLUMNS};

/// Columns whose values come from the page rather than the crawl context
const EXTRACTED_COLUMNS: std::ops::Range<usize> = 2..14;

/// Summary figures for one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStatistics {
    pub total_records: usize,
    pub total_pages: u32,
    pub detail_failures: usize,
    pub filtered_out: usize,

    /// Franchise listings among the records
    pub franchise_count: usize,

    /// Median of the asking prices that could be parsed
    pub median_price: Option<f64>,

    /// Number of records with a non-empty value, per extracted column
    pub field_coverage: Vec<(&'static str, usize)>,
}

impl RunStatistics {
    /// Computes statistics for a report
    pub fn from_report(report: &CrawlReport) -> Self {
        Self {
            total_records: report.total_records(),
            total_pages: report.total_pages(),
            detail_failures: report.total_detail_failures(),
            filtered_out: report.total_filtered(),
            franchise_count: report
                .records
                .iter()
                .filter(|r| r.franchise == "Yes")
                .count(),
            median_price: median_price(&report.records),
            field_coverage: field_coverage(&report.records),
        }
    }

    /// Percentage of records with a value in `count` records
    pub fn coverage_percent(&self, count: usize) -> f64 {
        if self.total_records == 0 {
            return 0.0;
        }
        (count as f64 / self.total_records as f64) * 100.0
    }
}

fn median_price(records: &[Record]) -> Option<f64> {
    let mut prices: Vec<f64> = records.iter().filter_map(|r| parse_money(&r.price)).collect();
    if prices.is_empty() {
        return None;
    }

    prices.sort_by(|a, b| a.total_cmp(b));
    let mid = prices.len() / 2;
    if prices.len() % 2 == 0 {
        Some((prices[mid - 1] + prices[mid]) / 2.0)
    } else {
        Some(prices[mid])
    }
}

fn field_coverage(records: &[Record]) -> Vec<(&'static str, usize)> {
    COLUMNS[EXTRACTED_COLUMNS]
        .iter()
        .enumerate()
        .map(|(offset, column)| {
            let index = EXTRACTED_COLUMNS.start + offset;
            let count = records
                .iter()
                .filter(|r| !r.values()[index].is_empty())
                .count();
            (*column, count)
        })
        .collect()
}

/// Prints a run summary to stdout
///
/// # Arguments
///
/// * `report` - The finished crawl
pub fn print_summary(report: &CrawlReport) {
    let stats = RunStatistics::from_report(report);

    println!("=== Crawl Summary ===\n");

    println!("Overview:");
    println!("  Started: {}", report.started_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Finished: {}", report.finished_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Duration: {} seconds", report.duration().num_seconds());
    if report.cancelled {
        println!("  Status: cancelled (partial results)");
    }
    println!("  Total listings: {}", stats.total_records);
    println!("  Search pages fetched: {}", stats.total_pages);
    println!("  Detail pages failed: {}", stats.detail_failures);
    if stats.filtered_out > 0 {
        println!("  Filtered out: {}", stats.filtered_out);
    }
    println!();

    println!("Partitions:");
    for partition in &report.partitions {
        println!(
            "  {}: {} listings, {} pages ({})",
            partition.partition,
            partition.records_collected,
            partition.pages_fetched,
            partition.termination
        );
    }
    println!();

    let failed: Vec<_> = report.failed_partitions().collect();
    if !failed.is_empty() {
        println!("Unavailable Partitions ({}):", failed.len());
        for partition in failed {
            println!("  - {} ({})", partition.partition, partition.termination);
        }
        println!();
    }

    if stats.total_records > 0 {
        println!("Field Coverage:");
        for (column, count) in &stats.field_coverage {
            println!(
                "  {}: {} ({:.1}%)",
                column,
                count,
                stats.coverage_percent(*count)
            );
        }
        println!();

        if let Some(median) = stats.median_price {
            println!("Median asking price: ${:.0}", median);
        }
        println!(
            "Franchises: {} / {} listings",
            stats.franchise_count, stats.total_records
        );
    }
}
