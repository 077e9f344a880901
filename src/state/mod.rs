//! State module for tracking crawl progress
//!
//! This module provides the per-partition state used by the listing crawler.
//!
//! # Components
//!
//! - `CrawlPhase`: The phase of the partition state machine and its legal transitions
//! - `CrawlState`: Current page, seen URLs and collected records for one partition
//! - `Termination`: Why a partition crawl ended

mod crawl_phase;
mod crawl_state;
mod termination;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::CrawlState;
pub use termination::Termination;
