//! Page fetching and same-site link discovery.
//!
//! This crate provides:
//! - [`PageFetcher`] and its reqwest implementation [`HttpFetcher`]
//! - [`CrawlFrontier`]: depth-first discovery guarded by a [`VisitedSet`]
//! - [`page_file_path`]: URL path to output file mapping

pub mod fetch;
pub mod frontier;

pub use fetch::{HttpFetcher, PageFetcher};
pub use frontier::{
    CrawlFrontier, CrawlOutcome, DiscoveredPage, SkippedPage, VisitedSet, page_file_path,
};
