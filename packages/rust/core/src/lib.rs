//! Core pipeline orchestration for docdistill.
//!
//! This crate ties together page discovery, page-tree extraction, record
//! flattening and output assembly into the `crawl` and `regenerate` workflows.

pub mod assembler;
pub mod pipeline;

pub use assembler::{
    AssembleConfig, AssembleResult, AssembledPage, DATA_CSV, DATA_JSON, DATA_JSONL,
    MANIFEST_JSON, RunCounts, RunManifest, assemble, load_manifest, load_trees,
    page_output_file, write_records,
};
pub use pipeline::{
    ProgressReporter, RegenerateSummary, RunConfig, RunSummary, SilentProgress, regenerate, run,
    run_with_fetcher,
};
