//! Shared types, error model, and configuration for docdistill.
//!
//! This crate is the foundation depended on by all other docdistill crates.
//! It provides:
//! - [`DistillError`]: the unified error type
//! - Domain types ([`PageTree`], [`Section`], [`TableBlock`], [`Record`])
//! - Configuration ([`AppConfig`], [`CrawlConfig`], [`ExtractConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, CrawlConfig, DefaultsConfig, ExtractConfig, ExtractPolicyConfig,
    FetchPolicyConfig, GITBOOK_TRADEMARK_LINK, SelectorOverrides, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{DistillError, Result};
pub use types::{CURRENT_SCHEMA_VERSION, FieldNaming, PageTree, Record, Section, TableBlock};
