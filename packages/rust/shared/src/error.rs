//! Error types for docdistill.
//!
//! Library crates use [`DistillError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docdistill operations.
#[derive(Debug, thiserror::Error)]
pub enum DistillError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network or HTTP status failure for a single URL.
    #[error("fetch error for {url}: {cause}")]
    Fetch { url: String, cause: String },

    /// A table row whose arity does not match its header.
    #[error("malformed table row: header has {header_len} cells, row has {row_len}")]
    MalformedTable { header_len: usize, row_len: usize },

    /// A page with no headings and no text to extract.
    #[error("empty page: {url}")]
    EmptyPage { url: String },

    /// Selector, HTML or JSON parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Tabular output requested for a record set with no rows to derive a header from.
    #[error("refusing to write {path:?}: no records to derive a header row from")]
    EmptyDataset { path: PathBuf },

    /// JSON/CSV serialization failure.
    #[error("serialization error: {0}")]
    Serialize(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DistillError>;

impl DistillError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a fetch error for `url`.
    pub fn fetch(url: impl Into<String>, cause: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            cause: cause.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is contained within a single page.
    ///
    /// Page-level errors skip the page and let the crawl continue; everything
    /// else is surfaced to the caller.
    pub fn is_page_level(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::MalformedTable { .. } | Self::EmptyPage { .. }
        )
    }
}
