//! From page trees to training data.
//!
//! This crate provides:
//! - [`filter_null`]: recursive placeholder removal on JSON values
//! - [`tree_to_value`] / [`tree_from_value`]: page-tree JSON in either key naming
//! - [`flatten`] / [`restructure`]: page trees to prompt/completion records
//! - [`writer`]: JSON lines, CSV and pretty JSON output

pub mod flatten;
pub mod null_filter;
pub mod tree_json;
pub mod writer;

pub use flatten::{RawCompletion, RawRecord, flatten, flatten_all, restructure};
pub use null_filter::filter_null;
pub use tree_json::{tree_from_value, tree_to_value, trees_from_value, trees_to_value};
pub use writer::{
    to_pretty_json, write_atomic, write_json_file, write_lines, write_lines_file, write_table,
    write_table_file,
};
