//! Core domain types: the per-page knowledge tree and the flattened records.

use serde::{Deserialize, Serialize};

/// Current schema version for the run manifest format.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// PageTree
// ---------------------------------------------------------------------------

/// Structured representation of one crawled page.
///
/// `info`/`links`/`tables` hold the content between the page title and the
/// first sub-heading; `sections` follow heading order in the source document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageTree {
    /// Constant label for the site being scraped.
    pub topic: String,
    /// Text of the page's level-1 heading.
    pub title: Option<String>,
    /// Normalized prose of the title scope.
    pub info: Option<String>,
    /// External links of the title scope.
    pub links: Vec<String>,
    /// Tables of the title scope.
    pub tables: Vec<TableBlock>,
    /// One entry per level-2/3 heading.
    pub sections: Vec<Section>,
}

impl PageTree {
    /// Whether the tree carries nothing a record could be built from.
    pub fn is_empty(&self) -> bool {
        self.info.is_none()
            && self.links.is_empty()
            && self.tables.is_empty()
            && self.sections.iter().all(Section::is_empty)
    }
}

/// A sub-heading scope within a [`PageTree`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub subtitle: String,
    pub info: Option<String>,
    pub links: Vec<String>,
    pub tables: Vec<TableBlock>,
}

impl Section {
    pub fn is_empty(&self) -> bool {
        self.info.is_none() && self.links.is_empty() && self.tables.is_empty()
    }
}

/// One parsed table.
///
/// Every row has the same arity as `header`; malformed rows are dropped at
/// parse time. Empty header cells stay empty here and get their placeholder
/// when records are built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableBlock {
    /// Label from the enclosing annotation container, if any.
    pub topic: Option<String>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// A flattened (prompt, completion) training pair.
///
/// Field order is part of the output contract: `prompt` then `completion`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub prompt: String,
    pub completion: String,
}

// ---------------------------------------------------------------------------
// FieldNaming
// ---------------------------------------------------------------------------

/// Key-naming variant for page-tree JSON.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldNaming {
    /// Section keys carry a `sub_` prefix (`sub_info`, `sub_table_header`, ...).
    #[default]
    Prefixed,
    /// Section keys reuse the page-level names (`info`, `table_header`, ...).
    Plain,
}

impl std::str::FromStr for FieldNaming {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "prefixed" => Ok(Self::Prefixed),
            "plain" => Ok(Self::Plain),
            other => Err(format!(
                "unknown field naming '{other}': expected 'prefixed' or 'plain'"
            )),
        }
    }
}
