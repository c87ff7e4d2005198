//! Flattening page trees into prompt/completion records.
//!
//! [`flatten`] emits raw records in document order: page-level table rows,
//! the page-level aggregate, then for each section its table rows followed by
//! its aggregate. [`restructure`] turns aggregate `{info, links}` completions
//! into their final sentence form and drops records with nothing to say.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use docdistill_shared::{PageTree, Record, TableBlock};

/// Placeholder for an empty table header cell.
pub const EMPTY_HEADER: &str = "Details";
/// Placeholder for an empty table value cell.
pub const EMPTY_VALUE: &str = "None";
/// Caption used for tables without one.
pub const DEFAULT_TABLE_TOPIC: &str = "Overview";

const LINKS_PREAMBLE: &str = "Here are some links related to the topic: ";

static MULTI_SPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" {2,}").expect("valid regex"));

// ---------------------------------------------------------------------------
// Raw records
// ---------------------------------------------------------------------------

/// Completion of a record before restructuring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawCompletion {
    /// Final text (table-row fact sentences).
    Text(String),
    /// A scope's prose and links, combined by [`restructure`].
    Structured {
        info: Option<String>,
        links: Vec<String>,
    },
}

/// A record as produced by [`flatten`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub prompt: String,
    pub completion: RawCompletion,
}

// ---------------------------------------------------------------------------
// Flatten
// ---------------------------------------------------------------------------

/// Flatten one page tree into raw records, in document order.
pub fn flatten(tree: &PageTree) -> Vec<RawRecord> {
    let mut records = Vec::new();

    let page_prompt = context_prompt(&tree.topic, tree.title.as_deref(), None);
    push_scope(
        &mut records,
        &page_prompt,
        tree.info.as_deref(),
        &tree.links,
        &tree.tables,
    );

    for section in &tree.sections {
        let prompt = context_prompt(&tree.topic, tree.title.as_deref(), Some(&section.subtitle));
        push_scope(
            &mut records,
            &prompt,
            section.info.as_deref(),
            &section.links,
            &section.tables,
        );
    }

    records
}

fn push_scope(
    records: &mut Vec<RawRecord>,
    prompt: &str,
    info: Option<&str>,
    links: &[String],
    tables: &[TableBlock],
) {
    for table in tables {
        let topic = table
            .topic
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TABLE_TOPIC);
        let header: Vec<&str> = table
            .header
            .iter()
            .map(|h| if h.is_empty() { EMPTY_HEADER } else { h.as_str() })
            .collect();

        for row in &table.rows {
            records.push(table_row_record(prompt, topic, &header, row));
        }
    }

    let info = info.map(clean).filter(|i| !i.is_empty());
    let links: Vec<String> = links.iter().map(|l| clean(l)).filter(|l| !l.is_empty()).collect();
    if info.is_some() || !links.is_empty() {
        records.push(RawRecord {
            prompt: clean(prompt),
            completion: RawCompletion::Structured { info, links },
        });
    }
}

fn table_row_record(prompt: &str, topic: &str, header: &[&str], row: &[String]) -> RawRecord {
    let pairs: Vec<(&str, &str)> = header
        .iter()
        .zip(row)
        .map(|(h, v)| (*h, if v.is_empty() { EMPTY_VALUE } else { v.as_str() }))
        .collect();

    let lines = pairs
        .iter()
        .map(|(h, v)| format!("{h}: {v}"))
        .collect::<Vec<_>>()
        .join("\n");
    let facts = pairs
        .iter()
        .map(|(h, v)| format!("{h} of {v}"))
        .collect::<Vec<_>>()
        .join(", ");

    RawRecord {
        prompt: clean(&format!("{prompt}\nTable: {topic}\n{lines}")),
        completion: RawCompletion::Text(clean(&format!("It has a {facts}"))),
    }
}

/// `Topic: {topic}`, then `Title:` and `Sub-Title:` lines when present.
fn context_prompt(topic: &str, title: Option<&str>, subtitle: Option<&str>) -> String {
    let mut prompt = format!("Topic: {topic}");
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        prompt.push_str("\nTitle: ");
        prompt.push_str(title);
    }
    if let Some(subtitle) = subtitle.filter(|s| !s.is_empty()) {
        prompt.push_str("\nSub-Title: ");
        prompt.push_str(subtitle);
    }
    prompt
}

/// Strip zero-width spaces and collapse runs of spaces.
fn clean(text: &str) -> String {
    let stripped = text.replace('\u{200b}', "");
    MULTI_SPACE_RE.replace_all(&stripped, " ").into_owned()
}

// ---------------------------------------------------------------------------
// Restructure
// ---------------------------------------------------------------------------

/// Convert a raw record to its final string form.
///
/// - info only: the info text
/// - links only: `Here are some links related to the topic: a, b`
/// - both: info text, a newline, then the links sentence
///
/// Returns `None` when the completion would be empty.
pub fn restructure(raw: RawRecord) -> Option<Record> {
    let completion = match raw.completion {
        RawCompletion::Text(text) => text,
        RawCompletion::Structured { info, links } => {
            let info = info.filter(|i| !i.trim().is_empty());
            match (info, links.is_empty()) {
                (Some(info), true) => info,
                (None, false) => format!("{LINKS_PREAMBLE}{}", links.join(", ")),
                (Some(info), false) => format!("{info}\n{LINKS_PREAMBLE}{}", links.join(", ")),
                (None, true) => String::new(),
            }
        }
    };

    if completion.trim().is_empty() {
        return None;
    }

    Some(Record {
        prompt: raw.prompt,
        completion,
    })
}

/// Flatten and restructure every tree, in order.
pub fn flatten_all(trees: &[PageTree]) -> Vec<Record> {
    let records: Vec<Record> = trees
        .iter()
        .flat_map(flatten)
        .filter_map(restructure)
        .collect();

    debug!(pages = trees.len(), records = records.len(), "flattened page trees");
    records
}
