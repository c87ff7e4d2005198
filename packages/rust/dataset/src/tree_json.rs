//! Page-tree JSON: rendering in either key naming, and reading it back.
//!
//! Rendered trees always pass through [`filter_null`], so an absent title,
//! info text or table caption appears as `[]`, as does an empty table cell.

use serde_json::{Map, Value};

use docdistill_shared::{DistillError, FieldNaming, PageTree, Result, Section, TableBlock};

use crate::null_filter::{filter_null, is_empty_marker};

// ---------------------------------------------------------------------------
// Key sets
// ---------------------------------------------------------------------------

/// Keys used for one scope's content and its tables.
struct ScopeKeys {
    info: &'static str,
    links: &'static str,
    tables: &'static str,
    table_topic: &'static str,
    table_header: &'static str,
    table_data: &'static str,
}

const PLAIN: ScopeKeys = ScopeKeys {
    info: "info",
    links: "links",
    tables: "table",
    table_topic: "table_topic",
    table_header: "table_header",
    table_data: "table_data",
};

const PREFIXED: ScopeKeys = ScopeKeys {
    info: "sub_info",
    links: "sub_links",
    tables: "sub_table",
    table_topic: "sub_table_topic",
    table_header: "sub_table_header",
    table_data: "sub_table_data",
};

const SECTIONS_KEY: &str = "contents";
const SUBTITLE_KEY: &str = "sub_title";

fn section_keys(naming: FieldNaming) -> &'static ScopeKeys {
    match naming {
        FieldNaming::Prefixed => &PREFIXED,
        FieldNaming::Plain => &PLAIN,
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render one page tree as null-filtered JSON.
pub fn tree_to_value(tree: &PageTree, naming: FieldNaming) -> Value {
    let mut page = Map::new();
    page.insert("topic".into(), Value::String(tree.topic.clone()));
    page.insert("title".into(), opt_string(tree.title.as_deref()));
    insert_scope(&mut page, &PLAIN, tree.info.as_deref(), &tree.links, &tree.tables);

    let keys = section_keys(naming);
    let sections = tree
        .sections
        .iter()
        .map(|section| {
            let mut obj = Map::new();
            obj.insert(SUBTITLE_KEY.into(), Value::String(section.subtitle.clone()));
            insert_scope(&mut obj, keys, section.info.as_deref(), &section.links, &section.tables);
            Value::Object(obj)
        })
        .collect();
    page.insert(SECTIONS_KEY.into(), Value::Array(sections));

    filter_null(Value::Object(page))
}

/// Render every tree, in order, as a JSON array.
pub fn trees_to_value(trees: &[PageTree], naming: FieldNaming) -> Value {
    Value::Array(trees.iter().map(|tree| tree_to_value(tree, naming)).collect())
}

fn insert_scope(
    obj: &mut Map<String, Value>,
    keys: &ScopeKeys,
    info: Option<&str>,
    links: &[String],
    tables: &[TableBlock],
) {
    obj.insert(keys.info.into(), opt_string(info));
    obj.insert(keys.links.into(), string_array(links));

    let tables = tables
        .iter()
        .map(|table| {
            let mut t = Map::new();
            t.insert(keys.table_topic.into(), opt_string(table.topic.as_deref()));
            t.insert(keys.table_header.into(), string_array(&table.header));
            t.insert(
                keys.table_data.into(),
                Value::Array(table.rows.iter().map(|row| string_array(row)).collect()),
            );
            Value::Object(t)
        })
        .collect();
    obj.insert(keys.tables.into(), Value::Array(tables));
}

fn opt_string(s: Option<&str>) -> Value {
    s.map_or(Value::Null, |s| Value::String(s.to_string()))
}

fn string_array(items: &[String]) -> Value {
    Value::Array(items.iter().cloned().map(Value::String).collect())
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Rebuild a page tree from its rendered JSON, in either naming.
pub fn tree_from_value(value: &Value) -> Result<PageTree> {
    let page = as_object(value, "page tree")?;

    let sections = match page.get(SECTIONS_KEY) {
        None => Vec::new(),
        Some(v) => list(v, SECTIONS_KEY)?
            .iter()
            .map(section_from_value)
            .collect::<Result<_>>()?,
    };

    Ok(PageTree {
        topic: opt_text(page.get("topic"), "topic")?.unwrap_or_default(),
        title: opt_text(page.get("title"), "title")?,
        info: opt_text(page.get(PLAIN.info), PLAIN.info)?,
        links: links(page.get(PLAIN.links), PLAIN.links)?,
        tables: tables(page.get(PLAIN.tables), &PLAIN)?,
        sections,
    })
}

/// Rebuild every tree of a rendered `data.json` array.
pub fn trees_from_value(value: &Value) -> Result<Vec<PageTree>> {
    list(value, "data.json")?.iter().map(tree_from_value).collect()
}

fn section_from_value(value: &Value) -> Result<Section> {
    let obj = as_object(value, "section")?;
    let keys = if [PREFIXED.info, PREFIXED.links, PREFIXED.tables]
        .iter()
        .any(|key| obj.contains_key(*key))
    {
        &PREFIXED
    } else {
        &PLAIN
    };

    Ok(Section {
        subtitle: opt_text(obj.get(SUBTITLE_KEY), SUBTITLE_KEY)?.unwrap_or_default(),
        info: opt_text(obj.get(keys.info), keys.info)?,
        links: links(obj.get(keys.links), keys.links)?,
        tables: tables(obj.get(keys.tables), keys)?,
    })
}

fn tables(value: Option<&Value>, keys: &ScopeKeys) -> Result<Vec<TableBlock>> {
    let Some(value) = value else {
        return Ok(Vec::new());
    };

    list(value, keys.tables)?
        .iter()
        .map(|table| {
            let obj = as_object(table, keys.tables)?;
            let rows = match obj.get(keys.table_data) {
                None => Vec::new(),
                Some(data) => list(data, keys.table_data)?
                    .iter()
                    .map(|row| cells(row, keys.table_data))
                    .collect::<Result<_>>()?,
            };
            Ok(TableBlock {
                topic: opt_text(obj.get(keys.table_topic), keys.table_topic)?,
                header: match obj.get(keys.table_header) {
                    None => Vec::new(),
                    Some(header) => cells(header, keys.table_header)?,
                },
                rows,
            })
        })
        .collect()
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| DistillError::parse(format!("{what} must be a JSON object")))
}

fn list<'a>(value: &'a Value, what: &str) -> Result<&'a [Value]> {
    value
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| DistillError::parse(format!("{what} must be a JSON array")))
}

/// A string field, where `[]`, `null` and a missing key mean "absent".
fn opt_text(value: Option<&Value>, what: &str) -> Result<Option<String>> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(v) if is_empty_marker(v) => Ok(None),
        Some(Value::String(s)) if s.is_empty() || s == "null" => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(DistillError::parse(format!("{what} must be a string"))),
    }
}

/// Table cells, where an empty marker is an empty cell.
fn cells(value: &Value, what: &str) -> Result<Vec<String>> {
    list(value, what)?
        .iter()
        .map(|cell| Ok(opt_text(Some(cell), what)?.unwrap_or_default()))
        .collect()
}

fn links(value: Option<&Value>, what: &str) -> Result<Vec<String>> {
    match value {
        None => Ok(Vec::new()),
        Some(v) => Ok(cells(v, what)?.into_iter().filter(|l| !l.is_empty()).collect()),
    }
}
