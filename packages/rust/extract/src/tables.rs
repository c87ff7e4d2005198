//! Table parsing: header row, arity-checked data rows, and layout captions.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use docdistill_shared::{DistillError, TableBlock};

use crate::layouts::LayoutSelectors;
use crate::text::{clean_cell, clean_inline};

static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));

/// Captions for the page's tables, in table order.
///
/// Only the first caption container on the page is read, matching how the
/// page builder emits a single tab strip for the whole document.
pub fn table_topics(doc: &Html, layout: &LayoutSelectors) -> Vec<String> {
    let Some((container_sel, item_sel)) = &layout.table_topics else {
        return Vec::new();
    };

    doc.select(container_sel)
        .next()
        .map(|container| {
            container
                .select(item_sel)
                .map(|item| clean_inline(&item.text().collect::<String>()))
                .collect()
        })
        .unwrap_or_default()
}

/// Parse one `<table>` element.
///
/// The first row with any cells is the header. Rows of nested tables are not
/// part of this table. Rows whose arity differs from the header are dropped
/// with a warning. Returns `None` for a table with no cells at all.
pub fn parse_table(table: ElementRef<'_>, topic: Option<String>) -> Option<TableBlock> {
    let mut rows = table
        .select(&ROW_SEL)
        .filter(|tr| owned_by(*tr, table))
        .map(row_cells)
        .filter(|cells| !cells.is_empty());

    let header = rows.next()?;
    let rows = rows
        .filter(|row| {
            if row.len() == header.len() {
                return true;
            }
            let err = DistillError::MalformedTable {
                header_len: header.len(),
                row_len: row.len(),
            };
            warn!(topic = topic.as_deref().unwrap_or("Overview"), error = %err, "dropping table row");
            false
        })
        .collect();

    Some(TableBlock { topic, header, rows })
}

/// Whether `table` is the nearest table enclosing `tr`.
fn owned_by(tr: ElementRef<'_>, table: ElementRef<'_>) -> bool {
    tr.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "table")
        .is_some_and(|owner| owner.id() == table.id())
}

fn row_cells(tr: ElementRef<'_>) -> Vec<String> {
    tr.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| clean_cell(&cell.text().collect::<String>()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_table(html: &str) -> Option<TableBlock> {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("table").unwrap();
        let table = doc.select(&sel).next().unwrap();
        parse_table(table, None)
    }

    #[test]
    fn header_and_rows_are_split() {
        let table = first_table(
            "<table><thead><tr><th>Name</th><th>Value</th></tr></thead>\
             <tbody><tr><td>X</td><td>1</td></tr><tr><td> Y </td><td>2</td></tr></tbody></table>",
        )
        .unwrap();

        assert_eq!(table.header, vec!["Name", "Value"]);
        assert_eq!(table.rows, vec![vec!["X", "1"], vec!["Y", "2"]]);
        assert!(table.topic.is_none());
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let table = first_table(
            "<table><tr><td>A</td><td>B</td></tr><tr><td>1</td></tr>\
             <tr><td>2</td><td>3</td></tr><tr><td>4</td><td>5</td><td>6</td></tr></table>",
        )
        .unwrap();

        assert_eq!(table.rows, vec![vec!["2", "3"]]);
        assert!(table.rows.iter().all(|row| row.len() == table.header.len()));
    }

    #[test]
    fn cells_are_normalized_but_empty_cells_kept() {
        let table = first_table(
            "<table><tr><td>Class</td><td></td></tr><tr><td>&#8203;Beast  \n</td><td> </td></tr></table>",
        )
        .unwrap();

        assert_eq!(table.header, vec!["Class", ""]);
        assert_eq!(table.rows, vec![vec!["Beast", ""]]);
    }

    #[test]
    fn line_breaks_inside_cells_survive() {
        let table = first_table(
            "<table><tr><th>Ability</th><th>Effect</th></tr>\
             <tr><td>Shelter</td><td>Block  all damage.\nLasts one round.</td></tr></table>",
        )
        .unwrap();

        assert_eq!(
            table.rows,
            vec![vec!["Shelter", "Block all damage.\nLasts one round."]]
        );
    }

    #[test]
    fn nested_table_rows_are_excluded() {
        let table = first_table(
            "<table><tr><td>Outer</td></tr>\
             <tr><td><table><tr><td>inner</td><td>row</td></tr></table></td></tr></table>",
        )
        .unwrap();

        assert_eq!(table.header, vec!["Outer"]);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0], vec!["innerrow"]);
    }

    #[test]
    fn empty_table_is_none() {
        assert!(first_table("<table><tr></tr></table>").is_none());
    }
}
