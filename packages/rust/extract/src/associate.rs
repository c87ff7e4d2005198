//! Heading association: attributes prose, links and tables to headings.
//!
//! The document is walked once in order. Every level-1 heading opens the
//! page ("title") scope and every level-2/3 heading opens a new section
//! scope; each content item lands in the scope of its nearest preceding
//! heading. Scopes are keyed by heading position, so repeated heading text
//! never merges two sections. Content before the first heading, and content
//! under a heading with no text, belongs to no scope and is discarded.

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use tracing::debug;

use docdistill_shared::TableBlock;

use crate::layouts::LayoutSelectors;
use crate::tables::{parse_table, table_topics};
use crate::text::{clean_inline, join_fragments};

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Everything attributed to one heading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContent {
    /// Raw prose fragments in document order.
    pub fragments: Vec<String>,
    /// External link targets in document order.
    pub links: Vec<String>,
    /// Parsed tables in document order.
    pub tables: Vec<TableBlock>,
}

impl ScopeContent {
    /// The scope's normalized prose, `None` if there is none.
    pub fn info(&self) -> Option<String> {
        join_fragments(&self.fragments)
    }
}

/// Result of associating one page's content with its headings.
#[derive(Debug, Clone, Default)]
pub struct Association {
    /// Non-empty level-1 heading texts in document order.
    pub titles: Vec<String>,
    /// Non-empty level-2/3 heading texts in document order.
    pub subtitles: Vec<String>,
    /// Content under any level-1 heading, up to the next sub-heading.
    pub title_scope: ScopeContent,
    /// Content per sub-heading, parallel to `subtitles`.
    pub subtitle_scopes: Vec<ScopeContent>,
}

impl Association {
    /// Whether the page had any usable heading at all.
    pub fn has_headings(&self) -> bool {
        !self.titles.is_empty() || !self.subtitles.is_empty()
    }
}

/// Scope that content currently flows into.
#[derive(Debug, Clone, Copy)]
enum Scope {
    Discard,
    Title,
    Subtitle(usize),
}

// ---------------------------------------------------------------------------
// Association
// ---------------------------------------------------------------------------

/// Associate every content fragment, link and table in `doc` with its heading.
///
/// A fragment is skipped when it sits inside another fragment, a heading or a
/// table. Links are kept only when they start with `http` and are not listed
/// in `ignore_links`. Table captions come from the layout and are aligned by
/// the table's position among all tables on the page.
pub fn associate(
    doc: &Html,
    layout: &LayoutSelectors,
    ignore_links: &HashSet<String>,
) -> Association {
    let fragment_ids: HashSet<_> = doc
        .select(&layout.content_container)
        .flat_map(|container| container.select(&layout.content_fragment))
        .map(|el| el.id())
        .collect();
    let topics = table_topics(doc, layout);

    // A fragment inside another fragment, a heading or a table is skipped.
    let is_nested = |el: ElementRef| {
        el.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
            matches!(ancestor.value().name(), "h1" | "h2" | "h3" | "table")
                || fragment_ids.contains(&ancestor.id())
        })
    };

    let mut assoc = Association::default();
    let mut scope = Scope::Discard;
    let mut table_index = 0usize;

    for node in doc.root_element().descendants() {
        let Some(el) = ElementRef::wrap(node) else {
            continue;
        };

        match el.value().name() {
            "h1" => {
                let text = heading_text(el);
                scope = if text.is_empty() {
                    Scope::Discard
                } else {
                    assoc.titles.push(text);
                    Scope::Title
                };
            }
            "h2" | "h3" => {
                let text = heading_text(el);
                scope = if text.is_empty() {
                    Scope::Discard
                } else {
                    assoc.subtitles.push(text);
                    assoc.subtitle_scopes.push(ScopeContent::default());
                    Scope::Subtitle(assoc.subtitle_scopes.len() - 1)
                };
            }
            "table" => {
                let topic = topics.get(table_index).cloned();
                table_index += 1;
                if let Some(content) = scope_mut(&mut assoc, scope) {
                    if let Some(table) = parse_table(el, topic) {
                        content.tables.push(table);
                    }
                }
            }
            "a" => {
                let external = el
                    .value()
                    .attr("href")
                    .filter(|href| href.starts_with("http") && !ignore_links.contains(*href));
                if let (Some(href), Some(content)) = (external, scope_mut(&mut assoc, scope)) {
                    content.links.push(href.to_string());
                }
            }
            _ => {}
        }

        if fragment_ids.contains(&el.id()) && !is_nested(el) {
            if let Some(content) = scope_mut(&mut assoc, scope) {
                content.fragments.push(el.text().collect());
            }
        }
    }

    debug!(
        titles = assoc.titles.len(),
        subtitles = assoc.subtitles.len(),
        tables = table_index,
        "associated page content"
    );
    assoc
}

fn scope_mut(assoc: &mut Association, scope: Scope) -> Option<&mut ScopeContent> {
    match scope {
        Scope::Discard => None,
        Scope::Title => Some(&mut assoc.title_scope),
        Scope::Subtitle(idx) => assoc.subtitle_scopes.get_mut(idx),
    }
}

fn heading_text(el: ElementRef<'_>) -> String {
    clean_inline(&el.text().collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layouts::{GenericLayout, GitBookLayout, SiteLayout};
    use docdistill_shared::SelectorOverrides;

    fn run(layout: &dyn SiteLayout, html: &str, ignore: &[&str]) -> Association {
        let selectors =
            LayoutSelectors::compile(layout.name(), layout.preset(), &SelectorOverrides::default())
                .unwrap();
        let ignore: HashSet<String> = ignore.iter().map(|s| s.to_string()).collect();
        associate(&Html::parse_document(html), &selectors, &ignore)
    }

    #[test]
    fn content_goes_to_nearest_preceding_heading() {
        let assoc = run(
            &GenericLayout,
            "<p>preamble</p>\
             <h1>Intro</h1><p>Hello</p><p>world</p>\
             <h2>Setup</h2><p>Install it.</p>\
             <h3>Linux</h3><li>apt</li>",
            &[],
        );

        assert_eq!(assoc.titles, vec!["Intro"]);
        assert_eq!(assoc.subtitles, vec!["Setup", "Linux"]);
        assert_eq!(assoc.title_scope.info().as_deref(), Some("Hello world"));
        assert_eq!(assoc.subtitle_scopes[0].info().as_deref(), Some("Install it."));
        assert_eq!(assoc.subtitle_scopes[1].info().as_deref(), Some("apt"));
    }

    #[test]
    fn repeated_subtitles_keep_separate_scopes() {
        let assoc = run(
            &GenericLayout,
            "<h1>API</h1><h2>Usage</h2><p>first</p><h2>Usage</h2><p>second</p>",
            &[],
        );

        assert_eq!(assoc.subtitles, vec!["Usage", "Usage"]);
        assert_eq!(assoc.subtitle_scopes[0].fragments, vec!["first"]);
        assert_eq!(assoc.subtitle_scopes[1].fragments, vec!["second"]);
    }

    #[test]
    fn later_titles_merge_into_page_scope() {
        let assoc = run(
            &GenericLayout,
            "<h1>One</h1><p>a</p><h2>Sub</h2><p>b</p><h1>Two</h1><p>c</p>",
            &[],
        );

        assert_eq!(assoc.titles, vec!["One", "Two"]);
        assert_eq!(assoc.title_scope.fragments, vec!["a", "c"]);
        assert_eq!(assoc.subtitle_scopes[0].fragments, vec!["b"]);
    }

    #[test]
    fn empty_heading_closes_scope_and_drops_its_content() {
        let assoc = run(
            &GenericLayout,
            "<h1>Title</h1><p>kept</p><h2> \u{200b} </h2><p>orphan</p><a href=\"https://x.io\">x</a>",
            &[],
        );

        assert!(assoc.subtitles.is_empty());
        assert_eq!(assoc.title_scope.fragments, vec!["kept"]);
        assert!(assoc.title_scope.links.is_empty());
    }

    #[test]
    fn fragments_inside_headings_tables_or_fragments_are_skipped() {
        let assoc = run(
            &GenericLayout,
            "<h1>T<p>in heading</p></h1>\
             <table><tr><td><p>in cell</p></td></tr></table>\
             <ul><li>outer<ul><li>inner</li></ul></li></ul>",
            &[],
        );

        assert_eq!(assoc.title_scope.fragments.len(), 1);
        assert_eq!(assoc.title_scope.info().as_deref(), Some("outerinner"));
        assert_eq!(assoc.title_scope.tables.len(), 1);
    }

    #[test]
    fn links_are_external_and_not_ignored() {
        let assoc = run(
            &GenericLayout,
            r#"<a href="https://early.example">before</a>
               <h1>Links</h1>
               <a href="https://b.example">b</a>
               <a href="/relative">rel</a>
               <a href="mailto:a@b.c">mail</a>
               <a href="https://ignored.example">ignored</a>
               <a href="http://a.example">a</a>
               <a href="https://b.example">b again</a>
               <a>no href</a>"#,
            &["https://ignored.example"],
        );

        assert_eq!(
            assoc.title_scope.links,
            vec!["https://b.example", "http://a.example", "https://b.example"]
        );
    }

    #[test]
    fn gitbook_captions_align_with_table_positions() {
        let assoc = run(
            &GitBookLayout,
            r#"<div contenteditable="false"><div tabindex="0">Skipped</div><div tabindex="0">Stats</div></div>
               <table><tr><td>before heading</td></tr></table>
               <h1>Axie</h1>
               <div data-block-content="1"><span data-offset-key="a">Body</span><span data-offset-key="b">parts</span></div>
               <p>not a text run</p>
               <table><tr><th>HP</th></tr><tr><td>31</td></tr></table>
               <table><tr><th>Speed</th></tr></table>"#,
            &[],
        );

        assert_eq!(assoc.title_scope.info().as_deref(), Some("Body parts"));
        let topics: Vec<Option<&str>> = assoc
            .title_scope
            .tables
            .iter()
            .map(|t| t.topic.as_deref())
            .collect();
        assert_eq!(topics, vec![Some("Stats"), None]);
    }

    #[test]
    fn page_without_headings_has_no_scopes() {
        let assoc = run(&GenericLayout, "<p>just text</p>", &[]);
        assert!(!assoc.has_headings());
        assert_eq!(assoc.title_scope, ScopeContent::default());
    }
}
