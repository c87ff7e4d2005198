//! GitBook site layout.

use std::sync::LazyLock;

use scraper::{Html, Selector};

use super::{LayoutPreset, SiteLayout};

static GENERATOR_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="generator"][content^="GitBook"]"#).expect("valid selector")
});
static MARKERS_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"meta[name="gitbook"], .gitbook-root, [data-block-content]"#)
        .expect("valid selector")
});

/// Detects and reads GitBook-published documentation sites.
///
/// GitBook renders prose as `[data-offset-key]` text runs inside
/// `[data-block-content]` blocks and captions tables through a tab strip
/// kept in a non-editable container.
pub struct GitBookLayout;

impl SiteLayout for GitBookLayout {
    fn detect(&self, doc: &Html) -> bool {
        doc.select(&GENERATOR_SEL).next().is_some() || doc.select(&MARKERS_SEL).next().is_some()
    }

    fn preset(&self) -> LayoutPreset {
        LayoutPreset {
            content_container: "[data-block-content]",
            content_fragment: "[data-offset-key]",
            not_found_marker: Some(
                "div.css-1rynq56.r-gg6oyi.r-ubezar.r-1kfrs79.r-135wba7.r-1nf4jbm",
            ),
            table_topic_container: Some(r#"div[contenteditable="false"]"#),
            table_topic_item: Some(r#"div[tabindex="0"]"#),
        }
    }

    fn name(&self) -> &str {
        "gitbook"
    }
}
