//! Generic (fallback) site layout.
//!
//! Always matches. Prose is read from paragraphs and list items, no page is
//! ever considered missing, and tables carry no captions.

use scraper::Html;

use super::{LayoutPreset, SiteLayout};

/// Layout for arbitrary heading-structured HTML.
pub struct GenericLayout;

impl SiteLayout for GenericLayout {
    fn detect(&self, _doc: &Html) -> bool {
        true
    }

    fn preset(&self) -> LayoutPreset {
        LayoutPreset {
            content_container: "body",
            content_fragment: "p, li",
            not_found_marker: None,
            table_topic_container: None,
            table_topic_item: None,
        }
    }

    fn name(&self) -> &str {
        "generic"
    }
}
