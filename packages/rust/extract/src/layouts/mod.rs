//! Site layouts: the page-builder specific selectors used during extraction.
//!
//! A layout names where prose text runs live, how a missing page is marked,
//! and where table captions are kept. Layouts are detected from the root page
//! (platform-specific first, generic last) or chosen by name, and individual
//! selectors can be overridden from configuration.

mod generic;
mod gitbook;

use scraper::{Html, Selector};
use tracing::debug;

use docdistill_shared::{DistillError, Result, SelectorOverrides};

pub use generic::GenericLayout;
pub use gitbook::GitBookLayout;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Raw selector strings making up a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutPreset {
    /// Elements holding prose text runs.
    pub content_container: &'static str,
    /// Prose text runs inside a container.
    pub content_fragment: &'static str,
    /// Present only on "page not found" pages.
    pub not_found_marker: Option<&'static str>,
    /// Container whose items caption the page's tables, in table order.
    pub table_topic_container: Option<&'static str>,
    /// Caption items inside the container.
    pub table_topic_item: Option<&'static str>,
}

/// A documentation platform whose markup we know how to read.
///
/// Layouts are tried in priority order; `GenericLayout` is the always-last fallback.
pub trait SiteLayout: Send + Sync {
    /// Whether this layout should handle the document.
    fn detect(&self, doc: &Html) -> bool;

    /// Selector strings for this layout.
    fn preset(&self) -> LayoutPreset;

    /// Layout name used in configuration and tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Compiled selectors
// ---------------------------------------------------------------------------

/// A layout's selectors after overrides are applied and parsed.
#[derive(Debug, Clone)]
pub struct LayoutSelectors {
    name: String,
    pub(crate) content_container: Selector,
    pub(crate) content_fragment: Selector,
    pub(crate) not_found_marker: Option<Selector>,
    pub(crate) table_topics: Option<(Selector, Selector)>,
}

impl LayoutSelectors {
    /// Compile `preset`, replacing any selector set in `overrides`.
    pub fn compile(name: &str, preset: LayoutPreset, overrides: &SelectorOverrides) -> Result<Self> {
        let pick = |over: &Option<String>, preset: Option<&'static str>| {
            over.as_deref().or(preset).map(str::to_string)
        };

        let container = overrides
            .content_container
            .as_deref()
            .unwrap_or(preset.content_container);
        let fragment = overrides
            .content_fragment
            .as_deref()
            .unwrap_or(preset.content_fragment);
        let marker = pick(&overrides.not_found_marker, preset.not_found_marker);
        let topic_container = pick(&overrides.table_topic_container, preset.table_topic_container);
        let topic_item = pick(&overrides.table_topic_item, preset.table_topic_item);

        let table_topics = match (topic_container, topic_item) {
            (Some(container), Some(item)) => {
                Some((parse_selector(&container)?, parse_selector(&item)?))
            }
            (None, None) => None,
            _ => {
                return Err(DistillError::config(
                    "table_topic_container and table_topic_item must be set together",
                ));
            }
        };

        Ok(Self {
            name: name.to_string(),
            content_container: parse_selector(container)?,
            content_fragment: parse_selector(fragment)?,
            not_found_marker: marker.as_deref().map(parse_selector).transpose()?,
            table_topics,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Marker whose presence means "this page does not exist".
    pub fn not_found_marker(&self) -> Option<&Selector> {
        self.not_found_marker.as_ref()
    }
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw)
        .map_err(|e| DistillError::config(format!("invalid selector '{raw}': {e}")))
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered layouts in priority order.
pub struct LayoutRegistry {
    layouts: Vec<Box<dyn SiteLayout>>,
}

impl LayoutRegistry {
    /// Create a registry with all built-in layouts (platform-specific first, generic last).
    pub fn new() -> Self {
        Self {
            layouts: vec![Box::new(GitBookLayout), Box::new(GenericLayout)],
        }
    }

    /// Detect the best layout for the given document.
    /// Always returns a layout (GenericLayout is the fallback).
    pub fn detect(&self, doc: &Html) -> &dyn SiteLayout {
        self.layouts
            .iter()
            .find(|layout| layout.detect(doc))
            .map(|layout| &**layout)
            .unwrap_or(&GenericLayout)
    }

    /// Look a layout up by its configured name.
    pub fn by_name(&self, name: &str) -> Option<&dyn SiteLayout> {
        self.layouts
            .iter()
            .find(|layout| layout.name() == name)
            .map(|layout| &**layout)
    }

    /// Check a layout name and selector overrides without any markup.
    pub fn validate(&self, name: &str, overrides: &SelectorOverrides) -> Result<()> {
        if name != "auto" && self.by_name(name).is_none() {
            return Err(DistillError::config(format!(
                "unknown layout '{name}': expected 'auto', 'gitbook' or 'generic'"
            )));
        }

        [
            &overrides.content_container,
            &overrides.content_fragment,
            &overrides.not_found_marker,
            &overrides.table_topic_container,
            &overrides.table_topic_item,
        ]
        .into_iter()
        .flatten()
        .try_for_each(|raw| parse_selector(raw).map(drop))
    }

    /// Resolve the configured layout name against the root page markup.
    ///
    /// `"auto"` detects from `root_html`; any other value must name a
    /// registered layout.
    pub fn resolve(
        &self,
        name: &str,
        root_html: &str,
        overrides: &SelectorOverrides,
    ) -> Result<LayoutSelectors> {
        let layout = if name == "auto" {
            let doc = Html::parse_document(root_html);
            self.detect(&doc)
        } else {
            self.by_name(name).ok_or_else(|| {
                DistillError::config(format!(
                    "unknown layout '{name}': expected 'auto', 'gitbook' or 'generic'"
                ))
            })?
        };

        debug!(layout = layout.name(), requested = name, "resolved site layout");
        LayoutSelectors::compile(layout.name(), layout.preset(), overrides)
    }
}

impl Default for LayoutRegistry {
    fn default() -> Self {
        Self::new()
    }
}
