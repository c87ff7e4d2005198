//! Page tree assembly.

use std::collections::HashSet;

use scraper::Html;
use tracing::{debug, instrument};

use docdistill_shared::{DistillError, PageTree, Result, Section};

use crate::associate::{Association, associate};
use crate::layouts::LayoutSelectors;

/// Assemble a [`PageTree`] from one page's heading association.
///
/// The first level-1 heading is the page title. Every sub-heading becomes a
/// [`Section`] in document order. A page with no headings at all is an
/// [`DistillError::EmptyPage`].
pub fn build(url: &str, topic: &str, assoc: Association) -> Result<PageTree> {
    if !assoc.has_headings() {
        return Err(DistillError::EmptyPage { url: url.into() });
    }

    let info = assoc.title_scope.info();
    let sections = assoc
        .subtitles
        .into_iter()
        .zip(assoc.subtitle_scopes)
        .map(|(subtitle, scope)| Section {
            subtitle,
            info: scope.info(),
            links: scope.links,
            tables: scope.tables,
        })
        .collect();

    Ok(PageTree {
        topic: topic.to_string(),
        title: assoc.titles.into_iter().next(),
        info,
        links: assoc.title_scope.links,
        tables: assoc.title_scope.tables,
        sections,
    })
}

/// Turns page markup into page trees under one layout and ignore-set.
#[derive(Debug, Clone)]
pub struct PageExtractor {
    layout: LayoutSelectors,
    ignore_links: HashSet<String>,
}

impl PageExtractor {
    pub fn new(layout: LayoutSelectors, ignore_links: &[String]) -> Self {
        Self {
            layout,
            ignore_links: ignore_links.iter().cloned().collect(),
        }
    }

    pub fn layout(&self) -> &LayoutSelectors {
        &self.layout
    }

    /// Heading association for `html`.
    pub fn associate(&self, html: &str) -> Association {
        associate(&Html::parse_document(html), &self.layout, &self.ignore_links)
    }

    /// Extract the page tree for `html` fetched from `url`.
    #[instrument(skip_all, fields(url = %url, layout = self.layout.name()))]
    pub fn extract(&self, html: &str, url: &str, topic: &str) -> Result<PageTree> {
        let tree = build(url, topic, self.associate(html))?;
        debug!(
            title = tree.title.as_deref().unwrap_or(""),
            sections = tree.sections.len(),
            tables = tree.tables.len(),
            "built page tree"
        );
        Ok(tree)
    }
}
