//! End-to-end `crawl` pipeline: root URL → discovery → page trees → records → output.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, warn};
use url::Url;

use docdistill_crawler::{CrawlFrontier, HttpFetcher, PageFetcher, SkippedPage, VisitedSet};
use docdistill_dataset::flatten_all;
use docdistill_extract::{LayoutRegistry, PageExtractor};
use docdistill_shared::{CrawlConfig, ExtractConfig, Result};

use crate::assembler::{
    self, AssembleConfig, AssembledPage, RunCounts, load_trees, write_records,
};

/// Configuration for a crawl run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root URL of the documentation site.
    pub url: Url,
    /// Directory all outputs are written to.
    pub output_dir: PathBuf,
    /// Fetch policy.
    pub crawl: CrawlConfig,
    /// Extraction settings.
    pub extract: ExtractConfig,
    /// Tool version string.
    pub tool_version: String,
}

impl RunConfig {
    /// Topic label: the configured one, else the root URL's host.
    pub fn topic(&self) -> String {
        self.extract
            .topic
            .clone()
            .or_else(|| self.url.host_str().map(str::to_string))
            .unwrap_or_else(|| self.url.to_string())
    }
}

/// Result of a crawl run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_dir: PathBuf,
    /// Site layout used for extraction.
    pub layout: String,
    /// Existing pages found by discovery.
    pub discovered: usize,
    /// Per-page tree files written.
    pub generated_files: Vec<PathBuf>,
    /// Records written to `data.jsonl` / `data.csv`.
    pub records: usize,
    /// Pages not turned into output, with reasons.
    pub skipped: Vec<SkippedPage>,
    pub elapsed: Duration,
}

/// Result of regenerating records from an existing `data.json`.
#[derive(Debug, Clone)]
pub struct RegenerateSummary {
    pub output_dir: PathBuf,
    pub pages: usize,
    pub records: usize,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after a page tree is built (or skipped).
    fn page_built(&self, url: &str, current: usize, total: usize);
    /// Called when the pipeline completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_built(&self, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full crawl pipeline with the HTTP fetcher.
pub async fn run(config: &RunConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let fetcher = HttpFetcher::new(&config.crawl)?;
    run_with_fetcher(config, &fetcher, progress).await
}

/// Run the full crawl pipeline.
///
/// 1. Fetch the root page and resolve the site layout
/// 2. Discover pages depth-first
/// 3. Build one page tree per discovered page
/// 4. Flatten trees into records
/// 5. Assemble the output directory
///
/// Page-level failures are collected in [`RunSummary::skipped`]. A root
/// fetch failure, invalid configuration or output write failure aborts the
/// run.
#[instrument(skip_all, fields(url = %config.url, dir = %config.output_dir.display()))]
pub async fn run_with_fetcher<F: PageFetcher>(
    config: &RunConfig,
    fetcher: &F,
    progress: &dyn ProgressReporter,
) -> Result<RunSummary> {
    let start = Instant::now();
    let registry = LayoutRegistry::new();
    registry.validate(&config.extract.layout, &config.extract.selectors)?;

    info!(url = %config.url, "starting crawl pipeline");

    // --- Phase 1: Root page + layout ---
    progress.phase("Fetching root page");
    let root_html = fetcher.fetch(&config.url).await?;
    let layout = registry.resolve(&config.extract.layout, &root_html, &config.extract.selectors)?;
    info!(layout = layout.name(), "site layout selected");

    // --- Phase 2: Discovery ---
    progress.phase("Discovering pages");
    let frontier = CrawlFrontier::new(config.url.clone(), fetcher)
        .with_not_found_marker(layout.not_found_marker().cloned());
    let mut visited = VisitedSet::new();
    let outcome = frontier.crawl_from(&root_html, &mut visited).await;
    let mut skipped = outcome.skipped;

    // --- Phase 3: Page trees ---
    progress.phase("Building page trees");
    let layout_name = layout.name().to_string();
    let extractor = PageExtractor::new(layout, &config.extract.ignore_links);
    let topic = config.topic();
    let total = outcome.pages.len();
    let mut pages = Vec::with_capacity(total);

    for (i, page) in outcome.pages.into_iter().enumerate() {
        match extractor.extract(&page.html, page.url.as_str(), &topic) {
            Ok(tree) => {
                if tree.is_empty() {
                    debug!(url = %page.url, "page has headings but no content");
                }
                pages.push(AssembledPage {
                    path: page.path,
                    tree,
                });
            }
            Err(e) if e.is_page_level() => {
                warn!(url = %page.url, error = %e, "skipping page");
                skipped.push(SkippedPage {
                    url: page.url.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
        progress.page_built(page.url.as_str(), i + 1, total);
    }

    // --- Phase 4: Records ---
    progress.phase("Flattening records");
    let trees: Vec<_> = pages.iter().map(|p| p.tree.clone()).collect();
    let records = flatten_all(&trees);

    // --- Phase 5: Output ---
    progress.phase("Writing output");
    let assemble_config = AssembleConfig {
        output_dir: config.output_dir.clone(),
        source_url: config.url.to_string(),
        topic,
        layout: layout_name.clone(),
        field_naming: config.extract.field_naming,
        tool_version: config.tool_version.clone(),
    };
    let counts = RunCounts {
        discovered: visited.len(),
        skipped: skipped.len(),
    };
    let assembled = assembler::assemble(&assemble_config, &pages, &records, counts)?;

    let summary = RunSummary {
        output_dir: assembled.output_dir,
        layout: layout_name,
        discovered: visited.len(),
        generated_files: assembled.generated_files,
        records: records.len(),
        skipped,
        elapsed: start.elapsed(),
    };

    progress.done(&summary);

    info!(
        discovered = summary.discovered,
        generated = summary.generated_files.len(),
        records = summary.records,
        skipped = summary.skipped.len(),
        elapsed_ms = summary.elapsed.as_millis(),
        "crawl pipeline complete"
    );

    Ok(summary)
}

/// Rebuild `data.jsonl` and `data.csv` from `<dir>/data.json` without network access.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn regenerate(dir: &Path) -> Result<RegenerateSummary> {
    let trees = load_trees(dir)?;
    let records = flatten_all(&trees);
    write_records(dir, &records)?;

    info!(pages = trees.len(), records = records.len(), "regenerated records");

    Ok(RegenerateSummary {
        output_dir: dir.to_path_buf(),
        pages: trees.len(),
        records: records.len(),
    })
}
