//! Depth-first discovery of same-site content pages.
//!
//! Starting from the root page, every relative (`/`-prefixed) link is
//! fetched once, checked for the site's "page not found" marker, and, if the
//! page exists, recorded and expanded in link order. The [`VisitedSet`] is
//! the only cycle guard: a path is claimed before it is fetched, so mutual
//! links never recurse.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

use docdistill_shared::Result;

use crate::fetch::PageFetcher;

static LINK_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

// ---------------------------------------------------------------------------
// VisitedSet
// ---------------------------------------------------------------------------

/// URL paths already handled by a crawl.
///
/// `claim` is the single check-and-insert step; every path is claimed before
/// it is fetched, whether it later turns out to exist or not.
#[derive(Debug, Default, Clone)]
pub struct VisitedSet {
    claimed: HashSet<String>,
    found: HashSet<String>,
    discovered: Vec<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `path` for fetching. Returns `false` if it was already claimed.
    pub fn claim(&mut self, path: &str) -> bool {
        self.claimed.insert(path.to_string())
    }

    /// Record a claimed path as an existing content page.
    fn record(&mut self, path: &str) {
        debug_assert!(self.claimed.contains(path));
        if self.found.insert(path.to_string()) {
            self.discovered.push(path.to_string());
        }
    }

    /// Whether `path` was discovered as an existing page.
    pub fn contains(&self, path: &str) -> bool {
        self.found.contains(path)
    }

    /// Discovered paths in discovery order.
    pub fn discovered(&self) -> &[String] {
        &self.discovered
    }

    pub fn len(&self) -> usize {
        self.discovered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.discovered.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Crawl output
// ---------------------------------------------------------------------------

/// A discovered page together with the markup fetched while discovering it.
#[derive(Debug, Clone)]
pub struct DiscoveredPage {
    /// Root-relative path as linked (e.g. `/basics/lore`).
    pub path: String,
    /// Absolute URL.
    pub url: Url,
    /// Raw markup.
    pub html: String,
}

/// A page the crawl could not use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub url: String,
    pub reason: String,
}

/// Summary of a completed discovery crawl.
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    /// Existing pages in discovery order.
    pub pages: Vec<DiscoveredPage>,
    /// Pages that failed to fetch or carried the "not found" marker.
    pub skipped: Vec<SkippedPage>,
    /// Total duration of the crawl.
    pub duration: Duration,
}

// ---------------------------------------------------------------------------
// CrawlFrontier
// ---------------------------------------------------------------------------

/// Discovers all same-site content pages reachable from a root URL.
pub struct CrawlFrontier<'a, F> {
    root: Url,
    fetcher: &'a F,
    not_found: Option<Selector>,
}

impl<'a, F: PageFetcher> CrawlFrontier<'a, F> {
    pub fn new(root: Url, fetcher: &'a F) -> Self {
        Self {
            root,
            fetcher,
            not_found: None,
        }
    }

    /// Treat pages containing `marker` as non-existent.
    pub fn with_not_found_marker(mut self, marker: Option<Selector>) -> Self {
        self.not_found = marker;
        self
    }

    /// Fetch the root page and crawl from it.
    ///
    /// A root fetch failure is returned as an error; every later failure is
    /// recorded in [`CrawlOutcome::skipped`].
    pub async fn crawl(&self, visited: &mut VisitedSet) -> Result<CrawlOutcome> {
        let root_html = self.fetcher.fetch(&self.root).await?;
        Ok(self.crawl_from(&root_html, visited).await)
    }

    /// Crawl using already-fetched root markup.
    #[instrument(skip_all, fields(root = %self.root))]
    pub async fn crawl_from(&self, root_html: &str, visited: &mut VisitedSet) -> CrawlOutcome {
        let start = Instant::now();
        let root_path = self.root.path().to_string();
        let mut outcome = CrawlOutcome::default();

        // One link iterator per page on the current descent path; the top of
        // the stack is the page being expanded.
        let mut stack = vec![self.scan(root_html).links.into_iter()];

        while let Some(links) = stack.last_mut() {
            let Some(path) = links.next() else {
                stack.pop();
                continue;
            };

            if !visited.claim(&path) {
                continue;
            }

            let url = match self.root.join(&path) {
                Ok(url) => url,
                Err(e) => {
                    debug!(%path, error = %e, "unresolvable link, skipping");
                    continue;
                }
            };

            let html = if path == root_path {
                root_html.to_string()
            } else {
                match self.fetcher.fetch(&url).await {
                    Ok(html) => html,
                    Err(e) => {
                        warn!(%url, error = %e, "fetch failed, skipping page");
                        outcome.skipped.push(SkippedPage {
                            url: url.to_string(),
                            reason: e.to_string(),
                        });
                        continue;
                    }
                }
            };

            let scan = self.scan(&html);
            if scan.missing {
                info!(%url, "page does not exist");
                outcome.skipped.push(SkippedPage {
                    url: url.to_string(),
                    reason: "page not found".into(),
                });
                continue;
            }

            visited.record(&path);
            debug!(%url, found = visited.len(), "discovered page");

            let expand = path != "/" && path != root_path;
            outcome.pages.push(DiscoveredPage { path, url, html });
            if expand && !scan.links.is_empty() {
                stack.push(scan.links.into_iter());
            }
        }

        outcome.duration = start.elapsed();
        info!(
            discovered = outcome.pages.len(),
            skipped = outcome.skipped.len(),
            duration_ms = outcome.duration.as_millis(),
            "discovery completed"
        );
        outcome
    }

    fn scan(&self, html: &str) -> PageScan {
        let doc = Html::parse_document(html);
        let missing = self
            .not_found
            .as_ref()
            .is_some_and(|marker| doc.select(marker).next().is_some());
        let links = if missing {
            Vec::new()
        } else {
            extract_relative_links(&doc)
        };
        PageScan { missing, links }
    }
}

/// What discovery needs from one page's markup.
struct PageScan {
    missing: bool,
    links: Vec<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Root-relative link targets in document order, fragments removed.
fn extract_relative_links(doc: &Html) -> Vec<String> {
    doc.select(&LINK_SEL)
        .filter_map(|el| el.value().attr("href"))
        .filter(|href| href.starts_with('/') && !href.starts_with("//"))
        .map(|href| match href.split_once('#') {
            Some((before, _)) if before.is_empty() => "/".to_string(),
            Some((before, _)) => before.to_string(),
            None => href.to_string(),
        })
        .collect()
}

/// Output file path (without extension) for a discovered page path.
///
/// `/` maps to `introduction`; `/a/b` maps to `a/b` with the platform
/// separator. A trailing `/` adds an `index` segment (`/a/` is `a/index`)
/// and a query is folded into the last segment (`/b?tab=1` is `b_tab_1`),
/// so those variants do not share a file with the bare path. `.`/`..`
/// segments are dropped.
pub fn page_file_path(path: &str) -> PathBuf {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut segments: Vec<String> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        segments.push("introduction".into());
    } else if path.ends_with('/') {
        segments.push("index".into());
    }

    if let Some(query) = query.filter(|q| !q.is_empty()) {
        let encoded: String = query
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        if let Some(last) = segments.last_mut() {
            last.push('_');
            last.push_str(&encoded);
        }
    }

    segments.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::HttpFetcher;
    use docdistill_shared::CrawlConfig;
    use wiremock::matchers::path;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MISSING: &str = r#"<html><body><div class="missing">Page not found</div></body></html>"#;

    fn page(title: &str, links: &[&str]) -> String {
        let anchors: String = links
            .iter()
            .map(|href| format!(r#"<a href="{href}">{href}</a>"#))
            .collect();
        format!("<html><body><h1>{title}</h1><nav>{anchors}</nav></body></html>")
    }

    async fn serve(server: &MockServer, route: &str, body: String) {
        Mock::given(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&CrawlConfig {
            timeout_secs: 5,
            retries: 0,
            retry_backoff_ms: 0,
            rate_limit_ms: 0,
            user_agent: "docdistill-test".into(),
        })
        .unwrap()
    }

    fn marker() -> Option<Selector> {
        Some(Selector::parse("div.missing").unwrap())
    }

    #[test]
    fn visited_set_claims_once() {
        let mut visited = VisitedSet::new();
        assert!(visited.claim("/a"));
        assert!(!visited.claim("/a"));
        assert!(!visited.contains("/a"));

        visited.record("/a");
        assert!(visited.contains("/a"));
        assert_eq!(visited.discovered(), ["/a".to_string()]);
    }

    #[test]
    fn discovered_pages_keep_order_and_stay_unique() {
        let mut visited = VisitedSet::new();
        for path in ["/c", "/a", "/b"] {
            assert!(visited.claim(path));
            visited.record(path);
        }
        visited.record("/a");

        assert_eq!(visited.discovered(), ["/c", "/a", "/b"]);
        assert_eq!(visited.len(), 3);
        assert!(visited.contains("/b"));
        assert!(!visited.contains("/d"));
    }

    #[test]
    fn relative_links_are_filtered_and_stripped() {
        let doc = Html::parse_document(
            r##"<a href="/a">a</a>
                <a href="https://external.com/x">ext</a>
                <a href="//cdn.example.com/lib.js">cdn</a>
                <a href="/b#section">b</a>
                <a href="#top">top</a>
                <a href="/#hero">home</a>
                <a href="relative">rel</a>"##,
        );
        assert_eq!(extract_relative_links(&doc), vec!["/a", "/b", "/"]);
    }

    #[test]
    fn file_paths_follow_url_paths() {
        assert_eq!(page_file_path("/"), PathBuf::from("introduction"));
        assert_eq!(page_file_path(""), PathBuf::from("introduction"));
        assert_eq!(page_file_path("/basics"), PathBuf::from("basics"));
        assert_eq!(
            page_file_path("/basics/lore"),
            PathBuf::from("basics").join("lore")
        );
        assert_eq!(
            page_file_path("/a/../b?x=1"),
            PathBuf::from("a").join("b_x_1")
        );
    }

    #[test]
    fn slash_and_query_variants_get_their_own_files() {
        assert_eq!(page_file_path("/a"), PathBuf::from("a"));
        assert_eq!(page_file_path("/a/"), PathBuf::from("a").join("index"));
        assert_eq!(page_file_path("/b?tab=1"), PathBuf::from("b_tab_1"));
        assert_eq!(page_file_path("/b?tab=2"), PathBuf::from("b_tab_2"));
        assert_eq!(page_file_path("/?lang=en"), PathBuf::from("introduction_lang_en"));
        assert_eq!(page_file_path("/b?"), PathBuf::from("b"));
    }

    #[tokio::test]
    async fn crawl_discovers_depth_first() {
        let server = MockServer::start().await;
        serve(&server, "/", page("Home", &["/", "/a", "/b"])).await;
        serve(&server, "/a", page("A", &["/", "/a/1", "/a/2"])).await;
        serve(&server, "/a/1", page("A1", &["/b"])).await;
        serve(&server, "/a/2", page("A2", &[])).await;
        serve(&server, "/b", page("B", &["/a"])).await;

        let fetcher = fetcher();
        let root = Url::parse(&server.uri()).unwrap();
        let frontier = CrawlFrontier::new(root, &fetcher).with_not_found_marker(marker());

        let mut visited = VisitedSet::new();
        let outcome = frontier.crawl(&mut visited).await.unwrap();

        // /b is reached through /a/1 before the root's own /b link.
        assert_eq!(visited.discovered(), ["/", "/a", "/a/1", "/b", "/a/2"]);
        let paths: Vec<&str> = outcome.pages.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, ["/", "/a", "/a/1", "/b", "/a/2"]);
        assert!(outcome.skipped.is_empty());
        assert!(outcome.pages[1].html.contains("<h1>A</h1>"));
    }

    #[tokio::test]
    async fn crawl_terminates_on_cycles() {
        let server = MockServer::start().await;
        serve(&server, "/", page("A", &["/b"])).await;
        Mock::given(path("/b"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page("B", &["/", "/b"])))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let root = Url::parse(&server.uri()).unwrap();
        let frontier = CrawlFrontier::new(root, &fetcher);

        let mut visited = VisitedSet::new();
        frontier.crawl(&mut visited).await.unwrap();

        let found: HashSet<&str> = visited.discovered().iter().map(String::as_str).collect();
        assert_eq!(found, HashSet::from(["/", "/b"]));
    }

    #[tokio::test]
    async fn not_found_pages_are_excluded() {
        let server = MockServer::start().await;
        serve(&server, "/", page("Home", &["/gone", "/kept"])).await;
        serve(&server, "/gone", MISSING.to_string()).await;
        serve(&server, "/kept", page("Kept", &[])).await;

        let fetcher = fetcher();
        let root = Url::parse(&server.uri()).unwrap();
        let frontier = CrawlFrontier::new(root, &fetcher).with_not_found_marker(marker());

        let mut visited = VisitedSet::new();
        let outcome = frontier.crawl(&mut visited).await.unwrap();

        assert_eq!(visited.discovered(), ["/kept"]);
        assert!(!visited.contains("/gone"));
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].reason, "page not found");
    }

    #[tokio::test]
    async fn fetch_failures_do_not_abort_the_crawl() {
        let server = MockServer::start().await;
        serve(&server, "/", page("Home", &["/broken", "/fine"])).await;
        Mock::given(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;
        serve(&server, "/fine", page("Fine", &["/broken"])).await;

        let fetcher = fetcher();
        let root = Url::parse(&server.uri()).unwrap();
        let frontier = CrawlFrontier::new(root, &fetcher);

        let mut visited = VisitedSet::new();
        let outcome = frontier.crawl(&mut visited).await.unwrap();

        assert_eq!(visited.discovered(), ["/fine"]);
        assert_eq!(outcome.skipped.len(), 1);
        assert!(outcome.skipped[0].reason.contains("500"));
    }

    #[tokio::test]
    async fn root_fetch_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(path("/"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = fetcher();
        let root = Url::parse(&server.uri()).unwrap();
        let frontier = CrawlFrontier::new(root, &fetcher);

        let mut visited = VisitedSet::new();
        assert!(frontier.crawl(&mut visited).await.is_err());
        assert!(visited.is_empty());
    }
}
