use crate::classify::filter_api_endpoints;
use crate::error::{Result, ScanError};
use crate::extract::extract_urls;
use crate::fetcher::Fetcher;
use crate::js_miner::{is_js_url, mine_js_endpoints};
use crate::result::CrawlSummary;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Called with the number of URLs claimed so far and the URL being crawled.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

/// URLs claimed by a crawl session. Clones share the same set.
#[derive(Clone, Default)]
pub struct VisitedSet {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `url` for the caller. Returns `false` when it was already
    /// claimed or when the set has reached `budget` entries.
    ///
    /// Check and insert happen under one lock, so concurrent callers racing
    /// on the same URL get exactly one `true`.
    pub async fn claim(&self, url: &str, budget: Option<usize>) -> bool {
        let mut visited = self.inner.lock().await;
        if visited.contains(url) {
            return false;
        }
        if budget.is_some_and(|max| visited.len() >= max) {
            return false;
        }
        visited.insert(url.to_string())
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.inner.lock().await.contains(url)
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[derive(Clone)]
pub struct Crawler {
    fetcher: Fetcher,
    concurrency: usize,
    max_depth: Option<usize>,
    max_pages: Option<usize>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new() -> Result<Self> {
        Ok(Self::with_fetcher(Fetcher::new()?))
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        Ok(Self::with_fetcher(Fetcher::with_timeout(timeout_secs)?))
    }

    pub fn with_fetcher(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_CONCURRENCY,
            max_depth: None,
            max_pages: None,
            progress_callback: None,
        }
    }

    /// Pool size used at each fan-out point (script mining and child pages).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Link hops from the seed that will still be crawled; `0` crawls the seed only.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = Some(pages);
        self
    }

    /// Bounds in-flight requests across the whole recursion tree.
    pub fn with_global_limit(mut self, permits: usize) -> Self {
        self.fetcher = self.fetcher.with_global_limit(permits);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Runs one crawl session from `start_url` and returns every API endpoint found.
    pub async fn crawl(&self, start_url: &str) -> Result<CrawlSummary> {
        let parsed_url = Url::parse(start_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", start_url, e)))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: unsupported scheme '{}'",
                start_url,
                parsed_url.scheme()
            )));
        }

        info!(
            "Starting crawl of {} with {} workers per fan-out",
            start_url, self.concurrency
        );

        let visited = VisitedSet::new();
        let endpoints =
            Self::discover(Arc::new(self.clone()), parsed_url.to_string(), visited.clone(), 0).await;
        let pages_visited = visited.len().await;

        info!(
            "Crawl complete. Visited {} pages, found {} endpoints",
            pages_visited,
            endpoints.len()
        );

        Ok(CrawlSummary {
            seed: start_url.to_string(),
            endpoints,
            pages_visited,
        })
    }

    /// Crawls `url` and everything reachable from it that `visited` has not
    /// already claimed, returning the union of all API endpoints found.
    ///
    /// Each child page runs as its own spawned task, so a long chain of links
    /// never nests polls on a single stack. Failures never surface here: a page
    /// that cannot be fetched simply contributes nothing.
    pub fn discover(
        crawler: Arc<Crawler>,
        url: String,
        visited: VisitedSet,
        depth: usize,
    ) -> BoxFuture<'static, BTreeSet<String>> {
        async move {
            if crawler.max_depth.is_some_and(|max| depth > max) {
                return BTreeSet::new();
            }

            if !visited.claim(&url, crawler.max_pages).await {
                return BTreeSet::new();
            }

            if let Some(ref callback) = crawler.progress_callback {
                callback(visited.len().await, url.clone());
            }

            let Some(content) = crawler.fetcher.fetch(&url).await else {
                return BTreeSet::new();
            };

            let links = extract_urls(&content, &url);
            let mut endpoints = filter_api_endpoints(&links);

            let js_urls: Vec<String> = links.iter().filter(|link| is_js_url(link)).cloned().collect();
            if !js_urls.is_empty() {
                endpoints.extend(mine_js_endpoints(&crawler.fetcher, js_urls, crawler.concurrency).await);
            }

            debug!(
                "[depth {}] {}: {} links, {} endpoints before recursion",
                depth,
                url,
                links.len(),
                endpoints.len()
            );

            // Only web pages are crawled; mailto:, javascript: and the like stay in `links` only
            let pages = links.into_iter().filter(|link| is_crawlable(link));
            let concurrency = crawler.concurrency;
            let children: Vec<BTreeSet<String>> = stream::iter(pages)
                .map(|link| {
                    tokio::spawn(Self::discover(
                        Arc::clone(&crawler),
                        link,
                        visited.clone(),
                        depth + 1,
                    ))
                })
                .buffer_unordered(concurrency)
                .map(|joined| {
                    joined.unwrap_or_else(|e| {
                        warn!("Crawl task failed: {}", e);
                        BTreeSet::new()
                    })
                })
                .collect()
                .await;

            for child in children {
                endpoints.extend(child);
            }

            endpoints
        }
        .boxed()
    }
}

fn is_crawlable(link: &str) -> bool {
    Url::parse(link).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}
