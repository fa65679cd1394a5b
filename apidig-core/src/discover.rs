use apidig_scanner::fetcher::DEFAULT_TIMEOUT_SECS;
use apidig_scanner::crawler::DEFAULT_CONCURRENCY;
use apidig_scanner::{Crawler, EndpointRecord, Resolver};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Options for configuring a discovery session
#[derive(Debug, Clone)]
pub struct DiscoverOptions {
    pub url: String,
    pub concurrency: usize,
    pub timeout_secs: u64,
    pub max_depth: Option<usize>,
    pub max_pages: Option<usize>,
    pub global_limit: Option<usize>,
    /// Request every discovered endpoint for its JSON payload
    pub resolve: bool,
    pub show_progress_bars: bool,
}

impl DiscoverOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_depth: None,
            max_pages: None,
            global_limit: None,
            resolve: true,
            show_progress_bars: false,
        }
    }
}

/// Callback for reporting session milestones
pub type DiscoverProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Everything a discovery session produced, endpoints paired with their data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryReport {
    pub seed: String,
    pub pages_visited: usize,
    pub resolved: bool,
    pub records: Vec<EndpointRecord>,
}

impl DiscoveryReport {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.endpoint.as_str())
    }

    pub fn resolved_count(&self) -> usize {
        self.records.iter().filter(|record| record.is_resolved()).count()
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Crawl from the seed, then resolve what was found.
pub async fn execute_discovery(
    options: DiscoverOptions,
    progress_callback: Option<DiscoverProgressCallback>,
) -> Result<DiscoveryReport, String> {
    let DiscoverOptions {
        url,
        concurrency,
        timeout_secs,
        max_depth,
        max_pages,
        global_limit,
        resolve,
        show_progress_bars,
    } = options;

    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .map_err(|e| format!("Invalid progress template: {}", e))?,
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(Arc::new(pb))
    } else {
        None
    };

    let mut crawler = Crawler::with_timeout(timeout_secs)
        .map_err(|e| e.to_string())?
        .with_concurrency(concurrency);
    if let Some(depth) = max_depth {
        crawler = crawler.with_max_depth(depth);
    }
    if let Some(pages) = max_pages {
        crawler = crawler.with_max_pages(pages);
    }
    if let Some(permits) = global_limit {
        crawler = crawler.with_global_limit(permits);
    }
    if let Some(ref pb) = progress_bar {
        let pb_clone = pb.clone();
        crawler = crawler.with_progress_callback(Arc::new(move |count: usize, url: String| {
            pb_clone.set_message(format!(
                "Crawling... {} URLs claimed ({})",
                count,
                extract_url_path(&url)
            ));
        }));
    }

    if let Some(ref callback) = progress_callback {
        callback(format!("Crawling {}", url));
    }

    let summary = match crawler.crawl(&url).await {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.finish_and_clear();
            }
            return Err(format!("Failed to crawl {}: {}", url, e));
        }
    };

    if let Some(ref callback) = progress_callback {
        callback(format!(
            "Found {} API endpoints across {} URLs",
            summary.endpoints.len(),
            summary.pages_visited
        ));
    }

    let records = if resolve && !summary.endpoints.is_empty() {
        if let Some(ref pb) = progress_bar {
            pb.set_message(format!("Resolving {} endpoints...", summary.endpoints.len()));
        }
        Resolver::new(crawler.fetcher().clone())
            .with_concurrency(concurrency)
            .resolve_all(summary.endpoints.iter().cloned())
            .await
    } else {
        summary
            .endpoints
            .iter()
            .cloned()
            .map(EndpointRecord::unresolved)
            .collect()
    };

    if let Some(ref pb) = progress_bar {
        pb.finish_with_message(format!(
            "Discovery complete! {} endpoints, {} URLs crawled",
            records.len(),
            summary.pages_visited
        ));
    }

    info!("Discovery of {} produced {} records", summary.seed, records.len());

    Ok(DiscoveryReport {
        seed: summary.seed,
        pages_visited: summary.pages_visited,
        resolved: resolve,
        records,
    })
}
