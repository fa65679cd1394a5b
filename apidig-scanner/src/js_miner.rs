//! Endpoint mining from JavaScript resources.
//!
//! Each script is fetched, reformatted with [`beautify`] and scanned for
//! literal URLs, which are then run through the API heuristic. The scan is a
//! best-effort signal: it only sees URLs written out as literals.

use crate::beautify::beautify;
use crate::classify::is_api_endpoint;
use crate::extract::scan_script_urls;
use crate::fetcher::Fetcher;
use futures::stream::{self, StreamExt};
use std::collections::BTreeSet;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_MINER_CONCURRENCY: usize = 5;

/// True when the URL's path names a `.js` file (query and fragment are ignored).
pub fn is_js_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| parsed.path().to_ascii_lowercase().ends_with(".js"))
        .unwrap_or(false)
}

/// Fetches every script in `js_urls` (at most `concurrency` at a time) and
/// collects the API endpoints referenced in them.
pub async fn mine_js_endpoints<I>(fetcher: &Fetcher, js_urls: I, concurrency: usize) -> BTreeSet<String>
where
    I: IntoIterator<Item = String>,
{
    let mined: Vec<BTreeSet<String>> = stream::iter(js_urls)
        .map(|js_url| async move {
            match fetcher.fetch(&js_url).await {
                Some(source) => {
                    let endpoints = scan_js_source(&source);
                    debug!("Mined {} endpoints from {}", endpoints.len(), js_url);
                    endpoints
                }
                None => BTreeSet::new(),
            }
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    mined.into_iter().flatten().collect()
}

/// API endpoints referenced as literal URLs in a script body.
///
/// Falls back to the raw text when the script cannot be reformatted.
pub fn scan_js_source(source: &str) -> BTreeSet<String> {
    let formatted = match beautify(source) {
        Ok(formatted) => formatted,
        Err(e) => {
            warn!("Error beautifying JavaScript, scanning raw text: {}", e);
            source.to_string()
        }
    };

    scan_script_urls(&formatted)
        .filter(|candidate| is_api_endpoint(candidate))
        .map(str::to_string)
        .collect()
}
