//! Candidate URL extraction from HTML documents and script text.

use crate::error::{Result, ScanError};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use tracing::{debug, warn};
use url::Url;

/// `http(s)://` followed by a run of characters that are neither whitespace nor quotes.
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'`]+"#).expect("valid URL pattern"));

/// Absolute URLs referenced by `<a href>`, `<script src>` and literal URLs inside script bodies.
///
/// Relative references are resolved against `base_url`. Anything that fails to
/// resolve is skipped, and a document that cannot be processed yields an empty set.
pub fn extract_urls(html: &str, base_url: &str) -> BTreeSet<String> {
    match try_extract_urls(html, base_url) {
        Ok(urls) => urls,
        Err(e) => {
            warn!("Error extracting URLs from {}: {}", base_url, e);
            BTreeSet::new()
        }
    }
}

pub fn try_extract_urls(html: &str, base_url: &str) -> Result<BTreeSet<String>> {
    let base = Url::parse(base_url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;
    let document = Html::parse_document(html);

    let link_selector = selector("a[href]")?;
    let script_src_selector = selector("script[src]")?;
    let script_selector = selector("script:not([src])")?;

    let mut urls = BTreeSet::new();

    for element in document.select(&link_selector) {
        if let Some(href) = element.value().attr("href")
            && let Some(absolute_url) = resolve_url(&base, href)
        {
            debug!("Found link: {}", absolute_url);
            urls.insert(absolute_url);
        }
    }

    for element in document.select(&script_src_selector) {
        if let Some(src) = element.value().attr("src")
            && let Some(absolute_url) = resolve_url(&base, src)
        {
            debug!("Found script: {}", absolute_url);
            urls.insert(absolute_url);
        }
    }

    for element in document.select(&script_selector) {
        let body: String = element.text().collect();
        if body.trim().is_empty() {
            continue;
        }
        for candidate in scan_script_urls(&body) {
            if let Some(absolute_url) = resolve_url(&base, candidate) {
                debug!("Found inline script URL: {}", absolute_url);
                urls.insert(absolute_url);
            }
        }
    }

    Ok(urls)
}

/// Every URL-shaped substring of `text`, in order of appearance.
pub fn scan_script_urls(text: &str) -> impl Iterator<Item = &str> {
    URL_PATTERN.find_iter(text).map(|m| m.as_str())
}

/// Resolves `reference` against `base`. Every reference the URL parser
/// accepts is kept, whatever its scheme; the crawler decides what to follow.
pub fn resolve_url(base: &Url, reference: &str) -> Option<String> {
    base.join(reference).ok().map(|resolved| resolved.to_string())
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(format!("selector {}: {}", css, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://example.com/app/index.html";

    #[test]
    fn test_extracts_relative_and_absolute_links() {
        let html = r#"<html><body>
            <a href="/api/v1/users">Users</a>
            <a href="about.html">About</a>
            <a href="https://other.org/page">Other</a>
        </body></html>"#;

        let urls = extract_urls(html, BASE);

        assert!(urls.contains("https://example.com/api/v1/users"));
        assert!(urls.contains("https://example.com/app/about.html"));
        assert!(urls.contains("https://other.org/page"));
        assert_eq!(urls.len(), 3);
    }

    #[test]
    fn test_extracts_script_sources() {
        let html = r#"<html><head>
            <script src="bundle.js"></script>
            <script src="//cdn.example.net/lib.js"></script>
        </head></html>"#;

        let urls = extract_urls(html, BASE);

        assert!(urls.contains("https://example.com/app/bundle.js"));
        assert!(urls.contains("https://cdn.example.net/lib.js"));
    }

    #[test]
    fn test_extracts_literal_urls_from_inline_scripts() {
        let html = r#"<html><body><script>
            var endpoint = "https://api.example.com/v2/items/";
            var cfg = {'auth': 'http://auth.example.com/service/token'};
        </script></body></html>"#;

        let urls = extract_urls(html, BASE);

        assert!(urls.contains("https://api.example.com/v2/items/"));
        assert!(urls.contains("http://auth.example.com/service/token"));
    }

    #[test]
    fn test_keeps_non_navigable_hrefs_resolved() {
        let html = r##"<html><body>
            <a href="">empty</a>
            <a href="#top">anchor</a>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:someone@example.com">mail</a>
            <a href="tel:+123">phone</a>
            <a href="ftp://files.example.com/x">ftp</a>
        </body></html>"##;

        let urls = extract_urls(html, BASE);

        assert!(urls.contains("https://example.com/app/index.html"));
        assert!(urls.contains("https://example.com/app/index.html#top"));
        assert!(urls.contains("javascript:void(0)"));
        assert!(urls.contains("mailto:someone@example.com"));
        assert!(urls.contains("tel:+123"));
        assert!(urls.contains("ftp://files.example.com/x"));
        assert_eq!(urls.len(), 6);
    }

    #[test]
    fn test_external_script_body_is_not_scanned() {
        let html = r#"<html><body>
            <script src="/static/app.js">var fallback = "https://x.com/api/ignored/";</script>
            <script>var live = "https://x.com/api/live/";</script>
        </body></html>"#;

        let urls = extract_urls(html, BASE);

        assert!(urls.contains("https://example.com/static/app.js"));
        assert!(urls.contains("https://x.com/api/live/"));
        assert!(!urls.contains("https://x.com/api/ignored/"));
    }

    #[test]
    fn test_malformed_html_is_not_an_error() {
        let html = "<html><body><a href='/api/x/'>unterminated <div><script src=";
        let urls = extract_urls(html, BASE);
        assert!(urls.contains("https://example.com/api/x/"));
    }

    #[test]
    fn test_invalid_base_yields_empty_set() {
        let html = r#"<a href="/api/v1/users">x</a>"#;
        assert!(extract_urls(html, "not a url").is_empty());
        assert!(try_extract_urls(html, "not a url").is_err());
    }

    #[test]
    fn test_every_href_and_src_is_present() {
        let hrefs = ["/a", "b/c", "../d", "https://x.org/e", "?q=1", "#frag", "", "mailto:a@b.c"];
        let srcs = ["/s1.js", "s2.js"];

        let mut html = String::from("<html><body>");
        for href in hrefs {
            html.push_str(&format!(r#"<a href="{}">x</a>"#, href));
        }
        for src in srcs {
            html.push_str(&format!(r#"<script src="{}"></script>"#, src));
        }
        html.push_str("</body></html>");

        let urls = extract_urls(&html, BASE);
        let base = Url::parse(BASE).unwrap();
        for reference in hrefs.iter().chain(srcs.iter()) {
            let expected = base.join(reference).unwrap().to_string();
            assert!(urls.contains(&expected), "missing {}", expected);
        }
    }

    #[test]
    fn test_scan_script_urls_stops_at_quotes_and_whitespace() {
        let text = r#"a("https://x.com/api/v1/login");b='http://y.com/v1/z' c=https://z.com/p q"#;
        let found: Vec<&str> = scan_script_urls(text).collect();
        assert_eq!(
            found,
            vec![
                "https://x.com/api/v1/login",
                "http://y.com/v1/z",
                "https://z.com/p"
            ]
        );
    }
}
