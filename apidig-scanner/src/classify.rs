//! API endpoint heuristic.
//!
//! A URL is treated as an API endpoint when its string form contains `/api/`,
//! `/service/`, or a version segment such as `/v2/`. The version segment must
//! be followed by a slash, so `/v2` at the end of a path does not qualify.

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

static API_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/api/|/v\d+/|/service/").expect("valid API pattern"));

pub fn is_api_endpoint(url: &str) -> bool {
    API_PATTERN.is_match(url)
}

/// Keeps only the URLs matching the API heuristic.
pub fn filter_api_endpoints<'a, I>(urls: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    urls.into_iter()
        .filter(|url| is_api_endpoint(url))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_segment_matches() {
        assert!(is_api_endpoint("https://example.com/api/v2/users"));
        assert!(is_api_endpoint("https://example.com/api/"));
    }

    #[test]
    fn test_version_segment_matches() {
        assert!(is_api_endpoint("https://example.com/v12/data"));
        assert!(is_api_endpoint("https://example.com/v1/"));
    }

    #[test]
    fn test_service_segment_matches() {
        assert!(is_api_endpoint("https://example.com/service/info"));
    }

    #[test]
    fn test_static_asset_does_not_match() {
        assert!(!is_api_endpoint("https://example.com/static/app.js"));
    }

    #[test]
    fn test_version_without_trailing_slash_does_not_match() {
        assert!(!is_api_endpoint("https://example.com/version/2"));
        assert!(!is_api_endpoint("https://example.com/v2"));
        assert!(!is_api_endpoint("https://example.com/v/2/"));
    }

    #[test]
    fn test_match_is_on_full_url_string() {
        // The query string is part of the match.
        assert!(is_api_endpoint("https://example.com/search?next=/api/x"));
        assert!(!is_api_endpoint("https://example.com/apis"));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let urls: BTreeSet<String> = [
            "https://example.com/api/v1/users",
            "https://example.com/about",
            "https://example.com/v3/items/",
            "https://example.com/service/ping",
            "https://example.com/static/main.js",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let once = filter_api_endpoints(&urls);
        let twice = filter_api_endpoints(&once);

        assert_eq!(once, twice);
        assert_eq!(once.len(), 3);
        assert!(!once.contains("https://example.com/about"));
    }

    #[test]
    fn test_filter_empty_input() {
        let urls: Vec<String> = Vec::new();
        assert!(filter_api_endpoints(&urls).is_empty());
    }
}
