use crate::error::{Result, ScanError};
use rand::seq::SliceRandom;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CONNECTION, USER_AGENT};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Browser identities rotated across requests.
pub const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_13_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/13.1.2 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
];

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Single-shot HTTP GET with a rotated identity and a fixed timeout.
///
/// Cloning is cheap: the underlying connection pool and the optional
/// admission gate are shared between clones.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    gate: Option<Arc<Semaphore>>,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| ScanError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            gate: None,
        })
    }

    /// Caps the number of requests in flight across every clone of this fetcher.
    pub fn with_global_limit(mut self, permits: usize) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(permits.max(1))));
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn global_limit_available(&self) -> Option<usize> {
        self.gate.as_ref().map(|gate| gate.available_permits())
    }

    /// Fetches a page or script body. Failures are logged and reported as `None`.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        match self.try_fetch(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!("Error fetching {}: {}", url, e);
                None
            }
        }
    }

    pub async fn try_fetch(&self, url: &str) -> Result<String> {
        let _permit = self.admit().await;
        debug!("Fetching {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(ACCEPT_ENCODING, "gzip, deflate, br")
            .header(CONNECTION, "keep-alive")
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }

    /// GET asking for JSON, decoding the body.
    pub async fn try_fetch_json(&self, url: &str) -> Result<Value> {
        let _permit = self.admit().await;
        debug!("Requesting JSON from {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, random_user_agent())
            .header(ACCEPT, "application/json")
            .send()
            .await?
            .error_for_status()?;

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn admit(&self) -> Option<OwnedSemaphorePermit> {
        match &self.gate {
            Some(gate) => gate.clone().acquire_owned().await.ok(),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{header, header_exists, method, path},
    };

    #[test]
    fn test_random_user_agent_comes_from_pool() {
        for _ in 0..20 {
            assert!(USER_AGENTS.contains(&random_user_agent()));
        }
    }

    #[tokio::test]
    async fn test_fetch_returns_body_and_sends_identity_headers() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header_exists("user-agent"))
            .and(header("accept-language", "en-US,en;q=0.5"))
            .and(header("accept-encoding", "gzip, deflate, br"))
            .and(header("connection", "keep-alive"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>hello</html>"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{}/page", mock_server.uri())).await;

        assert_eq!(body.as_deref(), Some("<html>hello</html>"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let body = fetcher.fetch(&format!("{}/missing", mock_server.uri())).await;

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_none() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_millis(2500)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::with_timeout(1).unwrap();
        let body = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;

        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_fetch_connection_refused_is_none() {
        let fetcher = Fetcher::with_timeout(2).unwrap();
        assert!(fetcher.fetch("http://127.0.0.1:9/").await.is_none());
    }

    #[tokio::test]
    async fn test_try_fetch_json_sends_accept_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/v1/status"))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"up":true}"#))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap();
        let value = fetcher
            .try_fetch_json(&format!("{}/api/v1/status", mock_server.uri()))
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"up": true}));
    }

    #[tokio::test]
    async fn test_global_limit_permits_are_released() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&mock_server)
            .await;

        let fetcher = Fetcher::new().unwrap().with_global_limit(2);
        assert_eq!(fetcher.global_limit_available(), Some(2));

        let url = format!("{}/x", mock_server.uri());
        let (a, b, c) = tokio::join!(fetcher.fetch(&url), fetcher.fetch(&url), fetcher.fetch(&url));
        assert!(a.is_some() && b.is_some() && c.is_some());

        assert_eq!(fetcher.global_limit_available(), Some(2));
    }
}
