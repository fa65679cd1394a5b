use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Outcome of one crawl session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub seed: String,
    pub endpoints: BTreeSet<String>,
    pub pages_visited: usize,
}

impl CrawlSummary {
    pub fn new(seed: String) -> Self {
        Self {
            seed,
            endpoints: BTreeSet::new(),
            pages_visited: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// An API endpoint paired with whatever it returned when asked for JSON.
///
/// `data` is `None` when the request or the JSON decode failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub endpoint: String,
    pub data: Option<Value>,
}

impl EndpointRecord {
    pub fn new(endpoint: String, data: Option<Value>) -> Self {
        Self { endpoint, data }
    }

    pub fn unresolved(endpoint: String) -> Self {
        Self {
            endpoint,
            data: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.data.is_some()
    }
}
