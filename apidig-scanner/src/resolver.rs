use crate::fetcher::Fetcher;
use crate::result::EndpointRecord;
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, warn};

pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 5;

/// Asks discovered endpoints for their JSON payloads.
pub struct Resolver {
    fetcher: Fetcher,
    concurrency: usize,
}

impl Resolver {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            concurrency: DEFAULT_RESOLVE_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// JSON body of `endpoint`, or `None` when the request or the decode fails.
    pub async fn resolve(&self, endpoint: &str) -> Option<Value> {
        match self.fetcher.try_fetch_json(endpoint).await {
            Ok(value) => {
                debug!("Resolved {}", endpoint);
                Some(value)
            }
            Err(e) => {
                warn!("Error retrieving data from {}: {}", endpoint, e);
                None
            }
        }
    }

    /// Resolves every endpoint, keeping each result attached to its endpoint.
    /// Records come back in the order the endpoints were given.
    pub async fn resolve_all<I>(&self, endpoints: I) -> Vec<EndpointRecord>
    where
        I: IntoIterator<Item = String>,
    {
        stream::iter(endpoints)
            .map(|endpoint| async move {
                let data = self.resolve(&endpoint).await;
                EndpointRecord::new(endpoint, data)
            })
            .buffered(self.concurrency)
            .collect()
            .await
    }
}
