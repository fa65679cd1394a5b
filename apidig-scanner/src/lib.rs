pub mod beautify;
pub mod classify;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod js_miner;
pub mod resolver;
pub mod result;

pub use crawler::{Crawler, ProgressCallback, VisitedSet};
pub use error::ScanError;
pub use fetcher::Fetcher;
pub use resolver::Resolver;
pub use result::{CrawlSummary, EndpointRecord};
