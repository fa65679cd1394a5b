pub mod commands;

// Include handlers module directly from handlers.rs
#[path = "handlers.rs"]
pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{build_discover_options, expand_output_path, parse_seed_url, report_format};

pub use apidig_core::discover::{
    DiscoverOptions, DiscoverProgressCallback, DiscoveryReport, execute_discovery,
    extract_url_path,
};
