pub mod cli;
pub mod config;
pub mod crawler;
pub mod dedupe;
pub mod driver;
pub mod emit;
pub mod enrich;
pub mod grep;
pub mod linkfinder;
pub mod logging;
pub mod network;
pub mod rawreq;
pub mod render;
pub mod robots;
pub mod scope;
pub mod sitemaps;
pub mod target;
pub mod url_utils;
pub mod useragent;

// Re-export main types for library usage
pub use config::{Config, CrawlOptions};
pub use crawler::{Crawler, Job};
pub use dedupe::SeenSet;
pub use emit::{EmitFilter, Kind, OutputMode, Record, Sink};
pub use network::{FetchError, Fetched, HttpClient};
pub use scope::Scope;
pub use target::{normalize_target, Target};
