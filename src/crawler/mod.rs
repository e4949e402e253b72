//! Crawler module: fetching, pacing and crawl orchestration
//!
//! - [`PageFetcher`] is the seam between the engine and the network
//! - [`HttpFetcher`] fetches over HTTP through an optional [`ResponseCache`]
//! - [`CrawlEngine`] walks the site from a set of seeds

mod cache;
mod engine;
mod fetcher;
mod frontier;
mod pacer;
mod stats;

pub use cache::{CacheError, CacheResult, CachedResponse, ResponseCache};
pub use engine::{CrawlEngine, CrawlOutcome, CrawlRun};
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use frontier::Frontier;
pub use pacer::RequestPacer;
pub use stats::CrawlStats;
