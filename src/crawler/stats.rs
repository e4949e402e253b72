//! Crawl run statistics

use serde::Serialize;

/// Counters collected over one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStats {
    /// Pages successfully fetched (network or cache)
    pub pages_fetched: u64,

    /// Pages served from the response cache
    pub cache_hits: u64,

    /// Pages dropped after a transport failure
    pub pages_failed: u64,

    /// Pages dequeued but never fetched because the run was cancelled
    pub pages_skipped: u64,

    /// Records sent to the consumer
    pub records_emitted: u64,

    /// Distinct URLs queued, seeds included
    pub urls_enqueued: u64,

    /// Classified links ignored because their URL was already scheduled
    pub duplicate_links: u64,

    /// URLs still queued when the run stopped
    pub frontier_remaining: u64,

    /// Whether the run stopped on cancellation rather than an empty frontier
    pub cancelled: bool,
}

impl CrawlStats {
    /// Logs a one-line summary of the run
    pub fn log_summary(&self) {
        tracing::info!(
            "Crawl finished{}: {} pages fetched ({} from cache), {} failed, {} records, {} URLs queued, {} left in frontier",
            if self.cancelled { " (cancelled)" } else { "" },
            self.pages_fetched,
            self.cache_hits,
            self.pages_failed,
            self.records_emitted,
            self.urls_enqueued,
            self.frontier_remaining
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_zeroed() {
        let stats = CrawlStats::default();
        assert_eq!(stats.pages_fetched, 0);
        assert_eq!(stats.records_emitted, 0);
        assert!(!stats.cancelled);
    }
}
