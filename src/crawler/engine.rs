//! Crawl engine - frontier-driven crawl orchestration
//!
//! A single coordinator task owns the frontier and the visited set. It hands
//! URLs to a bounded pool of worker slots, each paced by its own
//! [`RequestPacer`], and merges what every fetched page yields: wage records
//! go to the consumer, classified links go back into the frontier.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::crawler::pacer::RequestPacer;
use crate::crawler::stats::CrawlStats;
use crate::extract::extract_records;
use crate::record::WageRecord;
use crate::url::{classify_link, link_kind, normalize_parsed, normalize_url};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Records buffered between the coordinator and a slow consumer
const RECORD_BUFFER: usize = 256;

/// Drives crawls against a [`PageFetcher`]
pub struct CrawlEngine {
    fetcher: Arc<dyn PageFetcher>,
    config: CrawlerConfig,
}

impl CrawlEngine {
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: CrawlerConfig) -> Self {
        Self { fetcher, config }
    }

    /// Starts a crawl from `seeds` and returns a handle to its record stream
    ///
    /// Every call gets a fresh frontier and visited set. The crawl ends when
    /// the frontier drains or `cancel` fires; on cancellation no new fetches
    /// start, fetches already in flight finish and their records are still
    /// delivered.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn crawl(&self, seeds: Vec<Url>, cancel: CancellationToken) -> CrawlRun {
        let (tx, rx) = mpsc::channel(RECORD_BUFFER);
        let coordinator = Coordinator::new(Arc::clone(&self.fetcher), &self.config, seeds);
        let handle = tokio::spawn(coordinator.run(tx, cancel));

        CrawlRun {
            records: ReceiverStream::new(rx),
            handle,
        }
    }

    /// Runs a crawl to completion and collects every record
    pub async fn run(&self, seeds: Vec<Url>, cancel: CancellationToken) -> CrawlOutcome {
        self.crawl(seeds, cancel).collect().await
    }
}

/// Everything a finished crawl produced
#[derive(Debug)]
pub struct CrawlOutcome {
    pub records: Vec<WageRecord>,
    pub stats: CrawlStats,
}

/// A crawl in progress
pub struct CrawlRun {
    records: ReceiverStream<WageRecord>,
    handle: JoinHandle<CrawlStats>,
}

impl CrawlRun {
    /// Waits for the next record; None once the crawl has finished
    pub async fn next_record(&mut self) -> Option<WageRecord> {
        self.records.next().await
    }

    /// The lazy record stream
    pub fn records(&mut self) -> &mut ReceiverStream<WageRecord> {
        &mut self.records
    }

    /// Stops consuming and waits for the crawl task to end
    ///
    /// Records not yet read are discarded, and dropping the stream makes the
    /// coordinator stop dispatching. Drain the stream first to keep them.
    pub async fn finish(self) -> CrawlStats {
        drop(self.records);
        match self.handle.await {
            Ok(stats) => stats,
            Err(e) => {
                tracing::error!("Crawl task failed: {}", e);
                CrawlStats::default()
            }
        }
    }

    /// Drains every record, then waits for the crawl task
    pub async fn collect(mut self) -> CrawlOutcome {
        let mut records = Vec::new();
        while let Some(record) = self.records.next().await {
            records.push(record);
        }
        let stats = self.finish().await;
        CrawlOutcome { records, stats }
    }
}

/// What happened to one dequeued URL
enum PageResult {
    Fetched {
        url: Url,
        page: FetchedPage,
        records: Vec<WageRecord>,
        links: Vec<Url>,
    },
    Failed {
        url: Url,
        error: FetchError,
    },
    /// Cancelled before the fetch started
    Skipped {
        url: Url,
    },
}

struct PageTaskOutput {
    slot: usize,
    result: PageResult,
}

/// Owns the crawl state for one run
struct Coordinator {
    fetcher: Arc<dyn PageFetcher>,
    frontier: Frontier,
    pacers: Vec<RequestPacer>,
    /// Normalized final URLs whose records were already sent
    emitted_pages: HashSet<String>,
    stats: CrawlStats,
}

impl Coordinator {
    fn new(fetcher: Arc<dyn PageFetcher>, config: &CrawlerConfig, seeds: Vec<Url>) -> Self {
        let seeds = seeds.into_iter().filter_map(|seed| {
            let raw = seed.to_string();
            match normalize_parsed(seed) {
                Ok(url) => Some(url),
                Err(e) => {
                    tracing::warn!("Ignoring seed {}: {}", raw, e);
                    None
                }
            }
        });
        let frontier = Frontier::with_seeds(seeds);
        let workers = config.max_concurrent_fetches.max(1) as usize;

        let stats = CrawlStats {
            urls_enqueued: frontier.len() as u64,
            ..CrawlStats::default()
        };

        Self {
            fetcher,
            frontier,
            pacers: vec![RequestPacer::new(config.min_delay()); workers],
            emitted_pages: HashSet::new(),
            stats,
        }
    }

    /// Runs the main crawl loop
    ///
    /// 1. Fill idle worker slots from the frontier
    /// 2. Wait for a page task to finish (or for cancellation)
    /// 3. Forward its records, enqueue its unseen links
    /// 4. Stop once nothing is queued or in flight
    async fn run(mut self, records: mpsc::Sender<WageRecord>, cancel: CancellationToken) -> CrawlStats {
        tracing::info!(
            "Starting crawl: {} seed URLs, {} workers",
            self.frontier.len(),
            self.pacers.len()
        );

        let start_time = Instant::now();
        let mut in_flight: JoinSet<PageTaskOutput> = JoinSet::new();
        let mut idle_slots: Vec<usize> = (0..self.pacers.len()).rev().collect();
        let mut stopping = false;
        let mut pages_done: u64 = 0;

        loop {
            if !stopping && cancel.is_cancelled() {
                tracing::info!(
                    "Cancellation requested, waiting for {} in-flight fetches",
                    in_flight.len()
                );
                stopping = true;
            }

            if !stopping {
                self.dispatch(&mut in_flight, &mut idle_slots, &cancel);
            }

            if in_flight.is_empty() {
                if !stopping && !self.frontier.is_empty() {
                    // Only reachable if every page task panicked and took its slot with it
                    tracing::error!(
                        "No worker slots left, abandoning {} queued URLs",
                        self.frontier.len()
                    );
                }
                break;
            }

            tokio::select! {
                _ = cancel.cancelled(), if !stopping => continue,
                joined = in_flight.join_next() => {
                    match joined {
                        Some(Ok(output)) => {
                            idle_slots.push(output.slot);
                            if !self.handle_result(output.result, &records).await {
                                stopping = true;
                            }
                        }
                        Some(Err(e)) => {
                            tracing::error!("Page task failed: {}", e);
                            self.stats.pages_failed += 1;
                        }
                        None => {}
                    }

                    pages_done += 1;
                    if pages_done % 10 == 0 {
                        let rate = pages_done as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages done, {} records, {} in frontier, {:.2} pages/sec",
                            pages_done,
                            self.stats.records_emitted,
                            self.frontier.len(),
                            rate
                        );
                    }
                }
            }
        }

        self.stats.frontier_remaining = self.frontier.len() as u64;
        self.stats.cancelled = cancel.is_cancelled();
        tracing::debug!(
            "{} distinct URLs scheduled in {:?}",
            self.frontier.visited_count(),
            start_time.elapsed()
        );
        self.stats.log_summary();
        self.stats
    }

    /// Hands queued URLs to idle worker slots
    fn dispatch(
        &mut self,
        in_flight: &mut JoinSet<PageTaskOutput>,
        idle_slots: &mut Vec<usize>,
        cancel: &CancellationToken,
    ) {
        while !self.frontier.is_empty() {
            let Some(slot) = idle_slots.pop() else {
                break;
            };
            let Some(url) = self.frontier.pop() else {
                idle_slots.push(slot);
                break;
            };

            // Cached pages never reach the origin, so they don't consume the slot's budget
            let wait = if self.fetcher.is_cached(&url) {
                Duration::ZERO
            } else {
                self.pacers[slot].reserve(Instant::now())
            };

            tracing::debug!("Dispatching {} on worker {} after {:?}", url, slot, wait);

            let fetcher = Arc::clone(&self.fetcher);
            let cancel = cancel.clone();
            in_flight.spawn(async move {
                let result = fetch_page(fetcher, url, wait, cancel).await;
                PageTaskOutput { slot, result }
            });
        }
    }

    /// Merges one page's outcome into the crawl
    ///
    /// Returns false if the record consumer has gone away.
    async fn handle_result(&mut self, result: PageResult, records: &mpsc::Sender<WageRecord>) -> bool {
        match result {
            PageResult::Fetched {
                url,
                page,
                records: page_records,
                links,
            } => {
                self.stats.pages_fetched += 1;
                if page.from_cache {
                    self.stats.cache_hits += 1;
                }

                let page_key = match normalize_url(&page.final_url) {
                    Ok(final_url) => final_url.to_string(),
                    Err(_) => page.final_url.clone(),
                };

                // A redirect target counts as visited too
                if page_key != url.as_str() {
                    self.frontier.mark_visited(&page_key);
                }

                tracing::debug!(
                    "Fetched {} (HTTP {}): {} records, {} crawlable links",
                    url,
                    page.status_code,
                    page_records.len(),
                    links.len()
                );

                if !page_records.is_empty() {
                    if self.emitted_pages.insert(page_key) {
                        for record in page_records {
                            if records.send(record).await.is_err() {
                                tracing::info!("Record consumer closed, stopping crawl");
                                return false;
                            }
                            self.stats.records_emitted += 1;
                        }
                    } else {
                        tracing::debug!("Records for {} already emitted", page.final_url);
                    }
                }

                for link in links {
                    if self.frontier.enqueue(link) {
                        self.stats.urls_enqueued += 1;
                    } else {
                        self.stats.duplicate_links += 1;
                    }
                }
            }

            PageResult::Failed { url, error } => {
                tracing::warn!("Dropping {}: {}", url, error);
                self.stats.pages_failed += 1;
            }

            PageResult::Skipped { url } => {
                tracing::debug!("Skipped {} after cancellation", url);
                self.stats.pages_skipped += 1;
            }
        }

        true
    }
}

/// Waits out the pacing delay, fetches the page and scans it
async fn fetch_page(
    fetcher: Arc<dyn PageFetcher>,
    url: Url,
    wait: Duration,
    cancel: CancellationToken,
) -> PageResult {
    if !wait.is_zero() {
        tokio::select! {
            _ = cancel.cancelled() => return PageResult::Skipped { url },
            _ = tokio::time::sleep(wait) => {}
        }
    }

    if cancel.is_cancelled() {
        return PageResult::Skipped { url };
    }

    match fetcher.fetch(&url).await {
        Ok(page) => {
            let (records, links) = scan_page(&page);
            PageResult::Fetched {
                url,
                page,
                records,
                links,
            }
        }
        Err(error) => PageResult::Failed { url, error },
    }
}

/// Runs extraction and link discovery over one page body
///
/// The two are independent: a leaf page may carry both a wage table and
/// links, an interior page only links.
fn scan_page(page: &FetchedPage) -> (Vec<WageRecord>, Vec<Url>) {
    let document = Html::parse_document(&page.body);
    let records = extract_records(&document, &page.final_url);

    let links = match Url::parse(&page.final_url) {
        Ok(base) => discover_links(&document, &base),
        Err(e) => {
            tracing::warn!("Cannot resolve links on {}: {}", page.final_url, e);
            Vec::new()
        }
    };

    (records, links)
}

/// Classifies every `a[href]` on the page, keeping crawlable ones
fn discover_links(document: &Html, base: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter_map(|href| {
            let url = classify_link(href, base)?;
            if let Some(kind) = link_kind(href) {
                tracing::trace!("{:?} link: {}", kind, url);
            }
            Some(url)
        })
        .collect()
}
