//! Crawl frontier and visited set
//!
//! The frontier is a FIFO queue of URLs still to fetch; the visited set holds
//! every URL ever scheduled. A URL is marked visited the moment it is
//! enqueued, so a page linked from many places is queued exactly once.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// Queue of pending URLs plus the set of URLs already scheduled
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<Url>,
    visited: HashSet<String>,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier seeded with `seeds`; duplicate seeds collapse
    pub fn with_seeds(seeds: impl IntoIterator<Item = Url>) -> Self {
        let mut frontier = Self::new();
        for seed in seeds {
            frontier.enqueue(seed);
        }
        frontier
    }

    /// Marks `url` visited and queues it, unless it was already seen
    ///
    /// Returns true if the URL was newly queued.
    pub fn enqueue(&mut self, url: Url) -> bool {
        if !self.visited.insert(url.as_str().to_string()) {
            return false;
        }
        self.queue.push_back(url);
        true
    }

    /// Records a URL as seen without queueing it (e.g. a redirect target)
    ///
    /// Returns true if the URL was not seen before.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.visited.insert(url.to_string())
    }

    /// Takes the next URL to fetch
    pub fn pop(&mut self) -> Option<Url> {
        self.queue.pop_front()
    }

    /// Number of URLs waiting to be fetched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever scheduled
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}
