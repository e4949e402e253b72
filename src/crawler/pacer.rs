//! Per-worker request pacing
//!
//! Each worker slot owns a pacer that keeps the starts of its successive
//! fetches at least `min_delay` apart. This is a rate limit only; failed
//! fetches are not retried or backed off.

use std::time::{Duration, Instant};

/// Tracks when a worker last started a fetch
#[derive(Debug, Clone)]
pub struct RequestPacer {
    min_delay: Duration,
    last_start: Option<Instant>,
}

impl RequestPacer {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_start: None,
        }
    }

    /// Calculates the time until the next fetch may start
    ///
    /// Returns None if a fetch can start now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_start?;
        let ready_at = last + self.min_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the next start slot and returns how long to wait for it
    ///
    /// The reserved start (`now + wait`) becomes the reference point for the
    /// following reservation.
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let wait = self.time_until_next_request(now).unwrap_or(Duration::ZERO);
        self.last_start = Some(now + wait);
        wait
    }
}
