//! Aggregation of wage records by location type and state
//!
//! County pages live under `/counties/{fips}`, where the first two digits of
//! the FIPS code identify the state. Metro pages are counted in total only.

use crate::record::WageRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which kind of location a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationCategory {
    County,
    Metro,
}

impl LocationCategory {
    /// Categorizes a record by its URL
    ///
    /// A URL containing `counties` is a county, otherwise one containing
    /// `metros` is a metro. Anything else is not counted.
    pub fn from_url(url: &str) -> Option<Self> {
        if url.contains("counties") {
            Some(Self::County)
        } else if url.contains("metros") {
            Some(Self::Metro)
        } else {
            None
        }
    }
}

/// Per-state county counts plus totals
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationResult {
    /// County count keyed by 2-character state key, in key order
    pub counties_by_state: BTreeMap<String, usize>,
    pub total_counties: usize,
    pub total_metros: usize,
}

impl AggregationResult {
    /// Number of distinct state keys seen
    pub fn state_count(&self) -> usize {
        self.counties_by_state.len()
    }
}

/// Returns the state key of a county identifier: its first two characters
///
/// Shorter identifiers are used as-is, so `"4"` maps to `"4"` and an empty
/// identifier to an empty key.
pub fn state_key(identifier: &str) -> &str {
    match identifier.char_indices().nth(2) {
        Some((end, _)) => &identifier[..end],
        None => identifier,
    }
}

/// Reduces a batch of records to per-state county counts and totals
///
/// The result does not depend on record order.
pub fn aggregate(records: &[WageRecord]) -> AggregationResult {
    let mut result = AggregationResult::default();

    for record in records {
        match LocationCategory::from_url(&record.source_url) {
            Some(LocationCategory::County) => {
                let key = state_key(record.identifier());
                if key.len() < 2 {
                    tracing::debug!("Short county identifier in {}", record.source_url);
                }
                *result.counties_by_state.entry(key.to_string()).or_insert(0) += 1;
                result.total_counties += 1;
            }
            Some(LocationCategory::Metro) => result.total_metros += 1,
            None => tracing::debug!("Not a county or metro record: {}", record.source_url),
        }
    }

    result
}
