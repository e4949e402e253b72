//! Wage table extraction
//!
//! Turns a fetched page into zero or more [`WageRecord`](crate::record::WageRecord)s.
//! Interior pages (home, state listings) carry no wage table and simply yield
//! nothing.

mod table;

pub use table::{extract_from_html, extract_records, normalize_cell};
