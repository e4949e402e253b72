//! Output module: record files and aggregation reports

pub mod aggregate;
pub mod records;
mod report;

pub use aggregate::{aggregate, state_key, AggregationResult, LocationCategory};
pub use records::{read_records, write_records, RecordFormat, RecordWriter};
pub use report::{print_aggregation, render_sample, render_text};
