//! Human-readable rendering of aggregation results

use crate::output::aggregate::AggregationResult;
use crate::record::WageRecord;
use std::fmt::Write;

/// Formats one record as a labelled block, used to eyeball a records file
pub fn render_sample(record: &WageRecord) -> String {
    let mut text = String::new();

    let _ = writeln!(text, "=== Sample Record ===\n");
    let _ = writeln!(text, "URL:   {}", record.source_url);
    let _ = writeln!(text, "Title: {}", record.title);
    for (label, row) in [
        ("Columns", &record.header_labels),
        ("Living", &record.living_wage_row),
        ("Poverty", &record.poverty_wage_row),
        ("Minimum", &record.minimum_wage_row),
    ] {
        let _ = writeln!(text, "  {:<8} {}", label, row.join(" | "));
    }
    let _ = writeln!(text);

    text
}

/// Formats an aggregation result as a plain-text report
pub fn render_text(result: &AggregationResult) -> String {
    let mut text = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(text, "=== Living Wage Locations ===\n");
    let _ = writeln!(text, "Counties by state:");
    for (state, count) in &result.counties_by_state {
        let _ = writeln!(text, "  {}: {}", state, count);
    }
    let _ = writeln!(text);
    let _ = writeln!(
        text,
        "States: {}  Counties: {}  Metros: {}",
        result.state_count(),
        result.total_counties,
        result.total_metros
    );

    text
}

/// Prints an aggregation result to stdout
pub fn print_aggregation(result: &AggregationResult) {
    print!("{}", render_text(result));
}
