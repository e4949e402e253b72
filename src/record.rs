//! The per-location wage record produced by the table extractor

use serde::{Deserialize, Deserializer, Serialize};

/// One extracted wage table plus its page metadata
///
/// Field names on the wire (`url`, `header_row_data`, ...) are the record
/// schema consumed by the aggregation stage and must not change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WageRecord {
    /// Final page URL after redirects
    #[serde(rename = "url")]
    pub source_url: String,

    /// Location name, e.g. "Living Wage Calculation for Anderson County, Texas"
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,

    /// Column labels such as "1 Adult" or "2 Adults 1 Child"
    #[serde(rename = "header_row_data", default)]
    pub header_labels: Vec<String>,

    #[serde(rename = "living_wage_data", default)]
    pub living_wage_row: Vec<String>,

    #[serde(rename = "poverty_wage_data", default)]
    pub poverty_wage_row: Vec<String>,

    #[serde(rename = "minimum_wage_data", default)]
    pub minimum_wage_row: Vec<String>,
}

impl WageRecord {
    /// Returns true when every wage row lines up with the header row
    ///
    /// A misaligned record is still a valid record; the extractor keeps
    /// whatever the page contained.
    pub fn is_aligned(&self) -> bool {
        let columns = self.header_labels.len();
        self.living_wage_row.len() == columns
            && self.poverty_wage_row.len() == columns
            && self.minimum_wage_row.len() == columns
    }

    /// Returns the final path segment of the source URL (the FIPS-like code)
    pub fn identifier(&self) -> &str {
        self.source_url
            .rsplit('/')
            .next()
            .unwrap_or(self.source_url.as_str())
    }
}

// Older exports wrote `null` for pages without a heading.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
