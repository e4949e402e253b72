use crate::record::WageRecord;
use scraper::{ElementRef, Html, Selector};

/// Substring matched against the `class` attribute of candidate tables
const WAGES_TABLE_CLASS: &str = "wages_table";

/// First heading of the main content region
const TITLE_SELECTOR: &str = "body > div > div:nth-of-type(2) > h1";

/// Parses a page body and extracts its wage records
pub fn extract_from_html(html: &str, page_url: &str) -> Vec<WageRecord> {
    let document = Html::parse_document(html);
    extract_records(&document, page_url)
}

/// Extracts one [`WageRecord`] per wage table found in the document
///
/// # Extraction Rules
///
/// - A wage table is any element whose `class` attribute contains
///   `wages_table`; multi-class attributes match too
/// - The title comes from the main content heading; a missing heading gives
///   an empty title rather than aborting
/// - Header labels are the `th` cells of the table's `thead` rows
/// - Body rows 1, 2 and 3 are the living, poverty and minimum wage rows; a
///   short body just leaves the later rows empty
///
/// Row and column counts are never reconciled: a malformed table produces a
/// record with mismatched lengths, not an error.
///
/// # Example
///
/// ```
/// use living_wage_crawler::extract::extract_from_html;
///
/// let html = r#"<html><body><div><div></div><div><h1>Test County</h1>
///     <table class="results_table wages_table">
///     <thead><tr><th>1 Adult</th></tr></thead>
///     <tbody><tr><td>$10.00</td></tr><tr><td>$5.00</td></tr><tr><td>$7.25</td></tr></tbody>
///     </table></div></div></body></html>"#;
///
/// let records = extract_from_html(html, "http://livingwage.mit.edu/counties/48001");
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].title, "Test County");
/// assert_eq!(records[0].living_wage_row, vec!["$10.00"]);
/// ```
pub fn extract_records(document: &Html, page_url: &str) -> Vec<WageRecord> {
    let table_selector = match Selector::parse(&format!("[class*=\"{}\"]", WAGES_TABLE_CLASS)) {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let tables: Vec<ElementRef> = document.select(&table_selector).collect();
    if tables.is_empty() {
        return Vec::new();
    }

    let title = extract_title(document);

    tables
        .into_iter()
        .map(|table| {
            let header_labels = header_cells(table);
            let body_rows = body_rows(table);
            let row = |index: usize| {
                body_rows
                    .get(index)
                    .map(|tr| cells(*tr, "td"))
                    .unwrap_or_default()
            };

            WageRecord {
                source_url: page_url.to_string(),
                title: title.clone(),
                header_labels,
                living_wage_row: row(0),
                poverty_wage_row: row(1),
                minimum_wage_row: row(2),
            }
        })
        .collect()
}

/// Cleans a raw cell string
///
/// Trims surrounding whitespace, then replaces every non-breaking space with
/// an ordinary space.
///
/// ```
/// use living_wage_crawler::extract::normalize_cell;
///
/// assert_eq!(normalize_cell("  $12.34\n"), "$12.34");
/// assert_eq!(normalize_cell("2\u{00A0}Adults"), "2 Adults");
/// ```
pub fn normalize_cell(raw: &str) -> String {
    raw.trim().replace('\u{00A0}', " ")
}

fn extract_title(document: &Html) -> String {
    let Ok(selector) = Selector::parse(TITLE_SELECTOR) else {
        return String::new();
    };

    document
        .select(&selector)
        .next()
        .map(|heading| normalize_cell(&heading.text().collect::<String>()))
        .unwrap_or_default()
}

/// `th` cells of every `thead > tr` directly under the table
fn header_cells(table: ElementRef) -> Vec<String> {
    child_elements(table, "thead")
        .flat_map(|thead| child_elements(thead, "tr"))
        .flat_map(|tr| cells(tr, "th"))
        .collect()
}

/// `tbody > tr` rows directly under the table, in document order
fn body_rows(table: ElementRef) -> Vec<ElementRef> {
    child_elements(table, "tbody")
        .flat_map(|tbody| child_elements(tbody, "tr"))
        .collect()
}

fn cells(row: ElementRef, tag: &str) -> Vec<String> {
    child_elements(row, tag)
        .map(|cell| normalize_cell(&cell.text().collect::<String>()))
        .collect()
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'a str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}
