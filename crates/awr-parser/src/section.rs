//! Section location and table extraction.
//!
//! A section is an `<h2>` heading inside a `div.sec` container whose first
//! `<table>` holds the data. Tables may or may not start with a `<th>` header
//! row; when they do not, the column names come from the fixed fallback table
//! in [`awr_core::schema`].

use std::sync::OnceLock;

use awr_core::models::{Cell, RowRecord, SectionTag};
use awr_core::normalize::{clean_key, clean_label, clean_value};
use awr_core::schema::fallback_schema;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

const SECTION_CLASS: &str = "sec";

struct Selectors {
    heading: Selector,
    table: Selector,
    row: Selector,
    cell: Selector,
    header_cell: Selector,
}

fn selectors() -> &'static Selectors {
    static SELECTORS: OnceLock<Selectors> = OnceLock::new();
    SELECTORS.get_or_init(|| Selectors {
        heading: Selector::parse("h2").expect("selector is valid"),
        table: Selector::parse("table").expect("selector is valid"),
        row: Selector::parse("tr").expect("selector is valid"),
        cell: Selector::parse("td, th").expect("selector is valid"),
        header_cell: Selector::parse("th").expect("selector is valid"),
    })
}

/// Extract the rows of `tag`'s table in document order.
///
/// Never fails: a missing heading, container or table yields an empty list,
/// and rows whose cell count differs from the column count are dropped.
pub fn extract_section(document: &Html, tag: SectionTag) -> Vec<RowRecord> {
    let Some(table) = find_section_table(document, tag.title()) else {
        debug!("section '{}' not found", tag);
        return Vec::new();
    };

    let sel = selectors();
    let mut columns: Option<Vec<String>> = None;
    let mut records = Vec::new();
    let mut dropped = 0usize;

    for (i, row) in table.select(&sel.row).enumerate() {
        if i == 0 && row.select(&sel.header_cell).next().is_some() {
            columns = Some(
                row.select(&sel.header_cell)
                    .map(|th| clean_key(&cell_text(th)))
                    .collect(),
            );
            continue;
        }

        let values = row_values(row);
        if values.is_empty() {
            continue;
        }

        // Inferred once, from the first multi-cell data row.
        if columns.is_none() && values.len() > 1 {
            debug!("section '{}' has no header row, using fallback schema", tag);
            columns = Some(fallback_schema(tag).iter().map(|c| c.to_string()).collect());
        }

        match columns.as_deref().and_then(|cols| RowRecord::zip(cols, values)) {
            Some(record) => records.push(record),
            None => dropped += 1,
        }
    }

    debug!(
        "section '{}': {} rows extracted, {} dropped",
        tag,
        records.len(),
        dropped
    );
    records
}

/// Find the first table of the `div.sec` container around the `<h2>` titled `title`.
fn find_section_table<'a>(document: &'a Html, title: &str) -> Option<ElementRef<'a>> {
    let sel = selectors();
    let heading = document
        .select(&sel.heading)
        .find(|h| h.text().collect::<String>().trim() == title)?;

    let container = heading.ancestors().filter_map(ElementRef::wrap).find(|e| {
        e.value().name() == "div" && e.value().classes().any(|c| c == SECTION_CLASS)
    })?;

    container.select(&sel.table).next()
}

/// Cell values of one row: the first cell is the row label and always text.
fn row_values(row: ElementRef<'_>) -> Vec<Cell> {
    row.select(&selectors().cell)
        .enumerate()
        .map(|(j, cell)| {
            let text = cell_text(cell);
            if j == 0 {
                Cell::Text(clean_label(&text))
            } else {
                clean_value(&text)
            }
        })
        .collect()
}

/// Concatenated text of an element with each text node trimmed.
pub(crate) fn cell_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}
