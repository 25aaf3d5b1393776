//! Header discovery for loosely structured sheets.
//!
//! Templates put banner rows, merged title cells and blank spacer rows above the
//! real header, so the header row is searched for instead of assumed. The search
//! is bounded to the first [`HEADER_SCAN_LIMIT`] rows.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::models::{CellValue, Table};

/// Raw sheet contents, row-major, every cell as displayed text.
pub type Grid = Vec<Vec<String>>;

/// Maximum number of leading rows inspected when looking for a header.
pub const HEADER_SCAN_LIMIT: usize = 20;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Unnamed(: \d+)?").expect("placeholder pattern is valid")
});

/// Returns the index of the first row (within the scan limit) holding `label`.
///
/// Cells are trimmed and uppercased before comparison.
pub fn locate_header(grid: &[Vec<String>], label: &str) -> Option<usize> {
    let wanted = label.trim().to_uppercase();
    grid.iter()
        .take(HEADER_SCAN_LIMIT)
        .position(|row| row.iter().any(|cell| cell.trim().to_uppercase() == wanted))
}

/// Closest cell text to `label` among the scanned rows, for diagnostics when
/// [`locate_header`] comes back empty.
pub fn suggest_header(grid: &[Vec<String>], label: &str) -> Option<String> {
    let wanted = label.trim().to_uppercase();
    grid.iter()
        .take(HEADER_SCAN_LIMIT)
        .flatten()
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .map(|cell| (cell, strsim::jaro_winkler(&cell.to_uppercase(), &wanted)))
        .filter(|(_, score)| *score >= 0.85)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(cell, _)| cell.to_string())
}

/// True for columns that had no real header text in the source sheet.
pub fn is_placeholder(column: &str) -> bool {
    PLACEHOLDER.is_match(column)
}

/// Column names for a header row. Blank cells get an `Unnamed: <index>`
/// placeholder and repeated names get a `.1`, `.2`, ... suffix.
pub fn header_names(row: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    row.iter()
        .enumerate()
        .map(|(idx, cell)| {
            let base = match cell.trim() {
                "" => format!("Unnamed: {}", idx),
                _ => cell.clone(),
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let name = if *count == 0 {
                base
            } else {
                format!("{}.{}", base, count)
            };
            *count += 1;
            name
        })
        .collect()
}

/// Builds a table whose columns come from `header_row` and whose rows are every
/// non-blank row below it.
pub fn table_from_grid(grid: &[Vec<String>], header_row: usize) -> Table {
    let Some(header) = grid.get(header_row) else {
        return Table::default();
    };
    let mut table = Table::new(header_names(header));
    for row in grid.iter().skip(header_row + 1) {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        table.push_row(row.iter().map(|c| CellValue::from_raw(c)).collect());
    }
    table
}
