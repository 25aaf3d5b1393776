//! One-shot copy of the local workbook into the remote spreadsheet.
//!
//! Candidate and job sheets are uploaded as a clean header-plus-rows block
//! (banner rows, placeholder columns and rows without an identity are left
//! behind, raw header spellings are kept). The preferences sheet is copied
//! cell for cell so its positional layout survives.

use std::path::Path;
use tracing::{info, warn};

use crate::backend::TableKind;
use crate::config::SheetNames;
use crate::error::{BackendError, Result};
use crate::header::{self, Grid};
use crate::models::Table;
use crate::sheets::SheetsApi;
use crate::workbook;

/// What was uploaded, per worksheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationReport {
    pub uploaded: Vec<(String, usize)>,
    pub skipped: Vec<(String, String)>,
}

/// Header-plus-rows block for a table sheet, or `None` when no header is found.
pub fn table_block(kind: TableKind, grid: &Grid) -> Option<Grid> {
    let header_row = header::locate_header(grid, kind.identity())?;
    let mut table: Table = header::table_from_grid(grid, header_row);
    kind.mapping().drop_placeholders(&mut table);

    let identity = table
        .columns()
        .iter()
        .position(|c| c.trim().eq_ignore_ascii_case(kind.identity()))?;
    table.retain_rows(|row| !row[identity].is_empty());

    let mut block: Grid = vec![table.columns().to_vec()];
    block.extend(
        table
            .rows()
            .iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect()),
    );
    Some(block)
}

/// Uploads the workbook at `path`, clearing (or creating) each target worksheet first.
pub fn migrate<A: SheetsApi>(path: &Path, sheets: &SheetNames, api: &mut A) -> Result<MigrationReport> {
    if !path.is_file() {
        return Err(BackendError::SourceUnavailable(format!(
            "workbook {} does not exist",
            path.display()
        )));
    }
    let book = workbook::open(path)?;
    if !api.is_connected() {
        api.connect()?;
    }

    let mut report = MigrationReport::default();
    for kind in [TableKind::Candidates, TableKind::JobOpenings] {
        let name = kind.sheet_name(sheets);
        let Some(grid) = workbook::read_grid(&book, name) else {
            report.skipped.push((name.to_string(), "sheet not in workbook".to_string()));
            continue;
        };
        let Some(block) = table_block(kind, &grid) else {
            warn!(sheet = name, label = kind.identity(), "header not found, sheet not migrated");
            report
                .skipped
                .push((name.to_string(), format!("no '{}' header", kind.identity())));
            continue;
        };
        api.replace_sheet(name, &block)?;
        info!(sheet = name, rows = block.len() - 1, "uploaded");
        report.uploaded.push((name.to_string(), block.len() - 1));
    }

    match workbook::read_grid(&book, &sheets.preferences) {
        Some(grid) => {
            api.replace_sheet(&sheets.preferences, &grid)?;
            info!(sheet = %sheets.preferences, rows = grid.len(), "uploaded");
            report.uploaded.push((sheets.preferences.clone(), grid.len()));
        }
        None => report
            .skipped
            .push((sheets.preferences.clone(), "sheet not in workbook".to_string())),
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_table_block_strips_template_noise() {
        let raw = grid(&[
            &["", "Job openings", ""],
            &["", "", ""],
            &["", "JOB ID", "JOB TITLE"],
            &["", "1", "Accountant"],
            &["", "", "Draft row"],
            &["", "2", "Attorney"],
        ]);
        let block = table_block(TableKind::JobOpenings, &raw).unwrap();
        assert_eq!(
            block,
            grid(&[&["JOB ID", "JOB TITLE"], &["1", "Accountant"], &["2", "Attorney"]])
        );
    }

    #[test]
    fn test_table_block_keeps_raw_header_spelling() {
        let raw = grid(&[
            &["CANDIDATE NAME", "RECIEVED APPLICATION COMMENTS"],
            &["Ava Brown", "Referred"],
        ]);
        let block = table_block(TableKind::Candidates, &raw).unwrap();
        assert_eq!(block[0][1], "RECIEVED APPLICATION COMMENTS");
    }

    #[test]
    fn test_table_block_without_header() {
        let raw = grid(&[&["nothing"]]);
        assert!(table_block(TableKind::Candidates, &raw).is_none());
    }
}
