//! Thin layer over the xlsx engine: raw grids in, raw cells out.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use umya_spreadsheet::{Spreadsheet, Worksheet};

use crate::error::{BackendError, Result};
use crate::header::Grid;
use crate::models::CellValue;

// Windows reports a file held open by a spreadsheet editor as a sharing or lock violation.
const ERROR_SHARING_VIOLATION: i32 = 32;
const ERROR_LOCK_VIOLATION: i32 = 33;

fn classify_io(path: &Path, e: std::io::Error) -> BackendError {
    let locked = e.kind() == ErrorKind::PermissionDenied
        || matches!(
            e.raw_os_error(),
            Some(ERROR_SHARING_VIOLATION) | Some(ERROR_LOCK_VIOLATION)
        );
    if locked {
        BackendError::Locked(path.to_path_buf())
    } else if e.kind() == ErrorKind::NotFound {
        BackendError::SourceUnavailable(format!("workbook {} does not exist", path.display()))
    } else {
        BackendError::Io {
            path: path.to_path_buf(),
            source: e,
        }
    }
}

/// Fails with `Locked` when another process holds the file open for reading.
pub fn probe_readable(path: &Path) -> Result<()> {
    File::open(path).map(|_| ()).map_err(|e| classify_io(path, e))
}

/// Open-for-append probe run right before every write.
pub fn probe_writable(path: &Path) -> Result<()> {
    OpenOptions::new()
        .append(true)
        .open(path)
        .map(|_| ())
        .map_err(|e| classify_io(path, e))
}

pub fn open(path: &Path) -> Result<Spreadsheet> {
    probe_readable(path)?;
    umya_spreadsheet::reader::xlsx::read(path)
        .map_err(|e| BackendError::Workbook(format!("cannot read {}: {}", path.display(), e)))
}

pub fn save(book: &Spreadsheet, path: &Path) -> Result<()> {
    umya_spreadsheet::writer::xlsx::write(book, path)
        .map_err(|e| BackendError::Workbook(format!("cannot save {}: {}", path.display(), e)))
}

pub fn sheet_names(book: &Spreadsheet) -> Vec<String> {
    book.get_sheet_collection()
        .iter()
        .map(|ws| ws.get_name().to_string())
        .collect()
}

/// Every cell of a sheet as text, trailing blank rows removed. `None` when the
/// sheet does not exist.
pub fn read_grid(book: &Spreadsheet, sheet: &str) -> Option<Grid> {
    let ws = book.get_sheet_by_name(sheet)?;
    let max_row = ws.get_highest_row();
    let max_col = ws.get_highest_column();

    let mut grid: Grid = (1..=max_row)
        .map(|r| (1..=max_col).map(|c| ws.get_value((c, r))).collect())
        .collect();
    while grid
        .last()
        .is_some_and(|row| row.iter().all(|c| c.trim().is_empty()))
    {
        grid.pop();
    }
    Some(grid)
}

fn sheet_mut<'a>(book: &'a mut Spreadsheet, sheet: &str) -> Result<&'a mut Worksheet> {
    book.get_sheet_by_name_mut(sheet)
        .ok_or_else(|| BackendError::SheetNotFound(sheet.to_string()))
}

fn set_cell(ws: &mut Worksheet, col: u32, row: u32, value: &CellValue) {
    let cell = ws.get_cell_mut((col, row));
    match value {
        CellValue::Empty => {
            cell.set_value_string("");
        }
        CellValue::Text(s) => {
            cell.set_value_string(s.as_str());
        }
        CellValue::Number(n) => {
            cell.set_value_number(*n);
        }
        CellValue::Date(d) => {
            cell.set_value_string(d.format("%Y-%m-%d").to_string());
        }
    }
}

/// Appends a row below the last used row. Null cells are left untouched.
/// Returns the 0-based grid index of the new row.
pub fn append_row(book: &mut Spreadsheet, sheet: &str, row: &[CellValue]) -> Result<usize> {
    let ws = sheet_mut(book, sheet)?;
    let target = ws.get_highest_row() + 1;
    for (idx, value) in row.iter().enumerate() {
        if !value.is_empty() {
            set_cell(ws, idx as u32 + 1, target, value);
        }
    }
    Ok(target as usize - 1)
}

/// Overwrites one cell addressed by 0-based grid coordinates.
pub fn write_cell(
    book: &mut Spreadsheet,
    sheet: &str,
    row: usize,
    col: usize,
    value: &CellValue,
) -> Result<()> {
    let ws = sheet_mut(book, sheet)?;
    set_cell(ws, col as u32 + 1, row as u32 + 1, value);
    Ok(())
}

/// Builds a workbook holding one sheet per `(name, grid)` pair.
pub fn from_grids(sheets: &[(&str, &Grid)]) -> Result<Spreadsheet> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    for (name, grid) in sheets {
        let ws = book
            .new_sheet(*name)
            .map_err(|e| BackendError::Workbook(format!("cannot add sheet '{}': {}", name, e)))?;
        for (r, row) in grid.iter().enumerate() {
            for (c, text) in row.iter().enumerate() {
                if text.is_empty() {
                    continue;
                }
                let value = match text.parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => CellValue::Text(text.clone()),
                };
                set_cell(ws, c as u32 + 1, r as u32 + 1, &value);
            }
        }
    }
    Ok(book)
}
