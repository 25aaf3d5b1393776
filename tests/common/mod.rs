//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use recruit::config::{PreferenceLayout, SheetNames};
use recruit::error::RemoteError;
use recruit::header::Grid;
use recruit::mock::{self, MockOptions};
use recruit::sheets::SheetsApi;
use recruit::CellValue;

pub fn grid(rows: &[&[&str]]) -> Grid {
    rows.iter()
        .map(|r| r.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// Writes a seeded sample workbook into `dir` and returns its path.
pub fn sample_workbook(dir: &Path, jobs: usize, candidates: usize) -> PathBuf {
    let path = dir.join("recruitment_data.xlsx");
    let opts = MockOptions {
        jobs,
        candidates,
        seed: Some(42),
        ..MockOptions::default()
    };
    mock::generate(&opts, &PreferenceLayout::default())
        .save(&path, &SheetNames::default())
        .expect("write sample workbook");
    path
}

/// In-memory stand-in for a hosted spreadsheet. Cells are stored as text the
/// way the real service returns them.
#[derive(Default)]
pub struct FakeSheets {
    pub sheets: HashMap<String, Grid>,
    pub connected: bool,
    pub connect_error: Option<fn() -> RemoteError>,
    pub connects: usize,
}

impl FakeSheets {
    pub fn with_sheet(mut self, name: &str, grid: Grid) -> Self {
        self.sheets.insert(name.to_string(), grid);
        self
    }

    pub fn denied() -> Self {
        Self {
            connect_error: Some(|| RemoteError::AccessDenied {
                locator: "Recruitment Tracker".to_string(),
                account: Some("bot@project.iam.gserviceaccount.com".to_string()),
            }),
            ..Self::default()
        }
    }
}

impl SheetsApi for FakeSheets {
    fn connect(&mut self) -> Result<(), RemoteError> {
        self.connects += 1;
        if let Some(make) = self.connect_error {
            return Err(make());
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn describe(&self) -> String {
        "fake sheets".to_string()
    }

    fn read_sheet(&mut self, sheet: &str) -> Result<Option<Grid>, RemoteError> {
        Ok(self.sheets.get(sheet).cloned())
    }

    fn append_row(&mut self, sheet: &str, _header_row: usize, row: &[CellValue]) -> Result<(), RemoteError> {
        let grid = self
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| RemoteError::WorksheetNotFound(sheet.to_string()))?;
        grid.push(row.iter().map(|v| v.to_string()).collect());
        Ok(())
    }

    fn write_cell(&mut self, sheet: &str, row: usize, col: usize, value: &CellValue) -> Result<(), RemoteError> {
        let grid = self
            .sheets
            .get_mut(sheet)
            .ok_or_else(|| RemoteError::WorksheetNotFound(sheet.to_string()))?;
        if grid.len() <= row {
            grid.resize(row + 1, Vec::new());
        }
        let cells = &mut grid[row];
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }

    fn replace_sheet(&mut self, sheet: &str, grid: &Grid) -> Result<(), RemoteError> {
        self.sheets.insert(sheet.to_string(), grid.clone());
        Ok(())
    }
}
