use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{build_dataset, plan_append, plan_update, Backend, Dataset, LoadState, TableKind};
use crate::config::{PreferenceLayout, SheetNames};
use crate::error::{BackendError, Result};
use crate::models::Record;
use crate::workbook;

/// Backend over an xlsx workbook on local disk.
#[derive(Debug)]
pub struct LocalFileBackend {
    path: PathBuf,
    sheets: SheetNames,
    layout: PreferenceLayout,
    state: LoadState,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>, sheets: SheetNames, layout: PreferenceLayout) -> Self {
        Self {
            path: path.into(),
            sheets,
            layout,
            state: LoadState::Unloaded,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn read(&self) -> Result<Dataset> {
        if !self.exists() {
            return Err(BackendError::SourceUnavailable(format!(
                "workbook {} does not exist",
                self.path.display()
            )));
        }
        let book = workbook::open(&self.path)?;
        debug!(sheets = ?workbook::sheet_names(&book), "opened workbook");

        let candidates = workbook::read_grid(&book, &self.sheets.candidates);
        let jobs = workbook::read_grid(&book, &self.sheets.job_openings);
        let prefs = workbook::read_grid(&book, &self.sheets.preferences);
        Ok(build_dataset(
            &self.sheets,
            &self.layout,
            candidates.as_ref(),
            jobs.as_ref(),
            prefs.as_ref(),
        ))
    }
}

impl Backend for LocalFileBackend {
    fn describe(&self) -> String {
        format!("local workbook ({})", self.path.display())
    }

    fn state(&self) -> &LoadState {
        &self.state
    }

    fn load(&mut self) -> Result<Dataset> {
        self.state = LoadState::Loading;
        match self.read() {
            Ok(data) => {
                info!(
                    path = %self.path.display(),
                    candidates = data.candidates.len(),
                    jobs = data.jobs.len(),
                    "loaded workbook"
                );
                self.state = LoadState::Loaded { at: Local::now() };
                Ok(data)
            }
            Err(e) => {
                self.state = LoadState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn append(&mut self, kind: TableKind, record: &Record) -> Result<()> {
        workbook::probe_writable(&self.path)?;
        let sheet = kind.sheet_name(&self.sheets).to_string();
        let mut book = workbook::open(&self.path)?;
        let grid = workbook::read_grid(&book, &sheet)
            .ok_or_else(|| BackendError::SheetNotFound(sheet.clone()))?;

        let (_, row) = plan_append(&grid, kind, &sheet, record)?;
        let idx = workbook::append_row(&mut book, &sheet, &row)?;
        workbook::save(&book, &self.path)?;
        info!(sheet = %sheet, row = idx + 1, "appended row");
        Ok(())
    }

    fn update(&mut self, kind: TableKind, identity: &str, updates: &Record) -> Result<()> {
        workbook::probe_writable(&self.path)?;
        let sheet = kind.sheet_name(&self.sheets).to_string();
        let mut book = workbook::open(&self.path)?;
        let grid = workbook::read_grid(&book, &sheet)
            .ok_or_else(|| BackendError::SheetNotFound(sheet.clone()))?;

        let plan = plan_update(&grid, kind, &sheet, identity, updates)?;
        for (col, value) in &plan.cells {
            workbook::write_cell(&mut book, &sheet, plan.row, *col, value)?;
        }
        workbook::save(&book, &self.path)?;
        info!(sheet = %sheet, identity, cells = plan.cells.len(), "updated row");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Grid;
    use crate::models::{fields, CellValue};
    use tempfile::TempDir;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn write_book(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("tracker.xlsx");
        let candidates = grid(&[
            &["Candidate pipeline"],
            &[],
            &["", "CANDIDATE NAME", "JOB APPLIED FOR", "RECRUITMENT PHASE\n(Pipeline)"],
            &["", "Ava Brown", "Accountant", "Tests"],
        ]);
        let jobs = grid(&[&["JOB ID", "JOB TITLE", "STATUS"], &["14", "Accountant", "Vacant"]]);
        let book = workbook::from_grids(&[("Candidates", &candidates), ("JobOpenings", &jobs)]).unwrap();
        workbook::save(&book, &path).unwrap();
        path
    }

    fn backend(path: &Path) -> LocalFileBackend {
        LocalFileBackend::new(path, SheetNames::default(), PreferenceLayout::default())
    }

    #[test]
    fn test_load_missing_workbook_fails_and_records_state() {
        let dir = TempDir::new().unwrap();
        let mut backend = backend(&dir.path().join("absent.xlsx"));
        let err = backend.load().unwrap_err();
        assert!(matches!(err, BackendError::SourceUnavailable(_)));
        assert!(matches!(backend.state(), LoadState::Failed(_)));
    }

    #[test]
    fn test_load_normalizes_and_tolerates_missing_preferences() {
        let dir = TempDir::new().unwrap();
        let mut backend = backend(&write_book(&dir));
        let data = backend.load().unwrap();
        assert_eq!(data.candidates.len(), 1);
        assert_eq!(data.candidates.value(0, fields::POSITION), Some(&CellValue::from("Accountant")));
        assert_eq!(data.jobs.value(0, fields::JOB_ID), Some(&CellValue::Number(14.0)));
        assert!(data.preferences.recruiters.is_empty());
        assert!(matches!(backend.state(), LoadState::Loaded { .. }));
    }

    #[test]
    fn test_append_then_update_through_raw_headers() {
        let dir = TempDir::new().unwrap();
        let mut backend = backend(&write_book(&dir));

        let record = Record::new()
            .with(fields::CANDIDATE_NAME, "Mia Lopez")
            .with(fields::POSITION, "Attorney")
            .with(fields::STATUS, "Received Application");
        backend.append(TableKind::Candidates, &record).unwrap();

        let updates = Record::new().with(fields::STATUS, "Interviews");
        backend.update(TableKind::Candidates, "Mia Lopez", &updates).unwrap();

        let data = backend.load().unwrap();
        assert_eq!(data.candidates.len(), 2);
        assert_eq!(data.candidates.value(1, fields::POSITION), Some(&CellValue::from("Attorney")));
        assert_eq!(data.candidates.value(1, fields::STATUS), Some(&CellValue::from("Interviews")));
        assert_eq!(data.candidates.value(0, fields::STATUS), Some(&CellValue::from("Tests")));
    }

    #[test]
    fn test_update_unknown_job_leaves_workbook_untouched() {
        let dir = TempDir::new().unwrap();
        let path = write_book(&dir);
        let mut backend = backend(&path);
        let before = backend.load().unwrap();

        let updates = Record::new().with(fields::STATUS, "Filled");
        let err = backend.update(TableKind::JobOpenings, "99", &updates).unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));
        assert_eq!(backend.load().unwrap().jobs, before.jobs);
    }
}
