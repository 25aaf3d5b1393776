use chrono::Local;
use tracing::{debug, info};

use super::{build_dataset, plan_append, plan_update, Backend, Dataset, LoadState, TableKind};
use crate::config::{PreferenceLayout, SheetNames};
use crate::error::{BackendError, RemoteError, Result};
use crate::header::Grid;
use crate::models::Record;
use crate::sheets::SheetsApi;

/// Backend over a hosted spreadsheet reached through a [`SheetsApi`].
pub struct RemoteSheetBackend<A: SheetsApi> {
    api: A,
    sheets: SheetNames,
    layout: PreferenceLayout,
    state: LoadState,
}

impl<A: SheetsApi> RemoteSheetBackend<A> {
    pub fn new(api: A, sheets: SheetNames, layout: PreferenceLayout) -> Self {
        Self {
            api,
            sheets,
            layout,
            state: LoadState::Unloaded,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn connected(&mut self) -> Result<&mut A> {
        if !self.api.is_connected() {
            debug!(source = %self.api.describe(), "connecting");
            self.api.connect()?;
        }
        Ok(&mut self.api)
    }

    /// A worksheet that is missing reads as `None` like any other absent sheet.
    fn read_sheet(&mut self, sheet: &str) -> Result<Option<Grid>> {
        match self.connected()?.read_sheet(sheet) {
            Ok(grid) => Ok(grid),
            Err(RemoteError::WorksheetNotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn read_required(&mut self, sheet: &str) -> Result<Grid> {
        self.read_sheet(sheet)?
            .ok_or_else(|| BackendError::SheetNotFound(sheet.to_string()))
    }

    fn read(&mut self) -> Result<Dataset> {
        let names = self.sheets.clone();
        let candidates = self.read_sheet(&names.candidates)?;
        let jobs = self.read_sheet(&names.job_openings)?;
        let prefs = self.read_sheet(&names.preferences)?;
        Ok(build_dataset(
            &names,
            &self.layout,
            candidates.as_ref(),
            jobs.as_ref(),
            prefs.as_ref(),
        ))
    }
}

impl<A: SheetsApi> Backend for RemoteSheetBackend<A> {
    fn describe(&self) -> String {
        self.api.describe()
    }

    fn state(&self) -> &LoadState {
        &self.state
    }

    fn load(&mut self) -> Result<Dataset> {
        self.state = LoadState::Loading;
        match self.read() {
            Ok(data) => {
                info!(
                    source = %self.api.describe(),
                    candidates = data.candidates.len(),
                    jobs = data.jobs.len(),
                    "loaded spreadsheet"
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
        let sheet = kind.sheet_name(&self.sheets).to_string();
        let grid = self.read_required(&sheet)?;
        let (header_row, row) = plan_append(&grid, kind, &sheet, record)?;
        self.connected()?.append_row(&sheet, header_row, &row)?;
        info!(sheet = %sheet, "appended row");
        Ok(())
    }

    fn update(&mut self, kind: TableKind, identity: &str, updates: &Record) -> Result<()> {
        let sheet = kind.sheet_name(&self.sheets).to_string();
        let grid = self.read_required(&sheet)?;
        let plan = plan_update(&grid, kind, &sheet, identity, updates)?;
        let api = self.connected()?;
        for (col, value) in &plan.cells {
            api.write_cell(&sheet, plan.row, *col, value)?;
        }
        info!(sheet = %sheet, identity, cells = plan.cells.len(), "updated row");
        Ok(())
    }
}
