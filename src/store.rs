//! The record store: one authoritative dataset per session.
//!
//! A store owns the selected backend plus the local workbook backend used as
//! a per-call fallback when the remote side cannot be loaded. Every mutating
//! call ends with a full reload, so after a successful write the in-memory
//! tables always reflect what the backend now holds.

use std::fmt;
use tracing::{info, warn};

use crate::backend::{Backend, Dataset, LocalFileBackend, RemoteSheetBackend, TableKind};
use crate::config::{Config, SourceSelection};
use crate::error::BackendError;
use crate::models::{fields, CandidateRecord, JobRecord, Preferences, Record, Table};
use crate::sheets::GoogleSheetsClient;

/// Result of a store operation as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Where the data currently held by the store came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadedFrom {
    Nothing,
    Remote,
    Local,
    LocalFallback,
}

impl fmt::Display for LoadedFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadedFrom::Nothing => "not loaded",
            LoadedFrom::Remote => "remote spreadsheet",
            LoadedFrom::Local => "local workbook",
            LoadedFrom::LocalFallback => "local workbook, remote unavailable",
        })
    }
}

pub struct RecordStore {
    remote: Option<Box<dyn Backend>>,
    local: LocalFileBackend,
    data: Dataset,
    loaded_from: LoadedFrom,
}

impl RecordStore {
    /// `remote` is the selected backend when present; otherwise the local
    /// workbook is authoritative.
    pub fn new(remote: Option<Box<dyn Backend>>, local: LocalFileBackend) -> Self {
        Self {
            remote,
            local,
            data: Dataset::default(),
            loaded_from: LoadedFrom::Nothing,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let local = LocalFileBackend::new(
            &config.workbook.path,
            config.sheets.clone(),
            config.preferences.clone(),
        );
        let remote: Option<Box<dyn Backend>> = match config.selection() {
            SourceSelection::Remote {
                spreadsheet,
                credentials,
            } => {
                info!(spreadsheet = %spreadsheet, "remote spreadsheet selected");
                let client = GoogleSheetsClient::new(credentials, &spreadsheet);
                Some(Box::new(RemoteSheetBackend::new(
                    client,
                    config.sheets.clone(),
                    config.preferences.clone(),
                )))
            }
            SourceSelection::Local => None,
        };
        Self::new(remote, local)
    }

    /// Human-readable name of the authoritative backend.
    pub fn describe(&self) -> String {
        match &self.remote {
            Some(remote) => remote.describe(),
            None => self.local.describe(),
        }
    }

    pub fn loaded_from(&self) -> LoadedFrom {
        self.loaded_from
    }

    /// Loads all tables. On failure the previously held data is kept.
    pub fn load(&mut self) -> Outcome {
        match self.fetch() {
            Ok((data, from, message)) => {
                self.data = data;
                self.loaded_from = from;
                Outcome::ok(message)
            }
            Err(message) => Outcome::fail(message),
        }
    }

    fn fetch(&mut self) -> Result<(Dataset, LoadedFrom, String), String> {
        let Some(remote) = self.remote.as_mut() else {
            return match self.local.load() {
                Ok(data) => {
                    let msg = loaded_message(&data, &self.local.describe());
                    Ok((data, LoadedFrom::Local, msg))
                }
                Err(BackendError::SourceUnavailable(reason)) => Err(format!(
                    "No data source available: {}. Configure a remote spreadsheet in recruit.toml \
                     (or set RECRUIT_SPREADSHEET_URL and RECRUIT_SERVICE_ACCOUNT), or create a \
                     local workbook with `recruit seed`.",
                    reason
                )),
                Err(e) => Err(e.to_string()),
            };
        };

        let remote_err = match remote.load() {
            Ok(data) => {
                let msg = loaded_message(&data, &remote.describe());
                return Ok((data, LoadedFrom::Remote, msg));
            }
            Err(e) => e,
        };

        if !self.local.exists() {
            return Err(format!(
                "Could not load {}: {}. No local workbook at {} to fall back to; fix the remote \
                 access above or place the workbook there.",
                remote.describe(),
                remote_err,
                self.local.path().display()
            ));
        }

        warn!(error = %remote_err, "remote load failed, falling back to local workbook");
        let data = self.local.load().map_err(|e| {
            format!(
                "Could not load {}: {}. Local fallback also failed: {}",
                remote.describe(),
                remote_err,
                e
            )
        })?;
        let msg = format!(
            "Remote spreadsheet unavailable ({}). Using local data instead: {}",
            remote_err,
            loaded_message(&data, &self.local.describe())
        );
        Ok((data, LoadedFrom::LocalFallback, msg))
    }

    pub fn candidates(&self) -> &Table {
        &self.data.candidates
    }

    pub fn jobs(&self) -> &Table {
        &self.data.jobs
    }

    pub fn preferences(&self) -> &Preferences {
        &self.data.preferences
    }

    pub fn candidate_records(&self) -> Vec<CandidateRecord> {
        self.data
            .candidates
            .records()
            .filter_map(|r| CandidateRecord::from_record(&r))
            .collect()
    }

    pub fn job_records(&self) -> Vec<JobRecord> {
        self.data
            .jobs
            .records()
            .filter_map(|r| JobRecord::from_record(&r))
            .collect()
    }

    /// Next free job id: one past the highest id held, or 1 for an empty table.
    /// `None` when the highest id leaves no room for another.
    pub fn next_job_id(&self) -> Option<i64> {
        let max = self
            .data
            .jobs
            .column_values(fields::JOB_ID)
            .into_iter()
            .filter_map(|v| v.as_number())
            .filter(|n| n.is_finite())
            .max_by(f64::total_cmp);
        match max {
            None => Some(1),
            // i64::MAX as f64 rounds up to 2^63, which no i64 can hold
            Some(m) if m >= i64::MAX as f64 => None,
            Some(m) => (m.floor() as i64).checked_add(1),
        }
    }

    fn writer(&mut self) -> &mut dyn Backend {
        match self.remote.as_mut() {
            Some(remote) => remote.as_mut(),
            None => &mut self.local,
        }
    }

    /// Reload after a successful write. A failed reload does not undo the write.
    fn finish_write(&mut self, done: String) -> Outcome {
        let reload = self.load();
        if reload.success {
            info!("reloaded after write");
            Outcome::ok(done)
        } else {
            warn!(error = %reload.message, "reload after write failed");
            Outcome::ok(format!("{} (reload failed: {})", done, reload.message))
        }
    }

    pub fn append_candidate(&mut self, record: &Record) -> Outcome {
        let Some(name) = record
            .get(fields::CANDIDATE_NAME)
            .and_then(|v| v.as_text())
        else {
            return Outcome::fail("Candidate name is required");
        };
        match self.writer().append(TableKind::Candidates, record) {
            Ok(()) => self.finish_write(format!("Candidate '{}' added", name.trim())),
            Err(e) => Outcome::fail(e.to_string()),
        }
    }

    /// Appends a job opening, assigning the next job id when the record has none.
    pub fn append_job(&mut self, record: &Record) -> Outcome {
        let mut record = record.clone();
        if !record.has_value(fields::JOB_ID) {
            let Some(id) = self.next_job_id() else {
                return Outcome::fail("Cannot assign a job id: the highest existing JOB ID is out of range");
            };
            record.set(fields::JOB_ID, id);
        }
        let id = record
            .get(fields::JOB_ID)
            .map(|v| v.to_string())
            .unwrap_or_default();
        match self.writer().append(TableKind::JobOpenings, &record) {
            Ok(()) => self.finish_write(format!("Job opening {} added", id)),
            Err(e) => Outcome::fail(e.to_string()),
        }
    }

    pub fn update_candidate(&mut self, name: &str, updates: &Record) -> Outcome {
        if updates.is_empty() {
            return Outcome::fail("Nothing to update");
        }
        match self.writer().update(TableKind::Candidates, name, updates) {
            Ok(()) => self.finish_write(format!("Candidate '{}' updated", name.trim())),
            Err(e) => Outcome::fail(e.to_string()),
        }
    }

    pub fn update_job(&mut self, job_id: i64, updates: &Record) -> Outcome {
        if updates.is_empty() {
            return Outcome::fail("Nothing to update");
        }
        match self
            .writer()
            .update(TableKind::JobOpenings, &job_id.to_string(), updates)
        {
            Ok(()) => self.finish_write(format!("Job opening {} updated", job_id)),
            Err(e) => Outcome::fail(e.to_string()),
        }
    }
}

fn loaded_message(data: &Dataset, source: &str) -> String {
    format!(
        "Loaded {} candidates and {} job openings from {}",
        data.candidates.len(),
        data.jobs.len(),
        source
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::LoadState;
    use crate::config::{PreferenceLayout, SheetNames};
    use crate::error::{RemoteError, Result};
    use crate::models::CellValue;

    /// In-memory backend; appended jobs land in its job table.
    #[derive(Default)]
    struct MemoryBackend {
        data: Dataset,
        fail_load: bool,
        locked: bool,
        state: LoadState,
    }

    impl Backend for MemoryBackend {
        fn describe(&self) -> String {
            "memory".to_string()
        }

        fn state(&self) -> &LoadState {
            &self.state
        }

        fn load(&mut self) -> Result<Dataset> {
            if self.fail_load {
                return Err(RemoteError::AccessDenied {
                    locator: "Tracker".into(),
                    account: None,
                }
                .into());
            }
            Ok(self.data.clone())
        }

        fn append(&mut self, kind: TableKind, record: &Record) -> Result<()> {
            if self.locked {
                return Err(BackendError::Locked("tracker.xlsx".into()));
            }
            if kind == TableKind::JobOpenings {
                let id = record.get(fields::JOB_ID).cloned().unwrap_or_default();
                self.data.jobs.push_row(vec![id]);
            }
            Ok(())
        }

        fn update(&mut self, kind: TableKind, identity: &str, _updates: &Record) -> Result<()> {
            Err(BackendError::NotFound {
                kind: kind.noun(),
                identity: identity.to_string(),
            })
        }
    }

    fn absent_local() -> LocalFileBackend {
        LocalFileBackend::new(
            "/nonexistent/recruitment_data.xlsx",
            SheetNames::default(),
            PreferenceLayout::default(),
        )
    }

    fn jobs_with_ids(ids: &[i64]) -> Dataset {
        let mut data = Dataset::default();
        data.jobs = Table::new(vec![fields::JOB_ID.to_string()]);
        for id in ids {
            data.jobs.push_row(vec![CellValue::from(*id)]);
        }
        data
    }

    #[test]
    fn test_no_source_is_reported_with_remediation() {
        let mut store = RecordStore::new(None, absent_local());
        let outcome = store.load();
        assert!(!outcome.success);
        assert!(outcome.message.contains("recruit seed"));
        assert_eq!(store.loaded_from(), LoadedFrom::Nothing);
        assert_eq!(store.loaded_from().to_string(), "not loaded");
    }

    #[test]
    fn test_remote_failure_without_local_is_compound() {
        let remote = MemoryBackend {
            fail_load: true,
            ..Default::default()
        };
        let mut store = RecordStore::new(Some(Box::new(remote)), absent_local());
        let outcome = store.load();
        assert!(!outcome.success);
        assert!(outcome.message.contains("Access denied"));
        assert!(outcome.message.contains("No local workbook"));
    }

    #[test]
    fn test_job_id_assigned_after_current_max() {
        let remote = MemoryBackend {
            data: jobs_with_ids(&[3, 14, 7]),
            ..Default::default()
        };
        let mut store = RecordStore::new(Some(Box::new(remote)), absent_local());
        assert!(store.load().success);
        assert_eq!(store.next_job_id(), Some(15));

        let outcome = store.append_job(&Record::new().with(fields::JOB_TITLE, "Attorney"));
        assert!(outcome.success, "{}", outcome.message);
        assert_eq!(outcome.message, "Job opening 15 added");
        assert_eq!(store.jobs().len(), 4);
        assert_eq!(store.next_job_id(), Some(16));
    }

    #[test]
    fn test_huge_job_id_fails_instead_of_overflowing() {
        let mut data = Dataset::default();
        data.jobs = Table::new(vec![fields::JOB_ID.to_string()]);
        data.jobs.push_row(vec![CellValue::Number(1e19)]);
        let remote = MemoryBackend {
            data,
            ..Default::default()
        };
        let mut store = RecordStore::new(Some(Box::new(remote)), absent_local());
        assert!(store.load().success);
        assert_eq!(store.next_job_id(), None);

        let outcome = store.append_job(&Record::new().with(fields::JOB_TITLE, "Attorney"));
        assert!(!outcome.success);
        assert!(outcome.message.contains("out of range"));
        assert_eq!(store.jobs().len(), 1);
    }

    #[test]
    fn test_empty_job_table_starts_at_one() {
        let store = RecordStore::new(None, absent_local());
        assert_eq!(store.next_job_id(), Some(1));
    }

    #[test]
    fn test_candidate_without_name_is_rejected() {
        let mut store = RecordStore::new(Some(Box::new(MemoryBackend::default())), absent_local());
        let outcome = store.append_candidate(&Record::new().with(fields::EMAIL, "a@b.c"));
        assert!(!outcome.success);
    }

    #[test]
    fn test_locked_backend_fails_without_touching_data() {
        let remote = MemoryBackend {
            data: jobs_with_ids(&[1, 2]),
            locked: true,
            ..Default::default()
        };
        let mut store = RecordStore::new(Some(Box::new(remote)), absent_local());
        assert!(store.load().success);
        let before = store.jobs().clone();

        let outcome = store.append_job(&Record::new().with(fields::JOB_TITLE, "Attorney"));
        assert!(!outcome.success);
        assert!(outcome.message.contains("open in another program"));
        assert_eq!(store.jobs(), &before);
    }

    #[test]
    fn test_update_failure_keeps_data() {
        let remote = MemoryBackend {
            data: jobs_with_ids(&[1, 2]),
            ..Default::default()
        };
        let mut store = RecordStore::new(Some(Box::new(remote)), absent_local());
        store.load();
        let before = store.jobs().clone();
        let outcome = store.update_job(9, &Record::new().with(fields::STATUS, "Filled"));
        assert!(!outcome.success);
        assert_eq!(outcome.message, "Job opening '9' not found");
        assert_eq!(store.jobs(), &before);
    }
}
