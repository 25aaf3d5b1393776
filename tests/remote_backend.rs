//! Remote backend behavior against an in-memory sheets service.

mod common;

use chrono::NaiveDate;
use common::{grid, sample_workbook, FakeSheets};
use recruit::config::{PreferenceLayout, SheetNames};
use recruit::migrate;
use recruit::{fields, Backend, BackendError, CellValue, Record, RemoteSheetBackend, TableKind};
use tempfile::TempDir;

fn jobs_sheet() -> recruit::header::Grid {
    grid(&[
        &["", "Job Openings"],
        &[],
        &["", "JOB ID", "DEPARTMENT", "JOB TITLE", "OPENING DATE", "STATUS", "HIRING COST"],
        &["", "1", "IT", "IT Support", "2024-01-15", "Vacant", "$1,200"],
        &["", "2", "Finance", "Accountant", "45292", "Filled", "900"],
        &["", "3", "Sales", "Account Manager", "someday", "Vacant", "n/a"],
    ])
}

fn candidates_sheet() -> recruit::header::Grid {
    grid(&[
        &["CANDIDATE NAME", "JOB APPLIED FOR", "RECRUITMENT PHASE (Pipeline)", "APPLIED DATE", "SOURCE"],
        &["Ava Brown", "IT Support", "Interviews", "2024-02-01", "LinkedIn"],
        &["Liam Smith", "Accountant", "Hired", "2024-01-20", "Referral"],
    ])
}

fn backend(api: FakeSheets) -> RemoteSheetBackend<FakeSheets> {
    RemoteSheetBackend::new(api, SheetNames::default(), PreferenceLayout::default())
}

fn populated() -> RemoteSheetBackend<FakeSheets> {
    backend(
        FakeSheets::default()
            .with_sheet("JobOpenings", jobs_sheet())
            .with_sheet("Candidates", candidates_sheet()),
    )
}

#[test]
fn test_text_cells_are_coerced_after_fetch() {
    let mut remote = populated();
    let data = remote.load().unwrap();

    assert_eq!(data.jobs.len(), 3);
    assert_eq!(data.jobs.value(0, fields::HIRING_COST), Some(&CellValue::Number(1200.0)));
    assert_eq!(
        data.jobs.value(0, fields::OPENING_DATE),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()))
    );
    assert_eq!(
        data.jobs.value(1, fields::OPENING_DATE),
        Some(&CellValue::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
    );
    assert_eq!(data.jobs.value(2, fields::OPENING_DATE), Some(&CellValue::Empty));
    assert_eq!(data.jobs.value(2, fields::HIRING_COST), Some(&CellValue::Empty));

    assert_eq!(data.candidates.value(0, fields::STATUS), Some(&CellValue::from("Interviews")));
    assert_eq!(data.preferences.departments, vec!["IT", "Finance", "Sales"]);
    assert_eq!(data.preferences.sources, vec!["LinkedIn", "Referral"]);
    assert!(data.preferences.recruiters.is_empty());
}

#[test]
fn test_connects_once_and_reuses_connection() {
    let mut remote = populated();
    remote.load().unwrap();
    remote.load().unwrap();
    assert_eq!(remote.api().connects, 1);
}

#[test]
fn test_connect_failure_surfaces_actionable_error() {
    let mut remote = backend(FakeSheets::denied());
    let err = remote.load().unwrap_err();
    assert!(matches!(err, BackendError::Remote(_)));
    assert!(err.to_string().contains("Share it with the service account"));
}

#[test]
fn test_missing_worksheet_loads_as_empty_table() {
    let mut remote = backend(FakeSheets::default().with_sheet("Candidates", candidates_sheet()));
    let data = remote.load().unwrap();
    assert_eq!(data.candidates.len(), 2);
    assert!(data.jobs.is_empty());
    assert!(data.jobs.has_column(fields::JOB_ID));
}

#[test]
fn test_append_follows_live_header_order() {
    let mut remote = populated();
    let record = Record::new()
        .with(fields::JOB_ID, 4i64)
        .with(fields::JOB_TITLE, "Attorney")
        .with(fields::STATUS, "Vacant")
        .with(fields::RECRUITER, "Peter Caron");
    remote.append(TableKind::JobOpenings, &record).unwrap();

    let sheet = &remote.api().sheets["JobOpenings"];
    let last = sheet.last().unwrap();
    assert_eq!(last, &vec!["", "4", "", "Attorney", "", "Vacant", ""]);

    let data = remote.load().unwrap();
    assert_eq!(data.jobs.len(), 4);
}

#[test]
fn test_update_writes_only_named_cells() {
    let mut remote = populated();
    let updates = Record::new()
        .with(fields::STATUS, "Tests")
        .with(fields::POSITION, "DevOps Engineer");
    remote.update(TableKind::Candidates, "Ava Brown", &updates).unwrap();

    let sheet = &remote.api().sheets["Candidates"];
    assert_eq!(sheet[1], vec!["Ava Brown", "DevOps Engineer", "Tests", "2024-02-01", "LinkedIn"]);
    assert_eq!(sheet[2][2], "Hired");
}

#[test]
fn test_update_unknown_job_is_not_found() {
    let mut remote = populated();
    let updates = Record::new().with(fields::STATUS, "Filled");
    let err = remote.update(TableKind::JobOpenings, "42", &updates).unwrap_err();
    assert_eq!(err.to_string(), "Job opening '42' not found");
    assert_eq!(remote.api().sheets["JobOpenings"], jobs_sheet());
}

#[test]
fn test_append_to_missing_worksheet_fails() {
    let mut remote = backend(FakeSheets::default());
    let err = remote
        .append(TableKind::Candidates, &Record::new().with(fields::CANDIDATE_NAME, "Ava"))
        .unwrap_err();
    assert!(matches!(err, BackendError::SheetNotFound(_)));
}

#[test]
fn test_migrated_workbook_loads_identically() {
    let dir = TempDir::new().unwrap();
    let path = sample_workbook(dir.path(), 7, 11);
    let sheets = SheetNames::default();

    let mut api = FakeSheets::default();
    let report = migrate::migrate(&path, &sheets, &mut api).unwrap();
    assert_eq!(
        report.uploaded,
        vec![
            ("Candidates".to_string(), 11),
            ("JobOpenings".to_string(), 7),
            ("Preferences".to_string(), report.uploaded[2].1),
        ]
    );
    assert!(report.skipped.is_empty());
    assert_eq!(api.sheets["Candidates"][0][0], "JOB ID");

    let mut remote = backend(api);
    let migrated = remote.load().unwrap();

    let mut local = recruit::LocalFileBackend::new(&path, sheets, PreferenceLayout::default());
    let original = local.load().unwrap();

    assert_eq!(migrated.jobs, original.jobs);
    assert_eq!(migrated.candidates, original.candidates);
    assert_eq!(migrated.preferences, original.preferences);
}
