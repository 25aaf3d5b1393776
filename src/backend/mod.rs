//! Storage backends behind one load/append/update contract.
//!
//! Both backends hand raw text grids to the same ingest pipeline
//! (header lookup → table → placeholder drop → normalization → coercion →
//! identity filter), so the canonical schema does not depend on which
//! backend supplied the data.

pub mod local;
pub mod remote;

use chrono::{DateTime, Local};
use tracing::{debug, warn};

use crate::config::{PreferenceColumn, PreferenceLayout, SheetNames};
use crate::error::{BackendError, Result};
use crate::header::{self, Grid, HEADER_SCAN_LIMIT};
use crate::models::{fields, CellValue, Preferences, Record, Table};
use crate::schema::{ColumnMapping, CANDIDATE_COLUMNS, JOB_COLUMNS};

pub use local::LocalFileBackend;
pub use remote::RemoteSheetBackend;

/// The two header-plus-rows tables that can be appended to and updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    Candidates,
    JobOpenings,
}

impl TableKind {
    /// Field used to find a record for update; also the header label searched for.
    pub fn identity(self) -> &'static str {
        match self {
            TableKind::Candidates => fields::CANDIDATE_NAME,
            TableKind::JobOpenings => fields::JOB_ID,
        }
    }

    pub fn mapping(self) -> &'static ColumnMapping {
        match self {
            TableKind::Candidates => &CANDIDATE_COLUMNS,
            TableKind::JobOpenings => &JOB_COLUMNS,
        }
    }

    pub fn sheet_name(self, sheets: &SheetNames) -> &str {
        match self {
            TableKind::Candidates => &sheets.candidates,
            TableKind::JobOpenings => &sheets.job_openings,
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            TableKind::Candidates => "Candidate",
            TableKind::JobOpenings => "Job opening",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loading,
    Loaded { at: DateTime<Local> },
    Failed(String),
}

/// Everything one load produces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub candidates: Table,
    pub jobs: Table,
    pub preferences: Preferences,
}

pub trait Backend {
    fn describe(&self) -> String;
    fn state(&self) -> &LoadState;
    /// Reads all three tables. On failure nothing already held by the caller is touched.
    fn load(&mut self) -> Result<Dataset>;
    /// Appends one record shaped against the live header row.
    fn append(&mut self, kind: TableKind, record: &Record) -> Result<()>;
    /// Overwrites fields of the first row whose identity matches.
    fn update(&mut self, kind: TableKind, identity: &str, updates: &Record) -> Result<()>;
}

/// Empty table carrying the full canonical schema.
fn empty_table(kind: TableKind) -> Table {
    Table::new(kind.mapping().required().iter().map(|f| f.to_string()).collect())
}

/// Turns a raw grid into a normalized table. A missing sheet or header yields an
/// empty table so the other tables can still load.
pub fn ingest_table(kind: TableKind, sheet: &str, grid: Option<&Grid>) -> Table {
    let Some(grid) = grid else {
        warn!(sheet, "sheet not found, treating as empty");
        return empty_table(kind);
    };
    let label = kind.identity();
    let Some(header_row) = header::locate_header(grid, label) else {
        match header::suggest_header(grid, label) {
            Some(close) => warn!(sheet, label, closest = %close, "header row not found"),
            None => warn!(sheet, label, "header row not found"),
        }
        return empty_table(kind);
    };
    debug!(sheet, header_row, "located header row");

    let mapping = kind.mapping();
    let mut table = header::table_from_grid(grid, header_row);
    mapping.drop_placeholders(&mut table);
    mapping.normalize(&mut table);

    // identity filter runs on raw text; an unparseable id is nulled by coerce() but the row stays
    let identity = kind.identity();
    let dropped = match table.column_index(identity) {
        Some(idx) => table.retain_rows(|row| !row[idx].is_empty()),
        None => 0,
    };
    if dropped > 0 {
        debug!(sheet, dropped, "dropped rows without {}", identity);
    }
    mapping.coerce(&mut table);
    table
}

fn preference_values(grid: &Grid, col: &PreferenceColumn) -> Vec<String> {
    let end = col.end_row.unwrap_or(usize::MAX);
    grid.iter()
        .enumerate()
        .filter(|(r, _)| *r >= col.start_row && *r < end)
        .filter_map(|(_, row)| row.get(col.column))
        .map(|v| v.trim())
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("nan"))
        .map(str::to_string)
        .collect()
}

/// Builds the lookup lists. Status, recruiters and decision comments come from
/// fixed positions in the preferences grid; departments and positions are the
/// distinct values in use in the job table; sources merge both.
pub fn extract_preferences(
    grid: Option<&Grid>,
    layout: &PreferenceLayout,
    candidates: &Table,
    jobs: &Table,
) -> Preferences {
    let mut prefs = Preferences::default();

    if let Some(grid) = grid {
        prefs.recruiters = preference_values(grid, &layout.recruiters);
        prefs.status = preference_values(grid, &layout.status);
        prefs.decision_comments = preference_values(grid, &layout.decision_comments);
        if let Some(sources) = &layout.sources {
            prefs.sources = preference_values(grid, sources);
        }
    }

    prefs.departments = jobs.distinct(fields::DEPARTMENT);
    prefs.positions = jobs.distinct(fields::JOB_TITLE);
    for source in candidates.distinct(fields::SOURCE) {
        if !prefs.sources.contains(&source) {
            prefs.sources.push(source);
        }
    }
    prefs
}

/// Runs the full ingest over the three raw grids.
pub fn build_dataset(
    sheets: &SheetNames,
    layout: &PreferenceLayout,
    candidates: Option<&Grid>,
    jobs: Option<&Grid>,
    preferences: Option<&Grid>,
) -> Dataset {
    let candidates = ingest_table(TableKind::Candidates, &sheets.candidates, candidates);
    let jobs = ingest_table(TableKind::JobOpenings, &sheets.job_openings, jobs);
    let preferences = extract_preferences(preferences, layout, &candidates, &jobs);
    Dataset {
        candidates,
        jobs,
        preferences,
    }
}

/// Header row as it is in the sheet right now: its index and raw cell texts.
pub fn live_header(grid: &Grid, kind: TableKind, sheet: &str) -> Result<(usize, Vec<String>)> {
    let row = header::locate_header(grid, kind.identity()).ok_or_else(|| {
        BackendError::HeaderNotFound {
            sheet: sheet.to_string(),
            label: kind.identity().to_string(),
            scanned: HEADER_SCAN_LIMIT,
        }
    })?;
    Ok((row, grid[row].clone()))
}

fn identity_matches(cell: &str, identity: &str) -> bool {
    let (cell, identity) = (cell.trim(), identity.trim());
    if cell == identity {
        return true;
    }
    // "15" and "15.0" name the same job
    match (cell.parse::<f64>(), identity.parse::<f64>()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Grid index of the first data row below `header_row` whose identity column
/// matches. Later duplicates are never reached.
pub fn find_identity_row(grid: &Grid, header_row: usize, id_col: usize, identity: &str) -> Option<usize> {
    grid.iter()
        .enumerate()
        .skip(header_row + 1)
        .find(|(_, row)| row.get(id_col).is_some_and(|c| identity_matches(c, identity)))
        .map(|(idx, _)| idx)
}

/// Everything an update needs, resolved before any cell is written.
#[derive(Debug)]
pub struct UpdatePlan {
    pub row: usize,
    pub cells: Vec<(usize, CellValue)>,
}

pub fn plan_update(
    grid: &Grid,
    kind: TableKind,
    sheet: &str,
    identity: &str,
    updates: &Record,
) -> Result<UpdatePlan> {
    let (header_row, live) = live_header(grid, kind, sheet)?;
    let mapping = kind.mapping();
    let id_col = mapping
        .resolve_column(&live, kind.identity())
        .ok_or_else(|| BackendError::HeaderNotFound {
            sheet: sheet.to_string(),
            label: kind.identity().to_string(),
            scanned: HEADER_SCAN_LIMIT,
        })?;

    let row = find_identity_row(grid, header_row, id_col, identity).ok_or_else(|| {
        BackendError::NotFound {
            kind: kind.noun(),
            identity: identity.to_string(),
        }
    })?;

    let cells = updates
        .iter()
        .map(|(field, value)| {
            mapping
                .resolve_column(&live, field)
                .map(|col| (col, value.clone()))
                .ok_or_else(|| BackendError::UnknownField {
                    sheet: sheet.to_string(),
                    field: field.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(UpdatePlan { row, cells })
}

/// Row to append, laid out along the live header.
pub fn plan_append(grid: &Grid, kind: TableKind, sheet: &str, record: &Record) -> Result<(usize, Vec<CellValue>)> {
    let (header_row, live) = live_header(grid, kind, sheet)?;
    let mapping = kind.mapping();
    let unplaced = mapping.unplaced_fields(&live, record);
    if !unplaced.is_empty() {
        warn!(sheet, fields = ?unplaced, "fields without a matching column are not written");
    }
    Ok((header_row, mapping.shape_row(&live, record)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Grid {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    fn candidate_sheet() -> Grid {
        grid(&[
            &["", "Recruitment tracker", "", ""],
            &["", "", "", ""],
            &["", "CANDIDATE NAME", "RECRUITMENT PHASE\n(Pipeline)", "APPLIED DATE"],
            &["", "Ava Brown", "Interviews", "2024-03-01"],
            &["", "", "Tests", "2024-03-02"],
            &["", "John Smith", "Hired", "garbage"],
        ])
    }

    #[test]
    fn test_ingest_drops_rows_without_identity() {
        let table = ingest_table(TableKind::Candidates, "Candidates", Some(&candidate_sheet()));
        assert_eq!(table.len(), 2);
        assert!(!table.has_column("Unnamed: 0"));
        assert_eq!(table.value(1, fields::STATUS), Some(&CellValue::from("Hired")));
        assert_eq!(table.value(1, fields::APPLICATION_DATE), Some(&CellValue::Empty));
        for field in CANDIDATE_COLUMNS.required() {
            assert!(table.has_column(field));
        }
    }

    #[test]
    fn test_non_numeric_job_id_keeps_row() {
        let g = grid(&[
            &["JOB ID", "JOB TITLE", "STATUS"],
            &["J-001", "Attorney", "Vacant"],
            &["J-002", "Paralegal", "Filled"],
            &["", "Orphan", "Vacant"],
        ]);
        let table = ingest_table(TableKind::JobOpenings, "JobOpenings", Some(&g));
        assert_eq!(table.len(), 2);
        assert_eq!(table.value(0, fields::JOB_TITLE), Some(&CellValue::from("Attorney")));
        assert_eq!(table.value(0, fields::JOB_ID), Some(&CellValue::Empty));
    }

    #[test]
    fn test_missing_header_yields_empty_canonical_table() {
        let g = grid(&[&["nothing", "here"]]);
        let table = ingest_table(TableKind::JobOpenings, "JobOpenings", Some(&g));
        assert!(table.is_empty());
        assert!(table.has_column(fields::HIRING_COST));

        let table = ingest_table(TableKind::JobOpenings, "JobOpenings", None);
        assert!(table.is_empty());
    }

    #[test]
    fn test_preferences_from_positions_and_data() {
        let mut prefs_grid: Grid = vec![vec![String::new(); 12]; 20];
        prefs_grid[7][2] = "Austin Millfrey".into();
        prefs_grid[8][2] = "Peter Caron".into();
        prefs_grid[7][11] = "Received Application".into();
        prefs_grid[8][11] = "Interviews".into();
        prefs_grid[18][11] = "Candidate Refusal".into();

        let jobs = Table::from_rows(
            vec![fields::JOB_ID.into(), fields::DEPARTMENT.into(), fields::JOB_TITLE.into()],
            vec![
                vec![1i64.into(), "IT".into(), "DevOps Engineer".into()],
                vec![2i64.into(), "Sales".into(), CellValue::Empty],
                vec![3i64.into(), "IT".into(), "IT Support".into()],
            ],
        );
        let candidates = Table::from_rows(
            vec![fields::SOURCE.into()],
            vec![vec!["LinkedIn".into()], vec!["Referral".into()], vec!["LinkedIn".into()]],
        );

        let prefs = extract_preferences(Some(&prefs_grid), &PreferenceLayout::default(), &candidates, &jobs);
        assert_eq!(prefs.recruiters, vec!["Austin Millfrey", "Peter Caron"]);
        assert_eq!(prefs.status, vec!["Received Application", "Interviews", "Candidate Refusal"]);
        assert_eq!(prefs.decision_comments, vec!["Candidate Refusal"]);
        assert_eq!(prefs.departments, vec!["IT", "Sales"]);
        assert_eq!(prefs.positions, vec!["DevOps Engineer", "IT Support"]);
        assert_eq!(prefs.sources, vec!["LinkedIn", "Referral"]);
        assert_eq!(prefs.job_statuses.len(), 4);
    }

    #[test]
    fn test_plan_update_finds_first_match_only() {
        let mut g = candidate_sheet();
        g.push(vec!["".into(), "Ava Brown".into(), "Tests".into(), "".into()]);
        let updates = Record::new().with(fields::STATUS, "Job Offer");
        let plan = plan_update(&g, TableKind::Candidates, "Candidates", " Ava Brown ", &updates).unwrap();
        assert_eq!(plan.row, 3);
        assert_eq!(plan.cells, vec![(2, CellValue::from("Job Offer"))]);
    }

    #[test]
    fn test_plan_update_rejects_unknown_identity_and_field() {
        let g = candidate_sheet();
        let updates = Record::new().with(fields::STATUS, "Hired");
        let err = plan_update(&g, TableKind::Candidates, "Candidates", "Nobody", &updates).unwrap_err();
        assert!(matches!(err, BackendError::NotFound { .. }));

        let updates = Record::new().with("SALARY", "100");
        let err = plan_update(&g, TableKind::Candidates, "Candidates", "Ava Brown", &updates).unwrap_err();
        assert!(matches!(err, BackendError::UnknownField { .. }));
    }

    #[test]
    fn test_numeric_identity_matches_across_formats() {
        let g = grid(&[&["JOB ID", "STATUS"], &["14.0", "Vacant"], &["15", "Filled"]]);
        assert_eq!(find_identity_row(&g, 0, 0, "14"), Some(1));
        assert_eq!(find_identity_row(&g, 0, 0, "15"), Some(2));
        assert_eq!(find_identity_row(&g, 0, 0, "16"), None);
    }
}
