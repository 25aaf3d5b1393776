use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Canonical field names shared by every backend.
pub mod fields {
    pub const STATUS: &str = "STATUS";
    pub const POSITION: &str = "POSITION";
    pub const APPLICATION_DATE: &str = "APPLICATION DATE";
    pub const CANDIDATE_NAME: &str = "CANDIDATE NAME";
    pub const RECRUITER: &str = "RECRUITER";
    pub const SOURCE: &str = "SOURCE";
    pub const EMAIL: &str = "EMAIL";
    pub const PHONE: &str = "PHONE";
    pub const NOTES: &str = "NOTES";
    pub const JOB_ID: &str = "JOB ID";
    pub const DEPARTMENT: &str = "DEPARTMENT";
    pub const FINAL_DECISION: &str = "FINAL DECISION";
    pub const HR_VIEW: &str = "HR VIEW";
    pub const HIRING_MANAGER_VIEW: &str = "HIRING MANAGER VIEW";
    pub const DECISION_MAKER_VIEW: &str = "DECISION MAKER VIEW";
    pub const RECEIVED_APPLICATION_COMMENTS: &str = "RECEIVED APPLICATION COMMENTS";

    pub const JOB_TITLE: &str = "JOB TITLE";
    pub const OPENING_DATE: &str = "OPENING DATE";
    pub const NEW_HIRE_START_DATE: &str = "NEW HIRE START DATE";
    pub const HIRING_COST: &str = "HIRING COST";
}

/// A single cell after ingestion. `Empty` is the null value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl CellValue {
    /// Interprets raw sheet text: blank cells become `Empty`, anything else stays text.
    pub fn from_raw(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(n) => n.is_nan(),
            CellValue::Date(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self.to_string())
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) if !n.is_nan() => Some(*n),
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            CellValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::from_raw(s)
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s)
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        CellValue::Date(d)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// A set of field values keyed by canonical (or raw) column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, value: impl Into<CellValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<CellValue>) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// True when the field is present with a non-null value.
    pub fn has_value(&self, field: &str) -> bool {
        self.get(field).is_some_and(|v| !v.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, CellValue)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, CellValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

/// An in-memory header-plus-rows table. Every row has exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).map(|r| &r[idx])
    }

    /// Values of one column, top to bottom. Empty when the column is missing.
    pub fn column_values(&self, column: &str) -> Vec<&CellValue> {
        match self.column_index(column) {
            Some(idx) => self.rows.iter().map(|r| &r[idx]).collect(),
            None => Vec::new(),
        }
    }

    /// Pads or truncates the row to the column count before storing it.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn rename_column(&mut self, idx: usize, name: &str) {
        if let Some(col) = self.columns.get_mut(idx) {
            *col = name.to_string();
        }
    }

    /// Drops every column rejected by `keep`, returning the dropped names.
    pub fn retain_columns(&mut self, mut keep: impl FnMut(&str) -> bool) -> Vec<String> {
        let mask: Vec<bool> = self.columns.iter().map(|c| keep(c)).collect();
        let dropped = self
            .columns
            .iter()
            .zip(&mask)
            .filter(|(_, k)| !**k)
            .map(|(c, _)| c.clone())
            .collect();

        retain_by_mask(&mut self.columns, &mask);
        for row in &mut self.rows {
            retain_by_mask(row, &mask);
        }
        dropped
    }

    /// Keeps rows accepted by `keep`, returning how many were dropped.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[CellValue]) -> bool) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| keep(r));
        before - self.rows.len()
    }

    /// Appends a null-filled column if it is missing. Returns whether it was added.
    pub fn ensure_column(&mut self, name: &str) -> bool {
        if self.has_column(name) {
            return false;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(CellValue::Empty);
        }
        true
    }

    pub fn map_column(&mut self, name: &str, mut f: impl FnMut(CellValue) -> CellValue) {
        if let Some(idx) = self.column_index(name) {
            for row in &mut self.rows {
                let value = std::mem::take(&mut row[idx]);
                row[idx] = f(value);
            }
        }
    }

    pub fn record(&self, row: usize) -> Option<Record> {
        let values = self.rows.get(row)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(values.iter().cloned())
                .collect(),
        )
    }

    pub fn records(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.rows.len()).filter_map(|i| self.record(i))
    }

    /// Distinct non-null values of a column, in order of first appearance.
    pub fn distinct(&self, column: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for value in self.column_values(column) {
            if let Some(text) = value.as_text() {
                if !seen.contains(&text) {
                    seen.push(text);
                }
            }
        }
        seen
    }
}

fn retain_by_mask<T>(values: &mut Vec<T>, mask: &[bool]) {
    let mut keep = mask.iter();
    values.retain(|_| keep.next().copied().unwrap_or(true));
}

/// Ordered recruitment pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PipelineStage {
    ReceivedApplication,
    SentToManager,
    Interviews,
    Tests,
    JobOffer,
    Hired,
}

impl PipelineStage {
    pub const ALL: [PipelineStage; 6] = [
        PipelineStage::ReceivedApplication,
        PipelineStage::SentToManager,
        PipelineStage::Interviews,
        PipelineStage::Tests,
        PipelineStage::JobOffer,
        PipelineStage::Hired,
    ];

    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::ReceivedApplication => "Received Application",
            PipelineStage::SentToManager => "Sent to Manager",
            PipelineStage::Interviews => "Interviews",
            PipelineStage::Tests => "Tests",
            PipelineStage::JobOffer => "Job Offer",
            PipelineStage::Hired => "Hired",
        }
    }
}

impl FromStr for PipelineStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("Unknown pipeline stage '{}'", s))
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Vacant,
    Filled,
    Suspended,
    Cancelled,
}

impl JobStatus {
    pub const ALL: [JobStatus; 4] = [
        JobStatus::Vacant,
        JobStatus::Filled,
        JobStatus::Suspended,
        JobStatus::Cancelled,
    ];

    pub fn label(self) -> &'static str {
        match self {
            JobStatus::Vacant => "Vacant",
            JobStatus::Filled => "Filled",
            JobStatus::Suspended => "Suspended",
            JobStatus::Cancelled => "Cancelled",
        }
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "Unknown job status '{}'. Expected one of: Vacant, Filled, Suspended, Cancelled",
                    s
                )
            })
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CandidateRecord {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub position: Option<String>,
    pub job_id: Option<i64>, // references JobRecord::job_id
    pub department: Option<String>,
    pub recruiter: Option<String>,
    pub source: Option<String>,
    pub status: Option<String>,
    pub final_decision: Option<String>,
    pub hr_view: Option<String>,
    pub hiring_manager_view: Option<String>,
    pub decision_maker_view: Option<String>,
    pub notes: Option<String>,
    pub received_application_comments: Option<String>,
}

impl CandidateRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Builds a typed view of a normalized row. `None` when the row has no name.
    pub fn from_record(record: &Record) -> Option<Self> {
        let text = |f: &str| record.get(f).and_then(CellValue::as_text);
        Some(Self {
            name: text(fields::CANDIDATE_NAME)?,
            email: text(fields::EMAIL),
            phone: text(fields::PHONE),
            application_date: record.get(fields::APPLICATION_DATE).and_then(CellValue::as_date),
            position: text(fields::POSITION),
            job_id: record
                .get(fields::JOB_ID)
                .and_then(CellValue::as_number)
                .map(|n| n as i64),
            department: text(fields::DEPARTMENT),
            recruiter: text(fields::RECRUITER),
            source: text(fields::SOURCE),
            status: text(fields::STATUS),
            final_decision: text(fields::FINAL_DECISION),
            hr_view: text(fields::HR_VIEW),
            hiring_manager_view: text(fields::HIRING_MANAGER_VIEW),
            decision_maker_view: text(fields::DECISION_MAKER_VIEW),
            notes: text(fields::NOTES),
            received_application_comments: text(fields::RECEIVED_APPLICATION_COMMENTS),
        })
    }

    /// Canonical field map; unset optional fields are left out so they land as nulls.
    pub fn to_record(&self) -> Record {
        let mut record = Record::new().with(fields::CANDIDATE_NAME, self.name.as_str());
        let optional = [
            (fields::EMAIL, self.email.clone().map(CellValue::from)),
            (fields::PHONE, self.phone.clone().map(CellValue::from)),
            (fields::APPLICATION_DATE, self.application_date.map(CellValue::from)),
            (fields::POSITION, self.position.clone().map(CellValue::from)),
            (fields::JOB_ID, self.job_id.map(CellValue::from)),
            (fields::DEPARTMENT, self.department.clone().map(CellValue::from)),
            (fields::RECRUITER, self.recruiter.clone().map(CellValue::from)),
            (fields::SOURCE, self.source.clone().map(CellValue::from)),
            (fields::STATUS, self.status.clone().map(CellValue::from)),
            (fields::FINAL_DECISION, self.final_decision.clone().map(CellValue::from)),
            (fields::HR_VIEW, self.hr_view.clone().map(CellValue::from)),
            (fields::HIRING_MANAGER_VIEW, self.hiring_manager_view.clone().map(CellValue::from)),
            (fields::DECISION_MAKER_VIEW, self.decision_maker_view.clone().map(CellValue::from)),
            (fields::NOTES, self.notes.clone().map(CellValue::from)),
            (
                fields::RECEIVED_APPLICATION_COMMENTS,
                self.received_application_comments.clone().map(CellValue::from),
            ),
        ];
        for (field, value) in optional {
            if let Some(v) = value {
                record.set(field, v);
            }
        }
        record
    }

    pub fn stage(&self) -> Option<PipelineStage> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobRecord {
    pub job_id: Option<i64>, // assigned as max + 1 on append when missing
    pub department: Option<String>,
    pub title: Option<String>,
    pub opening_date: Option<NaiveDate>,
    pub recruiter: Option<String>,
    pub status: Option<String>,
    pub new_hire_start_date: Option<NaiveDate>,
    pub hiring_cost: Option<f64>,
}

impl JobRecord {
    pub fn from_record(record: &Record) -> Option<Self> {
        let text = |f: &str| record.get(f).and_then(CellValue::as_text);
        let date = |f: &str| record.get(f).and_then(CellValue::as_date);
        Some(Self {
            job_id: Some(record.get(fields::JOB_ID)?.as_number()? as i64),
            department: text(fields::DEPARTMENT),
            title: text(fields::JOB_TITLE),
            opening_date: date(fields::OPENING_DATE),
            recruiter: text(fields::RECRUITER),
            status: text(fields::STATUS),
            new_hire_start_date: date(fields::NEW_HIRE_START_DATE),
            hiring_cost: record.get(fields::HIRING_COST).and_then(CellValue::as_number),
        })
    }

    pub fn to_record(&self) -> Record {
        let mut record = Record::new();
        let values = [
            (fields::JOB_ID, self.job_id.map(CellValue::from)),
            (fields::DEPARTMENT, self.department.clone().map(CellValue::from)),
            (fields::JOB_TITLE, self.title.clone().map(CellValue::from)),
            (fields::OPENING_DATE, self.opening_date.map(CellValue::from)),
            (fields::RECRUITER, self.recruiter.clone().map(CellValue::from)),
            (fields::STATUS, self.status.clone().map(CellValue::from)),
            (fields::NEW_HIRE_START_DATE, self.new_hire_start_date.map(CellValue::from)),
            (fields::HIRING_COST, self.hiring_cost.map(CellValue::from)),
        ];
        for (field, value) in values {
            if let Some(v) = value {
                record.set(field, v);
            }
        }
        record
    }

    pub fn job_status(&self) -> Option<JobStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }
}

/// Named lookup lists used to populate selection inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    pub status: Vec<String>,
    pub recruiters: Vec<String>,
    pub sources: Vec<String>,
    pub positions: Vec<String>,
    pub departments: Vec<String>,
    pub decision_comments: Vec<String>,
    pub job_statuses: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            status: Vec::new(),
            recruiters: Vec::new(),
            sources: Vec::new(),
            positions: Vec::new(),
            departments: Vec::new(),
            decision_comments: Vec::new(),
            job_statuses: JobStatus::ALL.iter().map(|s| s.label().to_string()).collect(),
        }
    }
}

impl Preferences {
    pub fn lists(&self) -> [(&'static str, &[String]); 7] {
        [
            ("Status", self.status.as_slice()),
            ("Recruiters", self.recruiters.as_slice()),
            ("Sources", self.sources.as_slice()),
            ("Positions", self.positions.as_slice()),
            ("Departments", self.departments.as_slice()),
            ("Decision Comments", self.decision_comments.as_slice()),
            ("Job Statuses", self.job_statuses.as_slice()),
        ]
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.lists()
            .into_iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}
