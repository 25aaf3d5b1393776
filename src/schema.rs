//! Column normalization between raw sheet headers and canonical field names.
//!
//! Forward direction (load): raw header text is renamed to its canonical field,
//! placeholder columns are dropped and missing canonical columns are backfilled
//! with nulls. Reverse direction (save): a caller's canonical record is shaped
//! against the *live* header row of the target sheet, so column order and any
//! unmapped columns survive the write.

use chrono::{Days, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::header;
use crate::models::{fields, CellValue, Record, Table};

/// Bidirectional mapping for one logical table.
#[derive(Debug)]
pub struct ColumnMapping {
    /// Raw header spelling (including known misspellings) to canonical field.
    aliases: &'static [(&'static str, &'static str)],
    /// Canonical fields every loaded table is guaranteed to carry.
    required: &'static [&'static str],
    dates: &'static [&'static str],
    numbers: &'static [&'static str],
}

pub static CANDIDATE_COLUMNS: ColumnMapping = ColumnMapping {
    aliases: &[
        ("RECRUITMENT PHASE\n(Pipeline)", fields::STATUS),
        ("RECRUITMENT PHASE (Pipeline)", fields::STATUS),
        ("JOB APPLIED FOR", fields::POSITION),
        ("APPLIED DATE", fields::APPLICATION_DATE),
        ("CANDIDATE NAME", fields::CANDIDATE_NAME),
        ("RECRUITER", fields::RECRUITER),
        ("SOURCE", fields::SOURCE),
        ("EMAIL", fields::EMAIL),
        ("PHONE", fields::PHONE),
        ("COMMENTS", fields::NOTES),
        ("JOB ID", fields::JOB_ID),
        ("DEPARTMENT", fields::DEPARTMENT),
        ("FINAL DECISION", fields::FINAL_DECISION),
        ("HR VIEW", fields::HR_VIEW),
        ("HIRING MANAGER VIEW", fields::HIRING_MANAGER_VIEW),
        ("DECISION MAKER VIEW", fields::DECISION_MAKER_VIEW),
        ("RECIEVED APPLICATION COMMENTS", fields::RECEIVED_APPLICATION_COMMENTS),
        ("RECEIVED APPLICATION COMMENTS", fields::RECEIVED_APPLICATION_COMMENTS),
    ],
    required: &[
        fields::STATUS,
        fields::POSITION,
        fields::APPLICATION_DATE,
        fields::CANDIDATE_NAME,
        fields::RECRUITER,
        fields::SOURCE,
        fields::EMAIL,
        fields::PHONE,
        fields::NOTES,
        fields::JOB_ID,
        fields::DEPARTMENT,
        fields::FINAL_DECISION,
        fields::HR_VIEW,
        fields::HIRING_MANAGER_VIEW,
        fields::DECISION_MAKER_VIEW,
        fields::RECEIVED_APPLICATION_COMMENTS,
    ],
    dates: &[fields::APPLICATION_DATE],
    numbers: &[fields::JOB_ID],
};

pub static JOB_COLUMNS: ColumnMapping = ColumnMapping {
    aliases: &[
        ("JOB ID", fields::JOB_ID),
        ("DEPARTMENT", fields::DEPARTMENT),
        ("JOB TITLE", fields::JOB_TITLE),
        ("OPENING DATE", fields::OPENING_DATE),
        ("RECRUITER", fields::RECRUITER),
        ("STATUS", fields::STATUS),
        ("NEW HIRE START DATE", fields::NEW_HIRE_START_DATE),
        ("HIRING COST", fields::HIRING_COST),
    ],
    required: &[
        fields::JOB_ID,
        fields::DEPARTMENT,
        fields::JOB_TITLE,
        fields::OPENING_DATE,
        fields::RECRUITER,
        fields::STATUS,
        fields::NEW_HIRE_START_DATE,
        fields::HIRING_COST,
    ],
    dates: &[fields::OPENING_DATE, fields::NEW_HIRE_START_DATE],
    numbers: &[fields::JOB_ID, fields::HIRING_COST],
};

fn same_header(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl ColumnMapping {
    pub fn required(&self) -> &'static [&'static str] {
        self.required
    }

    /// Canonical field for a raw header, if the header is a known spelling.
    pub fn canonical_for(&self, raw: &str) -> Option<&'static str> {
        self.aliases
            .iter()
            .find(|(alias, _)| same_header(alias, raw))
            .map(|(_, canonical)| *canonical)
    }

    fn canonical_or_self<'a>(&self, field: &'a str) -> &'a str {
        self.canonical_for(field).unwrap_or(field)
    }

    /// Whether `field` (canonical or a known raw spelling) holds dates.
    pub fn is_date(&self, field: &str) -> bool {
        let field = self.canonical_or_self(field);
        self.dates.iter().any(|d| same_header(d, field))
    }

    /// Whether `field` (canonical or a known raw spelling) holds numbers.
    pub fn is_number(&self, field: &str) -> bool {
        let field = self.canonical_or_self(field);
        self.numbers.iter().any(|n| same_header(n, field))
    }

    /// Types a user-supplied value by its field: numbers and dates only where
    /// the column holds them, text everywhere else.
    pub fn typed_value(&self, field: &str, raw: &str) -> CellValue {
        let raw = raw.trim();
        let text = CellValue::from(raw);
        if self.is_number(field) {
            if let Some(n) = parse_number(&text) {
                return CellValue::Number(n);
            }
        } else if self.is_date(field) && raw.contains(['-', '/', '.']) {
            if let Some(d) = parse_date(&text) {
                return CellValue::Date(d);
            }
        }
        text
    }

    /// Drops columns that had no header text in the source.
    pub fn drop_placeholders(&self, table: &mut Table) -> Vec<String> {
        let dropped = table.retain_columns(|c| !header::is_placeholder(c));
        if !dropped.is_empty() {
            debug!(columns = ?dropped, "dropped placeholder columns");
        }
        dropped
    }

    /// Renames known raw headers to canonical names and backfills every
    /// required canonical column that is still missing.
    pub fn normalize(&self, table: &mut Table) {
        for idx in 0..table.columns().len() {
            let raw = table.columns()[idx].clone();
            let Some(canonical) = self.canonical_for(&raw) else {
                continue;
            };
            if raw == canonical {
                continue;
            }
            if table.has_column(canonical) {
                warn!(raw = %raw, canonical, "column already present, keeping raw name");
                continue;
            }
            table.rename_column(idx, canonical);
        }

        for field in self.required {
            if table.ensure_column(field) {
                debug!(field, "backfilled missing canonical column");
            }
        }
    }

    /// Parses date and numeric columns in place. Cells that do not parse are
    /// nulled rather than failing the load. Returns the number of nulled cells.
    pub fn coerce(&self, table: &mut Table) -> usize {
        let mut nulled = 0;
        for column in self.dates {
            table.map_column(column, |value| match value {
                CellValue::Empty => CellValue::Empty,
                other => match parse_date(&other) {
                    Some(d) => CellValue::Date(d),
                    None => {
                        nulled += 1;
                        CellValue::Empty
                    }
                },
            });
        }
        for column in self.numbers {
            table.map_column(column, |value| match value {
                CellValue::Empty => CellValue::Empty,
                other => match parse_number(&other) {
                    Some(n) => CellValue::Number(n),
                    None => {
                        nulled += 1;
                        CellValue::Empty
                    }
                },
            });
        }
        if nulled > 0 {
            debug!(nulled, "unparseable date/number cells set to null");
        }
        nulled
    }

    /// Position of `field` in a live header row: a direct header match first,
    /// then any header whose canonical name is `field`.
    pub fn resolve_column(&self, live: &[String], field: &str) -> Option<usize> {
        live.iter().position(|h| same_header(h, field)).or_else(|| {
            live.iter()
                .position(|h| self.canonical_for(h).is_some_and(|c| c == field))
        })
    }

    /// Lays a record out along the live header row. Each header takes the
    /// record's value for its canonical field, else a value keyed by the raw
    /// header text itself, else null. Raw keys match headers trimmed and
    /// case-insensitively, the same rule `resolve_column` validates with, so a
    /// field accepted there always lands here.
    pub fn shape_row(&self, live: &[String], record: &Record) -> Vec<CellValue> {
        live.iter()
            .map(|h| {
                let mapped = self.canonical_for(h).and_then(|c| record.get(c));
                mapped
                    .or_else(|| record.get(h))
                    .or_else(|| {
                        record
                            .iter()
                            .find(|(k, _)| same_header(k, h))
                            .map(|(_, v)| v)
                    })
                    .cloned()
                    .unwrap_or_default()
            })
            .collect()
    }

    /// Record fields that have no column to land in.
    pub fn unplaced_fields(&self, live: &[String], record: &Record) -> Vec<String> {
        record
            .iter()
            .filter(|(k, _)| self.resolve_column(live, k).is_none())
            .map(|(k, _)| k.to_string())
            .collect()
    }
}

/// Days between the spreadsheet serial epoch and 1899-12-30.
fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !(1.0..=2_958_465.0).contains(&serial) {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

pub fn parse_date(value: &CellValue) -> Option<NaiveDate> {
    match value {
        CellValue::Date(d) => Some(*d),
        CellValue::Number(n) => from_serial(*n),
        CellValue::Text(s) => {
            let s = s.trim();
            for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%d.%m.%Y"] {
                if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                    return Some(d);
                }
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%m/%d/%Y %H:%M:%S"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                    return Some(dt.date());
                }
            }
            s.parse::<f64>().ok().and_then(from_serial)
        }
        CellValue::Empty => None,
    }
}

pub fn parse_number(value: &CellValue) -> Option<f64> {
    match value {
        CellValue::Number(n) if !n.is_nan() => Some(*n),
        CellValue::Text(s) => {
            let cleaned: String = s
                .trim()
                .trim_start_matches(['$', '€', '£'])
                .chars()
                .filter(|c| *c != ',' && !c.is_whitespace())
                .collect();
            cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
        }
        _ => None,
    }
}
