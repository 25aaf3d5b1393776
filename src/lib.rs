//! Recruitment tracker data layer.
//!
//! Loads candidate and job-opening tables from loosely structured spreadsheets
//! (a local xlsx workbook or a hosted Google Sheet), normalizes them to a
//! canonical schema and writes records back against the sheet's live headers.

pub mod backend;
pub mod config;
pub mod error;
pub mod header;
pub mod migrate;
pub mod mock;
pub mod models;
pub mod schema;
pub mod sheets;
pub mod store;
pub mod workbook;

pub use backend::{Backend, Dataset, LocalFileBackend, RemoteSheetBackend, TableKind};
pub use config::Config;
pub use error::{BackendError, RemoteError};
pub use models::{fields, CandidateRecord, CellValue, JobRecord, Preferences, Record, Table};
pub use store::{Outcome, RecordStore};
