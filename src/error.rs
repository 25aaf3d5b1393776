use std::path::PathBuf;
use thiserror::Error;

/// Failures talking to the remote spreadsheet service.
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error(
        "Spreadsheet '{locator}' not found. Make sure it exists and is shared with the service account{}.",
        account_hint(.account)
    )]
    SpreadsheetNotFound {
        locator: String,
        account: Option<String>,
    },

    #[error(
        "Access denied to spreadsheet '{locator}'. Share it with the service account{} as an editor and retry.",
        account_hint(.account)
    )]
    AccessDenied {
        locator: String,
        account: Option<String>,
    },

    #[error("Google Drive API is not enabled for this project. Reference the spreadsheet by its URL instead of its title, or enable the Drive API. ({0})")]
    ApiDisabled(String),

    #[error("Malformed spreadsheet URL '{0}'. Expected https://docs.google.com/spreadsheets/d/<id>/...")]
    InvalidLocator(String),

    #[error("Service account credentials unusable: {0}")]
    Credentials(String),

    #[error("Worksheet '{0}' not found in the spreadsheet")]
    WorksheetNotFound(String),

    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection to Google Sheets failed: {0}")]
    Transport(String),
}

fn account_hint(account: &Option<String>) -> String {
    match account {
        Some(email) => format!(" ({})", email),
        None => String::new(),
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

/// Errors raised by a storage backend. The display text is what the user sees.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("No data source available: {0}")]
    SourceUnavailable(String),

    #[error("The workbook {} is open in another program. Close it and retry.", .0.display())]
    Locked(PathBuf),

    #[error("Could not find the '{label}' header in the first {scanned} rows of sheet '{sheet}'")]
    HeaderNotFound {
        sheet: String,
        label: String,
        scanned: usize,
    },

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("{kind} '{identity}' not found")]
    NotFound { kind: &'static str, identity: String },

    #[error("Field '{field}' has no matching column in sheet '{sheet}'")]
    UnknownField { sheet: String, field: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BackendError {
    /// Lock conflicts and remote hiccups can be retried by the user without changing anything.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BackendError::Locked(_) | BackendError::Remote(RemoteError::Transport(_))
        )
    }
}

pub type Result<T, E = BackendError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_names_the_account() {
        let err = RemoteError::AccessDenied {
            locator: "Tracker".into(),
            account: Some("bot@proj.iam.gserviceaccount.com".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("Tracker"));
        assert!(msg.contains("bot@proj.iam.gserviceaccount.com"));
    }

    #[test]
    fn test_locked_is_retryable() {
        assert!(BackendError::Locked(PathBuf::from("a.xlsx")).is_retryable());
        assert!(!BackendError::SheetNotFound("Candidates".into()).is_retryable());
    }
}
