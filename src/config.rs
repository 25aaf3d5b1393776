//! Configuration file support for recruit
//!
//! Reads `recruit.toml` and layers the injected secrets from the environment on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::sheets::CredentialSource;

pub const CONFIG_FILE_NAME: &str = "recruit.toml";
pub const ENV_SPREADSHEET_URL: &str = "RECRUIT_SPREADSHEET_URL";
pub const ENV_SERVICE_ACCOUNT: &str = "RECRUIT_SERVICE_ACCOUNT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub workbook: WorkbookConfig,

    #[serde(default)]
    pub sheets: SheetNames,

    #[serde(default)]
    pub remote: RemoteConfig,

    /// Positional layout of the preferences grid
    #[serde(default)]
    pub preferences: PreferenceLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkbookConfig {
    #[serde(default = "default_workbook_path")]
    pub path: PathBuf,
}

fn default_workbook_path() -> PathBuf {
    PathBuf::from("recruitment_data.xlsx")
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            path: default_workbook_path(),
        }
    }
}

/// Worksheet names of the three logical tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub candidates: String,
    pub job_openings: String,
    pub preferences: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            candidates: "Candidates".to_string(),
            job_openings: "JobOpenings".to_string(),
            preferences: "Preferences".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Spreadsheet URL or title
    #[serde(default)]
    pub spreadsheet: Option<String>,

    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Injected spreadsheet URL (never read from the file)
    #[serde(skip)]
    pub secret_spreadsheet: Option<String>,

    /// Injected service-account JSON (never read from the file)
    #[serde(skip)]
    pub secret_service_account: Option<String>,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.json")
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            spreadsheet: None,
            credentials_file: default_credentials_file(),
            secret_spreadsheet: None,
            secret_service_account: None,
        }
    }
}

/// One list in the preferences grid: a column read downward from `start_row`
/// (0-based), optionally stopping before `end_row`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferenceColumn {
    pub column: usize,
    pub start_row: usize,
    #[serde(default)]
    pub end_row: Option<usize>,
}

impl PreferenceColumn {
    pub const fn new(column: usize, start_row: usize) -> Self {
        Self {
            column,
            start_row,
            end_row: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceLayout {
    pub recruiters: PreferenceColumn,
    pub status: PreferenceColumn,
    pub decision_comments: PreferenceColumn,
    pub sources: Option<PreferenceColumn>,
}

impl Default for PreferenceLayout {
    fn default() -> Self {
        Self {
            recruiters: PreferenceColumn::new(2, 7),
            status: PreferenceColumn::new(11, 7),
            decision_comments: PreferenceColumn::new(11, 18),
            sources: None,
        }
    }
}

/// Which backend is authoritative for the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSelection {
    Remote {
        spreadsheet: String,
        credentials: CredentialSource,
    },
    Local,
}

impl Config {
    /// Load config from an explicit path, else the nearest `recruit.toml` up the
    /// directory tree, else the platform config directory, else defaults.
    /// Environment secrets are applied last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => Self::find_config_path(),
        };

        let mut config = match &path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    fn find_config_path() -> Option<PathBuf> {
        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                return Some(candidate);
            }
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }

        directories::ProjectDirs::from("", "", "recruit")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }

    /// Relative paths in a config file are relative to that file.
    fn resolve_paths(&mut self, base: &Path) {
        if self.workbook.path.is_relative() {
            self.workbook.path = base.join(&self.workbook.path);
        }
        if self.remote.credentials_file.is_relative() {
            self.remote.credentials_file = base.join(&self.remote.credentials_file);
        }
    }

    fn apply_env(&mut self) {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        if let Some(url) = non_empty(ENV_SPREADSHEET_URL) {
            self.remote.secret_spreadsheet = Some(url);
        }
        if let Some(json) = non_empty(ENV_SERVICE_ACCOUNT) {
            self.remote.secret_service_account = Some(json);
        }
    }

    /// Injected secret > credentials file on disk > local workbook only.
    pub fn selection(&self) -> SourceSelection {
        let remote = &self.remote;
        let spreadsheet = remote
            .secret_spreadsheet
            .clone()
            .or_else(|| remote.spreadsheet.clone());
        let Some(spreadsheet) = spreadsheet else {
            return SourceSelection::Local;
        };

        if let Some(json) = &remote.secret_service_account {
            return SourceSelection::Remote {
                spreadsheet,
                credentials: CredentialSource::Secret(json.clone()),
            };
        }
        if remote.secret_spreadsheet.is_some() || remote.credentials_file.exists() {
            return SourceSelection::Remote {
                spreadsheet,
                credentials: CredentialSource::File(remote.credentials_file.clone()),
            };
        }
        SourceSelection::Local
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.sheets.candidates, "Candidates");
        assert_eq!(config.sheets.job_openings, "JobOpenings");
        assert_eq!(config.preferences.recruiters, PreferenceColumn::new(2, 7));
        assert_eq!(config.preferences.decision_comments.start_row, 18);
        assert_eq!(config.selection(), SourceSelection::Local);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[workbook]
path = "/data/tracker.xlsx"

[sheets]
job_openings = "Openings"

[remote]
spreadsheet = "Recruitment Tracker"

[preferences.status]
column = 4
start_row = 2
end_row = 9
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.workbook.path, PathBuf::from("/data/tracker.xlsx"));
        assert_eq!(config.sheets.job_openings, "Openings");
        assert_eq!(config.sheets.candidates, "Candidates");
        assert_eq!(config.preferences.status.end_row, Some(9));
        assert_eq!(config.preferences.recruiters, PreferenceColumn::new(2, 7));
        assert_eq!(config.remote.credentials_file, PathBuf::from("credentials.json"));
    }

    #[test]
    fn test_secret_takes_precedence() {
        let mut config = Config::default();
        config.remote.spreadsheet = Some("Tracker".into());
        config.remote.secret_spreadsheet = Some("https://docs.google.com/spreadsheets/d/abc/edit".into());
        config.remote.secret_service_account = Some("{}".into());
        assert_eq!(
            config.selection(),
            SourceSelection::Remote {
                spreadsheet: "https://docs.google.com/spreadsheets/d/abc/edit".into(),
                credentials: CredentialSource::Secret("{}".into()),
            }
        );
    }

    #[test]
    fn test_credentials_file_selects_remote() {
        let dir = TempDir::new().unwrap();
        let creds = dir.path().join("credentials.json");
        let mut config = Config::default();
        config.remote.spreadsheet = Some("Tracker".into());
        config.remote.credentials_file = creds.clone();
        assert_eq!(config.selection(), SourceSelection::Local);

        std::fs::write(&creds, "{}").unwrap();
        assert_eq!(
            config.selection(),
            SourceSelection::Remote {
                spreadsheet: "Tracker".into(),
                credentials: CredentialSource::File(creds),
            }
        );
    }

    #[test]
    fn test_relative_paths_follow_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[workbook]\npath = \"tracker.xlsx\"\n").unwrap();
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.workbook.path, dir.path().join("tracker.xlsx"));
    }
}
