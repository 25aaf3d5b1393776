use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use recruit::config::SourceSelection;
use recruit::header;
use recruit::migrate;
use recruit::mock::{self, MockOptions};
use recruit::models::{JobStatus, PipelineStage};
use recruit::sheets::GoogleSheetsClient;
use recruit::workbook;
use recruit::{fields, CandidateRecord, Config, JobRecord, Outcome, Record, RecordStore, TableKind};

#[derive(Parser)]
#[command(name = "recruit")]
#[command(about = "Recruitment tracker - candidates and job openings kept in a spreadsheet")]
struct Cli {
    /// Path to recruit.toml
    #[arg(short, long, global = true, env = "RECRUIT_CONFIG")]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the data and report where it came from
    Status,

    /// List candidates
    Candidates {
        /// Filter by pipeline stage
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by position (substring match)
        #[arg(short, long)]
        position: Option<String>,
    },

    /// List job openings
    Jobs {
        /// Filter by job status (vacant, filled, suspended, cancelled)
        #[arg(short, long)]
        status: Option<JobStatus>,

        /// Filter by department
        #[arg(short, long)]
        department: Option<String>,
    },

    /// Show candidate details
    Show {
        /// Candidate name
        name: String,
    },

    /// Show preference lists
    Prefs {
        /// Only this list (e.g. recruiters, sources)
        list: Option<String>,
    },

    /// Add a candidate
    AddCandidate {
        /// Candidate name
        name: String,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// Position applied for
        #[arg(short, long)]
        position: Option<String>,

        /// Job opening the candidate applied to
        #[arg(long)]
        job_id: Option<i64>,

        #[arg(long)]
        department: Option<String>,

        #[arg(short, long)]
        recruiter: Option<String>,

        #[arg(long)]
        source: Option<String>,

        /// Pipeline stage
        #[arg(short, long, default_value = "Received Application")]
        status: PipelineStage,

        /// Application date (YYYY-MM-DD, default today)
        #[arg(long)]
        date: Option<NaiveDate>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Add a job opening
    AddJob {
        /// Job title
        title: String,

        /// Job ID (default: next free id)
        #[arg(long)]
        id: Option<i64>,

        #[arg(short, long)]
        department: Option<String>,

        #[arg(short, long)]
        recruiter: Option<String>,

        #[arg(short, long, default_value = "Vacant")]
        status: JobStatus,

        /// Opening date (YYYY-MM-DD, default today)
        #[arg(long)]
        opened: Option<NaiveDate>,

        #[arg(long)]
        start_date: Option<NaiveDate>,

        #[arg(long)]
        cost: Option<f64>,
    },

    /// Update fields of a candidate
    UpdateCandidate {
        /// Candidate name
        name: String,

        /// FIELD=VALUE, repeatable (e.g. --set "STATUS=Interviews")
        #[arg(long = "set", required = true, value_parser = parse_assignment)]
        updates: Vec<(String, String)>,
    },

    /// Update fields of a job opening
    UpdateJob {
        /// Job ID
        id: i64,

        /// FIELD=VALUE, repeatable (e.g. --set "STATUS=Filled")
        #[arg(long = "set", required = true, value_parser = parse_assignment)]
        updates: Vec<(String, String)>,
    },

    /// Show how the local workbook's headers map to canonical fields
    Inspect,

    /// Write a workbook filled with sample data
    Seed {
        #[arg(long, default_value = "15")]
        jobs: usize,

        #[arg(long, default_value = "30")]
        candidates: usize,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output path (default: the configured workbook)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Upload the local workbook to the configured remote spreadsheet
    Migrate,
}

/// Parses `FIELD=VALUE`. Field names are matched case-insensitively later, so
/// they are only trimmed and uppercased here. Values stay raw until the target
/// table is known.
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got '{}'", s))?;
    let field = field.trim().to_uppercase();
    if field.is_empty() {
        return Err(format!("missing field name in '{}'", s));
    }
    Ok((field, value.trim().to_string()))
}

fn typed_updates(kind: TableKind, updates: Vec<(String, String)>) -> Record {
    let mapping = kind.mapping();
    updates
        .into_iter()
        .map(|(field, raw)| {
            let value = mapping.typed_value(&field, &raw);
            (field, value)
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let default = if verbose { "recruit=debug" } else { "recruit=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(config: &Config) -> Result<RecordStore> {
    let mut store = RecordStore::from_config(config);
    let outcome = store.load();
    if !outcome.success {
        bail!(outcome.message);
    }
    Ok(store)
}

fn report(outcome: Outcome) -> Result<()> {
    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        Err(anyhow!(outcome.message))
    }
}

fn text(record: &Record, field: &str) -> String {
    record.get(field).map(|v| v.to_string()).unwrap_or_default()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Status => {
            let store = open_store(&config)?;
            println!("Source: {} ({})", store.describe(), store.loaded_from());
            println!("Candidates: {}", store.candidates().len());
            println!("Job openings: {}", store.jobs().len());
            for (name, values) in store.preferences().lists() {
                println!("  {:<18} {}", name, values.len());
            }
        }

        Commands::Candidates { status, position } => {
            let store = open_store(&config)?;
            let candidates: Vec<CandidateRecord> = store
                .candidate_records()
                .into_iter()
                .filter(|c| match &status {
                    Some(s) => c.status.as_deref().is_some_and(|cs| cs.eq_ignore_ascii_case(s.trim())),
                    None => true,
                })
                .filter(|c| match &position {
                    Some(p) => c
                        .position
                        .as_deref()
                        .is_some_and(|cp| cp.to_lowercase().contains(&p.to_lowercase())),
                    None => true,
                })
                .collect();

            if candidates.is_empty() {
                println!("No candidates found.");
            } else {
                println!("{:<24} {:<22} {:<22} {:<16} {:<10}", "NAME", "POSITION", "STATUS", "RECRUITER", "APPLIED");
                println!("{}", "-".repeat(98));
                for c in candidates {
                    println!(
                        "{:<24} {:<22} {:<22} {:<16} {:<10}",
                        truncate(&c.name, 22),
                        truncate(c.position.as_deref().unwrap_or("-"), 20),
                        truncate(c.status.as_deref().unwrap_or("-"), 20),
                        truncate(c.recruiter.as_deref().unwrap_or("-"), 14),
                        c.application_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Jobs { status, department } => {
            let store = open_store(&config)?;
            let jobs: Vec<JobRecord> = store
                .job_records()
                .into_iter()
                .filter(|j| status.is_none() || j.job_status() == status)
                .filter(|j| match &department {
                    Some(d) => j.department.as_deref().is_some_and(|jd| jd.eq_ignore_ascii_case(d.trim())),
                    None => true,
                })
                .collect();

            if jobs.is_empty() {
                println!("No job openings found.");
            } else {
                println!("{:<6} {:<24} {:<18} {:<10} {:<10} {:>10}", "ID", "TITLE", "DEPARTMENT", "STATUS", "OPENED", "COST");
                println!("{}", "-".repeat(83));
                for j in jobs {
                    println!(
                        "{:<6} {:<24} {:<18} {:<10} {:<10} {:>10}",
                        j.job_id.map(|id| id.to_string()).unwrap_or_default(),
                        truncate(j.title.as_deref().unwrap_or("-"), 22),
                        truncate(j.department.as_deref().unwrap_or("-"), 16),
                        j.status.as_deref().unwrap_or("-"),
                        j.opening_date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string()),
                        j.hiring_cost.map(|c| format!("{:.0}", c)).unwrap_or_else(|| "-".to_string())
                    );
                }
            }
        }

        Commands::Show { name } => {
            let store = open_store(&config)?;
            let wanted = name.trim();
            let found = store
                .candidates()
                .records()
                .find(|r| text(r, fields::CANDIDATE_NAME).trim().eq_ignore_ascii_case(wanted));
            match found {
                Some(record) => {
                    println!("Candidate: {}", text(&record, fields::CANDIDATE_NAME));
                    for field in [
                        fields::POSITION,
                        fields::JOB_ID,
                        fields::DEPARTMENT,
                        fields::STATUS,
                        fields::FINAL_DECISION,
                        fields::APPLICATION_DATE,
                        fields::RECRUITER,
                        fields::SOURCE,
                        fields::EMAIL,
                        fields::PHONE,
                    ] {
                        let value = text(&record, field);
                        if !value.is_empty() {
                            println!("{}: {}", field, value);
                        }
                    }
                    for field in [
                        fields::HR_VIEW,
                        fields::HIRING_MANAGER_VIEW,
                        fields::DECISION_MAKER_VIEW,
                        fields::RECEIVED_APPLICATION_COMMENTS,
                        fields::NOTES,
                    ] {
                        let value = text(&record, field);
                        if !value.is_empty() {
                            println!("\n--- {} ---", field);
                            println!("{}", textwrap::fill(&value, 78));
                        }
                    }
                }
                None => {
                    println!("Candidate '{}' not found.", name);
                }
            }
        }

        Commands::Prefs { list } => {
            let store = open_store(&config)?;
            let prefs = store.preferences();
            match list {
                Some(name) => {
                    let values = prefs
                        .get(&name)
                        .ok_or_else(|| anyhow!("Unknown preference list '{}'", name))?;
                    for value in values {
                        println!("{}", value);
                    }
                }
                None => {
                    for (name, values) in prefs.lists() {
                        println!("{}:", name);
                        if values.is_empty() {
                            println!("  (none)");
                        }
                        for value in values {
                            println!("  {}", value);
                        }
                    }
                }
            }
        }

        Commands::AddCandidate {
            name,
            email,
            phone,
            position,
            job_id,
            department,
            recruiter,
            source,
            status,
            date,
            notes,
        } => {
            let mut store = open_store(&config)?;
            let candidate = CandidateRecord {
                email,
                phone,
                position,
                job_id,
                department,
                recruiter,
                source,
                status: Some(status.label().to_string()),
                application_date: Some(date.unwrap_or_else(|| chrono::Local::now().date_naive())),
                notes,
                ..CandidateRecord::new(&name)
            };
            report(store.append_candidate(&candidate.to_record()))?;
        }

        Commands::AddJob {
            title,
            id,
            department,
            recruiter,
            status,
            opened,
            start_date,
            cost,
        } => {
            let mut store = open_store(&config)?;
            let job = JobRecord {
                job_id: id,
                department,
                title: Some(title),
                opening_date: Some(opened.unwrap_or_else(|| chrono::Local::now().date_naive())),
                recruiter,
                status: Some(status.label().to_string()),
                new_hire_start_date: start_date,
                hiring_cost: cost,
            };
            report(store.append_job(&job.to_record()))?;
        }

        Commands::UpdateCandidate { name, updates } => {
            let mut store = open_store(&config)?;
            let updates = typed_updates(TableKind::Candidates, updates);
            report(store.update_candidate(&name, &updates))?;
        }

        Commands::UpdateJob { id, updates } => {
            let mut store = open_store(&config)?;
            let updates = typed_updates(TableKind::JobOpenings, updates);
            report(store.update_job(id, &updates))?;
        }

        Commands::Inspect => {
            let path = &config.workbook.path;
            let book = workbook::open(path)
                .with_context(|| format!("Failed to open workbook: {}", path.display()))?;
            println!("Workbook: {}", path.display());
            println!("Sheets: {}", workbook::sheet_names(&book).join(", "));
            for kind in [TableKind::Candidates, TableKind::JobOpenings] {
                let sheet = kind.sheet_name(&config.sheets);
                println!("\n[{}]", sheet);
                let Some(grid) = workbook::read_grid(&book, sheet) else {
                    println!("  sheet missing");
                    continue;
                };
                let Some(row) = header::locate_header(&grid, kind.identity()) else {
                    match header::suggest_header(&grid, kind.identity()) {
                        Some(close) => println!("  no '{}' header (closest: '{}')", kind.identity(), close),
                        None => println!("  no '{}' header in the first {} rows", kind.identity(), header::HEADER_SCAN_LIMIT),
                    }
                    continue;
                };
                println!("  header row: {}", row + 1);
                for (idx, raw) in header::header_names(&grid[row]).iter().enumerate() {
                    let mapped = if header::is_placeholder(raw) {
                        "(dropped)".to_string()
                    } else {
                        match kind.mapping().canonical_for(raw) {
                            Some(canonical) => canonical.to_string(),
                            None => "unmapped".to_string(),
                        }
                    };
                    println!("  {:>3}  {:<36} -> {}", idx + 1, raw.replace('\n', "\\n"), mapped);
                }
                println!("  data rows: {}", grid.len().saturating_sub(row + 1));
            }
        }

        Commands::Seed {
            jobs,
            candidates,
            seed,
            output,
            force,
        } => {
            let path = output.unwrap_or_else(|| config.workbook.path.clone());
            if path.exists() && !force {
                bail!("{} already exists. Use --force to overwrite it.", path.display());
            }
            let opts = MockOptions {
                jobs,
                candidates,
                seed,
                ..MockOptions::default()
            };
            mock::generate(&opts, &config.preferences)
                .save(&path, &config.sheets)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} job openings and {} candidates to {}",
                jobs,
                candidates,
                path.display()
            );
        }

        Commands::Migrate => {
            let SourceSelection::Remote {
                spreadsheet,
                credentials,
            } = config.selection()
            else {
                bail!(
                    "No remote spreadsheet configured. Set [remote] spreadsheet in recruit.toml \
                     and provide credentials.json, or set RECRUIT_SPREADSHEET_URL and RECRUIT_SERVICE_ACCOUNT."
                );
            };
            let mut client = GoogleSheetsClient::new(credentials, &spreadsheet);
            println!("Migrating {} to {}...", config.workbook.path.display(), spreadsheet);
            let report = migrate::migrate(&config.workbook.path, &config.sheets, &mut client)?;
            for (sheet, rows) in &report.uploaded {
                println!("  {:<14} {} rows uploaded", sheet, rows);
            }
            for (sheet, reason) in &report.skipped {
                println!("  {:<14} skipped: {}", sheet, reason);
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
