//! Sample workbook generator.
//!
//! Produces sheets shaped like the recruitment tracker template the loader is
//! built for: banner rows above a header on row 5, a blank first column, the
//! template's own header spellings and a positional preferences grid.

use chrono::{Days, Local, NaiveDate};
use rand::prelude::*;
use std::path::Path;
use tracing::info;

use crate::config::{PreferenceColumn, PreferenceLayout, SheetNames};
use crate::error::Result;
use crate::header::Grid;
use crate::models::{JobStatus, PipelineStage};
use crate::workbook;

pub const HEADER_ROW: usize = 5;

const RECRUITERS: &[&str] = &["Austin Millfrey", "Peter Caron", "Wesley Crafter", "Sarah Johnson", "Mike Thompson"];

const DEPARTMENTS: &[(&str, &[&str])] = &[
    ("Sales", &["Sales Specialist", "Account Manager", "Sales Director"]),
    ("Marketing", &["Marketing Manager", "Content Creator", "SEO Specialist"]),
    ("Human Resources", &["HR Specialist", "HR Manager", "Recruiter"]),
    ("IT", &["Software Developer", "IT Support", "DevOps Engineer"]),
    ("Finance", &["Financial Analyst", "Accountant", "CFO"]),
    ("Operations", &["Operations Manager", "Logistics Coordinator"]),
    ("Legal Affairs", &["Attorney", "Legal Counsel"]),
    ("Public Relations", &["PR Manager", "Social Media Manager"]),
];

const SOURCES: &[&str] = &[
    "LinkedIn",
    "Job Portals",
    "Own Website",
    "Recruitment Agency",
    "Facebook",
    "Twitter",
    "Instagram",
    "Referral",
    "Newspaper",
];

const DECISIONS: &[&str] = &["Hired", "Not Hired", "Candidate in Process", "Candidate Refusal", ""];

const FIRST_NAMES: &[&str] = &[
    "John", "Emma", "Michael", "Sophia", "William", "Olivia", "James", "Ava", "Robert", "Isabella",
    "David", "Mia", "Richard", "Charlotte", "Joseph", "Amelia", "Thomas", "Harper", "Charles", "Evelyn",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez", "Martinez",
    "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson", "Martin",
];

const HR_VIEWS: &[&str] = &[
    "Strong technical skills",
    "Good cultural fit",
    "Excellent communication",
    "Needs more experience",
    "Perfect match for the role",
    "",
];

const MANAGER_VIEWS: &[&str] = &[
    "Impressed with portfolio",
    "Good problem-solving skills",
    "Team player",
    "Lacks specific expertise",
    "Highly recommended",
    "",
];

const DECISION_MAKER_VIEWS: &[&str] = &[
    "Approve for hire",
    "Request second interview",
    "Salary expectations too high",
    "Strong candidate",
    "Not a fit",
    "",
];

const RECEIVED_COMMENTS: &[&str] = &[
    "Resume looks promising",
    "Referred by employee",
    "Applied through LinkedIn",
    "Direct application",
    "",
];

const NOTES: &[&str] = &[
    "Follow up in 2 weeks",
    "Schedule technical interview",
    "Waiting for references",
    "Offer sent",
    "Declined offer",
    "",
];

const JOB_HEADERS: &[&str] = &[
    "",
    "JOB ID",
    "DEPARTMENT",
    "JOB TITLE",
    "OPENING DATE",
    "RECRUITER",
    "STATUS",
    "NEW HIRE START DATE",
    "HIRING COST",
];

const CANDIDATE_HEADERS: &[&str] = &[
    "",
    "JOB ID",
    "DEPARTMENT",
    "JOB APPLIED FOR",
    "RECRUITER",
    "CANDIDATE NAME",
    "SOURCE",
    "APPLIED DATE",
    "RECRUITMENT PHASE\n(Pipeline)",
    "FINAL DECISION",
    "HR VIEW",
    "HIRING MANAGER VIEW",
    "DECISION MAKER VIEW",
    "COMMENTS",
    "RECIEVED APPLICATION COMMENTS",
    "EMAIL",
    "PHONE",
];

#[derive(Debug, Clone)]
pub struct MockOptions {
    pub jobs: usize,
    pub candidates: usize,
    /// Fixed seed for reproducible output
    pub seed: Option<u64>,
    /// Dates are generated backwards from this day
    pub today: NaiveDate,
}

impl Default for MockOptions {
    fn default() -> Self {
        Self {
            jobs: 15,
            candidates: 30,
            seed: None,
            today: Local::now().date_naive(),
        }
    }
}

/// Raw grids of a generated workbook.
#[derive(Debug, Clone, PartialEq)]
pub struct MockWorkbook {
    pub candidates: Grid,
    pub jobs: Grid,
    pub preferences: Grid,
}

struct MockJob {
    id: usize,
    department: &'static str,
    title: &'static str,
}

fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

fn days_ago(today: NaiveDate, days: u64) -> NaiveDate {
    today.checked_sub_days(Days::new(days)).unwrap_or(today)
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn banner(title: &str, width: usize) -> Grid {
    let mut rows = vec![vec![String::new(); width]; HEADER_ROW];
    rows[1][1] = title.to_string();
    rows[2][1] = "Sample data".to_string();
    rows
}

fn header_row(headers: &[&str]) -> Vec<String> {
    headers.iter().map(|h| h.to_string()).collect()
}

fn generate_jobs(rng: &mut StdRng, opts: &MockOptions) -> (Grid, Vec<MockJob>) {
    let mut grid = banner("Job Openings", JOB_HEADERS.len());
    grid.push(header_row(JOB_HEADERS));
    let mut jobs = Vec::with_capacity(opts.jobs);

    for id in 1..=opts.jobs {
        let (department, titles) = DEPARTMENTS
            .choose(rng)
            .copied()
            .unwrap_or(DEPARTMENTS[0]);
        let title = pick(rng, titles);
        let opened = days_ago(opts.today, rng.gen_range(30..=365));
        let status = JobStatus::ALL.choose(rng).copied().unwrap_or(JobStatus::Vacant);
        let start = match status {
            JobStatus::Filled => opened
                .checked_add_days(Days::new(rng.gen_range(30..=90)))
                .map(iso)
                .unwrap_or_default(),
            _ => String::new(),
        };
        let cost: u32 = rng.gen_range(100..=5000);

        grid.push(vec![
            String::new(),
            id.to_string(),
            department.to_string(),
            title.to_string(),
            iso(opened),
            pick(rng, RECRUITERS).to_string(),
            status.label().to_string(),
            start,
            cost.to_string(),
        ]);
        jobs.push(MockJob { id, department, title });
    }
    (grid, jobs)
}

fn generate_candidates(rng: &mut StdRng, opts: &MockOptions, jobs: &[MockJob]) -> Grid {
    let mut grid = banner("Candidates", CANDIDATE_HEADERS.len());
    grid.push(header_row(CANDIDATE_HEADERS));

    for _ in 0..opts.candidates {
        let first = pick(rng, FIRST_NAMES);
        let last = pick(rng, LAST_NAMES);
        let (job_id, department, position) = match jobs.choose(rng) {
            Some(job) => (job.id, job.department, job.title),
            None => {
                let (dept, titles) = DEPARTMENTS[rng.gen_range(0..DEPARTMENTS.len())];
                (rng.gen_range(1..=10), dept, pick(rng, titles))
            }
        };
        let stage = PipelineStage::ALL
            .choose(rng)
            .copied()
            .unwrap_or(PipelineStage::ReceivedApplication);
        let decision = match stage {
            PipelineStage::Hired => "Hired",
            PipelineStage::ReceivedApplication | PipelineStage::SentToManager => "Candidate in Process",
            _ => pick(rng, DECISIONS),
        };
        let applied = days_ago(opts.today, rng.gen_range(1..=180));
        let phone = format!(
            "+1-{}-{}-{}",
            rng.gen_range(100..=999),
            rng.gen_range(100..=999),
            rng.gen_range(1000..=9999)
        );

        grid.push(vec![
            String::new(),
            job_id.to_string(),
            department.to_string(),
            position.to_string(),
            pick(rng, RECRUITERS).to_string(),
            format!("{} {}", first, last),
            pick(rng, SOURCES).to_string(),
            iso(applied),
            stage.label().to_string(),
            decision.to_string(),
            pick(rng, HR_VIEWS).to_string(),
            pick(rng, MANAGER_VIEWS).to_string(),
            pick(rng, DECISION_MAKER_VIEWS).to_string(),
            pick(rng, NOTES).to_string(),
            pick(rng, RECEIVED_COMMENTS).to_string(),
            format!("{}.{}@email.com", first.to_lowercase(), last.to_lowercase()),
            phone,
        ]);
    }
    grid
}

fn place(grid: &mut Grid, col: &PreferenceColumn, values: &[&str]) {
    for (offset, value) in values.iter().enumerate() {
        let row = col.start_row + offset;
        if grid.len() <= row {
            grid.resize(row + 1, Vec::new());
        }
        let cells = &mut grid[row];
        if cells.len() <= col.column {
            cells.resize(col.column + 1, String::new());
        }
        cells[col.column] = value.to_string();
    }
}

/// Preferences grid with each list at the position the layout reads it from.
fn generate_preferences(layout: &PreferenceLayout) -> Grid {
    let mut grid: Grid = vec![vec!["Preferences".to_string()]];
    let stages: Vec<&str> = PipelineStage::ALL.iter().map(|s| s.label()).collect();
    place(&mut grid, &layout.recruiters, RECRUITERS);
    place(&mut grid, &layout.status, &stages);
    place(&mut grid, &layout.decision_comments, &DECISIONS[..DECISIONS.len() - 1]);
    if let Some(sources) = &layout.sources {
        place(&mut grid, sources, SOURCES);
    }
    let width = grid.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut grid {
        row.resize(width, String::new());
    }
    grid
}

pub fn generate(opts: &MockOptions, layout: &PreferenceLayout) -> MockWorkbook {
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let (jobs, mock_jobs) = generate_jobs(&mut rng, opts);
    let candidates = generate_candidates(&mut rng, opts, &mock_jobs);
    MockWorkbook {
        candidates,
        jobs,
        preferences: generate_preferences(layout),
    }
}

impl MockWorkbook {
    /// Writes the three sheets as a fresh workbook, replacing any file at `path`.
    pub fn save(&self, path: &Path, sheets: &SheetNames) -> Result<()> {
        let book = workbook::from_grids(&[
            (sheets.candidates.as_str(), &self.candidates),
            (sheets.job_openings.as_str(), &self.jobs),
            (sheets.preferences.as_str(), &self.preferences),
        ])?;
        workbook::save(&book, path)?;
        info!(
            path = %path.display(),
            jobs = self.jobs.len() - HEADER_ROW - 1,
            candidates = self.candidates.len() - HEADER_ROW - 1,
            "wrote sample workbook"
        );
        Ok(())
    }
}
