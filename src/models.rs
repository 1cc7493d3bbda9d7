use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Applied,
    Interviewing,
    Offered,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Applied,
        Status::Interviewing,
        Status::Offered,
        Status::Rejected,
    ];

    /// Next step in the Applied -> Interviewing -> Offered -> Rejected -> Applied cycle.
    pub fn next(self) -> Status {
        let idx = self.index();
        Status::ALL[(idx + 1) % Status::ALL.len()]
    }

    /// Column position on the board.
    pub fn index(self) -> usize {
        match self {
            Status::Applied => 0,
            Status::Interviewing => 1,
            Status::Offered => 2,
            Status::Rejected => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Applied => "Applied",
            Status::Interviewing => "Interviewing",
            Status::Offered => "Offered",
            Status::Rejected => "Rejected",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Status {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                anyhow!(
                    "Unknown status '{}' (expected applied, interviewing, offered, rejected)",
                    s
                )
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(anyhow!("Unknown theme '{}' (expected light or dark)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTask {
    pub id: u32,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplication {
    pub id: Uuid,
    pub title: String,
    pub status: Status,
    pub applied_date: NaiveDate,
    #[serde(default)]
    pub salary: u64, // 0 = unset
    #[serde(default)]
    pub interview_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tasks: Vec<JobTask>,
    #[serde(default)]
    pub priority: bool,
    #[serde(default = "Utc::now")]
    pub last_modified: DateTime<Utc>,
}

impl JobApplication {
    pub fn new(title: &str, applied_date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.trim().to_string(),
            status: Status::Applied,
            applied_date,
            salary: 0,
            interview_date: None,
            notes: String::new(),
            tasks: Vec::new(),
            priority: false,
            last_modified: now,
        }
    }

    /// First 8 hex digits of the id, enough to address a record from the CLI.
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn next_task_id(&self) -> u32 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1
    }

    pub fn completed_tasks(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }
}

/// Partial edit merged into a record by `Action::Update`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub applied_date: Option<NaiveDate>,
    pub salary: Option<u64>,
    pub interview_date: Option<Option<NaiveDate>>,
    pub notes: Option<String>,
    pub priority: Option<bool>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        *self == JobPatch::default()
    }
}

/// Checks the invariants a collection must hold before it may replace the store.
pub fn validate_collection(jobs: &[JobApplication]) -> Result<()> {
    let mut ids = HashSet::new();
    for (idx, job) in jobs.iter().enumerate() {
        if job.title.trim().is_empty() {
            return Err(anyhow!("Record {} has an empty title", idx + 1));
        }
        if !ids.insert(job.id) {
            return Err(anyhow!("Duplicate record id {}", job.id));
        }
        let mut task_ids = HashSet::new();
        for task in &job.tasks {
            if !task_ids.insert(task.id) {
                return Err(anyhow!(
                    "Record '{}' has duplicate task id {}",
                    job.title,
                    task.id
                ));
            }
        }
    }
    Ok(())
}
