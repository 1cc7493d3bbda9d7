mod backup;
mod config;
mod db;
mod filter;
mod links;
mod models;
mod share;
mod state;
mod stats;
mod tui;

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use db::Database;
use env_logger::Env;
use filter::{filtered_view, ViewQuery};
use links::Logo;
use models::{JobPatch, Status, Theme};
use state::{Action, AppState};
use stats::{is_ghosted, needs_follow_up, salary_benchmark, DerivedStats};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "tracker")]
#[command(about = "Job application tracker - log applications, move them through the pipeline, watch your stats")]
struct Cli {
    /// Path to the tracker store
    #[arg(long, global = true, env = config::DB_ENV)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a job application
    Add {
        /// Company or role name
        title: String,

        /// Date applied (YYYY-MM-DD), defaults to today
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// List job applications
    List {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show job details
    Show {
        /// Job ID (or unique prefix)
        id: String,
    },

    /// Advance a job to the next status
    Next {
        /// Job ID (or unique prefix)
        id: String,
    },

    /// Move a job to a status column
    Move {
        /// Job ID (or unique prefix)
        id: String,

        /// Target status (applied, interviewing, offered, rejected)
        status: Status,
    },

    /// Edit job fields
    Edit {
        /// Job ID (or unique prefix)
        id: String,

        #[arg(long)]
        title: Option<String>,

        /// Date applied (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,

        #[arg(long)]
        salary: Option<u64>,

        /// Interview date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date, conflicts_with = "clear_interview")]
        interview_date: Option<NaiveDate>,

        /// Remove the interview date
        #[arg(long)]
        clear_interview: bool,

        #[arg(long, conflicts_with = "template_notes")]
        notes: Option<String>,

        /// Replace notes with the standard template
        #[arg(long)]
        template_notes: bool,

        /// Flag or unflag as priority
        #[arg(long)]
        priority: Option<bool>,
    },

    /// Manage a job's follow-up tasks
    Task {
        #[command(subcommand)]
        command: TaskCommands,
    },

    /// Delete a job
    Delete {
        /// Job ID (or unique prefix)
        id: String,
    },

    /// Delete every job
    Clear {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show pipeline statistics
    Stats,

    /// Set the weekly application goal
    Goal {
        goal: u32,
    },

    /// Set or toggle the board theme
    Theme {
        /// light or dark; toggles when omitted
        theme: Option<Theme>,
    },

    /// Write all jobs to a JSON backup file
    Backup {
        file: PathBuf,
    },

    /// Replace all jobs with the contents of a JSON backup file
    Restore {
        file: PathBuf,
    },

    /// Export jobs as CSV
    ExportCsv {
        file: PathBuf,
    },

    /// Write a shareable summary card
    Share {
        file: PathBuf,
    },

    /// Open an interview-prep search for a job
    Prep {
        /// Job ID (or unique prefix)
        id: String,
    },

    /// Download the company logo for a job
    Logo {
        /// Job ID (or unique prefix)
        id: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Interactive kanban board
    Board {
        #[command(flatten)]
        query: QueryArgs,
    },
}

#[derive(Subcommand)]
enum TaskCommands {
    /// Add a task to a job
    Add {
        /// Job ID (or unique prefix)
        id: String,

        text: String,
    },

    /// Toggle a task done/undone
    Toggle {
        /// Job ID (or unique prefix)
        id: String,

        task_id: u32,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Filter by status (applied, interviewing, offered, rejected)
    #[arg(short, long)]
    status: Option<Status>,

    /// Title contains (case-insensitive)
    #[arg(short, long, default_value = "")]
    title: String,

    /// Notes contain (case-insensitive)
    #[arg(short, long, default_value = "")]
    notes: String,
}

impl From<QueryArgs> for ViewQuery {
    fn from(args: QueryArgs) -> Self {
        ViewQuery {
            status: args.status.into(),
            title: args.title,
            notes: args.notes,
        }
    }
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("invalid date '{}': {}", s, e))
}

/// Applies `action` and persists the result if it was accepted.
fn commit(db: &mut Database, state: &AppState, action: Action) -> Result<Option<AppState>> {
    let next = state.apply(action, Utc::now())?;
    if let Some(next) = &next {
        db.save(next)?;
    }
    Ok(next)
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn main() -> Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("warn"));

    let cli = Cli::parse();
    let path = config::db_path(cli.db)?;
    let mut db = Database::open(&path)?;
    log::debug!("using store at {}", db.path().display());
    let state = db.load()?;

    match cli.command {
        Commands::Add { title, date } => {
            match commit(&mut db, &state, Action::Add { title, date })? {
                Some(next) => {
                    let job = &next.jobs[0];
                    println!("Added '{}' ({})", job.title, job.short_id());
                }
                None => println!("Title cannot be empty; nothing added."),
            }
        }

        Commands::List { query } => {
            let query: ViewQuery = query.into();
            let view = filtered_view(&state.jobs, &query);
            if view.is_empty() {
                println!("No jobs found.");
            } else {
                let now = Utc::now();
                println!(
                    "{:<9} {:<13} {:<30} {:<11} {:>9} {:<6}",
                    "ID", "STATUS", "TITLE", "APPLIED", "SALARY", "FLAGS"
                );
                println!("{}", "-".repeat(83));
                for job in view {
                    let salary = if job.salary > 0 {
                        format!("${}k", job.salary / 1000)
                    } else {
                        "-".to_string()
                    };
                    let mut flags = String::new();
                    if job.priority {
                        flags.push('*');
                    }
                    if needs_follow_up(job, now) {
                        flags.push('!');
                    }
                    if is_ghosted(job, now) {
                        flags.push('~');
                    }
                    println!(
                        "{:<9} {:<13} {:<30} {:<11} {:>9} {:<6}",
                        job.short_id(),
                        job.status,
                        truncate(&job.title, 28),
                        job.applied_date.to_string(),
                        salary,
                        flags
                    );
                }
            }
        }

        Commands::Show { id } => {
            let job = state.resolve(&id)?;
            let now = Utc::now();
            println!("Job {}", job.id);
            println!("Title: {}", job.title);
            println!("Status: {}", job.status);
            println!("Applied: {}", job.applied_date);
            if let Some(date) = job.interview_date {
                println!("Interview: {}", date);
            }
            if job.salary > 0 {
                println!(
                    "Salary: ${} ({})",
                    job.salary,
                    salary_benchmark(job.salary).label()
                );
            }
            if job.priority {
                println!("Priority: yes");
            }
            if needs_follow_up(job, now) {
                println!("Needs follow-up: applied over {} days ago", config::FOLLOW_UP_DAYS);
            }
            if is_ghosted(job, now) {
                println!("Quiet: no changes in over {} days", config::GHOSTED_DAYS);
            }
            println!("Last modified: {}", job.last_modified.format("%Y-%m-%d %H:%M"));
            if !job.tasks.is_empty() {
                println!("\nTasks ({}/{} done):", job.completed_tasks(), job.tasks.len());
                for task in &job.tasks {
                    let mark = if task.completed { "x" } else { " " };
                    println!("  [{}] {}. {}", mark, task.id, task.text);
                }
            }
            if !job.notes.is_empty() {
                println!("\n--- Notes ---");
                for line in textwrap::fill(&job.notes, 78).lines() {
                    println!("{}", line);
                }
            }
        }

        Commands::Next { id } => {
            let job_id = state.resolve(&id)?.id;
            if let Some(next) = commit(&mut db, &state, Action::AdvanceStatus(job_id))? {
                if let Some(job) = next.get(job_id) {
                    println!("'{}' is now {}", job.title, job.status);
                }
            }
        }

        Commands::Move { id, status } => {
            let job = state.resolve(&id)?;
            let (job_id, title) = (job.id, job.title.clone());
            match commit(&mut db, &state, Action::SetStatus(job_id, status))? {
                Some(_) => println!("Moved '{}' to {}", title, status),
                None => println!("'{}' is already {}", title, status),
            }
        }

        Commands::Edit {
            id,
            title,
            date,
            salary,
            interview_date,
            clear_interview,
            notes,
            template_notes,
            priority,
        } => {
            let job_id = state.resolve(&id)?.id;
            let patch = JobPatch {
                title,
                applied_date: date,
                salary,
                interview_date: if clear_interview {
                    Some(None)
                } else {
                    interview_date.map(Some)
                },
                notes: if template_notes {
                    Some(config::NOTES_TEMPLATE.to_string())
                } else {
                    notes
                },
                priority,
            };
            match commit(&mut db, &state, Action::Update(job_id, patch))? {
                Some(_) => println!("Updated job {}", &job_id.simple().to_string()[..8]),
                None => println!("Nothing to change."),
            }
        }

        Commands::Task { command } => match command {
            TaskCommands::Add { id, text } => {
                let job_id = state.resolve(&id)?.id;
                match commit(&mut db, &state, Action::AddTask { id: job_id, text })? {
                    Some(next) => {
                        if let Some(task) = next.get(job_id).and_then(|j| j.tasks.last()) {
                            println!("Added task {}: {}", task.id, task.text);
                        }
                    }
                    None => println!("Task text cannot be empty."),
                }
            }

            TaskCommands::Toggle { id, task_id } => {
                let job_id = state.resolve(&id)?.id;
                let next = commit(&mut db, &state, Action::ToggleTask { id: job_id, task_id })?
                    .ok_or_else(|| anyhow!("Task {} not found", task_id))?;
                if let Some(task) = next
                    .get(job_id)
                    .and_then(|j| j.tasks.iter().find(|t| t.id == task_id))
                {
                    let done = if task.completed { "done" } else { "not done" };
                    println!("Task {} marked {}", task.id, done);
                }
            }
        },

        Commands::Delete { id } => {
            let job = state.resolve(&id)?;
            let (job_id, title) = (job.id, job.title.clone());
            commit(&mut db, &state, Action::Delete(job_id))?;
            println!("Deleted '{}'", title);
        }

        Commands::Clear { yes } => {
            if state.jobs.is_empty() {
                println!("No jobs to clear.");
            } else if yes || confirm(&format!("Delete all {} jobs?", state.jobs.len()))? {
                commit(&mut db, &state, Action::ClearAll)?;
                println!("All jobs deleted.");
            } else {
                println!("Cancelled.");
            }
        }

        Commands::Stats => {
            let stats = DerivedStats::compute(&state.jobs, state.weekly_goal, Utc::now());
            println!("Total:          {}", stats.total_jobs);
            println!("Interviewing:   {}", stats.interviewing_count);
            println!("Offers:         {}", stats.offers_count);
            println!("Rejected:       {}", stats.rejected_count);
            println!("Success rate:   {}%", stats.success_rate);
            println!("Pipeline value: ${}", stats.pipeline_value);
            println!();
            println!(
                "Weekly goal:    {} / {} ({}%)",
                stats.jobs_this_week, stats.weekly_goal, stats.goal_progress
            );
            if stats.goal_reached() {
                println!("                Weekly goal reached!");
            } else {
                println!("                {} more to go this week.", stats.remaining_this_week());
            }
            println!("Last 4 weeks:   {:?} (most recent first)", stats.weekly_history);
            println!("Follow-ups due: {}", stats.follow_up_count);
            println!("Gone quiet:     {}", stats.ghosted_count);
        }

        Commands::Goal { goal } => {
            commit(&mut db, &state, Action::SetWeeklyGoal(goal))?;
            println!("Weekly goal set to {}", goal);
        }

        Commands::Theme { theme } => {
            let action = match theme {
                Some(theme) => Action::SetTheme(theme),
                None => Action::ToggleTheme,
            };
            let theme = commit(&mut db, &state, action)?
                .map(|s| s.theme)
                .unwrap_or(state.theme);
            println!("Theme: {}", theme.as_str());
        }

        Commands::Backup { file } => {
            backup::write_backup(&file, &state.jobs)?;
            println!("Backed up {} job(s) to {}", state.jobs.len(), file.display());
        }

        Commands::Restore { file } => {
            let jobs = backup::read_backup(&file)
                .context("Restore failed; existing jobs left unchanged")?;
            let count = jobs.len();
            commit(&mut db, &state, Action::ReplaceAll(jobs))?;
            println!("Restored {} job(s) from {}", count, file.display());
        }

        Commands::ExportCsv { file } => {
            backup::export_csv(&file, &state.jobs)?;
            println!("Exported {} job(s) to {}", state.jobs.len(), file.display());
        }

        Commands::Share { file } => {
            let stats = DerivedStats::compute(&state.jobs, state.weekly_goal, Utc::now());
            share::export_card(&file, &stats)?;
            print!("{}", share::render_card(&stats));
            println!("Share card saved to {}", file.display());
        }

        Commands::Prep { id } => {
            let job = state.resolve(&id)?;
            let url = links::open_prep(&job.title)?;
            println!("Interview prep: {}", url);
        }

        Commands::Logo { id, output } => {
            let job = state.resolve(&id)?;
            let client = links::http_client()?;
            match links::fetch_logo(&client, &job.title) {
                Logo::Image(bytes) => {
                    let out = output
                        .unwrap_or_else(|| PathBuf::from(format!("{}-logo.png", job.short_id())));
                    std::fs::write(&out, bytes)
                        .with_context(|| format!("Failed to write to {}", out.display()))?;
                    println!("Logo saved to {}", out.display());
                }
                Logo::Badge(initial) => {
                    println!("No logo found for '{}'; using badge [{}]", job.title, initial);
                }
            }
        }

        Commands::Board { query } => {
            tui::run_board(&mut db, state, query.into())?;
        }
    }

    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Acme", 10), "Acme");
        assert_eq!(truncate("Acme Corporation International", 10), "Acme Co...");
        assert_eq!(truncate("Société Générale Paris", 8), "Socié...");
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-10-14").unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 14).unwrap()
        );
        assert!(parse_date("14/10/2026").is_err());
    }

    #[test]
    fn test_cli_parses_move() {
        let cli = Cli::try_parse_from(["tracker", "move", "abc123", "offered"]).unwrap();
        match cli.command {
            Commands::Move { id, status } => {
                assert_eq!(id, "abc123");
                assert_eq!(status, Status::Offered);
            }
            _ => panic!("expected move"),
        }
    }

    #[test]
    fn test_cli_edit_conflicts() {
        assert!(Cli::try_parse_from([
            "tracker", "edit", "abc", "--notes", "x", "--template-notes"
        ])
        .is_err());
    }

    #[test]
    fn test_commit_persists_only_accepted() {
        let mut db = Database::open_in_memory().unwrap();
        let state = db.load().unwrap();

        let none = commit(&mut db, &state, Action::Add { title: "  ".into(), date: None }).unwrap();
        assert!(none.is_none());
        assert!(db.load().unwrap().jobs.is_empty());

        let next = commit(&mut db, &state, Action::Add { title: "Acme".into(), date: None })
            .unwrap()
            .unwrap();
        assert_eq!(db.load().unwrap(), next);

        assert!(commit(&mut db, &next, Action::SetWeeklyGoal(0)).is_err());
        assert_eq!(db.load().unwrap().weekly_goal, 5);
    }
}
