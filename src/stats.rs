use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::config::{BENCHMARK_HIGH, BENCHMARK_LOW, FOLLOW_UP_DAYS, GHOSTED_DAYS};
use crate::models::{JobApplication, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedStats {
    pub total_jobs: usize,
    pub interviewing_count: usize,
    pub offers_count: usize,
    pub rejected_count: usize,
    pub success_rate: u32,
    pub pipeline_value: u64,
    pub jobs_this_week: usize,
    pub weekly_goal: u32,
    pub goal_progress: u32,
    /// Most recent week first.
    pub weekly_history: [usize; 4],
    pub follow_up_count: usize,
    pub ghosted_count: usize,
}

impl DerivedStats {
    pub fn compute(jobs: &[JobApplication], weekly_goal: u32, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let count = |status: Status| jobs.iter().filter(|j| j.status == status).count();

        let total_jobs = jobs.len();
        let interviewing_count = count(Status::Interviewing);
        let offers_count = count(Status::Offered);
        let rejected_count = count(Status::Rejected);

        let pipeline_value = jobs
            .iter()
            .filter(|j| j.status != Status::Rejected)
            .fold(0u64, |acc, j| acc.saturating_add(j.salary));

        let week_ago = today - Duration::days(7);
        let jobs_this_week = jobs
            .iter()
            .filter(|j| j.applied_date >= week_ago && j.applied_date <= today)
            .count();

        let weekly_goal = weekly_goal.max(1);
        let goal_progress = percent(jobs_this_week, weekly_goal as usize).min(100);

        Self {
            total_jobs,
            interviewing_count,
            offers_count,
            rejected_count,
            success_rate: percent(interviewing_count + offers_count, total_jobs),
            pipeline_value,
            jobs_this_week,
            weekly_goal,
            goal_progress,
            weekly_history: weekly_history(jobs, today),
            follow_up_count: jobs.iter().filter(|j| needs_follow_up(j, now)).count(),
            ghosted_count: jobs.iter().filter(|j| is_ghosted(j, now)).count(),
        }
    }

    pub fn goal_reached(&self) -> bool {
        self.goal_progress >= 100
    }

    pub fn remaining_this_week(&self) -> usize {
        (self.weekly_goal as usize).saturating_sub(self.jobs_this_week)
    }
}

// round(100 * part / whole), 0 for an empty whole.
fn percent(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as u32
}

fn weekly_history(jobs: &[JobApplication], today: NaiveDate) -> [usize; 4] {
    let mut buckets = [0usize; 4];
    for (i, bucket) in buckets.iter_mut().enumerate() {
        let end = today - Duration::days(7 * i as i64);
        let start = end - Duration::days(7);
        *bucket = jobs
            .iter()
            .filter(|j| j.applied_date > start && j.applied_date <= end)
            .count();
    }
    buckets
}

pub fn needs_follow_up(job: &JobApplication, now: DateTime<Utc>) -> bool {
    job.status == Status::Applied
        && (now.date_naive() - job.applied_date).num_days() > FOLLOW_UP_DAYS
}

pub fn is_ghosted(job: &JobApplication, now: DateTime<Utc>) -> bool {
    job.status != Status::Rejected && now - job.last_modified > Duration::days(GHOSTED_DAYS)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalaryBenchmark {
    Unset,
    BelowMarket,
    Market,
    AboveMarket,
}

impl SalaryBenchmark {
    pub fn label(self) -> &'static str {
        match self {
            SalaryBenchmark::Unset => "-",
            SalaryBenchmark::BelowMarket => "below market",
            SalaryBenchmark::Market => "market",
            SalaryBenchmark::AboveMarket => "above market",
        }
    }
}

pub fn salary_benchmark(salary: u64) -> SalaryBenchmark {
    match salary {
        0 => SalaryBenchmark::Unset,
        s if s < BENCHMARK_LOW => SalaryBenchmark::BelowMarket,
        s if s < BENCHMARK_HIGH => SalaryBenchmark::Market,
        _ => SalaryBenchmark::AboveMarket,
    }
}
