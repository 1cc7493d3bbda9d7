use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::config::DEFAULT_WEEKLY_GOAL;
use crate::models::{validate_collection, JobApplication, JobPatch, JobTask, Status, Theme};

/// Everything the tracker persists: the records plus the two preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub jobs: Vec<JobApplication>,
    pub weekly_goal: u32,
    pub theme: Theme,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            jobs: Vec::new(),
            weekly_goal: DEFAULT_WEEKLY_GOAL,
            theme: Theme::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    Add { title: String, date: Option<NaiveDate> },
    Delete(Uuid),
    AdvanceStatus(Uuid),
    SetStatus(Uuid, Status),
    Update(Uuid, JobPatch),
    AddTask { id: Uuid, text: String },
    ToggleTask { id: Uuid, task_id: u32 },
    ClearAll,
    ReplaceAll(Vec<JobApplication>),
    SetWeeklyGoal(u32),
    SetTheme(Theme),
    ToggleTheme,
}

impl AppState {
    /// Applies one user action.
    ///
    /// `Ok(Some(state))` is an accepted mutation the host must persist,
    /// `Ok(None)` means nothing changed, and `Err` means the action was
    /// rejected. `self` is never modified.
    pub fn apply(&self, action: Action, now: DateTime<Utc>) -> Result<Option<AppState>> {
        log::debug!("applying {:?}", action);
        let today = now.date_naive();

        match action {
            Action::Add { title, date } => {
                if title.trim().is_empty() {
                    return Ok(None);
                }
                let job = JobApplication::new(&title, date.unwrap_or(today), now);
                let mut next = self.clone();
                next.jobs.insert(0, job);
                Ok(Some(next))
            }

            Action::Delete(id) => {
                if !self.jobs.iter().any(|j| j.id == id) {
                    return Ok(None);
                }
                let mut next = self.clone();
                next.jobs.retain(|j| j.id != id);
                Ok(Some(next))
            }

            Action::AdvanceStatus(id) => Ok(self.modify(id, now, |job| {
                let status = job.status.next();
                enter_status(job, status, today);
                true
            })),

            Action::SetStatus(id, status) => Ok(self.modify(id, now, |job| {
                if job.status == status {
                    return false;
                }
                enter_status(job, status, today);
                true
            })),

            Action::Update(id, patch) => {
                if let Some(title) = &patch.title {
                    if title.trim().is_empty() {
                        return Err(anyhow!("Title cannot be empty"));
                    }
                }
                if patch.is_empty() {
                    return Ok(None);
                }
                Ok(self.modify(id, now, |job| merge_patch(job, patch)))
            }

            Action::AddTask { id, text } => {
                let text = text.trim().to_string();
                if text.is_empty() {
                    return Ok(None);
                }
                Ok(self.modify(id, now, |job| {
                    let task_id = job.next_task_id();
                    job.tasks.push(JobTask {
                        id: task_id,
                        text,
                        completed: false,
                    });
                    true
                }))
            }

            Action::ToggleTask { id, task_id } => Ok(self.modify(id, now, |job| {
                match job.tasks.iter_mut().find(|t| t.id == task_id) {
                    Some(task) => {
                        task.completed = !task.completed;
                        true
                    }
                    None => false,
                }
            })),

            Action::ClearAll => {
                if self.jobs.is_empty() {
                    return Ok(None);
                }
                let mut next = self.clone();
                next.jobs.clear();
                Ok(Some(next))
            }

            Action::ReplaceAll(jobs) => {
                validate_collection(&jobs)?;
                let mut next = self.clone();
                next.jobs = jobs;
                Ok(Some(next))
            }

            Action::SetWeeklyGoal(goal) => {
                if goal == 0 {
                    return Err(anyhow!("Weekly goal must be at least 1"));
                }
                if goal == self.weekly_goal {
                    return Ok(None);
                }
                let mut next = self.clone();
                next.weekly_goal = goal;
                Ok(Some(next))
            }

            Action::SetTheme(theme) => {
                if theme == self.theme {
                    return Ok(None);
                }
                let mut next = self.clone();
                next.theme = theme;
                Ok(Some(next))
            }

            Action::ToggleTheme => {
                let mut next = self.clone();
                next.theme = self.theme.toggled();
                Ok(Some(next))
            }
        }
    }

    pub fn get(&self, id: Uuid) -> Option<&JobApplication> {
        self.jobs.iter().find(|j| j.id == id)
    }

    /// Looks a record up by full id or unique id prefix (dashes optional).
    pub fn resolve(&self, query: &str) -> Result<&JobApplication> {
        let needle: String = query
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| *c != '-')
            .collect();
        if needle.is_empty() {
            return Err(anyhow!("Empty job id"));
        }

        let mut matches = self
            .jobs
            .iter()
            .filter(|j| j.id.simple().to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(job), None) => Ok(job),
            (Some(_), Some(_)) => Err(anyhow!("Job id '{}' is ambiguous", query)),
            (None, _) => Err(anyhow!("Job '{}' not found", query)),
        }
    }

    // Clones the state, lets `f` edit the matching record and touches
    // `last_modified`. Returns None if the record is absent or `f` reports
    // no change.
    fn modify<F>(&self, id: Uuid, now: DateTime<Utc>, f: F) -> Option<AppState>
    where
        F: FnOnce(&mut JobApplication) -> bool,
    {
        let idx = self.jobs.iter().position(|j| j.id == id)?;
        let mut next = self.clone();
        let job = &mut next.jobs[idx];
        if !f(job) {
            return None;
        }
        job.last_modified = now;
        Some(next)
    }
}

fn enter_status(job: &mut JobApplication, status: Status, today: NaiveDate) {
    job.status = status;
    if status == Status::Interviewing && job.interview_date.is_none() {
        job.interview_date = Some(today);
    }
}

fn merge_patch(job: &mut JobApplication, patch: JobPatch) -> bool {
    let mut changed = false;

    if let Some(title) = patch.title {
        let title = title.trim().to_string();
        changed |= job.title != title;
        job.title = title;
    }
    if let Some(date) = patch.applied_date {
        changed |= job.applied_date != date;
        job.applied_date = date;
    }
    if let Some(salary) = patch.salary {
        changed |= job.salary != salary;
        job.salary = salary;
    }
    if let Some(interview_date) = patch.interview_date {
        changed |= job.interview_date != interview_date;
        job.interview_date = interview_date;
    }
    if let Some(notes) = patch.notes {
        changed |= job.notes != notes;
        job.notes = notes;
    }
    if let Some(priority) = patch.priority {
        changed |= job.priority != priority;
        job.priority = priority;
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 12, 0, 0).unwrap()
    }

    fn add(state: &AppState, title: &str) -> AppState {
        state
            .apply(Action::Add { title: title.into(), date: None }, now())
            .unwrap()
            .expect("add accepted")
    }

    #[test]
    fn test_add_counts_match_calls() {
        let mut state = AppState::default();
        for (i, title) in ["Acme", "Globex", "Initech"].iter().enumerate() {
            state = add(&state, title);
            assert_eq!(state.jobs.len(), i + 1);
        }
    }

    #[test]
    fn test_add_blank_title_is_noop() {
        let state = add(&AppState::default(), "Acme");
        for blank in ["", "   ", "\t\n"] {
            let result = state
                .apply(Action::Add { title: blank.into(), date: None }, now())
                .unwrap();
            assert!(result.is_none());
        }
        assert_eq!(state.jobs.len(), 1);
    }

    #[test]
    fn test_add_prepends_newest_first() {
        let state = add(&add(&AppState::default(), "First"), "Second");
        assert_eq!(state.jobs[0].title, "Second");
        assert_eq!(state.jobs[1].title, "First");
    }

    #[test]
    fn test_add_uses_given_date_or_today() {
        let date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
        let state = AppState::default()
            .apply(Action::Add { title: "Acme".into(), date: Some(date) }, now())
            .unwrap()
            .unwrap();
        assert_eq!(state.jobs[0].applied_date, date);

        let state = add(&AppState::default(), "Globex");
        assert_eq!(state.jobs[0].applied_date, now().date_naive());
    }

    #[test]
    fn test_acme_scenario() {
        let state = add(&AppState::default(), "Acme Corp");
        assert_eq!(state.jobs.len(), 1);
        assert_eq!(state.jobs[0].status, Status::Applied);

        let id = state.jobs[0].id;
        let mut state = state.apply(Action::AdvanceStatus(id), now()).unwrap().unwrap();
        assert_eq!(state.jobs[0].status, Status::Interviewing);

        for _ in 0..3 {
            state = state.apply(Action::AdvanceStatus(id), now()).unwrap().unwrap();
        }
        assert_eq!(state.jobs[0].status, Status::Applied);
    }

    #[test]
    fn test_advance_touches_last_modified_and_sets_interview_date() {
        let state = add(&AppState::default(), "Acme");
        let id = state.jobs[0].id;
        let later = now() + Duration::hours(3);
        let state = state.apply(Action::AdvanceStatus(id), later).unwrap().unwrap();
        assert_eq!(state.jobs[0].last_modified, later);
        assert_eq!(state.jobs[0].interview_date, Some(later.date_naive()));
    }

    #[test]
    fn test_interview_date_not_overwritten() {
        let state = add(&AppState::default(), "Acme");
        let id = state.jobs[0].id;
        let fixed = NaiveDate::from_ymd_opt(2026, 11, 2).unwrap();
        let patch = JobPatch { interview_date: Some(Some(fixed)), ..Default::default() };
        let state = state.apply(Action::Update(id, patch), now()).unwrap().unwrap();
        let state = state
            .apply(Action::SetStatus(id, Status::Interviewing), now())
            .unwrap()
            .unwrap();
        assert_eq!(state.jobs[0].interview_date, Some(fixed));
    }

    #[test]
    fn test_unknown_id_is_noop() {
        let state = add(&AppState::default(), "Acme");
        let ghost = Uuid::new_v4();
        assert!(state.apply(Action::Delete(ghost), now()).unwrap().is_none());
        assert!(state.apply(Action::AdvanceStatus(ghost), now()).unwrap().is_none());
        assert!(state
            .apply(Action::SetStatus(ghost, Status::Offered), now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_set_status_same_value_is_noop() {
        let state = add(&AppState::default(), "Acme");
        let id = state.jobs[0].id;
        assert!(state
            .apply(Action::SetStatus(id, Status::Applied), now())
            .unwrap()
            .is_none());
        let moved = state
            .apply(Action::SetStatus(id, Status::Offered), now())
            .unwrap()
            .unwrap();
        assert_eq!(moved.jobs[0].status, Status::Offered);
    }

    #[test]
    fn test_delete_removes_only_match() {
        let state = add(&add(&AppState::default(), "Acme"), "Globex");
        let id = state.jobs[0].id;
        let state = state.apply(Action::Delete(id), now()).unwrap().unwrap();
        assert_eq!(state.jobs.len(), 1);
        assert_eq!(state.jobs[0].title, "Acme");
    }

    #[test]
    fn test_update_merges_fields() {
        let state = add(&AppState::default(), "Acme");
        let id = state.jobs[0].id;
        let patch = JobPatch {
            salary: Some(95_000),
            notes: Some("Recruiter: Dana".into()),
            priority: Some(true),
            ..Default::default()
        };
        let state = state.apply(Action::Update(id, patch.clone()), now()).unwrap().unwrap();
        let job = &state.jobs[0];
        assert_eq!(job.salary, 95_000);
        assert_eq!(job.notes, "Recruiter: Dana");
        assert!(job.priority);
        assert_eq!(job.title, "Acme");

        // Same patch again changes nothing.
        assert!(state.apply(Action::Update(id, patch), now()).unwrap().is_none());
    }

    #[test]
    fn test_update_rejects_blank_title() {
        let state = add(&AppState::default(), "Acme");
        let id = state.jobs[0].id;
        let patch = JobPatch { title: Some("  ".into()), ..Default::default() };
        assert!(state.apply(Action::Update(id, patch), now()).is_err());
        assert_eq!(state.jobs[0].title, "Acme");
    }

    #[test]
    fn test_tasks_append_and_toggle() {
        let state = add(&AppState::default(), "Acme");
        let id = state.jobs[0].id;
        let state = state
            .apply(Action::AddTask { id, text: "Send thank-you".into() }, now())
            .unwrap()
            .unwrap();
        let state = state
            .apply(Action::AddTask { id, text: "Prep system design".into() }, now())
            .unwrap()
            .unwrap();
        assert_eq!(state.jobs[0].tasks.len(), 2);
        assert_eq!(state.jobs[0].tasks[1].id, 2);

        let state = state
            .apply(Action::ToggleTask { id, task_id: 2 }, now())
            .unwrap()
            .unwrap();
        assert!(state.jobs[0].tasks[1].completed);
        assert!(!state.jobs[0].tasks[0].completed);

        assert!(state
            .apply(Action::ToggleTask { id, task_id: 9 }, now())
            .unwrap()
            .is_none());
        assert!(state
            .apply(Action::AddTask { id, text: " ".into() }, now())
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_clear_all() {
        let state = add(&add(&AppState::default(), "Acme"), "Globex");
        let state = state.apply(Action::ClearAll, now()).unwrap().unwrap();
        assert!(state.jobs.is_empty());
        assert!(state.apply(Action::ClearAll, now()).unwrap().is_none());
    }

    #[test]
    fn test_replace_all_rejects_invalid_input() {
        let state = add(&AppState::default(), "Acme");
        let dup = state.jobs[0].clone();
        let result = state.apply(Action::ReplaceAll(vec![dup.clone(), dup]), now());
        assert!(result.is_err());
        assert_eq!(state.jobs.len(), 1);

        let other = add(&AppState::default(), "Globex").jobs;
        let replaced = state.apply(Action::ReplaceAll(other.clone()), now()).unwrap().unwrap();
        assert_eq!(replaced.jobs, other);
    }

    #[test]
    fn test_weekly_goal_validation() {
        let state = AppState::default();
        assert!(state.apply(Action::SetWeeklyGoal(0), now()).is_err());
        assert!(state.apply(Action::SetWeeklyGoal(5), now()).unwrap().is_none());
        let next = state.apply(Action::SetWeeklyGoal(8), now()).unwrap().unwrap();
        assert_eq!(next.weekly_goal, 8);
    }

    #[test]
    fn test_theme_actions() {
        let state = AppState::default();
        let dark = state.apply(Action::ToggleTheme, now()).unwrap().unwrap();
        assert_eq!(dark.theme, Theme::Dark);
        assert!(dark.apply(Action::SetTheme(Theme::Dark), now()).unwrap().is_none());
    }

    #[test]
    fn test_resolve_by_prefix() {
        let state = add(&add(&AppState::default(), "Acme"), "Globex");
        let target = &state.jobs[1];
        let full = target.id.to_string();
        assert_eq!(state.resolve(&full).unwrap().id, target.id);
        assert_eq!(state.resolve(&target.short_id()).unwrap().id, target.id);
        assert_eq!(
            state.resolve(&target.short_id().to_uppercase()).unwrap().id,
            target.id
        );
        assert!(state.resolve("").is_err());
        assert!(state.resolve("zzzz").is_err());
    }
}
