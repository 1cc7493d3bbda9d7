use crate::models::{JobApplication, Status};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(Status),
}

impl StatusFilter {
    fn matches(self, status: Status) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(s) => s == status,
        }
    }
}

impl From<Option<Status>> for StatusFilter {
    fn from(status: Option<Status>) -> Self {
        status.map_or(StatusFilter::All, StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    pub status: StatusFilter,
    pub title: String,
    pub notes: String,
}

impl ViewQuery {
    pub fn matches(&self, job: &JobApplication) -> bool {
        self.status.matches(job.status)
            && contains_ci(&job.title, &self.title)
            && contains_ci(&job.notes, &self.notes)
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Records matching `query`, priority-flagged first, otherwise in collection order.
pub fn filtered_view<'a>(jobs: &'a [JobApplication], query: &ViewQuery) -> Vec<&'a JobApplication> {
    let mut view: Vec<&JobApplication> = jobs.iter().filter(|j| query.matches(j)).collect();
    // sort_by_key is stable
    view.sort_by_key(|j| !j.priority);
    view
}

/// Splits a view into the four board columns, in `Status::ALL` order.
pub fn board_columns<'a>(view: &[&'a JobApplication]) -> [Vec<&'a JobApplication>; 4] {
    let mut columns: [Vec<&JobApplication>; 4] = Default::default();
    for &job in view {
        columns[job.status.index()].push(job);
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn job(title: &str, status: Status, notes: &str, priority: bool) -> JobApplication {
        let date = NaiveDate::from_ymd_opt(2026, 10, 1).unwrap();
        let mut j = JobApplication::new(title, date, Utc::now());
        j.status = status;
        j.notes = notes.to_string();
        j.priority = priority;
        j
    }

    fn sample() -> Vec<JobApplication> {
        vec![
            job("Acme Corp", Status::Applied, "remote friendly", false),
            job("Globex", Status::Interviewing, "Onsite with CTO", true),
            job("Acme Labs", Status::Rejected, "", false),
            job("Initech", Status::Applied, "REMOTE only", true),
        ]
    }

    fn titles(view: &[&JobApplication]) -> Vec<String> {
        view.iter().map(|j| j.title.clone()).collect()
    }

    #[test]
    fn test_empty_query_keeps_all_priority_first() {
        let jobs = sample();
        let view = filtered_view(&jobs, &ViewQuery::default());
        assert_eq!(titles(&view), vec!["Globex", "Initech", "Acme Corp", "Acme Labs"]);
    }

    #[test]
    fn test_status_filter() {
        let jobs = sample();
        let query = ViewQuery {
            status: StatusFilter::Only(Status::Applied),
            ..Default::default()
        };
        let view = filtered_view(&jobs, &query);
        assert_eq!(titles(&view), vec!["Initech", "Acme Corp"]);
    }

    #[test]
    fn test_title_and_notes_queries_case_insensitive() {
        let jobs = sample();
        let query = ViewQuery {
            title: "acme".into(),
            ..Default::default()
        };
        assert_eq!(titles(&filtered_view(&jobs, &query)), vec!["Acme Corp", "Acme Labs"]);

        let query = ViewQuery {
            notes: "remote".into(),
            ..Default::default()
        };
        assert_eq!(titles(&filtered_view(&jobs, &query)), vec!["Initech", "Acme Corp"]);

        let query = ViewQuery {
            title: "acme".into(),
            notes: "remote".into(),
            status: StatusFilter::All,
        };
        assert_eq!(titles(&filtered_view(&jobs, &query)), vec!["Acme Corp"]);
    }

    #[test]
    fn test_board_columns_partition() {
        let jobs = sample();
        let view = filtered_view(&jobs, &ViewQuery::default());
        let columns = board_columns(&view);
        assert_eq!(columns[0].len(), 2);
        assert_eq!(columns[1].len(), 1);
        assert_eq!(columns[2].len(), 0);
        assert_eq!(columns[3].len(), 1);
        assert_eq!(columns[0][0].title, "Initech");
    }

    #[test]
    fn test_status_filter_from_option() {
        assert_eq!(StatusFilter::from(None), StatusFilter::All);
        assert_eq!(
            StatusFilter::from(Some(Status::Offered)),
            StatusFilter::Only(Status::Offered)
        );
    }
}
