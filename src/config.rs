use anyhow::Result;
use std::path::PathBuf;

pub const DEFAULT_WEEKLY_GOAL: u32 = 5;

// Applied records older than this need a follow-up.
pub const FOLLOW_UP_DAYS: i64 = 14;

// Untouched for this long and not rejected counts as ghosted.
pub const GHOSTED_DAYS: i64 = 7;

pub const BENCHMARK_LOW: u64 = 60_000;
pub const BENCHMARK_HIGH: u64 = 120_000;

pub const NOTES_TEMPLATE: &str = "Contact:\n\
Role summary:\n\
Interview rounds:\n\
Questions to ask:\n\
Follow-up:";

pub const SEARCH_URL: &str = "https://www.google.com/search";
pub const LOGO_SERVICE: &str = "https://logo.clearbit.com";

pub const DB_ENV: &str = "TRACKER_DB";

/// Resolves the store location: explicit path (flag or `TRACKER_DB`) first,
/// then the XDG data directory, then the current directory.
pub fn db_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "tracker") {
        Ok(proj_dirs.data_dir().join("tracker.db"))
    } else {
        Ok(PathBuf::from("tracker.db"))
    }
}
