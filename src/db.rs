use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use crate::models::{JobApplication, Theme};
use crate::state::AppState;

const KEY_JOBS: &str = "jobs";
const KEY_WEEKLY_GOAL: &str = "weekly_goal";
const KEY_THEME: &str = "theme";

/// Durable string store with three independent keys.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open store at {}", path.display()))?;
        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            path: PathBuf::from(":memory:"),
        };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Failed to read key '{}'", key))
    }

    /// Reads the whole state. Missing keys fall back to defaults (first run);
    /// malformed values are an error so nothing gets overwritten by accident.
    pub fn load(&self) -> Result<AppState> {
        let mut state = AppState::default();

        if let Some(raw) = self.get(KEY_JOBS)? {
            state.jobs = serde_json::from_str::<Vec<JobApplication>>(&raw)
                .context("Stored job list is not valid JSON")?;
        }

        if let Some(raw) = self.get(KEY_WEEKLY_GOAL)? {
            let goal: u32 = raw
                .trim()
                .parse()
                .with_context(|| format!("Stored weekly goal '{}' is not a number", raw))?;
            state.weekly_goal = goal.max(1);
        }

        if let Some(raw) = self.get(KEY_THEME)? {
            state.theme = raw.parse::<Theme>().context("Stored theme is invalid")?;
        }

        log::debug!(
            "loaded {} job(s) from {}",
            state.jobs.len(),
            self.path.display()
        );
        Ok(state)
    }

    /// Writes all three keys in one transaction.
    pub fn save(&mut self, state: &AppState) -> Result<()> {
        let jobs = serde_json::to_string(&state.jobs)?;
        let goal = state.weekly_goal.to_string();
        let tx = self.conn.transaction()?;
        upsert(&tx, KEY_JOBS, &jobs)?;
        upsert(&tx, KEY_WEEKLY_GOAL, &goal)?;
        upsert(&tx, KEY_THEME, state.theme.as_str())?;
        tx.commit()?;
        log::debug!("saved {} job(s) to {}", state.jobs.len(), self.path.display());
        Ok(())
    }
}

fn upsert(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )?;
    Ok(())
}
