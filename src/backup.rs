use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

use crate::models::{validate_collection, JobApplication};

pub fn to_json(jobs: &[JobApplication]) -> Result<String> {
    serde_json::to_string_pretty(jobs).context("Failed to serialize jobs")
}

/// Parses a backup document and checks it is a well-formed job collection.
pub fn from_json(raw: &str) -> Result<Vec<JobApplication>> {
    let jobs: Vec<JobApplication> =
        serde_json::from_str(raw).context("Backup is not a valid job list")?;
    validate_collection(&jobs).context("Backup failed validation")?;
    Ok(jobs)
}

pub fn write_backup(path: &Path, jobs: &[JobApplication]) -> Result<()> {
    let json = to_json(jobs)?;
    fs::write(path, json).with_context(|| format!("Failed to write backup to {}", path.display()))
}

pub fn read_backup(path: &Path) -> Result<Vec<JobApplication>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read backup file: {}", path.display()))?;
    from_json(&raw)
}

const CSV_HEADER: &str = "Title,Status,Date,Notes\n";

/// Writes a bare `Title,Status,Date,Notes` header, then one row per record
/// with every field quoted and notes on one line.
pub fn write_csv<W: Write>(mut writer: W, jobs: &[JobApplication]) -> Result<()> {
    writer.write_all(CSV_HEADER.as_bytes())?;
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(writer);

    for job in jobs {
        let date = job.applied_date.format("%Y-%m-%d").to_string();
        let notes = flatten_newlines(&job.notes);
        wtr.write_record([
            job.title.as_str(),
            job.status.as_str(),
            date.as_str(),
            notes.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn export_csv(path: &Path, jobs: &[JobApplication]) -> Result<()> {
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(file, jobs)
}

fn flatten_newlines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
