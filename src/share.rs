use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::stats::DerivedStats;

const CARD_WIDTH: usize = 34;

pub fn render_card(stats: &DerivedStats) -> String {
    let rows = [
        ("Applications", stats.total_jobs.to_string()),
        ("Interviews", stats.interviewing_count.to_string()),
        ("Offers", stats.offers_count.to_string()),
        ("Success rate", format!("{}%", stats.success_rate)),
        (
            "This week",
            format!("{} / {}", stats.jobs_this_week, stats.weekly_goal),
        ),
    ];

    let inner = CARD_WIDTH - 2;
    let border = format!("+{}+", "-".repeat(inner));
    let mut card = String::new();
    card.push_str(&border);
    card.push('\n');
    card.push_str(&format!("|{:^inner$}|\n", "MY JOB HUNT"));
    card.push_str(&border);
    card.push('\n');
    for (label, value) in rows {
        let pad = inner.saturating_sub(label.len() + value.len() + 2);
        card.push_str(&format!("| {}{}{} |\n", label, " ".repeat(pad), value));
    }
    card.push_str(&border);
    card.push('\n');
    card
}

/// Writes the card to `path` through a sibling temp file so a failed export
/// never leaves a partial file behind.
pub fn export_card(path: &Path, stats: &DerivedStats) -> Result<()> {
    let tmp = temp_path(path)?;
    let card = render_card(stats);

    let result = fs::write(&tmp, card)
        .and_then(|_| fs::rename(&tmp, path))
        .with_context(|| format!("Failed to export share card to {}", path.display()));

    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    result
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| anyhow!("Share card path has no file name: {}", path.display()))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}
