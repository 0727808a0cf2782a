use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::dirs;
use super::types::HistoryEntry;

pub fn get_history_file_path() -> PathBuf {
    dirs::get_history_dir().join("history.jsonl")
}

/// Random identifier for one history entry, 16 hex characters.
pub fn generate_id() -> String {
    format!("{:016x}", fastrand::u64(..))
}

pub fn append_entry(entry: &HistoryEntry) -> Result<()> {
    let dir = dirs::get_history_dir();
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
    }
    append_entry_to(&get_history_file_path(), entry)
}

/// One JSON document per line, append-only.
pub fn append_entry_to(path: &Path, entry: &HistoryEntry) -> Result<()> {
    let json = serde_json::to_string(entry).context("failed to serialize history entry")?;
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("failed to open history file {}", path.display()))?;
    writeln!(file, "{}", json)?;
    Ok(())
}

pub fn load_entries() -> Result<Vec<HistoryEntry>> {
    load_entries_from(&get_history_file_path())
}

/// Corrupt lines are skipped rather than failing the whole read.
pub fn load_entries_from(path: &Path) -> Result<Vec<HistoryEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read history file {}", path.display()))?;
    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| serde_json::from_str(line).ok())
        .collect())
}

pub fn find_by_id(id: &str) -> Result<HistoryEntry> {
    find_by_id_in(&get_history_file_path(), id)
}

pub fn find_by_id_in(path: &Path, id: &str) -> Result<HistoryEntry> {
    load_entries_from(path)?
        .into_iter()
        .find(|entry| entry.id == id)
        .ok_or_else(|| anyhow!("history entry with ID '{}' not found", id))
}
