// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! History management for undo support

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::organizer::{Step, VaultStore};
use crate::{NotewiseError, Result};

/// One applied organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// Vault-relative path before organizing
    pub original_path: String,
    /// Vault-relative path afterwards
    pub new_path: String,
    pub steps: Vec<Step>,
    /// Set when the run stopped early
    #[serde(default)]
    pub error: Option<String>,
    pub content_hash: String,
    pub undone: bool,
}

impl HistoryEntry {
    /// Whether the note changed location
    pub fn relocated(&self) -> bool {
        self.original_path != self.new_path
    }
}

/// History manager for tracking organizations
pub struct History {
    path: PathBuf,
}

impl History {
    /// Create a new history manager
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append an entry to the history
    pub fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let json = serde_json::to_string(entry)?;
        writeln!(file, "{}", json)?;

        Ok(())
    }

    /// Read all history entries
    pub fn read_all(&self) -> Result<Vec<HistoryEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);

        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    warn!("Failed to parse history entry: {}", e);
                }
            }
        }

        Ok(entries)
    }

    /// Get the most recent N entries (newest first)
    pub fn get_recent(&self, count: usize) -> Result<Vec<HistoryEntry>> {
        let mut entries = self.read_all()?;
        entries.reverse();
        entries.truncate(count);
        Ok(entries)
    }

    /// Mark an entry as undone
    pub fn mark_undone(&self, id: &str) -> Result<()> {
        let entries = self.read_all()?;

        let file = File::create(&self.path)?;
        let mut writer = std::io::BufWriter::new(file);

        for mut entry in entries {
            if entry.id == id {
                entry.undone = true;
            }
            let json = serde_json::to_string(&entry)?;
            writeln!(writer, "{}", json)?;
        }

        Ok(())
    }

    /// Entries that moved a note and have not been undone, oldest first
    pub fn get_undoable(&self) -> Result<Vec<HistoryEntry>> {
        let entries = self.read_all()?;
        Ok(entries
            .into_iter()
            .filter(|e| !e.undone && e.relocated())
            .collect())
    }

    /// Clear all history
    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }

    /// Get history file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Create a new history entry
pub fn create_entry(
    original_path: &str,
    new_path: &str,
    steps: Vec<Step>,
    error: Option<String>,
    content: &str,
) -> HistoryEntry {
    HistoryEntry {
        id: uuid::Uuid::new_v4().to_string(),
        timestamp: Utc::now(),
        original_path: original_path.to_string(),
        new_path: new_path.to_string(),
        steps,
        error,
        content_hash: blake3::hash(content.as_bytes()).to_hex().to_string(),
        undone: false,
    }
}

/// Move a note back to where an entry found it.
///
/// Tags added by the entry are left in place.
pub async fn undo_entry<S: VaultStore + ?Sized>(
    store: &S,
    history: &History,
    entry: &HistoryEntry,
) -> Result<()> {
    if store.lookup(&entry.new_path).await?.is_none() {
        return Err(NotewiseError::NotFound(entry.new_path.clone()));
    }

    store.rename(&entry.new_path, &entry.original_path).await?;
    history.mark_undone(&entry.id)?;
    info!("Undone: {} -> {}", entry.new_path, entry.original_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::MemoryVault;
    use tempfile::TempDir;

    fn moved(from: &str, to: &str) -> HistoryEntry {
        create_entry(
            from,
            to,
            vec![Step::Moved { from: from.to_string(), to: to.to_string() }],
            None,
            "body",
        )
    }

    #[test]
    fn test_append_and_read() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("h.jsonl"));

        history.append(&moved("a.md", "X/a.md")).unwrap();
        history
            .append(&create_entry("b.md", "b.md", vec![Step::TagsMerged { added: vec!["t".into()] }], None, "b"))
            .unwrap();

        assert_eq!(history.read_all().unwrap().len(), 2);
        assert_eq!(history.get_recent(1).unwrap()[0].original_path, "b.md");
        assert_eq!(history.get_undoable().unwrap().len(), 1);
    }

    #[test]
    fn test_mark_undone_and_clear() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("h.jsonl"));
        let entry = moved("a.md", "X/a.md");
        history.append(&entry).unwrap();

        history.mark_undone(&entry.id).unwrap();
        assert!(history.read_all().unwrap()[0].undone);
        assert!(history.get_undoable().unwrap().is_empty());

        history.clear().unwrap();
        assert!(history.read_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_undo_entry_restores_location() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("h.jsonl"));
        let vault = MemoryVault::new();
        vault.add_folder("X");
        vault.add_document("X/a.md", "body");

        let entry = moved("a.md", "X/a.md");
        history.append(&entry).unwrap();

        undo_entry(&vault, &history, &entry).await.unwrap();
        assert_eq!(vault.content("a.md").as_deref(), Some("body"));
        assert!(history.read_all().unwrap()[0].undone);
    }

    #[tokio::test]
    async fn test_undo_refuses_occupied_original() {
        let dir = TempDir::new().unwrap();
        let history = History::new(dir.path().join("h.jsonl"));
        let vault = MemoryVault::new();
        vault.add_document("X/a.md", "moved");
        vault.add_document("a.md", "newcomer");

        let entry = moved("a.md", "X/a.md");
        let err = undo_entry(&vault, &history, &entry).await.unwrap_err();
        assert!(matches!(err, NotewiseError::NameCollision { .. }));
        assert_eq!(vault.content("a.md").as_deref(), Some("newcomer"));
    }
}
