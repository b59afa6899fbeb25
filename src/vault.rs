// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Vault stores: a directory tree of Markdown notes on disk, and an
//! in-memory copy used for dry runs and tests

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::organizer::{DocumentRef, Node, VaultStore, NOTE_EXTENSION};
use crate::tags::{existing_tags, frontmatter_tags};
use crate::{NotewiseError, Result};

/// Vault backed by a directory on disk
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(NotewiseError::Config(format!(
                "Vault directory not found: {:?}",
                root
            )));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path for a vault-relative one
    pub fn resolve(&self, rel: &str) -> PathBuf {
        rel.split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |acc, s| acc.join(s))
    }

    /// Vault-relative path for a filesystem path, if it lies inside the vault
    pub fn relative(&self, path: &Path) -> Option<String> {
        let root = self.root.canonicalize().ok()?;
        let path = path.canonicalize().ok()?;
        let rel = path.strip_prefix(&root).ok()?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// Reference to an existing note
    pub fn document(&self, rel: &str) -> Result<DocumentRef> {
        if !self.resolve(rel).is_file() {
            return Err(NotewiseError::NotFound(rel.to_string()));
        }
        Ok(DocumentRef::from_path(rel))
    }

    /// All folders below the root, sorted. Hidden folders are skipped.
    pub fn scan_folders(&self) -> Vec<String> {
        let mut folders: Vec<String> = self
            .walk()
            .filter(|e| e.file_type().is_dir())
            .filter_map(|e| self.relative_to_root(e.path()))
            .collect();
        folders.sort();
        folders
    }

    /// Paths of all Markdown notes, sorted
    pub fn scan_notes(&self) -> Vec<String> {
        let mut notes: Vec<String> = self
            .walk()
            .filter(|e| e.file_type().is_file() && is_note(e.path()))
            .filter_map(|e| self.relative_to_root(e.path()))
            .collect();
        notes.sort();
        notes
    }

    /// Every tag used across the vault, sorted
    pub fn scan_tags(&self) -> Vec<String> {
        let mut tags = BTreeSet::new();
        for note in self.scan_notes() {
            match std::fs::read_to_string(self.resolve(&note)) {
                Ok(content) => tags.extend(existing_tags(&content)),
                Err(e) => warn!("Failed to read {}: {}", note, e),
            }
        }
        tags.into_iter().collect()
    }

    fn walk(&self) -> impl Iterator<Item = walkdir::DirEntry> {
        WalkDir::new(&self.root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|e| match e {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    None
                }
            })
    }

    fn relative_to_root(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        Some(
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
        )
    }

    /// On-disk spelling of an existing entry's name.
    ///
    /// Differs from the requested name only on case-insensitive filesystems.
    async fn actual_name(&self, rel: &str) -> Result<String> {
        let (parent, name) = match rel.rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", rel),
        };

        let mut entries = tokio::fs::read_dir(self.resolve(parent)).await?;
        let mut folded = None;
        while let Some(entry) = entries.next_entry().await? {
            let entry_name = entry.file_name().to_string_lossy().into_owned();
            if entry_name == name {
                return Ok(rel.to_string());
            }
            if folded.is_none() && entry_name.to_lowercase() == name.to_lowercase() {
                folded = Some(entry_name);
            }
        }

        Ok(match folded {
            Some(actual) if parent.is_empty() => actual,
            Some(actual) => format!("{}/{}", parent, actual),
            None => rel.to_string(),
        })
    }
}

#[async_trait]
impl VaultStore for FsVault {
    async fn lookup(&self, path: &str) -> Result<Option<Node>> {
        let rel = path.trim_matches('/');
        let metadata = match tokio::fs::metadata(self.resolve(rel)).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if rel.is_empty() {
            return Ok(Some(Node::Folder { path: String::new() }));
        }

        let actual = self.actual_name(rel).await?;
        Ok(Some(if metadata.is_dir() {
            Node::Folder { path: actual }
        } else {
            Node::Document { path: actual }
        }))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        match self.lookup(to).await? {
            Some(Node::Document { path }) if path == from => {}
            Some(_) => return Err(NotewiseError::NameCollision { path: to.to_string() }),
            None => {}
        }
        tokio::fs::rename(self.resolve(from), self.resolve(to)).await?;
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        Ok(tokio::fs::read_to_string(self.resolve(path)).await?)
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        tokio::fs::write(self.resolve(path), content).await?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Folder,
    Document(String),
}

/// Vault held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryVault {
    entries: Mutex<BTreeMap<String, Entry>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of an on-disk vault's folders and notes
    pub fn snapshot(vault: &FsVault) -> Result<Self> {
        let memory = Self::new();
        for folder in vault.scan_folders() {
            memory.add_folder(&folder);
        }
        for note in vault.scan_notes() {
            let content = std::fs::read_to_string(vault.resolve(&note))?;
            memory.add_document(&note, &content);
        }
        Ok(memory)
    }

    pub fn add_folder(&self, path: &str) {
        self.lock().insert(path.trim_matches('/').to_string(), Entry::Folder);
    }

    pub fn add_document(&self, path: &str, content: &str) {
        self.lock().insert(
            path.trim_matches('/').to_string(),
            Entry::Document(content.to_string()),
        );
    }

    /// Content of a note, `None` if there is no note at `path`
    pub fn content(&self, path: &str) -> Option<String> {
        match self.lock().get(path) {
            Some(Entry::Document(content)) => Some(content.clone()),
            _ => None,
        }
    }

    /// Front-matter tags of a note
    pub fn tags_of(&self, path: &str) -> Vec<String> {
        self.content(path)
            .map(|c| frontmatter_tags(&c))
            .unwrap_or_default()
    }

    /// Front-matter and inline tags of a note
    pub fn existing_tags(&self, path: &str) -> Vec<String> {
        self.content(path)
            .map(|c| existing_tags(&c))
            .unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl VaultStore for MemoryVault {
    async fn lookup(&self, path: &str) -> Result<Option<Node>> {
        let rel = path.trim_matches('/');
        if rel.is_empty() {
            return Ok(Some(Node::Folder { path: String::new() }));
        }
        Ok(self.lock().get(rel).map(|entry| match entry {
            Entry::Folder => Node::Folder { path: rel.to_string() },
            Entry::Document(_) => Node::Document { path: rel.to_string() },
        }))
    }

    async fn rename(&self, from: &str, to: &str) -> Result<()> {
        let mut entries = self.lock();
        if from != to && entries.contains_key(to) {
            return Err(NotewiseError::NameCollision { path: to.to_string() });
        }
        let entry = entries
            .remove(from)
            .ok_or_else(|| NotewiseError::NotFound(from.to_string()))?;
        entries.insert(to.to_string(), entry);
        Ok(())
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.content(path)
            .ok_or_else(|| NotewiseError::NotFound(path.to_string()))
    }

    async fn write(&self, path: &str, content: &str) -> Result<()> {
        let mut entries = self.lock();
        match entries.get_mut(path) {
            Some(Entry::Document(existing)) => {
                *existing = content.to_string();
                Ok(())
            }
            _ => Err(NotewiseError::NotFound(path.to_string())),
        }
    }
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_note(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(NOTE_EXTENSION))
}
