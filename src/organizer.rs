// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Applying an organization proposal to a note
//!
//! A proposal is applied in three ordered steps: rename to the proposed
//! title, move into the proposed folder, merge the proposed tags. A step
//! with nothing to do is skipped. The first failing step stops the run;
//! completed steps stay applied and are reported in the outcome.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::tags::{normalize_tag, set_frontmatter_tags};
use crate::{NotewiseError, Result};

/// Extension given to renamed notes
pub const NOTE_EXTENSION: &str = "md";

/// Titles treated as placeholders by `preserve_custom_titles`
const GENERIC_TITLES: &[&str] = &["untitled", "new note", "note", "无标题", "新建笔记"];

/// A model's suggestion for a note
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationProposal {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl OrganizationProposal {
    /// Build a proposal from untrusted JSON.
    ///
    /// Missing and `null` fields are empty; any other non-string title/path
    /// or a `tags` value that is not a list of strings is rejected.
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        let obj = value.as_object().ok_or_else(|| {
            NotewiseError::MalformedProposal("expected a JSON object".to_string())
        })?;

        let text_field = |key: &str| -> Result<String> {
            match obj.get(key) {
                None | Some(serde_json::Value::Null) => Ok(String::new()),
                Some(serde_json::Value::String(s)) => Ok(s.clone()),
                Some(other) => Err(NotewiseError::MalformedProposal(format!(
                    "field '{}' must be a string, got {}",
                    key, other
                ))),
            }
        };

        let tags = match obj.get("tags") {
            None | Some(serde_json::Value::Null) => Vec::new(),
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str().map(String::from).ok_or_else(|| {
                        NotewiseError::MalformedProposal(format!(
                            "tags must be strings, got {}",
                            item
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(NotewiseError::MalformedProposal(format!(
                    "tags must be a list, got {}",
                    other
                )))
            }
        };

        let proposal = Self {
            title: text_field("title")?,
            path: text_field("path")?,
            tags,
        };
        proposal.validate()?;
        Ok(proposal)
    }

    /// Structural checks that do not need the store
    pub fn validate(&self) -> Result<()> {
        let target = normalize_folder(&self.path);
        if target
            .split('/')
            .any(|segment| segment == ".." || segment == ".")
        {
            return Err(NotewiseError::MalformedProposal(format!(
                "path '{}' contains relative segments",
                self.path
            )));
        }
        Ok(())
    }
}

/// A note as currently placed in the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Vault-relative path including extension
    pub path: String,
    /// File name without extension
    pub basename: String,
    /// Parent folder, empty for the vault root
    pub parent: String,
}

impl DocumentRef {
    pub fn from_path(path: &str) -> Self {
        let path = path.trim_matches('/').to_string();
        let (parent, file_name) = match path.rsplit_once('/') {
            Some((parent, name)) => (parent.to_string(), name.to_string()),
            None => (String::new(), path.clone()),
        };
        let basename = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => file_name,
        };
        Self { path, basename, parent }
    }

    /// File name including extension
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// What occupies a path in the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Folder { path: String },
    Document { path: String },
}

/// The store a proposal is applied to
#[async_trait]
pub trait VaultStore: Send + Sync {
    /// Look up whatever lives at a vault-relative path
    async fn lookup(&self, path: &str) -> Result<Option<Node>>;

    /// Move a document; must not overwrite an existing entry
    async fn rename(&self, from: &str, to: &str) -> Result<()>;

    async fn read(&self, path: &str) -> Result<String>;

    async fn write(&self, path: &str, content: &str) -> Result<()>;

    /// Persist a note's full tag set
    async fn write_tags(&self, path: &str, tags: &[String]) -> Result<()> {
        let content = self.read(path).await?;
        self.write(path, &set_frontmatter_tags(&content, tags)).await
    }
}

/// One executed mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    Renamed { from: String, to: String },
    Moved { from: String, to: String },
    TagsMerged { added: Vec<String> },
}

/// Result of applying a proposal
#[derive(Debug)]
pub struct OrganizationOutcome {
    /// Where the note ended up
    pub document: DocumentRef,
    /// Steps that completed, in order
    pub steps: Vec<Step>,
    /// The error that stopped the run, if any
    pub failure: Option<NotewiseError>,
}

impl OrganizationOutcome {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<(DocumentRef, Vec<Step>)> {
        match self.failure {
            Some(e) => Err(e),
            None => Ok((self.document, self.steps)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApplyOptions {
    /// Only rename notes whose current title looks like a placeholder
    pub preserve_custom_titles: bool,
}

/// Applies proposals to a [`VaultStore`]
#[derive(Debug, Clone, Default)]
pub struct OrganizationApplier {
    options: ApplyOptions,
}

impl OrganizationApplier {
    pub fn new(options: ApplyOptions) -> Self {
        Self { options }
    }

    /// Apply `proposal` to `doc`.
    ///
    /// Never returns early on error: the outcome carries the steps that
    /// ran and the failure that stopped the rest.
    pub async fn apply<S: VaultStore + ?Sized>(
        &self,
        store: &S,
        doc: &DocumentRef,
        proposal: &OrganizationProposal,
        existing_tags: &[String],
    ) -> OrganizationOutcome {
        let mut outcome = OrganizationOutcome {
            document: doc.clone(),
            steps: Vec::new(),
            failure: None,
        };

        if let Err(e) = self.run(store, proposal, existing_tags, &mut outcome).await {
            warn!(
                "Organization of {} stopped after {} step(s): {}",
                doc.path,
                outcome.steps.len(),
                e
            );
            outcome.failure = Some(e);
        }

        outcome
    }

    async fn run<S: VaultStore + ?Sized>(
        &self,
        store: &S,
        proposal: &OrganizationProposal,
        existing_tags: &[String],
        outcome: &mut OrganizationOutcome,
    ) -> Result<()> {
        proposal.validate()?;

        if let Some(step) = self.resolve_title(store, &mut outcome.document, &proposal.title).await? {
            outcome.steps.push(step);
        }
        if let Some(step) = resolve_placement(store, &mut outcome.document, &proposal.path).await? {
            outcome.steps.push(step);
        }
        if let Some(step) = merge_tags(store, &outcome.document, &proposal.tags, existing_tags).await? {
            outcome.steps.push(step);
        }

        Ok(())
    }

    async fn resolve_title<S: VaultStore + ?Sized>(
        &self,
        store: &S,
        doc: &mut DocumentRef,
        title: &str,
    ) -> Result<Option<Step>> {
        let title = sanitize_title(title);
        if title.is_empty() || title == doc.basename {
            debug!("Title step skipped for {}", doc.path);
            return Ok(None);
        }
        if self.options.preserve_custom_titles && !is_generic_title(&doc.basename) {
            debug!("Keeping custom title '{}'", doc.basename);
            return Ok(None);
        }

        let target = join_path(&doc.parent, &format!("{}.{}", title, NOTE_EXTENSION));
        ensure_vacant(store, &target, doc).await?;

        store.rename(&doc.path, &target).await?;
        info!("Renamed {} -> {}", doc.path, target);

        let step = Step::Renamed { from: doc.path.clone(), to: target.clone() };
        *doc = DocumentRef::from_path(&target);
        Ok(Some(step))
    }
}

async fn resolve_placement<S: VaultStore + ?Sized>(
    store: &S,
    doc: &mut DocumentRef,
    path: &str,
) -> Result<Option<Step>> {
    let folder = normalize_folder(path);
    if folder.is_empty() || folder == doc.parent {
        debug!("Placement step skipped for {}", doc.path);
        return Ok(None);
    }

    match store.lookup(&folder).await? {
        Some(Node::Folder { .. }) => {}
        Some(Node::Document { .. }) => {
            return Err(NotewiseError::InvalidTarget {
                path: folder,
                reason: "not a folder".to_string(),
            })
        }
        None => {
            return Err(NotewiseError::InvalidTarget {
                path: folder,
                reason: "folder does not exist".to_string(),
            })
        }
    }

    let target = join_path(&folder, doc.file_name());
    ensure_vacant(store, &target, doc).await?;

    store.rename(&doc.path, &target).await?;
    info!("Moved {} -> {}", doc.path, target);

    let step = Step::Moved { from: doc.path.clone(), to: target.clone() };
    *doc = DocumentRef::from_path(&target);
    Ok(Some(step))
}

async fn merge_tags<S: VaultStore + ?Sized>(
    store: &S,
    doc: &DocumentRef,
    proposed: &[String],
    existing: &[String],
) -> Result<Option<Step>> {
    let (merged, added) = union_tags(existing, proposed);
    if added.is_empty() {
        debug!("Tag step skipped for {}", doc.path);
        return Ok(None);
    }

    store.write_tags(&doc.path, &merged).await?;
    info!("Tagged {} with {:?}", doc.path, added);

    Ok(Some(Step::TagsMerged { added }))
}

/// Union of existing and proposed tags, existing first.
///
/// Returns the merged list and the tags that were not already present.
pub fn union_tags(existing: &[String], proposed: &[String]) -> (Vec<String>, Vec<String>) {
    let mut merged: Vec<String> = Vec::with_capacity(existing.len() + proposed.len());
    for tag in existing.iter().map(|t| normalize_tag(t)) {
        if !tag.is_empty() && !merged.contains(&tag) {
            merged.push(tag);
        }
    }

    let mut added = Vec::new();
    for tag in proposed.iter().map(|t| normalize_tag(t)) {
        if !tag.is_empty() && !merged.contains(&tag) {
            merged.push(tag.clone());
            added.push(tag);
        }
    }

    (merged, added)
}

/// Fail with `NameCollision` if `target` is held by anything other than `doc`
async fn ensure_vacant<S: VaultStore + ?Sized>(
    store: &S,
    target: &str,
    doc: &DocumentRef,
) -> Result<()> {
    match store.lookup(target).await? {
        None => Ok(()),
        Some(Node::Document { path }) if path == doc.path => Ok(()),
        Some(Node::Document { .. }) | Some(Node::Folder { .. }) => {
            Err(NotewiseError::NameCollision { path: target.to_string() })
        }
    }
}

/// Make a model-supplied title safe to use as a file name
pub fn sanitize_title(title: &str) -> String {
    let title = title.trim();
    let title = title
        .strip_suffix(".md")
        .or_else(|| title.strip_suffix(".MD"))
        .unwrap_or(title);

    let cleaned: String = title
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
            c => c,
        })
        .collect();

    cleaned.trim().trim_matches('.').trim().to_string()
}

/// Canonical folder form: no surrounding whitespace or slashes
pub fn normalize_folder(path: &str) -> String {
    path.trim().trim_matches('/').to_string()
}

pub fn is_generic_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    GENERIC_TITLES.iter().any(|g| lower.contains(g))
}

fn join_path(folder: &str, name: &str) -> String {
    if folder.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", folder, name)
    }
}
