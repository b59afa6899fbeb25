// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Notewise

use thiserror::Error;

/// Result type alias for Notewise operations
pub type Result<T> = std::result::Result<T, NotewiseError>;

/// Notewise error types
#[derive(Error, Debug)]
pub enum NotewiseError {
    /// Target path is already occupied by a different document
    #[error("Name collision: {path} already exists")]
    NameCollision { path: String },

    /// Move target folder is missing or is not a folder
    #[error("Invalid target folder {path}: {reason}")]
    InvalidTarget { path: String, reason: String },

    #[error("Malformed proposal: {0}")]
    MalformedProposal(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotewiseError {
    /// True for the conditions that abort an organization midway
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::NameCollision { .. } | Self::InvalidTarget { .. })
    }
}
