// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Notewise: AI-assisted note organizer
//!
//! Asks a language model for a title, folder and tags for a Markdown note
//! and applies the suggestion to the vault without overwriting other notes.
//! Destination folders are filtered through user-defined ignore patterns.

pub mod config;
pub mod error;
pub mod filter;
pub mod history;
pub mod i18n;
pub mod llm;
pub mod organizer;
pub mod tags;
pub mod vault;

pub use config::AppConfig;
pub use error::{NotewiseError, Result};
pub use filter::{filter, FilterResult, FolderFilter};
pub use organizer::{DocumentRef, OrganizationApplier, OrganizationOutcome, OrganizationProposal};
