// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Folder filtering with glob-style ignore patterns
//!
//! Patterns are matched case-insensitively against `/`-delimited folder
//! paths. A literal pattern ignores the folder and its whole subtree, `*`
//! stands for one segment (or part of one) and `**` for any number of
//! whole segments.

use serde::{Deserialize, Serialize};

/// Path used for the vault root folder
pub const ROOT_FOLDER: &str = "/";

/// Result of partitioning a folder list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterResult {
    /// Folders that may be offered as destinations
    pub allowed: Vec<String>,
    /// Folders excluded by a pattern (or the root)
    pub ignored: Vec<String>,
}

/// A single normalized ignore pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnorePattern {
    normalized: String,
    kind: PatternKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternKind {
    Literal,
    Wildcard(Vec<String>),
}

impl IgnorePattern {
    /// Normalize a raw pattern. Returns `None` when nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().trim_end_matches('/').to_lowercase();
        if normalized.is_empty() {
            return None;
        }

        let kind = if normalized.contains('*') {
            PatternKind::Wildcard(normalized.split('/').map(String::from).collect())
        } else {
            PatternKind::Literal
        };

        Some(Self { normalized, kind })
    }

    /// The normalized (lower-cased) pattern text
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Check a lower-cased folder path against this pattern
    fn matches_lowercase(&self, folder: &str) -> bool {
        match &self.kind {
            PatternKind::Literal => {
                folder == self.normalized
                    || folder
                        .strip_prefix(self.normalized.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            PatternKind::Wildcard(segments) => {
                let folder_segments: Vec<&str> = folder.split('/').collect();
                match_segments(segments, &folder_segments)
            }
        }
    }

    /// Check a folder path against this pattern (case-insensitive)
    pub fn matches(&self, folder: &str) -> bool {
        self.matches_lowercase(&canonical_folder(folder))
    }
}

/// A compiled set of ignore patterns
#[derive(Debug, Clone, Default)]
pub struct FolderFilter {
    patterns: Vec<IgnorePattern>,
}

impl FolderFilter {
    /// Build a filter, dropping patterns that normalize to nothing
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .filter_map(|p| IgnorePattern::parse(p.as_ref()))
                .collect(),
        }
    }

    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    /// Whether a folder is excluded from the destination list
    pub fn is_ignored(&self, folder: &str) -> bool {
        if is_root(folder) {
            return true;
        }
        let folder = canonical_folder(folder);
        self.patterns.iter().any(|p| p.matches_lowercase(&folder))
    }

    /// Partition folders into allowed and ignored, keeping input order
    pub fn filter<S: AsRef<str>>(&self, folders: &[S]) -> FilterResult {
        let mut result = FilterResult::default();

        for folder in folders {
            let folder = folder.as_ref();
            if self.is_ignored(folder) {
                result.ignored.push(folder.to_string());
            } else {
                result.allowed.push(folder.to_string());
            }
        }

        result
    }
}

/// Partition `folders` by `patterns` in one call
pub fn filter<F: AsRef<str>, P: AsRef<str>>(folders: &[F], patterns: &[P]) -> FilterResult {
    FolderFilter::new(patterns).filter(folders)
}

/// Split a user-typed pattern list on commas and newlines
pub fn parse_patterns(raw: &str) -> Vec<String> {
    raw.split([',', '\n'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

fn is_root(folder: &str) -> bool {
    folder == ROOT_FOLDER || folder.is_empty()
}

fn canonical_folder(folder: &str) -> String {
    folder.trim_matches('/').to_lowercase()
}

/// Segment-wise matcher for patterns containing `*` or `**`.
///
/// Explores `(pattern index, folder index)` states depth-first with an
/// explicit stack. Each state is visited at most once, so the work is
/// bounded by `(pattern.len() + 1) * (folder.len() + 1)` regardless of how
/// many `**` segments a pattern holds.
fn match_segments<S: AsRef<str>>(pattern: &[S], folder: &[&str]) -> bool {
    let width = folder.len() + 1;
    let mut visited = vec![false; (pattern.len() + 1) * width];
    let mut stack = vec![(0usize, 0usize)];

    while let Some((pi, fi)) = stack.pop() {
        let slot = pi * width + fi;
        if visited[slot] {
            continue;
        }
        visited[slot] = true;

        if pi == pattern.len() {
            if fi == folder.len() {
                return true;
            }
            continue;
        }

        let segment = pattern[pi].as_ref();

        if fi == folder.len() {
            // trailing `**` may match nothing
            if pattern[pi..].iter().all(|s| s.as_ref() == "**") {
                return true;
            }
            continue;
        }

        if segment == "**" {
            // popped last-in first: consuming a folder segment is tried first
            stack.push((pi + 1, fi));
            stack.push((pi, fi + 1));
        } else if segment_matches(segment, folder[fi]) {
            stack.push((pi + 1, fi + 1));
        }
    }

    false
}

fn segment_matches(pattern: &str, segment: &str) -> bool {
    if pattern == "*" {
        return !segment.is_empty();
    }
    if !pattern.contains('*') {
        return pattern == segment;
    }
    wildcard_match(pattern, segment)
}

/// Classic two-pointer wildcard match where `*` matches any run of chars
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();

    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == '*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some(s) = star {
            p = s + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }

    while p < pattern.len() && pattern[p] == '*' {
        p += 1;
    }

    p == pattern.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(patterns: &[&str], folders: &[&str], ignored: &[&str], allowed: &[&str]) {
        let result = filter(folders, patterns);
        assert_eq!(result.ignored, ignored, "ignored for {:?}", patterns);
        assert_eq!(result.allowed, allowed, "allowed for {:?}", patterns);
    }

    #[test]
    fn test_exact_and_subfolder() {
        check(
            &["archive"],
            &["archive", "archive/old", "archive/2024", "archives", "templates"],
            &["archive", "archive/old", "archive/2024"],
            &["archives", "templates"],
        );
    }

    #[test]
    fn test_single_segment_wildcard() {
        check(
            &["*/attachments"],
            &["project1/attachments", "project2/attachments", "attachments", "project1/sub/attachments", "project1/notes"],
            &["project1/attachments", "project2/attachments"],
            &["attachments", "project1/sub/attachments", "project1/notes"],
        );
    }

    #[test]
    fn test_wildcard_in_name() {
        check(
            &["temp*"],
            &["temp", "temp123", "temporary", "templates", "mytemp"],
            &["temp", "temp123", "temporary", "templates"],
            &["mytemp"],
        );
        check(
            &["*test*"],
            &["test", "mytest", "test123", "mytest123", "notes"],
            &["test", "mytest", "test123", "mytest123"],
            &["notes"],
        );
    }

    #[test]
    fn test_double_wildcard() {
        check(
            &["**/temp"],
            &["temp", "project1/temp", "project1/sub/temp", "templates"],
            &["temp", "project1/temp", "project1/sub/temp"],
            &["templates"],
        );
        check(
            &["archive/**/old"],
            &["archive/old", "archive/sub/old", "archive/sub/deep/old", "old", "archive/older", "notes"],
            &["archive/old", "archive/sub/old", "archive/sub/deep/old"],
            &["old", "archive/older", "notes"],
        );
    }

    #[test]
    fn test_trailing_double_wildcard_matches_prefix_itself() {
        check(&["a/**"], &["a", "a/b", "a/b/c", "b"], &["a", "a/b", "a/b/c"], &["b"]);
    }

    #[test]
    fn test_case_insensitive() {
        check(
            &["Archive", "*/ATTACHMENTS", "**/TEMP"],
            &["archive", "ARCHIVE/2024", "Project1/Attachments", "temp", "Deep/Temp", "notes"],
            &["archive", "ARCHIVE/2024", "Project1/Attachments", "temp", "Deep/Temp"],
            &["notes"],
        );
        check(
            &["*Temp*"],
            &["temp", "MyTemp", "TEMPORARY", "notes"],
            &["temp", "MyTemp", "TEMPORARY"],
            &["notes"],
        );
    }

    #[test]
    fn test_mixed_patterns_scenario() {
        check(
            &["archive", "*/attachments", "**/temp"],
            &["archive", "archive/old", "project1/attachments", "project1/temp", "notes"],
            &["archive", "archive/old", "project1/attachments", "project1/temp"],
            &["notes"],
        );
    }

    #[test]
    fn test_empty_inputs() {
        let none: [&str; 0] = [];
        check(&none, &["archive", "notes"], &[], &["archive", "notes"]);
        check(&["archive"], &none, &[], &[]);
        check(&["", "   ", "/"], &["archive"], &[], &["archive"]);
    }

    #[test]
    fn test_trailing_slash_and_dot_names() {
        check(&["archive/"], &["archive", "archive/old", "notes"], &["archive", "archive/old"], &["notes"]);
        check(&[".config"], &[".config", ".config/plugins", "notes"], &[".config", ".config/plugins"], &["notes"]);
    }

    #[test]
    fn test_root_is_always_ignored() {
        let none: [&str; 0] = [];
        check(&none, &["/", "notes"], &["/"], &["notes"]);
    }

    #[test]
    fn test_duplicates_are_classified_independently() {
        check(&["a"], &["a", "b", "a", "b"], &["a", "a"], &["b", "b"]);
    }

    #[test]
    fn test_partition_is_total() {
        let folders = ["a", "a/b", "x/temp", "temp", "y/z/temp", "q", "Q/R"];
        let patterns = ["**/temp", "q"];
        let result = filter(&folders, &patterns);
        assert_eq!(result.allowed.len() + result.ignored.len(), folders.len());
        for f in &result.allowed {
            assert!(!result.ignored.contains(f));
        }
    }

    #[test]
    fn test_many_double_wildcards_stay_bounded() {
        let pattern = vec!["**"; 40].join("/") + "/nomatch";
        let folder = vec!["seg"; 60].join("/");
        assert!(!FolderFilter::new(&[pattern]).is_ignored(&folder));
    }

    #[test]
    fn test_wildcard_match() {
        assert!(wildcard_match("a*b*c", "aXXbYYc"));
        assert!(wildcard_match("*", ""));
        assert!(!wildcard_match("a*b", "acd"));
        assert!(wildcard_match("é*", "école"));
    }

    #[test]
    fn test_parse_patterns() {
        assert_eq!(
            parse_patterns("archive, */attachments\n**/temp,, \n"),
            vec!["archive", "*/attachments", "**/temp"]
        );
    }
}
