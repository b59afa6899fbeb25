// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Tag extraction and front-matter tag write-back for Markdown notes

use regex::Regex;
use std::sync::OnceLock;

const FENCE: &str = "```";
const DELIMITER: &str = "---";

fn inline_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:^|[^\p{L}\p{N}_#&/])#([\p{L}\p{N}_/-]+)").expect("valid tag regex")
    })
}

/// Strip a leading `#` and surrounding whitespace from a tag
pub fn normalize_tag(tag: &str) -> String {
    tag.trim().trim_start_matches('#').trim().to_string()
}

/// Collect `#tag` markers from the note body.
///
/// Front matter and fenced code blocks are skipped. Purely numeric markers
/// such as `#2024` are not tags.
pub fn extract_inline_tags(content: &str) -> Vec<String> {
    let body = match split_frontmatter(content) {
        Some((_, body)) => body,
        None => content,
    };

    let mut tags = Vec::new();
    let mut in_fence = false;

    for line in body.lines() {
        if line.trim_start().starts_with(FENCE) {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        for cap in inline_tag_regex().captures_iter(line) {
            let tag = cap[1].trim_end_matches('/');
            if tag.is_empty() || tag.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            push_unique(&mut tags, tag.to_string());
        }
    }

    tags
}

/// Tags listed under `tags:` in the front matter
pub fn frontmatter_tags(content: &str) -> Vec<String> {
    let Some((block, _)) = split_frontmatter(content) else {
        return Vec::new();
    };

    let mut tags = Vec::new();
    let mut lines = block.lines().peekable();

    while let Some(line) = lines.next() {
        let Some(value) = tag_key_value(line) else {
            continue;
        };

        if value.is_empty() {
            // YAML list items on the following lines
            while let Some(item) = lines.peek().copied().and_then(|l| l.trim_start().strip_prefix("- ")) {
                let tag = normalize_tag(unquote(item));
                if !tag.is_empty() {
                    push_unique(&mut tags, tag);
                }
                lines.next();
            }
        } else {
            for tag in parse_inline_list(value) {
                push_unique(&mut tags, tag);
            }
        }
        break;
    }

    tags
}

/// Tags already on a note: front matter first, then inline markers
pub fn existing_tags(content: &str) -> Vec<String> {
    let mut tags = frontmatter_tags(content);
    for tag in extract_inline_tags(content) {
        push_unique(&mut tags, tag);
    }
    tags
}

/// Return `content` with the front-matter `tags:` entry set to `tags`.
///
/// A front matter block is created when the note has none.
pub fn set_frontmatter_tags(content: &str, tags: &[String]) -> String {
    let list = serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string());
    let tag_line = format!("tags: {}", list);

    let Some((block, body)) = split_frontmatter(content) else {
        return format!("{}\n{}\n{}\n{}", DELIMITER, tag_line, DELIMITER, content);
    };

    let mut out: Vec<String> = Vec::new();
    let mut replaced = false;
    let mut lines = block.lines().peekable();

    while let Some(line) = lines.next() {
        if !replaced && tag_key_value(line).is_some() {
            out.push(tag_line.clone());
            replaced = true;
            while lines
                .peek()
                .is_some_and(|l| l.trim_start().starts_with("- "))
            {
                lines.next();
            }
            continue;
        }
        out.push(line.to_string());
    }

    if !replaced {
        out.push(tag_line);
    }

    format!("{}\n{}\n{}\n{}", DELIMITER, out.join("\n"), DELIMITER, body)
}

/// Split a note into its front-matter block (without delimiters) and body
fn split_frontmatter(content: &str) -> Option<(&str, &str)> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;

    if let Some(body) = rest.strip_prefix("---\n") {
        return Some(("", body));
    }

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == DELIMITER {
            let block = rest[..offset].trim_end_matches(['\n', '\r']);
            return Some((block, &rest[offset + line.len()..]));
        }
        offset += line.len();
    }

    None
}

fn tag_key_value(line: &str) -> Option<&str> {
    let value = line
        .strip_prefix("tags:")
        .or_else(|| line.strip_prefix("tag:"))?;
    Some(value.trim())
}

fn parse_inline_list(value: &str) -> Vec<String> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(value) {
        return list
            .iter()
            .map(|t| normalize_tag(t))
            .filter(|t| !t.is_empty())
            .collect();
    }

    value
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| normalize_tag(unquote(t)))
        .filter(|t| !t.is_empty())
        .collect()
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}

fn push_unique(tags: &mut Vec<String>, tag: String) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_tags() {
        let content = "# Heading\nSome #idea and #研究 plus #multi-word/sub.\nIssue #42 is not a tag, nor is a#b.\n";
        assert_eq!(extract_inline_tags(content), vec!["idea", "研究", "multi-word/sub"]);
    }

    #[test]
    fn test_inline_tags_skip_code_fences() {
        let content = "#real\n```\n#include <stdio.h>\n```\n#after";
        assert_eq!(extract_inline_tags(content), vec!["real", "after"]);
    }

    #[test]
    fn test_frontmatter_flow_list() {
        let content = "---\ntitle: x\ntags: [\"ai\", \"draft\"]\n---\nbody #ai #extra";
        assert_eq!(frontmatter_tags(content), vec!["ai", "draft"]);
        assert_eq!(existing_tags(content), vec!["ai", "draft", "extra"]);
    }

    #[test]
    fn test_frontmatter_block_list() {
        let content = "---\ntags:\n  - one\n  - \"#two\"\nstatus: done\n---\n";
        assert_eq!(frontmatter_tags(content), vec!["one", "two"]);
    }

    #[test]
    fn test_frontmatter_plain_list() {
        let content = "---\ntags: alpha, beta gamma\n---\n";
        assert_eq!(frontmatter_tags(content), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_set_tags_without_frontmatter() {
        let out = set_frontmatter_tags("Hello", &["ai".to_string(), "draft".to_string()]);
        assert_eq!(out, "---\ntags: [\"ai\",\"draft\"]\n---\nHello");
        assert_eq!(frontmatter_tags(&out), vec!["ai", "draft"]);
    }

    #[test]
    fn test_set_tags_replaces_existing_entry() {
        let content = "---\ntitle: x\ntags:\n  - old\nstatus: y\n---\nbody";
        let out = set_frontmatter_tags(content, &["old".to_string(), "new".to_string()]);
        assert_eq!(out, "---\ntitle: x\ntags: [\"old\",\"new\"]\nstatus: y\n---\nbody");
    }

    #[test]
    fn test_set_tags_appends_to_frontmatter() {
        let content = "---\ntitle: x\n---\nbody";
        let out = set_frontmatter_tags(content, &["a".to_string()]);
        assert_eq!(out, "---\ntitle: x\ntags: [\"a\"]\n---\nbody");
    }

    #[test]
    fn test_normalize_tag() {
        assert_eq!(normalize_tag("  #ai "), "ai");
        assert_eq!(normalize_tag("#"), "");
    }
}
