//! Restricted glob matching for rule include/exclude filters
//!
//! Supported syntax: `*` (within one path segment), `**` (any number of
//! segments) and `{a,b}` alternation. Everything else is literal.
//! Patterns are compiled to anchored regular expressions and matched
//! against `/`-separated paths relative to the rules directory.
//!
//! `**` has three distinct forms:
//! - `**/` at the start of a segment matches zero or more leading directories
//! - a trailing `/**` matches the directory itself or anything beneath it
//! - a bare `**` anywhere else matches any characters, `/` included

use anyhow::{Context, Result};
use regex::Regex;

/// A compiled glob pattern
#[derive(Debug, Clone)]
pub struct GlobPattern {
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        let chars: Vec<char> = pattern.chars().collect();
        let expr = format!("^{}$", translate(&chars, true, true));
        let regex = Regex::new(&expr)
            .with_context(|| format!("Invalid glob pattern: {}", pattern))?;
        Ok(Self { regex })
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Expand a directory-style pattern (`docs`, `guides/`) into one that
/// matches every rule file beneath it. Other patterns pass through.
pub fn expand_directory_pattern(pattern: &str) -> String {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    let has_wildcard = pattern.contains('*') || pattern.contains('{');
    let is_rule_file = pattern.ends_with(".md") || pattern.ends_with(".mdc");

    if has_wildcard || is_rule_file {
        pattern.to_string()
    } else {
        format!("{}/**/*.{{md,mdc}}", pattern.trim_end_matches('/'))
    }
}

/// Include/exclude filter over relative rule paths
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    include: Vec<GlobPattern>,
    exclude: Vec<GlobPattern>,
}

impl PathFilter {
    pub fn new(include: &[String], exclude: &[String]) -> Result<Self> {
        let compile = |patterns: &[String]| -> Result<Vec<GlobPattern>> {
            patterns
                .iter()
                .map(|p| GlobPattern::new(&expand_directory_pattern(p)))
                .collect()
        };

        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// Exclusion always wins; with no include patterns everything else passes.
    pub fn allows(&self, relative_path: &str) -> bool {
        if self.exclude.iter().any(|g| g.is_match(relative_path)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|g| g.is_match(relative_path))
    }
}

/// `starts_segment` and `ends_pattern` describe what surrounds `chars`
/// when it is the inside of a brace alternative.
fn translate(chars: &[char], starts_segment: bool, ends_pattern: bool) -> String {
    let mut out = String::new();
    let mut i = 0;

    while i < chars.len() {
        let at_segment_start = if i == 0 {
            starts_segment
        } else {
            chars[i - 1] == '/'
        };

        if at_segment_start && starts_with(chars, i, "**/") {
            out.push_str("(?:.*/)?");
            i += 3;
        } else if starts_with(chars, i, "/**") && ends_pattern && i + 3 == chars.len() {
            out.push_str("(?:/.*)?");
            i += 3;
        } else if starts_with(chars, i, "**") {
            out.push_str(".*");
            i += 2;
        } else if chars[i] == '*' {
            out.push_str("[^/]*");
            i += 1;
        } else if chars[i] == '{' {
            match closing_brace(chars, i) {
                Some(end) => {
                    let at_end = ends_pattern && end + 1 == chars.len();
                    let alternatives: Vec<String> = split_alternatives(&chars[i + 1..end])
                        .into_iter()
                        .map(|alt| translate(alt, at_segment_start, at_end))
                        .collect();
                    out.push_str("(?:");
                    out.push_str(&alternatives.join("|"));
                    out.push(')');
                    i = end + 1;
                }
                None => {
                    out.push_str(r"\{");
                    i += 1;
                }
            }
        } else {
            out.push_str(&regex::escape(&chars[i].to_string()));
            i += 1;
        }
    }

    out
}

fn starts_with(chars: &[char], at: usize, needle: &str) -> bool {
    let needle: Vec<char> = needle.chars().collect();
    chars.len() >= at + needle.len() && chars[at..at + needle.len()] == needle[..]
}

fn closing_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in chars[open..].iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split brace contents on top-level commas.
fn split_alternatives(chars: &[char]) -> Vec<&[char]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, c) in chars.iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&chars[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&chars[start..]);
    parts
}
