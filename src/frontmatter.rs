//! YAML frontmatter parsing for rule files
//!
//! A rule file may start with a `---` delimited YAML block. Only the
//! fields Ruler cares about are kept; everything else is dropped.
//! Parsing never fails: malformed YAML simply means "no frontmatter".

use regex::Regex;
use serde_yaml::Value;
use std::sync::LazyLock;

const DELIMITER: &str = "---";

/// Matches an unquoted, unbracketed `globs:` scalar such as `globs: src/**/*.ts, *.md`.
static BARE_GLOBS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^(?P<indent>[ \t]*)globs:[ \t]*(?P<value>[^\[\s"'][^\r\n]*?)[ \t]*$"#)
        .unwrap()
});

/// Recognized frontmatter fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frontmatter {
    pub description: Option<String>,
    pub globs: Option<Vec<String>>,
    /// Only set when the YAML value is a real boolean.
    pub always_apply: Option<bool>,
}

/// A rule file split into its metadata and body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRule {
    pub frontmatter: Option<Frontmatter>,
    pub body: String,
}

/// Parse the optional frontmatter block at the top of `content`.
///
/// Without a well-formed block the body is `content` exactly as given.
pub fn parse(content: &str) -> ParsedRule {
    let unparsed = || ParsedRule {
        frontmatter: None,
        body: content.to_string(),
    };

    let Some((yaml, body)) = split_block(content) else {
        return unparsed();
    };

    let parsed = if yaml.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_yaml::from_str::<Value>(yaml)
    };

    let value = match parsed {
        Ok(value) => value,
        Err(_) => match repair_globs(yaml) {
            Some(repaired) => match serde_yaml::from_str::<Value>(&repaired) {
                Ok(value) => value,
                Err(e) => {
                    tracing::debug!(error = %e, "Ignoring unparseable frontmatter");
                    return unparsed();
                }
            },
            None => return unparsed(),
        },
    };

    match extract(&value) {
        Some(frontmatter) => ParsedRule {
            frontmatter: Some(frontmatter),
            body: body.to_string(),
        },
        None => unparsed(),
    }
}

/// Split `content` into (yaml, body) when it opens with a delimiter line.
fn split_block(content: &str) -> Option<(&str, &str)> {
    let (first, mut rest) = next_line(content)?;
    if first != DELIMITER {
        return None;
    }

    let yaml_start = content.len() - rest.len();
    loop {
        let line_start = content.len() - rest.len();
        let (line, after) = next_line(rest)?;
        if line == DELIMITER {
            return Some((&content[yaml_start..line_start], after));
        }
        rest = after;
    }
}

/// Returns the next line (without its terminator) and the remainder.
fn next_line(s: &str) -> Option<(&str, &str)> {
    if s.is_empty() {
        return None;
    }
    let (line, rest) = match s.find('\n') {
        Some(idx) => (&s[..idx], &s[idx + 1..]),
        None => (s, ""),
    };
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

/// Rewrite `globs: a,b` into `globs: ["a", "b"]`. Returns `None` when
/// there is nothing to rewrite.
fn repair_globs(yaml: &str) -> Option<String> {
    let mut changed = false;
    let repaired = BARE_GLOBS_RE.replace_all(yaml, |caps: &regex::Captures| {
        let value = &caps["value"];
        if !value.contains(',') && !value.contains('*') {
            return caps[0].to_string();
        }
        changed = true;
        let items: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| format!("\"{}\"", item.replace('\\', "\\\\").replace('"', "\\\"")))
            .collect();
        format!("{}globs: [{}]", &caps["indent"], items.join(", "))
    });

    changed.then(|| repaired.into_owned())
}

fn extract(value: &Value) -> Option<Frontmatter> {
    let map = match value {
        Value::Mapping(map) => map,
        Value::Null => return Some(Frontmatter::default()),
        _ => return None,
    };

    let description = map
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);

    let globs = match map.get("globs") {
        Some(Value::String(single)) => Some(vec![single.clone()]),
        Some(Value::Sequence(items)) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    };

    let always_apply = map.get("alwaysApply").and_then(Value::as_bool);

    Some(Frontmatter {
        description,
        globs,
        always_apply,
    })
}
