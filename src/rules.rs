//! Rule file collection and concatenation
//!
//! Walks the ruler directory for `.md`/`.mdc` files, filters them, and
//! produces a deterministic ordering:
//!
//! 1. a project-level `AGENTS.md` next to the ruler directory (unless it
//!    is our own generated output being fed back in)
//! 2. `AGENTS.md` at the root of the ruler directory, or failing that the
//!    legacy `instructions.md`
//! 3. every other rule file, sorted by path

use anyhow::{Context, Result};
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

use crate::config::{MergeStrategy, RulesConfig};
use crate::frontmatter::{self, Frontmatter};
use crate::glob::PathFilter;

/// Primary rule file name
pub const PRIMARY_RULE_FILE: &str = "AGENTS.md";

/// Legacy primary rule file name
pub const LEGACY_PRIMARY_RULE_FILE: &str = "instructions.md";

/// Subdirectory reserved for skills; never collected as rules
pub const SKILLS_DIR_NAME: &str = "skills";

/// First line of every markdown file ruler writes
pub const GENERATED_MARKER: &str = "<!-- Generated by Ruler -->";

/// Provenance text that only appears in concatenated output
const SOURCE_PROVENANCE: &str = "Source: .ruler/";

static SOURCE_COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*Source:\s*(?P<path>.+?)\s*-->").unwrap());

/// One source rule file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDocument {
    pub path: PathBuf,
    pub content: String,
    pub frontmatter: Option<Frontmatter>,
}

/// Options for [`collect`]
#[derive(Debug, Clone, Default)]
pub struct CollectOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub merge_strategy: MergeStrategy,
}

impl From<&RulesConfig> for CollectOptions {
    fn from(rules: &RulesConfig) -> Self {
        Self {
            include: rules.include.clone(),
            exclude: rules.exclude.clone(),
            merge_strategy: rules.merge_strategy,
        }
    }
}

/// Collect rule documents under `root` in concatenation order.
pub fn collect(root: &Path, options: &CollectOptions) -> Result<Vec<RuleDocument>> {
    let filter = PathFilter::new(&options.include, &options.exclude)?;
    let mut primary: Option<RuleDocument> = None;
    let mut legacy: Option<RuleDocument> = None;
    let mut others: Vec<RuleDocument> = Vec::new();

    let walker = WalkDir::new(root).into_iter().filter_entry(|entry| {
        !(entry.depth() == 1
            && entry.file_type().is_dir()
            && entry.file_name() == SKILLS_DIR_NAME)
    });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read directory: {}", root.display()))?;
        let path = entry.path();
        if !path.is_file() || !is_rule_file(path) {
            continue;
        }

        let relative = relative_slash_path(path, root);
        if !filter.allows(&relative) {
            tracing::debug!(path = %relative, "Rule file filtered out");
            continue;
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;

        let Some(document) = select(path, &relative, content, options.merge_strategy) else {
            tracing::debug!(path = %relative, "Rule file skipped by merge strategy");
            continue;
        };

        match relative.as_str() {
            PRIMARY_RULE_FILE => primary = Some(document),
            LEGACY_PRIMARY_RULE_FILE => legacy = Some(document),
            _ => others.push(document),
        }
    }

    // Without a primary file the legacy one leads; otherwise it is an ordinary rule.
    let lead = match (primary, legacy) {
        (Some(primary), Some(legacy)) => {
            others.push(legacy);
            Some(primary)
        }
        (primary, legacy) => primary.or(legacy),
    };

    // Plain string order, not component-wise `Path` order.
    others.sort_by(|a, b| a.path.as_os_str().cmp(b.path.as_os_str()));

    let mut documents: Vec<RuleDocument> = lead.into_iter().chain(others).collect();

    if let Some(project_doc) = project_level_agents_md(root, &documents)? {
        documents.insert(0, project_doc);
    }

    Ok(documents)
}

/// Apply the merge strategy to one file.
fn select(
    path: &Path,
    relative: &str,
    content: String,
    strategy: MergeStrategy,
) -> Option<RuleDocument> {
    let parsed = frontmatter::parse(&content);

    match strategy {
        MergeStrategy::All => Some(RuleDocument {
            path: path.to_path_buf(),
            content,
            frontmatter: parsed.frontmatter,
        }),
        MergeStrategy::Cursor if relative == PRIMARY_RULE_FILE => Some(RuleDocument {
            path: path.to_path_buf(),
            content,
            frontmatter: parsed.frontmatter,
        }),
        MergeStrategy::Cursor => {
            let is_cursor_rule = relative.starts_with("rules/") && relative.ends_with(".mdc");
            let always_apply = parsed
                .frontmatter
                .as_ref()
                .and_then(|fm| fm.always_apply)
                == Some(true);

            (is_cursor_rule && always_apply).then(|| RuleDocument {
                path: path.to_path_buf(),
                content: parsed.body.trim().to_string(),
                frontmatter: parsed.frontmatter,
            })
        }
    }
}

/// `AGENTS.md` in the parent of the rules directory, unless it is
/// already collected or looks like ruler's own output.
fn project_level_agents_md(
    root: &Path,
    collected: &[RuleDocument],
) -> Result<Option<RuleDocument>> {
    let Some(parent) = root.parent() else {
        return Ok(None);
    };

    let candidate = parent.join(PRIMARY_RULE_FILE);
    if !candidate.is_file() {
        return Ok(None);
    }

    let canonical = fs::canonicalize(&candidate)
        .with_context(|| format!("Failed to resolve {}", candidate.display()))?;
    let already_collected = collected
        .iter()
        .any(|doc| fs::canonicalize(&doc.path).is_ok_and(|p| p == canonical));
    if already_collected {
        return Ok(None);
    }

    let content = fs::read_to_string(&candidate)
        .with_context(|| format!("Failed to read rule file: {}", candidate.display()))?;

    if is_generated_output(&content, !collected.is_empty()) {
        tracing::debug!(
            path = %candidate.display(),
            "Skipping project AGENTS.md generated by a previous run"
        );
        return Ok(None);
    }

    let frontmatter = frontmatter::parse(&content).frontmatter;
    Ok(Some(RuleDocument {
        path: candidate,
        content,
        frontmatter,
    }))
}

/// Heuristic for "this file was written by ruler".
///
/// The marker is conclusive on its own. Embedded provenance comments
/// only count when other rule files exist, since then the file is a
/// stale concatenation of them.
pub fn is_generated_output(content: &str, has_other_rules: bool) -> bool {
    content.trim_start().starts_with(GENERATED_MARKER)
        || (has_other_rules && content.contains(SOURCE_PROVENANCE))
}

/// Join documents in order, each preceded by a `Source:` comment.
pub fn concatenate(documents: &[RuleDocument], project_root: &Path) -> String {
    documents
        .iter()
        .map(|doc| {
            format!(
                "<!-- Source: {} -->\n\n{}\n",
                display_path(&doc.path, project_root),
                doc.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Files referenced by `Source:` comments that lie inside `project_root`.
///
/// Absolute references and ones that climb out of the root are dropped.
pub fn source_paths(concatenated: &str, project_root: &Path) -> Vec<PathBuf> {
    let canonical_root = fs::canonicalize(project_root).ok();
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for caps in SOURCE_COMMENT_RE.captures_iter(concatenated) {
        let Some(relative) = contained_relative_path(Path::new(&caps["path"])) else {
            tracing::debug!(reference = &caps["path"], "Dropping source reference outside project root");
            continue;
        };

        let resolved = project_root.join(&relative);

        // Follow symlinks for files that exist; they must not lead outside either.
        if let (Some(root), Ok(real)) = (canonical_root.as_ref(), fs::canonicalize(&resolved))
            && !real.starts_with(root)
        {
            continue;
        }

        if seen.insert(resolved.clone()) {
            paths.push(resolved);
        }
    }

    paths
}

/// Lexically normalize a relative reference; `None` if it is absolute
/// or escapes its base.
fn contained_relative_path(reference: &Path) -> Option<PathBuf> {
    let mut normalized = PathBuf::new();
    for component in reference.components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!normalized.as_os_str().is_empty()).then_some(normalized)
}

fn is_rule_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "md" || ext == "mdc")
}

fn relative_slash_path(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path shown in provenance comments: relative to the project root when possible.
pub fn display_path(path: &Path, project_root: &Path) -> String {
    pathdiff::diff_paths(path, project_root)
        .filter(|p| !p.starts_with(".."))
        .map(|p| relative_slash_path(&p, Path::new("")))
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let ruler_dir = temp_dir.path().join(".ruler");
        fs::create_dir_all(&ruler_dir).unwrap();
        (temp_dir, ruler_dir)
    }

    fn write(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn relative_names(docs: &[RuleDocument], root: &Path) -> Vec<String> {
        docs.iter()
            .map(|d| relative_slash_path(&d.path, root))
            .collect()
    }

    // ==========================================================================
    // ORDERING
    // ==========================================================================

    #[test]
    fn test_agents_md_comes_first_then_lexicographic() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("zeta.md"), "Z");
        write(&ruler.join("AGENTS.md"), "A");
        write(&ruler.join("alpha.md"), "alpha");
        write(&ruler.join("sub/beta.mdc"), "beta");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(
            relative_names(&docs, &ruler),
            vec!["AGENTS.md", "alpha.md", "sub/beta.mdc", "zeta.md"]
        );
    }

    #[test]
    fn test_instructions_md_leads_without_agents_md() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("a.md"), "a");
        write(&ruler.join("instructions.md"), "legacy");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(relative_names(&docs, &ruler), vec!["instructions.md", "a.md"]);
    }

    #[test]
    fn test_instructions_md_is_ordinary_when_agents_md_present() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("AGENTS.md"), "primary");
        write(&ruler.join("instructions.md"), "legacy");
        write(&ruler.join("b.md"), "b");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(
            relative_names(&docs, &ruler),
            vec!["AGENTS.md", "b.md", "instructions.md"]
        );
    }

    #[test]
    fn test_nested_agents_md_is_not_primary() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("a.md"), "a");
        write(&ruler.join("nested/AGENTS.md"), "nested");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(relative_names(&docs, &ruler), vec!["a.md", "nested/AGENTS.md"]);
    }

    #[test]
    fn test_scenario_agents_then_guide() {
        let (tmp, ruler) = setup();
        write(&ruler.join("AGENTS.md"), "Rule A");
        write(&ruler.join("guide.md"), "Rule B");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        let text = concatenate(&docs, tmp.path());

        assert_eq!(
            text,
            "<!-- Source: .ruler/AGENTS.md -->\n\nRule A\n\n<!-- Source: .ruler/guide.md -->\n\nRule B\n"
        );
    }

    // ==========================================================================
    // WALK SCOPE
    // ==========================================================================

    #[test]
    fn test_skips_non_rule_files_and_skills_dir() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("a.md"), "a");
        write(&ruler.join("mcp.json"), "{}");
        write(&ruler.join("ruler.toml"), "");
        write(&ruler.join("skills/my-skill/SKILL.md"), "skill");
        write(&ruler.join("docs/skills/ok.md"), "nested skills dir is fine");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(
            relative_names(&docs, &ruler),
            vec!["a.md", "docs/skills/ok.md"]
        );
    }

    #[test]
    fn test_hidden_subdirectories_are_included() {
        let (_tmp, ruler) = setup();
        write(&ruler.join(".hidden/secret.md"), "hidden");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(relative_names(&docs, &ruler), vec![".hidden/secret.md"]);
    }

    // ==========================================================================
    // FILTERING
    // ==========================================================================

    #[test]
    fn test_exclude_beats_include() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("docs/a.md"), "a");
        write(&ruler.join("docs/private/b.md"), "b");
        write(&ruler.join("other.md"), "o");

        let options = CollectOptions {
            include: vec!["docs".to_string()],
            exclude: vec!["docs/private/**".to_string()],
            ..Default::default()
        };
        let docs = collect(&ruler, &options).unwrap();
        assert_eq!(relative_names(&docs, &ruler), vec!["docs/a.md"]);
    }

    #[test]
    fn test_excluded_agents_md_is_not_primary() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("AGENTS.md"), "primary");
        write(&ruler.join("instructions.md"), "legacy");

        let options = CollectOptions {
            exclude: vec!["AGENTS.md".to_string()],
            ..Default::default()
        };
        let docs = collect(&ruler, &options).unwrap();
        assert_eq!(relative_names(&docs, &ruler), vec!["instructions.md"]);
    }

    // ==========================================================================
    // CURSOR STRATEGY
    // ==========================================================================

    #[test]
    fn test_cursor_strategy_keeps_agents_and_always_apply_rules() {
        let (_tmp, ruler) = setup();
        write(&ruler.join("AGENTS.md"), "---\ndescription: top\n---\nAgents body");
        write(&ruler.join("guide.md"), "dropped");
        write(
            &ruler.join("rules/always.mdc"),
            "---\nalwaysApply: true\n---\n\n  Always body  \n",
        );
        write(
            &ruler.join("rules/string.mdc"),
            "---\nalwaysApply: \"true\"\n---\nString body",
        );
        write(
            &ruler.join("rules/never.mdc"),
            "---\nalwaysApply: false\n---\nNever body",
        );
        write(&ruler.join("rules/plain.md"), "---\nalwaysApply: true\n---\nmd");
        write(&ruler.join("always.mdc"), "---\nalwaysApply: true\n---\nroot mdc");

        let options = CollectOptions {
            merge_strategy: MergeStrategy::Cursor,
            ..Default::default()
        };
        let docs = collect(&ruler, &options).unwrap();

        assert_eq!(
            relative_names(&docs, &ruler),
            vec!["AGENTS.md", "rules/always.mdc"]
        );
        // AGENTS.md keeps its frontmatter untouched
        assert!(docs[0].content.starts_with("---\ndescription: top"));
        // cursor rules are stripped down to their trimmed body
        assert_eq!(docs[1].content, "Always body");
        assert!(!docs[1].content.contains("---"));
    }

    // ==========================================================================
    // PROJECT-LEVEL AGENTS.md
    // ==========================================================================

    #[test]
    fn test_project_agents_md_is_prepended() {
        let (tmp, ruler) = setup();
        write(&tmp.path().join("AGENTS.md"), "Project rules");
        write(&ruler.join("AGENTS.md"), "Ruler rules");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].path, tmp.path().join("AGENTS.md"));
        assert_eq!(docs[0].content, "Project rules");
    }

    #[test]
    fn test_generated_project_agents_md_is_ignored() {
        let (tmp, ruler) = setup();
        write(
            &tmp.path().join("AGENTS.md"),
            &format!("{}\n\nold output", GENERATED_MARKER),
        );
        write(&ruler.join("AGENTS.md"), "Ruler rules");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(relative_names(&docs, &ruler), vec!["AGENTS.md"]);
    }

    #[test]
    fn test_stale_concatenation_is_ignored_when_rules_exist() {
        let (tmp, ruler) = setup();
        write(
            &tmp.path().join("AGENTS.md"),
            "<!-- Source: .ruler/AGENTS.md -->\n\nRuler rules\n",
        );
        write(&ruler.join("AGENTS.md"), "Ruler rules");

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[test]
    fn test_provenance_alone_does_not_hide_project_agents_md() {
        let (tmp, ruler) = setup();
        write(
            &tmp.path().join("AGENTS.md"),
            "Mentions Source: .ruler/foo.md in prose",
        );

        let docs = collect(&ruler, &CollectOptions::default()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].path, tmp.path().join("AGENTS.md"));
    }

    #[test]
    fn test_is_generated_output() {
        assert!(is_generated_output(
            &format!("\n{}\nbody", GENERATED_MARKER),
            false
        ));
        assert!(is_generated_output("x <!-- Source: .ruler/a.md -->", true));
        assert!(!is_generated_output("x <!-- Source: .ruler/a.md -->", false));
        assert!(!is_generated_output("hand written", true));
    }

    // ==========================================================================
    // SOURCE REFERENCES
    // ==========================================================================

    #[test]
    fn test_source_paths_resolve_inside_root() {
        let (tmp, ruler) = setup();
        write(&ruler.join("a.md"), "a");
        let text = "<!-- Source: .ruler/a.md -->\n\na\n<!-- Source: docs/../.ruler/a.md -->\n";

        let paths = source_paths(text, tmp.path());
        assert_eq!(paths, vec![tmp.path().join(".ruler/a.md")]);
    }

    #[test]
    fn test_source_paths_drop_escapes_and_absolute_paths() {
        let (tmp, _ruler) = setup();
        let text = "<!-- Source: ../outside.md -->\n<!-- Source: /etc/passwd -->\n<!-- Source: a/../../x.md -->\n<!-- Source: ok.md -->";

        let paths = source_paths(text, tmp.path());
        assert_eq!(paths, vec![tmp.path().join("ok.md")]);
    }

    #[test]
    fn test_display_path_falls_back_outside_root() {
        let root = Path::new("/project");
        assert_eq!(display_path(Path::new("/project/.ruler/a.md"), root), ".ruler/a.md");
        assert_eq!(display_path(Path::new("/elsewhere/a.md"), root), "/elsewhere/a.md");
    }
}
