//! Revert: undo what apply wrote
//!
//! There is no record of past runs. The files to undo are re-derived
//! from the selected agents and the current configuration, and each
//! file's `.bak` sibling decides between restoring and deleting.

use anyhow::Result;
use colored::Colorize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::agents::{self, Agent};
use crate::apply::servers_for_agent;
use crate::config::Project;
use crate::gitignore;
use crate::mcp::{self, McpServerMap};
use crate::output::{self, RevertAction};

/// Options for the revert operation
#[derive(Debug, Default)]
pub struct RevertOptions {
    pub project_root: PathBuf,
    pub config_path: Option<PathBuf>,
    pub agents: Option<Vec<String>>,
    /// Leave `.bak` files in place after restoring
    pub keep_backups: bool,
    pub dry_run: bool,
    pub local_only: bool,
}

/// Result of a revert run
#[derive(Debug, Default)]
pub struct RevertResult {
    pub restored: usize,
    pub removed: usize,
    pub backups_removed: usize,
    pub directories_removed: usize,
    pub gitignore_cleaned: bool,
}

/// Run revert. Unknown agent names only warn; the valid ones proceed.
pub fn revert(options: &RevertOptions) -> Result<RevertResult> {
    let project = Project::load(
        &options.project_root,
        options.config_path.as_deref(),
        options.local_only,
    )?;

    let selection = agents::select_agents(options.agents.as_deref(), &project.config);
    for name in &selection.unknown {
        tracing::warn!(agent = %name, "Ignoring unknown agent");
        println!("  {} Ignoring unknown agent: {}", "○".yellow(), name);
    }

    let mut result = RevertResult::default();
    if selection.agents.is_empty() {
        tracing::warn!("No valid agents selected, nothing to revert");
        return Ok(result);
    }

    let servers = mcp::load_source_servers(&project.ruler_dir, &project.config).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Could not load MCP servers, leaving MCP files alone");
        McpServerMap::new()
    });

    if options.dry_run {
        println!("{}", "Running in dry-run mode\n".cyan());
    }

    let paths = generated_paths(&selection.agents, &project, &servers);
    tracing::debug!(count = paths.len(), "Derived generated paths");

    for path in &paths {
        match output::revert_file(path, options.keep_backups, options.dry_run)? {
            RevertAction::Restored => {
                result.restored += 1;
                if !options.keep_backups {
                    result.backups_removed += 1;
                }
            }
            RevertAction::Removed => result.removed += 1,
            RevertAction::Missing => {}
        }
    }

    for path in &paths {
        let Some(parent) = path.parent() else {
            continue;
        };
        if parent.starts_with(&project.ruler_dir) {
            continue;
        }
        result.directories_removed +=
            output::prune_empty_dirs(parent, &project.project_root, options.dry_run)?;
    }

    result.gitignore_cleaned =
        gitignore::remove_managed_block(&project.project_root, options.dry_run)?;

    Ok(result)
}

/// Every file apply would write for `agents` under the current
/// configuration, each path once, in agent order.
fn generated_paths(
    agents: &[Box<dyn Agent>],
    project: &Project,
    servers: &McpServerMap,
) -> Vec<PathBuf> {
    let root: &Path = &project.project_root;
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for agent in agents {
        let config = project.config.agent_config(agent.identifier());
        let mut agent_paths = agent.output_paths(root, config);

        if servers_for_agent(agent.as_ref(), &project.config, servers, false).is_some()
            && let Some(mcp_path) = agent.mcp_config_path(root, config)
        {
            agent_paths.push(mcp_path);
        }

        for path in agent_paths {
            if seen.insert(path.clone()) {
                paths.push(path);
            }
        }
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RulerError;
    use crate::output::backup_path;
    use std::fs;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        for (path, content) in files {
            let full = temp_dir.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        temp_dir
    }

    fn options(root: &Path, agents: &[&str]) -> RevertOptions {
        RevertOptions {
            project_root: root.to_path_buf(),
            agents: Some(agents.iter().map(|a| a.to_string()).collect()),
            local_only: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_ruler_dir_is_fatal() {
        let temp_dir = setup(&[("CLAUDE.md", "mine")]);

        let err = revert(&options(temp_dir.path(), &["claude"])).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<RulerError>(),
            Some(RulerError::RulerDirNotFound { .. })
        ));
        assert!(temp_dir.path().join("CLAUDE.md").exists());
    }

    #[test]
    fn test_unknown_agents_are_lenient() {
        let temp_dir = setup(&[(".ruler/AGENTS.md", "Rule A"), ("CLAUDE.md", "generated")]);

        let result = revert(&options(temp_dir.path(), &["claude", "nope"])).unwrap();

        assert_eq!(result.removed, 1);
        assert!(!temp_dir.path().join("CLAUDE.md").exists());
    }

    #[test]
    fn test_only_unknown_agents_does_nothing() {
        let temp_dir = setup(&[(".ruler/AGENTS.md", "Rule A"), ("CLAUDE.md", "generated")]);

        let result = revert(&options(temp_dir.path(), &["nope"])).unwrap();

        assert_eq!(result.removed, 0);
        assert!(temp_dir.path().join("CLAUDE.md").exists());
    }

    #[test]
    fn test_shared_path_restored_once() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            ("AGENTS.md", "generated"),
            ("AGENTS.md.bak", "original"),
        ]);

        let result = revert(&options(temp_dir.path(), &["agentsmd", "codex", "opencode"])).unwrap();

        assert_eq!(result.restored, 1);
        assert_eq!(result.removed, 0);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join("AGENTS.md")).unwrap(),
            "original"
        );
        assert!(!temp_dir.path().join("AGENTS.md.bak").exists());
    }

    #[test]
    fn test_keep_backups() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            ("CLAUDE.md", "generated"),
            ("CLAUDE.md.bak", "old"),
        ]);
        let opts = RevertOptions {
            keep_backups: true,
            ..options(temp_dir.path(), &["claude"])
        };

        let result = revert(&opts).unwrap();

        assert_eq!(result.restored, 1);
        assert_eq!(result.backups_removed, 0);
        assert!(backup_path(&temp_dir.path().join("CLAUDE.md")).exists());
    }

    #[test]
    fn test_prunes_directories_created_for_generated_files() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            (".windsurf/rules/ruler_windsurf_instructions.md", "generated"),
            (".github/copilot-instructions.md", "generated"),
            (".github/workflows/ci.yml", "user file"),
        ]);

        let result = revert(&options(temp_dir.path(), &["windsurf", "copilot"])).unwrap();

        assert_eq!(result.removed, 2);
        assert_eq!(result.directories_removed, 2);
        assert!(!temp_dir.path().join(".windsurf").exists());
        assert!(temp_dir.path().join(".github/workflows/ci.yml").exists());
        assert!(temp_dir.path().join(".ruler/AGENTS.md").exists());
    }

    #[test]
    fn test_mcp_file_untouched_without_servers() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            ("CLAUDE.md", "generated"),
            (".mcp.json", r#"{ "mcpServers": {} }"#),
        ]);

        revert(&options(temp_dir.path(), &["claude"])).unwrap();

        assert!(temp_dir.path().join(".mcp.json").exists());
    }

    #[test]
    fn test_mcp_file_removed_when_servers_configured() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            (".ruler/mcp.json", r#"{ "mcpServers": { "fs": { "command": "npx" } } }"#),
            (".cursor/mcp.json", "{}"),
        ]);

        let result = revert(&options(temp_dir.path(), &["cursor"])).unwrap();

        assert_eq!(result.removed, 1);
        assert!(!temp_dir.path().join(".cursor").exists());
    }

    #[test]
    fn test_gitignore_block_removed() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            (
                ".gitignore",
                "target/\n\n# START Ruler Generated Files\n/CLAUDE.md\n# END Ruler Generated Files\n",
            ),
        ]);

        let result = revert(&options(temp_dir.path(), &["claude"])).unwrap();

        assert!(result.gitignore_cleaned);
        assert_eq!(
            fs::read_to_string(temp_dir.path().join(".gitignore")).unwrap(),
            "target/\n"
        );
    }

    #[test]
    fn test_dry_run_touches_nothing() {
        let temp_dir = setup(&[
            (".ruler/AGENTS.md", "Rule A"),
            ("CLAUDE.md", "generated"),
            (".windsurf/rules/ruler_windsurf_instructions.md", "generated"),
        ]);
        let opts = RevertOptions {
            dry_run: true,
            ..options(temp_dir.path(), &["claude", "windsurf"])
        };

        let result = revert(&opts).unwrap();

        assert_eq!(result.removed, 2);
        assert!(temp_dir.path().join("CLAUDE.md").exists());
        assert!(temp_dir.path().join(".windsurf/rules").exists());
    }
}
