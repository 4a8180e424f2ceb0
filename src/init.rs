//! Initialize a ruler source directory
//!
//! Scaffolds `.ruler/` (or the global config directory) with a starter
//! rule file, configuration and MCP declaration.

use anyhow::{Context, Result};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{self, CONFIG_FILE_NAME, MCP_FILE_NAME, RULER_DIR_NAME};
use crate::rules::PRIMARY_RULE_FILE;

/// Default configuration template
pub const DEFAULT_CONFIG: &str = r#"# Ruler Configuration
# Rules in this directory are concatenated and written into each agent's
# native instruction file by `ruler apply`.

# Agents to apply when --agents is not given (default: all)
# default_agents = ["claude", "copilot", "cursor"]

[rules]
# Only collect these paths (directories expand to all .md/.mdc files below)
# include = ["docs", "**/*.md"]
# Never collect these paths
# exclude = ["drafts/**"]
# "all" concatenates every rule file; "cursor" keeps AGENTS.md plus
# rules/*.mdc files marked `alwaysApply: true`
merge_strategy = "all"

[mcp]
enabled = true
# "merge" keeps servers already configured in an agent; "overwrite" replaces them
merge_strategy = "merge"

[gitignore]
enabled = true

# Per-agent overrides
# [agents.claude]
# enabled = true
# output_path = "CLAUDE.md"
#
# [agents.copilot.mcp]
# merge_strategy = "overwrite"

# Servers can also be declared here instead of mcp.json
# [mcp_servers.filesystem]
# command = "npx"
# args = ["-y", "@modelcontextprotocol/server-filesystem", "."]
"#;

/// Default AGENTS.md template
pub const DEFAULT_AGENTS_MD: &str = r#"# AI Agent Instructions

> Centralised instructions for AI coding assistants. Run `ruler apply`
> after editing to propagate them.

## Project Overview

<!-- Describe your project here -->

## Code Style

<!-- Describe your coding conventions -->

## Testing

<!-- Describe your testing approach -->
"#;

/// Default MCP server declaration
pub const DEFAULT_MCP_JSON: &str = r#"{
  "mcpServers": {}
}
"#;

/// Directory `init` scaffolds: `<project_root>/.ruler`, or the global
/// config directory with `global`.
pub fn target_dir(project_root: &Path, global: bool) -> Result<PathBuf> {
    if global {
        config::global_config_dir().context("Could not determine the global config directory")
    } else {
        Ok(project_root.join(RULER_DIR_NAME))
    }
}

/// Create `ruler_dir` and its starter files. Existing files are kept
/// unless `force` is set.
pub fn init(ruler_dir: &Path, force: bool) -> Result<()> {
    if !ruler_dir.exists() {
        fs::create_dir_all(ruler_dir)
            .with_context(|| format!("Failed to create directory: {}", ruler_dir.display()))?;
        println!(
            "  {} Created directory: {}",
            "✔".green(),
            ruler_dir.display()
        );
    }

    for (name, content) in [
        (PRIMARY_RULE_FILE, DEFAULT_AGENTS_MD),
        (CONFIG_FILE_NAME, DEFAULT_CONFIG),
        (MCP_FILE_NAME, DEFAULT_MCP_JSON),
    ] {
        let path = ruler_dir.join(name);
        if path.exists() && !force {
            println!(
                "  {} {} already exists: {} (use --force to overwrite)",
                "!".yellow(),
                name,
                path.display()
            );
            continue;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write file: {}", path.display()))?;
        println!("  {} Created: {}", "✔".green(), path.display());
    }

    Ok(())
}
