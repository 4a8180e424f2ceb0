//! Cursor: an always-applied project rule plus `.cursor/mcp.json`

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, config_path_or, generated_markdown, write_mcp};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::mcp::formatter::JsonFormatter;

const MCP_CONFIG_FILE: &str = ".cursor/mcp.json";

/// Rule frontmatter; without `alwaysApply` Cursor only attaches the rule on demand
const RULE_FRONTMATTER: &str = "---\nalwaysApply: true\n---\n";

pub struct CursorAgent;

impl Agent for CursorAgent {
    fn identifier(&self) -> &'static str {
        "cursor"
    }

    fn name(&self) -> &'static str {
        "Cursor"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(".cursor")
            .join("rules")
            .join("ruler_cursor_instructions.mdc")
    }

    fn mcp_config_path(&self, project_root: &Path, config: Option<&AgentConfig>) -> Option<PathBuf> {
        Some(config_path_or(project_root, config, MCP_CONFIG_FILE))
    }

    fn apply_ruler_config(
        &self,
        rules: &str,
        project_root: &Path,
        mcp: Option<&McpServerMap>,
        config: Option<&AgentConfig>,
        ctx: &mut ApplyContext<'_>,
    ) -> Result<()> {
        let content = format!("{}{}", RULE_FRONTMATTER, generated_markdown(rules));
        ctx.writer
            .write(&self.instructions_path(project_root, config), &content)?;

        if let Some(servers) = mcp
            && let Some(path) = self.mcp_config_path(project_root, config)
        {
            write_mcp(ctx, &path, &JsonFormatter::standard(), servers)?;
        }
        Ok(())
    }

    fn supports_mcp_stdio(&self) -> bool {
        true
    }

    fn supports_mcp_remote(&self) -> bool {
        true
    }

    fn mcp_server_key(&self) -> Option<&'static str> {
        Some(JsonFormatter::standard().server_key())
    }
}
