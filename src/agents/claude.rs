//! Claude Code: `CLAUDE.md` and `.mcp.json`

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, config_path_or, write_instructions, write_mcp};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::mcp::formatter::JsonFormatter;

const MCP_CONFIG_FILE: &str = ".mcp.json";

pub struct ClaudeAgent;

impl Agent for ClaudeAgent {
    fn identifier(&self) -> &'static str {
        "claude"
    }

    fn name(&self) -> &'static str {
        "Claude Code"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join("CLAUDE.md")
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
        write_instructions(ctx, &self.instructions_path(project_root, config), rules)?;

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
