//! OpenAI Codex CLI: `AGENTS.md` and `.codex/config.toml`
//!
//! Codex only launches local processes, so remote servers reach it
//! through the stdio bridge.

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, config_path_or, write_instructions, write_mcp};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::mcp::formatter::CodexTomlFormatter;
use crate::rules::PRIMARY_RULE_FILE;

const MCP_CONFIG_FILE: &str = ".codex/config.toml";

pub struct CodexAgent;

impl Agent for CodexAgent {
    fn identifier(&self) -> &'static str {
        "codex"
    }

    fn name(&self) -> &'static str {
        "OpenAI Codex CLI"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(PRIMARY_RULE_FILE)
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
            write_mcp(ctx, &path, &CodexTomlFormatter, servers)?;
        }
        Ok(())
    }

    fn supports_mcp_stdio(&self) -> bool {
        true
    }

    fn mcp_server_key(&self) -> Option<&'static str> {
        Some("mcp_servers")
    }
}
