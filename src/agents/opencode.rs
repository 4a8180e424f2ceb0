//! OpenCode: `AGENTS.md` and `opencode.json`

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, config_path_or, write_instructions, write_mcp};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::mcp::formatter::JsonFormatter;
use crate::rules::PRIMARY_RULE_FILE;

const CONFIG_FILE: &str = "opencode.json";

pub struct OpenCodeAgent;

impl Agent for OpenCodeAgent {
    fn identifier(&self) -> &'static str {
        "opencode"
    }

    fn name(&self) -> &'static str {
        "OpenCode"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(PRIMARY_RULE_FILE)
    }

    fn mcp_config_path(&self, project_root: &Path, config: Option<&AgentConfig>) -> Option<PathBuf> {
        Some(config_path_or(project_root, config, CONFIG_FILE))
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
            write_mcp(ctx, &path, &JsonFormatter::opencode(), servers)?;
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
        Some(JsonFormatter::opencode().server_key())
    }
}
