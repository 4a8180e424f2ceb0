//! Gemini CLI: `GEMINI.md` and `.gemini/settings.json`

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, config_path_or, write_instructions, write_mcp};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::mcp::formatter::JsonFormatter;

const SETTINGS_FILE: &str = ".gemini/settings.json";

pub struct GeminiAgent;

impl Agent for GeminiAgent {
    fn identifier(&self) -> &'static str {
        "gemini"
    }

    fn name(&self) -> &'static str {
        "Gemini CLI"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join("GEMINI.md")
    }

    fn mcp_config_path(&self, project_root: &Path, config: Option<&AgentConfig>) -> Option<PathBuf> {
        Some(config_path_or(project_root, config, SETTINGS_FILE))
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

        // settings.json holds more than servers; the formatter keeps other keys
        if let Some(servers) = mcp
            && let Some(path) = self.mcp_config_path(project_root, config)
        {
            write_mcp(ctx, &path, &JsonFormatter::gemini(), servers)?;
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
        Some(JsonFormatter::gemini().server_key())
    }
}
