//! Windsurf workspace rule

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, write_instructions};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;

pub struct WindsurfAgent;

impl Agent for WindsurfAgent {
    fn identifier(&self) -> &'static str {
        "windsurf"
    }

    fn name(&self) -> &'static str {
        "Windsurf"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(".windsurf")
            .join("rules")
            .join("ruler_windsurf_instructions.md")
    }

    fn apply_ruler_config(
        &self,
        rules: &str,
        project_root: &Path,
        _mcp: Option<&McpServerMap>,
        config: Option<&AgentConfig>,
        ctx: &mut ApplyContext<'_>,
    ) -> Result<()> {
        write_instructions(ctx, &self.instructions_path(project_root, config), rules)
    }
}
