//! Plain `AGENTS.md` at the project root

use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, write_instructions};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::rules::PRIMARY_RULE_FILE;

pub struct AgentsMdAgent;

impl Agent for AgentsMdAgent {
    fn identifier(&self) -> &'static str {
        "agentsmd"
    }

    fn name(&self) -> &'static str {
        "AGENTS.md"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(PRIMARY_RULE_FILE)
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
