//! Agent adapters
//!
//! Each supported assistant gets an [`Agent`] that knows where its
//! instruction and config files live and how to write them. Adapters
//! share behavior through the helpers in this module rather than
//! through a class hierarchy: an adapter that is "a markdown writer
//! plus an MCP file" just calls both helpers.

mod agentsmd;
mod aider;
mod claude;
mod codex;
mod copilot;
mod cursor;
mod gemini;
mod opencode;
mod windsurf;

pub use agentsmd::AgentsMdAgent;
pub use aider::AiderAgent;
pub use claude::ClaudeAgent;
pub use codex::CodexAgent;
pub use copilot::CopilotAgent;
pub use cursor::CursorAgent;
pub use gemini::GeminiAgent;
pub use opencode::OpenCodeAgent;
pub use windsurf::WindsurfAgent;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::agent_ids;
use crate::config::{AgentConfig, McpMergeStrategy, RulerConfig};
use crate::mcp::{AgentCapabilities, McpFormatter, McpServerMap};
use crate::output::OutputWriter;
use crate::rules::GENERATED_MARKER;

/// Per-run state handed to every adapter
pub struct ApplyContext<'a> {
    pub writer: &'a mut OutputWriter,
    /// How MCP servers combine with an existing config file
    pub mcp_strategy: McpMergeStrategy,
}

/// Contract every agent adapter satisfies.
pub trait Agent: Send + Sync {
    /// Canonical identifier (`claude`, `copilot`, ...)
    fn identifier(&self) -> &'static str;

    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Instructions file when no override is configured
    fn default_output_path(&self, project_root: &Path) -> PathBuf;

    /// Instructions file, honoring `output_path` overrides.
    fn instructions_path(&self, project_root: &Path, config: Option<&AgentConfig>) -> PathBuf {
        config
            .and_then(|c| c.instructions_path(project_root))
            .unwrap_or_else(|| self.default_output_path(project_root))
    }

    /// Files written on every apply.
    fn output_paths(&self, project_root: &Path, config: Option<&AgentConfig>) -> Vec<PathBuf> {
        vec![self.instructions_path(project_root, config)]
    }

    /// MCP config file, for agents that have one. Only written when
    /// there are servers to propagate.
    fn mcp_config_path(&self, _project_root: &Path, _config: Option<&AgentConfig>) -> Option<PathBuf> {
        None
    }

    /// Write this agent's files.
    ///
    /// `mcp` is `None` when there is nothing to propagate; the adapter
    /// must then leave its MCP file alone.
    fn apply_ruler_config(
        &self,
        rules: &str,
        project_root: &Path,
        mcp: Option<&McpServerMap>,
        config: Option<&AgentConfig>,
        ctx: &mut ApplyContext<'_>,
    ) -> Result<()>;

    fn supports_mcp_stdio(&self) -> bool {
        false
    }

    fn supports_mcp_remote(&self) -> bool {
        false
    }

    /// Top-level key holding servers in the agent's MCP file
    fn mcp_server_key(&self) -> Option<&'static str> {
        None
    }

    fn capabilities(&self) -> AgentCapabilities {
        AgentCapabilities {
            supports_stdio: self.supports_mcp_stdio(),
            supports_remote: self.supports_mcp_remote(),
        }
    }
}

/// Every adapter, in apply order.
///
/// Several agents write `AGENTS.md`; the last one in this order wins.
pub fn all_agents() -> Vec<Box<dyn Agent>> {
    vec![
        Box::new(AgentsMdAgent),
        Box::new(ClaudeAgent),
        Box::new(CodexAgent),
        Box::new(CopilotAgent),
        Box::new(CursorAgent),
        Box::new(GeminiAgent),
        Box::new(OpenCodeAgent),
        Box::new(WindsurfAgent),
        Box::new(AiderAgent),
    ]
}

/// Identifiers of every registered agent
pub fn agent_identifiers() -> Vec<String> {
    all_agents()
        .iter()
        .map(|a| a.identifier().to_string())
        .collect()
}

/// Outcome of resolving which agents to run
pub struct AgentSelection {
    pub agents: Vec<Box<dyn Agent>>,
    /// Tokens from the command line that matched no agent
    pub unknown: Vec<String>,
}

/// Resolve the agents to run.
///
/// Priority: `--agents` > `default_agents` (plus agents explicitly
/// enabled in config) > every agent. `enabled = false` drops an agent
/// unless it was named on the command line.
pub fn select_agents(cli_agents: Option<&[String]>, config: &RulerConfig) -> AgentSelection {
    let registry = all_agents();

    let matches_any = |agent: &dyn Agent, tokens: &[String]| {
        tokens
            .iter()
            .any(|t| agent_ids::agent_filter_matches(agent.identifier(), agent.name(), t))
    };
    let unknown_tokens = |tokens: &[String]| -> Vec<String> {
        tokens
            .iter()
            .filter(|t| {
                !registry
                    .iter()
                    .any(|a| agent_ids::agent_filter_matches(a.identifier(), a.name(), t))
            })
            .cloned()
            .collect()
    };
    let enabled_flag = |agent: &dyn Agent| {
        config
            .agent_config(agent.identifier())
            .and_then(|c| c.enabled)
    };

    if let Some(tokens) = cli_agents.filter(|t| !t.is_empty()) {
        let unknown = unknown_tokens(tokens);
        let agents = registry
            .into_iter()
            .filter(|a| matches_any(a.as_ref(), tokens))
            .collect();
        return AgentSelection { agents, unknown };
    }

    if !config.default_agents.is_empty() {
        for token in unknown_tokens(&config.default_agents) {
            tracing::warn!(agent = %token, "Unknown agent in default_agents");
        }
        let agents = registry
            .into_iter()
            .filter(|a| {
                let enabled = enabled_flag(a.as_ref());
                enabled != Some(false)
                    && (enabled == Some(true) || matches_any(a.as_ref(), &config.default_agents))
            })
            .collect();
        return AgentSelection {
            agents,
            unknown: Vec::new(),
        };
    }

    let agents = registry
        .into_iter()
        .filter(|a| enabled_flag(a.as_ref()) != Some(false))
        .collect();
    AgentSelection {
        agents,
        unknown: Vec::new(),
    }
}

// =============================================================================
// Shared writers
// =============================================================================

/// Secondary config file, honoring `output_path_config`.
pub(crate) fn config_path_or(
    project_root: &Path,
    config: Option<&AgentConfig>,
    default_relative: &str,
) -> PathBuf {
    config
        .and_then(|c| c.config_path(project_root))
        .unwrap_or_else(|| project_root.join(default_relative))
}

/// Markdown body carrying the generated-file marker.
pub(crate) fn generated_markdown(rules: &str) -> String {
    let body = rules.trim_end();
    if body.is_empty() {
        format!("{}\n", GENERATED_MARKER)
    } else {
        format!("{}\n\n{}\n", GENERATED_MARKER, body)
    }
}

/// Write the concatenated rules as a marked markdown file.
pub(crate) fn write_instructions(ctx: &mut ApplyContext<'_>, path: &Path, rules: &str) -> Result<()> {
    ctx.writer.write(path, &generated_markdown(rules))
}

/// Render and write an MCP config file.
///
/// An existing file that cannot be parsed is replaced after a warning.
pub(crate) fn write_mcp(
    ctx: &mut ApplyContext<'_>,
    path: &Path,
    formatter: &dyn McpFormatter,
    servers: &McpServerMap,
) -> Result<()> {
    let existing = ctx.writer.read_existing(path)?;

    let content = match formatter.render(existing.as_deref(), servers, ctx.mcp_strategy) {
        Ok(content) => content,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Existing MCP config is malformed, replacing it"
            );
            formatter.render(None, servers, ctx.mcp_strategy)?
        }
    };

    ctx.writer.write(path, &content)
}
