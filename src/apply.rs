//! Apply: propagate `.ruler` rules and MCP servers into every selected agent

use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

use crate::agents::{self, Agent, ApplyContext};
use crate::config::{McpMergeStrategy, Project, RulerConfig};
use crate::error::RulerError;
use crate::gitignore;
use crate::mcp::{self, McpServerMap};
use crate::output::OutputWriter;
use crate::rules::{self, CollectOptions};

/// Options for the apply operation
#[derive(Debug, Default)]
pub struct ApplyOptions {
    /// Directory generated files are written under
    pub project_root: PathBuf,
    /// Explicit `ruler.toml`
    pub config_path: Option<PathBuf>,
    /// Agents named on the command line
    pub agents: Option<Vec<String>>,
    /// Skip MCP propagation entirely
    pub no_mcp: bool,
    /// Replace agents' server tables instead of merging
    pub mcp_overwrite: bool,
    /// Leave `.gitignore` alone
    pub no_gitignore: bool,
    /// Do not create `.bak` files
    pub no_backup: bool,
    /// Show what would be done without making changes
    pub dry_run: bool,
    /// Skip the global config directory fallback
    pub local_only: bool,
}

/// Result of an apply run
#[derive(Debug, Default)]
pub struct ApplyResult {
    /// Distinct files written
    pub written: usize,
    /// Files whose prior content went to a `.bak`
    pub backed_up: usize,
    /// Agents applied successfully
    pub agents: usize,
    /// Agents that failed
    pub errors: usize,
}

/// Run apply. Fails before touching disk when the ruler directory is
/// missing or `--agents` names an unknown agent.
pub fn apply(options: &ApplyOptions) -> Result<ApplyResult> {
    let project = Project::load(
        &options.project_root,
        options.config_path.as_deref(),
        options.local_only,
    )?;

    let selection = agents::select_agents(options.agents.as_deref(), &project.config);
    if !selection.unknown.is_empty() {
        return Err(RulerError::UnknownAgents {
            names: selection.unknown,
            valid: agents::agent_identifiers(),
        }
        .into());
    }

    let documents = rules::collect(
        &project.ruler_dir,
        &CollectOptions::from(&project.config.rules),
    )?;
    if documents.is_empty() {
        tracing::warn!(dir = %project.ruler_dir.display(), "No rule files found");
    }
    tracing::debug!(count = documents.len(), "Collected rule files");
    let concatenated = rules::concatenate(&documents, &project.project_root);

    let servers = if options.no_mcp {
        McpServerMap::new()
    } else {
        mcp::load_source_servers(&project.ruler_dir, &project.config)?
    };

    if options.dry_run {
        println!("{}", "Running in dry-run mode\n".cyan());
    }

    let mut writer = OutputWriter::new(!options.no_backup, options.dry_run);
    let mut result = ApplyResult::default();

    for agent in &selection.agents {
        println!("{} {}", "➤".cyan(), agent.name().bold());

        let agent_config = project.config.agent_config(agent.identifier());
        let agent_servers =
            servers_for_agent(agent.as_ref(), &project.config, &servers, options.no_mcp);
        let mut ctx = ApplyContext {
            writer: &mut writer,
            mcp_strategy: if options.mcp_overwrite {
                McpMergeStrategy::Overwrite
            } else {
                project.config.mcp_strategy_for(agent.identifier())
            },
        };

        match agent.apply_ruler_config(
            &concatenated,
            &project.project_root,
            agent_servers.as_ref(),
            agent_config,
            &mut ctx,
        ) {
            Ok(()) => result.agents += 1,
            Err(e) => {
                tracing::error!(agent = %agent.identifier(), error = %e, "Failed to apply");
                println!("  {} {}: {:#}", "✘".red(), agent.name(), e);
                result.errors += 1;
            }
        }
    }

    let records = writer.records();
    result.written = records.len();
    result.backed_up = records.iter().filter(|r| r.backup_path.is_some()).count();

    if !options.no_gitignore && project.config.gitignore.enabled && !records.is_empty() {
        println!("\n{}", "➤ Updating .gitignore".cyan().bold());
        let entries: Vec<String> = records
            .iter()
            .filter_map(|r| gitignore::entry_for(&r.path, &project.project_root))
            .collect();
        gitignore::update_gitignore(&project.project_root, &entries, options.dry_run)?;
    }

    Ok(result)
}

/// The servers `agent` should receive, or `None` for "leave its MCP file alone".
pub(crate) fn servers_for_agent(
    agent: &dyn Agent,
    config: &RulerConfig,
    servers: &McpServerMap,
    no_mcp: bool,
) -> Option<McpServerMap> {
    if no_mcp || !config.mcp_enabled_for(agent.identifier()) {
        return None;
    }
    mcp::filter_for_agent(servers, agent.capabilities())
}
