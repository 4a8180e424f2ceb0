//! Configuration parsing for ruler
//!
//! Handles locating the `.ruler` source directory and parsing the
//! optional `ruler.toml` that tunes agent selection, output paths,
//! rule filtering and MCP propagation.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::agent_ids;
use crate::error::RulerError;
use crate::mcp::McpServerSpec;

/// Name of the source directory holding rule files
pub const RULER_DIR_NAME: &str = ".ruler";

/// Default configuration file name (inside the ruler directory)
pub const CONFIG_FILE_NAME: &str = "ruler.toml";

/// Source MCP declaration file name (inside the ruler directory)
pub const MCP_FILE_NAME: &str = "mcp.json";

/// Root configuration structure
#[derive(Debug, Default, Deserialize)]
pub struct RulerConfig {
    /// Agents used when `--agents` is not given
    #[serde(default)]
    pub default_agents: Vec<String>,

    /// Per-agent settings, keyed by agent identifier (aliases allowed)
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    /// Rule file filtering
    #[serde(default)]
    pub rules: RulesConfig,

    /// Global MCP settings
    #[serde(default)]
    pub mcp: McpConfig,

    /// Gitignore management settings
    #[serde(default)]
    pub gitignore: GitignoreConfig,

    /// MCP servers declared inline; merged over `mcp.json` by name
    #[serde(default)]
    pub mcp_servers: BTreeMap<String, McpServerSpec>,
}

/// Configuration for a single agent
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentConfig {
    /// `Some(false)` excludes the agent unless named on the command line
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Override for the instructions file
    #[serde(default)]
    pub output_path: Option<PathBuf>,

    /// Same as `output_path`; wins when both are set
    #[serde(default)]
    pub output_path_instructions: Option<PathBuf>,

    /// Override for the secondary config file (MCP settings, aider yml)
    #[serde(default)]
    pub output_path_config: Option<PathBuf>,

    /// Per-agent MCP settings
    #[serde(default)]
    pub mcp: Option<AgentMcpConfig>,
}

impl AgentConfig {
    /// Resolved instructions path override, if any
    pub fn instructions_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.output_path_instructions
            .as_ref()
            .or(self.output_path.as_ref())
            .map(|p| project_root.join(p))
    }

    /// Resolved secondary config path override, if any
    pub fn config_path(&self, project_root: &Path) -> Option<PathBuf> {
        self.output_path_config
            .as_ref()
            .map(|p| project_root.join(p))
    }
}

/// Per-agent MCP overrides
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AgentMcpConfig {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub merge_strategy: Option<McpMergeStrategy>,
}

/// Rule collection settings
#[derive(Debug, Default, Deserialize)]
pub struct RulesConfig {
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub merge_strategy: MergeStrategy,
}

/// How rule files are selected for concatenation
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    /// Every rule file that passes the path filter
    #[default]
    All,
    /// Only `AGENTS.md` and `rules/*.mdc` files with `alwaysApply: true`
    Cursor,
}

/// Global MCP settings
#[derive(Debug, Deserialize)]
pub struct McpConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub merge_strategy: McpMergeStrategy,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            merge_strategy: McpMergeStrategy::default(),
        }
    }
}

/// How generated MCP servers combine with an existing agent config file
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum McpMergeStrategy {
    /// Keep servers already present that ruler does not manage
    #[default]
    Merge,
    /// Replace the server table entirely
    Overwrite,
}

/// Gitignore management configuration
#[derive(Debug, Deserialize)]
pub struct GitignoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for GitignoreConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

impl RulerConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RulerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Look up an agent's settings by canonical identifier.
    pub fn agent_config(&self, agent_id: &str) -> Option<&AgentConfig> {
        self.agents.iter().find_map(|(key, config)| {
            let canonical = agent_ids::canonical_agent_id(key).unwrap_or(key.as_str());
            (canonical == agent_id).then_some(config)
        })
    }

    fn agent_mcp(&self, agent_id: &str) -> Option<&AgentMcpConfig> {
        self.agent_config(agent_id).and_then(|c| c.mcp.as_ref())
    }

    /// Whether MCP servers are propagated to `agent_id`: the agent's
    /// `[agents.X.mcp]` setting, else the global `[mcp]` one.
    pub fn mcp_enabled_for(&self, agent_id: &str) -> bool {
        self.agent_mcp(agent_id)
            .and_then(|m| m.enabled)
            .unwrap_or(self.mcp.enabled)
    }

    pub fn mcp_strategy_for(&self, agent_id: &str) -> McpMergeStrategy {
        self.agent_mcp(agent_id)
            .and_then(|m| m.merge_strategy)
            .unwrap_or(self.mcp.merge_strategy)
    }
}

/// Global configuration directory: `$XDG_CONFIG_HOME/ruler`, else `~/.config/ruler`.
pub fn global_config_dir() -> Option<PathBuf> {
    match env::var_os("XDG_CONFIG_HOME") {
        Some(xdg) if !xdg.is_empty() => Some(PathBuf::from(xdg).join("ruler")),
        _ => dirs::home_dir().map(|home| home.join(".config").join("ruler")),
    }
}

/// Find the `.ruler` directory by searching up from `start_dir`.
///
/// When nothing is found and `check_global` is set, the global
/// configuration directory is used if it exists.
pub fn find_ruler_dir(start_dir: &Path, check_global: bool) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let candidate = current.join(RULER_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }

        if !current.pop() {
            break;
        }
    }

    if check_global {
        return global_config_dir().filter(|dir| dir.is_dir());
    }

    None
}

/// A project ready to be applied or reverted
#[derive(Debug)]
pub struct Project {
    /// Directory generated files are written relative to
    pub project_root: PathBuf,
    /// The `.ruler` (or global) source directory
    pub ruler_dir: PathBuf,
    pub config: RulerConfig,
}

impl Project {
    /// Locate the ruler directory and load its configuration.
    ///
    /// Fails before anything is touched when no ruler directory exists.
    pub fn load(
        project_root: &Path,
        explicit_config: Option<&Path>,
        local_only: bool,
    ) -> Result<Self> {
        let ruler_dir = find_ruler_dir(project_root, !local_only).ok_or_else(|| {
            RulerError::RulerDirNotFound {
                start: project_root.to_path_buf(),
            }
        })?;

        let config_path = match explicit_config {
            Some(path) => Some(path.to_path_buf()),
            None => Some(ruler_dir.join(CONFIG_FILE_NAME)).filter(|p| p.is_file()),
        };

        let config = match &config_path {
            Some(path) => RulerConfig::load(path)?,
            None => RulerConfig::default(),
        };

        tracing::debug!(
            ruler_dir = %ruler_dir.display(),
            config = ?config_path,
            "Loaded project configuration"
        );

        Ok(Self {
            project_root: project_root.to_path_buf(),
            ruler_dir,
            config,
        })
    }
}
