//! MCP (Model Context Protocol) server definitions
//!
//! Servers are declared once in `.ruler/mcp.json` (and optionally in
//! `[mcp_servers]` of `ruler.toml`), filtered per agent by transport
//! capability, then written out in each agent's native schema.

pub mod filter;
pub mod formatter;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::{MCP_FILE_NAME, RulerConfig};
use crate::error::RulerError;

pub use filter::{AgentCapabilities, filter_for_agent};
pub use formatter::McpFormatter;

/// Servers keyed by name, in name order
pub type McpServerMap = BTreeMap<String, McpServerSpec>;

/// One MCP server declaration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct McpServerSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,

    /// Explicit transport hint (`stdio`, `http`, `sse`, ...)
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none"
    )]
    pub transport_type: Option<String>,

    /// Every other field (`cwd`, `timeout`, `alwaysAllow`, ...), passed
    /// through to the agent's file as declared
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Transport inferred from which of `command` / `url` is set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Launched as a local process
    Stdio,
    /// Reached over HTTP
    Remote,
    /// Both `command` and `url`: ambiguous, never emitted
    Mixed,
    /// Neither is set
    Unspecified,
}

impl McpServerSpec {
    pub fn transport(&self) -> Transport {
        match (self.command.is_some(), self.url.is_some()) {
            (true, false) => Transport::Stdio,
            (false, true) => Transport::Remote,
            (true, true) => Transport::Mixed,
            (false, false) => Transport::Unspecified,
        }
    }
}

/// On-disk shape of `mcp.json`
#[derive(Debug, Default, Deserialize)]
struct McpFile {
    #[serde(default, rename = "mcpServers")]
    mcp_servers: McpServerMap,
}

/// Parse the contents of an `mcp.json` file.
pub fn parse_mcp_file(content: &str) -> Result<McpServerMap, serde_json::Error> {
    let file: McpFile = serde_json::from_str(content)?;
    Ok(file.mcp_servers)
}

/// Load the canonical server list for a project.
///
/// A missing `mcp.json` is not an error. Servers from `ruler.toml`
/// replace same-named entries from the JSON file.
pub fn load_source_servers(ruler_dir: &Path, config: &RulerConfig) -> Result<McpServerMap> {
    let path = ruler_dir.join(MCP_FILE_NAME);

    let mut servers = if path.is_file() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read MCP config: {}", path.display()))?;
        parse_mcp_file(&content).map_err(|e| RulerError::InvalidMcpConfig {
            path: path.clone(),
            reason: e.to_string(),
        })?
    } else {
        McpServerMap::new()
    };

    for (name, spec) in &config.mcp_servers {
        servers.insert(name.clone(), spec.clone());
    }

    tracing::debug!(count = servers.len(), "Loaded MCP servers");
    Ok(servers)
}
