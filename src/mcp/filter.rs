//! Capability-based MCP server filtering
//!
//! Adapts the canonical server list to what one agent can consume.
//! Remote servers are bridged through `mcp-remote` for agents that can
//! only spawn local processes, so users never maintain two declarations.

use super::{McpServerMap, McpServerSpec, Transport};

/// Command used to bridge a remote server into a local process
pub const BRIDGE_COMMAND: &str = "npx";

/// Package that proxies a remote MCP server over stdio
pub const BRIDGE_PACKAGE: &str = "mcp-remote@latest";

/// Transport hints that only make sense for a remote server
const REMOTE_TRANSPORT_TYPES: &[&str] = &["http", "sse", "streamable-http", "remote"];

/// Which MCP transports an agent understands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentCapabilities {
    pub supports_stdio: bool,
    pub supports_remote: bool,
}

impl AgentCapabilities {
    pub fn supports_any(&self) -> bool {
        self.supports_stdio || self.supports_remote
    }
}

/// Servers from `servers` that an agent with `capabilities` can use.
///
/// Returns `None` when the agent supports no transport or nothing is
/// left after filtering; callers treat both as "nothing to write".
pub fn filter_for_agent(
    servers: &McpServerMap,
    capabilities: AgentCapabilities,
) -> Option<McpServerMap> {
    if !capabilities.supports_any() {
        return None;
    }

    let filtered: McpServerMap = servers
        .iter()
        .filter_map(|(name, spec)| {
            adapt(spec, capabilities).map(|adapted| (name.clone(), adapted))
        })
        .collect();

    (!filtered.is_empty()).then_some(filtered)
}

fn adapt(spec: &McpServerSpec, capabilities: AgentCapabilities) -> Option<McpServerSpec> {
    match spec.transport() {
        Transport::Stdio if capabilities.supports_stdio => Some(spec.clone()),
        Transport::Remote if capabilities.supports_remote => Some(spec.clone()),
        Transport::Remote if capabilities.supports_stdio => Some(bridge_remote(spec)),
        Transport::Stdio | Transport::Remote => None,
        Transport::Mixed => {
            tracing::warn!("Skipping MCP server with both `command` and `url`");
            None
        }
        Transport::Unspecified => None,
    }
}

/// Wrap a remote server in an `npx mcp-remote <url>` process, keeping
/// every other field of the original.
fn bridge_remote(spec: &McpServerSpec) -> McpServerSpec {
    let url = spec.url.clone().unwrap_or_default();

    let transport_type = spec
        .transport_type
        .clone()
        .filter(|t| !REMOTE_TRANSPORT_TYPES.contains(&t.to_ascii_lowercase().as_str()));

    McpServerSpec {
        command: Some(BRIDGE_COMMAND.to_string()),
        args: vec!["-y".to_string(), BRIDGE_PACKAGE.to_string(), url],
        env: spec.env.clone(),
        url: None,
        headers: spec.headers.clone(),
        transport_type,
        extra: spec.extra.clone(),
    }
}
