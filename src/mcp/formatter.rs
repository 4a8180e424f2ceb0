//! Agent-specific MCP config serialization
//!
//! Each agent keeps its servers under a different key and entry shape.
//! Formatters render a server map into a complete file, folding in an
//! existing file according to the merge strategy. Unrelated top-level
//! settings in an existing file are always preserved.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use toml::{Table as TomlTable, Value as TomlValue};

use super::{McpServerMap, McpServerSpec};
use crate::config::McpMergeStrategy;

/// `$schema` written into fresh OpenCode configs
pub const OPENCODE_SCHEMA: &str = "https://opencode.ai/config.json";

/// Trait for formatting MCP configuration for different agents
pub trait McpFormatter: Send + Sync {
    /// Render the full file content.
    ///
    /// With `existing` content, `Merge` keeps servers ruler does not know
    /// about while `Overwrite` replaces the server table. Fails if the
    /// existing content cannot be parsed.
    fn render(
        &self,
        existing: Option<&str>,
        servers: &McpServerMap,
        strategy: McpMergeStrategy,
    ) -> Result<String>;
}

// =============================================================================
// JSON formatters
// =============================================================================

/// JSON config with servers under a single top-level key
#[derive(Debug, Clone, Copy)]
pub struct JsonFormatter {
    key: &'static str,
    entry: fn(&McpServerSpec) -> Value,
    schema: Option<&'static str>,
}

impl JsonFormatter {
    /// `{ "mcpServers": { ... } }` (Claude Code, Cursor)
    pub fn standard() -> Self {
        Self {
            key: "mcpServers",
            entry: server_to_json,
            schema: None,
        }
    }

    /// `{ "servers": { ... } }` with explicit `type` (VS Code / Copilot)
    pub fn vscode() -> Self {
        Self {
            key: "servers",
            entry: server_to_vscode_json,
            schema: None,
        }
    }

    /// `{ "mcpServers": { ... } }` with `trust: true` (Gemini CLI settings)
    pub fn gemini() -> Self {
        Self {
            key: "mcpServers",
            entry: server_to_gemini_json,
            schema: None,
        }
    }

    /// `{ "$schema": ..., "mcp": { ... } }` (OpenCode)
    pub fn opencode() -> Self {
        Self {
            key: "mcp",
            entry: server_to_opencode_json,
            schema: Some(OPENCODE_SCHEMA),
        }
    }

    pub fn server_key(&self) -> &'static str {
        self.key
    }
}

impl McpFormatter for JsonFormatter {
    fn render(
        &self,
        existing: Option<&str>,
        servers: &McpServerMap,
        strategy: McpMergeStrategy,
    ) -> Result<String> {
        let mut doc = match existing.filter(|c| !c.trim().is_empty()) {
            Some(content) => match serde_json::from_str::<Value>(content)
                .context("Failed to parse existing MCP config as JSON")?
            {
                Value::Object(map) => map,
                _ => anyhow::bail!("Existing MCP config is not a JSON object"),
            },
            None => Map::new(),
        };

        let mut entries: Map<String, Value> = match strategy {
            McpMergeStrategy::Merge => doc
                .get(self.key)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            McpMergeStrategy::Overwrite => Map::new(),
        };

        for (name, spec) in servers {
            entries.insert(name.clone(), (self.entry)(spec));
        }

        doc.insert(self.key.to_string(), Value::Object(sorted(entries)));

        if let Some(schema) = self.schema
            && !doc.contains_key("$schema")
        {
            let mut with_schema = Map::new();
            with_schema.insert("$schema".to_string(), json!(schema));
            with_schema.extend(doc);
            doc = with_schema;
        }

        let mut out = serde_json::to_string_pretty(&Value::Object(doc))
            .context("Failed to serialize MCP config")?;
        out.push('\n');
        Ok(out)
    }
}

/// Rebuild a JSON object in lexicographic key order.
fn sorted(map: Map<String, Value>) -> Map<String, Value> {
    let sorted: BTreeMap<String, Value> = map.into_iter().collect();
    sorted.into_iter().collect()
}

/// Convert a server into the common JSON entry shape
fn server_to_json(config: &McpServerSpec) -> Value {
    let mut obj = Map::new();

    if let Some(ref cmd) = config.command {
        obj.insert("command".to_string(), json!(cmd));
    }

    if !config.args.is_empty() {
        obj.insert("args".to_string(), json!(config.args));
    }

    if !config.env.is_empty() {
        obj.insert("env".to_string(), json!(config.env));
    }

    if let Some(ref url) = config.url {
        obj.insert("url".to_string(), json!(url));
    }

    if !config.headers.is_empty() {
        obj.insert("headers".to_string(), json!(config.headers));
    }

    if let Some(ref transport) = config.transport_type {
        obj.insert("type".to_string(), json!(transport));
    }

    insert_extra(&mut obj, config);
    Value::Object(obj)
}

/// Copy undeclared fields; named fields win on a clash.
fn insert_extra(obj: &mut Map<String, Value>, config: &McpServerSpec) {
    for (key, value) in &config.extra {
        if !obj.contains_key(key) {
            obj.insert(key.clone(), value.clone());
        }
    }
}

fn server_to_vscode_json(config: &McpServerSpec) -> Value {
    let mut value = server_to_json(config);
    if let Some(obj) = value.as_object_mut()
        && !obj.contains_key("type")
    {
        let transport = if config.command.is_some() { "stdio" } else { "http" };
        obj.insert("type".to_string(), json!(transport));
    }
    value
}

fn server_to_gemini_json(config: &McpServerSpec) -> Value {
    let mut value = server_to_json(config);
    // Gemini requires trust: true for non-interactive execution
    if let Some(obj) = value.as_object_mut() {
        obj.insert("trust".to_string(), json!(true));
    }
    value
}

/// OpenCode: `{ "type": "local", "command": [cmd, ...args] }` or `{ "type": "remote", "url": ... }`
fn server_to_opencode_json(config: &McpServerSpec) -> Value {
    let mut obj = Map::new();

    if let Some(ref url) = config.url {
        obj.insert("type".to_string(), json!("remote"));
        obj.insert("url".to_string(), json!(url));
        if !config.headers.is_empty() {
            obj.insert("headers".to_string(), json!(config.headers));
        }
    } else {
        obj.insert("type".to_string(), json!("local"));

        let mut command_parts = Vec::new();
        if let Some(ref cmd) = config.command {
            command_parts.push(cmd.clone());
        }
        command_parts.extend(config.args.iter().cloned());
        obj.insert("command".to_string(), json!(command_parts));

        if !config.env.is_empty() {
            obj.insert("environment".to_string(), json!(config.env));
        }
    }

    obj.insert("enabled".to_string(), json!(true));
    insert_extra(&mut obj, config);
    Value::Object(obj)
}

// =============================================================================
// Codex CLI (TOML)
// =============================================================================

/// Formatter for OpenAI Codex CLI (`.codex/config.toml`)
/// Format: `[mcp_servers.<name>]` tables
#[derive(Debug, Clone, Copy, Default)]
pub struct CodexTomlFormatter;

impl McpFormatter for CodexTomlFormatter {
    fn render(
        &self,
        existing: Option<&str>,
        servers: &McpServerMap,
        strategy: McpMergeStrategy,
    ) -> Result<String> {
        let mut doc = match existing.filter(|c| !c.trim().is_empty()) {
            Some(content) => {
                let parsed: TomlValue = toml::from_str(content)
                    .context("Failed to parse existing Codex config as TOML")?;
                parsed.as_table().cloned().unwrap_or_default()
            }
            None => TomlTable::new(),
        };

        let mut entries = match strategy {
            McpMergeStrategy::Merge => doc
                .get("mcp_servers")
                .and_then(TomlValue::as_table)
                .cloned()
                .unwrap_or_default(),
            McpMergeStrategy::Overwrite => TomlTable::new(),
        };

        for (name, spec) in servers {
            entries.insert(name.clone(), server_to_codex_toml(spec));
        }

        doc.insert("mcp_servers".to_string(), TomlValue::Table(entries));

        toml::to_string_pretty(&TomlValue::Table(doc)).context("Failed to serialize Codex config")
    }
}

fn string_table<'a>(pairs: impl Iterator<Item = (&'a String, &'a String)>) -> TomlValue {
    TomlValue::Table(
        pairs
            .map(|(k, v)| (k.clone(), TomlValue::String(v.clone())))
            .collect(),
    )
}

/// Convert a server into a Codex CLI TOML server table
fn server_to_codex_toml(config: &McpServerSpec) -> TomlValue {
    let mut table = TomlTable::new();

    if let Some(ref cmd) = config.command {
        table.insert("command".to_string(), TomlValue::String(cmd.clone()));
    }

    if !config.args.is_empty() {
        table.insert(
            "args".to_string(),
            TomlValue::Array(config.args.iter().cloned().map(TomlValue::String).collect()),
        );
    }

    if !config.env.is_empty() {
        table.insert("env".to_string(), string_table(config.env.iter()));
    }

    if let Some(ref url) = config.url {
        table.insert("url".to_string(), TomlValue::String(url.clone()));
    }

    if !config.headers.is_empty() {
        // Codex MCP schema uses `http_headers` for static headers.
        table.insert("http_headers".to_string(), string_table(config.headers.iter()));
    }

    for (key, value) in &config.extra {
        if table.contains_key(key) {
            continue;
        }
        // TOML has no null
        match TomlValue::deserialize(value.clone()) {
            Ok(converted) => {
                table.insert(key.clone(), converted);
            }
            Err(e) => tracing::warn!(field = %key, error = %e, "Dropping MCP field with no TOML form"),
        }
    }

    TomlValue::Table(table)
}
