//! Aider: a dedicated instructions file listed under `read:` in
//! `.aider.conf.yml`, together with the source rule files it came from

use anyhow::{Context, Result};
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

use super::{Agent, ApplyContext, config_path_or, write_instructions};
use crate::config::AgentConfig;
use crate::mcp::McpServerMap;
use crate::rules::{display_path, source_paths};

const CONF_FILE: &str = ".aider.conf.yml";

pub struct AiderAgent;

impl AiderAgent {
    fn conf_path(&self, project_root: &Path, config: Option<&AgentConfig>) -> PathBuf {
        config_path_or(project_root, config, CONF_FILE)
    }
}

impl Agent for AiderAgent {
    fn identifier(&self) -> &'static str {
        "aider"
    }

    fn name(&self) -> &'static str {
        "Aider"
    }

    fn default_output_path(&self, project_root: &Path) -> PathBuf {
        project_root.join("ruler_aider_instructions.md")
    }

    fn output_paths(&self, project_root: &Path, config: Option<&AgentConfig>) -> Vec<PathBuf> {
        vec![
            self.instructions_path(project_root, config),
            self.conf_path(project_root, config),
        ]
    }

    fn apply_ruler_config(
        &self,
        rules: &str,
        project_root: &Path,
        _mcp: Option<&McpServerMap>,
        config: Option<&AgentConfig>,
        ctx: &mut ApplyContext<'_>,
    ) -> Result<()> {
        let instructions = self.instructions_path(project_root, config);
        write_instructions(ctx, &instructions, rules)?;

        let mut read = vec![display_path(&instructions, project_root)];
        read.extend(
            source_paths(rules, project_root)
                .iter()
                .map(|p| display_path(p, project_root)),
        );

        let conf = self.conf_path(project_root, config);
        let existing = ctx.writer.read_existing(&conf)?;
        let content = match render_conf(existing.as_deref(), &read) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(
                    path = %conf.display(),
                    error = %e,
                    "Existing aider config is malformed, replacing it"
                );
                render_conf(None, &read)?
            }
        };
        ctx.writer.write(&conf, &content)
    }
}

/// Add `entries` to the `read:` list, keeping every other setting.
fn render_conf(existing: Option<&str>, entries: &[String]) -> Result<String> {
    let mut doc = match existing.filter(|c| !c.trim().is_empty()) {
        Some(content) => match serde_yaml::from_str::<Value>(content)
            .context("Failed to parse existing aider config as YAML")?
        {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => anyhow::bail!("Existing aider config is not a YAML mapping"),
        },
        None => Mapping::new(),
    };

    let key = Value::String("read".to_string());
    let mut read: Vec<String> = match doc.get(&key) {
        Some(Value::Sequence(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    };
    for entry in entries {
        if !read.contains(entry) {
            read.push(entry.clone());
        }
    }

    doc.insert(
        key,
        Value::Sequence(read.into_iter().map(Value::String).collect()),
    );

    serde_yaml::to_string(&Value::Mapping(doc)).context("Failed to serialize aider config")
}
