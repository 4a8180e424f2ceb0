//! Fatal error kinds
//!
//! Most failures are plain `anyhow` errors with file context attached.
//! The variants here are the ones callers (and tests) need to tell apart.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RulerError {
    /// No `.ruler` directory was found from the start path upwards
    /// (nor in the global config directory when that was allowed).
    #[error(".ruler directory not found (searched from {})", start.display())]
    RulerDirNotFound { start: PathBuf },

    /// `--agents` named agents that do not exist.
    #[error("Unknown agent(s): {}. Valid agents are: {}", names.join(", "), valid.join(", "))]
    UnknownAgents {
        names: Vec<String>,
        valid: Vec<String>,
    },

    /// The source MCP declaration file could not be understood.
    #[error("Invalid MCP config {}: {reason}", path.display())]
    InvalidMcpConfig { path: PathBuf, reason: String },
}
