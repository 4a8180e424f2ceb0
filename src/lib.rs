//! Ruler - centralised AI agent rules
//!
//! Keeps one set of instruction files and MCP server declarations in a
//! `.ruler` directory and writes them into the native files of each AI
//! coding assistant. Every generated file can be reverted: overwritten
//! files are backed up to `<path>.bak` and restored from there.

pub mod agent_ids;
pub mod agents;
pub mod apply;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod gitignore;
pub mod glob;
pub mod init;
pub mod mcp;
pub mod output;
pub mod revert;
pub mod rules;

pub use apply::{ApplyOptions, ApplyResult, apply};
pub use config::{Project, RulerConfig};
pub use error::RulerError;
pub use revert::{RevertOptions, RevertResult, revert};
