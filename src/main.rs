//! Ruler CLI
//!
//! Command-line interface for applying and reverting centralised agent rules.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use ruler::{ApplyOptions, RevertOptions, init};

#[derive(Parser)]
#[command(name = "ruler")]
#[command(
    author,
    version,
    about = "Apply one set of AI agent rules and MCP servers to every coding assistant"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a .ruler directory with starter files
    Init {
        /// Project root directory (default: current directory)
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Initialize the global config directory instead
        #[arg(long)]
        global: bool,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,
    },

    /// Write rules and MCP servers into each agent's files
    Apply {
        /// Project root directory (default: current directory)
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Comma-separated agents to apply (e.g., claude,copilot)
        #[arg(short, long, value_delimiter = ',')]
        agents: Option<Vec<String>>,

        /// Path to ruler.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Do not propagate MCP servers
        #[arg(long)]
        no_mcp: bool,

        /// Replace agents' MCP servers instead of merging
        #[arg(long)]
        mcp_overwrite: bool,

        /// Do not update .gitignore
        #[arg(long)]
        no_gitignore: bool,

        /// Do not create .bak files
        #[arg(long)]
        no_backup: bool,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,

        /// Only use a .ruler directory found from the project root
        #[arg(long)]
        local_only: bool,

        /// Show debug output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Undo the changes made by apply
    Revert {
        /// Project root directory (default: current directory)
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Comma-separated agents to revert
        #[arg(short, long, value_delimiter = ',')]
        agents: Option<Vec<String>>,

        /// Path to ruler.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep .bak files after restoring
        #[arg(long)]
        keep_backups: bool,

        /// Show what would be done without making changes
        #[arg(long)]
        dry_run: bool,

        /// Only use a .ruler directory found from the project root
        #[arg(long)]
        local_only: bool,

        /// Show debug output
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let verbose = match &cli.command {
        Commands::Apply { verbose, .. } | Commands::Revert { verbose, .. } => *verbose,
        Commands::Init { .. } => false,
    };
    init_tracing(verbose);

    match cli.command {
        Commands::Init {
            project_root,
            global,
            force,
        } => {
            let project_root = resolve_root(project_root)?;
            let ruler_dir = init::target_dir(&project_root, global)?;

            println!("{}", "Initializing ruler...\n".cyan());
            init::init(&ruler_dir, force)?;

            println!("\n{}", "✨ Initialization complete!".green().bold());
            println!(
                "\nNext steps:\n  1. Edit {} with your project instructions\n  2. Run {} to propagate them",
                ruler_dir.join("AGENTS.md").display().to_string().cyan(),
                "ruler apply".cyan()
            );
        }

        Commands::Apply {
            project_root,
            agents,
            config,
            no_mcp,
            mcp_overwrite,
            no_gitignore,
            no_backup,
            dry_run,
            local_only,
            verbose: _,
        } => {
            let options = ApplyOptions {
                project_root: resolve_root(project_root)?,
                config_path: config,
                agents,
                no_mcp,
                mcp_overwrite,
                no_gitignore,
                no_backup,
                dry_run,
                local_only,
            };

            println!("{}", "➤ Applying rules".cyan().bold());
            let result = ruler::apply(&options)?;

            println!("\n{}", "✨ Apply complete!".green().bold());
            println!(
                "  Agents: {}, Files written: {}, Backed up: {}, Errors: {}",
                result.agents.to_string().green(),
                result.written.to_string().green(),
                result.backed_up.to_string().yellow(),
                if result.errors > 0 {
                    result.errors.to_string().red()
                } else {
                    result.errors.to_string().dimmed()
                }
            );

            if result.errors > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }

        Commands::Revert {
            project_root,
            agents,
            config,
            keep_backups,
            dry_run,
            local_only,
            verbose: _,
        } => {
            let options = RevertOptions {
                project_root: resolve_root(project_root)?,
                config_path: config,
                agents,
                keep_backups,
                dry_run,
                local_only,
            };

            println!("{}", "➤ Reverting generated files".cyan().bold());
            let result = ruler::revert(&options)?;

            println!("\n{}", "✨ Revert complete!".green().bold());
            println!(
                "  Restored: {}, Removed: {}, Backups removed: {}, Directories removed: {}",
                result.restored.to_string().green(),
                result.removed.to_string().green(),
                result.backups_removed.to_string().dimmed(),
                result.directories_removed.to_string().dimmed()
            );
            if result.gitignore_cleaned {
                println!("  Cleaned .gitignore");
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Diagnostics go to stderr so stdout stays the user-facing report
fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_root(project_root: Option<PathBuf>) -> Result<PathBuf> {
    match project_root {
        Some(path) => Ok(path),
        None => env::current_dir().context("Failed to determine current directory"),
    }
}
