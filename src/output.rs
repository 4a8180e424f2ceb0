//! Generated file writing, backup and restore
//!
//! The `.bak` sibling of a generated file is the only record of what
//! was there before ruler wrote it. Revert restores from it when it
//! exists and deletes the generated file when it does not.

use anyhow::{Context, Result};
use colored::Colorize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to backed-up files
pub const BACKUP_SUFFIX: &str = ".bak";

/// `<path>.bak`
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(BACKUP_SUFFIX);
    PathBuf::from(name)
}

/// One file written during an apply run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFileRecord {
    pub path: PathBuf,
    /// The path existed before this run first wrote it
    pub had_prior_content: bool,
    /// Where the prior content was saved, if it was
    pub backup_path: Option<PathBuf>,
}

/// Writes generated files for one apply run, taking backups on the way.
///
/// A path is backed up at most once per run, on its first write, so
/// several agents sharing an output file still leave the pre-run
/// content in the backup.
#[derive(Debug)]
pub struct OutputWriter {
    backup: bool,
    dry_run: bool,
    records: Vec<GeneratedFileRecord>,
}

impl OutputWriter {
    pub fn new(backup: bool, dry_run: bool) -> Self {
        Self {
            backup,
            dry_run,
            records: Vec::new(),
        }
    }

    /// Every file written so far, in first-write order
    pub fn records(&self) -> &[GeneratedFileRecord] {
        &self.records
    }

    /// Current content of `path`, if it exists.
    pub fn read_existing(&self, path: &Path) -> Result<Option<String>> {
        if !path.is_file() {
            return Ok(None);
        }
        fs::read_to_string(path)
            .map(Some)
            .with_context(|| format!("Failed to read existing file: {}", path.display()))
    }

    /// Back up (first write only) and write `content` to `path`.
    pub fn write(&mut self, path: &Path, content: &str) -> Result<()> {
        let first_write = !self.records.iter().any(|r| r.path == path);
        let existed = path.exists();

        let mut backup = None;
        if first_write && existed && self.backup {
            let bak = backup_path(path);
            if self.dry_run {
                println!(
                    "  {} Would back up {} to {}",
                    "→".cyan(),
                    path.display(),
                    bak.display()
                );
            } else {
                fs::copy(path, &bak).with_context(|| {
                    format!("Failed to back up {} to {}", path.display(), bak.display())
                })?;
                tracing::debug!(path = %path.display(), backup = %bak.display(), "Backed up file");
            }
            backup = Some(bak);
        }

        if self.dry_run {
            println!("  {} Would write {}", "→".cyan(), path.display());
        } else {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
            fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
            println!("  {} Wrote {}", "✔".green(), path.display());
        }

        if first_write {
            self.records.push(GeneratedFileRecord {
                path: path.to_path_buf(),
                had_prior_content: existed,
                backup_path: backup,
            });
        }

        Ok(())
    }
}

/// What revert did to one path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertAction {
    /// Content came back from `<path>.bak`
    Restored,
    /// No backup existed, so the generated file was deleted
    Removed,
    /// Neither the file nor a backup exists
    Missing,
}

/// Undo one generated file.
pub fn revert_file(path: &Path, keep_backups: bool, dry_run: bool) -> Result<RevertAction> {
    let bak = backup_path(path);

    if bak.is_file() {
        if dry_run {
            println!(
                "  {} Would restore {} from {}",
                "→".cyan(),
                path.display(),
                bak.display()
            );
        } else {
            fs::copy(&bak, path).with_context(|| {
                format!("Failed to restore {} from {}", path.display(), bak.display())
            })?;
            if !keep_backups {
                fs::remove_file(&bak)
                    .with_context(|| format!("Failed to remove backup: {}", bak.display()))?;
            }
            println!("  {} Restored {}", "✔".green(), path.display());
        }
        return Ok(RevertAction::Restored);
    }

    if path.is_file() {
        if dry_run {
            println!("  {} Would remove {}", "→".cyan(), path.display());
        } else {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove file: {}", path.display()))?;
            println!("  {} Removed {}", "✔".green(), path.display());
        }
        return Ok(RevertAction::Removed);
    }

    tracing::debug!(path = %path.display(), "Nothing to revert");
    Ok(RevertAction::Missing)
}

/// Remove `start` and its ancestors while they are empty, stopping
/// below `root`. Returns the number of directories removed.
pub fn prune_empty_dirs(start: &Path, root: &Path, dry_run: bool) -> Result<usize> {
    let mut removed = 0;
    let mut dir = start.to_path_buf();

    while dir.starts_with(root) && dir != root && dir.is_dir() {
        let is_empty = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory: {}", dir.display()))?
            .next()
            .is_none();
        if !is_empty {
            break;
        }

        if dry_run {
            println!("  {} Would remove empty directory {}", "→".cyan(), dir.display());
        } else {
            fs::remove_dir(&dir)
                .with_context(|| format!("Failed to remove directory: {}", dir.display()))?;
            tracing::debug!(dir = %dir.display(), "Removed empty directory");
        }
        removed += 1;

        if !dir.pop() {
            break;
        }
    }

    Ok(removed)
}
