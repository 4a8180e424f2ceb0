//! Gitignore management
//!
//! Keeps generated agent files out of version control through a block
//! of `.gitignore` that ruler owns exclusively.

use anyhow::{Context, Result};
use colored::Colorize;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Text between `# START ` / `# END ` on the delimiter lines
pub const MARKER: &str = "Ruler Generated Files";

const GITIGNORE_FILE: &str = ".gitignore";

fn start_marker() -> String {
    format!("# START {}", MARKER)
}

fn end_marker() -> String {
    format!("# END {}", MARKER)
}

/// Gitignore entry for a generated file: root-anchored, forward slashes.
///
/// `None` for paths outside the project root.
pub fn entry_for(path: &Path, project_root: &Path) -> Option<String> {
    let relative = path.strip_prefix(project_root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    (!parts.is_empty()).then(|| format!("/{}", parts.join("/")))
}

/// Update the managed block with `entries`.
///
/// Entries already in the block are kept, so applying a subset of
/// agents never drops another agent's files.
pub fn update_gitignore(project_root: &Path, entries: &[String], dry_run: bool) -> Result<()> {
    let gitignore_path = project_root.join(GITIGNORE_FILE);
    let start_marker = start_marker();
    let end_marker = end_marker();

    let existing_content = if gitignore_path.exists() {
        fs::read_to_string(&gitignore_path)
            .with_context(|| format!("Failed to read .gitignore: {}", gitignore_path.display()))?
    } else {
        String::new()
    };

    let mut all_entries: BTreeSet<String> =
        managed_entries(&existing_content, &start_marker, &end_marker);
    all_entries.extend(entries.iter().cloned());

    let mut managed_section = String::new();
    managed_section.push_str(&start_marker);
    managed_section.push('\n');
    for entry in &all_entries {
        managed_section.push_str(entry);
        managed_section.push('\n');
    }
    managed_section.push_str(&end_marker);
    managed_section.push('\n');

    // User content is kept byte for byte; a new block goes after one
    // separating newline that revert strips again.
    let new_content = match split_managed(&existing_content, &start_marker, &end_marker) {
        Some((before, _, after)) => format!("{}{}{}", before, managed_section, after),
        None if existing_content.is_empty() => managed_section,
        None => format!("{}\n{}", existing_content, managed_section),
    };

    if dry_run {
        println!(
            "  {} Would update .gitignore with {} entries",
            "→".cyan(),
            all_entries.len()
        );
        return Ok(());
    }

    if new_content == existing_content {
        tracing::debug!("Managed .gitignore block already up to date");
        return Ok(());
    }

    fs::write(&gitignore_path, new_content)
        .with_context(|| format!("Failed to write .gitignore: {}", gitignore_path.display()))?;

    println!(
        "  {} Updated .gitignore with {} managed entries",
        "✔".green(),
        all_entries.len()
    );

    Ok(())
}

/// Strip the managed block. A file left blank is deleted.
///
/// Returns whether a block was found. A missing `.gitignore` is not an
/// error.
pub fn remove_managed_block(project_root: &Path, dry_run: bool) -> Result<bool> {
    let gitignore_path = project_root.join(GITIGNORE_FILE);
    if !gitignore_path.is_file() {
        return Ok(false);
    }

    let start_marker = start_marker();
    let end_marker = end_marker();

    let content = fs::read_to_string(&gitignore_path)
        .with_context(|| format!("Failed to read .gitignore: {}", gitignore_path.display()))?;
    let Some((before, _, after)) = split_managed(&content, &start_marker, &end_marker) else {
        return Ok(false);
    };

    // A trailing block was appended after a separator newline
    let before = match before.strip_suffix('\n') {
        Some(stripped) if after.is_empty() => stripped,
        _ => before,
    };
    let remaining = format!("{}{}", before, after);

    if dry_run {
        println!("  {} Would remove ruler block from .gitignore", "→".cyan());
        return Ok(true);
    }

    if remaining.trim().is_empty() {
        fs::remove_file(&gitignore_path).with_context(|| {
            format!("Failed to remove .gitignore: {}", gitignore_path.display())
        })?;
        println!("  {} Removed .gitignore (only contained ruler entries)", "✔".green());
    } else {
        fs::write(&gitignore_path, remaining).with_context(|| {
            format!("Failed to write .gitignore: {}", gitignore_path.display())
        })?;
        println!("  {} Removed ruler block from .gitignore", "✔".green());
    }

    Ok(true)
}

/// Non-comment lines inside the managed block
fn managed_entries(content: &str, start_marker: &str, end_marker: &str) -> BTreeSet<String> {
    let mut entries = BTreeSet::new();
    let mut in_managed_section = false;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == start_marker {
            in_managed_section = true;
        } else if trimmed == end_marker {
            in_managed_section = false;
        } else if in_managed_section && !trimmed.is_empty() && !trimmed.starts_with('#') {
            entries.insert(trimmed.to_string());
        }
    }

    entries
}

/// Split content around the first managed block: text before the start
/// line, the block itself, and text after the end line.
///
/// A block missing its end marker runs to the end of the file.
fn split_managed<'a>(
    content: &'a str,
    start_marker: &str,
    end_marker: &str,
) -> Option<(&'a str, &'a str, &'a str)> {
    let mut offset = 0;
    let mut block_start = None;

    for line in content.split_inclusive('\n') {
        let line_end = offset + line.len();
        match block_start {
            None if line.trim() == start_marker => block_start = Some(offset),
            Some(start) if line.trim() == end_marker => {
                return Some((&content[..start], &content[start..line_end], &content[line_end..]));
            }
            _ => {}
        }
        offset = line_end;
    }

    block_start.map(|start| (&content[..start], &content[start..], ""))
}
