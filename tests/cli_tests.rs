//! End-to-End CLI Tests for Ruler
//!
//! These tests run the binary against temporary projects and check both
//! its output and the resulting file system.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn ruler_cmd() -> Command {
    let mut cmd = Command::cargo_bin("ruler").unwrap();
    // Keep a developer's global config out of the tests
    cmd.env("XDG_CONFIG_HOME", "/nonexistent-ruler-test-config");
    cmd
}

fn setup_project(temp_dir: &TempDir) {
    let ruler_dir = temp_dir.path().join(".ruler");
    fs::create_dir_all(&ruler_dir).unwrap();
    fs::write(ruler_dir.join("AGENTS.md"), "# Test Agent Instructions").unwrap();
    fs::write(ruler_dir.join("style.md"), "Use four spaces.").unwrap();
}

fn read(root: &Path, path: &str) -> String {
    fs::read_to_string(root.join(path)).unwrap()
}

// =============================================================================
// INIT COMMAND TESTS
// =============================================================================

#[test]
fn test_cli_init_creates_files() {
    let temp_dir = TempDir::new().unwrap();

    ruler_cmd()
        .arg("init")
        .arg("--project-root")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialization complete"));

    assert!(temp_dir.path().join(".ruler/AGENTS.md").exists());
    assert!(temp_dir.path().join(".ruler/ruler.toml").exists());
    assert!(temp_dir.path().join(".ruler/mcp.json").exists());
}

#[test]
fn test_cli_init_keeps_existing_files() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("init")
        .arg("--project-root")
        .arg(temp_dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(
        read(temp_dir.path(), ".ruler/AGENTS.md"),
        "# Test Agent Instructions"
    );
}

// =============================================================================
// APPLY COMMAND TESTS
// =============================================================================

#[test]
fn test_cli_apply_writes_agent_files() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude,copilot")
        .assert()
        .success()
        .stdout(predicate::str::contains("Apply complete"));

    let claude = read(temp_dir.path(), "CLAUDE.md");
    assert!(claude.starts_with("<!-- Generated by Ruler -->"));
    assert!(claude.contains("<!-- Source: .ruler/AGENTS.md -->"));
    assert!(claude.contains("Use four spaces."));
    assert!(temp_dir.path().join(".github/copilot-instructions.md").exists());
    assert!(!temp_dir.path().join("GEMINI.md").exists());

    let gitignore = read(temp_dir.path(), ".gitignore");
    assert!(gitignore.contains("# START Ruler Generated Files"));
    assert!(gitignore.contains("/CLAUDE.md"));
}

#[test]
fn test_cli_apply_all_agents_by_default() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .assert()
        .success();

    for path in [
        "AGENTS.md",
        "CLAUDE.md",
        "GEMINI.md",
        ".github/copilot-instructions.md",
        ".cursor/rules/ruler_cursor_instructions.mdc",
        ".windsurf/rules/ruler_windsurf_instructions.md",
        "ruler_aider_instructions.md",
        ".aider.conf.yml",
    ] {
        assert!(temp_dir.path().join(path).exists(), "missing {}", path);
    }
}

#[test]
fn test_cli_apply_dry_run() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Would write"));

    assert!(!temp_dir.path().join("CLAUDE.md").exists());
    assert!(!temp_dir.path().join(".gitignore").exists());
}

#[test]
fn test_cli_apply_unknown_agent_fails() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude,bogus")
        .assert()
        .failure()
        .stderr(predicate::str::contains("bogus"));

    assert!(!temp_dir.path().join("CLAUDE.md").exists());
}

#[test]
fn test_cli_apply_without_ruler_dir_fails() {
    let temp_dir = TempDir::new().unwrap();

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--local-only")
        .assert()
        .failure()
        .stderr(predicate::str::contains(".ruler directory not found"));
}

#[test]
fn test_cli_apply_writes_mcp_config() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);
    fs::write(
        temp_dir.path().join(".ruler/mcp.json"),
        r#"{ "mcpServers": { "docs": { "url": "https://example.com/mcp" } } }"#,
    )
    .unwrap();

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("copilot,codex")
        .assert()
        .success();

    let vscode: serde_json::Value =
        serde_json::from_str(&read(temp_dir.path(), ".vscode/mcp.json")).unwrap();
    assert_eq!(vscode["servers"]["docs"]["url"], "https://example.com/mcp");

    let codex = read(temp_dir.path(), ".codex/config.toml");
    assert!(codex.contains("mcp-remote@latest"));
}

#[test]
fn test_cli_apply_verbose_logs_to_stderr() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude")
        .arg("--verbose")
        .assert()
        .success()
        .stderr(predicate::str::contains("Collected rule files"));
}

// =============================================================================
// REVERT COMMAND TESTS
// =============================================================================

#[test]
fn test_cli_revert_restores_project() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);
    fs::write(temp_dir.path().join("CLAUDE.md"), "hand written").unwrap();

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude,cursor")
        .assert()
        .success();

    ruler_cmd()
        .arg("revert")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude,cursor")
        .assert()
        .success()
        .stdout(predicate::str::contains("Revert complete"));

    assert_eq!(read(temp_dir.path(), "CLAUDE.md"), "hand written");
    assert!(!temp_dir.path().join("CLAUDE.md.bak").exists());
    assert!(!temp_dir.path().join(".cursor").exists());
    assert!(!temp_dir.path().join(".gitignore").exists());
}

#[test]
fn test_cli_revert_unknown_agent_is_lenient() {
    let temp_dir = TempDir::new().unwrap();
    setup_project(&temp_dir);

    ruler_cmd()
        .arg("apply")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude")
        .assert()
        .success();

    ruler_cmd()
        .arg("revert")
        .arg("--project-root")
        .arg(temp_dir.path())
        .arg("--agents")
        .arg("claude,bogus")
        .assert()
        .success()
        .stdout(predicate::str::contains("Ignoring unknown agent: bogus"));

    assert!(!temp_dir.path().join("CLAUDE.md").exists());
}

#[test]
fn test_cli_revert_without_ruler_dir_fails() {
    let temp_dir = TempDir::new().unwrap();

    ruler_cmd()
        .arg("revert")
        .arg("--project-root")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains(".ruler directory not found"));
}

// =============================================================================
// HELP
// =============================================================================

#[test]
fn test_cli_help_lists_commands() {
    ruler_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apply"))
        .stdout(predicate::str::contains("revert"))
        .stdout(predicate::str::contains("init"));
}
