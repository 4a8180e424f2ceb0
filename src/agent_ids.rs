//! Shared agent identifier normalization.
//!
//! Centralizes alias handling so CLI filters, `default_agents` and
//! `[agents.<id>]` config keys all resolve to the same canonical IDs.

/// Normalize a user-provided agent identifier to a canonical ID.
pub fn canonical_agent_id(id: &str) -> Option<&'static str> {
    let id = id.trim();
    if id.eq_ignore_ascii_case("agentsmd")
        || id.eq_ignore_ascii_case("agents-md")
        || id.eq_ignore_ascii_case("agents.md")
    {
        Some("agentsmd")
    } else if id.eq_ignore_ascii_case("claude")
        || id.eq_ignore_ascii_case("claude-code")
        || id.eq_ignore_ascii_case("claude_code")
    {
        Some("claude")
    } else if id.eq_ignore_ascii_case("codex")
        || id.eq_ignore_ascii_case("codex-cli")
        || id.eq_ignore_ascii_case("codex_cli")
    {
        Some("codex")
    } else if id.eq_ignore_ascii_case("copilot")
        || id.eq_ignore_ascii_case("github-copilot")
        || id.eq_ignore_ascii_case("github_copilot")
    {
        Some("copilot")
    } else if id.eq_ignore_ascii_case("cursor") {
        Some("cursor")
    } else if id.eq_ignore_ascii_case("gemini")
        || id.eq_ignore_ascii_case("gemini-cli")
        || id.eq_ignore_ascii_case("gemini_cli")
    {
        Some("gemini")
    } else if id.eq_ignore_ascii_case("opencode")
        || id.eq_ignore_ascii_case("open-code")
        || id.eq_ignore_ascii_case("open_code")
    {
        Some("opencode")
    } else if id.eq_ignore_ascii_case("windsurf") {
        Some("windsurf")
    } else if id.eq_ignore_ascii_case("aider") {
        Some("aider")
    } else {
        None
    }
}

/// Match an agent against a filter token.
///
/// If `filter` is a known alias/canonical ID, this performs exact canonical
/// matching. Otherwise it falls back to case-insensitive substring matching
/// against the agent's identifier and display name.
pub fn agent_filter_matches(agent_id: &str, agent_name: &str, filter: &str) -> bool {
    if let Some(canonical_filter) = canonical_agent_id(filter) {
        return canonical_filter == agent_id;
    }

    let filter_lower = filter.trim().to_lowercase();
    if filter_lower.is_empty() {
        return false;
    }
    // agent_id is already canonical (lowercase).
    agent_id.contains(&filter_lower) || agent_name.to_lowercase().contains(&filter_lower)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_agent_id_aliases() {
        assert_eq!(canonical_agent_id("claude"), Some("claude"));
        assert_eq!(canonical_agent_id("Claude-Code"), Some("claude"));
        assert_eq!(canonical_agent_id("github-copilot"), Some("copilot"));
        assert_eq!(canonical_agent_id("codex_cli"), Some("codex"));
        assert_eq!(canonical_agent_id("gemini-cli"), Some("gemini"));
        assert_eq!(canonical_agent_id("open-code"), Some("opencode"));
        assert_eq!(canonical_agent_id("AGENTS.md"), Some("agentsmd"));
        assert_eq!(canonical_agent_id(" aider "), Some("aider"));
        assert_eq!(canonical_agent_id("unknown"), None);
    }

    #[test]
    fn test_agent_filter_matches_alias_exactly() {
        assert!(agent_filter_matches("codex", "OpenAI Codex CLI", "codex-cli"));
        assert!(!agent_filter_matches("codex", "OpenAI Codex CLI", "claude"));
    }

    #[test]
    fn test_agent_filter_matches_substring_of_id_or_name() {
        assert!(agent_filter_matches("copilot", "GitHub Copilot", "pilot"));
        assert!(agent_filter_matches("copilot", "GitHub Copilot", "github"));
        assert!(!agent_filter_matches("copilot", "GitHub Copilot", "zed"));
    }

    #[test]
    fn test_agent_filter_ignores_empty_token() {
        assert!(!agent_filter_matches("claude", "Claude Code", "  "));
    }
}
