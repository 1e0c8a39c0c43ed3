//! Target agents
//!
//! Each coding agent reads its own configuration files (`CLAUDE.md`,
//! `.cursor/rules`, ...). When an agent is targeted, those agent-specific
//! files are left out of the rules, since the agent already loads them
//! itself. Generic rules can still filter on the `agent` selector key.

use crate::error::{ContextError, Result};
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Agent {
    Cursor,
    OpenCode,
    Copilot,
    Claude,
    Gemini,
    Augment,
    Windsurf,
    Codex,
}

impl Agent {
    pub const ALL: [Agent; 8] = [
        Agent::Cursor,
        Agent::OpenCode,
        Agent::Copilot,
        Agent::Claude,
        Agent::Gemini,
        Agent::Augment,
        Agent::Windsurf,
        Agent::Codex,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cursor => "cursor",
            Self::OpenCode => "opencode",
            Self::Copilot => "copilot",
            Self::Claude => "claude",
            Self::Gemini => "gemini",
            Self::Augment => "augment",
            Self::Windsurf => "windsurf",
            Self::Codex => "codex",
        }
    }

    /// Path fragments that mark a file as this agent's own configuration
    pub fn path_patterns(&self) -> &'static [&'static str] {
        match self {
            Self::Cursor => &[".cursor/", ".cursorrules"],
            Self::OpenCode => &[".opencode/"],
            Self::Copilot => &[".github/copilot-instructions.md", ".github/agents/"],
            Self::Claude => &[".claude/", "CLAUDE.md", "CLAUDE.local.md"],
            Self::Gemini => &[".gemini/", "GEMINI.md"],
            Self::Augment => &[".augment/"],
            Self::Windsurf => &[".windsurf/", ".windsurfrules"],
            Self::Codex => &[".codex/", "AGENTS.md"],
        }
    }

    /// True if `path`, relative to a search root, belongs to this agent
    pub fn matches_path(&self, path: &Path) -> bool {
        let normalized = path.to_string_lossy().replace('\\', "/");
        self.path_patterns()
            .iter()
            .any(|pattern| normalized.contains(pattern))
    }
}

/// True if `path`, relative to a search root, belongs to any agent
pub fn is_agent_specific(path: &Path) -> bool {
    Agent::ALL.iter().any(|agent| agent.matches_path(path))
}

impl FromStr for Agent {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim();
        Agent::ALL
            .into_iter()
            .find(|agent| agent.as_str() == name)
            .ok_or_else(|| {
                let supported: Vec<&str> = Agent::ALL.iter().map(Agent::as_str).collect();
                ContextError::unknown_agent(name, supported.join(", "))
            })
    }
}

impl fmt::Display for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_agent() {
        assert_eq!("claude".parse::<Agent>().unwrap(), Agent::Claude);
        assert_eq!(" codex ".parse::<Agent>().unwrap(), Agent::Codex);
        assert!(matches!(
            "vim".parse::<Agent>(),
            Err(ContextError::UnknownAgent { name, .. }) if name == "vim"
        ));
        for agent in Agent::ALL {
            assert_eq!(agent.to_string().parse::<Agent>().unwrap(), agent);
        }
    }

    #[test]
    fn test_agent_paths() {
        assert!(Agent::Claude.matches_path(Path::new("CLAUDE.local.md")));
        assert!(Agent::Cursor.matches_path(Path::new(".cursor/rules/go.mdc")));
        assert!(!Agent::Cursor.matches_path(Path::new(".agents/rules/cursor.md")));

        assert!(is_agent_specific(Path::new("AGENTS.md")));
        assert!(is_agent_specific(Path::new(".github/copilot-instructions.md")));
        assert!(!is_agent_specific(Path::new(".agents/rules/general.md")));
    }
}
