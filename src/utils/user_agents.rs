//! Candidate user-agent strings, loaded once per process.

use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use std::path::Path;

use super::constants::CHROME_USER_AGENT;

/// Newline-delimited pool of user-agent strings
#[derive(Debug, Clone, Default)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Read the pool from a file. Blank lines and `#` comments are skipped.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read user-agent file: {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let agents = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();
        Self { agents }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Pick one agent at random, falling back to the built-in Chrome agent
    #[must_use]
    pub fn pick(&self) -> String {
        self.agents
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| CHROME_USER_AGENT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_skips_blank_and_comments() {
        let pool = UserAgentPool::parse("# agents\nAgentA/1.0\n\n  AgentB/2.0  \n");
        assert_eq!(pool.len(), 2);
        let picked = pool.pick();
        assert!(picked == "AgentA/1.0" || picked == "AgentB/2.0");
    }

    #[test]
    fn test_empty_pool_falls_back() {
        let pool = UserAgentPool::parse("\n# nothing here\n");
        assert!(pool.is_empty());
        assert_eq!(pool.pick(), CHROME_USER_AGENT);
    }
}
