//! Scenario configuration.
//!
//! ```toml
//! name = "game matchmaking"
//! application = "game-matchmaking.dna.json"
//! middleware = ["unwrap_nested_result"]
//! isolation = "per_case"
//! case_timeout_secs = 30
//!
//! [[agents]]
//! name = "alice"
//!
//! [[agents]]
//! name = "bob"
//! identity = { source = "seed", seed = "bob-key" }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::agent::{AgentConfig, IdentitySource};
use crate::error::ConfigurationError;
use crate::middleware::MiddlewareKind;

/// How application state is shared between cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Fresh instance and store for every case.
    #[default]
    PerCase,
    /// One instance for the whole run; cases observe earlier cases' writes.
    Shared,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,

    pub agents: Vec<AgentConfig>,

    /// Path to the application package descriptor.
    pub application: PathBuf,

    #[serde(default)]
    pub middleware: Vec<MiddlewareKind>,

    #[serde(default)]
    pub isolation: Isolation,

    /// Per-case timeout; 0 disables it.
    #[serde(default = "default_case_timeout")]
    pub case_timeout_secs: u64,
}

fn default_case_timeout() -> u64 {
    30
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>, application: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            agents: Vec::new(),
            application: application.into(),
            middleware: Vec::new(),
            isolation: Isolation::default(),
            case_timeout_secs: default_case_timeout(),
        }
    }

    pub fn with_agent(mut self, agent: AgentConfig) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn with_middleware(mut self, kind: MiddlewareKind) -> Self {
        self.middleware.push(kind);
        self
    }

    pub fn with_isolation(mut self, isolation: Isolation) -> Self {
        self.isolation = isolation;
        self
    }

    pub fn with_case_timeout(mut self, secs: u64) -> Self {
        self.case_timeout_secs = secs;
        self
    }

    /// Load from a TOML file. A relative `application` path is resolved
    /// against the directory containing the config file.
    pub fn load(path: &Path) -> Result<Self, ConfigurationError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| ConfigurationError::Unreadable {
                path: path.to_path_buf(),
                source,
            })?;
        let mut config: ScenarioConfig =
            toml::from_str(&content).map_err(|e| ConfigurationError::InvalidConfig {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if config.application.is_relative() {
            if let Some(dir) = path.parent() {
                config.application = dir.join(&config.application);
            }
        }
        config.validate()?;
        Ok(config)
    }

    /// Agent names must be non-empty and unique, and no two agents may
    /// resolve to the same identity.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.agents.is_empty() {
            return Err(ConfigurationError::NoAgents);
        }

        let mut identities: HashMap<String, &str> = HashMap::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ConfigurationError::EmptyAgentName);
            }
            if self.agents.iter().filter(|a| a.name == agent.name).count() > 1 {
                return Err(ConfigurationError::DuplicateAgent {
                    name: agent.name.clone(),
                });
            }
            if let IdentitySource::Seed { seed } = &agent.identity {
                if seed.is_empty() {
                    return Err(ConfigurationError::InvalidIdentity {
                        agent: agent.name.clone(),
                        reason: "seed must not be empty".to_string(),
                    });
                }
            }
            let id = agent.agent_id().to_string();
            if let Some(other) = identities.insert(id, &agent.name) {
                return Err(ConfigurationError::InvalidIdentity {
                    agent: agent.name.clone(),
                    reason: format!("identity already used by agent {}", other),
                });
            }
        }
        Ok(())
    }
}
