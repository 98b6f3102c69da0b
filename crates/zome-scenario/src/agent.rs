//! Simulated agents and the handles case bodies call through.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use zome_state::Address;

use crate::conductor::Conductor;
use crate::error::{TransportError, ZomeError};
use crate::result::CallResult;

/// An agent's identity token.
pub type AgentId = Address;

/// Where an agent's identity token comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum IdentitySource {
    /// Derived from the agent name.
    #[default]
    Derived,

    /// Derived from an arbitrary seed string, independent of the name.
    Seed { seed: String },

    /// A fixed, pre-computed address.
    Address { address: Address },
}

/// Configuration of one agent in a scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub name: String,

    #[serde(default)]
    pub identity: IdentitySource,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: IdentitySource::Derived,
        }
    }

    pub fn with_identity(mut self, identity: IdentitySource) -> Self {
        self.identity = identity;
        self
    }

    /// Resolve the identity token. Stable for a given config.
    pub fn agent_id(&self) -> AgentId {
        match &self.identity {
            IdentitySource::Derived => {
                Address::for_content(format!("agent:{}", self.name).as_bytes())
            }
            IdentitySource::Seed { seed } => {
                Address::for_content(format!("agent-seed:{}", seed).as_bytes())
            }
            IdentitySource::Address { address } => address.clone(),
        }
    }
}

/// A live agent bound to an application instance.
#[derive(Clone)]
pub struct AgentHandle {
    name: String,
    id: AgentId,
    conductor: Arc<dyn Conductor>,
}

impl AgentHandle {
    pub fn new(name: impl Into<String>, id: AgentId, conductor: Arc<dyn Conductor>) -> Self {
        Self {
            name: name.into(),
            id,
            conductor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The agent's identity token.
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// The conductor hosting this agent's instance.
    pub fn conductor(&self) -> &Arc<dyn Conductor> {
        &self.conductor
    }

    /// One round trip to `capability`/`function` as this agent.
    ///
    /// `input` must serialise to a JSON object; pass `json!({})` for
    /// functions without parameters. Anything else comes back as an `Err`
    /// result without reaching the application.
    pub async fn call_sync<I: Serialize>(
        &self,
        capability: &str,
        function: &str,
        input: I,
    ) -> Result<CallResult, TransportError> {
        let input = match serde_json::to_value(input) {
            Ok(value) => value,
            Err(e) => {
                return Ok(CallResult::from(Err::<Value, ZomeError>(
                    ZomeError::InvalidInput(e.to_string()),
                )))
            }
        };
        self.conductor
            .call(&self.id, capability, function, input)
            .await
    }
}

impl std::fmt::Debug for AgentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentHandle")
            .field("name", &self.name)
            .field("id", &self.id)
            .finish()
    }
}

/// The handles passed to a case body, one per configured agent, in
/// configuration order.
#[derive(Debug, Clone, Default)]
pub struct Agents {
    handles: Vec<AgentHandle>,
}

impl Agents {
    pub fn new(handles: Vec<AgentHandle>) -> Self {
        Self { handles }
    }

    pub fn get(&self, name: &str) -> Option<&AgentHandle> {
        self.handles.iter().find(|h| h.name == name)
    }

    /// Look up an agent, failing the case if it is not configured.
    pub fn agent(&self, name: &str) -> anyhow::Result<&AgentHandle> {
        self.get(name)
            .ok_or_else(|| anyhow::anyhow!("agent {:?} is not configured in this scenario", name))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentHandle> {
        self.handles.iter()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_identity_is_stable_and_distinct() {
        let alice = AgentConfig::new("alice");
        let bob = AgentConfig::new("bob");
        assert_eq!(alice.agent_id(), AgentConfig::new("alice").agent_id());
        assert_ne!(alice.agent_id(), bob.agent_id());
        assert_eq!(alice.agent_id().as_str().len(), zome_state::ADDRESS_LEN);
    }

    #[test]
    fn test_seed_identity_ignores_name() {
        let seed = IdentitySource::Seed {
            seed: "shared-key".to_string(),
        };
        let a = AgentConfig::new("alice").with_identity(seed.clone());
        let b = AgentConfig::new("bob").with_identity(seed);
        assert_eq!(a.agent_id(), b.agent_id());
    }

    #[test]
    fn test_identity_config_shapes() {
        let config: AgentConfig = serde_json::from_str(r#"{"name": "alice"}"#).unwrap();
        assert_eq!(config.identity, IdentitySource::Derived);

        let config: AgentConfig = serde_json::from_str(
            r#"{"name": "bob", "identity": {"source": "seed", "seed": "k"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.identity,
            IdentitySource::Seed {
                seed: "k".to_string()
            }
        );
    }
}
