//! Application instances and the zomes they host.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use zome_state::EntryStore;

use crate::agent::AgentId;
use crate::error::{ConfigurationError, ZomeError};
use crate::package::{PackageDescriptor, ZomeDescriptor};
use crate::result::CallResult;

/// What a zome function sees of the world: who is calling, and the state
/// shared by every agent bound to the instance.
#[derive(Clone)]
pub struct CallContext {
    pub agent: AgentId,
    pub store: Arc<dyn EntryStore>,
}

/// A named group of callable functions.
#[async_trait]
pub trait Zome: Send + Sync {
    /// Functions this zome exports.
    fn functions(&self) -> &[&'static str];

    /// Execute `function`. Only called with an exported function name and an
    /// object input.
    async fn call(&self, ctx: &CallContext, function: &str, input: Value)
        -> Result<Value, ZomeError>;
}

/// Constructor for a zome kind.
pub type ZomeFactory = fn() -> Arc<dyn Zome>;

/// Maps package zome kinds to implementations.
#[derive(Clone, Default)]
pub struct ZomeRegistry {
    factories: HashMap<String, ZomeFactory>,
}

impl ZomeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in zome kind.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            crate::zomes::matchmaking::KIND,
            crate::zomes::matchmaking::factory,
        );
        registry
    }

    pub fn register(&mut self, kind: &str, factory: ZomeFactory) {
        self.factories.insert(kind.to_string(), factory);
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered kinds, sorted.
    pub fn kinds(&self) -> Vec<&str> {
        let mut kinds: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        kinds.sort_unstable();
        kinds
    }

    /// Check that every zome in `package` resolves.
    pub fn check(&self, package: &PackageDescriptor) -> Result<(), ConfigurationError> {
        package.validate()?;
        for zome in &package.zomes {
            self.factory(zome)?;
        }
        Ok(())
    }

    fn factory(&self, zome: &ZomeDescriptor) -> Result<ZomeFactory, ConfigurationError> {
        self.factories
            .get(&zome.kind)
            .copied()
            .ok_or_else(|| ConfigurationError::UnknownZomeKind {
                zome: zome.name.clone(),
                kind: zome.kind.clone(),
            })
    }
}

/// One deployed copy of an application package.
pub struct Instance {
    id: String,
    package: PackageDescriptor,
    zomes: HashMap<String, Arc<dyn Zome>>,
    store: Arc<dyn EntryStore>,
}

impl Instance {
    /// Instantiate every zome in `package` on top of `store`.
    pub fn new(
        package: &PackageDescriptor,
        registry: &ZomeRegistry,
        store: Arc<dyn EntryStore>,
    ) -> Result<Self, ConfigurationError> {
        registry.check(package)?;
        let mut zomes = HashMap::new();
        for zome in &package.zomes {
            let factory = registry.factory(zome)?;
            zomes.insert(zome.name.clone(), factory());
        }
        let suffix = Uuid::new_v4().simple().to_string();
        Ok(Self {
            id: format!("{}-{}", package.name, &suffix[..8]),
            package: package.clone(),
            zomes,
            store,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn package(&self) -> &PackageDescriptor {
        &self.package
    }

    pub fn store(&self) -> &Arc<dyn EntryStore> {
        &self.store
    }

    /// Route a call to the zome behind `capability`.
    pub async fn dispatch(
        &self,
        agent: &AgentId,
        capability: &str,
        function: &str,
        input: Value,
    ) -> CallResult {
        let unknown = || ZomeError::UnknownOperation {
            capability: capability.to_string(),
            function: function.to_string(),
        };

        let Some(zome) = self.zomes.get(capability) else {
            return Err::<Value, _>(unknown()).into();
        };
        if !zome.functions().iter().any(|f| *f == function) {
            return Err::<Value, _>(unknown()).into();
        }
        if !input.is_object() {
            return Err::<Value, _>(ZomeError::InvalidInput(format!(
                "input must be a structured object, got {}",
                json_kind(&input)
            )))
            .into();
        }

        let ctx = CallContext {
            agent: agent.clone(),
            store: self.store.clone(),
        };
        zome.call(&ctx, function, input).await.into()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
