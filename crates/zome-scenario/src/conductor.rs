//! The transport seam between agents and application instances.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use zome_state::Address;

use crate::application::Instance;
use crate::error::TransportError;
use crate::middleware::MiddlewarePipeline;
use crate::obs;
use crate::result::CallResult;

/// Carries calls from agents to an application instance.
///
/// Implementations never retry; a call either completes with a
/// [`CallResult`] or fails with a [`TransportError`].
#[async_trait]
pub trait Conductor: Send + Sync {
    /// Identifier of the hosted instance.
    fn instance_id(&self) -> &str;

    /// One request/response round trip on behalf of `agent`.
    async fn call(
        &self,
        agent: &Address,
        capability: &str,
        function: &str,
        input: Value,
    ) -> Result<CallResult, TransportError>;

    /// Stop accepting calls. Later calls fail with
    /// `TransportError::InstanceUnreachable`.
    fn shutdown(&self);

    fn is_running(&self) -> bool;
}

/// In-process conductor hosting a single instance.
pub struct LocalConductor {
    instance: Instance,
    agents: HashSet<Address>,
    middleware: MiddlewarePipeline,
    running: AtomicBool,
    calls: AtomicU64,
}

impl LocalConductor {
    /// Start hosting `instance` for the given agents.
    pub fn start(
        instance: Instance,
        agents: impl IntoIterator<Item = Address>,
        middleware: MiddlewarePipeline,
    ) -> Self {
        let agents: HashSet<Address> = agents.into_iter().collect();
        tracing::debug!(
            instance = %instance.id(),
            agents = agents.len(),
            middleware = ?middleware.names(),
            "Conductor started"
        );
        Self {
            instance,
            agents,
            middleware,
            running: AtomicBool::new(true),
            calls: AtomicU64::new(0),
        }
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    /// Number of calls that reached the instance.
    pub fn call_count(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Conductor for LocalConductor {
    fn instance_id(&self) -> &str {
        self.instance.id()
    }

    async fn call(
        &self,
        agent: &Address,
        capability: &str,
        function: &str,
        input: Value,
    ) -> Result<CallResult, TransportError> {
        // Every call is a suspension point, even in-process.
        tokio::task::yield_now().await;

        if !self.is_running() {
            return Err(TransportError::InstanceUnreachable {
                instance: self.instance.id().to_string(),
            });
        }
        if !self.agents.contains(agent) {
            return Err(TransportError::UnknownAgent {
                agent: agent.to_string(),
                instance: self.instance.id().to_string(),
            });
        }

        let seq = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = self
            .instance
            .dispatch(agent, capability, function, input)
            .await;
        let result = self.middleware.apply(raw);
        obs::emit_call(self.instance.id(), seq, capability, function, result.is_ok());
        Ok(result)
    }

    fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            tracing::debug!(
                instance = %self.instance.id(),
                calls = self.call_count(),
                "Conductor shut down"
            );
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
