//! The scenario runner.
//!
//! A [`Scenario`] binds configured agents to an application instance and
//! executes an explicit, ordered list of cases against them. Each case body
//! receives a [`Tape`] for assertions and the [`Agents`] to call through.
//!
//! Per case the runner:
//! - builds a fresh instance (or reuses the shared one)
//! - runs the body under the configured timeout, catching panics
//! - classifies the outcome and forwards assertions to the reporter
//! - shuts the per-case instance down
//!
//! A failing, erroring, panicking or stalled case never stops later cases.

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, Instrument};
use uuid::Uuid;
use zome_state::{Address, MemoryEntryStore};

use crate::agent::{AgentHandle, Agents};
use crate::application::{Instance, ZomeRegistry};
use crate::conductor::{Conductor, LocalConductor};
use crate::config::{Isolation, ScenarioConfig};
use crate::error::{ConfigurationError, TransportError};
use crate::middleware::{MiddlewarePipeline, ResultMiddleware};
use crate::obs;
use crate::package::PackageDescriptor;
use crate::report::{CaseErrorKind, CaseReport, CaseStatus, RunReport};
use crate::reporter::{Reporter, TracingReporter};
use crate::tape::Tape;

/// Future returned by a case body.
pub type CaseFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A case body. Consumed by the run, so it executes at most once.
pub type CaseBody = Box<dyn FnOnce(Tape, Agents) -> CaseFuture + Send + Sync>;

/// A named, registered case.
pub struct CaseDescriptor {
    pub name: String,
    body: CaseBody,
}

impl std::fmt::Debug for CaseDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaseDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// A configured set of agents plus the cases to run against them.
pub struct Scenario {
    config: ScenarioConfig,
    package: PackageDescriptor,
    registry: ZomeRegistry,
    agents: Vec<(String, Address)>,
    middleware: MiddlewarePipeline,
    cases: Vec<CaseDescriptor>,
}

impl Scenario {
    /// Validate `config` and load its application package from disk.
    pub fn configure(
        config: ScenarioConfig,
        registry: &ZomeRegistry,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        let package = PackageDescriptor::load(&config.application)?;
        Self::configure_with_package(config, package, registry)
    }

    /// Like [`Scenario::configure`] with an already loaded package; the
    /// config's `application` path is not read.
    pub fn configure_with_package(
        config: ScenarioConfig,
        package: PackageDescriptor,
        registry: &ZomeRegistry,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;
        registry.check(&package)?;

        let agents = config
            .agents
            .iter()
            .map(|a| (a.name.clone(), a.agent_id()))
            .collect();
        let middleware = MiddlewarePipeline::from_kinds(&config.middleware);

        Ok(Self {
            config,
            package,
            registry: registry.clone(),
            agents,
            middleware,
            cases: Vec::new(),
        })
    }

    /// Register a case. The body is not executed until [`Scenario::run`].
    pub fn register_case<F, Fut>(&mut self, name: impl Into<String>, body: F) -> &mut Self
    where
        F: FnOnce(Tape, Agents) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.cases.push(CaseDescriptor {
            name: name.into(),
            body: Box::new(move |tape, agents| body(tape, agents).boxed()),
        });
        self
    }

    /// Append a custom transform after the configured middleware.
    pub fn push_middleware(&mut self, middleware: Arc<dyn ResultMiddleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Registered case names, in execution order.
    pub fn case_names(&self) -> Vec<&str> {
        self.cases.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn package(&self) -> &PackageDescriptor {
        &self.package
    }

    /// Run every case, logging progress through `tracing`.
    pub async fn run(self) -> RunReport {
        self.run_with_reporter(&mut TracingReporter).await
    }

    /// Run every case in registration order. The returned future is `Send`,
    /// so a run can be spawned onto a multi-threaded runtime.
    pub async fn run_with_reporter(
        mut self,
        reporter: &mut (dyn Reporter + Send),
    ) -> RunReport {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();
        let cases = std::mem::take(&mut self.cases);

        obs::emit_scenario_started(&run_id, &self.config.name, cases.len(), self.agents.len());
        reporter.on_run_start(&self.config.name, &run_id, cases.len());

        let mut shared: Option<Arc<LocalConductor>> = None;
        let mut reports = Vec::with_capacity(cases.len());
        for (index, case) in cases.into_iter().enumerate() {
            reporter.on_case_start(index, &case.name);
            let report = self.run_case(&run_id, index, case, &mut shared).await;
            for assertion in &report.assertions {
                reporter.on_assertion(&report.name, assertion);
            }
            reporter.on_case_end(&report);
            reports.push(report);
        }
        if let Some(conductor) = shared {
            conductor.shutdown();
        }

        let report = RunReport {
            run_id,
            scenario: self.config.name.clone(),
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            cases: reports,
        };
        obs::emit_scenario_finished(
            &report.run_id,
            report.duration_ms,
            report.passed_count(),
            report.failed_count(),
        );
        reporter.on_run_end(&report);
        report
    }

    async fn run_case(
        &self,
        run_id: &str,
        index: usize,
        case: CaseDescriptor,
        shared: &mut Option<Arc<LocalConductor>>,
    ) -> CaseReport {
        let start = Instant::now();
        let CaseDescriptor { name, body } = case;
        obs::emit_case_started(run_id, index, &name);

        let tape = Tape::new();
        let status = match self.conductor_for_case(shared) {
            Ok(conductor) => {
                let agents = self.bind_agents(&conductor);
                let body = body(tape.clone(), agents).instrument(obs::case_span(run_id, &name));
                let status = self.execute(body, &tape).await;
                if self.config.isolation == Isolation::PerCase {
                    conductor.shutdown();
                }
                status
            }
            Err(e) => CaseStatus::Errored {
                kind: CaseErrorKind::Unhandled,
                message: format!("failed to start application instance: {}", e),
            },
        };

        if let CaseStatus::Errored { message, .. } = &status {
            obs::emit_case_error(run_id, &name, message);
        }
        let report = CaseReport {
            name,
            status,
            assertions: tape.assertions(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        obs::emit_case_finished(
            run_id,
            &report.name,
            report.status.label(),
            report.assertions.len(),
            report.duration_ms,
        );
        report
    }

    async fn execute<F>(&self, body: F, tape: &Tape) -> CaseStatus
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        let guarded = AssertUnwindSafe(body).catch_unwind();
        let secs = self.config.case_timeout_secs;
        let outcome = if secs > 0 {
            match tokio::time::timeout(Duration::from_secs(secs), guarded).await {
                Ok(outcome) => outcome,
                Err(_) => return CaseStatus::TimedOut { after_secs: secs },
            }
        } else {
            guarded.await
        };

        match outcome {
            Ok(Ok(())) if tape.assertions().iter().all(|a| a.passed) => CaseStatus::Passed,
            Ok(Ok(())) => CaseStatus::Failed,
            Ok(Err(e)) if e.downcast_ref::<TransportError>().is_some() => CaseStatus::Errored {
                kind: CaseErrorKind::TransportFailure,
                message: format!("{:#}", e),
            },
            Ok(Err(e)) => CaseStatus::Errored {
                kind: CaseErrorKind::Unhandled,
                message: format!("{:#}", e),
            },
            Err(panic) => CaseStatus::Errored {
                kind: CaseErrorKind::Unhandled,
                message: format!("case panicked: {}", panic_message(panic.as_ref())),
            },
        }
    }

    fn conductor_for_case(
        &self,
        shared: &mut Option<Arc<LocalConductor>>,
    ) -> Result<Arc<LocalConductor>, ConfigurationError> {
        if let Some(conductor) = shared.as_ref() {
            return Ok(conductor.clone());
        }

        let instance = Instance::new(
            &self.package,
            &self.registry,
            Arc::new(MemoryEntryStore::new()),
        )?;
        let conductor = Arc::new(LocalConductor::start(
            instance,
            self.agents.iter().map(|(_, id)| id.clone()),
            self.middleware.clone(),
        ));
        if self.config.isolation == Isolation::Shared {
            info!(instance = %conductor.instance_id(), "Sharing instance across cases");
            *shared = Some(conductor.clone());
        }
        Ok(conductor)
    }

    fn bind_agents(&self, conductor: &Arc<LocalConductor>) -> Agents {
        let conductor: Arc<dyn Conductor> = conductor.clone();
        Agents::new(
            self.agents
                .iter()
                .map(|(name, id)| AgentHandle::new(name.clone(), id.clone(), conductor.clone()))
                .collect(),
        )
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
