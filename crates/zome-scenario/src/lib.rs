//! Zome Scenario
//!
//! Scenario-based integration testing for zome call APIs: named agents bound
//! to an application instance, ordered async cases, pluggable reporting.

pub mod agent;
pub mod application;
pub mod conductor;
pub mod config;
pub mod error;
pub mod middleware;
pub mod obs;
pub mod package;
pub mod report;
pub mod reporter;
pub mod result;
pub mod scenario;
pub mod suites;
pub mod tape;
pub mod telemetry;
pub mod zomes;

pub use agent::{AgentConfig, AgentHandle, AgentId, Agents, IdentitySource};
pub use application::{CallContext, Instance, Zome, ZomeFactory, ZomeRegistry};
pub use conductor::{Conductor, LocalConductor};
pub use config::{Isolation, ScenarioConfig};
pub use error::{ConfigurationError, TransportError, ZomeError};
pub use middleware::{MiddlewareKind, MiddlewarePipeline, ResultMiddleware};
pub use package::{PackageDescriptor, ZomeDescriptor};
pub use report::{CaseErrorKind, CaseReport, CaseStatus, RunReport};
pub use reporter::{Reporter, TapReporter, TracingReporter};
pub use result::CallResult;
pub use scenario::{CaseBody, CaseDescriptor, CaseFuture, Scenario};
pub use tape::{Assertion, Tape};
pub use telemetry::init_tracing;

pub use zome_state::{Address, EntryStore, MemoryEntryStore};
