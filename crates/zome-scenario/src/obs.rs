//! Structured lifecycle events for scenario runs.
//!
//! Scenario and case events are emitted at `info!`, individual calls at
//! `debug!`. Filter with `RUST_LOG`, e.g. `RUST_LOG=zome_scenario=debug`.

use tracing::{debug, info, warn};

/// Span covering one case body. Attach with `tracing::Instrument` so every
/// call the body makes is tagged with the run and case.
pub fn case_span(run_id: &str, case: &str) -> tracing::Span {
    tracing::info_span!("scenario.case", run_id = %run_id, case = %case)
}

pub fn emit_scenario_started(run_id: &str, scenario: &str, cases: usize, agents: usize) {
    info!(
        event = "scenario.started",
        run_id = %run_id,
        scenario = %scenario,
        cases = cases,
        agents = agents,
    );
}

pub fn emit_scenario_finished(run_id: &str, duration_ms: u64, passed: usize, failed: usize) {
    info!(
        event = "scenario.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        passed = passed,
        failed = failed,
        success = failed == 0,
    );
}

pub fn emit_case_started(run_id: &str, index: usize, case: &str) {
    info!(event = "case.started", run_id = %run_id, index = index, case = %case);
}

/// `status` is the case status label (`passed`, `failed`, `errored`, `timed_out`).
pub fn emit_case_finished(
    run_id: &str,
    case: &str,
    status: &str,
    assertions: usize,
    duration_ms: u64,
) {
    info!(
        event = "case.finished",
        run_id = %run_id,
        case = %case,
        status = %status,
        assertions = assertions,
        duration_ms = duration_ms,
    );
}

/// Case body failed outside of assertions (warning level).
pub fn emit_case_error(run_id: &str, case: &str, error: &dyn std::fmt::Display) {
    warn!(event = "case.error", run_id = %run_id, case = %case, error = %error);
}

pub fn emit_call(instance: &str, seq: u64, capability: &str, function: &str, ok: bool) {
    debug!(
        event = "call.completed",
        instance = %instance,
        seq = seq,
        capability = %capability,
        function = %function,
        ok = ok,
    );
}
