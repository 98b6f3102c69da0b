//! Pluggable sinks for assertion and case outcomes.

use std::io::Write;

use crate::report::{CaseReport, CaseStatus, RunReport};
use crate::tape::Assertion;

/// Receives run progress from the scenario runner.
///
/// Assertions of a case are delivered in recording order after the case
/// body has stopped, followed by `on_case_end`.
pub trait Reporter {
    fn on_run_start(&mut self, _scenario: &str, _run_id: &str, _cases: usize) {}

    fn on_case_start(&mut self, _index: usize, _name: &str) {}

    fn on_assertion(&mut self, _case: &str, _assertion: &Assertion) {}

    fn on_case_end(&mut self, _case: &CaseReport) {}

    fn on_run_end(&mut self, _report: &RunReport) {}
}

/// Logs progress through `tracing`.
#[derive(Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn on_assertion(&mut self, case: &str, assertion: &Assertion) {
        if assertion.passed {
            tracing::debug!(case = %case, assertion = %assertion.message, "✓");
        } else {
            tracing::warn!(
                case = %case,
                assertion = %assertion.message,
                expected = %assertion.expected,
                actual = %assertion.actual,
                "✗ assertion failed"
            );
        }
    }

    fn on_run_end(&mut self, report: &RunReport) {
        tracing::info!(
            scenario = %report.scenario,
            passed = report.passed_count(),
            failed = report.failed_count(),
            "Scenario complete"
        );
    }
}

/// Writes TAP version 13.
///
/// Each assertion is one test point. A case that errors or times out adds
/// one extra failing test point describing why it stopped.
pub struct TapReporter<W: Write> {
    out: W,
    count: usize,
    failed: usize,
}

impl<W: Write> TapReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            count: 0,
            failed: 0,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn point(&mut self, passed: bool, description: &str) {
        self.count += 1;
        if !passed {
            self.failed += 1;
        }
        let status = if passed { "ok" } else { "not ok" };
        self.line(&format!("{} {} {}", status, self.count, description));
    }

    // Reporting never fails the run; a broken sink is logged and ignored.
    fn line(&mut self, text: &str) {
        if let Err(e) = writeln!(self.out, "{}", text) {
            tracing::warn!(error = %e, "TAP output failed");
        }
    }
}

impl<W: Write> Reporter for TapReporter<W> {
    fn on_run_start(&mut self, _scenario: &str, _run_id: &str, _cases: usize) {
        self.line("TAP version 13");
    }

    fn on_case_start(&mut self, _index: usize, name: &str) {
        self.line(&format!("# {}", name));
    }

    fn on_assertion(&mut self, _case: &str, assertion: &Assertion) {
        self.point(assertion.passed, &assertion.message);
        if !assertion.passed {
            self.line("  ---");
            self.line(&format!("    expected: {}", assertion.expected));
            self.line(&format!("    actual:   {}", assertion.actual));
            self.line("  ...");
        }
    }

    fn on_case_end(&mut self, case: &CaseReport) {
        match &case.status {
            CaseStatus::Errored { message, .. } => {
                self.point(false, &format!("{} errored: {}", case.name, message));
            }
            CaseStatus::TimedOut { after_secs } => {
                self.point(false, &format!("{} timed out after {}s", case.name, after_secs));
            }
            CaseStatus::Passed | CaseStatus::Failed => {}
        }
    }

    fn on_run_end(&mut self, _report: &RunReport) {
        let (count, failed) = (self.count, self.failed);
        self.line("");
        self.line(&format!("1..{}", count));
        self.line(&format!("# tests {}", count));
        self.line(&format!("# pass  {}", count - failed));
        self.line(&format!("# fail  {}", failed));
        if let Err(e) = self.out.flush() {
            tracing::warn!(error = %e, "TAP flush failed");
        }
    }
}
