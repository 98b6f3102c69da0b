//! Machine-readable run reports.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::tape::Assertion;

/// Why a case stopped before its body completed normally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseErrorKind {
    /// An application instance could not be reached.
    TransportFailure,
    /// The body returned an error or panicked.
    Unhandled,
}

/// Outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseStatus {
    /// Body completed and every assertion passed.
    Passed,
    /// Body completed with at least one failed assertion.
    Failed,
    Errored { kind: CaseErrorKind, message: String },
    TimedOut { after_secs: u64 },
}

impl CaseStatus {
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Passed => "passed",
            CaseStatus::Failed => "failed",
            CaseStatus::Errored { .. } => "errored",
            CaseStatus::TimedOut { .. } => "timed_out",
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, CaseStatus::Passed)
    }
}

/// Result of a single case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReport {
    pub name: String,

    #[serde(flatten)]
    pub status: CaseStatus,

    /// Every assertion the body recorded, in order, including those made
    /// before an error or timeout.
    pub assertions: Vec<Assertion>,

    pub duration_ms: u64,
}

impl CaseReport {
    pub fn passed(&self) -> bool {
        self.status.passed()
    }

    pub fn failed_assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter().filter(|a| !a.passed)
    }
}

/// Result of a complete scenario run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub scenario: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn passed_count(&self) -> usize {
        self.cases.iter().filter(|c| c.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|c| !c.passed()).count()
    }

    pub fn passed_assertions(&self) -> usize {
        self.assertions().filter(|a| a.passed).count()
    }

    pub fn failed_assertions(&self) -> usize {
        self.assertions().filter(|a| !a.passed).count()
    }

    /// True iff every assertion passed and no case errored or timed out.
    pub fn success(&self) -> bool {
        self.cases.iter().all(|c| c.passed())
    }

    /// Process exit code: 0 on success, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    pub fn case(&self, name: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.name == name)
    }

    /// Write the report as pretty JSON.
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("serialize run report")?;
        std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
        Ok(())
    }

    /// Human-readable summary, one line per case plus failed assertions.
    pub fn render_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Scenario: {} ({})\n", self.scenario, self.run_id));
        for case in &self.cases {
            let mark = if case.passed() { "✓" } else { "✗" };
            out.push_str(&format!(
                "  {} {} [{}] ({}ms)\n",
                mark,
                case.name,
                case.status.label(),
                case.duration_ms
            ));
            for assertion in case.failed_assertions() {
                out.push_str(&format!(
                    "      - {}: expected {}, got {}\n",
                    assertion.message, assertion.expected, assertion.actual
                ));
            }
            match &case.status {
                CaseStatus::Errored { message, .. } => {
                    out.push_str(&format!("      error: {}\n", message));
                }
                CaseStatus::TimedOut { after_secs } => {
                    out.push_str(&format!("      timed out after {}s\n", after_secs));
                }
                _ => {}
            }
        }
        out.push_str(&format!(
            "Cases: {} passed, {} failed; assertions: {} passed, {} failed; {}ms\n",
            self.passed_count(),
            self.failed_count(),
            self.passed_assertions(),
            self.failed_assertions(),
            self.duration_ms
        ));
        out
    }

    fn assertions(&self) -> impl Iterator<Item = &Assertion> {
        self.cases.iter().flat_map(|c| c.assertions.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assertion(message: &str, passed: bool) -> Assertion {
        Assertion {
            message: message.to_string(),
            passed,
            expected: json!(1),
            actual: json!(if passed { 1 } else { 2 }),
        }
    }

    fn report(cases: Vec<CaseReport>) -> RunReport {
        RunReport {
            run_id: "run-1".to_string(),
            scenario: "demo".to_string(),
            started_at: Utc::now(),
            duration_ms: 5,
            cases,
        }
    }

    fn case(name: &str, status: CaseStatus, assertions: Vec<Assertion>) -> CaseReport {
        CaseReport {
            name: name.to_string(),
            status,
            assertions,
            duration_ms: 1,
        }
    }

    #[test]
    fn test_exit_code_zero_only_when_all_pass() {
        let ok = report(vec![case("a", CaseStatus::Passed, vec![assertion("x", true)])]);
        assert!(ok.success());
        assert_eq!(ok.exit_code(), 0);

        let failed = report(vec![
            case("a", CaseStatus::Passed, vec![assertion("x", true)]),
            case("b", CaseStatus::Failed, vec![assertion("y", false)]),
        ]);
        assert_eq!(failed.exit_code(), 1);
        assert_eq!(failed.passed_count(), 1);
        assert_eq!(failed.failed_assertions(), 1);
    }

    #[test]
    fn test_errored_case_fails_run_without_failed_assertions() {
        let r = report(vec![case(
            "a",
            CaseStatus::Errored {
                kind: CaseErrorKind::TransportFailure,
                message: "unreachable".to_string(),
            },
            vec![assertion("x", true)],
        )]);
        assert_eq!(r.failed_assertions(), 0);
        assert_eq!(r.exit_code(), 1);
    }

    #[test]
    fn test_case_status_serialises_flat() {
        let c = case(
            "slow",
            CaseStatus::TimedOut { after_secs: 3 },
            Vec::new(),
        );
        let value = serde_json::to_value(&c).unwrap();
        assert_eq!(value["status"], "timed_out");
        assert_eq!(value["after_secs"], 3);

        let back: CaseReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn test_render_summary_lists_failures() {
        let r = report(vec![
            case("good", CaseStatus::Passed, vec![assertion("fine", true)]),
            case("bad", CaseStatus::Failed, vec![assertion("broken", false)]),
        ]);
        let text = r.render_summary();
        assert!(text.contains("✓ good [passed]"));
        assert!(text.contains("✗ bad [failed]"));
        assert!(text.contains("broken: expected 1, got 2"));
        assert!(text.contains("Cases: 1 passed, 1 failed"));
    }

    #[test]
    fn test_write_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let r = report(vec![case("a", CaseStatus::Passed, Vec::new())]);
        r.write_json(&path).unwrap();

        let loaded: RunReport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, r);
    }
}
