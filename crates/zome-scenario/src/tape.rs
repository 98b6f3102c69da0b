//! The assertion sink handed to every case body.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::result::CallResult;

/// One recorded assertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub message: String,
    pub passed: bool,
    pub expected: Value,
    pub actual: Value,
}

/// Collects the assertions of a single case.
///
/// Assertions never abort the case body; a failed assertion is recorded and
/// the body keeps running. Cloning yields a handle to the same record.
#[derive(Debug, Clone, Default)]
pub struct Tape {
    assertions: Arc<Mutex<Vec<Assertion>>>,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    /// Structural equality on the JSON forms of `actual` and `expected`.
    pub fn deep_equal<A, E>(&self, actual: &A, expected: &E, message: &str) -> bool
    where
        A: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        let actual = to_json(actual);
        let expected = to_json(expected);
        let passed = actual == expected;
        self.record(message, passed, expected, actual)
    }

    /// Alias of [`Tape::deep_equal`] for scalar comparisons.
    pub fn equal<A, E>(&self, actual: &A, expected: &E, message: &str) -> bool
    where
        A: Serialize + ?Sized,
        E: Serialize + ?Sized,
    {
        self.deep_equal(actual, expected, message)
    }

    pub fn ok(&self, condition: bool, message: &str) -> bool {
        self.record(message, condition, Value::Bool(true), Value::Bool(condition))
    }

    /// Passes when `result` is an `Ok` result.
    pub fn is_ok(&self, result: &CallResult, message: &str) -> bool {
        self.record(
            message,
            result.is_ok(),
            Value::String("Ok".to_string()),
            result.to_value(),
        )
    }

    /// Passes when `result` is an `Err` result.
    pub fn is_err(&self, result: &CallResult, message: &str) -> bool {
        self.record(
            message,
            result.is_err(),
            Value::String("Err".to_string()),
            result.to_value(),
        )
    }

    /// Record an unconditional failure.
    pub fn fail(&self, message: &str) {
        self.record(message, false, Value::Null, Value::Null);
    }

    /// Snapshot of everything recorded so far.
    pub fn assertions(&self) -> Vec<Assertion> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn record(&self, message: &str, passed: bool, expected: Value, actual: Value) -> bool {
        if !passed {
            tracing::debug!(assertion = %message, %expected, %actual, "Assertion failed");
        }
        self.lock().push(Assertion {
            message: message.to_string(),
            passed,
            expected,
            actual,
        });
        passed
    }

    // A panicking case body may poison the lock; what it recorded still counts.
    fn lock(&self) -> MutexGuard<'_, Vec<Assertion>> {
        self.assertions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value)
        .unwrap_or_else(|e| Value::String(format!("<unserialisable: {}>", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deep_equal_records_both_sides() {
        let tape = Tape::new();
        assert!(tape.deep_equal(&json!({"a": [1, 2]}), &json!({"a": [1, 2]}), "same"));
        assert!(!tape.deep_equal(&vec![1, 2], &vec![2, 1], "order matters"));

        let recorded = tape.assertions();
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].passed);
        assert!(!recorded[1].passed);
        assert_eq!(recorded[1].expected, json!([2, 1]));
        assert_eq!(recorded[1].actual, json!([1, 2]));
    }

    #[test]
    fn test_equal_across_types_with_same_json() {
        let tape = Tape::new();
        assert!(tape.equal("sup", &"sup".to_string(), "str vs String"));
        assert!(tape.equal(&46usize, &46u32, "integer widths"));
    }

    #[test]
    fn test_result_checks() {
        let tape = Tape::new();
        assert!(tape.is_ok(&CallResult::Ok(json!(1)), "ok"));
        assert!(!tape.is_ok(&CallResult::Err(json!("nope")), "not ok"));
        assert!(tape.is_err(&CallResult::Err(json!("nope")), "err"));
        assert_eq!(tape.assertions()[1].actual, json!({"Err": "nope"}));
    }

    #[test]
    fn test_clones_share_record() {
        let tape = Tape::new();
        let clone = tape.clone();
        clone.ok(true, "from clone");
        tape.fail("from original");
        assert_eq!(tape.len(), 2);
        assert_eq!(clone.assertions()[1].message, "from original");
    }
}
