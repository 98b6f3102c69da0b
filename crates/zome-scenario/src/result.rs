//! Tagged outcome of a single call.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ZomeError;

/// Outcome of a call: exactly one of `{"Ok": payload}` or `{"Err": reason}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CallResult {
    Ok(Value),
    Err(Value),
}

impl CallResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, CallResult::Ok(_))
    }

    pub fn is_err(&self) -> bool {
        matches!(self, CallResult::Err(_))
    }

    /// Success payload, if any.
    pub fn ok(&self) -> Option<&Value> {
        match self {
            CallResult::Ok(v) => Some(v),
            CallResult::Err(_) => None,
        }
    }

    /// Failure payload, if any.
    pub fn err(&self) -> Option<&Value> {
        match self {
            CallResult::Ok(_) => None,
            CallResult::Err(e) => Some(e),
        }
    }

    pub fn into_result(self) -> Result<Value, Value> {
        match self {
            CallResult::Ok(v) => Ok(v),
            CallResult::Err(e) => Err(e),
        }
    }

    /// Return the success payload or fail the calling case with the reason.
    pub fn expect_ok(self) -> anyhow::Result<Value> {
        self.into_result()
            .map_err(|e| anyhow::anyhow!("call returned Err: {}", e))
    }

    /// Deserialise the success payload.
    pub fn decode_ok<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        Ok(serde_json::from_value(self.expect_ok()?)?)
    }

    /// Wire representation (`{"Ok": ..}` / `{"Err": ..}`).
    pub fn to_value(&self) -> Value {
        match self {
            CallResult::Ok(v) => serde_json::json!({ "Ok": v }),
            CallResult::Err(e) => serde_json::json!({ "Err": e }),
        }
    }
}

impl From<Result<Value, ZomeError>> for CallResult {
    fn from(result: Result<Value, ZomeError>) -> Self {
        match result {
            Ok(v) => CallResult::Ok(v),
            Err(e) => CallResult::Err(
                serde_json::to_value(&e).unwrap_or_else(|_| Value::String(e.to_string())),
            ),
        }
    }
}
