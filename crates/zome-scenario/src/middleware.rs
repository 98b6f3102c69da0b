//! Result middleware.
//!
//! Every [`CallResult`] passes through an ordered pipeline of pure
//! transforms before it reaches assertion code. The built-in transforms
//! adapt legacy result shapes; the default pipeline is empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::result::CallResult;

/// A pure transform over call results.
pub trait ResultMiddleware: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    fn transform(&self, result: CallResult) -> CallResult;
}

/// Built-in middleware selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddlewareKind {
    /// `{Ok: {Ok: x}}` → `{Ok: x}` and `{Ok: {Err: e}}` → `{Err: e}`
    UnwrapNestedResult,

    /// String payloads holding a JSON object or array are decoded in place.
    DecodeJsonStrings,
}

impl MiddlewareKind {
    pub fn build(self) -> Arc<dyn ResultMiddleware> {
        match self {
            MiddlewareKind::UnwrapNestedResult => Arc::new(UnwrapNestedResult),
            MiddlewareKind::DecodeJsonStrings => Arc::new(DecodeJsonStrings),
        }
    }
}

/// Flattens results that were wrapped twice by a legacy transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnwrapNestedResult;

impl ResultMiddleware for UnwrapNestedResult {
    fn name(&self) -> &str {
        "unwrap_nested_result"
    }

    fn transform(&self, result: CallResult) -> CallResult {
        let mut current = result;
        loop {
            current = match current {
                CallResult::Ok(Value::Object(mut map)) if map.len() == 1 => {
                    if let Some(inner) = map.remove("Ok") {
                        CallResult::Ok(inner)
                    } else if let Some(inner) = map.remove("Err") {
                        CallResult::Err(inner)
                    } else {
                        return CallResult::Ok(Value::Object(map));
                    }
                }
                other => return other,
            };
        }
    }
}

/// Decodes JSON documents that a legacy runtime returned as strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeJsonStrings;

impl DecodeJsonStrings {
    fn decode(value: Value) -> Value {
        match value {
            Value::String(s) => {
                let trimmed = s.trim_start();
                if trimmed.starts_with('{') || trimmed.starts_with('[') {
                    serde_json::from_str(&s).unwrap_or(Value::String(s))
                } else {
                    Value::String(s)
                }
            }
            other => other,
        }
    }
}

impl ResultMiddleware for DecodeJsonStrings {
    fn name(&self) -> &str {
        "decode_json_strings"
    }

    fn transform(&self, result: CallResult) -> CallResult {
        match result {
            CallResult::Ok(v) => CallResult::Ok(Self::decode(v)),
            CallResult::Err(e) => CallResult::Err(Self::decode(e)),
        }
    }
}

/// Ordered list of middleware applied to every result.
#[derive(Clone, Default)]
pub struct MiddlewarePipeline {
    stages: Vec<Arc<dyn ResultMiddleware>>,
}

impl MiddlewarePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pipeline from configured kinds, in order.
    pub fn from_kinds(kinds: &[MiddlewareKind]) -> Self {
        Self {
            stages: kinds.iter().map(|k| k.build()).collect(),
        }
    }

    /// Append a middleware to the end of the pipeline.
    pub fn push(&mut self, middleware: Arc<dyn ResultMiddleware>) {
        self.stages.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.stages.iter().map(|m| m.name().to_string()).collect()
    }

    pub fn apply(&self, result: CallResult) -> CallResult {
        self.stages
            .iter()
            .fold(result, |acc, middleware| middleware.transform(acc))
    }
}

impl std::fmt::Debug for MiddlewarePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MiddlewarePipeline")
            .field("stages", &self.names())
            .finish()
    }
}
