use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Record, RemoteCallRequest};
use crate::errors::Bx24Error;

/// Structured error reported by the portal for one call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    #[serde(rename = "error", default)]
    pub code: Option<String>,
    #[serde(rename = "error_description", default)]
    pub description: Option<String>,
}

impl RemoteError {
    pub fn new(code: impl Into<String>, description: impl Into<String>) -> Self {
        Self { code: Some(code.into()), description: Some(description.into()) }
    }
}

impl From<RemoteError> for Bx24Error {
    fn from(err: RemoteError) -> Self {
        Bx24Error::remote(err.code, err.description)
    }
}

/// Normalize a result payload into a sequence of records.
///
/// Arrays are taken as-is, `null` yields no records and any other value
/// becomes a one-element sequence.
pub fn normalize_records(payload: Value) -> Vec<Record> {
    match payload {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

/// Response of a single remote call.
///
/// The continuation, when present, is the request for the following page. It
/// is attached by the transport; callers only follow it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCallResponse {
    error: Option<RemoteError>,
    result: Value,
    total: Option<u64>,
    continuation: Option<RemoteCallRequest>,
}

impl RemoteCallResponse {
    pub fn success(result: Value) -> Self {
        Self { error: None, result, total: None, continuation: None }
    }

    pub fn failure(error: RemoteError) -> Self {
        Self { error: Some(error), result: Value::Null, total: None, continuation: None }
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn with_continuation(mut self, next: RemoteCallRequest) -> Self {
        self.continuation = Some(next);
        self
    }

    pub fn error(&self) -> Option<&RemoteError> {
        self.error.as_ref()
    }

    pub fn data(&self) -> &Value {
        &self.result
    }

    /// Whether the portal signalled further pages.
    pub fn more(&self) -> bool {
        self.continuation.is_some()
    }

    pub fn total(&self) -> Option<u64> {
        self.total
    }

    /// Split into the page's records and the continuation request.
    pub fn into_parts(self) -> (Vec<Record>, Option<RemoteCallRequest>) {
        (normalize_records(self.result), self.continuation)
    }
}
