//! Response envelopes as serialized by the portal.
//!
//! The portal is a PHP application: sections that are conceptually maps
//! arrive as `[]` when empty, and numeric fields occasionally arrive as
//! strings. Both are tolerated here so the rest of the crate sees clean types.

use std::collections::BTreeSet;

use bx24_domain::{
    BatchResponse, Bx24Error, RemoteCallRequest, RemoteCallResponse, RemoteError, Result,
};
use serde::de::{Deserializer, Error as DeError};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Envelope of a single method call.
#[derive(Debug, Deserialize)]
pub struct CallEnvelope {
    #[serde(default)]
    pub result: Value,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub next: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl CallEnvelope {
    pub fn remote_error(&self) -> Option<RemoteError> {
        self.error.as_ref().map(|code| RemoteError {
            code: Some(code.clone()),
            description: self.error_description.clone(),
        })
    }

    /// Convert into a response, attaching the continuation for `next`.
    pub fn into_response(self, request: &RemoteCallRequest) -> RemoteCallResponse {
        if let Some(error) = self.remote_error() {
            return RemoteCallResponse::failure(error);
        }

        let mut response = RemoteCallResponse::success(self.result);
        if let Some(total) = self.total {
            response = response.with_total(total);
        }
        if let Some(next) = self.next {
            response = response.with_continuation(request.with_start(next));
        }
        response
    }
}

/// Envelope of a `batch` call.
#[derive(Debug, Deserialize)]
pub struct BatchEnvelope {
    #[serde(default)]
    pub result: Option<BatchSections>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Per-command sections of a batch reply, keyed by command key.
#[derive(Debug, Default, Deserialize)]
pub struct BatchSections {
    #[serde(default, deserialize_with = "php_map")]
    pub result: Map<String, Value>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_error: Map<String, Value>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_total: Map<String, Value>,
    #[serde(default, deserialize_with = "php_map")]
    pub result_next: Map<String, Value>,
}

impl BatchEnvelope {
    pub fn remote_error(&self) -> Option<RemoteError> {
        self.error.as_ref().map(|code| RemoteError {
            code: Some(code.clone()),
            description: self.error_description.clone(),
        })
    }
}

impl BatchSections {
    /// Split the sections into one response per command key.
    ///
    /// Sub-results never carry a continuation; paging inside a batch is
    /// planned by the caller.
    pub fn into_batch_response(mut self) -> BatchResponse {
        let keys: BTreeSet<String> =
            self.result.keys().chain(self.result_error.keys()).cloned().collect();

        keys.into_iter()
            .map(|key| {
                let response = match self.result_error.remove(&key) {
                    Some(error) => RemoteCallResponse::failure(sub_error(error)),
                    None => {
                        let result = self.result.remove(&key).unwrap_or(Value::Null);
                        let response = RemoteCallResponse::success(result);
                        match self.result_total.get(&key).and_then(value_as_u64) {
                            Some(total) => response.with_total(total),
                            None => response,
                        }
                    }
                };
                (key, response)
            })
            .collect()
    }
}

/// Parse a batch reply body.
pub fn parse_batch(body: &str) -> Result<std::result::Result<BatchSections, RemoteError>> {
    let envelope: BatchEnvelope = serde_json::from_str(body)
        .map_err(|err| Bx24Error::BatchProcessing(format!("unreadable batch reply: {err}")))?;

    if let Some(error) = envelope.remote_error() {
        return Ok(Err(error));
    }

    envelope
        .result
        .map(Ok)
        .ok_or_else(|| Bx24Error::BatchProcessing("batch reply has no result section".into()))
}

fn sub_error(value: Value) -> RemoteError {
    match value {
        Value::Object(_) => serde_json::from_value(value.clone()).unwrap_or(RemoteError {
            code: None,
            description: Some(value.to_string()),
        }),
        Value::String(text) => RemoteError { code: None, description: Some(text) },
        other => RemoteError { code: None, description: Some(other.to_string()) },
    }
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_u64<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value_as_u64(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("expected a non-negative integer, got {value}"))),
    }
}

fn php_map<'de, D>(deserializer: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        Value::Array(items) => {
            Ok(items.into_iter().enumerate().map(|(index, item)| (index.to_string(), item)).collect())
        }
        Value::Null => Ok(Map::new()),
        other => Err(D::Error::custom(format!("expected an object or array, got {other}"))),
    }
}
