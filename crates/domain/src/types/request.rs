use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Params;
use crate::constants::{LIST_METHOD_SUFFIX, START_PARAM};

/// Returns true for list-style methods that support `start` offsets.
pub fn is_list_method(method: &str) -> bool {
    method.ends_with(LIST_METHOD_SUFFIX)
}

/// One remote method invocation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCallRequest {
    method: String,
    params: Params,
}

impl RemoteCallRequest {
    /// Request for `method` with `params`.
    pub fn new(method: impl Into<String>, params: Params) -> Self {
        Self { method: method.into(), params }
    }

    /// Request without parameters.
    pub fn bare(method: impl Into<String>) -> Self {
        Self::new(method, Params::new())
    }

    /// Remote method name.
    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Copy of this request with `start` overridden.
    pub fn with_start(&self, offset: u64) -> Self {
        let mut params = self.params.clone();
        params.insert(START_PARAM.to_string(), Value::from(offset));
        Self { method: self.method.clone(), params }
    }
}
