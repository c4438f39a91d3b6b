use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Params;

/// Query options for entity fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    #[serde(default)]
    pub select: Vec<String>,
    #[serde(default)]
    pub filter: Params,
    #[serde(default)]
    pub order: Params,
    /// Use batched pagination for list methods.
    #[serde(default = "default_use_batch")]
    pub use_batch: bool,
}

fn default_use_batch() -> bool {
    true
}

impl Default for EntityQuery {
    fn default() -> Self {
        Self { select: Vec::new(), filter: Params::new(), order: Params::new(), use_batch: true }
    }
}

impl EntityQuery {
    /// Empty query: no projection, no filter, batching on.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields to return.
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Add a filter condition on `field`.
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    /// Sort by `field` in `direction` (`ASC` or `DESC`).
    pub fn order(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.order.insert(field.into(), Value::String(direction.into()));
        self
    }

    /// Toggle batched pagination.
    pub fn use_batch(mut self, enabled: bool) -> Self {
        self.use_batch = enabled;
        self
    }

    /// Request parameters (`select`, `filter`, `order`).
    pub fn to_params(&self) -> Params {
        let mut params = Params::new();
        params.insert(
            "select".to_string(),
            Value::Array(self.select.iter().cloned().map(Value::String).collect()),
        );
        params.insert("filter".to_string(), Value::Object(self.filter.clone()));
        params.insert("order".to_string(), Value::Object(self.order.clone()));
        params
    }
}
