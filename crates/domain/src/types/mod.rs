//! Remote call data model

pub mod batch;
pub mod query;
pub mod request;
pub mod response;

pub use batch::{BatchRequestSet, BatchResponse, BatchResultSet};
pub use query::EntityQuery;
pub use request::{is_list_method, RemoteCallRequest};
pub use response::{normalize_records, RemoteCallResponse, RemoteError};

/// A single record as returned by the portal.
pub type Record = serde_json::Value;

/// Named parameters of a remote call.
pub type Params = serde_json::Map<String, serde_json::Value>;
