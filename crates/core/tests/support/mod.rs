//! Shared test helpers for `bx24-core` integration tests.
//!
//! `FakePortal` is an in-memory portal: list methods page through generated
//! records, honour equality filters and report `total`, exactly like the REST
//! API does. Every call is recorded so tests can assert on traffic.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use bx24_core::PlatformSdk;
use bx24_domain::constants::START_PARAM;
use bx24_domain::{
    BatchRequestSet, BatchResponse, Bx24Error, Record, RemoteCallRequest, RemoteCallResponse,
    RemoteError, Result,
};
use parking_lot::Mutex;
use serde_json::{json, Value};

/// One recorded interaction with the portal.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Method(RemoteCallRequest),
    Batch(Vec<(String, RemoteCallRequest)>),
}

pub struct FakePortal {
    page_size: u64,
    datasets: HashMap<String, Vec<Record>>,
    failing_offsets: HashSet<u64>,
    batch_failure: Option<Bx24Error>,
    calls: Mutex<Vec<Call>>,
}

impl FakePortal {
    pub fn new() -> Self {
        Self {
            page_size: 50,
            datasets: HashMap::new(),
            failing_offsets: HashSet::new(),
            batch_failure: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// `count` records `{"ID": "<n>"}` served by `method`.
    pub fn with_records(self, method: &str, count: u64) -> Self {
        let records = (0..count).map(|n| json!({ "ID": n.to_string() })).collect();
        self.with_dataset(method, records)
    }

    pub fn with_dataset(mut self, method: &str, records: Vec<Record>) -> Self {
        self.datasets.insert(method.to_string(), records);
        self
    }

    /// Pages starting at `offset` answer with a remote error.
    pub fn failing_at(mut self, offset: u64) -> Self {
        self.failing_offsets.insert(offset);
        self
    }

    /// Every batch submission fails at the transport level.
    pub fn failing_batches(mut self, error: Bx24Error) -> Self {
        self.batch_failure = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn method_calls(&self) -> Vec<RemoteCallRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Method(request) => Some(request),
                Call::Batch(_) => None,
            })
            .collect()
    }

    pub fn batches(&self) -> Vec<Vec<(String, RemoteCallRequest)>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Batch(commands) => Some(commands),
                Call::Method(_) => None,
            })
            .collect()
    }

    fn respond(&self, request: &RemoteCallRequest) -> RemoteCallResponse {
        let Some(records) = self.datasets.get(request.method()) else {
            return RemoteCallResponse::failure(RemoteError::new(
                "ERROR_METHOD_NOT_FOUND",
                "Method not found!",
            ));
        };

        let start = request.params().get(START_PARAM).and_then(Value::as_u64).unwrap_or(0);
        if self.failing_offsets.contains(&start) {
            return RemoteCallResponse::failure(RemoteError::new(
                "INTERNAL_SERVER_ERROR",
                format!("page at {start} failed"),
            ));
        }

        let filter = request.params().get("filter").and_then(Value::as_object);
        let matching: Vec<&Record> = records
            .iter()
            .filter(|record| {
                filter.map_or(true, |filter| {
                    filter.iter().all(|(field, expected)| record.get(field) == Some(expected))
                })
            })
            .collect();

        let total = matching.len() as u64;
        let page: Vec<Record> = matching
            .iter()
            .skip(start as usize)
            .take(self.page_size as usize)
            .map(|record| (*record).clone())
            .collect();

        let response = RemoteCallResponse::success(Value::Array(page)).with_total(total);
        let next = start + self.page_size;
        if next < total {
            response.with_continuation(request.with_start(next))
        } else {
            response
        }
    }
}

#[async_trait]
impl PlatformSdk for FakePortal {
    async fn call_method(&self, request: &RemoteCallRequest) -> Result<RemoteCallResponse> {
        self.calls.lock().push(Call::Method(request.clone()));
        Ok(self.respond(request))
    }

    async fn call_batch(
        &self,
        batch: &BatchRequestSet,
        _halt_on_error: bool,
    ) -> Result<BatchResponse> {
        self.calls.lock().push(Call::Batch(
            batch.iter().map(|(key, request)| (key.to_string(), request.clone())).collect(),
        ));

        if let Some(error) = &self.batch_failure {
            return Err(error.clone());
        }

        // Sub-results of a batch never carry a continuation.
        Ok(batch
            .iter()
            .map(|(key, request)| {
                let response = self.respond(request);
                let stripped = match response.error() {
                    Some(error) => RemoteCallResponse::failure(error.clone()),
                    None => {
                        let total = response.total();
                        let (records, _) = response.into_parts();
                        let plain = RemoteCallResponse::success(Value::Array(records));
                        match total {
                            Some(total) => plain.with_total(total),
                            None => plain,
                        }
                    }
                };
                (key.to_string(), stripped)
            })
            .collect())
    }
}

/// IDs of the given records, in order.
pub fn ids(records: &[Record]) -> Vec<String> {
    records
        .iter()
        .filter_map(|record| record.get("ID").and_then(Value::as_str).map(str::to_string))
        .collect()
}
