//! Batch request and result sets
//!
//! Keys are caller-defined and unique within one submission. Request sets keep
//! insertion order so results can be walked in the order they were planned, but
//! nothing downstream relies on it.

use std::collections::HashMap;

use super::{Record, RemoteCallRequest, RemoteCallResponse};
use crate::errors::{Bx24Error, Result};

/// Named sub-requests submitted together as one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequestSet {
    entries: Vec<(String, RemoteCallRequest)>,
}

impl BatchRequestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sub-request. Duplicate keys are rejected.
    pub fn insert(&mut self, key: impl Into<String>, request: RemoteCallRequest) -> Result<()> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(Bx24Error::InvalidInput(format!("duplicate batch key: {key}")));
        }
        self.entries.push((key, request));
        Ok(())
    }

    /// True when `key` is already taken.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(existing, _)| existing == key)
    }

    /// Sub-request stored under `key`.
    pub fn get(&self, key: &str) -> Option<&RemoteCallRequest> {
        self.entries.iter().find(|(existing, _)| existing == key).map(|(_, request)| request)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    /// Keyed sub-requests in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RemoteCallRequest)> {
        self.entries.iter().map(|(key, request)| (key.as_str(), request))
    }
}

/// Raw per-key responses of one batch submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResponse {
    entries: HashMap<String, RemoteCallResponse>,
}

impl BatchResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, response: RemoteCallResponse) {
        self.entries.insert(key.into(), response);
    }

    pub fn get(&self, key: &str) -> Option<&RemoteCallResponse> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<RemoteCallResponse> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl FromIterator<(String, RemoteCallResponse)> for BatchResponse {
    fn from_iter<I: IntoIterator<Item = (String, RemoteCallResponse)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().collect() }
    }
}

/// Per-key records of one batch. A failed sub-request maps to an empty
/// sequence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchResultSet {
    entries: Vec<(String, Vec<Record>)>,
}

impl BatchResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result of one sub-request.
    pub fn push(&mut self, key: impl Into<String>, records: Vec<Record>) {
        self.entries.push((key.into(), records));
    }

    /// Records stored under `key`.
    pub fn get(&self, key: &str) -> Option<&[Record]> {
        self.entries.iter().find(|(existing, _)| existing == key).map(|(_, records)| records.as_slice())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> {
        self.entries.iter().map(|(key, records)| (key.as_str(), records.as_slice()))
    }

    /// Concatenate every key's records.
    pub fn into_records(self) -> Vec<Record> {
        self.entries.into_iter().flat_map(|(_, records)| records).collect()
    }
}

impl IntoIterator for BatchResultSet {
    type Item = (String, Vec<Record>);
    type IntoIter = std::vec::IntoIter<(String, Vec<Record>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
