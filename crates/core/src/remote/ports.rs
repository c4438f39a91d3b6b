//! Port interfaces for the platform API and streaming consumers

use async_trait::async_trait;
use bx24_domain::{
    BatchRequestSet, BatchResponse, Bx24Error, Record, RemoteCallRequest, RemoteCallResponse,
    Result,
};
use tokio::sync::mpsc;

/// The platform's remote invocation entry points.
///
/// Implementations own the wire protocol and authentication. A structured
/// remote error is reported inside the response, not as `Err`; `Err` is
/// reserved for transport-level failures.
#[async_trait]
pub trait PlatformSdk: Send + Sync {
    /// Issue one remote call. A response signalling more pages carries the
    /// continuation request for the next page.
    async fn call_method(&self, request: &RemoteCallRequest) -> Result<RemoteCallResponse>;

    /// Submit all sub-requests as one batch. With `halt_on_error` unset, the
    /// platform keeps executing after a failing sub-request.
    async fn call_batch(
        &self,
        batch: &BatchRequestSet,
        halt_on_error: bool,
    ) -> Result<BatchResponse>;
}

/// Receives records page by page instead of accumulating them.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Deliver one page. An error aborts the fetch that produced it.
    async fn deliver(&self, records: Vec<Record>) -> Result<()>;
}

#[async_trait]
impl<F> ProgressSink for F
where
    F: Fn(Vec<Record>) -> Result<()> + Send + Sync,
{
    async fn deliver(&self, records: Vec<Record>) -> Result<()> {
        self(records)
    }
}

/// Forwards pages into a bounded channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<Vec<Record>>,
}

impl ChannelSink {
    pub fn new(sender: mpsc::Sender<Vec<Record>>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl ProgressSink for ChannelSink {
    async fn deliver(&self, records: Vec<Record>) -> Result<()> {
        self.sender
            .send(records)
            .await
            .map_err(|_| Bx24Error::Internal("progress receiver dropped".into()))
    }
}
