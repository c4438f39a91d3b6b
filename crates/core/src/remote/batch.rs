//! Batch submission with per-key failure isolation

use std::sync::Arc;

use bx24_domain::constants::MAX_COMMANDS_PER_BATCH;
use bx24_domain::{BatchRequestSet, BatchResultSet, Bx24Error, Result};
use tracing::{debug, error, warn};

use super::ports::PlatformSdk;

/// Submits a batch request set and gathers per-key records.
///
/// A failing sub-request is logged and recorded as an empty sequence; it never
/// fails the batch. Only a transport failure or an unreadable batch response
/// does.
#[derive(Clone)]
pub struct BatchExecutor {
    sdk: Arc<dyn PlatformSdk>,
}

impl BatchExecutor {
    /// Executor over the given SDK.
    pub fn new(sdk: Arc<dyn PlatformSdk>) -> Self {
        Self { sdk }
    }

    /// Submit `batch` in one call. Sets above the platform cap are rejected
    /// before anything is sent.
    pub async fn execute(&self, batch: &BatchRequestSet) -> Result<BatchResultSet> {
        if batch.is_empty() {
            return Ok(BatchResultSet::new());
        }
        if batch.len() > MAX_COMMANDS_PER_BATCH {
            return Err(Bx24Error::InvalidInput(format!(
                "batch holds {} commands, the platform accepts at most {}",
                batch.len(),
                MAX_COMMANDS_PER_BATCH
            )));
        }

        debug!(commands = batch.len(), "submitting batch");
        let mut response = self.sdk.call_batch(batch, false).await.inspect_err(|err| {
            error!(commands = batch.len(), error = %err, "batch submission failed");
        })?;

        let mut results = BatchResultSet::new();
        for key in batch.keys() {
            let Some(sub) = response.remove(key) else {
                warn!(key, "batch response has no entry for command");
                continue;
            };

            if let Some(remote) = sub.error() {
                warn!(
                    key,
                    code = remote.code.as_deref().unwrap_or_default(),
                    description = remote.description.as_deref().unwrap_or_default(),
                    "batch command failed"
                );
                results.push(key, Vec::new());
            } else {
                let (records, _) = sub.into_parts();
                results.push(key, records);
            }
        }

        if !response.is_empty() {
            debug!(unexpected = response.len(), "ignoring batch entries that were not requested");
        }

        Ok(results)
    }
}
