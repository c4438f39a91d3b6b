//! Single remote call with optional auto-pagination

use std::sync::Arc;

use bx24_domain::{Bx24Error, Params, Record, RemoteCallRequest, Result};
use tracing::{debug, error};

use super::ports::PlatformSdk;

/// Records gathered by one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    pub data: Vec<Record>,
    /// Portal-reported total, or the number of accumulated records when the
    /// portal does not report one.
    pub total: u64,
}

/// Wraps a single remote call.
///
/// With auto-pagination enabled the invoker follows the continuation attached
/// to each response, strictly one page after the other, until the portal
/// stops signalling more pages.
#[derive(Clone)]
pub struct MethodInvoker {
    sdk: Arc<dyn PlatformSdk>,
}

impl MethodInvoker {
    /// Invoker over the given SDK.
    pub fn new(sdk: Arc<dyn PlatformSdk>) -> Self {
        Self { sdk }
    }

    /// Call `method` with `params`, following continuations when `auto_paginate` is set.
    pub async fn invoke(
        &self,
        method: &str,
        params: Params,
        auto_paginate: bool,
    ) -> Result<InvocationOutcome> {
        self.invoke_request(RemoteCallRequest::new(method, params), auto_paginate).await
    }

    /// Same as [`Self::invoke`] for a prebuilt request.
    pub async fn invoke_request(
        &self,
        request: RemoteCallRequest,
        auto_paginate: bool,
    ) -> Result<InvocationOutcome> {
        let method = request.method().to_string();
        let mut accumulated: Vec<Record> = Vec::new();
        let mut current = request;
        let mut page = 1usize;

        loop {
            let response = self.sdk.call_method(&current).await.inspect_err(|err| {
                error!(method = %method, page, error = %err, "remote call failed");
            })?;

            if let Some(remote) = response.error() {
                error!(
                    method = %method,
                    page,
                    code = remote.code.as_deref().unwrap_or_default(),
                    description = remote.description.as_deref().unwrap_or_default(),
                    "remote call returned an error"
                );
                return Err(Bx24Error::from(remote.clone()));
            }

            let reported_total = response.total();
            let (records, continuation) = response.into_parts();
            accumulated.extend(records);

            match continuation {
                Some(next) if auto_paginate => {
                    debug!(method = %method, page, accumulated = accumulated.len(), "following continuation");
                    current = next;
                    page += 1;
                }
                _ => {
                    let total = reported_total.unwrap_or(accumulated.len() as u64);
                    debug!(method = %method, pages = page, total, "remote call complete");
                    return Ok(InvocationOutcome { data: accumulated, total });
                }
            }
        }
    }
}
