//! Batched pagination planner
//!
//! The first page is fetched as an ordinary call because the portal only
//! reports `total` once a request has been made. Remaining offsets are then
//! grouped greedily into batches of at most `max_commands_per_batch`
//! commands and flushed one batch at a time.

use std::sync::Arc;

use bx24_domain::constants::{MAX_COMMANDS_PER_BATCH, PAGE_SIZE};
use bx24_domain::{BatchRequestSet, Bx24Error, Params, Record, RemoteCallRequest, Result};
use tracing::{debug, error, info};

use super::batch::BatchExecutor;
use super::invoker::MethodInvoker;
use super::ports::{PlatformSdk, ProgressSink};

/// Page size and per-batch command cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationLimits {
    page_size: u64,
    max_commands_per_batch: usize,
}

impl Default for PaginationLimits {
    fn default() -> Self {
        Self { page_size: PAGE_SIZE, max_commands_per_batch: MAX_COMMANDS_PER_BATCH }
    }
}

impl PaginationLimits {
    /// Custom limits. Both must be non-zero and the command cap may not
    /// exceed the platform's.
    pub fn new(page_size: u64, max_commands_per_batch: usize) -> Result<Self> {
        if page_size == 0 || max_commands_per_batch == 0 {
            return Err(Bx24Error::InvalidInput("pagination limits must be non-zero".into()));
        }
        if max_commands_per_batch > MAX_COMMANDS_PER_BATCH {
            return Err(Bx24Error::InvalidInput(format!(
                "at most {MAX_COMMANDS_PER_BATCH} commands fit in one batch"
            )));
        }
        Ok(Self { page_size, max_commands_per_batch })
    }

    /// Records per page.
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Commands per batch submission.
    pub fn max_commands_per_batch(&self) -> usize {
        self.max_commands_per_batch
    }
}

/// Key of the batch command fetching `offset`.
pub fn page_key(method: &str, offset: u64) -> String {
    format!("{method}_{offset}")
}

/// Lazily yields the batch groups covering every page after the first.
///
/// Offsets run `page_size, 2 * page_size, ...` while below `total`; each
/// group holds at most `max_commands_per_batch` commands and only the last
/// one may be partial.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    base: RemoteCallRequest,
    total: u64,
    limits: PaginationLimits,
    next_offset: Option<u64>,
}

impl BatchPlan {
    /// Plan the pages of `base` after the first, given the reported `total`.
    pub fn new(base: &RemoteCallRequest, total: u64, limits: PaginationLimits) -> Self {
        Self { base: base.clone(), total, limits, next_offset: Some(limits.page_size) }
    }

    /// Pages still to fetch after the first one.
    pub fn page_count(&self) -> u64 {
        if self.total <= self.limits.page_size {
            0
        } else {
            self.total.div_ceil(self.limits.page_size) - 1
        }
    }

    /// Number of batch submissions the plan will produce.
    pub fn group_count(&self) -> u64 {
        self.page_count().div_ceil(self.limits.max_commands_per_batch as u64)
    }
}

impl Iterator for BatchPlan {
    type Item = BatchRequestSet;

    fn next(&mut self) -> Option<Self::Item> {
        let mut group = BatchRequestSet::new();

        while group.len() < self.limits.max_commands_per_batch {
            let Some(offset) = self.next_offset.filter(|offset| *offset < self.total) else {
                self.next_offset = None;
                break;
            };
            self.next_offset = offset.checked_add(self.limits.page_size);

            // Offsets strictly increase, so keys are unique within the plan.
            if let Err(err) =
                group.insert(page_key(self.base.method(), offset), self.base.with_start(offset))
            {
                debug!(offset, error = %err, "skipping duplicate page");
            }
        }

        (!group.is_empty()).then_some(group)
    }
}

/// Fetches every page of a list method.
#[derive(Clone)]
pub struct PaginationPlanner {
    invoker: MethodInvoker,
    executor: BatchExecutor,
    limits: PaginationLimits,
}

impl PaginationPlanner {
    /// Planner with the platform's default limits.
    pub fn new(sdk: Arc<dyn PlatformSdk>) -> Self {
        Self::with_limits(sdk, PaginationLimits::default())
    }

    /// Planner with custom limits.
    pub fn with_limits(sdk: Arc<dyn PlatformSdk>, limits: PaginationLimits) -> Self {
        Self {
            invoker: MethodInvoker::new(sdk.clone()),
            executor: BatchExecutor::new(sdk),
            limits,
        }
    }

    /// Limits in effect.
    pub fn limits(&self) -> PaginationLimits {
        self.limits
    }

    /// Fetch all pages of `method`.
    ///
    /// Without a sink, every record is returned in one sequence. With a sink,
    /// the first page is delivered before any batch is submitted, then each
    /// non-empty per-command result is delivered as it arrives, and the
    /// returned sequence is empty.
    pub async fn fetch_all_pages(
        &self,
        method: &str,
        params: Params,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<Record>> {
        self.run(RemoteCallRequest::new(method, params), progress).await.inspect_err(|err| {
            error!(method, error = %err, "batched pagination failed");
        })
    }

    async fn run(
        &self,
        request: RemoteCallRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<Record>> {
        let first = self.invoker.invoke_request(request.clone(), false).await?;
        let total = first.total;

        if total == 0 {
            return Ok(Vec::new());
        }

        let mut aggregate = match progress {
            Some(sink) => {
                sink.deliver(first.data).await?;
                Vec::new()
            }
            None => first.data,
        };

        if total <= self.limits.page_size {
            return Ok(aggregate);
        }

        let plan = BatchPlan::new(&request, total, self.limits);
        info!(
            method = request.method(),
            total,
            pages = plan.page_count(),
            batches = plan.group_count(),
            "fetching remaining pages in batches"
        );

        for (index, group) in plan.enumerate() {
            debug!(method = request.method(), batch = index + 1, commands = group.len(), "flushing batch");
            let results = self.executor.execute(&group).await?;

            for (_, records) in results {
                if records.is_empty() {
                    continue;
                }
                match progress {
                    Some(sink) => sink.deliver(records).await?,
                    None => aggregate.extend(records),
                }
            }
        }

        Ok(aggregate)
    }
}
