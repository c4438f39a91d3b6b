//! Entity fetch facade

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use bx24_domain::{
    is_list_method, BatchRequestSet, EntityQuery, Record, RemoteCallRequest, Result,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use super::batch::BatchExecutor;
use super::invoker::MethodInvoker;
use super::pagination::{PaginationLimits, PaginationPlanner};
use super::ports::{PlatformSdk, ProgressSink};

/// Select list used by per-parent batches when the caller gives none.
const DEFAULT_RELATED_SELECT: &str = "ID";

/// Chooses between a single auto-paginated call and batched pagination.
///
/// Batched pagination is used only for list methods with `use_batch` set. If
/// it fails for any reason the facade logs a warning and retries as a single
/// auto-paginated call.
#[derive(Clone)]
pub struct EntityFetcher {
    invoker: MethodInvoker,
    planner: PaginationPlanner,
    executor: BatchExecutor,
}

impl EntityFetcher {
    pub fn new(sdk: Arc<dyn PlatformSdk>) -> Self {
        Self::with_limits(sdk, PaginationLimits::default())
    }

    pub fn with_limits(sdk: Arc<dyn PlatformSdk>, limits: PaginationLimits) -> Self {
        Self {
            invoker: MethodInvoker::new(sdk.clone()),
            planner: PaginationPlanner::with_limits(sdk.clone(), limits),
            executor: BatchExecutor::new(sdk),
        }
    }

    /// Fetch entities of `entity_type` (the method name, e.g. `crm.deal.list`).
    ///
    /// `progress` is only honoured on the batched path; see
    /// [`PaginationPlanner::fetch_all_pages`].
    pub async fn fetch_entities(
        &self,
        entity_type: &str,
        query: &EntityQuery,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<Record>> {
        let params = query.to_params();

        if query.use_batch && is_list_method(entity_type) {
            match self.planner.fetch_all_pages(entity_type, params.clone(), progress).await {
                Ok(records) => return Ok(records),
                Err(err) => {
                    warn!(
                        entity_type,
                        error = %err,
                        "batched fetch failed, falling back to a single call"
                    );
                }
            }
        }

        let outcome = self.invoker.invoke(entity_type, params, true).await?;
        Ok(outcome.data)
    }

    /// Fetch the children of one parent, e.g. deals of a company.
    pub async fn fetch_related_entities(
        &self,
        entity_type: &str,
        parent_field: &str,
        parent_id: &str,
        query: &EntityQuery,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<Record>> {
        let scoped = query.clone().filter(parent_field, parent_id);
        self.fetch_entities(entity_type, &scoped, progress).await
    }

    /// Fetch the children of many parents with one batch command per parent.
    ///
    /// Each parent gets a single page of results (no per-parent pagination).
    /// Parents whose command failed map to an empty sequence; duplicates in
    /// `parent_ids` are fetched once.
    pub async fn fetch_related_entities_for_multiple(
        &self,
        entity_type: &str,
        parent_field: &str,
        parent_ids: &[String],
        query: &EntityQuery,
    ) -> Result<HashMap<String, Vec<Record>>> {
        let mut seen = HashSet::new();
        let unique: Vec<&str> =
            parent_ids.iter().map(String::as_str).filter(|id| seen.insert(*id)).collect();

        let mut template = query.clone();
        if template.select.is_empty() {
            template.select = vec![DEFAULT_RELATED_SELECT.to_string()];
        }

        let chunk_size = self.planner.limits().max_commands_per_batch();
        let mut results = HashMap::with_capacity(unique.len());

        for (chunk_index, chunk) in unique.chunks(chunk_size).enumerate() {
            // Index keys avoid any ambiguity when ids contain separators.
            let mut batch = BatchRequestSet::new();
            let mut owners: HashMap<String, &str> = HashMap::with_capacity(chunk.len());

            for (position, parent_id) in chunk.iter().enumerate() {
                let key = format!("parent_{}", chunk_index * chunk_size + position);
                let mut scoped = template.clone();
                scoped.filter.insert(parent_field.to_string(), Value::String((*parent_id).to_string()));

                batch.insert(key.clone(), RemoteCallRequest::new(entity_type, scoped.to_params()))?;
                owners.insert(key, *parent_id);
            }

            debug!(entity_type, parents = chunk.len(), "fetching related entities in one batch");
            let batch_results = self.executor.execute(&batch).await.inspect_err(|err| {
                error!(entity_type, parent_field, error = %err, "related entities batch failed");
            })?;

            for (key, records) in batch_results {
                if let Some(parent_id) = owners.get(&key) {
                    results.insert((*parent_id).to_string(), records);
                }
            }
        }

        Ok(results)
    }
}
