//! # Bx24 Core
//!
//! Pagination and batching logic over the Bitrix24 platform API - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - The platform port (`PlatformSdk`) and the progress sink port
//! - Method invoker with auto-pagination
//! - Batch executor with per-key failure isolation
//! - Batched pagination planner
//! - Entity fetch facade
//!
//! ## Architecture Principles
//! - Only depends on `bx24-domain`
//! - No HTTP or platform code
//! - All external dependencies via traits

pub mod remote;

pub use remote::batch::BatchExecutor;
pub use remote::entities::EntityFetcher;
pub use remote::invoker::{InvocationOutcome, MethodInvoker};
pub use remote::pagination::{BatchPlan, PaginationLimits, PaginationPlanner};
pub use remote::ports::{ChannelSink, PlatformSdk, ProgressSink};
