//! Remote method orchestration
//!
//! Data flows facade → invoker (first page) → planner → batch executor, and
//! results travel back either aggregated or through a [`ports::ProgressSink`].
//! All work is sequential: at most one request is in flight per operation.

pub mod batch;
pub mod entities;
pub mod invoker;
pub mod pagination;
pub mod ports;
