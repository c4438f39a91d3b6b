//! Observability infrastructure
//!
//! Structured logging via `tracing`. Library code only emits events; the
//! binary decides where they go by calling [`init_logging`] once at startup.

pub mod logging;

pub use logging::{init_logging, LogFormat};
