//! # Bx24 Domain
//!
//! Domain types for the Bitrix24 REST bridge.
//!
//! This crate contains:
//! - Remote call and batch data types
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Platform constants (page size, batch command cap)
//!
//! ## Architecture
//! - No dependencies on other bridge crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
