//! # Bx24 Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - HTTP client with retry and timeout support
//! - Bitrix24 REST transport implementing `PlatformSdk`
//! - Session initialization state (uninitialized / loading / ready)
//! - Configuration loading and logging setup
//!
//! ## Architecture
//! - Implements traits defined in `bx24-core`
//! - Contains all "impure" code (network I/O, environment, files)

pub mod config;
pub mod errors;
pub mod http;
pub mod observability;
pub mod rest;
pub mod session;

// Re-export commonly used items
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use rest::{PortalEndpoint, RestClient};
pub use session::{global, install_global, PlatformSession, SessionPhase};
