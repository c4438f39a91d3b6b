//! Bitrix24 REST transport
//!
//! Implements the `PlatformSdk` port over the portal's JSON REST API:
//! - [`endpoint`]: URL construction for webhook and access-token modes
//! - [`query`]: nested query-string encoding used inside `batch` commands
//! - [`wire`]: response envelopes as the portal serializes them
//! - [`client`]: the transport itself

pub mod client;
pub mod endpoint;
pub mod query;
pub mod wire;

pub use client::RestClient;
pub use endpoint::PortalEndpoint;
