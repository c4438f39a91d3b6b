//! Error types used throughout the bridge

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::GENERIC_REMOTE_ERROR;

/// Main error type for the bridge
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum Bx24Error {
    /// The platform transport could not be brought up (bad endpoint, client
    /// construction failure). Fatal for every later operation.
    #[error("Platform unavailable: {0}")]
    PlatformLoad(String),

    /// The transport exists but the session handshake failed or never
    /// completed.
    #[error("Initialization error: {0}")]
    Initialization(String),

    /// A remote call reported a structured error.
    #[error("{description}")]
    RemoteApi { code: Option<String>, description: String },

    /// The batch response could not be interpreted.
    #[error("Batch processing error: {0}")]
    BatchProcessing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Bx24Error {
    /// Build a remote error, falling back to a generic description.
    pub fn remote(code: Option<String>, description: Option<String>) -> Self {
        let description = description
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| GENERIC_REMOTE_ERROR.to_string());
        Self::RemoteApi { code, description }
    }

    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::PlatformLoad(_) => "platform_load",
            Self::Initialization(_) => "initialization",
            Self::RemoteApi { .. } => "remote_api",
            Self::BatchProcessing(_) => "batch_processing",
            Self::Config(_) => "config",
            Self::Network(_) => "network",
            Self::Auth(_) => "auth",
            Self::NotFound(_) => "not_found",
            Self::InvalidInput(_) => "invalid_input",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Bx24Error>;
