//! Configuration structures
//!
//! Loaded by `bx24-infra`'s config loader from the environment or from a
//! JSON/TOML file. Only the portal section is required.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_HANDSHAKE_METHOD;

/// Top-level bridge configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub portal: PortalAuth,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Configuration with default HTTP and session settings.
    pub fn new(portal: PortalAuth) -> Self {
        Self { portal, http: HttpConfig::default(), session: SessionConfig::default() }
    }
}

/// How requests authenticate against the portal.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PortalAuth {
    /// Inbound webhook: `https://<portal>/rest/<user>/<secret>/`
    Webhook { url: String },

    /// In-portal application: OAuth token issued to the app iframe.
    AccessToken { domain: String, token: String },
}

// Webhook URLs and tokens are credentials; never print them.
impl fmt::Debug for PortalAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhook { url } => {
                f.debug_struct("Webhook").field("url", &redact_webhook(url)).finish()
            }
            Self::AccessToken { domain, .. } => f
                .debug_struct("AccessToken")
                .field("domain", domain)
                .field("token", &"***")
                .finish(),
        }
    }
}

/// Strip the credential part of a webhook URL for logging.
pub fn redact_webhook(url: &str) -> String {
    match url.find("/rest/") {
        Some(idx) => format!("{}/rest/***", &url[..idx]),
        None => "***".to_string(),
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Total attempts per request (initial try + retries).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
        }
    }
}

/// Session initialization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_handshake_method")]
    pub handshake_method: String,
    #[serde(default = "default_init_timeout_secs")]
    pub init_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            handshake_method: default_handshake_method(),
            init_timeout_secs: default_init_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> usize {
    3
}

fn default_base_backoff_ms() -> u64 {
    200
}

fn default_handshake_method() -> String {
    DEFAULT_HANDSHAKE_METHOD.to_string()
}

fn default_init_timeout_secs() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_hides_webhook_secret() {
        let auth = PortalAuth::Webhook {
            url: "https://acme.bitrix24.com/rest/1/s3cr3t/".to_string(),
        };
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("acme.bitrix24.com"));
        assert!(!rendered.contains("s3cr3t"));
    }

    #[test]
    fn debug_output_hides_access_token() {
        let auth = PortalAuth::AccessToken {
            domain: "acme.bitrix24.com".to_string(),
            token: "tok-123".to_string(),
        };
        assert!(!format!("{auth:?}").contains("tok-123"));
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let config: Config = serde_json::from_str(
            r#"{"portal": {"mode": "webhook", "url": "https://acme.bitrix24.com/rest/1/x/"}}"#,
        )
        .expect("parse");

        assert_eq!(config.http, HttpConfig::default());
        assert_eq!(config.session.handshake_method, DEFAULT_HANDSHAKE_METHOD);
        assert_eq!(config.session.init_timeout_secs, 10);
    }
}
