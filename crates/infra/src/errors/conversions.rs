//! Conversions from external infrastructure errors into domain errors.

use bx24_domain::Bx24Error;
use reqwest::{Error as HttpError, StatusCode};
use serde_json::Error as JsonError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub Bx24Error);

impl From<InfraError> for Bx24Error {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<Bx24Error> for InfraError {
    fn from(value: Bx24Error) -> Self {
        InfraError(value)
    }
}

impl InfraError {
    /// Classify a non-success HTTP status that carried no readable error body.
    pub fn from_status(status: StatusCode) -> Self {
        let code = status.as_u16();
        let message =
            format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

        InfraError(match code {
            401 | 403 => Bx24Error::Auth(message),
            404 => Bx24Error::NotFound(message),
            429 => Bx24Error::Network(message),
            400..=499 => Bx24Error::InvalidInput(message),
            _ => Bx24Error::Network(message),
        })
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → Bx24Error */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        if value.is_timeout() {
            return InfraError(Bx24Error::Network("HTTP request timed out".into()));
        }

        #[cfg(not(target_arch = "wasm32"))]
        if value.is_connect() {
            return InfraError(Bx24Error::Network("HTTP connection failure".into()));
        }

        if let Some(status) = value.status() {
            return Self::from_status(status);
        }

        if value.is_builder() {
            return InfraError(Bx24Error::PlatformLoad(format!("invalid HTTP client setup: {value}")));
        }

        InfraError(Bx24Error::Network(value.to_string()))
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → Bx24Error */
/* -------------------------------------------------------------------------- */

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(Bx24Error::Internal(format!("malformed JSON from portal: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → Bx24Error */
/* -------------------------------------------------------------------------- */

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(Bx24Error::PlatformLoad(format!("invalid portal URL: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
