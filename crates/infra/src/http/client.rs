use std::time::Duration;

use bx24_domain::{Bx24Error, HttpConfig};
use reqwest::{Client as ReqwestClient, RequestBuilder, StatusCode};
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::errors::InfraError;

const USER_AGENT: &str = concat!("bx24-bridge/", env!("CARGO_PKG_VERSION"));

/// Raw HTTP reply: status plus the fully buffered body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP client with built-in retry and timeout support.
///
/// Server errors (the portal answers `503` when its request quota is
/// exhausted) and transient connection failures are retried with
/// exponential backoff. Client errors are returned to the caller as-is.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Build a client from the `http` configuration section.
    pub fn from_config(config: &HttpConfig) -> Result<Self, Bx24Error> {
        Self::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .max_attempts(config.max_attempts)
            .base_backoff(Duration::from_millis(config.base_backoff_ms))
            .build()
    }

    /// POST a JSON body and buffer the reply.
    pub async fn post_json<B>(&self, url: Url, body: &B) -> Result<HttpReply, Bx24Error>
    where
        B: Serialize + ?Sized,
    {
        let builder = self.client.post(url).json(body);
        let response = self.send(builder).await?;
        let status = response.status();
        let body = response.text().await.map_err(|err| Bx24Error::from(InfraError::from(err)))?;

        Ok(HttpReply { status, body })
    }

    /// Execute the provided request builder with retry semantics.
    pub async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, Bx24Error> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                Bx24Error::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request =
                cloned_builder.build().map_err(|err| Bx24Error::from(InfraError::from(err)))?;

            let method = request.method().clone();
            let path = request.url().path().to_string();
            debug!(attempt = attempt + 1, %method, path = %redact_path(&path), "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %status, "received HTTP response");

                    if status.is_server_error() && attempt + 1 < attempts {
                        warn!(attempt = attempt + 1, %status, "portal returned server error, retrying");
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    let err = err.without_url();
                    debug!(attempt = attempt + 1, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(InfraError::from(err).into());
                }
            }
        }

        Err(Bx24Error::Internal("http client exhausted retries without producing a result".into()))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        let defaults = HttpConfig::default();
        Self {
            timeout: Duration::from_secs(defaults.timeout_secs),
            max_attempts: defaults.max_attempts,
            base_backoff: Duration::from_millis(defaults.base_backoff_ms),
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn build(self) -> Result<HttpClient, Bx24Error> {
        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .no_proxy()
            .build()
            .map_err(|err| Bx24Error::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

// Webhook paths embed the user id and secret: /rest/<user>/<secret>/<method>.json
fn redact_path(path: &str) -> String {
    let method = path.rsplit('/').next().unwrap_or_default();
    match path.find("/rest/") {
        Some(idx) => format!("{}/rest/.../{method}", &path[..idx]),
        None => method.to_string(),
    }
}
