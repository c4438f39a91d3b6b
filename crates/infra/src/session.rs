//! Platform session lifecycle
//!
//! A session owns the configuration and lazily builds the REST transport on
//! first use. Initialization runs once: concurrent callers share the same
//! in-flight attempt, and a failed attempt resets the session so the next
//! caller retries.
//!
//! ```text
//! Uninitialized ──sdk()──▶ Loading ──ok──▶ Ready
//!       ▲                     │
//!       └────────err──────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use bx24_core::{EntityFetcher, PlatformSdk};
use bx24_domain::{Bx24Error, Config, RemoteCallRequest, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::{error, info};

use crate::rest::RestClient;

const HOSTED_HINT: &str =
    "check that the portal is reachable and the webhook or access token is valid";

type InitFuture = Shared<BoxFuture<'static, Result<Arc<RestClient>>>>;

enum InitState {
    Uninitialized,
    Loading(InitFuture),
    Ready(Arc<RestClient>),
}

/// Observable initialization phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    Loading,
    Ready,
}

/// Lazily initialized connection to one portal.
pub struct PlatformSession {
    config: Config,
    state: Mutex<InitState>,
}

impl PlatformSession {
    pub fn new(config: Config) -> Self {
        Self { config, state: Mutex::new(InitState::Uninitialized) }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn phase(&self) -> SessionPhase {
        match &*self.state.lock() {
            InitState::Uninitialized => SessionPhase::Uninitialized,
            InitState::Loading(_) => SessionPhase::Loading,
            InitState::Ready(_) => SessionPhase::Ready,
        }
    }

    /// The ready transport, initializing it if needed.
    ///
    /// # Errors
    /// `PlatformLoad` when the transport cannot be built from the
    /// configuration, `Initialization` when the handshake fails or times out.
    pub async fn sdk(&self) -> Result<Arc<RestClient>> {
        let attempt = {
            let mut state = self.state.lock();
            match &*state {
                InitState::Ready(client) => return Ok(Arc::clone(client)),
                InitState::Loading(attempt) => attempt.clone(),
                InitState::Uninitialized => {
                    let attempt = initialize(self.config.clone()).boxed().shared();
                    *state = InitState::Loading(attempt.clone());
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        // A later attempt may already be loading; only settle our own.
        let mut state = self.state.lock();
        if matches!(&*state, InitState::Loading(current) if current.ptr_eq(&attempt)) {
            *state = match &outcome {
                Ok(client) => InitState::Ready(Arc::clone(client)),
                Err(_) => InitState::Uninitialized,
            };
        }

        outcome
    }

    /// Entity facade bound to this session's transport.
    pub async fn fetcher(&self) -> Result<EntityFetcher> {
        let sdk: Arc<dyn PlatformSdk> = self.sdk().await?;
        Ok(EntityFetcher::new(sdk))
    }
}

async fn initialize(config: Config) -> Result<Arc<RestClient>> {
    info!(portal = ?config.portal, "loading Bitrix24 REST client");

    let client = RestClient::new(&config.portal, &config.http).map_err(|err| {
        error!(error = %err, kind = err.label(), "failed to load REST client");
        match err {
            Bx24Error::PlatformLoad(_) => err,
            other => Bx24Error::PlatformLoad(other.to_string()),
        }
    })?;

    let handshake = RemoteCallRequest::bare(config.session.handshake_method.as_str());
    let limit = Duration::from_secs(config.session.init_timeout_secs);

    let failure = match tokio::time::timeout(limit, client.call_method(&handshake)).await {
        Ok(Ok(response)) => match response.error() {
            None => {
                info!(method = handshake.method(), host = client.endpoint().host(), "Bitrix24 session ready");
                return Ok(Arc::new(client));
            }
            Some(remote) => Bx24Error::from(remote.clone()).to_string(),
        },
        Ok(Err(err)) => err.to_string(),
        Err(_) => format!("handshake did not complete within {}s", limit.as_secs()),
    };

    error!(method = handshake.method(), reason = %failure, "Bitrix24 session initialization failed");
    Err(Bx24Error::Initialization(format!("{failure}; {HOSTED_HINT}")))
}

static GLOBAL_SESSION: OnceCell<PlatformSession> = OnceCell::new();

/// Install the process-wide session.
///
/// Installing the same configuration twice returns the existing session.
///
/// # Errors
/// `Config` if a session with a different configuration is already installed.
pub fn install_global(config: Config) -> Result<&'static PlatformSession> {
    let session = GLOBAL_SESSION.get_or_init(|| PlatformSession::new(config.clone()));
    if session.config() != &config {
        return Err(Bx24Error::Config(
            "a global session with a different configuration is already installed".into(),
        ));
    }
    Ok(session)
}

/// The process-wide session installed by [`install_global`].
pub fn global() -> Result<&'static PlatformSession> {
    GLOBAL_SESSION
        .get()
        .ok_or_else(|| Bx24Error::Config("no global session installed".into()))
}
