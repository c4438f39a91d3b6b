use bx24_domain::{Bx24Error, Result};
use tracing_subscriber::EnvFilter;

/// Environment variable consulted before `RUST_LOG`.
pub const LOG_ENV: &str = "BX24_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Install the global `tracing` subscriber, writing to stderr.
///
/// Filter directives come from `BX24_LOG`, then `RUST_LOG`, then `info`.
///
/// # Errors
/// `Internal` if a global subscriber is already installed.
pub fn init_logging(format: LogFormat) -> Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false);

    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|err| Bx24Error::Internal(format!("failed to install log subscriber: {err}")))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_install_is_rejected() {
        // The first call may lose to another test; the second always fails.
        let _ = init_logging(LogFormat::Json);
        let err = init_logging(LogFormat::Text).unwrap_err();
        assert!(matches!(err, Bx24Error::Internal(_)));
    }
}
