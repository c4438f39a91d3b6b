//! Configuration loader
//!
//! Loads bridge configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If no portal credentials are set, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `BX24_WEBHOOK_URL`: Inbound webhook URL (takes precedence)
//! - `BX24_DOMAIN` + `BX24_ACCESS_TOKEN`: Portal domain and OAuth token
//! - `BX24_HTTP_TIMEOUT_SECS`: Per-request timeout in seconds
//! - `BX24_HTTP_MAX_ATTEMPTS`: Total attempts per request (initial + retries)
//! - `BX24_HTTP_BACKOFF_MS`: Base retry backoff in milliseconds
//! - `BX24_HANDSHAKE_METHOD`: Method called to verify the session
//! - `BX24_INIT_TIMEOUT_SECS`: Handshake timeout in seconds
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./bx24.json` or `./bx24.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../bx24.json` or `../bx24.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use bx24_domain::{Bx24Error, Config, PortalAuth, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If no portal
/// credentials are present there, falls back to loading from a config file.
///
/// # Errors
/// Returns `Bx24Error::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Portal credentials are required; tuning variables fall back to their
/// defaults when unset.
///
/// # Errors
/// Returns `Bx24Error::Config` if credentials are missing or a tuning
/// variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let portal = match std::env::var("BX24_WEBHOOK_URL").ok().filter(|url| !url.is_empty()) {
        Some(url) => PortalAuth::Webhook { url },
        None => PortalAuth::AccessToken {
            domain: env_var("BX24_DOMAIN")?,
            token: env_var("BX24_ACCESS_TOKEN")?,
        },
    };

    let mut config = Config::new(portal);

    if let Some(secs) = env_parse::<u64>("BX24_HTTP_TIMEOUT_SECS")? {
        config.http.timeout_secs = secs;
    }
    if let Some(attempts) = env_parse::<usize>("BX24_HTTP_MAX_ATTEMPTS")? {
        config.http.max_attempts = attempts;
    }
    if let Some(backoff) = env_parse::<u64>("BX24_HTTP_BACKOFF_MS")? {
        config.http.base_backoff_ms = backoff;
    }
    if let Ok(method) = std::env::var("BX24_HANDSHAKE_METHOD") {
        if !method.trim().is_empty() {
            config.session.handshake_method = method;
        }
    }
    if let Some(secs) = env_parse::<u64>("BX24_INIT_TIMEOUT_SECS")? {
        config.session.init_timeout_secs = secs;
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `Bx24Error::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(Bx24Error::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            Bx24Error::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| Bx24Error::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| Bx24Error::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| Bx24Error::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(Bx24Error::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["bx24.json", "bx24.toml", "config.json", "config.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `Bx24Error::Config` if the variable is unset or empty.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Bx24Error::Config(format!("Missing required environment variable: {}", key)))
}

/// Parse an optional numeric environment variable.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| Bx24Error::Config(format!("Invalid value for {}: {}", key, e))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const VARS: [&str; 8] = [
        "BX24_WEBHOOK_URL",
        "BX24_DOMAIN",
        "BX24_ACCESS_TOKEN",
        "BX24_HTTP_TIMEOUT_SECS",
        "BX24_HTTP_MAX_ATTEMPTS",
        "BX24_HTTP_BACKOFF_MS",
        "BX24_HANDSHAKE_METHOD",
        "BX24_INIT_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for key in VARS {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_webhook() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BX24_WEBHOOK_URL", "https://acme.bitrix24.com/rest/1/abc/");
        std::env::set_var("BX24_HTTP_MAX_ATTEMPTS", "5");
        std::env::set_var("BX24_HANDSHAKE_METHOD", "profile");

        let config = load_from_env().expect("config from env");
        assert_eq!(
            config.portal,
            PortalAuth::Webhook { url: "https://acme.bitrix24.com/rest/1/abc/".into() }
        );
        assert_eq!(config.http.max_attempts, 5);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.session.handshake_method, "profile");

        clear_env();
    }

    #[test]
    fn test_load_from_env_access_token() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BX24_DOMAIN", "acme.bitrix24.com");
        std::env::set_var("BX24_ACCESS_TOKEN", "tok");
        std::env::set_var("BX24_INIT_TIMEOUT_SECS", "3");

        let config = load_from_env().expect("config from env");
        assert_eq!(
            config.portal,
            PortalAuth::AccessToken { domain: "acme.bitrix24.com".into(), token: "tok".into() }
        );
        assert_eq!(config.session.init_timeout_secs, 3);

        clear_env();
    }

    #[test]
    fn test_load_from_env_missing_credentials() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BX24_DOMAIN", "acme.bitrix24.com");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, Bx24Error::Config(ref msg) if msg.contains("BX24_ACCESS_TOKEN")));

        clear_env();
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_env();

        std::env::set_var("BX24_WEBHOOK_URL", "https://acme.bitrix24.com/rest/1/abc/");
        std::env::set_var("BX24_HTTP_TIMEOUT_SECS", "soon");

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, Bx24Error::Config(ref msg) if msg.contains("BX24_HTTP_TIMEOUT_SECS")));

        clear_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "portal": {
                "mode": "webhook",
                "url": "https://acme.bitrix24.com/rest/1/abc/"
            },
            "http": {
                "timeout_secs": 10,
                "max_attempts": 2,
                "base_backoff_ms": 100
            }
        }"#;

        let mut temp_file = NamedTempFile::with_suffix(".json").expect("temp file");
        temp_file.write_all(json_content.as_bytes()).expect("write");

        let config = load_from_file(Some(temp_file.path().to_path_buf())).expect("config");
        assert_eq!(config.http.timeout_secs, 10);
        assert_eq!(config.http.max_attempts, 2);
        assert_eq!(config.session.handshake_method, "server.time");
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
            [portal]
            mode = "access_token"
            domain = "acme.bitrix24.com"
            token = "tok"

            [session]
            handshake_method = "profile"
            init_timeout_secs = 4
        "#;

        let mut temp_file = NamedTempFile::with_suffix(".toml").expect("temp file");
        temp_file.write_all(toml_content.as_bytes()).expect("write");

        let config = load_from_file(Some(temp_file.path().to_path_buf())).expect("config");
        assert!(matches!(config.portal, PortalAuth::AccessToken { .. }));
        assert_eq!(config.session.init_timeout_secs, 4);
        assert_eq!(config.http.max_attempts, 3);
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/bx24.json")));
        assert!(matches!(result, Err(Bx24Error::Config(ref msg)) if msg.contains("not found")));
    }

    #[test]
    fn test_load_from_file_invalid_format() {
        let mut temp_file = NamedTempFile::with_suffix(".json").expect("temp file");
        temp_file.write_all(b"{ portal: ").expect("write");

        let result = load_from_file(Some(temp_file.path().to_path_buf()));
        assert!(matches!(result, Err(Bx24Error::Config(ref msg)) if msg.contains("Invalid JSON")));
    }

    #[test]
    fn test_unsupported_extension() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").expect("temp file");
        temp_file.write_all(b"portal: {}").expect("write");

        let result = load_from_file(Some(temp_file.path().to_path_buf()));
        assert!(matches!(result, Err(Bx24Error::Config(ref msg)) if msg.contains("yaml")));
    }
}
