//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `ConfigLoader` layering `.env`, environment and explicit values.
//! - Validate bounds and build the final `Config`.
//!
//! Does NOT handle:
//! - Direct environment variable parsing logic (delegated to env.rs).
//!
//! Invariants / Assumptions:
//! - Later layers overwrite earlier ones; callers apply `from_env()` before explicit overrides.
//! - An API token takes precedence over a session key when both are present.
//! - A max wait of zero seconds means "no deadline".

use secrecy::SecretString;
use std::time::Duration;

use super::env::apply_env;
use super::error::ConfigError;
use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_WAIT_SECS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_REALTIME_INTERVAL_MS, DEFAULT_TIMEOUT_SECS, MAX_MAX_RETRIES, MAX_POLL_INTERVAL_MS,
    MAX_READ_TIMEOUT_SECS, MAX_TIMEOUT_SECS, MAX_WAIT_SECS, MIN_POLL_INTERVAL_MS,
};
use crate::types::{AuthConfig, AuthStrategy, Config, ConnectionConfig, NamespaceConfig, PollConfig};

/// Configuration loader that builds config from `.env`, environment variables and overrides.
#[derive(Default)]
pub struct ConfigLoader {
    base_url: Option<String>,
    api_token: Option<SecretString>,
    session_key: Option<SecretString>,
    skip_verify: Option<bool>,
    timeout: Option<Duration>,
    max_retries: Option<usize>,
    owner: Option<String>,
    app: Option<String>,
    poll_interval: Option<Duration>,
    realtime_interval: Option<Duration>,
    max_wait_secs: Option<u64>,
    read_timeout: Option<Duration>,
}

impl ConfigLoader {
    /// Create a new configuration loader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if dotenv loading is disabled via environment variable.
    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var("DOTENV_DISABLED").ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    /// Load environment variables from .env file if present.
    ///
    /// If `DOTENV_DISABLED` is set to "true" or "1", the .env file is not loaded.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DotenvParse` when the `.env` file has invalid syntax
    /// - `ConfigError::DotenvIo` when the `.env` file exists but cannot be read
    ///
    /// Missing `.env` files are silently ignored.
    pub fn load_dotenv(self) -> Result<Self, ConfigError> {
        if Self::dotenv_disabled() {
            return Ok(self);
        }

        match dotenvy::dotenv() {
            Ok(_) => Ok(self),
            Err(e) if Self::is_not_found(&e) => Ok(self),
            Err(dotenvy::Error::LineParse(_, idx)) => {
                Err(ConfigError::DotenvParse { error_index: idx })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(ConfigError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(ConfigError::DotenvUnknown),
        }
    }

    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Read configuration from environment variables.
    pub fn from_env(mut self) -> Result<Self, ConfigError> {
        apply_env(&mut self)?;
        Ok(self)
    }

    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn with_api_token(mut self, token: String) -> Self {
        self.api_token = Some(SecretString::new(token.into()));
        self
    }

    pub fn with_session_key(mut self, key: String) -> Self {
        self.session_key = Some(SecretString::new(key.into()));
        self
    }

    pub fn with_skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = Some(skip);
        self
    }

    /// Set the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn with_owner(mut self, owner: String) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn with_app(mut self, app: String) -> Self {
        self.app = Some(app);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_realtime_interval(mut self, interval: Duration) -> Self {
        self.realtime_interval = Some(interval);
        self
    }

    /// Set the deadline for a job to finish; `None` waits indefinitely.
    pub fn with_max_wait(mut self, max_wait: Option<Duration>) -> Self {
        self.max_wait_secs = Some(max_wait.map_or(0, |wait| wait.as_secs()));
        self
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Build the final configuration.
    pub fn build(self) -> Result<Config, ConfigError> {
        let base_url = self
            .base_url
            .as_deref()
            .map(validate_and_normalize_base_url)
            .transpose()?
            .ok_or(ConfigError::MissingBaseUrl)?;

        let strategy = if let Some(token) = self.api_token {
            AuthStrategy::ApiToken { token }
        } else if let Some(key) = self.session_key {
            AuthStrategy::SessionKey { key }
        } else {
            return Err(ConfigError::MissingAuth);
        };

        let connection = ConnectionConfig {
            base_url,
            skip_verify: self.skip_verify.unwrap_or(false),
            timeout: self
                .timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        };
        Self::validate_connection(&connection)?;

        let max_wait_secs = self.max_wait_secs.unwrap_or(DEFAULT_MAX_WAIT_SECS);
        let poll = PollConfig {
            poll_interval: self
                .poll_interval
                .unwrap_or(Duration::from_millis(DEFAULT_POLL_INTERVAL_MS)),
            realtime_interval: self
                .realtime_interval
                .unwrap_or(Duration::from_millis(DEFAULT_REALTIME_INTERVAL_MS)),
            max_wait: (max_wait_secs > 0).then(|| Duration::from_secs(max_wait_secs)),
            read_timeout: self.read_timeout,
        };
        Self::validate_poll(&poll, max_wait_secs)?;

        Ok(Config {
            connection,
            auth: AuthConfig { strategy },
            namespace: NamespaceConfig {
                owner: self.owner,
                app: self.app,
            },
            poll,
        })
    }

    /// Checks timeout and retry bounds.
    fn validate_connection(connection: &ConnectionConfig) -> Result<(), ConfigError> {
        let timeout_secs = connection.timeout.as_secs();
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                message: "timeout must be greater than 0 seconds".to_string(),
            });
        }
        if timeout_secs > MAX_TIMEOUT_SECS {
            return Err(ConfigError::InvalidTimeout {
                message: format!(
                    "timeout exceeds maximum allowed value of {} seconds",
                    MAX_TIMEOUT_SECS
                ),
            });
        }
        if connection.max_retries > MAX_MAX_RETRIES {
            return Err(ConfigError::InvalidMaxRetries {
                message: format!(
                    "must be between 0 and {} (got {})",
                    MAX_MAX_RETRIES, connection.max_retries
                ),
            });
        }
        Ok(())
    }

    /// Checks polling intervals and deadlines.
    fn validate_poll(poll: &PollConfig, max_wait_secs: u64) -> Result<(), ConfigError> {
        let interval_range = MIN_POLL_INTERVAL_MS..=MAX_POLL_INTERVAL_MS;
        for (name, interval) in [
            ("poll interval", poll.poll_interval),
            ("realtime interval", poll.realtime_interval),
        ] {
            let millis = interval.as_millis() as u64;
            if !interval_range.contains(&millis) {
                return Err(ConfigError::InvalidPolling {
                    message: format!(
                        "{name} must be between {MIN_POLL_INTERVAL_MS} and {MAX_POLL_INTERVAL_MS} ms (got {millis})"
                    ),
                });
            }
        }
        if max_wait_secs > MAX_WAIT_SECS {
            return Err(ConfigError::InvalidPolling {
                message: format!(
                    "max wait exceeds maximum allowed value of {MAX_WAIT_SECS} seconds"
                ),
            });
        }
        if let Some(read_timeout) = poll.read_timeout {
            let secs = read_timeout.as_secs();
            if secs == 0 || secs > MAX_READ_TIMEOUT_SECS {
                return Err(ConfigError::InvalidPolling {
                    message: format!(
                        "read timeout must be between 1 and {MAX_READ_TIMEOUT_SECS} seconds (got {secs})"
                    ),
                });
            }
        }
        Ok(())
    }

    // Setters used by env.rs

    pub(crate) fn set_base_url(&mut self, url: Option<String>) {
        self.base_url = url;
    }

    pub(crate) fn set_api_token(&mut self, token: Option<SecretString>) {
        self.api_token = token;
    }

    pub(crate) fn set_session_key(&mut self, key: Option<SecretString>) {
        self.session_key = key;
    }

    pub(crate) fn set_skip_verify(&mut self, skip: Option<bool>) {
        self.skip_verify = skip;
    }

    pub(crate) fn set_timeout(&mut self, timeout: Option<Duration>) {
        self.timeout = timeout;
    }

    pub(crate) fn set_max_retries(&mut self, retries: Option<usize>) {
        self.max_retries = retries;
    }

    pub(crate) fn set_owner(&mut self, owner: Option<String>) {
        self.owner = owner;
    }

    pub(crate) fn set_app(&mut self, app: Option<String>) {
        self.app = app;
    }

    pub(crate) fn set_poll_interval(&mut self, interval: Option<Duration>) {
        self.poll_interval = interval;
    }

    pub(crate) fn set_realtime_interval(&mut self, interval: Option<Duration>) {
        self.realtime_interval = interval;
    }

    pub(crate) fn set_max_wait_secs(&mut self, secs: Option<u64>) {
        self.max_wait_secs = secs;
    }

    pub(crate) fn set_read_timeout(&mut self, timeout: Option<Duration>) {
        self.read_timeout = timeout;
    }
}

/// Validates and normalizes a base URL string.
///
/// Validation rules:
/// - Trim surrounding whitespace; blank is treated as missing
/// - Parse as an absolute http or https URL with a host
/// - Normalize by stripping trailing slashes
fn validate_and_normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Err(ConfigError::MissingBaseUrl);
    }

    let parsed = url::Url::parse(trimmed).map_err(|e| ConfigError::InvalidValue {
        var: "base_url".into(),
        message: format!(
            "must be an absolute http(s) URL with a host (e.g. https://localhost:8089): {e}"
        ),
    })?;

    let scheme = parsed.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(ConfigError::InvalidValue {
            var: "base_url".into(),
            message: format!(
                "scheme must be http or https (e.g. https://localhost:8089), got: {scheme}"
            ),
        });
    }

    if parsed.host_str().is_none() {
        return Err(ConfigError::InvalidValue {
            var: "base_url".into(),
            message: "host is required (e.g. https://localhost:8089)".into(),
        });
    }

    Ok(parsed.as_str().trim_end_matches('/').to_string())
}
