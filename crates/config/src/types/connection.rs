//! Connection configuration types for splunk-search.
//!
//! Responsibilities:
//! - Define connection settings (URL, TLS verification, timeouts, retries).
//! - Define the main `Config` structure combining connection, auth, namespace and polling.
//! - Provide convenience constructors for common config patterns.
//!
//! Does NOT handle:
//! - Configuration loading from env (see `loader` module).
//! - Actual network connections (see client crate).
//!
//! Invariants:
//! - Default values are provided via constants, not magic numbers.

use crate::constants::{DEFAULT_MAX_RETRIES, DEFAULT_SPLUNK_PORT, DEFAULT_TIMEOUT_SECS};
use crate::types::auth::{AuthConfig, AuthStrategy};
use crate::types::search::{NamespaceConfig, PollConfig};
use secrecy::SecretString;
use std::time::Duration;

/// Connection configuration for Splunk server.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Base URL of the Splunk server (e.g., https://localhost:8089)
    pub base_url: String,
    /// Whether to skip TLS verification (for self-signed certificates)
    pub skip_verify: bool,
    /// HTTP request timeout
    pub timeout: Duration,
    /// Maximum number of retries for rate-limited or unavailable responses
    pub max_retries: usize,
}

impl ConnectionConfig {
    fn new(base_url: String) -> Self {
        Self {
            base_url,
            skip_verify: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone)]
pub struct Config {
    /// Connection settings
    pub connection: ConnectionConfig,
    /// Authentication settings
    pub auth: AuthConfig,
    /// User/app namespace searches run in
    pub namespace: NamespaceConfig,
    /// Polling cadence and deadlines
    pub poll: PollConfig,
}

impl Config {
    /// Create a new config with the specified base URL and API token.
    pub fn with_api_token(base_url: String, token: SecretString) -> Self {
        Self::with_strategy(base_url, AuthStrategy::ApiToken { token })
    }

    /// Create a new config with the specified base URL and session key.
    pub fn with_session_key(base_url: String, key: SecretString) -> Self {
        Self::with_strategy(base_url, AuthStrategy::SessionKey { key })
    }

    fn with_strategy(base_url: String, strategy: AuthStrategy) -> Self {
        Self {
            connection: ConnectionConfig::new(base_url),
            auth: AuthConfig { strategy },
            namespace: NamespaceConfig::default(),
            poll: PollConfig::default(),
        }
    }

    /// Base URL for local development.
    pub fn local_base_url() -> String {
        format!("https://localhost:{}", DEFAULT_SPLUNK_PORT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_api_token_uses_defaults() {
        let config = Config::with_api_token(
            Config::local_base_url(),
            SecretString::new("token".to_string().into()),
        );
        assert_eq!(config.connection.base_url, "https://localhost:8089");
        assert_eq!(config.connection.timeout, Duration::from_secs(30));
        assert_eq!(config.connection.max_retries, 3);
        assert!(!config.connection.skip_verify);
        assert!(config.namespace.owner.is_none());
    }

    #[test]
    fn test_config_debug_does_not_expose_session_key() {
        let config = Config::with_session_key(
            Config::local_base_url(),
            SecretString::new("secret-session-key".to_string().into()),
        );
        assert!(!format!("{:?}", config).contains("secret-session-key"));
    }
}
