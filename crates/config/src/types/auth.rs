//! Authentication types for splunk-search configuration.
//!
//! Responsibilities:
//! - Define the static credential strategies (API token, session key).
//!
//! Does NOT handle:
//! - Obtaining credentials (login flows, token creation).
//!
//! Invariants:
//! - All secret values use `secrecy::SecretString` to prevent accidental logging.

use secrecy::SecretString;

/// Strategy for authenticating with Splunk.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// API token, sent as a `Bearer` credential.
    ApiToken { token: SecretString },
    /// Session key from an earlier login, sent as a `Splunk` credential.
    SessionKey { key: SecretString },
}

/// Authentication configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// The authentication strategy to use.
    pub strategy: AuthStrategy,
}
