//! Configuration type definitions for splunk-search.
//!
//! Responsibilities:
//! - Define configuration types for authentication, connection, namespace and polling.
//! - Ensure consistent defaults and type safety across the configuration system.
//!
//! Does NOT handle:
//! - Configuration loading from `.env` or environment variables (see `loader` module).
//! - Actual network connections or authentication flows (see client crate).
//!
//! Invariants:
//! - All secret types use `secrecy::SecretString` to prevent accidental logging.

mod auth;
mod connection;
mod search;

pub use auth::{AuthConfig, AuthStrategy};
pub use connection::{Config, ConnectionConfig};
pub use search::{NamespaceConfig, PollConfig};
