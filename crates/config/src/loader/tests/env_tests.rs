//! Environment variable tests for the configuration loader.

use secrecy::ExposeSecret;
use serial_test::serial;
use std::time::Duration;

use super::env_lock;
use crate::loader::builder::ConfigLoader;
use crate::loader::error::ConfigError;
use crate::types::AuthStrategy;

const ALL_VARS: [&str; 12] = [
    "SPLUNK_BASE_URL",
    "SPLUNK_API_TOKEN",
    "SPLUNK_SESSION_KEY",
    "SPLUNK_SKIP_VERIFY",
    "SPLUNK_TIMEOUT",
    "SPLUNK_MAX_RETRIES",
    "SPLUNK_APP",
    "SPLUNK_OWNER",
    "SPLUNK_POLL_INTERVAL_MS",
    "SPLUNK_MAX_WAIT_SECS",
    "SPLUNK_REALTIME_INTERVAL_MS",
    "SPLUNK_READ_TIMEOUT_SECS",
];

/// Run `f` with exactly `vars` set among the variables the loader reads.
fn with_env<R>(vars: &[(&str, &str)], f: impl FnOnce() -> R) -> R {
    let settings: Vec<(&str, Option<&str>)> = ALL_VARS
        .iter()
        .map(|name| {
            let value = vars.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
            (*name, value)
        })
        .collect();
    temp_env::with_vars(settings, f)
}

#[test]
#[serial]
fn test_full_environment() {
    let _lock = env_lock().lock().unwrap();
    with_env(
        &[
            ("SPLUNK_BASE_URL", "https://splunk.example.com:8089/"),
            ("SPLUNK_API_TOKEN", "env-token"),
            ("SPLUNK_SKIP_VERIFY", "true"),
            ("SPLUNK_TIMEOUT", "45"),
            ("SPLUNK_MAX_RETRIES", "5"),
            ("SPLUNK_APP", "search"),
            ("SPLUNK_OWNER", "admin"),
            ("SPLUNK_POLL_INTERVAL_MS", "250"),
            ("SPLUNK_MAX_WAIT_SECS", "600"),
            ("SPLUNK_REALTIME_INTERVAL_MS", "2000"),
            ("SPLUNK_READ_TIMEOUT_SECS", "20"),
        ],
        || {
            let config = ConfigLoader::new().from_env().unwrap().build().unwrap();

            assert_eq!(config.connection.base_url, "https://splunk.example.com:8089");
            assert!(config.connection.skip_verify);
            assert_eq!(config.connection.timeout, Duration::from_secs(45));
            assert_eq!(config.connection.max_retries, 5);
            assert_eq!(config.namespace.app.as_deref(), Some("search"));
            assert_eq!(config.namespace.owner.as_deref(), Some("admin"));
            assert_eq!(config.poll.poll_interval, Duration::from_millis(250));
            assert_eq!(config.poll.realtime_interval, Duration::from_millis(2000));
            assert_eq!(config.poll.max_wait, Some(Duration::from_secs(600)));
            assert_eq!(config.poll.read_timeout, Some(Duration::from_secs(20)));
            match config.auth.strategy {
                AuthStrategy::ApiToken { token } => assert_eq!(token.expose_secret(), "env-token"),
                other => panic!("Expected ApiToken, got {:?}", other),
            }
        },
    );
}

#[test]
#[serial]
fn test_session_key_from_env() {
    let _lock = env_lock().lock().unwrap();
    with_env(
        &[
            ("SPLUNK_BASE_URL", "https://localhost:8089"),
            ("SPLUNK_SESSION_KEY", "session-abc"),
        ],
        || {
            let config = ConfigLoader::new().from_env().unwrap().build().unwrap();
            assert!(matches!(config.auth.strategy, AuthStrategy::SessionKey { .. }));
        },
    );
}

#[test]
#[serial]
fn test_api_token_wins_over_session_key() {
    let _lock = env_lock().lock().unwrap();
    with_env(
        &[
            ("SPLUNK_BASE_URL", "https://localhost:8089"),
            ("SPLUNK_API_TOKEN", "token"),
            ("SPLUNK_SESSION_KEY", "session-abc"),
        ],
        || {
            let config = ConfigLoader::new().from_env().unwrap().build().unwrap();
            assert!(matches!(config.auth.strategy, AuthStrategy::ApiToken { .. }));
        },
    );
}

#[test]
#[serial]
fn test_empty_env_vars_ignored() {
    let _lock = env_lock().lock().unwrap();
    with_env(
        &[("SPLUNK_API_TOKEN", ""), ("SPLUNK_TIMEOUT", "  ")],
        || {
            let config = ConfigLoader::new()
                .with_base_url("https://localhost:8089".to_string())
                .with_session_key("key".to_string())
                .from_env()
                .unwrap()
                .build()
                .unwrap();
            assert!(matches!(config.auth.strategy, AuthStrategy::SessionKey { .. }));
            assert_eq!(config.connection.timeout, Duration::from_secs(30));
        },
    );
}

#[test]
#[serial]
fn test_overrides_after_env_take_precedence() {
    let _lock = env_lock().lock().unwrap();
    with_env(
        &[
            ("SPLUNK_BASE_URL", "https://env.example.com:8089"),
            ("SPLUNK_API_TOKEN", "token"),
            ("SPLUNK_APP", "env-app"),
        ],
        || {
            let config = ConfigLoader::new()
                .from_env()
                .unwrap()
                .with_app("cli-app".to_string())
                .build()
                .unwrap();
            assert_eq!(config.namespace.app.as_deref(), Some("cli-app"));
            assert_eq!(config.connection.base_url, "https://env.example.com:8089");
        },
    );
}

#[test]
#[serial]
fn test_invalid_numbers_are_rejected() {
    let _lock = env_lock().lock().unwrap();
    for var in [
        "SPLUNK_TIMEOUT",
        "SPLUNK_MAX_RETRIES",
        "SPLUNK_POLL_INTERVAL_MS",
        "SPLUNK_MAX_WAIT_SECS",
        "SPLUNK_REALTIME_INTERVAL_MS",
        "SPLUNK_READ_TIMEOUT_SECS",
    ] {
        with_env(&[(var, "soon")], || match ConfigLoader::new().from_env() {
            Err(ConfigError::InvalidValue { var: name, .. }) => assert_eq!(name, var),
            Err(other) => panic!("Expected InvalidValue for {var}, got {other}"),
            Ok(_) => panic!("Expected InvalidValue for {var}, got Ok"),
        });
    }
}

#[test]
#[serial]
fn test_invalid_skip_verify() {
    let _lock = env_lock().lock().unwrap();
    with_env(&[("SPLUNK_SKIP_VERIFY", "yes")], || {
        assert!(matches!(
            ConfigLoader::new().from_env(),
            Err(ConfigError::InvalidValue { .. })
        ));
    });
}

#[test]
#[serial]
fn test_zero_max_wait_means_no_deadline() {
    let _lock = env_lock().lock().unwrap();
    with_env(
        &[
            ("SPLUNK_BASE_URL", "https://localhost:8089"),
            ("SPLUNK_API_TOKEN", "token"),
            ("SPLUNK_MAX_WAIT_SECS", "0"),
        ],
        || {
            let config = ConfigLoader::new().from_env().unwrap().build().unwrap();
            assert_eq!(config.poll.max_wait, None);
        },
    );
}
