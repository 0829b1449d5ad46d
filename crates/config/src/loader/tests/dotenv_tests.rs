//! `.env` loading.
//!
//! These tests change the working directory, so they hold `env_lock()` and run
//! serially. Variables a `.env` file may set are listed in `DOTENV_KEYS` and
//! restored by `temp_env` after each test.

use serial_test::serial;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use super::env_lock;
use crate::loader::builder::ConfigLoader;
use crate::loader::error::ConfigError;

const DOTENV_KEYS: &[&str] = &[
    "DOTENV_DISABLED",
    "SPLUNK_BASE_URL",
    "SPLUNK_API_TOKEN",
    "SPLUNK_SESSION_KEY",
    "SPLUNK_APP",
    "SPLUNK_POLL_INTERVAL_MS",
    "SPLUNK_MAX_WAIT_SECS",
];

/// Switches the working directory to a temp dir with an optional `.env`.
struct DotenvDir {
    _dir: TempDir,
    previous: PathBuf,
}

impl DotenvDir {
    fn new(contents: Option<&str>) -> Self {
        let dir = TempDir::new().unwrap();
        if let Some(contents) = contents {
            fs::write(dir.path().join(".env"), contents).unwrap();
        }
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir.path()).unwrap();
        Self { _dir: dir, previous }
    }
}

impl Drop for DotenvDir {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.previous);
    }
}

fn in_clean_env<R>(disabled: Option<&str>, f: impl FnOnce() -> R) -> R {
    temp_env::with_vars_unset(DOTENV_KEYS, || {
        temp_env::with_var("DOTENV_DISABLED", disabled, f)
    })
}

#[test]
#[serial]
fn test_dotenv_feeds_search_settings() {
    let _lock = env_lock().lock().unwrap();
    let _dir = DotenvDir::new(Some(
        "SPLUNK_BASE_URL=https://search-head.example.com:8089\n\
         SPLUNK_API_TOKEN=dotenv-token\n\
         SPLUNK_APP=search\n\
         SPLUNK_POLL_INTERVAL_MS=250\n\
         SPLUNK_MAX_WAIT_SECS=0\n",
    ));

    let config = in_clean_env(None, || {
        ConfigLoader::new()
            .load_dotenv()
            .and_then(ConfigLoader::from_env)
            .and_then(ConfigLoader::build)
    })
    .unwrap();

    assert_eq!(config.connection.base_url, "https://search-head.example.com:8089");
    assert_eq!(config.namespace.app.as_deref(), Some("search"));
    assert_eq!(config.poll.poll_interval, Duration::from_millis(250));
    assert_eq!(config.poll.max_wait, None);
}

#[test]
#[serial]
fn test_missing_dotenv_is_ignored() {
    let _lock = env_lock().lock().unwrap();
    let _dir = DotenvDir::new(None);

    let result = in_clean_env(None, || ConfigLoader::new().load_dotenv());
    assert!(result.is_ok());
}

#[test]
#[serial]
fn test_unparsable_dotenv_hides_the_line() {
    let _lock = env_lock().lock().unwrap();
    let secret = "sk_live_do_not_print";
    let _dir = DotenvDir::new(Some(&format!("SPLUNK_API_TOKEN {secret}\n")));

    let err = match in_clean_env(None, || ConfigLoader::new().load_dotenv()) {
        Err(err) => err,
        Ok(_) => panic!("expected a parse error"),
    };

    assert!(matches!(err, ConfigError::DotenvParse { .. }));
    let message = err.to_string();
    assert!(!message.contains(secret), "leaked: {message}");
    assert!(message.contains("DOTENV_DISABLED"));
}

#[test]
#[serial]
fn test_dotenv_disabled_values() {
    let _lock = env_lock().lock().unwrap();
    let _dir = DotenvDir::new(Some("NOT_AN_ASSIGNMENT"));

    for disabled in ["1", "true"] {
        let result = in_clean_env(Some(disabled), || ConfigLoader::new().load_dotenv());
        assert!(result.is_ok(), "DOTENV_DISABLED={disabled} should skip .env");
    }

    let result = in_clean_env(Some("false"), || ConfigLoader::new().load_dotenv());
    assert!(matches!(result, Err(ConfigError::DotenvParse { .. })));
}
