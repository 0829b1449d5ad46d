//! Environment variable parsing for configuration.
//!
//! Responsibilities:
//! - Read and parse `SPLUNK_*` environment variables.
//! - Apply environment variable values to a ConfigLoader instance.
//!
//! Invariants:
//! - Empty or whitespace-only environment variables are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).
//! - Invalid numeric or boolean values return ConfigError::InvalidValue.

use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;

use super::builder::ConfigLoader;
use super::error::ConfigError;

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Parse an environment variable, naming it in the error when the value is invalid.
fn parse_env<T: FromStr>(key: &str, expected: &str) -> Result<Option<T>, ConfigError> {
    env_var_or_none(key)
        .map(|value| {
            value.parse().map_err(|_| ConfigError::InvalidValue {
                var: key.to_string(),
                message: expected.to_string(),
            })
        })
        .transpose()
}

/// Apply environment variable configuration to the loader.
pub fn apply_env(loader: &mut ConfigLoader) -> Result<(), ConfigError> {
    if let Some(url) = env_var_or_none("SPLUNK_BASE_URL") {
        loader.set_base_url(Some(url));
    }
    if let Some(token) = env_var_or_none("SPLUNK_API_TOKEN") {
        loader.set_api_token(Some(SecretString::new(token.into())));
    }
    if let Some(key) = env_var_or_none("SPLUNK_SESSION_KEY") {
        loader.set_session_key(Some(SecretString::new(key.into())));
    }
    if let Some(skip) = parse_env::<bool>("SPLUNK_SKIP_VERIFY", "must be true or false")? {
        loader.set_skip_verify(Some(skip));
    }
    if let Some(secs) = parse_env::<u64>("SPLUNK_TIMEOUT", "must be a number")? {
        loader.set_timeout(Some(Duration::from_secs(secs)));
    }
    if let Some(retries) =
        parse_env::<usize>("SPLUNK_MAX_RETRIES", "must be a non-negative integer")?
    {
        loader.set_max_retries(Some(retries));
    }
    if let Some(owner) = env_var_or_none("SPLUNK_OWNER") {
        loader.set_owner(Some(owner));
    }
    if let Some(app) = env_var_or_none("SPLUNK_APP") {
        loader.set_app(Some(app));
    }
    if let Some(ms) = parse_env::<u64>("SPLUNK_POLL_INTERVAL_MS", "must be a number of milliseconds")? {
        loader.set_poll_interval(Some(Duration::from_millis(ms)));
    }
    if let Some(ms) = parse_env::<u64>(
        "SPLUNK_REALTIME_INTERVAL_MS",
        "must be a number of milliseconds",
    )? {
        loader.set_realtime_interval(Some(Duration::from_millis(ms)));
    }
    if let Some(secs) = parse_env::<u64>("SPLUNK_MAX_WAIT_SECS", "must be a number of seconds")? {
        loader.set_max_wait_secs(Some(secs));
    }
    if let Some(secs) =
        parse_env::<u64>("SPLUNK_READ_TIMEOUT_SECS", "must be a number of seconds")?
    {
        loader.set_read_timeout(Some(Duration::from_secs(secs)));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_env_var_or_none_filters_empty_and_whitespace_strings() {
        let key1 = "_SPLUNK_SEARCH_TEST_UNSET_VAR";
        assert!(env_var_or_none(key1).is_none(), "Unset env var should return None");

        temp_env::with_vars([(key1, Some(""))], || {
            assert!(env_var_or_none(key1).is_none(), "Empty string env var should return None");
        });

        temp_env::with_vars([(key1, Some("   "))], || {
            assert!(
                env_var_or_none(key1).is_none(),
                "Whitespace-only env var should return None"
            );
        });

        let key2 = "_SPLUNK_SEARCH_TEST_SET_VAR";
        temp_env::with_vars([(key2, Some(" test-value "))], || {
            assert_eq!(env_var_or_none(key2), Some("test-value".to_string()));
        });
    }

    #[test]
    #[serial]
    fn test_parse_env_names_the_variable() {
        temp_env::with_vars([("SPLUNK_POLL_INTERVAL_MS", Some("fast"))], || {
            match parse_env::<u64>("SPLUNK_POLL_INTERVAL_MS", "must be a number") {
                Err(ConfigError::InvalidValue { var, .. }) => {
                    assert_eq!(var, "SPLUNK_POLL_INTERVAL_MS")
                }
                other => panic!("Expected InvalidValue, got {:?}", other),
            }
        });
    }
}
