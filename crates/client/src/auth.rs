//! Authentication strategies.
//!
//! Credentials are static: an API token or a session key obtained elsewhere.
//! An expired credential surfaces as `ClientError::Unauthorized` and the
//! caller re-authenticates; nothing here refreshes it.

use secrecy::{ExposeSecret, SecretString};

/// Strategy for authenticating with Splunk.
#[derive(Debug, Clone)]
pub enum AuthStrategy {
    /// API token (bearer token authentication).
    ApiToken { token: SecretString },
    /// Session key returned by an earlier login.
    SessionKey { key: SecretString },
}

impl AuthStrategy {
    /// Value for the `Authorization` header.
    pub(crate) fn authorization_header(&self) -> String {
        match self {
            Self::ApiToken { token } => format!("Bearer {}", token.expose_secret()),
            Self::SessionKey { key } => format!("Splunk {}", key.expose_secret()),
        }
    }

    pub fn is_api_token(&self) -> bool {
        matches!(self, Self::ApiToken { .. })
    }
}

impl From<&splunk_search_config::AuthStrategy> for AuthStrategy {
    fn from(strategy: &splunk_search_config::AuthStrategy) -> Self {
        match strategy {
            splunk_search_config::AuthStrategy::ApiToken { token } => Self::ApiToken {
                token: token.clone(),
            },
            splunk_search_config::AuthStrategy::SessionKey { key } => {
                Self::SessionKey { key: key.clone() }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_token_header() {
        let strategy = AuthStrategy::ApiToken {
            token: SecretString::new("test-token".to_string().into()),
        };
        assert!(strategy.is_api_token());
        assert_eq!(strategy.authorization_header(), "Bearer test-token");
    }

    #[test]
    fn test_session_key_header() {
        let strategy = AuthStrategy::SessionKey {
            key: SecretString::new("abc123".to_string().into()),
        };
        assert!(!strategy.is_api_token());
        assert_eq!(strategy.authorization_header(), "Splunk abc123");
    }

    #[test]
    fn test_debug_does_not_expose_secret() {
        let strategy = AuthStrategy::SessionKey {
            key: SecretString::new("very-secret-key".to_string().into()),
        };
        assert!(!format!("{:?}", strategy).contains("very-secret-key"));
    }
}
