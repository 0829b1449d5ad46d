//! Construction of the reqwest-backed [`SplunkClient`] transport.
//!
//! A client needs a management URL and a static credential; everything else
//! has a default from `splunk_search_config::constants`. The stored URL never
//! ends in `/`, so endpoint paths can be appended directly.

use std::time::Duration;

use crate::auth::AuthStrategy;
use crate::client::SplunkClient;
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use splunk_search_config::{
    Config,
    constants::{DEFAULT_MAX_REDIRECTS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS},
};

/// Builder for [`SplunkClient`].
///
/// ```rust,ignore
/// let transport = SplunkClient::builder()
///     .base_url("https://splunk.example.com:8089".to_string())
///     .auth_strategy(AuthStrategy::ApiToken { token })
///     .max_retries(0)
///     .build()?;
/// let controller = SearchController::new(Arc::new(transport));
/// ```
pub struct SplunkClientBuilder {
    base_url: Option<String>,
    auth_strategy: Option<AuthStrategy>,
    skip_verify: bool,
    timeout: Duration,
    max_retries: usize,
    metrics: Option<MetricsCollector>,
}

impl Default for SplunkClientBuilder {
    fn default() -> Self {
        Self {
            base_url: None,
            auth_strategy: None,
            skip_verify: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
            metrics: None,
        }
    }
}

impl SplunkClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Management endpoint, e.g. `https://localhost:8089`.
    pub fn base_url(mut self, url: String) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn auth_strategy(mut self, strategy: AuthStrategy) -> Self {
        self.auth_strategy = Some(strategy);
        self
    }

    /// Accept self-signed certificates. Only meaningful for `https` URLs.
    pub fn skip_verify(mut self, skip: bool) -> Self {
        self.skip_verify = skip;
        self
    }

    /// Per-request timeout of the HTTP client. Default is 30 seconds.
    ///
    /// This bounds whole requests, including streamed bodies; long exports
    /// should use a generous value and rely on the read timeout instead.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retries for 429/502/503/504 responses; `0` sends each request once.
    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    /// Record request latency, counts and errors on this collector.
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Take connection and credential settings from a loaded [`Config`].
    pub fn from_config(mut self, config: &Config) -> Self {
        self.base_url = Some(config.connection.base_url.clone());
        self.auth_strategy = Some(AuthStrategy::from(&config.auth.strategy));
        self.skip_verify = config.connection.skip_verify;
        self.timeout = config.connection.timeout;
        self.max_retries = config.connection.max_retries;
        self
    }

    fn normalize_base_url(url: String) -> String {
        url.trim_end_matches('/').to_string()
    }

    /// Validate the settings and create the HTTP client.
    ///
    /// A missing or unparsable URL is [`ClientError::InvalidUrl`]; a missing
    /// credential is [`ClientError::InvalidRequest`].
    pub fn build(self) -> Result<SplunkClient> {
        let Some(base_url) = self.base_url.map(Self::normalize_base_url) else {
            return Err(ClientError::InvalidUrl(
                "a Splunk management URL is required".to_string(),
            ));
        };
        if let Err(e) = reqwest::Url::parse(&base_url) {
            return Err(ClientError::InvalidUrl(format!("{base_url}: {e}")));
        }

        let auth = self
            .auth_strategy
            .ok_or_else(|| ClientError::InvalidRequest("no API token or session key".to_string()))?;

        let mut http_builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .redirect(reqwest::redirect::Policy::limited(DEFAULT_MAX_REDIRECTS));

        match (self.skip_verify, base_url.starts_with("https://")) {
            (true, true) => http_builder = http_builder.danger_accept_invalid_certs(true),
            (true, false) => tracing::warn!(url = %base_url, "skip_verify ignored for plain HTTP"),
            _ => {}
        }

        let http = http_builder.build()?;

        Ok(SplunkClient {
            http,
            base_url,
            auth,
            max_retries: self.max_retries,
            metrics: self.metrics,
        })
    }
}
