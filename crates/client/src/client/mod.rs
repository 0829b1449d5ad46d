//! The HTTP [`Transport`] implementation.
//!
//! [`SplunkClient`] owns a pooled `reqwest::Client`, the base URL and the
//! credentials, and forwards each transport operation to
//! [`crate::endpoints::search`].
//!
//! # Submodules
//! - [`builder`]: Client construction and configuration
//!
//! # What this module does NOT handle:
//! - Request construction, retries and status mapping (delegated to [`crate::endpoints`])
//! - Re-authentication: an expired credential surfaces as `ClientError::Unauthorized`

pub mod builder;

use futures::future::BoxFuture;

use crate::auth::AuthStrategy;
use crate::endpoints::search;
use crate::error::Result;
use crate::metrics::MetricsCollector;
use crate::models::{JobStatus, SearchRequest};
use crate::transport::{Body, Namespace, ResultsQuery, Transport};

/// Splunk REST API client.
///
/// Use [`SplunkClient::builder()`] to create one. Share it behind an
/// `Arc<dyn Transport>` between controllers and jobs; the connection pool is
/// reused by every call.
#[derive(Debug)]
pub struct SplunkClient {
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) auth: AuthStrategy,
    pub(crate) max_retries: usize,
    pub(crate) metrics: Option<MetricsCollector>,
}

impl SplunkClient {
    pub fn builder() -> builder::SplunkClientBuilder {
        builder::SplunkClientBuilder::new()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn is_api_token_auth(&self) -> bool {
        self.auth.is_api_token()
    }

    pub fn metrics(&self) -> Option<&MetricsCollector> {
        self.metrics.as_ref()
    }
}

impl Transport for SplunkClient {
    fn create_job<'a>(
        &'a self,
        namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(async move {
            search::create_job(
                &self.http,
                &self.base_url,
                &self.auth.authorization_header(),
                namespace,
                request,
                self.max_retries,
                self.metrics.as_ref(),
            )
            .await
        })
    }

    fn oneshot<'a>(
        &'a self,
        namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<Body>> {
        Box::pin(async move {
            let response = search::oneshot(
                &self.http,
                &self.base_url,
                &self.auth.authorization_header(),
                namespace,
                request,
                self.max_retries,
                self.metrics.as_ref(),
            )
            .await?;
            Ok(Box::new(response) as Body)
        })
    }

    fn export<'a>(
        &'a self,
        namespace: &'a Namespace,
        request: &'a SearchRequest,
    ) -> BoxFuture<'a, Result<Body>> {
        Box::pin(async move {
            let response = search::export(
                &self.http,
                &self.base_url,
                &self.auth.authorization_header(),
                namespace,
                request,
                self.max_retries,
                self.metrics.as_ref(),
            )
            .await?;
            Ok(Box::new(response) as Body)
        })
    }

    fn job_status<'a>(
        &'a self,
        namespace: &'a Namespace,
        sid: &'a str,
    ) -> BoxFuture<'a, Result<JobStatus>> {
        Box::pin(async move {
            search::job_status(
                &self.http,
                &self.base_url,
                &self.auth.authorization_header(),
                namespace,
                sid,
                self.max_retries,
                self.metrics.as_ref(),
            )
            .await
        })
    }

    fn job_results<'a>(
        &'a self,
        namespace: &'a Namespace,
        sid: &'a str,
        query: &'a ResultsQuery,
    ) -> BoxFuture<'a, Result<Body>> {
        Box::pin(async move {
            let response = search::job_results(
                &self.http,
                &self.base_url,
                &self.auth.authorization_header(),
                namespace,
                sid,
                query,
                self.max_retries,
                self.metrics.as_ref(),
            )
            .await?;
            Ok(Box::new(response) as Body)
        })
    }

    fn delete_job<'a>(
        &'a self,
        namespace: &'a Namespace,
        sid: &'a str,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            search::delete_job(
                &self.http,
                &self.base_url,
                &self.auth.authorization_header(),
                namespace,
                sid,
                self.max_retries,
                self.metrics.as_ref(),
            )
            .await
        })
    }
}

impl From<&splunk_search_config::NamespaceConfig> for Namespace {
    fn from(config: &splunk_search_config::NamespaceConfig) -> Self {
        Self {
            owner: config.owner.clone(),
            app: config.app.clone(),
        }
    }
}
