//! Search job endpoints.
//!
//! # What this module handles:
//! - Creating jobs (normal, blocking, realtime) and running oneshot/export searches
//! - Reading job status
//! - Opening results, preview and export bodies
//! - Cancelling and deleting jobs
//!
//! # What this module does NOT handle:
//! - Polling or snapshot loops (see [`crate::controller`])
//! - Decoding result bodies (see [`crate::decoder`])

use reqwest::Client;
use tracing::debug;

use crate::endpoints::parsing::{entry_content, entry_field};
use crate::endpoints::{encode_path_segment, send_request_with_retry};
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use crate::models::{JobStatus, OutputMode, ResultKind, SearchRequest};
use crate::redact_query;
use crate::transport::{Namespace, ResultsQuery};

fn log_params(params: &[(&'static str, String)]) {
    for (key, value) in params {
        if *key == "search" {
            debug!("  {}: {}", key, redact_query(value));
        } else {
            debug!("  {}: {}", key, value);
        }
    }
}

fn jobs_url(base_url: &str, namespace: &Namespace) -> String {
    format!("{}{}/search/jobs", base_url, namespace.path_prefix())
}

/// Create a search job and return its sid.
#[allow(clippy::too_many_arguments)]
pub async fn create_job(
    client: &Client,
    base_url: &str,
    auth_header: &str,
    namespace: &Namespace,
    request: &SearchRequest,
    max_retries: usize,
    metrics: Option<&MetricsCollector>,
) -> Result<String> {
    debug!(
        "Creating {} search job in {}: {}",
        request.mode(),
        namespace,
        redact_query(request.query())
    );

    let url = jobs_url(base_url, namespace);
    let mut form_data = request.form_params();
    // The create response is parsed here; the results format is chosen per read.
    form_data.push(("output_mode", OutputMode::Json.to_string()));
    log_params(&form_data);

    let builder = client
        .post(&url)
        .header("Authorization", auth_header)
        .form(&form_data);

    let response =
        send_request_with_retry(builder, max_retries, "/search/jobs", "POST", metrics).await?;

    let resp: serde_json::Value = response.json().await?;
    let sid = entry_field(&resp, "sid")
        .and_then(|v| v.as_str())
        .filter(|sid| !sid.is_empty())
        .ok_or_else(|| ClientError::InvalidResponse("Missing sid in response".to_string()))?;

    debug!("Created search job: {}", sid);
    Ok(sid.to_string())
}

/// Run a oneshot search; the response body carries the results.
#[allow(clippy::too_many_arguments)]
pub async fn oneshot(
    client: &Client,
    base_url: &str,
    auth_header: &str,
    namespace: &Namespace,
    request: &SearchRequest,
    max_retries: usize,
    metrics: Option<&MetricsCollector>,
) -> Result<reqwest::Response> {
    debug!(
        "Running oneshot search in {}: {}",
        namespace,
        redact_query(request.query())
    );

    let url = jobs_url(base_url, namespace);
    let mut form_data = request.form_params();
    form_data.push(("output_mode", request.output_mode().to_string()));
    log_params(&form_data);

    let builder = client
        .post(&url)
        .header("Authorization", auth_header)
        .form(&form_data);

    send_request_with_retry(builder, max_retries, "/search/jobs", "POST", metrics).await
}

/// Run an export search; results stream back as the search produces them.
#[allow(clippy::too_many_arguments)]
pub async fn export(
    client: &Client,
    base_url: &str,
    auth_header: &str,
    namespace: &Namespace,
    request: &SearchRequest,
    max_retries: usize,
    metrics: Option<&MetricsCollector>,
) -> Result<reqwest::Response> {
    debug!(
        "Running export search in {}: {}",
        namespace,
        redact_query(request.query())
    );

    let url = format!("{}/export", jobs_url(base_url, namespace));
    let mut query_params = request.form_params();
    query_params.push(("output_mode", request.output_mode().to_string()));
    log_params(&query_params);

    let builder = client
        .get(&url)
        .header("Authorization", auth_header)
        .query(&query_params);

    send_request_with_retry(builder, max_retries, "/search/jobs/export", "GET", metrics).await
}

/// Get the status of a search job.
#[allow(clippy::too_many_arguments)]
pub async fn job_status(
    client: &Client,
    base_url: &str,
    auth_header: &str,
    namespace: &Namespace,
    sid: &str,
    max_retries: usize,
    metrics: Option<&MetricsCollector>,
) -> Result<JobStatus> {
    debug!("Getting status for job: {}", sid);

    let url = format!("{}/{}", jobs_url(base_url, namespace), encode_path_segment(sid));
    let builder = client
        .get(&url)
        .header("Authorization", auth_header)
        .query(&[("output_mode", "json")]);

    let response =
        send_request_with_retry(builder, max_retries, "/search/jobs/{sid}", "GET", metrics)
            .await?;

    let resp: serde_json::Value = response.json().await?;
    let mut status: JobStatus = serde_json::from_value(entry_content(resp))
        .map_err(|e| ClientError::InvalidResponse(format!("Failed to parse job status: {}", e)))?;
    if status.sid.is_empty() {
        status.sid = sid.to_string();
    }
    Ok(status)
}

/// Open a results, preview or export body of a job.
#[allow(clippy::too_many_arguments)]
pub async fn job_results(
    client: &Client,
    base_url: &str,
    auth_header: &str,
    namespace: &Namespace,
    sid: &str,
    query: &ResultsQuery,
    max_retries: usize,
    metrics: Option<&MetricsCollector>,
) -> Result<reqwest::Response> {
    debug!(
        "Getting {} for job {} (offset {}, count {:?})",
        query.kind, sid, query.offset, query.count
    );

    // Export of a job reads the whole final set in one body (`count=0`).
    let (segment, endpoint) = match query.kind {
        ResultKind::FinalResults | ResultKind::Export => ("results", "/search/jobs/{sid}/results"),
        ResultKind::Preview => ("results_preview", "/search/jobs/{sid}/results_preview"),
    };
    let url = format!(
        "{}/{}/{}",
        jobs_url(base_url, namespace),
        encode_path_segment(sid),
        segment
    );

    let mut query_params: Vec<(&str, String)> =
        vec![("output_mode", query.output_mode.to_string())];
    if let Some(count) = query.count {
        query_params.push(("count", count.to_string()));
    }
    if query.offset > 0 {
        query_params.push(("offset", query.offset.to_string()));
    }

    let builder = client
        .get(&url)
        .header("Authorization", auth_header)
        .query(&query_params);

    send_request_with_retry(builder, max_retries, endpoint, "GET", metrics).await
}

/// Cancel and delete a search job.
#[allow(clippy::too_many_arguments)]
pub async fn delete_job(
    client: &Client,
    base_url: &str,
    auth_header: &str,
    namespace: &Namespace,
    sid: &str,
    max_retries: usize,
    metrics: Option<&MetricsCollector>,
) -> Result<()> {
    debug!("Deleting job: {}", sid);

    let url = format!("{}/{}", jobs_url(base_url, namespace), encode_path_segment(sid));
    let builder = client
        .delete(&url)
        .header("Authorization", auth_header)
        .query(&[("output_mode", "json")]);

    send_request_with_retry(builder, max_retries, "/search/jobs/{sid}", "DELETE", metrics)
        .await?;
    Ok(())
}
