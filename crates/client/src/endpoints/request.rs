//! Sending requests: retry with exponential backoff and status classification.
//!
//! Every endpoint goes through [`send_request_with_retry`], which:
//! - Retries 429/502/503/504 responses with exponential backoff (1s, 2s, 4s = 2^attempt)
//! - Maps non-success responses onto `ClientError` variants
//! - Extracts Splunk messages from JSON or XML error bodies
//! - Records request metrics when a collector is configured
//!
//! Connection-level errors are returned immediately; retrying them is the
//! caller's decision (see the poll loop in [`crate::controller`]).

use reqwest::{RequestBuilder, Response};
use std::time::{Duration, Instant};
use tracing::debug;

use super::parsing::parse_messages;
use crate::error::{ClientError, Result};
use crate::metrics::MetricsCollector;
use crate::models::SplunkMessages;

/// Sends an HTTP request, retrying transient statuses up to `max_retries` times.
///
/// # Errors
///
/// - `MaxRetriesExceeded` when every attempt answered a retryable status
/// - `RequestRejected` (400), `Unauthorized` (401/403), `NotFound` (404), or
///   `ApiError` for other non-success statuses
/// - `HttpError` for connection-level failures
pub async fn send_request_with_retry(
    builder: RequestBuilder,
    max_retries: usize,
    endpoint: &str,
    method: &str,
    metrics: Option<&MetricsCollector>,
) -> Result<Response> {
    for attempt in 0..=max_retries {
        let attempt_builder = match builder.try_clone() {
            Some(cloned) => cloned,
            None => {
                // Streaming bodies cannot be replayed.
                if attempt == 0 {
                    debug!("Request builder cannot be cloned, single attempt only");
                    return send_once(builder, endpoint, method, metrics).await;
                }
                return Err(ClientError::MaxRetriesExceeded(attempt));
            }
        };

        let started = Instant::now();
        if let Some(m) = metrics {
            m.record_request(endpoint, method);
        }

        let response = match attempt_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                let err = ClientError::from(e);
                if let Some(m) = metrics {
                    m.record_request_duration(endpoint, method, started.elapsed(), None);
                    m.record_client_error(endpoint, method, &err);
                }
                return Err(err);
            }
        };

        let status = response.status().as_u16();
        if let Some(m) = metrics {
            m.record_request_duration(endpoint, method, started.elapsed(), Some(status));
        }

        if ClientError::is_retryable_status(status) {
            if attempt < max_retries {
                let backoff_secs = 2u64.pow(attempt as u32);
                debug!(
                    endpoint,
                    status,
                    attempt = attempt + 1,
                    max_retries = max_retries + 1,
                    backoff_secs,
                    "Transient HTTP status, retrying with exponential backoff"
                );
                if let Some(m) = metrics {
                    m.record_retry(endpoint, method, attempt + 1);
                }
                tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                continue;
            }
            debug!(endpoint, status, attempts = attempt + 1, "Max retries exhausted");
            let err = ClientError::MaxRetriesExceeded(max_retries + 1);
            if let Some(m) = metrics {
                m.record_client_error(endpoint, method, &err);
            }
            return Err(err);
        }

        if response.status().is_success() {
            if attempt > 0 {
                debug!(endpoint, attempt = attempt + 1, "Request succeeded after retry");
            }
            return Ok(response);
        }

        let err = error_from_response(response).await;
        if let Some(m) = metrics {
            m.record_client_error(endpoint, method, &err);
        }
        return Err(err);
    }

    Err(ClientError::MaxRetriesExceeded(max_retries + 1))
}

async fn send_once(
    builder: RequestBuilder,
    endpoint: &str,
    method: &str,
    metrics: Option<&MetricsCollector>,
) -> Result<Response> {
    if let Some(m) = metrics {
        m.record_request(endpoint, method);
    }
    let response = builder.send().await?;
    if response.status().is_success() {
        return Ok(response);
    }
    let err = error_from_response(response).await;
    if let Some(m) = metrics {
        m.record_client_error(endpoint, method, &err);
    }
    Err(err)
}

/// Convert a non-success response into the matching `ClientError`.
pub(crate) async fn error_from_response(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let url = response.url().to_string();
    let request_id = response
        .headers()
        .get("X-Splunk-Request-Id")
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Could not read error response body".to_string());

    classify_status(status, url, request_id, &body)
}

fn classify_status(status: u16, url: String, request_id: Option<String>, body: &str) -> ClientError {
    let messages = parse_messages(body);
    let message = if messages.is_empty() {
        body.trim().to_string()
    } else {
        SplunkMessages {
            messages: messages.clone(),
        }
        .joined_text()
    };

    match status {
        400 => ClientError::RequestRejected {
            status,
            message,
            messages,
        },
        401 | 403 => ClientError::Unauthorized(message),
        404 => ClientError::NotFound(message),
        _ => ClientError::ApiError {
            status,
            url,
            message,
            request_id,
        },
    }
}
