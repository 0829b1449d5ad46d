//! HTTP transport tests against a mock Splunk server.
//!
//! Test coverage:
//! - Request shape of every search endpoint (paths, namespace, auth header, params)
//! - Both create-job response shapes and status parsing
//! - Status classification: 400 rejection text, 401, 404 (JSON and XML bodies)
//! - Retry of transient statuses and exhaustion
//! - A normal search driven end to end through `SearchController`
//!
//! # What this does NOT handle
//! - Decoder edge cases (see decoder_property_tests.rs)

mod common;

use common::*;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};

const SID: &str = "1700000000.42";

#[tokio::test]
async fn test_create_job_request_shape() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/search/jobs"))
        .and(header("Authorization", "Bearer test-token"))
        .and(body_string_contains("exec_mode=normal"))
        .and(body_string_contains("output_mode=json"))
        .and(body_string_contains("earliest_time=-24h"))
        .and(body_string_contains("max_count=100"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(load_fixture("search/create_job_success.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let request = SearchRequest::builder("search index=main")
        .earliest_time("-24h")
        .max_count(100)
        .build()
        .unwrap();

    let sid = client.create_job(&Namespace::global(), &request).await.unwrap();
    assert_eq!(sid, SID);
}

#[tokio::test]
async fn test_create_job_entry_shape_in_namespace() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/servicesNS/admin/search/search/jobs"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(load_fixture("search/create_job_entry.json")),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let request = SearchRequest::builder("search index=main").build().unwrap();

    let sid = client
        .create_job(&Namespace::new("admin", "search"), &request)
        .await
        .unwrap();
    assert_eq!(sid, "scheduler__admin__search__RMD5_at_1700000000_7");
}

#[tokio::test]
async fn test_create_job_without_sid_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/search/jobs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({"entry": []})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let request = SearchRequest::builder("search index=main").build().unwrap();

    let result = client.create_job(&Namespace::global(), &request).await;
    assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
}

#[tokio::test]
async fn test_bad_query_is_rejected_with_service_text() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/search/jobs"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(load_fixture("search/error_unknown_command.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(client_for(&mock_server, 3));
    let controller = SearchController::new(transport);
    let request = SearchRequest::builder("search index=main | nosuchcommand")
        .build()
        .unwrap();

    match controller.run(request, &CancellationToken::new()).await {
        Err(ClientError::RequestRejected {
            status,
            message,
            messages,
        }) => {
            assert_eq!(status, 400);
            assert_eq!(
                message,
                "Error in 'search' command: Unknown search command 'nosuchcommand'."
            );
            assert_eq!(messages.len(), 1);
        }
        other => panic!("Expected RequestRejected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_job_status_parses_string_encoded_fields() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .and(query_param("output_mode", "json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("search/job_status_done.json")),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let status = client.job_status(&Namespace::global(), SID).await.unwrap();

    assert!(status.is_done);
    assert!(!status.has_failed());
    assert_eq!(status.dispatch_state, splunk_search::DispatchState::Done);
    assert_eq!(status.result_count, 5);
    assert_eq!(status.sid, SID);
}

#[tokio::test]
async fn test_preview_results_stream_through_decoder() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("search/job_status_running.json")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}/results_preview")))
        .and(query_param("output_mode", "xml"))
        .and(query_param("count", "50"))
        .and(query_param("offset", "100"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_text_fixture("search/results_hosts.xml")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(client_for(&mock_server, 0));
    let mut job = JobHandle::attach(transport, Namespace::global(), SID);
    job.refresh().await.unwrap();
    assert!(!job.is_done());

    let mut stream = job
        .open_results_page(ResultKind::Preview, 100, 50)
        .await
        .unwrap();
    assert!(!stream.is_final());
    let records = stream.collect_records().await.unwrap();
    assert_eq!(records.len(), 5);
    assert_eq!(stream.messages()[0].text, "base lispy: [ AND index::main ]");
}

#[tokio::test]
async fn test_export_streams_without_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/services/search/jobs/export"))
        .and(query_param("output_mode", "xml"))
        .and(query_param("search", "search index=main | head 3"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_text_fixture("search/export_concatenated.xml")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(client_for(&mock_server, 0));
    let controller = SearchController::new(transport);
    let request = SearchRequest::builder("search index=main | head 3")
        .mode(SearchMode::Export)
        .build()
        .unwrap();

    let mut results = controller
        .run(request, &CancellationToken::new())
        .await
        .unwrap();
    assert!(results.job.is_none());
    assert!(results.stream.is_final());
    assert_eq!(results.stream.collect_records().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_cancel_of_unknown_job_is_ok() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(
            ResponseTemplate::new(404).set_body_string(load_text_fixture("search/error_unknown_sid.xml")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Arc::new(client_for(&mock_server, 0));
    match client.delete_job(&Namespace::global(), SID).await {
        Err(ClientError::NotFound(message)) => assert_eq!(message, "Unknown sid."),
        other => panic!("Expected NotFound, got {other:?}"),
    }

    // The same answer through a job handle counts as cancelled.
    let mock_server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let transport: Arc<dyn Transport> = Arc::new(client_for(&mock_server, 0));
    let mut job = JobHandle::attach(transport, Namespace::global(), SID);
    job.cancel().await.unwrap();
    assert!(job.is_cancelled());
}

#[tokio::test]
async fn test_unauthorized_is_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
            "messages": [{"type": "WARN", "text": "call not properly authenticated"}]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client.job_status(&Namespace::global(), SID).await.unwrap_err();
    assert!(err.is_auth_error());
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_retry_on_503_then_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("search/job_status_running.json")),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 1);
    let start = std::time::Instant::now();
    let status = client.job_status(&Namespace::global(), SID).await.unwrap();

    assert_eq!(status.dispatch_state, splunk_search::DispatchState::Running);
    // One backoff of 1s.
    assert!(start.elapsed() >= std::time::Duration::from_millis(900));
}

#[tokio::test]
async fn test_no_retries_when_disabled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let result = client.job_status(&Namespace::global(), SID).await;
    assert!(matches!(result, Err(ClientError::MaxRetriesExceeded(1))));
}

#[tokio::test]
async fn test_normal_search_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/search/jobs"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(load_fixture("search/create_job_success.json")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("search/job_status_running.json")),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(load_fixture("search/job_status_done.json")),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/services/search/jobs/{SID}/results")))
        .and(query_param("output_mode", "xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(load_text_fixture("search/results_hosts.xml")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let transport: Arc<dyn Transport> = Arc::new(client_for(&mock_server, 0));
    let controller = SearchController::new(transport).with_policy(PollPolicy {
        poll_interval: std::time::Duration::from_millis(20),
        ..PollPolicy::default()
    });
    let request = SearchRequest::builder("search index=main | stats count by host")
        .build()
        .unwrap();

    let mut results = controller
        .run(request, &CancellationToken::new())
        .await
        .unwrap();
    let job = results.job.as_ref().unwrap();
    assert!(job.is_done());
    assert_eq!(job.status().result_count, 5);

    let records = results.stream.collect_records().await.unwrap();
    let counts: Vec<_> = records.iter().filter_map(|r| r.get_str("count")).collect();
    assert_eq!(counts, ["1200", "980", "310", "77", "12"]);
}
