//! Argument handling tests for the `splunk-search` binary.
//!
//! None of these reach a server: they cover help output, argument validation
//! and configuration failures that happen before any request is sent.

mod common;

use common::{splunk_cmd, splunk_cmd_with_base_url};
use predicates::prelude::*;

#[test]
fn test_help_lists_commands() {
    splunk_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("search")
            .and(predicate::str::contains("status"))
            .and(predicate::str::contains("cancel")),
    );
}

#[test]
fn test_search_help_lists_options() {
    splunk_cmd().args(["search", "--help"]).assert().success().stdout(
        predicate::str::contains("--mode")
            .and(predicate::str::contains("--earliest"))
            .and(predicate::str::contains("--latest"))
            .and(predicate::str::contains("--count"))
            .and(predicate::str::contains("--window"))
            .and(predicate::str::contains("--snapshots"))
            .and(predicate::str::contains("--format")),
    );
}

#[test]
fn test_search_requires_query_argument() {
    splunk_cmd()
        .arg("search")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<QUERY>"));
}

#[test]
fn test_unknown_mode_is_a_usage_error() {
    splunk_cmd()
        .args(["search", "search index=main", "--mode", "batch"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown search mode 'batch'"));
}

#[test]
fn test_unknown_format_is_a_usage_error() {
    splunk_cmd()
        .args(["search", "search index=main", "--format", "yaml"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("yaml"));
}

#[test]
fn test_missing_base_url_fails_before_connecting() {
    splunk_cmd()
        .args(["status", "1700000000.42"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_empty_query_is_a_validation_error() {
    splunk_cmd_with_base_url("https://localhost:8089")
        .args(["search", "   "])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("must not be empty"));
}

#[test]
fn test_realtime_bound_in_normal_mode_is_a_validation_error() {
    splunk_cmd_with_base_url("https://localhost:8089")
        .args(["search", "search index=main", "--earliest", "rt-5m"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("requires realtime mode"));
}

#[test]
fn test_connection_refused_returns_exit_code_3() {
    // Port 1 is reserved and never listening.
    splunk_cmd_with_base_url("http://127.0.0.1:1")
        .args(["--max-retries", "0", "status", "1700000000.42"])
        .assert()
        .code(3);
}
