//! Testing utilities for search pipeline tests.
//!
//! This module provides an in-memory [`Transport`](crate::Transport) driven by
//! scripted responses, chunked bodies, a builder for XML result documents and
//! fixture loading. Available when running tests or when the `test-utils`
//! feature is enabled.
//!
//! # Example
//! ```ignore
//! use splunk_search::testing::{ResultsDocument, ScriptedBody, ScriptedTransport};
//!
//! let transport = ScriptedTransport::new();
//! transport.push_oneshot(Ok(ScriptedBody::chunked(
//!     ResultsDocument::new(["host"]).record([("host", "web-01")]).to_xml(),
//!     16,
//! )));
//! ```

mod documents;
mod transport;

pub use documents::ResultsDocument;
pub use transport::{Call, ScriptedBody, ScriptedTransport};

use std::path::Path;

fn fixture_path(fixture_path: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(fixture_path)
}

/// Load a JSON fixture file from the fixtures directory.
///
/// # Panics
/// - If the fixture file cannot be read
/// - If the file content is not valid JSON
pub fn load_fixture(fixture_path: &str) -> serde_json::Value {
    let content = load_text_fixture(fixture_path);
    serde_json::from_str(&content).expect("Invalid JSON in fixture")
}

/// Load a fixture file verbatim (XML result documents, raw error bodies).
///
/// # Panics
/// - If the fixture file cannot be read
pub fn load_text_fixture(fixture_path: &str) -> String {
    let full_path = self::fixture_path(fixture_path);
    std::fs::read_to_string(&full_path)
        .unwrap_or_else(|_| panic!("Failed to load fixture: {}", full_path.display()))
}
