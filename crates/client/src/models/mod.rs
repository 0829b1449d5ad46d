//! Data models for the Splunk search API.
//!
//! # Submodules
//! - `common`: Splunk messages attached to responses and result streams
//! - `jobs`: Typed job status snapshot
//! - `search`: Search request, execution mode, result kind and output format

mod common;
mod jobs;
mod search;

pub use common::{MessageType, SplunkMessage, SplunkMessages};
pub use jobs::{DispatchState, JobStatus};
pub use search::{OutputMode, ResultKind, SearchMode, SearchRequest, SearchRequestBuilder};
