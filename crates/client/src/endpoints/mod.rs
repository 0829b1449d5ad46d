//! REST endpoint implementations for the search API.
//!
//! Each function takes the HTTP client, base URL and `Authorization` header
//! value explicitly; [`crate::SplunkClient`] supplies them.

mod parsing;
mod request;
pub mod search;
mod url_encoding;

pub use parsing::{entry_content, entry_field, parse_messages};
pub use request::send_request_with_retry;
pub use url_encoding::{PATH_SEGMENT_ENCODE_SET, encode_path_segment};
