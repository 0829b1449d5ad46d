//! Percent-encoding of path segments.
//!
//! Search ids, owners and app names are interpolated into REST paths
//! (`/servicesNS/{owner}/{app}/search/jobs/{sid}`). A realtime sid such as
//! `rt_md_1700000000.42` is harmless, but a scheduler sid can carry `@` and
//! `/`-like characters, and an owner name may contain spaces.
//!
//! ```
//! use splunk_search::endpoints::encode_path_segment;
//!
//! assert_eq!(encode_path_segment("jane doe"), "jane%20doe");
//! ```

use percent_encoding::{AsciiSet, CONTROLS, percent_encode};

/// Characters that must be percent-encoded in URL path segments.
///
/// RFC 3986 section 3.3 plus characters that would split the segment or
/// start a query or fragment.
pub const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')      // Space
    .add(b'"')      // Double quote
    .add(b'<')      // Less than
    .add(b'>')      // Greater than
    .add(b'`')      // Backtick
    .add(b'{')      // Left curly brace
    .add(b'}')      // Right curly brace
    .add(b'|')      // Pipe
    .add(b'\\')     // Backslash
    .add(b'^')      // Caret
    .add(b'~')      // Tilde
    .add(b'%')      // Percent (prevents double-encoding)
    .add(b'/')      // Forward slash (prevents path traversal)
    .add(b'?')      // Question mark
    .add(b'#')      // Hash
    .add(b'+')      // Plus
    .add(b',')      // Comma
    .add(b';')      // Semicolon
    .add(b'[')      // Left square bracket
    .add(b']'); // Right square bracket

/// Percent-encode a string for safe use as a URL path segment.
///
/// Applied to every sid, owner and app before it lands in a URL path.
pub fn encode_path_segment(segment: &str) -> String {
    percent_encode(segment.as_bytes(), PATH_SEGMENT_ENCODE_SET).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sid_characters_pass_through() {
        assert_eq!(encode_path_segment("1700000000.42"), "1700000000.42");
        assert_eq!(encode_path_segment("rt_md_1700000000.7"), "rt_md_1700000000.7");
        assert_eq!(
            encode_path_segment("scheduler__admin__search__RMD5_at_1700000000_3"),
            "scheduler__admin__search__RMD5_at_1700000000_3"
        );
    }

    #[test]
    fn test_encode_slash_and_space() {
        assert_eq!(encode_path_segment("my/app"), "my%2Fapp");
        assert_eq!(encode_path_segment("jane doe"), "jane%20doe");
    }

    #[test]
    fn test_encode_percent_is_not_double_decoded() {
        assert_eq!(encode_path_segment("user%20name"), "user%2520name");
    }

    #[test]
    fn test_encode_query_and_fragment_markers() {
        assert_eq!(encode_path_segment("sid?output_mode=csv"), "sid%3Foutput_mode=csv");
        assert_eq!(encode_path_segment("sid#x"), "sid%23x");
    }

    #[test]
    fn test_encode_unicode() {
        assert_eq!(encode_path_segment("user\u{00e9}"), "user%C3%A9");
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(encode_path_segment(""), "");
    }
}
