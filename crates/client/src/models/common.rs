//! Common types shared across Splunk API models.
//!
//! This module contains the message types Splunk attaches to error responses,
//! job status payloads and result streams. It does NOT contain job- or
//! search-specific models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Type of message from Splunk API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MessageType {
    #[serde(rename = "FATAL")]
    Fatal,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "WARN")]
    Warn,
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "DEBUG")]
    Debug,
    /// Unknown or unrecognized message type.
    #[serde(other)]
    #[default]
    Unknown,
}

impl MessageType {
    /// Parse the `type` attribute of an XML `<msg>` element.
    ///
    /// Matching is case-insensitive; anything unrecognized maps to `Unknown`.
    pub fn from_wire(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "FATAL" => Self::Fatal,
            "ERROR" => Self::Error,
            "WARN" | "WARNING" => Self::Warn,
            "INFO" => Self::Info,
            "DEBUG" => Self::Debug,
            _ => Self::Unknown,
        }
    }

    /// True for message types that describe a failed request or search.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Fatal | Self::Error)
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fatal => write!(f, "FATAL"),
            Self::Error => write!(f, "ERROR"),
            Self::Warn => write!(f, "WARN"),
            Self::Info => write!(f, "INFO"),
            Self::Debug => write!(f, "DEBUG"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// A single message from Splunk.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct SplunkMessage {
    #[serde(rename = "type", default)]
    pub message_type: MessageType,
    #[serde(default)]
    pub text: String,
}

impl SplunkMessage {
    pub fn new(message_type: MessageType, text: impl Into<String>) -> Self {
        Self {
            message_type,
            text: text.into(),
        }
    }
}

/// A collection of messages from Splunk.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct SplunkMessages {
    #[serde(default)]
    pub messages: Vec<SplunkMessage>,
}

impl SplunkMessages {
    /// Join message texts into a single display string.
    ///
    /// Texts are kept verbatim so callers can match on the service wording.
    pub fn joined_text(&self) -> String {
        self.messages
            .iter()
            .map(|msg| msg.text.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_deserialization() {
        assert_eq!(
            serde_json::from_str::<MessageType>("\"FATAL\"").unwrap(),
            MessageType::Fatal
        );
        assert_eq!(
            serde_json::from_str::<MessageType>("\"ERROR\"").unwrap(),
            MessageType::Error
        );
        assert_eq!(
            serde_json::from_str::<MessageType>("\"WARN\"").unwrap(),
            MessageType::Warn
        );
        assert_eq!(
            serde_json::from_str::<MessageType>("\"invalid\"").unwrap(),
            MessageType::Unknown
        );
    }

    #[test]
    fn test_message_type_from_wire() {
        assert_eq!(MessageType::from_wire("fatal"), MessageType::Fatal);
        assert_eq!(MessageType::from_wire("DEBUG"), MessageType::Debug);
        assert_eq!(MessageType::from_wire("WARNING"), MessageType::Warn);
        assert_eq!(MessageType::from_wire("chatter"), MessageType::Unknown);
        assert!(MessageType::Fatal.is_error());
        assert!(!MessageType::Info.is_error());
    }

    #[test]
    fn test_deserialize_splunk_messages() {
        let json = r#"{
            "messages": [
                {
                    "type": "FATAL",
                    "text": "Unknown search command 'foo'."
                }
            ]
        }"#;
        let msgs: SplunkMessages = serde_json::from_str(json).unwrap();
        assert_eq!(msgs.messages.len(), 1);
        assert_eq!(msgs.messages[0].message_type, MessageType::Fatal);
        assert_eq!(msgs.joined_text(), "Unknown search command 'foo'.");
    }

    #[test]
    fn test_joined_text_multiple() {
        let msgs = SplunkMessages {
            messages: vec![
                SplunkMessage::new(MessageType::Error, "first"),
                SplunkMessage::new(MessageType::Warn, "second"),
            ],
        };
        assert_eq!(msgs.joined_text(), "first; second");
    }
}
