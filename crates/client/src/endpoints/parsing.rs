//! Parsing of Splunk response envelopes.
//!
//! Error bodies arrive as JSON (`{"messages": [...]}`) when `output_mode=json`
//! was requested and as XML (`<response><messages><msg type=..>`) otherwise.

use quick_xml::Reader;
use quick_xml::events::Event;

use crate::models::{MessageType, SplunkMessage, SplunkMessages};

/// Extract the message list from an error body in either format.
///
/// Returns an empty list when the body carries no recognizable messages.
pub fn parse_messages(body: &str) -> Vec<SplunkMessage> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<SplunkMessages>(trimmed)
            .map(|m| m.messages)
            .unwrap_or_default();
    }
    if trimmed.starts_with('<') {
        return parse_xml_messages(trimmed);
    }
    Vec::new()
}

fn parse_xml_messages(body: &str) -> Vec<SplunkMessage> {
    let mut reader = Reader::from_str(body);
    let mut messages = Vec::new();
    let mut current: Option<(MessageType, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"msg" => {
                let message_type = e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.local_name().as_ref() == b"type")
                    .and_then(|attr| attr.unescape_value().ok())
                    .map(|value| MessageType::from_wire(&value))
                    .unwrap_or_default();
                current = Some((message_type, String::new()));
            }
            Ok(Event::Text(t)) => {
                if let Some((_, text)) = current.as_mut() {
                    if let Ok(unescaped) = t.unescape() {
                        text.push_str(&unescaped);
                    }
                }
            }
            Ok(Event::CData(t)) => {
                if let Some((_, text)) = current.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"msg" => {
                if let Some((message_type, text)) = current.take() {
                    messages.push(SplunkMessage::new(message_type, text.trim()));
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }

    messages
}

/// Read a string field from a JSON create/status payload.
///
/// Splunk answers either with the field at the top level or wrapped as
/// `{"entry": [{"content": {...}}]}`.
pub fn entry_field<'a>(value: &'a serde_json::Value, field: &str) -> Option<&'a serde_json::Value> {
    value
        .get(field)
        .or_else(|| value.get("entry")?.get(0)?.get("content")?.get(field))
}

/// The `content` object of the first entry, or the payload itself when unwrapped.
pub fn entry_content(value: serde_json::Value) -> serde_json::Value {
    match value
        .get("entry")
        .and_then(|entry| entry.get(0))
        .and_then(|first| first.get("content"))
    {
        Some(content) => content.clone(),
        None => value,
    }
}
