//! Incremental decoder for Splunk XML result documents.
//!
//! Responsibilities:
//! - Accept the response body in arbitrary chunks and yield complete records.
//! - Tell a truncated document (the producer has not flushed yet) apart from
//!   one that can never become valid.
//! - Collect the stream header: field order, preview flag, search messages.
//!
//! Does NOT handle:
//! - Reading from the network (see [`crate::stream`]).
//! - JSON, CSV or raw output modes; those bodies are passed through unparsed.
//!
//! # Grammar
//!
//! ```text
//! document  := prolog* container+
//! prolog    := xml-decl | comment | processing-instruction | doctype | whitespace
//! container := <results preview=..> child* </results> | <results/>
//! child     := <meta><fieldOrder><field>NAME</field>*</fieldOrder></meta>
//!            | <messages><msg type=..>TEXT</msg>*</messages>
//!            | <result offset=..> <field k=NAME> value* </field>* </result>
//!            | any other element (skipped)
//! value     := <value><text>TEXT</text></value> | <v>MARKUP</v>
//! ```
//!
//! The decoder works on *units*: a prolog item, a container start or end tag,
//! or one complete child element of a container. A unit is committed only
//! once its last byte has been received, so every call resumes at a unit
//! boundary and committed bytes are never scanned again.
//!
//! Invariants:
//! - Running out of bytes inside a unit is `NeedMoreData`, never an error.
//! - `Malformed` is sticky: once returned, every later call returns it again.
//! - The schema is the field order of the first container and never changes.
//! - A field seen multi-valued once is multi-valued in every later record.

use quick_xml::Reader;
use quick_xml::errors::{Error as XmlError, SyntaxError};
use quick_xml::events::{BytesStart, Event};
use std::collections::HashSet;

use crate::error::ClientError;
use crate::models::{MessageType, SplunkMessage};
use crate::record::{FieldValue, Record};

/// Outcome of one [`RecordDecoder::try_decode_next`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decoded {
    /// A complete record.
    Record(Record),
    /// The buffer ends inside a unit or inside a container; feed more bytes.
    NeedMoreData,
    /// Every container seen so far is closed and nothing is buffered.
    ///
    /// Not terminal: feeding another container resumes decoding.
    EndOfStream,
    /// The buffered bytes cannot be completed into a valid document.
    Malformed(MalformedData),
}

/// Position and reason of an unrecoverable decoding failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedData {
    /// Absolute byte offset (from the start of the body) of the failing unit.
    pub offset: u64,
    pub message: String,
}

impl From<MalformedData> for ClientError {
    fn from(err: MalformedData) -> Self {
        ClientError::MalformedData {
            offset: err.offset,
            message: err.message,
        }
    }
}

/// Cursor over the consumed part of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecoderState {
    /// Complete `<result>` elements returned so far.
    pub records_decoded: u64,
    /// Absolute offset of the first byte not yet committed.
    pub consumed: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Outside any `<results>` container.
    Prolog,
    /// Inside a `<results>` container.
    Container,
}

/// Incremental, forward-only decoder for the XML result format.
#[derive(Debug)]
pub struct RecordDecoder {
    buf: Vec<u8>,
    /// Start of the uncommitted bytes in `buf`.
    pos: usize,
    /// Absolute offset of `buf[0]`.
    base: u64,
    records_decoded: u64,
    phase: Phase,
    containers_completed: u64,
    field_names: Option<Vec<String>>,
    preview: Option<bool>,
    messages: Vec<SplunkMessage>,
    multi_fields: HashSet<String>,
    pending: Option<Record>,
    failed: Option<MalformedData>,
}

impl Default for RecordDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordDecoder {
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            pos: 0,
            base: 0,
            records_decoded: 0,
            phase: Phase::Prolog,
            containers_completed: 0,
            field_names: None,
            preview: None,
            messages: Vec::new(),
            multi_fields: HashSet::new(),
            pending: None,
            failed: None,
        }
    }

    /// Append newly received bytes.
    pub fn feed(&mut self, chunk: &[u8]) {
        if self.pos > 0 {
            self.buf.drain(..self.pos);
            self.base += self.pos as u64;
            self.pos = 0;
        }
        self.buf.extend_from_slice(chunk);
    }

    /// Try to extract the next complete record from the buffered bytes.
    pub fn try_decode_next(&mut self) -> Decoded {
        if let Some(err) = &self.failed {
            return Decoded::Malformed(err.clone());
        }
        if let Some(record) = self.pending.take() {
            self.records_decoded += 1;
            return Decoded::Record(record);
        }
        match self.advance(false) {
            Step::Record(record) => {
                self.records_decoded += 1;
                Decoded::Record(record)
            }
            Step::HeaderReady | Step::NeedMoreData => Decoded::NeedMoreData,
            Step::EndOfStream => Decoded::EndOfStream,
            Step::Malformed(err) => Decoded::Malformed(err),
        }
    }

    /// Advance until the schema is known, without handing out records.
    ///
    /// Returns `Ok(true)` once [`Self::field_names`] is available and
    /// `Ok(false)` when more bytes are needed first.
    pub fn decode_header(&mut self) -> Result<bool, MalformedData> {
        if let Some(err) = &self.failed {
            return Err(err.clone());
        }
        if self.field_names.is_some() {
            return Ok(true);
        }
        match self.advance(true) {
            Step::HeaderReady | Step::EndOfStream => Ok(true),
            Step::NeedMoreData => Ok(false),
            // advance(true) parks records in `pending`
            Step::Record(record) => {
                self.pending = Some(record);
                Ok(true)
            }
            Step::Malformed(err) => Err(err),
        }
    }

    /// Field order of the first container, once its header has been decoded.
    pub fn field_names(&self) -> Option<&[String]> {
        self.field_names.as_deref()
    }

    /// The `preview` attribute of the most recent container, if it had one.
    pub fn is_preview(&self) -> Option<bool> {
        self.preview
    }

    /// Search messages collected from `<messages>` elements so far.
    pub fn messages(&self) -> &[SplunkMessage] {
        &self.messages
    }

    pub fn state(&self) -> DecoderState {
        DecoderState {
            records_decoded: self.records_decoded,
            consumed: self.base + self.pos as u64,
        }
    }

    /// Number of `<results>` containers that have been closed.
    pub fn containers_completed(&self) -> u64 {
        self.containers_completed
    }

    /// True when uncommitted, non-whitespace bytes are buffered, or a
    /// container is still open.
    pub fn has_partial_input(&self) -> bool {
        self.phase == Phase::Container
            || self.pending.is_some()
            || self.buf[self.pos..]
                .iter()
                .any(|b| !b.is_ascii_whitespace())
    }

    fn advance(&mut self, header_only: bool) -> Step {
        loop {
            if header_only && self.field_names.is_some() {
                return Step::HeaderReady;
            }

            let unit = next_unit(&self.buf[self.pos..], self.phase);
            let unit_offset = self.base + self.pos as u64;
            match unit {
                Unit::Exhausted => {
                    return if self.phase == Phase::Prolog && self.containers_completed > 0 {
                        Step::EndOfStream
                    } else {
                        Step::NeedMoreData
                    };
                }
                Unit::Incomplete => return Step::NeedMoreData,
                Unit::Invalid { at, message } => {
                    return self.fail(unit_offset + at as u64, message);
                }
                Unit::Skip(len) => self.pos += len,
                Unit::Open { len, preview } => {
                    self.pos += len;
                    self.phase = Phase::Container;
                    if preview.is_some() {
                        self.preview = preview;
                    }
                }
                Unit::EmptyContainer { len, preview } => {
                    self.pos += len;
                    if preview.is_some() {
                        self.preview = preview;
                    }
                    self.close_container();
                }
                Unit::Close(len) => {
                    self.pos += len;
                    self.phase = Phase::Prolog;
                    self.close_container();
                }
                Unit::Child { len, element } => {
                    self.pos += len;
                    match element.name.as_str() {
                        "meta" => self.apply_meta(&element),
                        "messages" => self.apply_messages(&element),
                        _ => {}
                    }
                    if element.name == "result" {
                        let record = match self.build_record(element) {
                            Ok(record) => record,
                            Err(message) => return self.fail(unit_offset, message),
                        };
                        if self.field_names.is_none() {
                            self.field_names = Some(Vec::new());
                        }
                        return Step::Record(record);
                    }
                }
            }
        }
    }

    fn fail(&mut self, offset: u64, message: String) -> Step {
        let err = MalformedData { offset, message };
        self.failed = Some(err.clone());
        Step::Malformed(err)
    }

    fn close_container(&mut self) {
        self.containers_completed += 1;
        if self.field_names.is_none() {
            self.field_names = Some(Vec::new());
        }
    }

    fn apply_meta(&mut self, meta: &Element) {
        if self.field_names.is_some() {
            return;
        }
        let names = meta
            .child("fieldOrder")
            .map(|order| {
                order
                    .children_named("field")
                    .map(|field| field.text())
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        self.field_names = Some(names);
    }

    fn apply_messages(&mut self, messages: &Element) {
        for msg in messages.children_named("msg") {
            let message_type = msg
                .attr("type")
                .map(MessageType::from_wire)
                .unwrap_or_default();
            self.messages
                .push(SplunkMessage::new(message_type, msg.text().trim()));
        }
    }

    fn build_record(&mut self, result: Element) -> Result<Record, String> {
        let offset = result.attr("offset").and_then(|v| v.trim().parse().ok());
        let mut fields: Vec<(String, FieldValue)> = Vec::new();

        for node in result.children {
            let Node::Element(field) = node else {
                continue;
            };
            if field.name != "field" {
                continue;
            }
            let Some(name) = field.attr("k").map(str::to_string) else {
                return Err("<field> without a k attribute".to_string());
            };

            let mut values: Vec<String> = Vec::new();
            for node in &field.children {
                let Node::Element(value) = node else {
                    continue;
                };
                match value.name.as_str() {
                    "value" => values.push(
                        value.child("text").map(Element::text).unwrap_or_default(),
                    ),
                    "v" => values.push(value.raw.clone().unwrap_or_default()),
                    _ => {}
                }
            }

            // A repeated <field k> inside one result extends the earlier values.
            if let Some((_, existing)) = fields.iter_mut().find(|(k, _)| *k == name) {
                let mut merged =
                    std::mem::replace(existing, FieldValue::Multi(Vec::new())).into_multi();
                merged.extend(values);
                *existing = FieldValue::Multi(merged);
                self.multi_fields.insert(name);
                continue;
            }

            let value = if values.len() > 1 || self.multi_fields.contains(&name) {
                self.multi_fields.insert(name.clone());
                FieldValue::Multi(values)
            } else {
                FieldValue::Single(values.pop().unwrap_or_default())
            };
            fields.push((name, value));
        }

        Ok(Record::new(fields, offset))
    }
}

enum Step {
    Record(Record),
    HeaderReady,
    NeedMoreData,
    EndOfStream,
    Malformed(MalformedData),
}

/// One unit at the start of the uncommitted buffer. Lengths are in bytes.
#[derive(Debug)]
enum Unit {
    /// Nothing left to read at a unit boundary.
    Exhausted,
    /// The buffer ends inside this unit.
    Incomplete,
    /// `at` is relative to the start of the unit.
    Invalid { at: usize, message: String },
    Skip(usize),
    Open { len: usize, preview: Option<bool> },
    EmptyContainer { len: usize, preview: Option<bool> },
    Close(usize),
    Child { len: usize, element: Element },
}

#[derive(Debug, Default)]
struct Element {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
    /// Inner markup kept verbatim, only for `<v>`.
    raw: Option<String>,
}

#[derive(Debug)]
enum Node {
    Element(Element),
    Text(String),
}

impl Element {
    fn from_start(start: &BytesStart<'_>) -> Result<Self, String> {
        let name = utf8(start.local_name().as_ref())?.to_string();
        let mut attrs = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|err| format!("bad attribute in <{name}>: {err}"))?;
            let key = utf8(attr.key.local_name().as_ref())?.to_string();
            let value = attr
                .unescape_value()
                .map_err(|err| format!("bad attribute value in <{name}>: {err}"))?
                .into_owned();
            attrs.push((key, value));
        }
        Ok(Self {
            name,
            attrs,
            ..Default::default()
        })
    }

    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn child<'a>(&'a self, name: &str) -> Option<&'a Element> {
        self.children_named(name).next()
    }

    fn children_named<'a, 'n>(
        &'a self,
        name: &'n str,
    ) -> impl Iterator<Item = &'a Element> + use<'a, 'n> {
        self.children.iter().filter_map(move |node| match node {
            Node::Element(el) if el.name == name => Some(el),
            _ => None,
        })
    }

    /// Concatenated direct text children.
    fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                Node::Text(text) => Some(text.as_str()),
                Node::Element(_) => None,
            })
            .collect()
    }
}

fn utf8(bytes: &[u8]) -> Result<&str, String> {
    std::str::from_utf8(bytes).map_err(|err| format!("invalid UTF-8: {err}"))
}

fn is_whitespace(bytes: &[u8]) -> bool {
    bytes.iter().all(|b| b.is_ascii_whitespace())
}

fn preview_attr(start: &BytesStart<'_>) -> Result<Option<bool>, String> {
    let el = Element::from_start(start)?;
    Ok(el
        .attr("preview")
        .map(|v| matches!(v.trim(), "1" | "true" | "True")))
}

fn new_reader(buf: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(buf);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.expand_empty_elements = false;
    // Each unit is read by a fresh reader, so `</results>` arrives without its
    // opening tag. Nesting is checked by `read_subtree` and `next_unit`.
    config.allow_unmatched_ends = true;
    reader
}

/// Read the unit starting at `buf[0]`.
fn next_unit(buf: &[u8], phase: Phase) -> Unit {
    let mut reader = new_reader(buf);
    let event = match reader.read_event() {
        Ok(event) => event,
        Err(err) => return classify(err, buf, 0),
    };
    let end = reader.buffer_position() as usize;

    match (phase, event) {
        (_, Event::Eof) => Unit::Exhausted,
        (_, Event::Comment(_)) | (_, Event::PI(_)) => Unit::Skip(end),
        (_, Event::Text(text)) if is_whitespace(&text) => Unit::Skip(end),
        (Phase::Prolog, Event::Decl(_)) | (Phase::Prolog, Event::DocType(_)) => Unit::Skip(end),
        (Phase::Prolog, Event::Start(start)) if start.local_name().as_ref() == b"results" => {
            match preview_attr(&start) {
                Ok(preview) => Unit::Open { len: end, preview },
                Err(message) => Unit::Invalid { at: 0, message },
            }
        }
        (Phase::Prolog, Event::Empty(start)) if start.local_name().as_ref() == b"results" => {
            match preview_attr(&start) {
                Ok(preview) => Unit::EmptyContainer { len: end, preview },
                Err(message) => Unit::Invalid { at: 0, message },
            }
        }
        (Phase::Prolog, Event::Start(start)) | (Phase::Prolog, Event::Empty(start)) => {
            Unit::Invalid {
                at: 0,
                message: format!(
                    "expected <results>, found <{}>",
                    String::from_utf8_lossy(start.local_name().as_ref())
                ),
            }
        }
        (Phase::Container, Event::End(end_tag)) if end_tag.local_name().as_ref() == b"results" => {
            Unit::Close(end)
        }
        (_, Event::End(end_tag)) => Unit::Invalid {
            at: 0,
            message: format!(
                "unexpected closing tag </{}>",
                String::from_utf8_lossy(end_tag.local_name().as_ref())
            ),
        },
        (Phase::Container, Event::Empty(start)) => match Element::from_start(&start) {
            Ok(element) => Unit::Child { len: end, element },
            Err(message) => Unit::Invalid { at: 0, message },
        },
        (Phase::Container, Event::Start(start)) => {
            let root = match Element::from_start(&start) {
                Ok(element) => element,
                Err(message) => return Unit::Invalid { at: 0, message },
            };
            match read_subtree(&mut reader, buf, root, end) {
                Ok(element) => Unit::Child {
                    len: reader.buffer_position() as usize,
                    element,
                },
                Err(stop) => stop,
            }
        }
        (_, Event::Text(_)) | (_, Event::CData(_)) => Unit::Invalid {
            at: 0,
            message: "unexpected character data outside <result>".to_string(),
        },
        (Phase::Container, Event::Decl(_)) | (Phase::Container, Event::DocType(_)) => {
            Unit::Invalid {
                at: 0,
                message: "declaration inside <results>".to_string(),
            }
        }
    }
}

/// Read until the element opened by `root` is closed.
///
/// Returns `Err(Unit::Incomplete)` when the buffer ends first and
/// `Err(Unit::Invalid { .. })` on impossible nesting.
fn read_subtree(
    reader: &mut Reader<&[u8]>,
    buf: &[u8],
    root: Element,
    root_inner_start: usize,
) -> Result<Element, Unit> {
    let mut stack: Vec<(Element, usize)> = vec![(root, root_inner_start)];

    loop {
        let before = reader.buffer_position() as usize;
        let event = reader.read_event().map_err(|err| classify(err, buf, before))?;
        let after = reader.buffer_position() as usize;

        match event {
            Event::Start(start) => {
                let element = Element::from_start(&start)
                    .map_err(|message| Unit::Invalid { at: before, message })?;
                stack.push((element, after));
            }
            Event::Empty(start) => {
                let element = Element::from_start(&start)
                    .map_err(|message| Unit::Invalid { at: before, message })?;
                attach(&mut stack, Node::Element(element));
            }
            Event::End(end_tag) => {
                let Some((mut element, inner_start)) = stack.pop() else {
                    return Err(Unit::Invalid {
                        at: before,
                        message: "closing tag without an open element".to_string(),
                    });
                };
                if end_tag.local_name().as_ref() != element.name.as_bytes() {
                    return Err(Unit::Invalid {
                        at: before,
                        message: format!(
                            "mismatched closing tag </{}> inside <{}>",
                            String::from_utf8_lossy(end_tag.local_name().as_ref()),
                            element.name
                        ),
                    });
                }
                if element.name == "v" {
                    let raw = utf8(&buf[inner_start..before])
                        .map_err(|message| Unit::Invalid { at: inner_start, message })?;
                    element.raw = Some(raw.to_string());
                }
                if stack.is_empty() {
                    return Ok(element);
                }
                attach(&mut stack, Node::Element(element));
            }
            Event::Text(text) => match text.unescape() {
                Ok(value) => attach(&mut stack, Node::Text(value.into_owned())),
                // A split entity or character at the very end is truncation.
                Err(_) if after >= buf.len() => return Err(Unit::Incomplete),
                Err(err) => {
                    return Err(Unit::Invalid {
                        at: before,
                        message: format!("bad character data: {err}"),
                    });
                }
            },
            Event::CData(cdata) => {
                let value = utf8(&cdata).map_err(|message| Unit::Invalid { at: before, message })?;
                attach(&mut stack, Node::Text(value.to_string()));
            }
            Event::Comment(_) | Event::PI(_) | Event::Decl(_) | Event::DocType(_) => {}
            Event::Eof => return Err(Unit::Incomplete),
        }
    }
}

fn attach(stack: &mut [(Element, usize)], node: Node) {
    if let Some((parent, _)) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Decide whether a reader error is caused by the buffer ending early.
fn classify(err: XmlError, buf: &[u8], at: usize) -> Unit {
    match err {
        XmlError::Syntax(SyntaxError::InvalidBangMarkup) => {
            if ends_in_bang_prefix(buf) {
                Unit::Incomplete
            } else {
                Unit::Invalid {
                    at,
                    message: "invalid <! markup".to_string(),
                }
            }
        }
        // Unclosed tags, comments, CDATA, declarations: only reported at end of input.
        XmlError::Syntax(_) => Unit::Incomplete,
        other => Unit::Invalid {
            at,
            message: other.to_string(),
        },
    }
}

/// True when the bytes from the last `<` are a strict prefix of a `<!` construct.
fn ends_in_bang_prefix(buf: &[u8]) -> bool {
    let Some(start) = buf.iter().rposition(|&b| b == b'<') else {
        return false;
    };
    let tail = &buf[start..];
    [
        b"<!--".as_slice(),
        b"<![CDATA[".as_slice(),
        b"<!DOCTYPE".as_slice(),
    ]
        .iter()
        .any(|markup| tail.len() < markup.len() && markup[..tail.len()].eq_ignore_ascii_case(tail))
}
