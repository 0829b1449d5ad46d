//! Decoded search result records.
//!
//! Responsibilities:
//! - Hold one result row as an ordered field-name to value mapping.
//! - Distinguish single-valued and multi-valued fields.
//! - Strip segmentation markup from `_raw` values on request.
//!
//! Does NOT handle:
//! - Parsing the wire format (see [`crate::decoder`]).
//!
//! Invariants:
//! - Field order is the order fields appeared in the `<result>` element.
//! - Values are stored exactly as decoded; markup stripping only happens in
//!   [`strip_markup`] and [`Record::raw_text`].

use quick_xml::Reader;
use quick_xml::events::Event;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Cow;

/// Name of the field carrying the raw event text.
pub const RAW_FIELD: &str = "_raw";

/// The value of one field in a record.
///
/// A decoder switches a field name to `Multi` the first time it sees several
/// values for it and keeps it there. Records already emitted before that point
/// keep their `Single` value, so callers that need one shape for every record
/// should read through [`Record::get_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Single(String),
    /// Values in wire order.
    Multi(Vec<String>),
}

impl FieldValue {
    /// The value when single-valued, or the first value of a multi-valued field.
    pub fn first(&self) -> Option<&str> {
        match self {
            FieldValue::Single(v) => Some(v.as_str()),
            FieldValue::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// All values in order; a single value yields one element.
    pub fn values(&self) -> Vec<&str> {
        match self {
            FieldValue::Single(v) => vec![v.as_str()],
            FieldValue::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, FieldValue::Multi(_))
    }

    pub(crate) fn into_multi(self) -> Vec<String> {
        match self {
            FieldValue::Single(v) => vec![v],
            FieldValue::Multi(values) => values,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Single(v) => serializer.serialize_str(v),
            FieldValue::Multi(values) => values.serialize(serializer),
        }
    }
}

/// One decoded search result.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
    offset: Option<u64>,
}

impl Record {
    pub(crate) fn new(fields: Vec<(String, FieldValue)>, offset: Option<u64>) -> Self {
        Self { fields, offset }
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// First value of a field, if present.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::first)
    }

    /// Every value of a field in wire order; empty when the field is absent.
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.get(name).map(FieldValue::values).unwrap_or_default()
    }

    /// The `offset` attribute of the `<result>` element, when the service sent one.
    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Field names in wire order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The `_raw` value with segmentation markup removed.
    pub fn raw_text(&self) -> Option<String> {
        self.get_str(RAW_FIELD)
            .map(|raw| strip_markup(raw).into_owned())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Remove highlighting markup (`<sg h="1">...</sg>`) from a `_raw` value and
/// unescape entities.
///
/// Input that does not parse as a markup fragment is returned unchanged.
pub fn strip_markup(raw: &str) -> Cow<'_, str> {
    if !raw.contains('<') && !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let wrapped = format!("<v>{raw}</v>");
    let mut reader = Reader::from_str(&wrapped);
    reader.config_mut().trim_text(false);

    let mut text = String::with_capacity(raw.len());
    loop {
        match reader.read_event() {
            Ok(Event::Text(t)) => match t.unescape() {
                Ok(unescaped) => text.push_str(&unescaped),
                Err(_) => return Cow::Borrowed(raw),
            },
            Ok(Event::CData(c)) => match std::str::from_utf8(&c) {
                Ok(s) => text.push_str(s),
                Err(_) => return Cow::Borrowed(raw),
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(_) => return Cow::Borrowed(raw),
        }
    }
    Cow::Owned(text)
}
