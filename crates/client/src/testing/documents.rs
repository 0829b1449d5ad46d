//! Builder for well-formed XML result documents.

use crate::models::MessageType;

#[derive(Debug, Clone)]
enum Value {
    Text(Vec<String>),
    Raw(String),
}

/// Produces documents in the format served by `/results`, `/results_preview`
/// and `/export`.
#[derive(Debug, Clone, Default)]
pub struct ResultsDocument {
    field_order: Vec<String>,
    preview: bool,
    messages: Vec<(MessageType, String)>,
    records: Vec<Vec<(String, Value)>>,
}

impl ResultsDocument {
    pub fn new<I, S>(field_order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            field_order: field_order.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Set the `preview` attribute of the container.
    pub fn preview(mut self, preview: bool) -> Self {
        self.preview = preview;
        self
    }

    pub fn message(mut self, message_type: MessageType, text: impl Into<String>) -> Self {
        self.messages.push((message_type, text.into()));
        self
    }

    /// Append a record of single-valued fields.
    pub fn record<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.records.push(
            fields
                .into_iter()
                .map(|(k, v)| (k.into(), Value::Text(vec![v.into()])))
                .collect(),
        );
        self
    }

    /// Append a record with one multi-valued field.
    pub fn multi_record<I, V>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        self.records.push(vec![(
            field.into(),
            Value::Text(values.into_iter().map(Into::into).collect()),
        )]);
        self
    }

    /// Append a record whose `_raw` field carries segmentation markup verbatim.
    pub fn raw_record(mut self, raw_markup: impl Into<String>) -> Self {
        self.records
            .push(vec![("_raw".to_string(), Value::Raw(raw_markup.into()))]);
        self
    }

    /// Append `count` records `{field: "0"}, {field: "1"}, ...`.
    pub fn numbered_records(mut self, field: &str, count: usize) -> Self {
        for n in 0..count {
            self = self.record([(field, n.to_string())]);
        }
        self
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::from("<?xml version='1.0' encoding='UTF-8'?>\n");
        out.push_str(&format!(
            "<results preview='{}'>\n",
            if self.preview { 1 } else { 0 }
        ));

        out.push_str("<meta>\n<fieldOrder>\n");
        for field in &self.field_order {
            out.push_str(&format!("<field>{}</field>\n", escape(field)));
        }
        out.push_str("</fieldOrder>\n</meta>\n");

        if !self.messages.is_empty() {
            out.push_str("<messages>\n");
            for (message_type, text) in &self.messages {
                out.push_str(&format!(
                    "  <msg type=\"{}\">{}</msg>\n",
                    message_type,
                    escape(text)
                ));
            }
            out.push_str("</messages>\n");
        }

        for (offset, record) in self.records.iter().enumerate() {
            out.push_str(&format!("\t<result offset='{offset}'>\n"));
            for (name, value) in record {
                out.push_str(&format!("\t\t<field k='{}'>\n", escape(name)));
                match value {
                    Value::Text(values) => {
                        for v in values {
                            out.push_str(&format!(
                                "\t\t\t<value><text>{}</text></value>\n",
                                escape(v)
                            ));
                        }
                    }
                    Value::Raw(markup) => out.push_str(&format!(
                        "\t\t\t<v xml:space='preserve' trunc='0'>{markup}</v>\n"
                    )),
                }
                out.push_str("\t\t</field>\n");
            }
            out.push_str("\t</result>\n");
        }

        out.push_str("</results>\n");
        out
    }
}

fn escape(value: &str) -> String {
    quick_xml::escape::escape(value).into_owned()
}
