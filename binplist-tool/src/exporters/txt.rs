use binplist::{Dictionary, Uid, Value};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::{
    app::runtime::Config,
    exporters::exporter::{Exporter, Writer},
};

/// Indentation added for each level of nesting
const INDENT: &str = "    ";
/// Data longer than this is summarized instead of printed in full
const MAX_DATA_PREVIEW: usize = 32;

pub struct TXT<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for TXT<'a> {
    fn new(config: &'a Config) -> Self {
        TXT { config }
    }

    fn render(&self) -> String {
        let mut out_s = self.format_value(&self.config.value, 0);
        out_s.push('\n');
        out_s
    }
}

impl<'a> Writer for TXT<'a> {
    type Output = String;

    fn format_value(&self, value: &Value, indent: usize) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Boolean(value) => value.to_string(),
            Value::Integer(value) => value.to_string(),
            Value::Real(value) => format!("{value:?}"),
            Value::Date(date) => self.format_date(date),
            Value::Data(bytes) => self.format_data(bytes),
            Value::String(string) => format!("{string:?}"),
            Value::Uid(uid) => self.format_uid(uid),
            Value::Array(items) => self.format_items(items, false, indent),
            Value::Set(items) => self.format_items(items, true, indent),
            Value::Dictionary(dict) => self.format_dictionary(dict, indent),
        }
    }

    fn format_date(&self, date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }

    fn format_data(&self, bytes: &[u8]) -> String {
        let hex: String = bytes
            .iter()
            .take(MAX_DATA_PREVIEW)
            .map(|byte| format!("{byte:02x}"))
            .collect();
        if bytes.len() > MAX_DATA_PREVIEW {
            format!("<{hex}... {} bytes>", bytes.len())
        } else {
            format!("<{hex}>")
        }
    }

    fn format_uid(&self, uid: &Uid) -> String {
        uid.to_string()
    }

    fn format_items(&self, items: &[Value], is_set: bool, indent: usize) -> String {
        let (kind, open, close) = if is_set {
            ("set", "{", "}")
        } else {
            ("array", "[", "]")
        };
        if items.is_empty() {
            return format!("{kind} {open}{close}");
        }

        let mut out_s = format!("{kind} ({}) {open}\n", items.len());
        for item in items {
            self.add_line(
                &mut out_s,
                &self.format_value(item, indent + 1),
                indent + 1,
            );
        }
        out_s.push_str(&INDENT.repeat(indent));
        out_s.push_str(close);
        out_s
    }

    fn format_dictionary(&self, dict: &Dictionary, indent: usize) -> String {
        if dict.is_empty() {
            return "dict {}".to_string();
        }

        let mut out_s = format!("dict ({}) {{\n", dict.len());
        for (key, value) in dict {
            let entry = format!("{key:?} = {}", self.format_value(value, indent + 1));
            self.add_line(&mut out_s, &entry, indent + 1);
        }
        out_s.push_str(&INDENT.repeat(indent));
        out_s.push('}');
        out_s
    }
}

impl<'a> TXT<'a> {
    fn add_line(&self, string: &mut String, part: &str, indent: usize) {
        if !part.is_empty() {
            string.push_str(&INDENT.repeat(indent));
            string.push_str(part);
            string.push('\n');
        }
    }
}
