use base64::{prelude::BASE64_STANDARD, Engine};
use binplist::{xml::UID_KEY, Dictionary, Uid, Value};
use chrono::{DateTime, SecondsFormat, Utc};
use json::{object::Object, JsonValue};

use crate::{
    app::runtime::Config,
    exporters::exporter::{Exporter, Writer},
};

/// Spaces per level of nesting in the rendered document
const JSON_INDENT: u16 = 2;

pub struct JSON<'a> {
    /// Data that is setup from the application's runtime
    pub config: &'a Config,
}

impl<'a> Exporter<'a> for JSON<'a> {
    fn new(config: &'a Config) -> Self {
        JSON { config }
    }

    fn render(&self) -> String {
        self.format_value(&self.config.value, 0).pretty(JSON_INDENT) + "\n"
    }
}

impl<'a> Writer for JSON<'a> {
    type Output = JsonValue;

    fn format_value(&self, value: &Value, indent: usize) -> JsonValue {
        match value {
            Value::Null => JsonValue::Null,
            Value::Boolean(value) => JsonValue::from(*value),
            Value::Integer(value) => JsonValue::from(*value),
            Value::Real(value) => JsonValue::from(*value),
            Value::Date(date) => self.format_date(date),
            Value::Data(bytes) => self.format_data(bytes),
            Value::String(string) => JsonValue::from(string.as_str()),
            Value::Uid(uid) => self.format_uid(uid),
            Value::Array(items) => self.format_items(items, false, indent),
            Value::Set(items) => self.format_items(items, true, indent),
            Value::Dictionary(dict) => self.format_dictionary(dict, indent),
        }
    }

    fn format_date(&self, date: &DateTime<Utc>) -> JsonValue {
        JsonValue::from(date.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    fn format_data(&self, bytes: &[u8]) -> JsonValue {
        JsonValue::from(BASE64_STANDARD.encode(bytes))
    }

    /// Match the form Foundation uses for keyed archives
    fn format_uid(&self, uid: &Uid) -> JsonValue {
        let mut out = Object::with_capacity(1);
        out.insert(UID_KEY, JsonValue::from(uid.get()));
        JsonValue::Object(out)
    }

    // JSON has no set type, so sets are written as arrays
    fn format_items(&self, items: &[Value], _: bool, indent: usize) -> JsonValue {
        JsonValue::Array(
            items
                .iter()
                .map(|item| self.format_value(item, indent + 1))
                .collect(),
        )
    }

    fn format_dictionary(&self, dict: &Dictionary, indent: usize) -> JsonValue {
        let mut out = Object::with_capacity(dict.len());
        for (key, value) in dict {
            out.insert(key, self.format_value(value, indent + 1));
        }
        JsonValue::Object(out)
    }
}
