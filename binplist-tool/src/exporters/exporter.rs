use binplist::{Dictionary, Uid, Value};
use chrono::{DateTime, Utc};

use crate::app::runtime::Config;

/// Defines behavior for rendering a decoded property list
pub trait Exporter<'a> {
    /// Create a new exporter with references to the decoded data
    fn new(config: &'a Config) -> Self;
    /// Render the whole property list
    fn render(&self) -> String;
}

/// Defines behavior for formatting each kind of value to the desired output format
pub(super) trait Writer {
    /// The rendered form of a single value
    type Output;

    /// Format any value, dispatching on its kind
    fn format_value(&self, value: &Value, indent: usize) -> Self::Output;
    /// Format a date
    fn format_date(&self, date: &DateTime<Utc>) -> Self::Output;
    /// Format opaque bytes
    fn format_data(&self, bytes: &[u8]) -> Self::Output;
    /// Format a keyed archive reference
    fn format_uid(&self, uid: &Uid) -> Self::Output;
    /// Format an array or a set
    fn format_items(&self, items: &[Value], is_set: bool, indent: usize) -> Self::Output;
    /// Format a dictionary, keeping the order of its entries
    fn format_dictionary(&self, dict: &Dictionary, indent: usize) -> Self::Output;
}
