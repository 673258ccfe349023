/*!
 Data structures used to represent property list values in memory.

 Every [`Value`] is an owned tree: decoding always produces independent copies, even when
 the encoded file shares a single object between several containers.
*/

use std::{
    collections::{hash_map::DefaultHasher, HashMap},
    fmt::{Display, Formatter, Result},
    hash::{Hash, Hasher},
};

use chrono::{DateTime, SubsecRound, Utc};
use indexmap::IndexMap;

/// A property list dictionary. Keys are always strings; insertion order is kept but ignored by equality.
pub type Dictionary = IndexMap<String, Value>;

/// A reference used by keyed archives, such as `NSKeyedArchiver`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Uid(pub u64);

impl Uid {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Display for Uid {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        write!(fmt, "Uid({})", self.0)
    }
}

/// Any value that can be stored in a property list
///
/// Equality and hashing are structural:
///   - [`Value::Real`] compares by bit pattern, so `NaN` equals itself and `0.0` differs from `-0.0`
///   - [`Value::Set`] compares its members regardless of order
///   - [`Value::Dictionary`] compares its entries regardless of order
///   - [`Value::Boolean`] never equals an [`Value::Integer`]
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Boolean(bool),
    /// Signed integer; files store non-negative values in the narrowest of 1, 2, 4, or 8 bytes
    Integer(i64),
    Real(f64),
    /// Files keep dates to the microsecond; finer precision is dropped when written
    Date(DateTime<Utc>),
    /// Opaque bytes, never interchangeable with [`Value::String`]
    Data(Vec<u8>),
    String(String),
    Uid(Uid),
    Array(Vec<Value>),
    /// An unordered collection; the order of the members is not significant
    Set(Vec<Value>),
    Dictionary(Dictionary),
}

impl Value {
    /// Human readable name of the kind of value, used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Real(_) => "real",
            Value::Date(_) => "date",
            Value::Data(_) => "data",
            Value::String(_) => "string",
            Value::Uid(_) => "uid",
            Value::Array(_) => "array",
            Value::Set(_) => "set",
            Value::Dictionary(_) => "dictionary",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::Date(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&[u8]> {
        match self {
            Value::Data(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_uid(&self) -> Option<Uid> {
        match self {
            Value::Uid(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&[Value]> {
        match self {
            Value::Set(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_dictionary(&self) -> Option<&Dictionary> {
        match self {
            Value::Dictionary(value) => Some(value),
            _ => None,
        }
    }
}

/// Determine if two slices hold the same members, counting duplicates, in any order
fn same_members(left: &[Value], right: &[Value]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    let mut counts: HashMap<&Value, usize> = HashMap::with_capacity(left.len());
    for item in left {
        *counts.entry(item).or_insert(0) += 1;
    }
    right.iter().all(|item| match counts.get_mut(item) {
        Some(count) if *count > 0 => {
            *count -= 1;
            true
        }
        _ => false,
    })
}

/// Combine the hashes of some items such that their order does not matter
fn unordered_hash<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0, u64::wrapping_add)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::Integer(left), Value::Integer(right)) => left == right,
            (Value::Real(left), Value::Real(right)) => left.to_bits() == right.to_bits(),
            (Value::Date(left), Value::Date(right)) => left == right,
            (Value::Data(left), Value::Data(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Uid(left), Value::Uid(right)) => left == right,
            (Value::Array(left), Value::Array(right)) => left == right,
            (Value::Set(left), Value::Set(right)) => same_members(left, right),
            (Value::Dictionary(left), Value::Dictionary(right)) => left == right,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Null => {}
            Value::Boolean(value) => value.hash(state),
            Value::Integer(value) => value.hash(state),
            Value::Real(value) => value.to_bits().hash(state),
            Value::Date(value) => value.hash(state),
            Value::Data(value) => value.hash(state),
            Value::String(value) => value.hash(state),
            Value::Uid(value) => value.hash(state),
            Value::Array(items) => items.hash(state),
            Value::Set(items) => {
                items.len().hash(state);
                unordered_hash(items.iter()).hash(state);
            }
            Value::Dictionary(dict) => {
                dict.len().hash(state);
                unordered_hash(dict.iter()).hash(state);
            }
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

/// Truncates to microseconds, the precision a file can hold
impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::Date(value.trunc_subsecs(6))
    }
}

impl From<&[u8]> for Value {
    fn from(value: &[u8]) -> Self {
        Value::Data(value.to_vec())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Uid> for Value {
    fn from(value: Uid) -> Self {
        Value::Uid(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Dictionary> for Value {
    fn from(value: Dictionary) -> Self {
        Value::Dictionary(value)
    }
}
