/*!
 Bridge to the [`plist`] crate, which reads and writes XML property lists.

 XML property lists cannot express every [`Value`]:
   - [`Value::Null`] has no XML form and is rejected
   - [`Value::Set`] is written as an array
   - [`Value::Uid`] is written as a `CF$UID` dictionary, the way Foundation writes keyed archives as XML
*/

use std::{io::Write, time::SystemTime};

use chrono::{DateTime, Utc};

use crate::{
    binary::models::MAX_DEPTH,
    error::{binary::BinaryPlistError, plist::PlistError},
    value::{Dictionary, Uid, Value},
};

/// The dictionary key Foundation uses to represent a [`Uid`] in XML
pub const UID_KEY: &str = "CF$UID";

/// Parse an XML property list
pub fn read_xml(bytes: &[u8]) -> Result<Value, PlistError> {
    let value = plist::Value::from_reader_xml(bytes).map_err(PlistError::Xml)?;
    from_xml_value(value)
}

/// Serialize `value` as an XML property list
pub fn write_xml<W: Write>(value: &Value, writer: W) -> Result<(), PlistError> {
    to_xml_value(value)?
        .to_writer_xml(writer)
        .map_err(PlistError::Xml)
}

/// Convert a value produced by the [`plist`] crate
///
/// Fails if containers are nested more than [`MAX_DEPTH`] levels deep.
pub fn from_xml_value(value: plist::Value) -> Result<Value, PlistError> {
    convert_from_xml(value, 0)
}

fn convert_from_xml(value: plist::Value, depth: usize) -> Result<Value, PlistError> {
    check_depth(depth)?;
    Ok(match value {
        plist::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(convert_from_xml(item, depth + 1)?);
            }
            Value::Array(out)
        }
        plist::Value::Dictionary(dict) => {
            let mut out = Dictionary::with_capacity(dict.len());
            for (key, value) in dict {
                out.insert(key, convert_from_xml(value, depth + 1)?);
            }
            Value::Dictionary(out)
        }
        plist::Value::Boolean(value) => Value::Boolean(value),
        plist::Value::Data(bytes) => Value::Data(bytes),
        plist::Value::Date(date) => Value::Date(DateTime::<Utc>::from(SystemTime::from(date))),
        plist::Value::Real(value) => Value::Real(value),
        plist::Value::Integer(value) => match value.as_signed() {
            Some(value) => Value::Integer(value),
            None => {
                return Err(BinaryPlistError::IntegerTooLarge(
                    value.as_unsigned().unwrap_or(u64::MAX),
                )
                .into())
            }
        },
        plist::Value::String(string) => Value::String(string),
        plist::Value::Uid(uid) => Value::Uid(Uid(uid.get())),
        _ => return Err(PlistError::UnsupportedXmlValue("unknown")),
    })
}

/// Convert a value into the form the [`plist`] crate writes
///
/// Fails if containers are nested more than [`MAX_DEPTH`] levels deep.
pub fn to_xml_value(value: &Value) -> Result<plist::Value, PlistError> {
    convert_to_xml(value, 0)
}

fn convert_to_xml(value: &Value, depth: usize) -> Result<plist::Value, PlistError> {
    check_depth(depth)?;
    Ok(match value {
        Value::Null => return Err(PlistError::UnsupportedXmlValue(value.kind())),
        Value::Boolean(value) => plist::Value::Boolean(*value),
        Value::Integer(value) => plist::Value::Integer((*value).into()),
        Value::Real(value) => plist::Value::Real(*value),
        Value::Date(date) => plist::Value::Date(SystemTime::from(*date).into()),
        Value::Data(bytes) => plist::Value::Data(bytes.clone()),
        Value::String(string) => plist::Value::String(string.clone()),
        Value::Uid(uid) => {
            let mut dict = plist::Dictionary::new();
            dict.insert(
                UID_KEY.to_string(),
                plist::Value::Integer(uid.get().into()),
            );
            plist::Value::Dictionary(dict)
        }
        Value::Array(items) | Value::Set(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(convert_to_xml(item, depth + 1)?);
            }
            plist::Value::Array(out)
        }
        Value::Dictionary(dict) => {
            let mut out = plist::Dictionary::new();
            for (key, value) in dict {
                out.insert(key.clone(), convert_to_xml(value, depth + 1)?);
            }
            plist::Value::Dictionary(out)
        }
    })
}

fn check_depth(depth: usize) -> Result<(), PlistError> {
    if depth >= MAX_DEPTH {
        return Err(BinaryPlistError::TooDeep(MAX_DEPTH).into());
    }
    Ok(())
}
