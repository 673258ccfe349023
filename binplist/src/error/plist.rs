/*!
 Errors surfaced by the top-level property list API.
*/

use std::{
    fmt::{Display, Formatter, Result},
    io::Error as IoError,
};

use crate::error::binary::BinaryPlistError;

/// Errors that can happen when reading or writing a property list
#[derive(Debug)]
pub enum PlistError {
    /// The data does not start with the `bplist00` header
    NotBinaryPlist,
    /// The binary data is malformed or the value cannot be encoded
    InvalidPlist(BinaryPlistError),
    /// The XML property list library failed to read or write the data
    Xml(plist::Error),
    /// The value holds a kind that XML property lists cannot express
    UnsupportedXmlValue(&'static str),
    /// Reading from or writing to the underlying stream failed
    Io(IoError),
}

impl PlistError {
    /// Whether the data was recognized but could not be processed, as opposed to not being a binary plist at all
    pub fn is_invalid(&self) -> bool {
        !matches!(self, PlistError::NotBinaryPlist | PlistError::Io(_))
    }
}

impl Display for PlistError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            PlistError::NotBinaryPlist => write!(fmt, "Data is not a binary plist!"),
            PlistError::InvalidPlist(why) => write!(fmt, "Invalid plist: {why}"),
            PlistError::Xml(why) => write!(fmt, "Invalid plist: {why}"),
            PlistError::UnsupportedXmlValue(kind) => {
                write!(fmt, "XML plists cannot contain {kind} values")
            }
            PlistError::Io(why) => write!(fmt, "{why}"),
        }
    }
}

impl std::error::Error for PlistError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlistError::InvalidPlist(why) => Some(why),
            PlistError::Xml(why) => Some(why),
            PlistError::Io(why) => Some(why),
            PlistError::NotBinaryPlist | PlistError::UnsupportedXmlValue(_) => None,
        }
    }
}

impl From<BinaryPlistError> for PlistError {
    fn from(why: BinaryPlistError) -> Self {
        PlistError::InvalidPlist(why)
    }
}

impl From<IoError> for PlistError {
    fn from(why: IoError) -> Self {
        PlistError::Io(why)
    }
}
