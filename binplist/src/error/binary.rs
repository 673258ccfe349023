/*!
 Errors that can happen when decoding or encoding `bplist00` data.
*/

use std::fmt::{Display, Formatter, Result};

/// Errors that can happen when decoding or encoding `bplist00` data
#[derive(Debug, Clone, PartialEq)]
pub enum BinaryPlistError {
    /// The buffer is smaller than the fixed trailer
    TooShort(usize),
    /// Tried to read the byte range ending at the first value in a buffer of the second value's length
    OutOfBounds(usize, usize),
    /// The trailer declares an offset or reference width that cannot be read
    InvalidTrailer(String),
    /// The marker byte at the given offset does not describe a known object
    InvalidMarker(u8, usize),
    /// A real was declared with a width other than 4 or 8 bytes
    InvalidRealSize(usize),
    /// An integer was declared with a width other than 1, 2, 4, or 8 bytes
    InvalidIntegerSize(usize),
    /// A length prefix was not followed by an integer object
    InvalidLength(usize),
    /// An object reference points past the end of the offset table
    InvalidReference(u64, u64),
    /// An object references itself, directly or transitively
    CyclicReference(u64),
    /// The dictionary at the given offset has a key that is not a string
    InvalidKey(usize),
    /// An ASCII string contains a byte above `0x7F`
    InvalidAscii(usize),
    /// A UTF-16 string at the given offset contains unpaired surrogates
    InvalidUtf16(usize),
    /// A date is not a finite number of seconds or is out of range
    InvalidDate(f64),
    /// The value needs more than 8 bytes to be represented
    IntegerTooLarge(u64),
    /// An object was given a reference number but its bytes were never written
    MissingObject(usize),
    /// Containers are nested deeper than the given limit
    TooDeep(usize),
}

impl Display for BinaryPlistError {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> Result {
        match self {
            BinaryPlistError::TooShort(len) => {
                write!(fmt, "File is too short: {len} bytes!")
            }
            BinaryPlistError::OutOfBounds(idx, len) => {
                write!(fmt, "Index {idx:x} is outside of range {len:x}!")
            }
            BinaryPlistError::InvalidTrailer(why) => write!(fmt, "Invalid trailer: {why}"),
            BinaryPlistError::InvalidMarker(marker, offset) => {
                write!(fmt, "Invalid object {marker:#010b} found at offset {offset}")
            }
            BinaryPlistError::InvalidRealSize(size) => {
                write!(fmt, "Unknown real of length {size} bytes")
            }
            BinaryPlistError::InvalidIntegerSize(size) => {
                write!(fmt, "Unsupported integer of length {size} bytes")
            }
            BinaryPlistError::InvalidLength(offset) => {
                write!(fmt, "Expected an integer length at offset {offset}")
            }
            BinaryPlistError::InvalidReference(reference, count) => {
                write!(fmt, "Object reference {reference} is outside of {count} objects")
            }
            BinaryPlistError::CyclicReference(reference) => {
                write!(fmt, "Object {reference} contains itself")
            }
            BinaryPlistError::InvalidKey(offset) => {
                write!(fmt, "Dictionary at offset {offset} has a key that is not a string")
            }
            BinaryPlistError::InvalidAscii(offset) => {
                write!(fmt, "String at offset {offset} is not ASCII")
            }
            BinaryPlistError::InvalidUtf16(offset) => {
                write!(fmt, "String at offset {offset} is not valid UTF-16")
            }
            BinaryPlistError::InvalidDate(seconds) => {
                write!(fmt, "Date of {seconds} seconds is not representable")
            }
            BinaryPlistError::IntegerTooLarge(value) => write!(
                fmt,
                "Core Foundation can't handle integers with size greater than 8 bytes: {value}"
            ),
            BinaryPlistError::MissingObject(reference) => write!(
                fmt,
                "Error while writing offsets table: object {reference} not found"
            ),
            BinaryPlistError::TooDeep(limit) => {
                write!(fmt, "Objects are nested more than {limit} levels deep")
            }
        }
    }
}

impl std::error::Error for BinaryPlistError {}
