/*!
 Contains logic and data structures used to decode and encode `bplist00` binary property lists.

 ## Overview

 A binary property list stores each unique object once, as a marker byte followed by its payload.
 Containers hold object reference numbers instead of their children, and an offset table at the
 end of the document maps each reference number to the position of its object.

 ## Features

 - Pure Rust implementation, no dependencies on Apple frameworks
 - Equal values are encoded once, no matter how many containers hold them
 - Malformed documents are rejected with a [`BinaryPlistError`](crate::error::binary::BinaryPlistError), never a panic
*/

use crate::{
    binary::{reader::PlistReader, writer::PlistWriter},
    error::plist::PlistError,
    value::Value,
};

pub mod models;
pub mod reader;
pub mod writer;
mod tests;

/// Decode a complete binary property list
pub fn read(buffer: &[u8]) -> Result<Value, PlistError> {
    PlistReader::new(buffer).parse()
}

/// Encode `root` as a binary property list
pub fn write(root: &Value) -> Result<Vec<u8>, PlistError> {
    Ok(PlistWriter::new(root)?.write()?)
}
