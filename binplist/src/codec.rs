/*!
 The top-level API: read and write property lists from paths, streams, or buffers.

 Binary property lists are handled by [`crate::binary`]; anything that does not start with the
 `bplist00` header is handed to the XML reader in [`crate::xml`].
*/

use std::{
    fs::File,
    io::{BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use tracing::debug;

use crate::{
    binary::{self, models::MAGIC},
    error::plist::PlistError,
    value::Value,
    xml,
};

/// The encoding used when writing a property list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// `bplist00` binary encoding
    #[default]
    Binary,
    /// Apple's XML property list encoding
    Xml,
}

impl Format {
    /// Given user's input, return a variant if the input matches one
    pub fn from_cli(format: &str) -> Option<Self> {
        match format.to_lowercase().as_str() {
            "binary" | "bplist" => Some(Self::Binary),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }
}

/// Read a property list file, binary or XML
pub fn read_plist<P: AsRef<Path>>(path: P) -> Result<Value, PlistError> {
    read_plist_from_reader(File::open(path)?)
}

/// Read a property list from the start of a stream, binary or XML
pub fn read_plist_from_reader<R: Read + Seek>(mut reader: R) -> Result<Value, PlistError> {
    reader.seek(SeekFrom::Start(0))?;
    let mut bytes = vec![];
    reader.read_to_end(&mut bytes)?;
    read_plist_from_bytes(&bytes)
}

/// Read a property list from a buffer, binary or XML
///
/// Any failure other than a missing `bplist00` header is surfaced as is; a missing header
/// retries the buffer as XML.
pub fn read_plist_from_bytes(bytes: &[u8]) -> Result<Value, PlistError> {
    match binary::read(bytes) {
        Err(PlistError::NotBinaryPlist) => {
            debug!("Data is not a binary plist, falling back to XML");
            xml::read_xml(bytes)
        }
        result => result,
    }
}

/// Write a property list file in the given format
pub fn write_plist<P: AsRef<Path>>(
    value: &Value,
    path: P,
    format: Format,
) -> Result<(), PlistError> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_plist_to_writer(value, &mut writer, format)?;
    writer.flush()?;
    Ok(())
}

/// Write a property list to a stream in the given format
pub fn write_plist_to_writer<W: Write>(
    value: &Value,
    mut writer: W,
    format: Format,
) -> Result<(), PlistError> {
    match format {
        Format::Binary => Ok(writer.write_all(&binary::write(value)?)?),
        Format::Xml => xml::write_xml(value, writer),
    }
}

/// Write a property list to a new buffer in the given format
pub fn write_plist_to_bytes(value: &Value, format: Format) -> Result<Vec<u8>, PlistError> {
    match format {
        Format::Binary => binary::write(value),
        Format::Xml => {
            let mut bytes = vec![];
            xml::write_xml(value, &mut bytes)?;
            Ok(bytes)
        }
    }
}

/// Determine if a stream holds a binary property list
///
/// The stream is read from its start and left at its start.
pub fn is_binary_plist<R: Read + Seek>(stream: &mut R) -> Result<bool, PlistError> {
    stream.seek(SeekFrom::Start(0))?;
    let mut header = Vec::with_capacity(MAGIC.len());
    stream.by_ref().take(MAGIC.len() as u64).read_to_end(&mut header)?;
    stream.seek(SeekFrom::Start(0))?;
    Ok(header == MAGIC)
}
