/*!
 Data structures and constants that describe the layout of a `bplist00` document.

 A document is made of four segments, all multi-byte integers big-endian:

 1. The 8 byte header, `bplist00`
 2. The object stream, one marker-prefixed encoding per unique object
 3. The offset table, mapping object reference numbers to the position of their encoding
 4. The 32 byte [`Trailer`]
*/

use crate::error::binary::BinaryPlistError;

/// The header every binary property list starts with
pub const MAGIC: &[u8; 8] = b"bplist00";

/// The size of the fixed footer
pub const TRAILER_SIZE: usize = 32;

/// Reserved bytes at the start of the trailer
const TRAILER_UNUSED_SIZE: usize = 6;

/// Marker for `null`
pub const NULL: u8 = 0b0000_0000;
/// Marker for `false`
pub const FALSE: u8 = 0b0000_1000;
/// Marker for `true`
pub const TRUE: u8 = 0b0000_1001;
/// Marker for a fill byte
pub const FILL: u8 = 0b0000_1111;
/// Marker for an 8 byte date
pub const DATE: u8 = 0b0011_0011;

/// The deepest chain of nested objects that is read or written, counting the root and the innermost object
pub const MAX_DEPTH: usize = 256;

/// When the low nibble of a marker holds this value, the length follows as an integer object
pub const LENGTH_FOLLOWS: u8 = 0b1111;
/// The largest length that fits in the low nibble of a marker
pub const MAX_INLINE_LENGTH: u64 = 0b1110;

/// The kind of object described by the high nibble of a marker byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `null`, booleans, and fill bytes; the low nibble selects which
    Singleton,
    /// Integer of `2^n` bytes
    Integer,
    /// Real of `2^n` bytes
    Real,
    /// Date, only valid with a low nibble of `0b0011`
    Date,
    /// Raw bytes
    Data,
    /// One byte per character
    AsciiString,
    /// Two bytes per UTF-16 code unit
    Utf16String,
    /// Integer of `n + 1` bytes
    Uid,
    Array,
    Set,
    Dictionary,
}

impl Format {
    /// Get the format stored in the high nibble of a marker byte
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker >> 4 {
            0b0000 => Some(Self::Singleton),
            0b0001 => Some(Self::Integer),
            0b0010 => Some(Self::Real),
            0b0011 => Some(Self::Date),
            0b0100 => Some(Self::Data),
            0b0101 => Some(Self::AsciiString),
            0b0110 => Some(Self::Utf16String),
            0b1000 => Some(Self::Uid),
            0b1010 => Some(Self::Array),
            0b1100 => Some(Self::Set),
            0b1101 => Some(Self::Dictionary),
            _ => None,
        }
    }

    /// The high nibble written for this format
    pub fn nibble(self) -> u8 {
        match self {
            Self::Singleton => 0b0000,
            Self::Integer => 0b0001,
            Self::Real => 0b0010,
            Self::Date => 0b0011,
            Self::Data => 0b0100,
            Self::AsciiString => 0b0101,
            Self::Utf16String => 0b0110,
            Self::Uid => 0b1000,
            Self::Array => 0b1010,
            Self::Set => 0b1100,
            Self::Dictionary => 0b1101,
        }
    }

    /// Build a marker byte from this format and the value of the low nibble
    pub fn marker(self, extra: u8) -> u8 {
        (self.nibble() << 4) | (extra & 0x0f)
    }
}

/// The fixed footer describing how to locate and read every object in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Trailer {
    /// Bytes per offset table entry
    pub offset_size: u8,
    /// Bytes per object reference inside a container
    pub object_ref_size: u8,
    /// Number of unique objects in the document
    pub offset_count: u64,
    /// Reference number of the root object
    pub top_level_object_number: u64,
    /// Position of the first byte of the offset table
    pub offset_table_offset: u64,
}

impl Trailer {
    /// Parse the last [`TRAILER_SIZE`] bytes of a document
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, BinaryPlistError> {
        if bytes.len() != TRAILER_SIZE {
            return Err(BinaryPlistError::TooShort(bytes.len()));
        }
        let (widths, rest) = bytes[TRAILER_UNUSED_SIZE..].split_at(2);
        let trailer = Self {
            offset_size: widths[0],
            object_ref_size: widths[1],
            offset_count: read_u64(&rest[0..8]),
            top_level_object_number: read_u64(&rest[8..16]),
            offset_table_offset: read_u64(&rest[16..24]),
        };
        trailer.validate()?;
        Ok(trailer)
    }

    /// Serialize the trailer, including its reserved bytes
    pub fn to_bytes(&self) -> [u8; TRAILER_SIZE] {
        let mut bytes = [0; TRAILER_SIZE];
        bytes[6] = self.offset_size;
        bytes[7] = self.object_ref_size;
        bytes[8..16].copy_from_slice(&self.offset_count.to_be_bytes());
        bytes[16..24].copy_from_slice(&self.top_level_object_number.to_be_bytes());
        bytes[24..32].copy_from_slice(&self.offset_table_offset.to_be_bytes());
        bytes
    }

    fn validate(&self) -> Result<(), BinaryPlistError> {
        if !matches!(self.offset_size, 1 | 2 | 4 | 8) {
            return Err(BinaryPlistError::InvalidTrailer(format!(
                "offset size of {} bytes",
                self.offset_size
            )));
        }
        if !matches!(self.object_ref_size, 1 | 2 | 4 | 8) {
            return Err(BinaryPlistError::InvalidTrailer(format!(
                "object reference size of {} bytes",
                self.object_ref_size
            )));
        }
        if self.top_level_object_number >= self.offset_count {
            return Err(BinaryPlistError::InvalidTrailer(format!(
                "root object {} of {} objects",
                self.top_level_object_number, self.offset_count
            )));
        }
        Ok(())
    }
}

/// Per-kind byte totals computed while discovering the unique objects of a value
///
/// Each unique object is counted once, no matter how many containers reference it.
/// Counts include markers, length prefixes, and payloads, but not object references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteCounts {
    pub null_bytes: u64,
    pub bool_bytes: u64,
    pub int_bytes: u64,
    pub real_bytes: u64,
    pub date_bytes: u64,
    pub data_bytes: u64,
    pub string_bytes: u64,
    pub uid_bytes: u64,
    pub array_bytes: u64,
    pub set_bytes: u64,
    pub dict_bytes: u64,
}

impl ByteCounts {
    pub fn total(&self) -> u64 {
        self.null_bytes
            + self.bool_bytes
            + self.int_bytes
            + self.real_bytes
            + self.date_bytes
            + self.data_bytes
            + self.string_bytes
            + self.uid_bytes
            + self.array_bytes
            + self.set_bytes
            + self.dict_bytes
    }
}

/// Read a big-endian unsigned integer from at most 8 bytes
pub(crate) fn read_u64(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(0, |acc, byte| (acc << 8) | u64::from(*byte))
}

/// Number of bytes needed to store `value`: 1, 2, 4, or 8
///
/// Negative values always take 8 bytes. Non-negative values above [`i64::MAX`] are rejected
/// because Core Foundation reads 8 byte integers as signed.
pub fn int_size(value: i128) -> Result<usize, BinaryPlistError> {
    match value {
        i128::MIN..=-1 => Ok(8),
        0..=0xFF => Ok(1),
        0x100..=0xFFFF => Ok(2),
        0x1_0000..=0xFFFF_FFFF => Ok(4),
        0x1_0000_0000..=0x7FFF_FFFF_FFFF_FFFF => Ok(8),
        _ => Err(BinaryPlistError::IntegerTooLarge(value as u64)),
    }
}
