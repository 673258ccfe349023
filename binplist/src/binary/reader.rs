/*!
 Contains logic to decode a `bplist00` document into a [`Value`].

 Layout referenced from the Core Foundation sources:
   - [`ForFoundationOnly.h`](https://github.com/opensource-apple/CF/blob/master/ForFoundationOnly.h)
   - [`CFBinaryPList.c`](https://opensource.apple.com/source/CF/CF-855.17/CFBinaryPList.c)
*/

use tracing::{debug, trace};

use crate::{
    binary::models::{
        read_u64, Format, Trailer, DATE, FALSE, FILL, LENGTH_FOLLOWS, MAGIC, MAX_DEPTH, NULL,
        TRAILER_SIZE, TRUE,
    },
    error::{binary::BinaryPlistError, plist::PlistError},
    util::dates::from_apple_seconds,
    value::{Dictionary, Uid, Value},
};

/// Contains logic and data used to decode a binary property list
#[derive(Debug)]
pub struct PlistReader<'a> {
    /// The document we want to decode
    stream: &'a [u8],
    /// The current index we are at in the stream
    idx: usize,
    /// The footer, available once [`PlistReader::parse`] has read it
    trailer: Option<Trailer>,
    /// Maps object reference numbers to the position of their encoding
    offsets: Vec<usize>,
    /// Bytes per object reference, copied from the trailer
    object_ref_size: usize,
    /// Marks the objects that are currently being decoded
    ///
    /// An object that is reached again while it is still being decoded contains itself.
    in_progress: Vec<bool>,
    /// Number of objects currently being decoded, from the root down
    depth: usize,
}

impl<'a> PlistReader<'a> {
    pub fn new(stream: &'a [u8]) -> Self {
        Self {
            stream,
            idx: 0,
            trailer: None,
            offsets: vec![],
            object_ref_size: 0,
            in_progress: vec![],
            depth: 0,
        }
    }

    /// The trailer of the document, if it was parsed
    pub fn trailer(&self) -> Option<&Trailer> {
        self.trailer.as_ref()
    }

    /// The offset table of the document, empty until it is parsed
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Decode the root object of the document
    ///
    /// Fails with [`PlistError::NotBinaryPlist`] if the data does not start with `bplist00`,
    /// otherwise with [`PlistError::InvalidPlist`] if any part of the document is malformed.
    pub fn parse(&mut self) -> Result<Value, PlistError> {
        if !self.stream.starts_with(MAGIC) {
            return Err(PlistError::NotBinaryPlist);
        }
        if self.stream.len() < TRAILER_SIZE {
            return Err(BinaryPlistError::TooShort(self.stream.len()).into());
        }

        let trailer = Trailer::from_bytes(&self.stream[self.stream.len() - TRAILER_SIZE..])?;
        debug!(
            offset_size = trailer.offset_size,
            object_ref_size = trailer.object_ref_size,
            offset_count = trailer.offset_count,
            offset_table_offset = trailer.offset_table_offset,
            "Parsed bplist trailer"
        );
        self.read_offset_table(&trailer)?;
        self.object_ref_size = trailer.object_ref_size as usize;
        self.trailer = Some(trailer);

        Ok(self.read_object_number(trailer.top_level_object_number)?)
    }

    /// Build the offset table described by the trailer
    fn read_offset_table(&mut self, trailer: &Trailer) -> Result<(), BinaryPlistError> {
        let entry_size = trailer.offset_size as usize;
        let table_len = usize::try_from(trailer.offset_count)
            .ok()
            .and_then(|count| count.checked_mul(entry_size))
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;

        self.idx = usize::try_from(trailer.offset_table_offset)
            .map_err(|_| BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        let table = self.read_exact_bytes(table_len as u64)?;

        self.offsets = table
            .chunks_exact(entry_size)
            .map(|entry| read_u64(entry) as usize)
            .collect();
        self.in_progress = vec![false; self.offsets.len()];
        Ok(())
    }

    /// Decode the object with the given reference number
    fn read_object_number(&mut self, number: u64) -> Result<Value, BinaryPlistError> {
        let index = usize::try_from(number)
            .ok()
            .filter(|index| *index < self.offsets.len())
            .ok_or(BinaryPlistError::InvalidReference(
                number,
                self.offsets.len() as u64,
            ))?;
        if self.in_progress[index] {
            return Err(BinaryPlistError::CyclicReference(number));
        }
        if self.depth >= MAX_DEPTH {
            return Err(BinaryPlistError::TooDeep(MAX_DEPTH));
        }

        self.in_progress[index] = true;
        self.depth += 1;
        self.idx = self.offsets[index];
        let result = self.read_object();
        self.depth -= 1;
        self.in_progress[index] = false;
        result
    }

    /// Decode the object that starts at the current index
    fn read_object(&mut self) -> Result<Value, BinaryPlistError> {
        let offset = self.idx;
        let marker = self.get_current_byte()?;
        self.idx += 1;
        let extra = marker & 0x0f;
        trace!(offset, marker, "Reading object");

        match Format::from_marker(marker) {
            Some(Format::Singleton) => match marker {
                NULL | FILL => Ok(Value::Null),
                FALSE => Ok(Value::Boolean(false)),
                TRUE => Ok(Value::Boolean(true)),
                _ => Err(BinaryPlistError::InvalidMarker(marker, offset)),
            },
            Some(Format::Integer) => {
                let size = size_from_exponent(u64::from(extra))?;
                Ok(Value::Integer(self.read_sized_integer(size)?))
            }
            Some(Format::Real) => self.read_real(u64::from(extra)),
            Some(Format::Date) if marker == DATE => {
                let seconds = f64::from_bits(read_u64(self.read_exact_bytes(8)?));
                Ok(Value::Date(from_apple_seconds(seconds)?))
            }
            Some(Format::Data) => {
                let length = self.read_length(extra)?;
                Ok(Value::Data(self.read_exact_bytes(length)?.to_vec()))
            }
            Some(Format::AsciiString) => {
                let length = self.read_length(extra)?;
                self.read_ascii(length, offset)
            }
            Some(Format::Utf16String) => {
                let length = self.read_length(extra)?;
                self.read_utf16(length, offset)
            }
            Some(Format::Uid) => {
                let bytes = self.read_exact_bytes(u64::from(extra) + 1)?;
                match bytes.len() {
                    1 | 2 | 4 | 8 => Ok(Value::Uid(Uid(read_u64(bytes)))),
                    other => Err(BinaryPlistError::InvalidIntegerSize(other)),
                }
            }
            Some(Format::Array) => {
                let length = self.read_length(extra)?;
                Ok(Value::Array(self.read_array(length)?))
            }
            Some(Format::Set) => {
                let length = self.read_length(extra)?;
                Ok(Value::Set(self.read_array(length)?))
            }
            Some(Format::Dictionary) => {
                let length = self.read_length(extra)?;
                self.read_dictionary(length, offset)
            }
            Some(Format::Date) | None => Err(BinaryPlistError::InvalidMarker(marker, offset)),
        }
    }

    /// Resolve the low nibble of a marker into a length
    ///
    /// Lengths above 14 are stored as an integer object that follows the marker.
    fn read_length(&mut self, extra: u8) -> Result<u64, BinaryPlistError> {
        if extra != LENGTH_FOLLOWS {
            return Ok(u64::from(extra));
        }

        let offset = self.idx;
        let marker = self.get_current_byte()?;
        if Format::from_marker(marker) != Some(Format::Integer) {
            return Err(BinaryPlistError::InvalidLength(offset));
        }
        self.idx += 1;

        let length = self.read_sized_integer(size_from_exponent(u64::from(marker & 0x0f))?)?;
        u64::try_from(length).map_err(|_| BinaryPlistError::InvalidLength(offset))
    }

    /// Read an integer of `size` bytes; 1, 2, and 4 byte integers are unsigned, 8 byte integers are signed
    fn read_sized_integer(&mut self, size: usize) -> Result<i64, BinaryPlistError> {
        match size {
            1 | 2 | 4 | 8 => Ok(read_u64(self.read_exact_bytes(size as u64)?) as i64),
            other => Err(BinaryPlistError::InvalidIntegerSize(other)),
        }
    }

    /// Read a real of `2^exponent` bytes
    fn read_real(&mut self, exponent: u64) -> Result<Value, BinaryPlistError> {
        match exponent {
            2 => {
                let bits = read_u64(self.read_exact_bytes(4)?) as u32;
                Ok(Value::Real(f64::from(f32::from_bits(bits))))
            }
            3 => Ok(Value::Real(f64::from_bits(read_u64(
                self.read_exact_bytes(8)?,
            )))),
            other => Err(BinaryPlistError::InvalidRealSize(
                1usize.checked_shl(other as u32).unwrap_or(usize::MAX),
            )),
        }
    }

    /// Read `length` bytes as an ASCII string
    fn read_ascii(&mut self, length: u64, offset: usize) -> Result<Value, BinaryPlistError> {
        let bytes = self.read_exact_bytes(length)?;
        if !bytes.is_ascii() {
            return Err(BinaryPlistError::InvalidAscii(offset));
        }
        Ok(Value::String(bytes.iter().map(|byte| *byte as char).collect()))
    }

    /// Read `length` UTF-16 code units as a string
    fn read_utf16(&mut self, length: u64, offset: usize) -> Result<Value, BinaryPlistError> {
        let byte_length = length
            .checked_mul(2)
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;
        let units: Vec<u16> = self
            .read_exact_bytes(byte_length)?
            .chunks_exact(2)
            .map(|unit| u16::from_be_bytes([unit[0], unit[1]]))
            .collect();

        String::from_utf16(&units)
            .map(Value::String)
            .map_err(|_| BinaryPlistError::InvalidUtf16(offset))
    }

    /// Read `count` object references
    fn read_refs(&mut self, count: u64) -> Result<Vec<u64>, BinaryPlistError> {
        let byte_length = count
            .checked_mul(self.object_ref_size as u64)
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, self.stream.len()))?;

        Ok(self
            .read_exact_bytes(byte_length)?
            .chunks_exact(self.object_ref_size)
            .map(read_u64)
            .collect())
    }

    /// Read `count` references and decode each object they point to
    fn read_array(&mut self, count: u64) -> Result<Vec<Value>, BinaryPlistError> {
        let refs = self.read_refs(count)?;
        let mut items = Vec::with_capacity(refs.len());
        for reference in refs {
            items.push(self.read_object_number(reference)?);
        }
        Ok(items)
    }

    /// Read `count` key references, then `count` value references, and pair them by position
    fn read_dictionary(&mut self, count: u64, offset: usize) -> Result<Value, BinaryPlistError> {
        let keys = self.read_refs(count)?;
        let values = self.read_refs(count)?;

        let mut dict = Dictionary::with_capacity(keys.len());
        for (key, value) in keys.into_iter().zip(values) {
            let key = match self.read_object_number(key)? {
                Value::String(key) => key,
                _ => return Err(BinaryPlistError::InvalidKey(offset)),
            };
            dict.insert(key, self.read_object_number(value)?);
        }
        Ok(Value::Dictionary(dict))
    }

    /// Read exactly `n` bytes from the stream
    fn read_exact_bytes(&mut self, n: u64) -> Result<&'a [u8], BinaryPlistError> {
        let stream: &'a [u8] = self.stream;
        let end = usize::try_from(n)
            .ok()
            .and_then(|n| self.idx.checked_add(n))
            .ok_or(BinaryPlistError::OutOfBounds(usize::MAX, stream.len()))?;
        let range = stream
            .get(self.idx..end)
            .ok_or(BinaryPlistError::OutOfBounds(end, stream.len()))?;
        self.idx = end;
        Ok(range)
    }

    /// Read the current byte
    fn get_current_byte(&self) -> Result<u8, BinaryPlistError> {
        self.stream
            .get(self.idx)
            .copied()
            .ok_or(BinaryPlistError::OutOfBounds(self.idx, self.stream.len()))
    }
}

/// Convert the exponent stored in an integer marker into a byte count
fn size_from_exponent(exponent: u64) -> Result<usize, BinaryPlistError> {
    match exponent {
        0..=3 => Ok(1 << exponent),
        other => Err(BinaryPlistError::InvalidIntegerSize(
            1usize.checked_shl(other as u32).unwrap_or(usize::MAX),
        )),
    }
}
