/*!
 Contains logic to encode a [`Value`] as a `bplist00` document.

 Encoding happens in two passes:

 1. [`PlistWriter::new`] walks the value and interns every unique object, so equal values
    anywhere in the tree are encoded once. The number of unique objects fixes the width of
    object references.
 2. [`PlistWriter::write`] emits the objects: each container writes its marker, then the
    reference numbers of its children, then the bodies of the children that were not
    referenced before. The offset table and trailer are appended last.
*/

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::{
    binary::models::{
        int_size, ByteCounts, Format, Trailer, DATE, FALSE, LENGTH_FOLLOWS, MAGIC, MAX_DEPTH,
        MAX_INLINE_LENGTH, NULL, TRUE,
    },
    error::binary::BinaryPlistError,
    util::dates::to_apple_seconds,
    value::Value,
};

/// Index of a unique object in [`PlistWriter::objects`]
type ObjectId = usize;

/// A unique object, with the children of containers replaced by their [`ObjectId`]
#[derive(Debug)]
enum Object<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    /// Seconds since the Apple reference epoch
    Date(f64),
    Data(&'a [u8]),
    String(&'a str),
    Uid(u64),
    Array(Vec<ObjectId>),
    Set(Vec<ObjectId>),
    /// Keys and values, paired by position
    Dictionary(Vec<ObjectId>, Vec<ObjectId>),
}

/// The content of an [`Object`], used to find objects that were already interned
///
/// Set members and dictionary entries are sorted so that order does not affect identity.
#[derive(Debug, PartialEq, Eq, Hash)]
enum ObjectKey<'a> {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(u64),
    Date(&'a DateTime<Utc>),
    Data(&'a [u8]),
    String(&'a str),
    Uid(u64),
    Array(Vec<ObjectId>),
    Set(Vec<ObjectId>),
    Dictionary(Vec<(ObjectId, ObjectId)>),
}

/// Contains the unique objects of a value, ready to be encoded
#[derive(Debug)]
pub struct PlistWriter<'a> {
    /// Every unique object, in the order the first pass finished them
    objects: Vec<Object<'a>>,
    /// Maps the content of each object to its place in `objects`
    uniques: HashMap<ObjectKey<'a>, ObjectId>,
    /// Byte totals of the unique objects
    byte_counts: ByteCounts,
    root: ObjectId,
}

impl<'a> PlistWriter<'a> {
    /// Discover every unique object of `root`
    ///
    /// Fails if an integer or [`Uid`](crate::value::Uid) needs more than 8 bytes, or if objects
    /// are nested more than [`MAX_DEPTH`] levels deep.
    pub fn new(root: &'a Value) -> Result<Self, BinaryPlistError> {
        let mut writer = Self {
            objects: vec![],
            uniques: HashMap::new(),
            byte_counts: ByteCounts::default(),
            root: 0,
        };
        writer.root = writer.compute_offsets(root, 0)?;
        debug!(
            unique_objects = writer.objects.len(),
            bytes = writer.byte_counts.total(),
            "Computed bplist objects"
        );
        Ok(writer)
    }

    /// Byte totals of each kind of unique object
    pub fn byte_counts(&self) -> &ByteCounts {
        &self.byte_counts
    }

    /// Number of objects that will be written
    pub fn unique_objects(&self) -> usize {
        self.objects.len()
    }

    /// Intern `value` and its children, returning the id of `value`
    fn compute_offsets(
        &mut self,
        value: &'a Value,
        depth: usize,
    ) -> Result<ObjectId, BinaryPlistError> {
        check_depth(depth)?;
        match value {
            Value::Null => self.intern(ObjectKey::Null, Object::Null),
            Value::Boolean(value) => {
                self.intern(ObjectKey::Boolean(*value), Object::Boolean(*value))
            }
            Value::Integer(value) => {
                self.intern(ObjectKey::Integer(*value), Object::Integer(*value))
            }
            Value::Real(value) => {
                self.intern(ObjectKey::Real(value.to_bits()), Object::Real(*value))
            }
            Value::Date(date) => self.intern(
                ObjectKey::Date(date),
                Object::Date(to_apple_seconds(date)),
            ),
            Value::Data(bytes) => self.intern(ObjectKey::Data(bytes), Object::Data(bytes)),
            Value::String(string) => {
                self.intern(ObjectKey::String(string), Object::String(string))
            }
            Value::Uid(uid) => self.intern(ObjectKey::Uid(uid.get()), Object::Uid(uid.get())),
            Value::Array(items) => {
                let children = self.compute_children(items, depth + 1)?;
                self.intern(ObjectKey::Array(children.clone()), Object::Array(children))
            }
            Value::Set(items) => {
                let children = self.compute_children(items, depth + 1)?;
                let mut members = children.clone();
                members.sort_unstable();
                self.intern(ObjectKey::Set(members), Object::Set(children))
            }
            Value::Dictionary(dict) => {
                let mut keys = Vec::with_capacity(dict.len());
                let mut values = Vec::with_capacity(dict.len());
                for (key, value) in dict {
                    keys.push(self.intern(ObjectKey::String(key), Object::String(key))?);
                    values.push(self.compute_offsets(value, depth + 1)?);
                }
                let mut entries: Vec<(ObjectId, ObjectId)> =
                    keys.iter().copied().zip(values.iter().copied()).collect();
                entries.sort_unstable();
                self.intern(
                    ObjectKey::Dictionary(entries),
                    Object::Dictionary(keys, values),
                )
            }
        }
    }

    fn compute_children(
        &mut self,
        items: &'a [Value],
        depth: usize,
    ) -> Result<Vec<ObjectId>, BinaryPlistError> {
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            children.push(self.compute_offsets(item, depth)?);
        }
        Ok(children)
    }

    /// Get the id of an already-seen object, or record a new one and count its bytes
    fn intern(
        &mut self,
        key: ObjectKey<'a>,
        object: Object<'a>,
    ) -> Result<ObjectId, BinaryPlistError> {
        if let Some(id) = self.uniques.get(&key) {
            return Ok(*id);
        }
        self.count_bytes(&object)?;

        let id = self.objects.len();
        self.objects.push(object);
        self.uniques.insert(key, id);
        Ok(id)
    }

    /// Add the encoded size of `object` to the byte totals
    fn count_bytes(&mut self, object: &Object) -> Result<(), BinaryPlistError> {
        let counts = &mut self.byte_counts;
        match object {
            Object::Null => counts.null_bytes += 1,
            Object::Boolean(_) => counts.bool_bytes += 1,
            Object::Integer(value) => counts.int_bytes += 1 + int_size((*value).into())? as u64,
            Object::Real(_) => counts.real_bytes += 9,
            Object::Date(_) => counts.date_bytes += 9,
            Object::Data(bytes) => {
                counts.data_bytes += 1 + length_size(bytes.len())? + bytes.len() as u64
            }
            Object::String(string) => {
                counts.string_bytes += if string.is_ascii() {
                    1 + length_size(string.len())? + string.len() as u64
                } else {
                    let units = string.encode_utf16().count();
                    1 + length_size(units)? + 2 * units as u64
                }
            }
            Object::Uid(value) => counts.uid_bytes += 1 + int_size((*value).into())? as u64,
            Object::Array(children) => counts.array_bytes += 1 + length_size(children.len())?,
            Object::Set(children) => counts.set_bytes += 1 + length_size(children.len())?,
            Object::Dictionary(keys, _) => counts.dict_bytes += 1 + length_size(keys.len())?,
        };
        Ok(())
    }

    /// Encode the root object and all of its children
    pub fn write(&self) -> Result<Vec<u8>, BinaryPlistError> {
        let object_ref_size = int_size(self.objects.len() as i128)?;
        let mut output = Output::new(self.objects.len(), object_ref_size);

        output.bytes.extend_from_slice(MAGIC);
        output.write_object_reference(self.root);
        self.write_object(&mut output, self.root)?;

        // Nothing can start past the current end, so this bounds every offset
        let offset_table_offset = output.bytes.len();
        let offset_size = int_size(offset_table_offset as i128)?;
        let trailer = Trailer {
            offset_size: offset_size as u8,
            object_ref_size: object_ref_size as u8,
            offset_count: self.objects.len() as u64,
            top_level_object_number: 0,
            offset_table_offset: offset_table_offset as u64,
        };
        debug!(
            offset_size,
            object_ref_size, offset_table_offset, "Writing bplist offset table"
        );

        output.write_offset_table(offset_size)?;
        output.bytes.extend_from_slice(&trailer.to_bytes());
        Ok(output.bytes)
    }

    /// Emit the object and any children it references for the first time
    fn write_object(&self, output: &mut Output, id: ObjectId) -> Result<(), BinaryPlistError> {
        output.positions[id] = Some(output.bytes.len());

        match &self.objects[id] {
            Object::Null => output.bytes.push(NULL),
            Object::Boolean(value) => output.bytes.push(if *value { TRUE } else { FALSE }),
            Object::Integer(value) => output.write_integer(*value)?,
            Object::Real(value) => {
                output.bytes.push(Format::Real.marker(3));
                output.bytes.extend_from_slice(&value.to_be_bytes());
            }
            Object::Date(seconds) => {
                output.bytes.push(DATE);
                output.bytes.extend_from_slice(&seconds.to_be_bytes());
            }
            Object::Data(bytes) => {
                output.write_length(Format::Data, bytes.len())?;
                output.bytes.extend_from_slice(bytes);
            }
            Object::String(string) if string.is_ascii() => {
                output.write_length(Format::AsciiString, string.len())?;
                output.bytes.extend_from_slice(string.as_bytes());
            }
            Object::String(string) => {
                let units: Vec<u16> = string.encode_utf16().collect();
                output.write_length(Format::Utf16String, units.len())?;
                units
                    .iter()
                    .for_each(|unit| output.bytes.extend_from_slice(&unit.to_be_bytes()));
            }
            Object::Uid(value) => {
                let size = int_size((*value).into())?;
                output.bytes.push(Format::Uid.marker(size as u8 - 1));
                output.write_sized(*value, size);
            }
            Object::Array(children) => {
                output.write_length(Format::Array, children.len())?;
                let new_children = output.write_references(children);
                self.write_objects(output, &new_children)?;
            }
            Object::Set(children) => {
                output.write_length(Format::Set, children.len())?;
                let new_children = output.write_references(children);
                self.write_objects(output, &new_children)?;
            }
            Object::Dictionary(keys, values) => {
                output.write_length(Format::Dictionary, keys.len())?;
                let mut new_children = output.write_references(keys);
                new_children.extend(output.write_references(values));
                self.write_objects(output, &new_children)?;
            }
        }
        Ok(())
    }

    fn write_objects(&self, output: &mut Output, ids: &[ObjectId]) -> Result<(), BinaryPlistError> {
        for id in ids {
            self.write_object(output, *id)?;
        }
        Ok(())
    }
}

/// The bytes and reference bookkeeping of a single [`PlistWriter::write`] call
#[derive(Debug)]
struct Output {
    bytes: Vec<u8>,
    /// Reference number given to each object, indexed by [`ObjectId`]
    references: Vec<Option<u64>>,
    /// Objects in the order they were given reference numbers
    written: Vec<ObjectId>,
    /// Position of the encoding of each object, indexed by [`ObjectId`]
    positions: Vec<Option<usize>>,
    object_ref_size: usize,
}

impl Output {
    fn new(object_count: usize, object_ref_size: usize) -> Self {
        Self {
            bytes: vec![],
            references: vec![None; object_count],
            written: Vec::with_capacity(object_count),
            positions: vec![None; object_count],
            object_ref_size,
        }
    }

    /// Write the reference number of an object, giving it the next number if it has none
    ///
    /// Returns `true` if the object was referenced for the first time.
    fn write_object_reference(&mut self, id: ObjectId) -> bool {
        match self.references[id] {
            Some(reference) => {
                self.write_sized(reference, self.object_ref_size);
                false
            }
            None => {
                let reference = self.written.len() as u64;
                self.references[id] = Some(reference);
                self.written.push(id);
                self.write_sized(reference, self.object_ref_size);
                true
            }
        }
    }

    /// Write the references of some objects, returning the ones that were referenced for the first time
    fn write_references(&mut self, ids: &[ObjectId]) -> Vec<ObjectId> {
        ids.iter()
            .copied()
            .filter(|id| self.write_object_reference(*id))
            .collect()
    }

    /// Write a marker with `length` in its low nibble, or followed by an integer object if it does not fit
    fn write_length(&mut self, format: Format, length: usize) -> Result<(), BinaryPlistError> {
        if length as u64 > MAX_INLINE_LENGTH {
            self.bytes.push(format.marker(LENGTH_FOLLOWS));
            let length = i64::try_from(length)
                .map_err(|_| BinaryPlistError::IntegerTooLarge(length as u64))?;
            self.write_integer(length)
        } else {
            self.bytes.push(format.marker(length as u8));
            Ok(())
        }
    }

    /// Write an integer object using the narrowest width that holds it
    fn write_integer(&mut self, value: i64) -> Result<(), BinaryPlistError> {
        let size = int_size(value.into())?;
        self.bytes
            .push(Format::Integer.marker(size.trailing_zeros() as u8));
        self.write_sized(value as u64, size);
        Ok(())
    }

    /// Write the low `size` bytes of `value`, big-endian
    fn write_sized(&mut self, value: u64, size: usize) {
        self.bytes.extend_from_slice(&value.to_be_bytes()[8 - size..]);
    }

    /// Write the position of every object in reference number order
    fn write_offset_table(&mut self, offset_size: usize) -> Result<(), BinaryPlistError> {
        for (reference, id) in self.written.clone().into_iter().enumerate() {
            let position = self.positions[id].ok_or(BinaryPlistError::MissingObject(reference))?;
            self.write_sized(position as u64, offset_size);
        }
        Ok(())
    }
}

/// Reject an object that would sit below [`MAX_DEPTH`] levels of nesting; the root is at depth 0
fn check_depth(depth: usize) -> Result<(), BinaryPlistError> {
    if depth >= MAX_DEPTH {
        return Err(BinaryPlistError::TooDeep(MAX_DEPTH));
    }
    Ok(())
}

/// Number of bytes a length prefix adds after the marker
fn length_size(length: usize) -> Result<u64, BinaryPlistError> {
    if length as u64 > MAX_INLINE_LENGTH {
        Ok(1 + int_size(length as i128)? as u64)
    } else {
        Ok(0)
    }
}
