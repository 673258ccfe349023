#![forbid(unsafe_code)]
#![doc = include_str!("../README.md")]

pub mod binary;
pub mod codec;
pub mod error;
pub mod util;
pub mod value;
pub mod xml;

pub use codec::{
    is_binary_plist, read_plist, read_plist_from_bytes, read_plist_from_reader, write_plist,
    write_plist_to_bytes, write_plist_to_writer, Format,
};
pub use error::{binary::BinaryPlistError, plist::PlistError};
pub use value::{Dictionary, Uid, Value};
