#[cfg(test)]
mod reader_tests {
    use std::env::current_dir;
    use std::fs::File;
    use std::io::Read;

    use chrono::{TimeZone, Utc};

    use crate::{
        binary::{
            models::{Trailer, MAX_DEPTH},
            reader::PlistReader,
        },
        error::{binary::BinaryPlistError, plist::PlistError},
        value::{Uid, Value},
    };

    fn read_fixture(name: &str) -> Vec<u8> {
        let plist_path = current_dir()
            .unwrap()
            .as_path()
            .join("test_data/binary")
            .join(name);
        let mut file = File::open(plist_path).unwrap();
        let mut bytes = vec![];
        file.read_to_end(&mut bytes).unwrap();
        bytes
    }

    /// Build a document from some encoded objects; object 0 is the root and references are 1 byte wide
    fn build(objects: &[&[u8]]) -> Vec<u8> {
        let mut bytes = b"bplist00".to_vec();
        let mut offsets = vec![];
        for object in objects {
            offsets.push(bytes.len() as u8);
            bytes.extend_from_slice(object);
        }
        let trailer = Trailer {
            offset_size: 1,
            object_ref_size: 1,
            offset_count: objects.len() as u64,
            top_level_object_number: 0,
            offset_table_offset: bytes.len() as u64,
        };
        bytes.extend_from_slice(&offsets);
        bytes.extend_from_slice(&trailer.to_bytes());
        bytes
    }

    /// Build a document of `levels` objects: one element arrays, each holding the next, around `true`
    ///
    /// Offsets and references are 2 bytes wide.
    fn build_nested(levels: usize) -> Vec<u8> {
        let mut bytes = b"bplist00".to_vec();
        let mut offsets = vec![];
        for level in 0..levels {
            offsets.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
            if level + 1 == levels {
                bytes.push(0x09);
            } else {
                bytes.push(0xa1);
                bytes.extend_from_slice(&(level as u16 + 1).to_be_bytes());
            }
        }
        let trailer = Trailer {
            offset_size: 2,
            object_ref_size: 2,
            offset_count: levels as u64,
            top_level_object_number: 0,
            offset_table_offset: bytes.len() as u64,
        };
        bytes.extend_from_slice(&offsets);
        bytes.extend_from_slice(&trailer.to_bytes());
        bytes
    }

    fn parse(bytes: &[u8]) -> Result<Value, PlistError> {
        PlistReader::new(bytes).parse()
    }

    #[test]
    fn test_parse_simple() {
        let bytes = read_fixture("Simple.plist");
        let mut parser = PlistReader::new(&bytes);
        let result = parser.parse().unwrap();

        let dict = result.as_dictionary().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict["aKey"], Value::from("aValue"));
        assert_eq!(
            dict["list"],
            Value::Array(vec![Value::from(1), Value::from(2), Value::from(3)])
        );
    }

    #[test]
    fn test_parse_trailer() {
        let bytes = read_fixture("Simple.plist");
        let mut parser = PlistReader::new(&bytes);
        assert!(parser.trailer().is_none());

        parser.parse().unwrap();

        let expected = Trailer {
            offset_size: 1,
            object_ref_size: 1,
            offset_count: 8,
            top_level_object_number: 0,
            offset_table_offset: 0x28,
        };
        assert_eq!(parser.trailer(), Some(&expected));
        assert_eq!(parser.offsets().len(), 8);
        assert_eq!(parser.offsets()[0], 8);
    }

    #[test]
    fn test_parse_all_types() {
        let bytes = read_fixture("AllTypes.plist");
        let result = parse(&bytes).unwrap();
        let dict = result.as_dictionary().unwrap();

        assert_eq!(dict.len(), 15);
        assert_eq!(dict["yes"], Value::Boolean(true));
        assert_eq!(dict["no"], Value::Boolean(false));
        assert_eq!(dict["small"], Value::Integer(255));
        assert_eq!(dict["medium"], Value::Integer(256));
        assert_eq!(dict["large"], Value::Integer(4294967296));
        assert_eq!(dict["negative"], Value::Integer(-1));
        assert_eq!(dict["real"], Value::Real(1.5));
        assert_eq!(
            dict["date"],
            Value::Date(Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(
            dict["epoch"],
            Value::Date(Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(dict["data"], Value::Data(vec![0, 1, 2]));
        assert_eq!(dict["unicode"], Value::from("héllo"));
        assert_eq!(
            dict["long"],
            Value::from("this string is longer than fourteen characters")
        );
        assert_eq!(dict["uid"], Value::Uid(Uid(7)));
        assert_eq!(
            dict["numbers"],
            Value::Array((0..20).map(Value::from).collect())
        );

        let nested = dict["nested"].as_array().unwrap();
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0], nested[1]);
        assert_eq!(
            nested[0].as_dictionary().unwrap()["name"],
            Value::from("a")
        );
    }

    #[test]
    fn test_parse_singletons() {
        assert_eq!(parse(&build(&[&[0x00]])).unwrap(), Value::Null);
        assert_eq!(parse(&build(&[&[0x08]])).unwrap(), Value::Boolean(false));
        assert_eq!(parse(&build(&[&[0x09]])).unwrap(), Value::Boolean(true));
        assert_eq!(parse(&build(&[&[0x0f]])).unwrap(), Value::Null);
    }

    #[test]
    fn test_parse_integer_widths() {
        assert_eq!(parse(&build(&[&[0x10, 0xff]])).unwrap(), Value::Integer(255));
        assert_eq!(
            parse(&build(&[&[0x11, 0xff, 0xff]])).unwrap(),
            Value::Integer(65535)
        );
        assert_eq!(
            parse(&build(&[&[0x12, 0xff, 0xff, 0xff, 0xff]])).unwrap(),
            Value::Integer(4294967295)
        );
        assert_eq!(
            parse(&build(&[&[0x13, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xfe]])).unwrap(),
            Value::Integer(-2)
        );
    }

    #[test]
    fn test_parse_float32() {
        let bits = 1.5f32.to_bits().to_be_bytes();
        let object = [0x22, bits[0], bits[1], bits[2], bits[3]];

        assert_eq!(parse(&build(&[&object])).unwrap(), Value::Real(1.5));
    }

    #[test]
    fn test_parse_uid_widths() {
        assert_eq!(parse(&build(&[&[0x80, 0x07]])).unwrap(), Value::Uid(Uid(7)));
        assert_eq!(
            parse(&build(&[&[0x81, 0x01, 0x00]])).unwrap(),
            Value::Uid(Uid(256))
        );
        assert!(matches!(
            parse(&build(&[&[0x82, 0x01, 0x00, 0x00]])),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidIntegerSize(3)))
        ));
    }

    #[test]
    fn test_parse_set() {
        let bytes = build(&[&[0xc2, 0x01, 0x02], &[0x51, 0x61], &[0x51, 0x62]]);

        assert_eq!(
            parse(&bytes).unwrap(),
            Value::Set(vec![Value::from("b"), Value::from("a")])
        );
    }

    #[test]
    fn test_parse_shared_object() {
        let bytes = build(&[&[0xa2, 0x01, 0x01], &[0xa1, 0x02], &[0x51, 0x61]]);

        let result = parse(&bytes).unwrap();

        let inner = Value::Array(vec![Value::from("a")]);
        assert_eq!(result, Value::Array(vec![inner.clone(), inner]));
    }

    #[test]
    fn test_parse_long_data() {
        let mut object = vec![0x4f, 0x10, 20];
        object.extend(0..20);

        assert_eq!(
            parse(&build(&[&object])).unwrap(),
            Value::Data((0..20).collect())
        );
    }

    #[test]
    fn cant_parse_non_binary() {
        assert!(matches!(
            parse(b"<?xml version=\"1.0\"?>"),
            Err(PlistError::NotBinaryPlist)
        ));
        assert!(matches!(parse(b""), Err(PlistError::NotBinaryPlist)));
    }

    #[test]
    fn cant_parse_too_short() {
        assert!(matches!(
            parse(b"bplist00\x08"),
            Err(PlistError::InvalidPlist(BinaryPlistError::TooShort(9)))
        ));
    }

    #[test]
    fn cant_parse_unknown_marker() {
        assert!(matches!(
            parse(&build(&[&[0x70]])),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidMarker(0x70, 8)))
        ));
        assert!(matches!(
            parse(&build(&[&[0x05]])),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidMarker(0x05, 8)))
        ));
        assert!(matches!(
            parse(&build(&[&[0x34, 0, 0, 0, 0, 0, 0, 0, 0]])),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidMarker(0x34, 8)))
        ));
    }

    #[test]
    fn cant_parse_real_of_bad_width() {
        assert!(matches!(
            parse(&build(&[&[0x21, 0, 0]])),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidRealSize(2)))
        ));
    }

    #[test]
    fn cant_parse_wide_integer() {
        assert!(matches!(
            parse(&build(&[&[0x14; 17]])),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidIntegerSize(16)))
        ));
    }

    #[test]
    fn cant_parse_cycle() {
        let bytes = build(&[&[0xa1, 0x00]]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::CyclicReference(0)))
        ));
    }

    #[test]
    fn cant_parse_bad_reference() {
        let bytes = build(&[&[0xa1, 0x05]]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidReference(5, 1)))
        ));
    }

    #[test]
    fn cant_parse_non_string_key() {
        let bytes = build(&[&[0xd1, 0x01, 0x02], &[0x10, 0x01], &[0x51, 0x61]]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidKey(8)))
        ));
    }

    #[test]
    fn cant_parse_truncated_object() {
        let bytes = build(&[&[0x5f, 0x10, 0xff, b'a', b'b']]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::OutOfBounds(_, _)))
        ));
    }

    #[test]
    fn cant_parse_non_ascii() {
        let bytes = build(&[&[0x51, 0xe9]]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidAscii(8)))
        ));
    }

    #[test]
    fn cant_parse_unpaired_surrogate() {
        let bytes = build(&[&[0x61, 0xd8, 0x00]]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidUtf16(8)))
        ));
    }

    #[test]
    fn cant_parse_bad_length() {
        let bytes = build(&[&[0x5f, 0x51, 0x61]]);

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::InvalidLength(9)))
        ));
    }

    #[test]
    fn cant_parse_offset_table_out_of_bounds() {
        let mut bytes = build(&[&[0x00]]);
        let len = bytes.len();
        // Point the offset table past the end of the buffer
        bytes[len - 1] = 0xff;

        assert!(matches!(
            parse(&bytes),
            Err(PlistError::InvalidPlist(BinaryPlistError::OutOfBounds(_, _)))
        ));
    }

    #[test]
    fn test_parse_deepest_nesting() {
        let bytes = build_nested(MAX_DEPTH);

        let mut expected = Value::Boolean(true);
        for _ in 1..MAX_DEPTH {
            expected = Value::Array(vec![expected]);
        }
        assert_eq!(parse(&bytes).unwrap(), expected);
    }

    #[test]
    fn cant_parse_deep_nesting() {
        assert!(matches!(
            parse(&build_nested(MAX_DEPTH + 1)),
            Err(PlistError::InvalidPlist(BinaryPlistError::TooDeep(MAX_DEPTH)))
        ));
        assert!(matches!(
            parse(&build_nested(10_000)),
            Err(PlistError::InvalidPlist(BinaryPlistError::TooDeep(MAX_DEPTH)))
        ));
    }
}
