use std::sync::Arc;

use chrono::{TimeZone, Utc};
use ecore_pack::msgpack::{
    decode, decode_all, encode, ExtensionCodec, ExtensionRegistry, MsgPackDecoder,
    MsgPackEncoder, MsgPackError,
};
use ecore_pack::{PackExtension, PackValue};
use proptest::prelude::*;

#[test]
fn msgpack_encoder_wire_matrix() {
    let mut encoder = MsgPackEncoder::new();

    assert_eq!(encoder.encode(&PackValue::Nil), vec![0xc0]);
    assert_eq!(encoder.encode(&PackValue::Bool(false)), vec![0xc2]);
    assert_eq!(encoder.encode(&PackValue::Bool(true)), vec![0xc3]);
    assert_eq!(encoder.encode(&PackValue::Int(0)), vec![0x00]);
    assert_eq!(encoder.encode(&PackValue::Int(-1)), vec![0xff]);
    assert_eq!(
        encoder.encode(&PackValue::Str("foo".into())),
        vec![0xa3, b'f', b'o', b'o']
    );
    assert_eq!(
        encoder.encode(&PackValue::Bin(vec![1, 2])),
        vec![0xc4, 0x02, 0x01, 0x02]
    );
    assert_eq!(
        encoder.encode(&PackValue::Float32(1.5)),
        vec![0xca, 0x3f, 0xc0, 0x00, 0x00]
    );
    assert_eq!(encoder.encode(&PackValue::Float64(0.5))[0], 0xcb);

    let arr_16 = PackValue::Array((1..=16).map(PackValue::Int).collect());
    let encoded_16 = encoder.encode(&arr_16);
    assert_eq!(&encoded_16[..3], &[0xdc, 0x00, 0x10]);
    assert_eq!(encoded_16.len(), 19);

    let map = PackValue::Map(vec![(PackValue::from("k"), PackValue::Bool(true))]);
    assert_eq!(encoder.encode(&map), vec![0x81, 0xa1, b'k', 0xc3]);
}

#[test]
fn msgpack_decoder_matrix() {
    let values = vec![
        PackValue::Nil,
        PackValue::Bool(true),
        PackValue::Int(123),
        PackValue::Int(-32),
        PackValue::Int(-4_807_526_976),
        PackValue::Int(i64::MAX),
        PackValue::UInt(u64::MAX),
        PackValue::Float64(3_456.123_456_789_022_4),
        PackValue::Float32(-0.25),
        PackValue::Str("".into()),
        PackValue::Str("a".repeat(256)),
        PackValue::Str("héllo, wörld ✓ 𝄞".into()),
        PackValue::Bin(vec![0u8; 300]),
        PackValue::Array(vec![
            PackValue::Int(1),
            PackValue::Array(vec![PackValue::Int(2)]),
            PackValue::Map(vec![(PackValue::from("k"), PackValue::Nil)]),
        ]),
    ];

    for value in values {
        let encoded = encode(&value);
        let decoded =
            decode(&encoded).unwrap_or_else(|e| panic!("decode failed for {value:?}: {e}"));
        assert_eq!(decoded, value);
    }
}

#[test]
fn builtin_extensions_decode_to_typed_values() {
    let date = Utc.timestamp_opt(1_234_567_890, 123_000_000).unwrap();
    let ulid = ulid::Ulid::from_parts(1_700_000_000_000, 42);
    let uuid = uuid::Uuid::from_bytes([0xab; 16]);

    let mut encoder = MsgPackEncoder::new();
    encoder.write_any(&PackValue::Date(date));
    encoder.write_any(&PackValue::Ulid(ulid));
    encoder.write_any(&PackValue::Uuid(uuid));
    let bytes = encoder.writer.flush();

    // fixext8 for the 64-bit timestamp layout, fixext16 for both ids.
    assert_eq!(&bytes[..2], &[0xd7, 0xff]);
    assert_eq!(&bytes[10..12], &[0xd8, 0xfe]);
    assert_eq!(&bytes[28..30], &[0xd8, 0xfd]);

    let decoded = decode_all(&bytes).unwrap();
    assert_eq!(
        decoded,
        vec![PackValue::Date(date), PackValue::Ulid(ulid), PackValue::Uuid(uuid)]
    );
}

#[test]
fn unknown_extension_round_trips_opaquely() {
    for len in [1usize, 2, 3, 4, 8, 16, 17, 300, 70_000] {
        let value = PackValue::Ext(PackExtension::new(17, vec![0x5a; len]));
        let bytes = encode(&value);
        assert_eq!(decode(&bytes).unwrap(), value, "payload length {len}");
    }
}

struct Point;

impl ExtensionCodec for Point {
    fn ext_type(&self) -> i8 {
        7
    }

    fn encode(&self, value: &PackValue) -> Option<Vec<u8>> {
        match value {
            PackValue::Ext(ext) if ext.ext_type == 7 => Some(ext.data.clone()),
            _ => None,
        }
    }

    fn decode(&self, data: &[u8]) -> Result<PackValue, MsgPackError> {
        if data.len() != 2 {
            return Err(MsgPackError::InvalidExtension {
                ext_type: 7,
                reason: "point needs two bytes".into(),
            });
        }
        Ok(PackValue::Array(vec![
            PackValue::Int(data[0] as i64),
            PackValue::Int(data[1] as i64),
        ]))
    }
}

#[test]
fn registered_extension_decodes_through_codec() {
    let mut registry = ExtensionRegistry::with_builtins();
    registry.register(Arc::new(Point));
    let registry = Arc::new(registry);

    let bytes = [0xd5, 0x07, 0x03, 0x04];
    let mut decoder = MsgPackDecoder::with_registry(&bytes, registry.clone());
    assert_eq!(
        decoder.read_any().unwrap(),
        PackValue::Array(vec![PackValue::Int(3), PackValue::Int(4)])
    );

    let bad = [0xd4, 0x07, 0x03];
    let mut decoder = MsgPackDecoder::with_registry(&bad, registry);
    assert!(matches!(
        decoder.read_any(),
        Err(MsgPackError::InvalidExtension { ext_type: 7, .. })
    ));
}

#[test]
fn unrecognized_tag_is_an_error() {
    let err = decode(&[0xc1]).unwrap_err();
    assert_eq!(err.to_string(), "invalid MessagePack tag 0xc1 at offset 0");
}

fn expected_int_len(v: i64) -> usize {
    match v {
        0..=0x7f => 1,
        -32..=-1 => 1,
        0x80..=0xff => 2,
        -128..=-33 => 2,
        0x100..=0xffff => 3,
        -32_768..=-129 => 3,
        0x1_0000..=0xffff_ffff => 5,
        -2_147_483_648..=-32_769 => 5,
        _ => 9,
    }
}

proptest! {
    #[test]
    fn integers_use_shortest_tag(v in any::<i64>()) {
        let bytes = encode(&PackValue::Int(v));
        prop_assert_eq!(bytes.len(), expected_int_len(v));
        prop_assert_eq!(decode(&bytes).unwrap(), PackValue::Int(v));
    }

    #[test]
    fn strings_survive(s in ".{0,300}") {
        let bytes = encode(&PackValue::Str(s.clone()));
        prop_assert_eq!(decode(&bytes).unwrap(), PackValue::Str(s));
    }
}
