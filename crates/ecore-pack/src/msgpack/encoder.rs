//! `MsgPackEncoder`: writes [`PackValue`]s using the shortest applicable tag.

use std::sync::Arc;

use ecore_buffers::Writer;

use super::constants::*;
use super::extension::{date_payload, ExtensionRegistry};
use crate::PackValue;

pub struct MsgPackEncoder {
    pub writer: Writer,
    extensions: Arc<ExtensionRegistry>,
}

impl Default for MsgPackEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MsgPackEncoder {
    pub fn new() -> Self {
        Self::with_registry(ExtensionRegistry::global())
    }

    pub fn with_registry(extensions: Arc<ExtensionRegistry>) -> Self {
        Self {
            writer: Writer::new(),
            extensions,
        }
    }

    /// Starts with a buffer of `capacity` bytes; it still doubles on overflow.
    pub fn with_capacity(capacity: usize, extensions: Arc<ExtensionRegistry>) -> Self {
        Self {
            writer: Writer::with_capacity(capacity),
            extensions,
        }
    }

    pub fn extensions(&self) -> &Arc<ExtensionRegistry> {
        &self.extensions
    }

    /// Encodes one value into a fresh byte vector.
    pub fn encode(&mut self, value: &PackValue) -> Vec<u8> {
        self.writer.reset();
        self.write_any(value);
        self.writer.flush()
    }

    pub fn write_any(&mut self, value: &PackValue) {
        match value {
            PackValue::Nil => self.write_nil(),
            PackValue::Bool(b) => self.write_bool(*b),
            PackValue::Int(i) => self.write_int(*i),
            PackValue::UInt(u) => self.write_uint(*u),
            PackValue::Float32(f) => self.write_f32(*f),
            PackValue::Float64(f) => self.write_f64(*f),
            PackValue::Str(s) => self.write_str(s),
            PackValue::Bin(b) => self.write_bin(b),
            PackValue::Array(arr) => {
                self.write_arr_hdr(arr.len());
                for item in arr {
                    self.write_any(item);
                }
            }
            PackValue::Map(entries) => {
                self.write_map_hdr(entries.len());
                for (key, val) in entries {
                    self.write_any(key);
                    self.write_any(val);
                }
            }
            PackValue::Ext(ext) => self.write_ext(ext.ext_type, &ext.data),
            PackValue::Date(_) | PackValue::Ulid(_) | PackValue::Uuid(_) => {
                let (ext_type, data) = match self.extensions.encode(value) {
                    Some(encoded) => encoded,
                    None => builtin_payload(value),
                };
                self.write_ext(ext_type, &data);
            }
        }
    }

    pub fn write_nil(&mut self) {
        self.writer.u8(NIL);
    }

    pub fn write_bool(&mut self, b: bool) {
        self.writer.u8(if b { TRUE } else { FALSE });
    }

    pub fn write_f32(&mut self, float: f32) {
        self.writer.u8(FLOAT32);
        self.writer.f32(float);
    }

    pub fn write_f64(&mut self, float: f64) {
        self.writer.u8(FLOAT64);
        self.writer.f64(float);
    }

    /// Writes an unsigned integer with the shortest tag:
    /// positive fixint, then uint8, uint16, uint32, uint64.
    pub fn write_uint(&mut self, uint: u64) {
        if uint <= 0x7f {
            self.writer.u8(uint as u8);
        } else if uint <= 0xff {
            self.writer.u8(UINT8);
            self.writer.u8(uint as u8);
        } else if uint <= 0xffff {
            self.writer.u8u16(UINT16, uint as u16);
        } else if uint <= 0xffff_ffff {
            self.writer.u8u32(UINT32, uint as u32);
        } else {
            self.writer.u8(UINT64);
            self.writer.u64(uint);
        }
    }

    /// Writes a signed integer with the shortest tag: fixints first, then
    /// int8, int16, int32, int64 for negatives (non-negatives go through
    /// [`write_uint`](Self::write_uint)).
    pub fn write_int(&mut self, int: i64) {
        if int >= 0 {
            self.write_uint(int as u64);
        } else if int >= -0x20 {
            self.writer.i8(int as i8);
        } else if int >= i8::MIN as i64 {
            self.writer.u8(INT8);
            self.writer.i8(int as i8);
        } else if int >= i16::MIN as i64 {
            self.writer.u8(INT16);
            self.writer.i16(int as i16);
        } else if int >= i32::MIN as i64 {
            self.writer.u8(INT32);
            self.writer.i32(int as i32);
        } else {
            self.writer.u8(INT64);
            self.writer.i64(int);
        }
    }

    pub fn write_str_hdr(&mut self, length: usize) {
        if length <= 0x1f {
            self.writer.u8(FIXSTR | length as u8);
        } else if length <= 0xff {
            self.writer.u8(STR8);
            self.writer.u8(length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(STR16, length as u16);
        } else {
            self.writer.u8u32(STR32, length as u32);
        }
    }

    pub fn write_str(&mut self, s: &str) {
        self.write_str_hdr(s.len());
        self.writer.utf8(s);
    }

    pub fn write_bin(&mut self, buf: &[u8]) {
        let length = buf.len();
        if length <= 0xff {
            self.writer.u8(BIN8);
            self.writer.u8(length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(BIN16, length as u16);
        } else {
            self.writer.u8u32(BIN32, length as u32);
        }
        self.writer.buf(buf);
    }

    pub fn write_arr_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.writer.u8(FIXARRAY | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(ARRAY16, length as u16);
        } else {
            self.writer.u8u32(ARRAY32, length as u32);
        }
    }

    pub fn write_map_hdr(&mut self, length: usize) {
        if length <= 0xf {
            self.writer.u8(FIXMAP | length as u8);
        } else if length <= 0xffff {
            self.writer.u8u16(MAP16, length as u16);
        } else {
            self.writer.u8u32(MAP32, length as u32);
        }
    }

    /// Writes an extension value: fixext for 1/2/4/8/16 byte payloads,
    /// otherwise ext8/16/32 with an explicit length.
    pub fn write_ext(&mut self, ext_type: i8, data: &[u8]) {
        let length = data.len();
        match length {
            1 => self.writer.u8(FIXEXT1),
            2 => self.writer.u8(FIXEXT2),
            4 => self.writer.u8(FIXEXT4),
            8 => self.writer.u8(FIXEXT8),
            16 => self.writer.u8(FIXEXT16),
            _ if length <= 0xff => {
                self.writer.u8(EXT8);
                self.writer.u8(length as u8);
            }
            _ if length <= 0xffff => self.writer.u8u16(EXT16, length as u16),
            _ => self.writer.u8u32(EXT32, length as u32),
        }
        self.writer.i8(ext_type);
        self.writer.buf(data);
    }
}

/// Payload of a built-in typed value when the active registry has no codec
/// for it.
fn builtin_payload(value: &PackValue) -> (i8, Vec<u8>) {
    match value {
        PackValue::Date(date) => (EXT_DATE, date_payload(date)),
        PackValue::Ulid(ulid) => (EXT_ULID, ulid.to_bytes().to_vec()),
        PackValue::Uuid(uuid) => (EXT_UUID, uuid.as_bytes().to_vec()),
        _ => (0, Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_width_boundaries() {
        let mut encoder = MsgPackEncoder::new();
        assert_eq!(encoder.encode(&PackValue::Int(127)), vec![0x7f]);
        assert_eq!(encoder.encode(&PackValue::Int(128)), vec![0xcc, 0x80]);
        assert_eq!(encoder.encode(&PackValue::Int(256)), vec![0xcd, 0x01, 0x00]);
        assert_eq!(
            encoder.encode(&PackValue::Int(65_536)),
            vec![0xce, 0x00, 0x01, 0x00, 0x00]
        );
        assert_eq!(encoder.encode(&PackValue::Int(1 << 32))[0], 0xcf);
        assert_eq!(encoder.encode(&PackValue::Int(-32)), vec![0xe0]);
        assert_eq!(encoder.encode(&PackValue::Int(-33)), vec![0xd0, 0xdf]);
        assert_eq!(encoder.encode(&PackValue::Int(-129)), vec![0xd1, 0xff, 0x7f]);
        assert_eq!(encoder.encode(&PackValue::Int(-32_769))[0], 0xd2);
        assert_eq!(encoder.encode(&PackValue::Int(i64::MIN))[0], 0xd3);
        assert_eq!(encoder.encode(&PackValue::UInt(u64::MAX)).len(), 9);
    }

    #[test]
    fn string_headers() {
        let mut encoder = MsgPackEncoder::new();
        assert_eq!(encoder.encode(&PackValue::Str(String::new())), vec![0xa0]);
        let s31 = "x".repeat(31);
        assert_eq!(encoder.encode(&PackValue::Str(s31))[0], 0xbf);
        let s32 = "x".repeat(32);
        assert_eq!(&encoder.encode(&PackValue::Str(s32))[..2], &[0xd9, 32]);
        let s256 = "x".repeat(256);
        assert_eq!(&encoder.encode(&PackValue::Str(s256))[..3], &[0xda, 0x01, 0x00]);
    }

    #[test]
    fn ext_layouts() {
        let mut encoder = MsgPackEncoder::new();
        let one = encoder.encode(&PackValue::Ext(crate::PackExtension::new(5, vec![9])));
        assert_eq!(one, vec![0xd4, 0x05, 0x09]);
        let three = encoder.encode(&PackValue::Ext(crate::PackExtension::new(-7, vec![1, 2, 3])));
        assert_eq!(three, vec![0xc7, 0x03, 0xf9, 1, 2, 3]);
    }

    #[test]
    fn empty_registry_still_writes_builtin_types() {
        let mut encoder = MsgPackEncoder::with_registry(Arc::new(ExtensionRegistry::empty()));
        let uuid = uuid::Uuid::from_bytes([7u8; 16]);
        let bytes = encoder.encode(&PackValue::Uuid(uuid));
        assert_eq!(&bytes[..2], &[0xd8, 0xfd]);
        assert_eq!(bytes.len(), 18);
    }
}
