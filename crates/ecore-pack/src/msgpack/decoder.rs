//! `MsgPackDecoder`: reads one [`PackValue`] at a time from a byte slice.

use std::sync::Arc;

use ecore_buffers::Reader;

use super::constants::*;
use super::error::MsgPackError;
use super::extension::ExtensionRegistry;
use crate::PackValue;

/// Streaming decoder over a single in-memory buffer.
///
/// Each [`read_any`](Self::read_any) call consumes exactly one value and
/// leaves the cursor on the next one, which lets higher layers interleave
/// their own framing between primitive values.
pub struct MsgPackDecoder<'a> {
    reader: Reader<'a>,
    extensions: Arc<ExtensionRegistry>,
    max_depth: usize,
    depth: usize,
}

/// Default nesting limit for arrays and maps.
pub const DEFAULT_MAX_DEPTH: usize = 64;

impl<'a> MsgPackDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_registry(data, ExtensionRegistry::global())
    }

    pub fn with_registry(data: &'a [u8], extensions: Arc<ExtensionRegistry>) -> Self {
        Self {
            reader: Reader::new(data),
            extensions,
            max_depth: DEFAULT_MAX_DEPTH,
            depth: 0,
        }
    }

    /// Limits how deeply arrays and maps may nest.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Current byte offset into the input.
    pub fn offset(&self) -> usize {
        self.reader.x
    }

    /// Number of unread bytes.
    pub fn remaining(&self) -> usize {
        self.reader.size()
    }

    /// Reads `size` raw bytes, bypassing MessagePack framing.
    pub fn read_raw(&mut self, size: usize) -> Result<&'a [u8], MsgPackError> {
        Ok(self.reader.buf(size)?)
    }

    /// Decodes exactly one value.
    pub fn read_any(&mut self) -> Result<PackValue, MsgPackError> {
        self.read_value(true)
    }

    /// Decodes exactly one value that is not an array or a map. A container
    /// tag is reported as an invalid byte without reading any further.
    pub fn read_scalar(&mut self) -> Result<PackValue, MsgPackError> {
        self.read_value(false)
    }

    fn read_value(&mut self, containers: bool) -> Result<PackValue, MsgPackError> {
        let offset = self.reader.x;
        let byte = self.reader.u8()?;
        if !containers && is_container(byte) {
            return Err(MsgPackError::InvalidByte { byte, offset });
        }

        match byte {
            0x00..=0x7f => return Ok(PackValue::Int(byte as i64)),
            0xe0..=0xff => return Ok(PackValue::Int((byte as i8) as i64)),
            0x80..=0x8f => return self.read_map((byte & 0x0f) as usize),
            0x90..=0x9f => return self.read_arr((byte & 0x0f) as usize),
            0xa0..=0xbf => return self.read_str((byte & 0x1f) as usize),
            _ => {}
        }

        match byte {
            NIL => Ok(PackValue::Nil),
            FALSE => Ok(PackValue::Bool(false)),
            TRUE => Ok(PackValue::Bool(true)),
            BIN8 => {
                let n = self.reader.u8()? as usize;
                Ok(PackValue::Bin(self.reader.buf(n)?.to_vec()))
            }
            BIN16 => {
                let n = self.reader.u16()? as usize;
                Ok(PackValue::Bin(self.reader.buf(n)?.to_vec()))
            }
            BIN32 => {
                let n = self.reader.u32()? as usize;
                Ok(PackValue::Bin(self.reader.buf(n)?.to_vec()))
            }
            EXT8 => {
                let n = self.reader.u8()? as usize;
                self.read_ext(n)
            }
            EXT16 => {
                let n = self.reader.u16()? as usize;
                self.read_ext(n)
            }
            EXT32 => {
                let n = self.reader.u32()? as usize;
                self.read_ext(n)
            }
            FLOAT32 => Ok(PackValue::Float32(self.reader.f32()?)),
            FLOAT64 => Ok(PackValue::Float64(self.reader.f64()?)),
            UINT8 => Ok(PackValue::Int(self.reader.u8()? as i64)),
            UINT16 => Ok(PackValue::Int(self.reader.u16()? as i64)),
            UINT32 => Ok(PackValue::Int(self.reader.u32()? as i64)),
            UINT64 => {
                // High and low 32-bit words, combined without going through f64.
                let hi = self.reader.u32()? as u64;
                let lo = self.reader.u32()? as u64;
                Ok(PackValue::from((hi << 32) | lo))
            }
            INT8 => Ok(PackValue::Int(self.reader.i8()? as i64)),
            INT16 => Ok(PackValue::Int(self.reader.i16()? as i64)),
            INT32 => Ok(PackValue::Int(self.reader.i32()? as i64)),
            INT64 => {
                let hi = self.reader.i32()? as i64;
                let lo = self.reader.u32()? as i64;
                Ok(PackValue::Int((hi << 32) | lo))
            }
            FIXEXT1 => self.read_ext(1),
            FIXEXT2 => self.read_ext(2),
            FIXEXT4 => self.read_ext(4),
            FIXEXT8 => self.read_ext(8),
            FIXEXT16 => self.read_ext(16),
            STR8 => {
                let n = self.reader.u8()? as usize;
                self.read_str(n)
            }
            STR16 => {
                let n = self.reader.u16()? as usize;
                self.read_str(n)
            }
            STR32 => {
                let n = self.reader.u32()? as usize;
                self.read_str(n)
            }
            ARRAY16 => {
                let n = self.reader.u16()? as usize;
                self.read_arr(n)
            }
            ARRAY32 => {
                let n = self.reader.u32()? as usize;
                self.read_arr(n)
            }
            MAP16 => {
                let n = self.reader.u16()? as usize;
                self.read_map(n)
            }
            MAP32 => {
                let n = self.reader.u32()? as usize;
                self.read_map(n)
            }
            _ => Err(MsgPackError::InvalidByte { byte, offset }),
        }
    }

    fn read_str(&mut self, size: usize) -> Result<PackValue, MsgPackError> {
        match self.reader.utf8(size)? {
            Some(s) => Ok(PackValue::Str(s.to_owned())),
            None => Err(MsgPackError::InvalidUtf8 {
                offset: self.reader.x,
            }),
        }
    }

    fn read_arr(&mut self, size: usize) -> Result<PackValue, MsgPackError> {
        self.enter()?;
        let mut arr = Vec::with_capacity(size.min(self.remaining()));
        for _ in 0..size {
            arr.push(self.read_any()?);
        }
        self.depth -= 1;
        Ok(PackValue::Array(arr))
    }

    fn read_map(&mut self, size: usize) -> Result<PackValue, MsgPackError> {
        self.enter()?;
        let mut entries = Vec::with_capacity(size.min(self.remaining()));
        for _ in 0..size {
            let key = self.read_any()?;
            let val = self.read_any()?;
            entries.push((key, val));
        }
        self.depth -= 1;
        Ok(PackValue::Map(entries))
    }

    fn enter(&mut self) -> Result<(), MsgPackError> {
        if self.depth >= self.max_depth {
            return Err(MsgPackError::TooDeep {
                limit: self.max_depth,
                offset: self.reader.x,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn read_ext(&mut self, size: usize) -> Result<PackValue, MsgPackError> {
        let ext_type = self.reader.i8()?;
        let data = self.reader.buf(size)?;
        self.extensions.decode(ext_type, data)
    }
}

fn is_container(byte: u8) -> bool {
    matches!(byte, 0x80..=0x9f | ARRAY16 | ARRAY32 | MAP16 | MAP32)
}
