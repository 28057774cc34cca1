//! Extension registry: maps an extension type byte to an encode/decode pair.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use ulid::Ulid;
use uuid::Uuid;

use super::constants::{EXT_DATE, EXT_ULID, EXT_UUID};
use super::error::MsgPackError;
use crate::{PackExtension, PackValue};

/// Codec for one extension type.
pub trait ExtensionCodec: Send + Sync {
    /// The extension type byte this codec owns.
    fn ext_type(&self) -> i8;

    /// Returns the payload for `value`, or `None` if this codec does not
    /// handle values of that shape.
    fn encode(&self, value: &PackValue) -> Option<Vec<u8>>;

    fn decode(&self, data: &[u8]) -> Result<PackValue, MsgPackError>;
}

/// Table of extension codecs keyed by type byte.
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    codecs: BTreeMap<i8, Arc<dyn ExtensionCodec>>,
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("types", &self.codecs.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExtensionRegistry {
    /// An empty registry: every extension decodes to [`PackValue::Ext`].
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in date, ULID and UUID codecs.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(DateExtension));
        registry.register(Arc::new(UlidExtension));
        registry.register(Arc::new(UuidExtension));
        registry
    }

    /// Process-wide default registry, built on first use.
    pub fn global() -> Arc<ExtensionRegistry> {
        static GLOBAL: OnceLock<Arc<ExtensionRegistry>> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Arc::new(ExtensionRegistry::with_builtins()))
            .clone()
    }

    /// Registers `codec`, replacing any codec previously bound to its type byte.
    pub fn register(&mut self, codec: Arc<dyn ExtensionCodec>) -> Option<Arc<dyn ExtensionCodec>> {
        self.codecs.insert(codec.ext_type(), codec)
    }

    pub fn get(&self, ext_type: i8) -> Option<&Arc<dyn ExtensionCodec>> {
        self.codecs.get(&ext_type)
    }

    /// Finds the first codec willing to encode `value`.
    pub fn encode(&self, value: &PackValue) -> Option<(i8, Vec<u8>)> {
        self.codecs
            .values()
            .find_map(|codec| codec.encode(value).map(|data| (codec.ext_type(), data)))
    }

    /// Decodes an extension payload; unknown types are kept opaque.
    pub fn decode(&self, ext_type: i8, data: &[u8]) -> Result<PackValue, MsgPackError> {
        match self.codecs.get(&ext_type) {
            Some(codec) => codec.decode(data),
            None => Ok(PackValue::Ext(PackExtension::new(ext_type, data.to_vec()))),
        }
    }
}

/// MessagePack timestamp extension (type -1), 32/64/96-bit layouts.
pub struct DateExtension;

/// Encodes a date using the smallest timestamp layout that holds it.
pub fn date_payload(date: &DateTime<Utc>) -> Vec<u8> {
    let sec = date.timestamp();
    let nsec = date.timestamp_subsec_nanos();
    if nsec == 0 && (0..=u32::MAX as i64).contains(&sec) {
        (sec as u32).to_be_bytes().to_vec()
    } else if (0..(1i64 << 34)).contains(&sec) {
        let packed = ((nsec as u64) << 34) | sec as u64;
        packed.to_be_bytes().to_vec()
    } else {
        let mut out = Vec::with_capacity(12);
        out.extend_from_slice(&nsec.to_be_bytes());
        out.extend_from_slice(&sec.to_be_bytes());
        out
    }
}

fn invalid(ext_type: i8, reason: impl Into<String>) -> MsgPackError {
    MsgPackError::InvalidExtension {
        ext_type,
        reason: reason.into(),
    }
}

impl ExtensionCodec for DateExtension {
    fn ext_type(&self) -> i8 {
        EXT_DATE
    }

    fn encode(&self, value: &PackValue) -> Option<Vec<u8>> {
        match value {
            PackValue::Date(date) => Some(date_payload(date)),
            _ => None,
        }
    }

    fn decode(&self, data: &[u8]) -> Result<PackValue, MsgPackError> {
        let (sec, nsec) = match data.len() {
            4 => (u32::from_be_bytes([data[0], data[1], data[2], data[3]]) as i64, 0u32),
            8 => {
                let mut raw = [0u8; 8];
                raw.copy_from_slice(data);
                let packed = u64::from_be_bytes(raw);
                ((packed & 0x3_ffff_ffff) as i64, (packed >> 34) as u32)
            }
            12 => {
                let nsec = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&data[4..]);
                (i64::from_be_bytes(raw), nsec)
            }
            n => return Err(invalid(EXT_DATE, format!("timestamp payload of {n} bytes"))),
        };
        DateTime::<Utc>::from_timestamp(sec, nsec)
            .map(PackValue::Date)
            .ok_or_else(|| invalid(EXT_DATE, format!("timestamp {sec}s {nsec}ns out of range")))
    }
}

fn sixteen(ext_type: i8, data: &[u8]) -> Result<[u8; 16], MsgPackError> {
    <[u8; 16]>::try_from(data)
        .map_err(|_| invalid(ext_type, format!("expected 16 bytes, got {}", data.len())))
}

/// 128-bit ULID extension (type -2), big-endian.
pub struct UlidExtension;

impl ExtensionCodec for UlidExtension {
    fn ext_type(&self) -> i8 {
        EXT_ULID
    }

    fn encode(&self, value: &PackValue) -> Option<Vec<u8>> {
        match value {
            PackValue::Ulid(ulid) => Some(ulid.to_bytes().to_vec()),
            _ => None,
        }
    }

    fn decode(&self, data: &[u8]) -> Result<PackValue, MsgPackError> {
        Ok(PackValue::Ulid(Ulid::from_bytes(sixteen(EXT_ULID, data)?)))
    }
}

/// 128-bit UUID extension (type -3), RFC 4122 byte order.
pub struct UuidExtension;

impl ExtensionCodec for UuidExtension {
    fn ext_type(&self) -> i8 {
        EXT_UUID
    }

    fn encode(&self, value: &PackValue) -> Option<Vec<u8>> {
        match value {
            PackValue::Uuid(uuid) => Some(uuid.as_bytes().to_vec()),
            _ => None,
        }
    }

    fn decode(&self, data: &[u8]) -> Result<PackValue, MsgPackError> {
        Ok(PackValue::Uuid(Uuid::from_bytes(sixteen(EXT_UUID, data)?)))
    }
}
