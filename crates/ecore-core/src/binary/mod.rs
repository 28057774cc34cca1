//! Compact binary serialization of object graphs.
//!
//! A stream is the 8-byte [`SIGNATURE`], the format [`VERSION`], the number
//! of root objects, then the roots. Everything after the signature is
//! MessagePack. Packages, classes, features and enum literals are numbered
//! per stream and spelled out only on first use; each object is numbered
//! when first reached so shared and cyclic references become back-references.
//!
//! An object is written as its ID; on first occurrence the ID is followed by
//! its class and then its feature values, each introduced by a marker, and a
//! terminating end marker.

mod decoder;
mod encoder;
mod error;
mod feature_kind;
mod options;
mod tables;

pub use decoder::BinaryDecoder;
pub use encoder::BinaryEncoder;
pub use error::{BinaryError, ErrorKind};
pub use feature_kind::BinaryFeatureKind;
pub use options::{DecodeOptions, EncodeOptions, DEFAULT_MAX_DEPTH};

/// Leading bytes of every stream.
pub const SIGNATURE: [u8; 8] = [0x89, b'e', b'm', b'f', 0x0a, 0x0d, 0x1a, 0x0a];

pub const VERSION: i64 = 0;

// Feature markers as they appear on the wire. A marker `m > 0` introduces the
// value of feature `m - 1`.
pub(crate) const END_MARKER: i64 = 0;
pub(crate) const OBJECT_ID_MARKER: i64 = -1;
pub(crate) const PROXY_MARKER: i64 = -2;
