//! [`PackValue`]: the value type produced and consumed by the MessagePack codec.

use chrono::{DateTime, Utc};
use ulid::Ulid;
use uuid::Uuid;

/// An extension value whose type byte has no registered codec.
///
/// Kept verbatim so that unknown extensions survive a decode/encode cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackExtension {
    pub ext_type: i8,
    pub data: Vec<u8>,
}

impl PackExtension {
    pub fn new(ext_type: i8, data: Vec<u8>) -> Self {
        Self { ext_type, data }
    }
}

/// A single MessagePack value.
#[derive(Debug, Clone, PartialEq)]
pub enum PackValue {
    /// `0xc0`
    Nil,
    /// `0xc2` / `0xc3`
    Bool(bool),
    /// Any integer that fits in `i64`.
    Int(i64),
    /// Unsigned integer above `i64::MAX`.
    UInt(u64),
    /// `0xca`
    Float32(f32),
    /// `0xcb`
    Float64(f64),
    Str(String),
    Bin(Vec<u8>),
    Array(Vec<PackValue>),
    Map(Vec<(PackValue, PackValue)>),
    /// Built-in timestamp extension.
    Date(DateTime<Utc>),
    /// Built-in ULID extension.
    Ulid(Ulid),
    /// Built-in UUID extension.
    Uuid(Uuid),
    /// Extension with no registered codec.
    Ext(PackExtension),
}

impl PackValue {
    /// Short name of the variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PackValue::Nil => "nil",
            PackValue::Bool(_) => "bool",
            PackValue::Int(_) | PackValue::UInt(_) => "int",
            PackValue::Float32(_) => "float32",
            PackValue::Float64(_) => "float64",
            PackValue::Str(_) => "str",
            PackValue::Bin(_) => "bin",
            PackValue::Array(_) => "array",
            PackValue::Map(_) => "map",
            PackValue::Date(_) => "date",
            PackValue::Ulid(_) => "ulid",
            PackValue::Uuid(_) => "uuid",
            PackValue::Ext(_) => "ext",
        }
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, PackValue::Nil)
    }

    /// Integer view of the value, if it is an integer that fits in `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PackValue::Int(i) => Some(*i),
            PackValue::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Floating point view of any numeric value.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PackValue::Float32(f) => Some(*f as f64),
            PackValue::Float64(f) => Some(*f),
            PackValue::Int(i) => Some(*i as f64),
            PackValue::UInt(u) => Some(*u as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PackValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for PackValue {
    fn from(v: i64) -> Self {
        PackValue::Int(v)
    }
}

impl From<&str> for PackValue {
    fn from(v: &str) -> Self {
        PackValue::Str(v.to_owned())
    }
}

impl From<String> for PackValue {
    fn from(v: String) -> Self {
        PackValue::Str(v)
    }
}

impl From<bool> for PackValue {
    fn from(v: bool) -> Self {
        PackValue::Bool(v)
    }
}

impl From<u64> for PackValue {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(i) => PackValue::Int(i),
            Err(_) => PackValue::UInt(v),
        }
    }
}
