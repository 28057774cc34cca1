//! Convenience MessagePack helpers.

use crate::PackValue;

use super::{MsgPackDecoder, MsgPackEncoder, MsgPackError};

/// Encodes a single value with the global extension registry.
pub fn encode(value: &PackValue) -> Vec<u8> {
    let mut encoder = MsgPackEncoder::new();
    encoder.encode(value)
}

/// Decodes the first value in `blob`.
pub fn decode(blob: &[u8]) -> Result<PackValue, MsgPackError> {
    let mut decoder = MsgPackDecoder::new(blob);
    decoder.read_any()
}

/// Decodes every value in `blob`, back to back.
pub fn decode_all(blob: &[u8]) -> Result<Vec<PackValue>, MsgPackError> {
    let mut decoder = MsgPackDecoder::new(blob);
    let mut values = Vec::new();
    while decoder.remaining() > 0 {
        values.push(decoder.read_any()?);
    }
    Ok(values)
}
