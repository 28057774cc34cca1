//! MessagePack decoder error type.

use ecore_buffers::BufferError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MsgPackError {
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("invalid MessagePack tag 0x{byte:02x} at offset {offset}")]
    InvalidByte { byte: u8, offset: usize },
    #[error("invalid UTF-8 in string ending at offset {offset}")]
    InvalidUtf8 { offset: usize },
    #[error("malformed payload for extension type {ext_type}: {reason}")]
    InvalidExtension { ext_type: i8, reason: String },
    #[error("arrays and maps nested deeper than {limit} levels at offset {offset}")]
    TooDeep { limit: usize, offset: usize },
}

impl From<BufferError> for MsgPackError {
    fn from(err: BufferError) -> Self {
        match err {
            BufferError::EndOfBuffer { offset, .. } => MsgPackError::UnexpectedEof { offset },
        }
    }
}
