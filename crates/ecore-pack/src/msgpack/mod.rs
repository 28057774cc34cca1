//! MessagePack encoder/decoder family.

pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extension;
pub mod util;

pub use decoder::MsgPackDecoder;
pub use encoder::MsgPackEncoder;
pub use error::MsgPackError;
pub use extension::{
    DateExtension, ExtensionCodec, ExtensionRegistry, UlidExtension, UuidExtension,
};
pub use util::{decode, decode_all, encode};
