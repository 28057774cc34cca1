//! MessagePack primitive codec used as the framing layer of the ecore binary
//! model format.
//!
//! Every value is introduced by a single tag byte following the MessagePack
//! layout. Extension values (tag `0xd4..=0xd8`, `0xc7..=0xc9`) are routed
//! through an [`msgpack::ExtensionRegistry`]; dates, ULIDs and UUIDs are
//! built in, unknown extension types decode to an opaque [`PackExtension`].

mod pack_value;

pub mod msgpack;

pub use pack_value::{PackExtension, PackValue};
