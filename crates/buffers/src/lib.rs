//! Byte buffer primitives shared by the ecore codecs.
//!
//! - [`Reader`]: bounds-checked big-endian cursor over a byte slice.
//! - [`Writer`]: big-endian writer whose buffer doubles when it runs out of room.
//! - [`concat`] / [`concat_list`]: join chunked input before a synchronous decode.

mod concat;
mod reader;
mod writer;

pub use concat::{concat, concat_list};
pub use reader::Reader;
pub use writer::Writer;

use thiserror::Error;

/// Error returned when a read runs past the end of the buffer.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("end of buffer at offset {offset}: needed {needed} bytes, {remaining} left")]
    EndOfBuffer {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
}
