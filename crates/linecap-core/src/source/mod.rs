//! Byte sources feeding the decoder.
//!
//! A source hands out raw bytes in transmission order, at whatever
//! granularity the transport delivers them. Sources do the I/O; the decoder
//! never touches a reader directly.

mod reader;
mod slice;

pub use reader::ReaderSource;
pub use slice::SliceSource;

use thiserror::Error;

/// Default number of bytes requested per read.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

pub trait ByteSource {
    /// Read the next chunk into `buf`.
    ///
    /// Returns `Ok(None)` once the stream has ended and `Ok(Some(0))` when no
    /// bytes are available yet (for example a serial read timeout).
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, SourceError>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, SourceError> {
        (**self).next_chunk(buf)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, SourceError> {
        (**self).next_chunk(buf)
    }
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
