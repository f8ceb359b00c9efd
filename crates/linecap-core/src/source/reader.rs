use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use super::{ByteSource, DEFAULT_CHUNK_SIZE, SourceError};

/// Byte source over any [`Read`]: files, stdin, serial ports.
///
/// Interrupted reads are retried; timeouts and would-block report "no data
/// yet" instead of ending the stream.
///
/// # Examples
/// ```
/// use std::io::Cursor;
///
/// use linecap_core::{ByteSource, ReaderSource};
///
/// let mut source = ReaderSource::new(Cursor::new(vec![1u8, 2, 3]));
/// let mut buf = [0u8; 8];
/// assert_eq!(source.next_chunk(&mut buf)?, Some(3));
/// assert_eq!(source.next_chunk(&mut buf)?, None);
/// # Ok::<(), linecap_core::SourceError>(())
/// ```
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
    chunk_size: usize,
}

impl ReaderSource<File> {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Cap the number of bytes requested per read (at least 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> ByteSource for ReaderSource<R> {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, SourceError> {
        let len = buf.len().min(self.chunk_size);
        if len == 0 {
            return Ok(Some(0));
        }
        loop {
            match self.inner.read(&mut buf[..len]) {
                Ok(0) => return Ok(None),
                Ok(n) => return Ok(Some(n)),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err)
                    if matches!(err.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) =>
                {
                    return Ok(Some(0));
                }
                Err(err) => return Err(SourceError::Io(err)),
            }
        }
    }
}
