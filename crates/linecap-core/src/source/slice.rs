use super::{ByteSource, SourceError};

/// In-memory byte source that replays a buffer in fixed-size chunks.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    data: &'a [u8],
    chunk_size: usize,
}

impl<'a> SliceSource<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            chunk_size: data.len().max(1),
        }
    }

    /// Serve at most `chunk_size` bytes per call (at least 1).
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }
}

impl ByteSource for SliceSource<'_> {
    fn next_chunk(&mut self, buf: &mut [u8]) -> Result<Option<usize>, SourceError> {
        if self.data.is_empty() {
            return Ok(None);
        }
        let len = self.data.len().min(self.chunk_size).min(buf.len());
        let (head, tail) = self.data.split_at(len);
        buf[..len].copy_from_slice(head);
        self.data = tail;
        Ok(Some(len))
    }
}
