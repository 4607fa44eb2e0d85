use std::io;

use quiver_buffer::{ByteBuffer, ByteBufferMut};

use crate::read::to_usize;
use crate::{QuiverSeek, QuiverWrite};

/// A growable in-memory sink.
///
/// Seeking backwards overwrites previously written bytes; seeking past the end zero-fills.
#[derive(Debug, Default)]
pub struct BufferOutputStream {
    buffer: ByteBufferMut,
    position: usize,
}

impl BufferOutputStream {
    /// Create an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stream with room for `capacity` bytes.
    pub fn try_with_capacity(capacity: usize) -> io::Result<Self> {
        Ok(Self {
            buffer: ByteBufferMut::try_with_capacity(capacity)?,
            position: 0,
        })
    }

    /// The bytes written so far.
    pub fn as_slice(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// The number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Finish writing, returning the written bytes as an immutable buffer.
    pub fn finish(self) -> ByteBuffer {
        self.buffer.freeze()
    }
}

impl QuiverWrite for BufferOutputStream {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        if self.position == self.buffer.len() {
            self.buffer.try_extend_from_slice(buffer)?;
        } else {
            let end = self.position + buffer.len();
            if end > self.buffer.len() {
                self.buffer.try_resize(end, 0)?;
            }
            self.buffer.as_mut_slice()[self.position..end].copy_from_slice(buffer);
        }
        self.position += buffer.len();
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.position as u64)
    }
}

impl QuiverSeek for BufferOutputStream {
    fn seek(&mut self, position: u64) -> io::Result<()> {
        let position = to_usize(position)?;
        if position > self.buffer.len() {
            self.buffer.try_resize(position, 0)?;
        }
        self.position = position;
        Ok(())
    }
}
