use std::io;
use std::io::Read;
use std::sync::Arc;

use bytes::Bytes;
use quiver_buffer::{ByteBuffer, ByteBufferMut};

/// A source that supports stateless positioned reads.
///
/// Positioned reads never move a cursor, so any number of readers may share one source.
pub trait QuiverReadAt {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// If the source does not have the requested number of bytes, the read fails with
    /// [`UnexpectedEof`][std::io::ErrorKind::UnexpectedEof].
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer>;

    /// The number of bytes readable from this source.
    fn size(&self) -> io::Result<u64>;
}

/// A source that is read sequentially, such as a pipe or socket.
pub trait QuiverRead {
    /// Read up to `len` bytes. Fewer bytes are returned only when the end of the source is
    /// reached.
    fn read_up_to(&mut self, len: u64) -> io::Result<ByteBuffer>;

    /// Read exactly `len` bytes, failing with
    /// [`UnexpectedEof`][std::io::ErrorKind::UnexpectedEof] if the source ends first.
    fn read_bytes(&mut self, len: u64) -> io::Result<ByteBuffer> {
        let bytes = self.read_up_to(len)?;
        if (bytes.len() as u64) < len {
            return Err(unexpected_eof(len, bytes.len() as u64));
        }
        Ok(bytes)
    }
}

pub(crate) fn unexpected_eof(requested: u64, available: u64) -> io::Error {
    io::Error::new(
        io::ErrorKind::UnexpectedEof,
        format!(
            "unexpected eof: requested {} bytes but only {} are available",
            requested, available
        ),
    )
}

pub(crate) fn checked_range(offset: u64, len: u64, size: u64) -> io::Result<(usize, usize)> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok((to_usize(offset)?, to_usize(end)?)),
        _ => Err(unexpected_eof(len, size.saturating_sub(offset))),
    }
}

pub(crate) fn to_usize(value: u64) -> io::Result<usize> {
    usize::try_from(value).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} does not fit in the address space", value),
        )
    })
}

impl<T: QuiverReadAt + ?Sized> QuiverReadAt for Arc<T> {
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer> {
        T::read_byte_range(self, offset, len)
    }

    fn size(&self) -> io::Result<u64> {
        T::size(self)
    }
}

impl<T: QuiverReadAt + ?Sized> QuiverReadAt for &T {
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer> {
        T::read_byte_range(self, offset, len)
    }

    fn size(&self) -> io::Result<u64> {
        T::size(self)
    }
}

impl QuiverReadAt for ByteBuffer {
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer> {
        let (start, end) = checked_range(offset, len, self.len() as u64)?;
        Ok(self.slice(start..end))
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

impl QuiverReadAt for Bytes {
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer> {
        let (start, end) = checked_range(offset, len, self.len() as u64)?;
        Ok(ByteBuffer::from(self.slice(start..end)))
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.len() as u64)
    }
}

/// Adapts any [`std::io::Read`] into a [`QuiverRead`].
pub struct QuiverReadAdapter<R> {
    inner: R,
}

impl<R: Read> QuiverReadAdapter<R> {
    /// Wrap a reader.
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

// Lengths may come from untrusted metadata, so never reserve more than this up front.
const MAX_INITIAL_RESERVATION: u64 = 1 << 20;

impl<R: Read> QuiverRead for QuiverReadAdapter<R> {
    fn read_up_to(&mut self, len: u64) -> io::Result<ByteBuffer> {
        let reservation = to_usize(len.min(MAX_INITIAL_RESERVATION))?;
        let mut buffer = ByteBufferMut::try_with_capacity(reservation)?.into_vec();
        (&mut self.inner).take(len).read_to_end(&mut buffer)?;
        Ok(ByteBuffer::from(buffer))
    }
}
