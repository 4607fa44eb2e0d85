use std::io;

use quiver_buffer::ByteBuffer;

use crate::{QuiverRead, QuiverReadAt};

/// A cursor over a [stateless reader][QuiverReadAt].
///
/// Read operations advance the cursor.
#[derive(Clone)]
pub struct QuiverBufReader<R> {
    inner: R,
    pos: u64,
}

/// A sequential reader over an in-memory buffer.
pub type BufferReader = QuiverBufReader<ByteBuffer>;

impl<R> QuiverBufReader<R> {
    /// Wrap a stateless reader, with reads beginning at offset 0.
    pub fn new(inner: R) -> Self {
        Self { inner, pos: 0 }
    }

    /// Set the position of the next read.
    ///
    /// Positions past the end are accepted here and fail at read time with
    /// [`UnexpectedEof`][std::io::ErrorKind::UnexpectedEof].
    pub fn set_position(&mut self, pos: u64) {
        self.pos = pos;
    }

    /// The position of the next read.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// The wrapped reader.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Unwrap the reader.
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: QuiverReadAt> QuiverRead for QuiverBufReader<R> {
    fn read_up_to(&mut self, len: u64) -> io::Result<ByteBuffer> {
        let available = self.inner.size()?.saturating_sub(self.pos);
        let len = len.min(available);
        let result = self.inner.read_byte_range(self.pos, len)?;
        self.pos += len;
        Ok(result)
    }

    fn read_bytes(&mut self, len: u64) -> io::Result<ByteBuffer> {
        let result = self.inner.read_byte_range(self.pos, len)?;
        self.pos += len;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use quiver_buffer::ByteBuffer;

    use crate::{BufferReader, QuiverRead};

    #[test]
    fn buf_reader() {
        let mut reader = BufferReader::new(ByteBuffer::from("0123456789"));

        let first2 = reader.read_bytes(2).unwrap();
        assert_eq!(first2.as_slice(), b"01");

        reader.set_position(8);
        let last2 = reader.read_bytes(2).unwrap();
        assert_eq!(last2.as_slice(), b"89");
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn eof() {
        let mut reader = BufferReader::new(ByteBuffer::from("0123456789"));
        reader.set_position(10);
        assert_eq!(
            reader.read_bytes(1).unwrap_err().kind(),
            io::ErrorKind::UnexpectedEof,
        );
        assert!(reader.read_up_to(4).unwrap().is_empty());

        reader.set_position(7);
        assert_eq!(reader.read_up_to(8).unwrap().as_slice(), b"789");
        assert_eq!(reader.position(), 10);
    }

    #[test]
    fn failed_read_keeps_position() {
        let mut reader = BufferReader::new(ByteBuffer::from("0123"));
        reader.set_position(2);
        assert!(reader.read_bytes(3).is_err());
        assert_eq!(reader.position(), 2);
    }
}
