use std::io;

/// A sink that bytes are appended to.
///
/// Every method is blocking: it completes or fails before returning.
pub trait QuiverWrite {
    /// Write the whole of `buffer` at the current position, advancing it.
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()>;

    /// Flush any buffered bytes to the underlying storage.
    fn flush(&mut self) -> io::Result<()>;

    /// The current write position.
    fn tell(&mut self) -> io::Result<u64>;

    /// Flush and release the sink. Writing after closing is an error for sinks that own a
    /// resource.
    fn close(&mut self) -> io::Result<()> {
        self.flush()
    }
}

/// A sink whose write position can be moved.
pub trait QuiverSeek {
    /// Move the write position to `position` bytes from the start.
    fn seek(&mut self, position: u64) -> io::Result<()>;
}

impl<W: QuiverWrite + ?Sized> QuiverWrite for &mut W {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        (**self).write_all(buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        (**self).flush()
    }

    fn tell(&mut self) -> io::Result<u64> {
        (**self).tell()
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<W: QuiverWrite + ?Sized> QuiverWrite for Box<W> {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        W::write_all(self, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        W::flush(self)
    }

    fn tell(&mut self) -> io::Result<u64> {
        W::tell(self)
    }

    fn close(&mut self) -> io::Result<()> {
        W::close(self)
    }
}

impl<S: QuiverSeek + ?Sized> QuiverSeek for &mut S {
    fn seek(&mut self, position: u64) -> io::Result<()> {
        (**self).seek(position)
    }
}
