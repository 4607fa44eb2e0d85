use std::fs::File;
use std::io;
use std::io::{Seek, SeekFrom, Write};

use quiver_buffer::{ByteBuffer, ByteBufferMut};

use crate::read::{to_usize, unexpected_eof};
use crate::{QuiverReadAt, QuiverSeek, QuiverWrite};

impl QuiverWrite for File {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        Write::write_all(self, buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn tell(&mut self) -> io::Result<u64> {
        self.stream_position()
    }

    fn close(&mut self) -> io::Result<()> {
        Write::flush(self)?;
        self.sync_all()
    }
}

impl QuiverSeek for File {
    fn seek(&mut self, position: u64) -> io::Result<()> {
        Seek::seek(self, SeekFrom::Start(position)).map(|_| ())
    }
}

impl QuiverReadAt for File {
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer> {
        let size = self.size()?;
        if offset.checked_add(len).is_none_or(|end| end > size) {
            return Err(unexpected_eof(len, size.saturating_sub(offset)));
        }
        let mut buffer = ByteBufferMut::try_zeroed(to_usize(len)?)?;
        read_exact_at(self, buffer.as_mut_slice(), offset)?;
        Ok(buffer.freeze())
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buffer: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;

    file.read_exact_at(buffer, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buffer: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buffer.is_empty() {
        match file.seek_read(buffer, offset) {
            Ok(0) => return Err(unexpected_eof(buffer.len() as u64, 0)),
            Ok(n) => {
                buffer = &mut buffer[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
