use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;

use log::debug;
use memmap2::{Mmap, MmapMut, MmapOptions};
use quiver_buffer::ByteBuffer;

use crate::read::{checked_range, to_usize};
use crate::{QuiverReadAt, QuiverSeek, QuiverWrite};

/// A file mapped into memory, either writable with a fixed capacity or read-only.
///
/// Writes past the mapped capacity fail with [`WriteZero`][std::io::ErrorKind::WriteZero]
/// rather than growing the file.
pub struct MemoryMappedFile {
    map: Mapping,
    position: usize,
}

enum Mapping {
    Writable(MmapMut),
    ReadOnly(ByteBuffer),
}

impl MemoryMappedFile {
    /// Create (or truncate) the file at `path`, size it to `capacity` bytes and map it for
    /// writing.
    pub fn create(path: impl AsRef<Path>, capacity: u64) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(capacity)?;
        debug!("mapping {} for writing with capacity {}", path.display(), capacity);
        Self::map_writable(&file)
    }

    /// Map an existing file for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        Self::map_writable(&file)
    }

    /// Map an existing file for reading only.
    pub fn open_read_only(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the mapping is only valid while no other process truncates the file, which
        // callers of the memory-mapped constructors accept.
        let map = unsafe { Mmap::map(&file)? };
        Ok(Self {
            map: Mapping::ReadOnly(ByteBuffer::from(map)),
            position: 0,
        })
    }

    fn map_writable(file: &File) -> io::Result<Self> {
        // SAFETY: see `open_read_only`.
        let map = unsafe { MmapOptions::new().map_mut(file)? };
        Ok(Self {
            map: Mapping::Writable(map),
            position: 0,
        })
    }

    /// The size of the mapping in bytes.
    pub fn capacity(&self) -> usize {
        match &self.map {
            Mapping::Writable(map) => map.len(),
            Mapping::ReadOnly(buffer) => buffer.len(),
        }
    }

    /// Flush outstanding writes and turn the mapping into a zero-copy read-only buffer.
    pub fn freeze(self) -> io::Result<ByteBuffer> {
        match self.map {
            Mapping::Writable(map) => {
                map.flush()?;
                Ok(ByteBuffer::from(map.make_read_only()?))
            }
            Mapping::ReadOnly(buffer) => Ok(buffer),
        }
    }
}

impl QuiverWrite for MemoryMappedFile {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        let Mapping::Writable(map) = &mut self.map else {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory map is read-only",
            ));
        };
        let end = self
            .position
            .checked_add(buffer.len())
            .filter(|end| *end <= map.len())
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!(
                        "write of {} bytes at {} exceeds memory map capacity {}",
                        buffer.len(),
                        self.position,
                        map.len()
                    ),
                )
            })?;
        map[self.position..end].copy_from_slice(buffer);
        self.position = end;
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        match &self.map {
            Mapping::Writable(map) => map.flush(),
            Mapping::ReadOnly(_) => Ok(()),
        }
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.position as u64)
    }
}

impl QuiverSeek for MemoryMappedFile {
    fn seek(&mut self, position: u64) -> io::Result<()> {
        let position = to_usize(position)?;
        if position > self.capacity() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "seek to {} is past memory map capacity {}",
                    position,
                    self.capacity()
                ),
            ));
        }
        self.position = position;
        Ok(())
    }
}

impl QuiverReadAt for MemoryMappedFile {
    fn read_byte_range(&self, offset: u64, len: u64) -> io::Result<ByteBuffer> {
        match &self.map {
            Mapping::Writable(map) => {
                let (start, end) = checked_range(offset, len, map.len() as u64)?;
                Ok(ByteBuffer::copy_from(&map[start..end]))
            }
            Mapping::ReadOnly(buffer) => buffer.read_byte_range(offset, len),
        }
    }

    fn size(&self) -> io::Result<u64> {
        Ok(self.capacity() as u64)
    }
}
