use std::io;

use crate::{QuiverSeek, QuiverWrite};

/// A sink that discards its input and only tracks positions.
///
/// Used to compute the exact size an IPC payload would occupy without materializing it.
#[derive(Debug, Default, Clone)]
pub struct MockOutputStream {
    position: u64,
    extent: u64,
}

impl MockOutputStream {
    /// Create a sink positioned at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// The furthest position any write has reached.
    pub fn extent_bytes_written(&self) -> u64 {
        self.extent
    }
}

impl QuiverWrite for MockOutputStream {
    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        self.position += buffer.len() as u64;
        self.extent = self.extent.max(self.position);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn tell(&mut self) -> io::Result<u64> {
        Ok(self.position)
    }
}

impl QuiverSeek for MockOutputStream {
    fn seek(&mut self, position: u64) -> io::Result<()> {
        self.position = position;
        Ok(())
    }
}
