use quiver_buffer::Alignment;

use crate::{ALIGNMENT, DEFAULT_MAX_RECURSION_DEPTH};

/// Options for writing IPC messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpcWriteOptions {
    max_recursion_depth: usize,
    allow_64bit: bool,
    alignment: Alignment,
}

impl Default for IpcWriteOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            allow_64bit: false,
            alignment: Alignment::new(ALIGNMENT),
        }
    }
}

impl IpcWriteOptions {
    /// Set the maximum nesting depth of the types and arrays that may be written.
    ///
    /// A reader must be configured with at least the same depth to read the messages back.
    pub fn with_max_recursion_depth(mut self, max_recursion_depth: usize) -> Self {
        self.max_recursion_depth = max_recursion_depth;
        self
    }

    /// Allow record batches with more rows than fit in an `i32`.
    pub fn with_allow_64bit(mut self, allow_64bit: bool) -> Self {
        self.allow_64bit = allow_64bit;
        self
    }

    /// Set the alignment of body buffers. Alignments below 8 bytes are raised to 8.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment.max(Alignment::new(ALIGNMENT));
        self
    }

    /// The maximum nesting depth.
    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }

    /// Whether batches with more than `i32::MAX` rows may be written.
    pub fn allow_64bit(&self) -> bool {
        self.allow_64bit
    }

    /// The alignment of body buffers.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }
}

/// Options for reading IPC messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpcReadOptions {
    max_recursion_depth: usize,
}

impl Default for IpcReadOptions {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl IpcReadOptions {
    /// Set the maximum nesting depth of the types and arrays that may be read.
    pub fn with_max_recursion_depth(mut self, max_recursion_depth: usize) -> Self {
        self.max_recursion_depth = max_recursion_depth;
        self
    }

    /// The maximum nesting depth.
    pub fn max_recursion_depth(&self) -> usize {
        self.max_recursion_depth
    }
}
