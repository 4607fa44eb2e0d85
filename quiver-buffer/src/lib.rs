#![deny(missing_docs)]

//! A byte buffer implementation for Quiver.
//!
//! Every column buffer, message body and memory-mapped region in Quiver is held as a
//! [`ByteBuffer`]: an immutable, reference-counted view over a contiguous range of bytes.
//! Slicing and cloning never copy, which is what allows a record batch to be decoded as a set
//! of views into the message body it was read from.
//!
//! # Alignment
//!
//! The IPC format pads every buffer to an 8-byte boundary relative to the start of the message
//! body. [`Alignment`] describes such boundaries and computes the padding needed to reach them.

pub use alignment::*;
pub use buffer::*;
pub use buffer_mut::*;

mod alignment;
mod buffer;
mod buffer_mut;
mod debug;
#[cfg(feature = "memmap2")]
mod memmap2;

/// A static run of zero bytes, large enough to pad to any supported alignment.
pub static PADDING: [u8; 64] = [0; 64];
