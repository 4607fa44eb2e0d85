#![deny(missing_docs)]

//! Core traits and implementations for blocking IO.
//!
//! Quiver reads and writes its IPC stream and file formats through a small capability
//! interface rather than through any particular storage type:
//!
//! * [`QuiverWrite`]: append bytes, report the current position, flush and close.
//! * [`QuiverSeek`]: move the write position.
//! * [`QuiverReadAt`]: stateless positioned reads returning zero-copy [`ByteBuffer`]s where the
//!   source allows it.
//! * [`QuiverRead`]: sequential reads, used by the stream format.
//!
//! Implementations are provided for growable in-memory buffers, byte buffers, standard files
//! and memory-mapped files, plus [`MockOutputStream`] which only counts the bytes written to
//! it.
//!
//! [`ByteBuffer`]: quiver_buffer::ByteBuffer

pub use buf::*;
pub use memory::*;
pub use mmap::*;
pub use mock::*;
pub use read::*;
pub use write::*;

mod buf;
mod file;
mod memory;
mod mmap;
mod mock;
mod read;
mod write;
