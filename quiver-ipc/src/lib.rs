#![deny(missing_docs)]

//! Quiver IPC messages and the stream and file formats built from them.
//!
//! Every unit on the wire is a framed [`Message`]: a little-endian `u32` giving the padded
//! length of a protobuf metadata block, the metadata itself padded so that it ends on an
//! 8-byte boundary, and then a body of raw buffers, each padded to 8 bytes. The metadata
//! describes what the body holds (a schema, a dictionary, a record batch or a tensor) and
//! where each buffer lies within it, so a reader can slice arrays directly out of the body
//! without copying.
//!
//! On top of single messages this crate provides:
//!
//! * the stream format ([`StreamWriter`], [`StreamReader`]): a schema message, dictionary
//!   batches, record batches and an end-of-stream marker, read front to back;
//! * the file format ([`FileWriter`], [`FileReader`]): the same messages between leading and
//!   trailing magic bytes, indexed by a footer for random access to any batch;
//! * the tensor codec ([`write_tensor`], [`read_tensor`]).
//!
//! Nested types are encoded and decoded with an explicit nesting budget (see
//! [`IpcWriteOptions::with_max_recursion_depth`]) so that untrusted input cannot recurse
//! deeper than the caller allows.

pub use batch::*;
pub use dictionary::*;
pub use file::*;
pub use messages::*;
pub use options::*;
pub use schema::*;
pub use stream::*;
pub use tensor::*;

mod batch;
mod depth;
mod dictionary;
mod file;
mod messages;
mod options;
mod schema;
mod stream;
mod tensor;

/// The alignment of metadata blocks and body buffers within a message.
pub const ALIGNMENT: usize = 8;

/// The magic bytes at the start and end of a Quiver IPC file.
pub const MAGIC: &[u8; 6] = b"QUIVER";

/// The default limit on the nesting depth of types and arrays.
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 64;

pub use quiver_proto::MetadataVersion;

/// The metadata version written by this crate.
pub const CURRENT_METADATA_VERSION: MetadataVersion = MetadataVersion::V3;
