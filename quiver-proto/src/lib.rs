#![deny(missing_docs)]

//! Protocol buffer definitions for the metadata of Quiver IPC messages.
//!
//! Every frame written by `quiver-ipc` starts with a [`Message`]: a format version, the length
//! of the raw body that follows the metadata, and a header describing either a [`Schema`], a
//! [`RecordBatch`], a [`DictionaryBatch`] or a [`Tensor`]. Files end with a [`Footer`].
//!
//! Schemas are flattened: the fields of nested types follow their parent in depth-first
//! pre-order, so decoding never recurses into attacker-controlled message nesting.

pub use messages::*;
pub use schema::*;

mod messages;
mod schema;
