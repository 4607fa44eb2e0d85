#![cfg(target_endian = "little")]
#![deny(missing_docs)]

//! The columnar value model for Quiver.
//!
//! This crate defines the logical type system ([`DType`], [`PType`], [`Field`], [`Schema`]),
//! the physical representation of a column ([`ArrayData`]) and the two units of data that
//! Quiver serializes: [`RecordBatch`] and [`Tensor`].
//!
//! Arrays are immutable, reference counted and cheap to slice: every buffer is a
//! [`quiver_buffer::ByteBuffer`], so an array decoded from a message body or a memory-mapped
//! file points directly into that memory.

pub use batch::*;
pub use data::*;
pub use dtype::*;
pub use field::*;
pub use half;
pub use nullability::*;
pub use ptype::*;
#[doc(hidden)]
pub use quiver_error;
pub use tensor::*;

mod batch;
pub mod bitmap;
mod data;
mod dtype;
mod eq;
mod field;
mod nullability;
mod ptype;
mod tensor;
