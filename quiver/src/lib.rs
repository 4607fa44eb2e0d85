//! Columnar record batches and tensors, and the IPC formats to move them between processes.
//!
//! ```
//! use std::sync::Arc;
//!
//! use quiver::io::{BufferOutputStream, BufferReader};
//! use quiver::ipc::{IpcReadOptions, IpcWriteOptions, StreamReader, StreamWriter};
//! use quiver::{ArrayData, ArrayRef, RecordBatch, Schema, DType, Field, PType};
//!
//! let schema = Arc::new(Schema::new(vec![Field::nullable("x", DType::Primitive(PType::I32))]));
//! let column: ArrayRef = Arc::new(ArrayData::from_primitive([Some(1i32), None, Some(3)]));
//! let batch = RecordBatch::try_new(schema.clone(), 3, vec![column]).unwrap();
//!
//! let mut writer =
//!     StreamWriter::try_new(BufferOutputStream::new(), schema, IpcWriteOptions::default()).unwrap();
//! writer.write(&batch).unwrap();
//! writer.finish().unwrap();
//!
//! let bytes = writer.into_inner().finish();
//! let mut reader = StreamReader::try_new(BufferReader::new(bytes), IpcReadOptions::default()).unwrap();
//! assert_eq!(reader.next_record_batch().unwrap(), Some(batch));
//! ```

pub use quiver_array::*;
pub use {
    quiver_buffer as buffer, quiver_error as error, quiver_io as io, quiver_ipc as ipc,
    quiver_proto as proto,
};
