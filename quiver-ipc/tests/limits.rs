mod common;

use std::sync::Arc;

use quiver_array::{ArrayData, ArrayRef, DType, RecordBatch};
use quiver_buffer::ByteBuffer;
use quiver_error::{ErrorKind, QuiverResult};
use quiver_io::{BufferOutputStream, BufferReader, MemoryMappedFile, QuiverWrite};
use quiver_ipc::{
    FileReader, FileWriter, IpcReadOptions, IpcWriteOptions, StreamReader, StreamWriter,
    write_record_batch,
};

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn write_stream(batch: &RecordBatch, options: IpcWriteOptions) -> QuiverResult<ByteBuffer> {
        let mut writer =
            StreamWriter::try_new(BufferOutputStream::new(), batch.schema().clone(), options)?;
        writer.write(batch)?;
        writer.finish()?;
        Ok(writer.into_inner().finish())
    }

    fn read_stream(bytes: ByteBuffer, options: IpcReadOptions) -> QuiverResult<Vec<RecordBatch>> {
        StreamReader::try_new(BufferReader::new(bytes), options)?.collect()
    }

    /// Runs `f` on a thread with enough stack for very deep types.
    fn with_large_stack(f: impl FnOnce() + Send + 'static) {
        std::thread::Builder::new()
            .stack_size(64 << 20)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap();
    }

    #[test]
    fn writing_past_the_default_depth_fails() {
        let batch = common::deeply_nested_list_batch(257);
        let err = StreamWriter::try_new(
            BufferOutputStream::new(),
            batch.schema().clone(),
            IpcWriteOptions::default(),
        )
        .err()
        .unwrap();
        assert!(err.is_invalid_format());

        let err = write_record_batch(&batch, &mut BufferOutputStream::new(), &IpcWriteOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_format());
    }

    #[test]
    fn reading_past_the_configured_depth_fails() {
        let batch = common::deeply_nested_list_batch(64);
        let bytes = write_stream(
            &batch,
            IpcWriteOptions::default().with_max_recursion_depth(65),
        )
        .unwrap();

        let err = read_stream(bytes.clone(), IpcReadOptions::default()).unwrap_err();
        assert!(err.is_invalid_format());

        let batches = read_stream(
            bytes,
            IpcReadOptions::default().with_max_recursion_depth(65),
        )
        .unwrap();
        assert_eq!(batches, vec![batch]);
    }

    #[rstest]
    #[case(100)]
    #[case(500)]
    fn deeply_nested_round_trip(#[case] depth: usize) {
        with_large_stack(move || {
            let batch = common::deeply_nested_list_batch(depth);
            let bytes = write_stream(
                &batch,
                IpcWriteOptions::default().with_max_recursion_depth(depth + 1),
            )
            .unwrap();
            let batches = read_stream(
                bytes,
                IpcReadOptions::default().with_max_recursion_depth(depth + 1),
            )
            .unwrap();
            assert_eq!(batches, vec![batch]);
        });
    }

    #[test]
    fn batches_over_i32_rows_need_64bit_lengths() {
        let rows = 1usize << 31;
        let column: ArrayRef = Arc::new(
            ArrayData::try_new(
                DType::Bool,
                rows,
                None,
                vec![Some(ByteBuffer::zeroed(rows / 8))],
                vec![],
            )
            .unwrap(),
        );
        let batch = common::batch_of(vec![column]);

        let err = write_record_batch(&batch, &mut BufferOutputStream::new(), &IpcWriteOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);

        let dir = tempfile::tempdir().unwrap();
        let sink = MemoryMappedFile::create(dir.path().join("large.quiver"), (rows as u64 / 8) + (1 << 16))
            .unwrap();
        let mut writer = FileWriter::try_new(
            sink,
            batch.schema().clone(),
            IpcWriteOptions::default().with_allow_64bit(true),
        )
        .unwrap();
        writer.write(&batch).unwrap();
        writer.finish().unwrap();

        let mut sink = writer.into_inner();
        let written = usize::try_from(sink.tell().unwrap()).unwrap();
        let bytes = sink.freeze().unwrap().slice(..written);

        let reader = FileReader::try_new(bytes, IpcReadOptions::default()).unwrap();
        let decoded = reader.get_record_batch(0).unwrap();
        assert_eq!(decoded.num_rows(), rows);
        assert_eq!(decoded.column(0).unwrap().len(), rows);
        assert_eq!(decoded.column(0).unwrap().null_count(), 0);
    }
}
