mod common;

use quiver_array::RecordBatch;
use quiver_error::{ErrorKind, QuiverResult};
use quiver_io::{BufferOutputStream, BufferReader, MemoryMappedFile, QuiverWrite};
use quiver_ipc::{
    CURRENT_METADATA_VERSION, FileReader, FileWriter, IpcReadOptions, IpcWriteOptions,
    StreamReader, StreamWriter,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// `count` distinct slices of the same batch.
    fn batches(count: usize) -> Vec<RecordBatch> {
        let batch = common::dictionary_batch();
        (0..count)
            .map(|i| batch.slice(i, common::LENGTH - 2 * i).unwrap())
            .collect()
    }

    fn write_file<W: QuiverWrite>(sink: W, batches: &[RecordBatch]) -> QuiverResult<W> {
        let mut writer = FileWriter::try_new(
            sink,
            batches[0].schema().clone(),
            IpcWriteOptions::default(),
        )?;
        for batch in batches {
            writer.write(batch)?;
        }
        assert_eq!(writer.num_record_batches(), batches.len());
        writer.finish()?;
        Ok(writer.into_inner())
    }

    #[test]
    fn file_batches_in_any_order() {
        let batches = batches(5);
        let bytes = write_file(BufferOutputStream::new(), &batches).unwrap().finish();
        let reader = FileReader::try_new(bytes, IpcReadOptions::default()).unwrap();
        assert_eq!(reader.version(), CURRENT_METADATA_VERSION);
        assert_eq!(reader.num_record_batches(), 5);
        assert_eq!(reader.dictionary_memo().len(), 2);
        for i in [3, 0, 4, 1, 2, 3] {
            assert_eq!(reader.get_record_batch(i).unwrap(), batches[i]);
        }
        assert_eq!(
            reader.get_record_batch(5).unwrap_err().kind(),
            ErrorKind::Argument
        );
    }

    #[test]
    fn empty_file() {
        let batches = batches(1);
        let mut writer = FileWriter::try_new(
            BufferOutputStream::new(),
            batches[0].schema().clone(),
            IpcWriteOptions::default(),
        )
        .unwrap();
        writer.finish().unwrap();
        let reader =
            FileReader::try_new(writer.into_inner().finish(), IpcReadOptions::default()).unwrap();
        assert_eq!(reader.num_record_batches(), 0);
        assert_eq!(reader.schema(), batches[0].schema());
    }

    #[test]
    fn file_after_leading_bytes() {
        let batches = batches(3);
        let mut sink = BufferOutputStream::new();
        sink.write_all(b"prefix").unwrap();
        let bytes = write_file(sink, &batches).unwrap().finish();
        assert_eq!(&bytes[..6], b"prefix");

        let reader = FileReader::try_new(bytes.slice(6..), IpcReadOptions::default()).unwrap();
        assert_eq!(reader.num_record_batches(), 3);
        for (i, batch) in batches.iter().enumerate().rev() {
            assert_eq!(&reader.get_record_batch(i).unwrap(), batch);
        }
    }

    #[test]
    fn stream_of_many_batches() {
        let batches = batches(5);
        let mut writer = StreamWriter::try_new(
            BufferOutputStream::new(),
            batches[0].schema().clone(),
            IpcWriteOptions::default(),
        )
        .unwrap();
        for batch in &batches {
            writer.write(batch).unwrap();
        }
        writer.finish().unwrap();

        let mut reader = StreamReader::try_new(
            BufferReader::new(writer.into_inner().finish()),
            IpcReadOptions::default(),
        )
        .unwrap();
        assert_eq!(reader.schema(), batches[0].schema());
        for batch in &batches {
            assert_eq!(&reader.next_record_batch().unwrap().unwrap(), batch);
        }
        assert!(reader.next_record_batch().unwrap().is_none());
        assert!(reader.next_record_batch().unwrap().is_none());
    }

    #[test]
    fn truncated_stream() {
        let batches = batches(2);
        let mut writer = StreamWriter::try_new(
            BufferOutputStream::new(),
            batches[0].schema().clone(),
            IpcWriteOptions::default(),
        )
        .unwrap();
        for batch in &batches {
            writer.write(batch).unwrap();
        }
        let bytes = writer.into_inner().finish();
        let truncated = bytes.slice(..bytes.len() - 9);

        let mut reader =
            StreamReader::try_new(BufferReader::new(truncated), IpcReadOptions::default()).unwrap();
        assert_eq!(reader.next_record_batch().unwrap().unwrap(), batches[0]);
        assert!(reader.next_record_batch().is_err());
        assert!(reader.next_record_batch().unwrap().is_none());
    }

    #[test]
    fn memory_mapped_file() {
        let batches = batches(3);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batches.quiver");

        let mut sink =
            write_file(MemoryMappedFile::create(&path, 1 << 20).unwrap(), &batches).unwrap();
        let written = usize::try_from(sink.tell().unwrap()).unwrap();
        let bytes = sink.freeze().unwrap().slice(..written);

        let reader = FileReader::try_new(bytes, IpcReadOptions::default()).unwrap();
        for (i, batch) in batches.iter().enumerate() {
            assert_eq!(&reader.get_record_batch(i).unwrap(), batch);
        }
    }

    #[test]
    fn standard_file() {
        let batches = batches(2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batches.quiver");

        write_file(std::fs::File::create(&path).unwrap(), &batches).unwrap();
        let reader =
            FileReader::try_new(std::fs::File::open(&path).unwrap(), IpcReadOptions::default())
                .unwrap();
        assert_eq!(reader.get_record_batch(1).unwrap(), batches[1]);

        let mapped = MemoryMappedFile::open_read_only(&path).unwrap();
        let reader = FileReader::try_new(mapped, IpcReadOptions::default()).unwrap();
        assert_eq!(reader.get_record_batch(0).unwrap(), batches[0]);
    }
}
