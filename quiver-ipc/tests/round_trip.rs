mod common;

use std::sync::Arc;

use quiver_array::{ArrayData, ArrayRef, DType, RecordBatch};
use quiver_error::{QuiverResult, quiver_err};
use quiver_io::{BufferOutputStream, BufferReader};
use quiver_ipc::{
    FileReader, FileWriter, IpcReadOptions, IpcWriteOptions, StreamReader, StreamWriter,
    get_record_batch_size, write_record_batch,
};

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn stream_round_trip(batch: &RecordBatch) -> QuiverResult<RecordBatch> {
        let mut writer = StreamWriter::try_new(
            BufferOutputStream::new(),
            batch.schema().clone(),
            IpcWriteOptions::default(),
        )?;
        writer.write(batch)?;
        writer.finish()?;
        let bytes = writer.into_inner().finish();

        let mut reader = StreamReader::try_new(BufferReader::new(bytes), IpcReadOptions::default())?;
        let decoded = reader.next_record_batch()?;
        assert!(reader.next_record_batch()?.is_none());
        decoded.ok_or_else(|| quiver_err!("stream has no batches"))
    }

    fn file_round_trip(batch: &RecordBatch) -> QuiverResult<RecordBatch> {
        let mut writer = FileWriter::try_new(
            BufferOutputStream::new(),
            batch.schema().clone(),
            IpcWriteOptions::default(),
        )?;
        writer.write(batch)?;
        writer.finish()?;
        let bytes = writer.into_inner().finish();

        let reader = FileReader::try_new(bytes, IpcReadOptions::default())?;
        assert_eq!(reader.num_record_batches(), 1);
        reader.get_record_batch(0)
    }

    #[rstest]
    #[case::ints(common::int_batch())]
    #[case::non_null(common::non_null_batch())]
    #[case::booleans(common::boolean_batch())]
    #[case::strings(common::strings_batch())]
    #[case::fixed_width_binary(common::fixed_width_binary_batch())]
    #[case::lists(common::list_batch())]
    #[case::deeply_nested_lists(common::deeply_nested_list_batch(10))]
    #[case::structs(common::struct_batch())]
    #[case::unions(common::union_batch())]
    #[case::dictionaries(common::dictionary_batch())]
    #[case::dates(common::dates_batch())]
    #[case::timestamps(common::timestamps_batch())]
    #[case::times(common::times_batch())]
    #[case::nulls(common::null_batch())]
    #[case::zero_length(common::zero_length_batch())]
    fn round_trip(#[case] batch: RecordBatch) {
        assert_eq!(stream_round_trip(&batch).unwrap(), batch);
        assert_eq!(file_round_trip(&batch).unwrap(), batch);
    }

    #[rstest]
    #[case::ints(common::int_batch())]
    #[case::strings(common::strings_batch())]
    #[case::lists(common::list_batch())]
    #[case::structs(common::struct_batch())]
    #[case::unions(common::union_batch())]
    #[case::dictionaries(common::dictionary_batch())]
    fn sliced_round_trip(#[case] batch: RecordBatch) {
        for (offset, len) in [(0, 10), (7, 20), (common::LENGTH - 3, 3), (13, 0)] {
            let slice = batch.slice(offset, len).unwrap();
            assert_eq!(stream_round_trip(&slice).unwrap(), slice);
        }
    }

    #[rstest]
    #[case::ints(common::int_batch())]
    #[case::strings(common::strings_batch())]
    #[case::lists(common::list_batch())]
    #[case::unions(common::union_batch())]
    #[case::zero_length(common::zero_length_batch())]
    fn size_prediction(#[case] batch: RecordBatch) {
        let options = IpcWriteOptions::default();
        let mut sink = BufferOutputStream::new();
        let lengths = write_record_batch(&batch, &mut sink, &options).unwrap();
        assert_eq!(lengths.total(), sink.len() as u64);
        assert_eq!(get_record_batch_size(&batch, &options).unwrap(), lengths.total());
    }

    #[test]
    fn sliced_batch_is_smaller() {
        let batch = common::strings_batch();
        let options = IpcWriteOptions::default();
        let full = get_record_batch_size(&batch, &options).unwrap();
        let slice = get_record_batch_size(&batch.slice(10, 5).unwrap(), &options).unwrap();
        assert!(slice < full);
    }

    #[test]
    fn zero_length_offsets_may_be_absent() {
        let absent: ArrayRef = Arc::new(
            ArrayData::try_new(DType::Binary, 0, None, vec![None, None], vec![]).unwrap(),
        );
        let trivial: ArrayRef = Arc::new(ArrayData::from_binary(
            Vec::<Vec<u8>>::new().into_iter().map(Some),
        ));
        assert_eq!(absent, trivial);

        let batch = common::batch_of(vec![absent.clone(), trivial]);
        let decoded = stream_round_trip(&batch).unwrap();
        assert_eq!(decoded, batch);
        assert_eq!(decoded.column(0).unwrap().len(), 0);
    }

    #[test]
    fn shared_dictionaries_stay_shared() {
        let batch = common::dictionary_batch();
        for decoded in [
            stream_round_trip(&batch).unwrap(),
            file_round_trip(&batch).unwrap(),
        ] {
            let first = decoded.column(0).unwrap().dtype().as_dictionary().unwrap();
            let nested = decoded.column(1).unwrap().dtype().as_list_element().unwrap();
            let nested = nested.dtype().as_dictionary().unwrap();
            let other = decoded.column(2).unwrap().dtype().as_dictionary().unwrap();
            assert!(first.same_dictionary(nested));
            assert!(!first.same_dictionary(other));
        }
    }

    #[test]
    fn several_batches_share_dictionaries() {
        let batch = common::dictionary_batch();
        let mut writer = StreamWriter::try_new(
            BufferOutputStream::new(),
            batch.schema().clone(),
            IpcWriteOptions::default(),
        )
        .unwrap();
        writer.write(&batch).unwrap();
        writer.write(&batch.slice(5, 10).unwrap()).unwrap();
        writer.finish().unwrap();

        let reader = StreamReader::try_new(
            BufferReader::new(writer.into_inner().finish()),
            IpcReadOptions::default(),
        )
        .unwrap();
        assert_eq!(reader.dictionary_memo().len(), 2);
        let batches = reader.collect::<QuiverResult<Vec<_>>>().unwrap();
        assert_eq!(batches, vec![batch.clone(), batch.slice(5, 10).unwrap()]);
    }
}
