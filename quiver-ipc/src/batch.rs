use std::collections::HashMap;
use std::slice;
use std::sync::Arc;

use quiver_array::bitmap::slice_bitmap;
use quiver_array::{ArrayData, ArrayRef, DType, Field, RecordBatch, SchemaRef, UnionMode};
use quiver_buffer::{ByteBuffer, ByteBufferMut};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_io::{MockOutputStream, QuiverWrite};
use quiver_proto as pb;

use crate::depth::RecursionBudget;
use crate::{
    DictionaryMemo, FrameLengths, IpcReadOptions, IpcWriteOptions, Message, MessageBody,
    write_message,
};

/// Frame `batch` as a record batch message and write it to `sink`.
///
/// Dictionary-encoded columns are written as indices only; their dictionaries travel in
/// separate dictionary batch messages (see [`write_dictionary_batch`]).
///
/// Batches with more than `i32::MAX` rows are rejected unless
/// [`IpcWriteOptions::with_allow_64bit`] is set.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn write_record_batch<W: QuiverWrite>(
    batch: &RecordBatch,
    sink: &mut W,
    options: &IpcWriteOptions,
) -> QuiverResult<FrameLengths> {
    let (header, body) = encode_record_batch(batch, None, options)?;
    write_message(
        pb::message::Header::RecordBatch(header),
        &body,
        options.alignment(),
        sink,
    )
}

/// The number of bytes [`write_record_batch`] would write for `batch` at the start of a sink.
pub fn get_record_batch_size(batch: &RecordBatch, options: &IpcWriteOptions) -> QuiverResult<u64> {
    let mut sink = MockOutputStream::new();
    write_record_batch(batch, &mut sink, options)?;
    Ok(sink.extent_bytes_written())
}

/// Decode the record batch carried by `message`, whose columns have the types of `schema`.
///
/// Every buffer is a zero-copy slice of the message body.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn read_record_batch(
    message: &Message,
    schema: &SchemaRef,
    options: &IpcReadOptions,
) -> QuiverResult<RecordBatch> {
    let header = message.expect_record_batch()?;
    let dtypes = schema.fields().iter().map(Field::dtype);
    let (num_rows, columns) = decode_columns(header, message.body(), dtypes, options)?;
    RecordBatch::try_new(schema.clone(), num_rows, columns)
}

/// Frame the values of dictionary `id` as a dictionary batch message and write it to `sink`.
pub fn write_dictionary_batch<W: QuiverWrite>(
    id: i64,
    dictionary: &ArrayRef,
    sink: &mut W,
    options: &IpcWriteOptions,
) -> QuiverResult<FrameLengths> {
    check_row_count(dictionary.len(), options)?;
    let mut encoder = BatchEncoder::new(None, options);
    encoder.visit(dictionary, RecursionBudget::new(options.max_recursion_depth()))?;
    let (data, body) = encoder.finish(dictionary.len())?;
    let header = pb::DictionaryBatch {
        id,
        data: Some(data),
    };
    write_message(
        pb::message::Header::DictionaryBatch(header),
        &body,
        options.alignment(),
        sink,
    )
}

/// Decode the dictionary carried by `message`, returning its id and values.
///
/// `dictionary_types` gives the value field of every dictionary id a schema references, as
/// returned by [`crate::get_dictionary_types`].
pub fn read_dictionary_batch(
    message: &Message,
    dictionary_types: &HashMap<i64, Field>,
    options: &IpcReadOptions,
) -> QuiverResult<(i64, ArrayRef)> {
    let header = message.expect_dictionary_batch()?;
    let Some(value_field) = dictionary_types.get(&header.id) else {
        quiver_bail!(
            InvalidFormat: "dictionary batch {} is not referenced by the schema",
            header.id
        )
    };
    let Some(data) = &header.data else {
        quiver_bail!(InvalidFormat: "dictionary batch {} has no data", header.id)
    };
    let (_, mut columns) = decode_columns(
        data,
        message.body(),
        [value_field.dtype()].into_iter(),
        options,
    )?;
    let dictionary = columns
        .pop()
        .ok_or_else(|| quiver_err!(InvalidFormat: "dictionary batch {} is empty", header.id))?;
    log::debug!(
        "read dictionary {} of {} {} values",
        header.id,
        dictionary.len(),
        dictionary.dtype()
    );
    Ok((header.id, dictionary))
}

/// Encode the columns of `batch`, checking each dictionary against `memo` when given.
pub(crate) fn encode_record_batch(
    batch: &RecordBatch,
    memo: Option<&DictionaryMemo>,
    options: &IpcWriteOptions,
) -> QuiverResult<(pb::RecordBatch, MessageBody)> {
    check_row_count(batch.num_rows(), options)?;
    let mut encoder = BatchEncoder::new(memo, options);
    let budget = RecursionBudget::new(options.max_recursion_depth());
    for column in batch.columns() {
        encoder.visit(column, budget)?;
    }
    encoder.finish(batch.num_rows())
}

fn check_row_count(num_rows: usize, options: &IpcWriteOptions) -> QuiverResult<()> {
    if i32::try_from(num_rows).is_err() && !options.allow_64bit() {
        quiver_bail!(
            InvalidFormat: "cannot write {} rows in one message without allowing 64-bit lengths",
            num_rows
        )
    }
    Ok(())
}

fn to_i64(value: usize) -> QuiverResult<i64> {
    i64::try_from(value).map_err(|_| quiver_err!("length {} does not fit in an i64", value))
}

/// Flattens arrays into field nodes and body buffers in depth-first pre-order.
struct BatchEncoder<'a> {
    memo: Option<&'a DictionaryMemo>,
    nodes: Vec<pb::FieldNode>,
    buffers: Vec<pb::Buffer>,
    body: MessageBody,
}

impl<'a> BatchEncoder<'a> {
    fn new(memo: Option<&'a DictionaryMemo>, options: &IpcWriteOptions) -> Self {
        Self {
            memo,
            nodes: vec![],
            buffers: vec![],
            body: MessageBody::new(options.alignment()),
        }
    }

    fn finish(self, num_rows: usize) -> QuiverResult<(pb::RecordBatch, MessageBody)> {
        let header = pb::RecordBatch {
            length: to_i64(num_rows)?,
            nodes: self.nodes,
            buffers: self.buffers,
        };
        Ok((header, self.body))
    }

    fn push(&mut self, buffer: ByteBuffer) -> QuiverResult<()> {
        let location = self.body.push(buffer)?;
        self.buffers.push(location);
        Ok(())
    }

    /// Write the window `[offset, offset + len)` of `array`, rebased to start at zero.
    fn visit(&mut self, array: &ArrayData, budget: RecursionBudget) -> QuiverResult<()> {
        let children_budget = budget.descend()?;
        self.nodes.push(pb::FieldNode {
            length: to_i64(array.len())?,
            null_count: to_i64(array.null_count())?,
        });
        if matches!(array.dtype(), DType::Null) {
            return Ok(());
        }

        let (offset, len) = (array.offset(), array.len());
        let validity = match array.validity() {
            Some(validity) if array.null_count() > 0 => slice_bitmap(validity, offset, len),
            _ => ByteBuffer::empty(),
        };
        self.push(validity)?;

        match array.dtype() {
            DType::Null => {}
            DType::Bool => self.push(slice_bitmap(&array.buffer(0), offset, len))?,
            DType::Primitive(_)
            | DType::FixedSizeBinary(_)
            | DType::Date(_)
            | DType::Time(_)
            | DType::Timestamp(..) => {
                let width = array.dtype().value_width().unwrap_or_default();
                self.push(array.buffer(0).slice(offset * width..(offset + len) * width))?;
            }
            DType::Dictionary(dict) => {
                if let Some(memo) = self.memo {
                    memo.get_id(dict.dictionary())?;
                }
                let width = dict.index().byte_width();
                self.push(array.buffer(0).slice(offset * width..(offset + len) * width))?;
            }
            DType::Utf8 | DType::Binary => {
                let (offsets, values) = rebased_offsets(array);
                self.push(offsets)?;
                self.push(array.buffer(1).slice(values))?;
            }
            DType::List(_) => {
                let (offsets, elements) = rebased_offsets(array);
                self.push(offsets)?;
                let child = array.children()[0].slice(elements.start, elements.len())?;
                self.visit(&child, children_budget)?;
            }
            DType::Struct(_) => {
                for child in array.children() {
                    self.visit(&child.slice(offset, len)?, children_budget)?;
                }
            }
            DType::Union(union) => {
                self.push(array.buffer(0).slice(offset..offset + len))?;
                match union.mode() {
                    UnionMode::Sparse => {
                        for child in array.children() {
                            self.visit(&child.slice(offset, len)?, children_budget)?;
                        }
                    }
                    UnionMode::Dense => {
                        self.push(array.buffer(1).slice(offset * 4..(offset + len) * 4))?;
                        for child in array.children() {
                            self.visit(child, children_budget)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// The offsets of a variable-length array rebased to start at zero, and the range of values
/// they address.
fn rebased_offsets(array: &ArrayData) -> (ByteBuffer, std::ops::Range<usize>) {
    if array.is_empty() {
        return (ByteBuffer::empty(), 0..0);
    }
    let first = array.value_offset(0);
    let last = array.value_offset(array.len());
    if first == 0 {
        let start = array.offset() * 4;
        let offsets = array.buffer(0).slice(start..start + (array.len() + 1) * 4);
        return (offsets, 0..last);
    }
    let mut offsets = ByteBufferMut::from(Vec::with_capacity((array.len() + 1) * 4));
    for i in 0..=array.len() {
        // Rebased offsets are bounded by the original i32 offsets.
        #[allow(clippy::cast_possible_truncation)]
        let rebased = (array.value_offset(i) - first) as i32;
        offsets.extend(rebased.to_le_bytes());
    }
    (offsets.freeze(), first..last)
}

fn decode_columns<'a>(
    header: &pb::RecordBatch,
    body: &ByteBuffer,
    dtypes: impl Iterator<Item = &'a DType>,
    options: &IpcReadOptions,
) -> QuiverResult<(usize, Vec<ArrayRef>)> {
    let num_rows = usize::try_from(header.length).map_err(|_| {
        quiver_err!(InvalidFormat: "record batch has negative length {}", header.length)
    })?;
    let mut decoder = BatchDecoder {
        nodes: header.nodes.iter(),
        buffers: header.buffers.iter(),
        body,
    };
    let budget = RecursionBudget::new(options.max_recursion_depth());
    let columns = dtypes
        .map(|dtype| decoder.read_array(dtype, budget))
        .collect::<QuiverResult<Vec<_>>>()?;
    if !decoder.nodes.as_slice().is_empty() || !decoder.buffers.as_slice().is_empty() {
        quiver_bail!(
            InvalidFormat: "record batch has {} unused field nodes and {} unused buffers",
            decoder.nodes.len(),
            decoder.buffers.len()
        )
    }
    Ok((num_rows, columns))
}

/// Rebuilds arrays from field nodes and body buffers in depth-first pre-order.
struct BatchDecoder<'a> {
    nodes: slice::Iter<'a, pb::FieldNode>,
    buffers: slice::Iter<'a, pb::Buffer>,
    body: &'a ByteBuffer,
}

impl BatchDecoder<'_> {
    fn next_node(&mut self) -> QuiverResult<(usize, usize)> {
        let Some(node) = self.nodes.next() else {
            quiver_bail!(InvalidFormat: "record batch has fewer field nodes than its schema")
        };
        match (usize::try_from(node.length), usize::try_from(node.null_count)) {
            (Ok(length), Ok(null_count)) if null_count <= length => Ok((length, null_count)),
            _ => quiver_bail!(
                InvalidFormat: "invalid field node of length {} with {} nulls",
                node.length,
                node.null_count
            ),
        }
    }

    fn next_buffer(&mut self) -> QuiverResult<ByteBuffer> {
        let Some(buffer) = self.buffers.next() else {
            quiver_bail!(InvalidFormat: "record batch has fewer buffers than its schema")
        };
        match (u64::try_from(buffer.offset), u64::try_from(buffer.length)) {
            (Ok(offset), Ok(length)) => self.body.try_slice(offset, length),
            _ => quiver_bail!(
                InvalidFormat: "invalid buffer extent {}+{}",
                buffer.offset,
                buffer.length
            ),
        }
    }

    fn read_array(&mut self, dtype: &DType, budget: RecursionBudget) -> QuiverResult<ArrayRef> {
        let children_budget = budget.descend()?;
        let (len, null_count) = self.next_node()?;
        if matches!(dtype, DType::Null) {
            if null_count != len {
                quiver_bail!(
                    InvalidFormat: "null array of length {} declares {} nulls",
                    len,
                    null_count
                )
            }
            return Ok(Arc::new(ArrayData::new_null(len)));
        }

        let validity = self.next_buffer()?;
        let validity = (null_count > 0).then_some(validity);
        let (num_buffers, _) = quiver_array::expected_layout(dtype);
        let buffers = (0..num_buffers)
            .map(|_| self.next_buffer().map(Some))
            .collect::<QuiverResult<Vec<_>>>()?;
        let children = dtype
            .children()
            .iter()
            .map(|field| self.read_array(field.dtype(), children_budget))
            .collect::<QuiverResult<Vec<_>>>()?;

        let array = ArrayData::try_new(dtype.clone(), len, validity, buffers, children)?;
        if array.null_count() != null_count {
            quiver_bail!(
                InvalidFormat: "{} array declares {} nulls but its validity holds {}",
                dtype,
                null_count,
                array.null_count()
            )
        }
        Ok(Arc::new(array))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiver_array::{ArrayData, ArrayRef, DType, Field, PType, RecordBatch, Schema};
    use quiver_error::ErrorKind;
    use quiver_io::BufferOutputStream;

    use super::*;

    fn batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::nullable("a", DType::Primitive(PType::I32)),
            Field::nullable("b", DType::Utf8),
        ]));
        let a: ArrayRef = Arc::new(ArrayData::from_primitive([Some(1i32), None, Some(3)]));
        let b: ArrayRef = Arc::new(ArrayData::from_utf8([Some("x"), Some("yy"), None]));
        RecordBatch::try_new(schema, 3, vec![a, b]).unwrap()
    }

    fn round_trip(batch: &RecordBatch) -> RecordBatch {
        let mut sink = BufferOutputStream::new();
        write_record_batch(batch, &mut sink, &IpcWriteOptions::default()).unwrap();
        let message = Message::open(&sink.finish(), 0).unwrap();
        read_record_batch(&message, batch.schema(), &IpcReadOptions::default()).unwrap()
    }

    #[test]
    fn layout_is_pre_order() {
        let (header, body) =
            encode_record_batch(&batch(), None, &IpcWriteOptions::default()).unwrap();
        assert_eq!(header.length, 3);
        assert_eq!(
            header
                .nodes
                .iter()
                .map(|n| (n.length, n.null_count))
                .collect::<Vec<_>>(),
            vec![(3, 1), (3, 1)]
        );
        // validity + values, then validity + offsets + values
        assert_eq!(header.buffers.len(), 5);
        assert!(header.buffers.iter().all(|b| b.offset % 8 == 0));
        assert_eq!(body.len() % 8, 0);
    }

    #[test]
    fn sliced_offsets_are_rebased() {
        let batch = batch();
        let sliced = batch.slice(1, 2).unwrap();
        let decoded = round_trip(&sliced);
        assert_eq!(decoded, sliced);
        assert_eq!(decoded.column(1).unwrap().value_offset(0), 0);
        assert_eq!(decoded.column(1).unwrap().str_value(0).unwrap(), "yy");
    }

    #[test]
    fn size_matches_written_bytes() {
        let batch = batch();
        let mut sink = BufferOutputStream::new();
        let lengths = write_record_batch(&batch, &mut sink, &IpcWriteOptions::default()).unwrap();
        let predicted = get_record_batch_size(&batch, &IpcWriteOptions::default()).unwrap();
        assert_eq!(predicted, sink.len() as u64);
        assert_eq!(predicted, lengths.total());
    }

    #[test]
    fn missing_buffers_are_invalid() {
        let batch = batch();
        let (mut header, body) =
            encode_record_batch(&batch, None, &IpcWriteOptions::default()).unwrap();
        header.buffers.pop();
        let mut sink = BufferOutputStream::new();
        write_message(
            pb::message::Header::RecordBatch(header),
            &body,
            IpcWriteOptions::default().alignment(),
            &mut sink,
        )
        .unwrap();
        let message = Message::open(&sink.finish(), 0).unwrap();
        assert!(
            read_record_batch(&message, batch.schema(), &IpcReadOptions::default())
                .unwrap_err()
                .is_invalid_format()
        );
    }

    #[test]
    fn out_of_body_buffers_are_invalid() {
        let batch = batch();
        let (mut header, body) =
            encode_record_batch(&batch, None, &IpcWriteOptions::default()).unwrap();
        header.buffers[1].length = 1 << 40;
        let mut sink = BufferOutputStream::new();
        write_message(
            pb::message::Header::RecordBatch(header),
            &body,
            IpcWriteOptions::default().alignment(),
            &mut sink,
        )
        .unwrap();
        let message = Message::open(&sink.finish(), 0).unwrap();
        assert!(
            read_record_batch(&message, batch.schema(), &IpcReadOptions::default())
                .unwrap_err()
                .is_invalid_format()
        );
    }

    #[test]
    fn huge_node_lengths_are_invalid() {
        let schema = Arc::new(Schema::new(vec![Field::nullable(
            "a",
            DType::Primitive(PType::I64),
        )]));
        let mut body = MessageBody::new(IpcWriteOptions::default().alignment());
        let header = pb::RecordBatch {
            length: 1 << 61,
            nodes: vec![pb::FieldNode {
                length: 1 << 61,
                null_count: 0,
            }],
            buffers: vec![
                body.push(ByteBuffer::default()).unwrap(),
                body.push(ByteBuffer::default()).unwrap(),
            ],
        };
        let mut sink = BufferOutputStream::new();
        write_message(
            pb::message::Header::RecordBatch(header),
            &body,
            IpcWriteOptions::default().alignment(),
            &mut sink,
        )
        .unwrap();
        let message = Message::open(&sink.finish(), 0).unwrap();
        assert!(
            read_record_batch(&message, &schema, &IpcReadOptions::default())
                .unwrap_err()
                .is_invalid_format()
        );
    }

    #[test]
    fn dictionaries_must_be_registered() {
        let dictionary: ArrayRef = Arc::new(ArrayData::from_utf8([Some("a"), Some("b")]));
        let dtype = DType::dictionary(PType::U8, dictionary.clone(), false).unwrap();
        let column = ArrayData::try_new_dictionary(
            dtype.as_dictionary().unwrap().clone(),
            &ArrayData::from_values([1u8, 0, 1]),
        )
        .unwrap();
        let batch = RecordBatch::try_new(
            Arc::new(Schema::new(vec![Field::nullable("d", dtype)])),
            3,
            vec![Arc::new(column)],
        )
        .unwrap();

        let mut memo = DictionaryMemo::new();
        let err = encode_record_batch(&batch, Some(&memo), &IpcWriteOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Argument);
        memo.get_or_assign_id(&dictionary);
        encode_record_batch(&batch, Some(&memo), &IpcWriteOptions::default()).unwrap();
    }
}
