use quiver_array::{RecordBatch, SchemaRef};
use quiver_error::{QuiverResult, quiver_bail};
use quiver_io::{QuiverRead, QuiverWrite};
use quiver_proto as pb;

use crate::batch::encode_record_batch;
use crate::schema::schema_to_proto;
use crate::{
    DictionaryMemo, FrameLengths, IpcReadOptions, IpcWriteOptions, MessageBody,
    get_dictionary_types, get_schema, read_dictionary_batch, read_next_message,
    read_record_batch, write_dictionary_batch, write_end_of_stream, write_message,
};

/// Writes record batches in the stream format.
///
/// The schema and every dictionary it references are written when the writer is created,
/// followed by one message per batch. [`StreamWriter::finish`] writes the end-of-stream
/// marker.
pub struct StreamWriter<W: QuiverWrite> {
    sink: W,
    schema: SchemaRef,
    memo: DictionaryMemo,
    options: IpcWriteOptions,
    finished: bool,
}

impl<W: QuiverWrite> StreamWriter<W> {
    /// Start a stream of batches of `schema` on `sink`.
    pub fn try_new(mut sink: W, schema: SchemaRef, options: IpcWriteOptions) -> QuiverResult<Self> {
        let mut memo = DictionaryMemo::new();
        let schema_proto = schema_to_proto(&schema, &mut memo, &options)?;
        write_message(
            pb::message::Header::Schema(schema_proto),
            &MessageBody::new(options.alignment()),
            options.alignment(),
            &mut sink,
        )?;
        for (id, dictionary) in memo.iter() {
            write_dictionary_batch(id, dictionary, &mut sink, &options)?;
        }
        log::debug!(
            "started stream of {} columns with {} dictionaries",
            schema.len(),
            memo.len()
        );
        Ok(Self {
            sink,
            schema,
            memo,
            options,
            finished: false,
        })
    }

    /// The schema of the batches in the stream.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Append a batch. Its schema must equal the stream's schema, and every dictionary it
    /// references must be one written with the schema.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn write(&mut self, batch: &RecordBatch) -> QuiverResult<FrameLengths> {
        if self.finished {
            quiver_bail!("cannot write to a finished stream")
        }
        if batch.schema() != &self.schema {
            quiver_bail!("batch schema does not match the stream schema")
        }
        let (header, body) = encode_record_batch(batch, Some(&self.memo), &self.options)?;
        write_message(
            pb::message::Header::RecordBatch(header),
            &body,
            self.options.alignment(),
            &mut self.sink,
        )
    }

    /// Write the end-of-stream marker and flush the sink.
    pub fn finish(&mut self) -> QuiverResult<()> {
        if self.finished {
            quiver_bail!("stream is already finished")
        }
        write_end_of_stream(&mut self.sink)?;
        self.sink.flush()?;
        self.finished = true;
        Ok(())
    }

    /// The underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

/// Reads record batches written in the stream format, front to back.
///
/// The schema and dictionaries are read when the reader is created. Batches are then read
/// one message at a time until the end-of-stream marker, or the end of the source.
pub struct StreamReader<R: QuiverRead> {
    reader: R,
    schema: SchemaRef,
    memo: DictionaryMemo,
    options: IpcReadOptions,
    finished: bool,
}

impl<R: QuiverRead> StreamReader<R> {
    /// Read the schema and dictionaries at the start of a stream.
    pub fn try_new(mut reader: R, options: IpcReadOptions) -> QuiverResult<Self> {
        let Some(message) = read_next_message(&mut reader)? else {
            quiver_bail!(InvalidFormat: "stream ended before its schema")
        };
        let dictionary_types = get_dictionary_types(&message, &options)?;
        let mut memo = DictionaryMemo::new();
        for _ in 0..dictionary_types.len() {
            let Some(dictionary) = read_next_message(&mut reader)? else {
                quiver_bail!(
                    InvalidFormat: "stream ended after {} of {} dictionaries",
                    memo.len(),
                    dictionary_types.len()
                )
            };
            let (id, values) = read_dictionary_batch(&dictionary, &dictionary_types, &options)?;
            memo.add_dictionary(id, values)?;
        }
        let schema = get_schema(&message, &memo, &options)?.into();
        Ok(Self {
            reader,
            schema,
            memo,
            options,
            finished: false,
        })
    }

    /// The schema of the batches in the stream.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The dictionaries read from the stream.
    pub fn dictionary_memo(&self) -> &DictionaryMemo {
        &self.memo
    }

    /// Read the next batch, or `None` once the stream has ended. A stream stays ended.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn next_record_batch(&mut self) -> QuiverResult<Option<RecordBatch>> {
        if self.finished {
            return Ok(None);
        }
        match read_next_message(&mut self.reader) {
            Ok(Some(message)) => read_record_batch(&message, &self.schema, &self.options).map(Some),
            Ok(None) => {
                log::debug!("reached the end of the stream");
                self.finished = true;
                Ok(None)
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }
}

impl<R: QuiverRead> Iterator for StreamReader<R> {
    type Item = QuiverResult<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record_batch().transpose()
    }
}
