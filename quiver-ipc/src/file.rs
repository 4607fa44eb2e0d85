use prost::Message as _;
use quiver_array::{RecordBatch, SchemaRef};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_io::{QuiverReadAt, QuiverWrite};
use quiver_proto as pb;

use crate::batch::encode_record_batch;
use crate::messages::check_version;
use crate::schema::{dictionary_types_from_proto, schema_from_proto, schema_to_proto};
use crate::{
    CURRENT_METADATA_VERSION, DictionaryMemo, FrameLengths, IpcReadOptions, IpcWriteOptions,
    MAGIC, Message, MessageBody, MetadataVersion, read_dictionary_batch, read_message,
    read_record_batch, write_dictionary_batch, write_message,
};

/// The leading magic bytes, padded so that the first message starts aligned.
const FILE_HEADER: [u8; 8] = *b"QUIVER\0\0";

/// The footer length and trailing magic.
const TRAILER_LENGTH: u64 = 4 + MAGIC.len() as u64;

/// Writes record batches in the file format.
///
/// The file starts with the magic bytes, the schema and the dictionaries it references.
/// Each [`FileWriter::write`] appends one record batch message, and [`FileWriter::finish`]
/// appends the footer that indexes them.
pub struct FileWriter<W: QuiverWrite> {
    sink: W,
    start: u64,
    schema: SchemaRef,
    schema_proto: pb::Schema,
    memo: DictionaryMemo,
    options: IpcWriteOptions,
    dictionaries: Vec<pb::Block>,
    record_batches: Vec<pb::Block>,
    finished: bool,
}

impl<W: QuiverWrite> FileWriter<W> {
    /// Start a file of batches of `schema` on `sink`.
    ///
    /// The file starts at the sink's current position, and the footer records message offsets
    /// relative to it. Set [`IpcWriteOptions::with_allow_64bit`] to write batches with more
    /// than `i32::MAX` rows.
    pub fn try_new(mut sink: W, schema: SchemaRef, options: IpcWriteOptions) -> QuiverResult<Self> {
        let start = sink.tell()?;
        sink.write_all(&FILE_HEADER)?;
        let mut memo = DictionaryMemo::new();
        let schema_proto = schema_to_proto(&schema, &mut memo, &options)?;
        write_message(
            pb::message::Header::Schema(schema_proto.clone()),
            &MessageBody::new(options.alignment()),
            options.alignment(),
            &mut sink,
        )?;

        let mut dictionaries = Vec::with_capacity(memo.len());
        for (id, dictionary) in memo.iter() {
            let offset = sink.tell()? - start;
            let lengths = write_dictionary_batch(id, dictionary, &mut sink, &options)?;
            dictionaries.push(block(offset, lengths)?);
        }
        Ok(Self {
            sink,
            start,
            schema,
            schema_proto,
            memo,
            options,
            dictionaries,
            record_batches: vec![],
            finished: false,
        })
    }

    /// The schema of the batches in the file.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The number of batches written so far.
    pub fn num_record_batches(&self) -> usize {
        self.record_batches.len()
    }

    /// Append a batch. Its schema must equal the file's schema.
    ///
    /// The batch is only indexed by the footer once it has been written in full.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn write(&mut self, batch: &RecordBatch) -> QuiverResult<FrameLengths> {
        if self.finished {
            quiver_bail!("cannot write to a finished file")
        }
        if batch.schema() != &self.schema {
            quiver_bail!("batch schema does not match the file schema")
        }
        let (header, body) = encode_record_batch(batch, Some(&self.memo), &self.options)?;
        let offset = self.sink.tell()? - self.start;
        let lengths = write_message(
            pb::message::Header::RecordBatch(header),
            &body,
            self.options.alignment(),
            &mut self.sink,
        )?;
        self.record_batches.push(block(offset, lengths)?);
        Ok(lengths)
    }

    /// Write the footer and trailing magic and flush the sink.
    pub fn finish(&mut self) -> QuiverResult<()> {
        if self.finished {
            quiver_bail!("file is already finished")
        }
        let footer = pb::Footer {
            version: CURRENT_METADATA_VERSION as i32,
            schema: Some(self.schema_proto.clone()),
            dictionaries: self.dictionaries.clone(),
            record_batches: self.record_batches.clone(),
        }
        .encode_to_vec();
        let footer_length = i32::try_from(footer.len())
            .map_err(|_| quiver_err!("file footer of {} bytes is too large", footer.len()))?;
        self.sink.write_all(&footer)?;
        self.sink.write_all(&footer_length.to_le_bytes())?;
        self.sink.write_all(MAGIC)?;
        self.sink.flush()?;
        self.finished = true;
        log::debug!(
            "finished file with {} record batches and {} dictionaries",
            self.record_batches.len(),
            self.dictionaries.len()
        );
        Ok(())
    }

    /// The underlying sink.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn block(offset: u64, lengths: FrameLengths) -> QuiverResult<pb::Block> {
    Ok(pb::Block {
        offset: i64::try_from(offset)
            .map_err(|_| quiver_err!("message offset {} is too large", offset))?,
        metadata_length: i32::try_from(lengths.metadata_length).map_err(|_| {
            quiver_err!("metadata of {} bytes is too large", lengths.metadata_length)
        })?,
        body_length: i64::try_from(lengths.body_length)
            .map_err(|_| quiver_err!("body of {} bytes is too large", lengths.body_length))?,
    })
}

/// Reads record batches written in the file format, in any order.
///
/// The footer, schema and dictionaries are read when the reader is created. Each
/// [`FileReader::get_record_batch`] then reads one message at the offset the footer records.
pub struct FileReader<R: QuiverReadAt> {
    source: R,
    schema: SchemaRef,
    version: MetadataVersion,
    memo: DictionaryMemo,
    record_batches: Vec<pb::Block>,
    options: IpcReadOptions,
}

impl<R: QuiverReadAt> FileReader<R> {
    /// Open a file, validating its magic bytes and footer.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn try_new(source: R, options: IpcReadOptions) -> QuiverResult<Self> {
        let size = source.size()?;
        let header_length = FILE_HEADER.len() as u64;
        if size < header_length + TRAILER_LENGTH {
            quiver_bail!(InvalidFormat: "file of {} bytes is too small", size)
        }
        if source.read_byte_range(0, MAGIC.len() as u64)?.as_slice() != MAGIC {
            quiver_bail!(InvalidFormat: "file does not start with the magic bytes")
        }
        let trailer = source.read_byte_range(size - TRAILER_LENGTH, TRAILER_LENGTH)?;
        if &trailer[4..] != MAGIC {
            quiver_bail!(InvalidFormat: "file does not end with the magic bytes")
        }

        let mut footer_length = [0u8; 4];
        footer_length.copy_from_slice(&trailer[..4]);
        let footer_length = i32::from_le_bytes(footer_length);
        let footer_end = size - TRAILER_LENGTH;
        let footer_length = u64::try_from(footer_length)
            .ok()
            .filter(|len| *len <= footer_end - header_length)
            .ok_or_else(|| {
                quiver_err!(
                    InvalidFormat: "footer length {} lies outside of the file",
                    footer_length
                )
            })?;
        let footer = pb::Footer::decode(
            source
                .read_byte_range(footer_end - footer_length, footer_length)?
                .as_slice(),
        )?;
        let version = check_version(footer.version)?;

        let schema_proto = footer
            .schema
            .ok_or_else(|| quiver_err!(InvalidFormat: "file footer has no schema"))?;
        let dictionary_types = dictionary_types_from_proto(&schema_proto, &options)?;
        let mut memo = DictionaryMemo::new();
        for block in &footer.dictionaries {
            let message = read_block(&source, block)?;
            let (id, values) = read_dictionary_batch(&message, &dictionary_types, &options)?;
            memo.add_dictionary(id, values)?;
        }
        let schema = schema_from_proto(&schema_proto, &memo, &options)?.into();

        log::debug!(
            "opened {} byte file with {} record batches and {} dictionaries",
            size,
            footer.record_batches.len(),
            memo.len()
        );
        Ok(Self {
            source,
            schema,
            version,
            memo,
            record_batches: footer.record_batches,
            options,
        })
    }

    /// The schema of the batches in the file.
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// The metadata version of the footer.
    pub fn version(&self) -> MetadataVersion {
        self.version
    }

    /// The dictionaries read from the file.
    pub fn dictionary_memo(&self) -> &DictionaryMemo {
        &self.memo
    }

    /// The number of record batches in the file.
    pub fn num_record_batches(&self) -> usize {
        self.record_batches.len()
    }

    /// Read the batch at `index`, in write order.
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self)))]
    pub fn get_record_batch(&self, index: usize) -> QuiverResult<RecordBatch> {
        let Some(block) = self.record_batches.get(index) else {
            quiver_bail!(OutOfBounds: index, 0, self.record_batches.len())
        };
        let message = read_block(&self.source, block)?;
        read_record_batch(&message, &self.schema, &self.options)
    }
}

fn read_block<R: QuiverReadAt>(source: &R, block: &pb::Block) -> QuiverResult<Message> {
    let (Ok(offset), Ok(metadata_length), Ok(body_length)) = (
        u64::try_from(block.offset),
        u32::try_from(block.metadata_length),
        u64::try_from(block.body_length),
    ) else {
        quiver_bail!(
            InvalidFormat: "invalid block {}+{}+{}",
            block.offset,
            block.metadata_length,
            block.body_length
        )
    };
    let message = read_message(offset, metadata_length, source)?;
    if message.body_length() != body_length {
        quiver_bail!(
            InvalidFormat: "message at {} has a body of {} bytes, the footer records {}",
            offset,
            message.body_length(),
            body_length
        )
    }
    Ok(message)
}
