use std::io;

use prost::Message as _;
use quiver_buffer::ByteBuffer;
use quiver_error::{QuiverError, QuiverResult, quiver_bail, quiver_err};
use quiver_io::{QuiverRead, QuiverReadAt};
use quiver_proto as pb;

use crate::{MessageKind, MetadataVersion, METADATA_PREFIX_LENGTH};

/// A message decoded from its frame: the metadata header and the body it describes.
#[derive(Debug, Clone)]
pub struct Message {
    version: MetadataVersion,
    header: pb::message::Header,
    body: ByteBuffer,
}

impl Message {
    /// Decode a message from its metadata block (without the length prefix, possibly followed
    /// by padding) and its body.
    pub fn try_from_parts(metadata: &[u8], body: ByteBuffer) -> QuiverResult<Self> {
        let message = decode_metadata(metadata)?;
        let body_length = body_length(&message)?;
        if body.len() as u64 != body_length {
            quiver_bail!(
                InvalidFormat: "message declares a body of {} bytes but {} were given",
                body_length,
                body.len()
            )
        }
        Self::from_proto(message, body)
    }

    /// Parse the frame starting at `offset` within `buffer`.
    ///
    /// The metadata and body are checked to lie within the buffer before they are read. The
    /// body is a zero-copy slice of `buffer`.
    pub fn open(buffer: &ByteBuffer, offset: u64) -> QuiverResult<Self> {
        let prefix = buffer.try_slice(offset, METADATA_PREFIX_LENGTH)?;
        let metadata_length = read_prefix(&prefix);
        if metadata_length == 0 {
            quiver_bail!(InvalidFormat: "expected a message at {} but found the end-of-stream marker", offset)
        }
        let metadata_start = offset + METADATA_PREFIX_LENGTH;
        let metadata = buffer.try_slice(metadata_start, metadata_length as u64)?;
        let message = decode_metadata(&metadata)?;
        let body = buffer.try_slice(metadata_start + metadata_length as u64, body_length(&message)?)?;
        Self::from_proto(message, body)
    }

    fn from_proto(message: pb::Message, body: ByteBuffer) -> QuiverResult<Self> {
        let version = message.version();
        let header = message
            .header
            .ok_or_else(|| quiver_err!(InvalidFormat: "message has no header"))?;
        Ok(Self {
            version,
            header,
            body,
        })
    }

    /// The metadata version the message was written with.
    pub fn version(&self) -> MetadataVersion {
        self.version
    }

    /// What the message describes.
    pub fn kind(&self) -> MessageKind {
        MessageKind::from(&self.header)
    }

    /// The kind-specific metadata.
    pub fn header(&self) -> &pb::message::Header {
        &self.header
    }

    /// The body, including any trailing padding.
    pub fn body(&self) -> &ByteBuffer {
        &self.body
    }

    /// The body length in bytes.
    pub fn body_length(&self) -> u64 {
        self.body.len() as u64
    }

    pub(crate) fn expect_schema(&self) -> QuiverResult<&pb::Schema> {
        match &self.header {
            pb::message::Header::Schema(schema) => Ok(schema),
            _ => Err(self.unexpected(MessageKind::Schema)),
        }
    }

    pub(crate) fn expect_dictionary_batch(&self) -> QuiverResult<&pb::DictionaryBatch> {
        match &self.header {
            pb::message::Header::DictionaryBatch(batch) => Ok(batch),
            _ => Err(self.unexpected(MessageKind::DictionaryBatch)),
        }
    }

    pub(crate) fn expect_record_batch(&self) -> QuiverResult<&pb::RecordBatch> {
        match &self.header {
            pb::message::Header::RecordBatch(batch) => Ok(batch),
            _ => Err(self.unexpected(MessageKind::RecordBatch)),
        }
    }

    pub(crate) fn expect_tensor(&self) -> QuiverResult<&pb::Tensor> {
        match &self.header {
            pb::message::Header::Tensor(tensor) => Ok(tensor),
            _ => Err(self.unexpected(MessageKind::Tensor)),
        }
    }

    fn unexpected(&self, expected: MessageKind) -> QuiverError {
        quiver_err!(
            InvalidFormat: "expected a {} message, found a {} message",
            expected,
            self.kind()
        )
    }
}

/// Read the frame at `offset` of `source` whose prefix and metadata span `metadata_length`
/// bytes, together with its body.
#[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
pub fn read_message<R: QuiverReadAt>(
    offset: u64,
    metadata_length: u32,
    source: &R,
) -> QuiverResult<Message> {
    let metadata_length = u64::from(metadata_length);
    if metadata_length <= METADATA_PREFIX_LENGTH {
        quiver_bail!(InvalidFormat: "metadata length {} is too short for a message", metadata_length)
    }
    check_extent(source, offset, metadata_length)?;
    let frame = source.read_byte_range(offset, metadata_length)?;
    let declared = u64::from(read_prefix(&frame));
    if declared + METADATA_PREFIX_LENGTH != metadata_length {
        quiver_bail!(
            InvalidFormat: "message at {} declares {} metadata bytes, expected {}",
            offset,
            declared,
            metadata_length - METADATA_PREFIX_LENGTH
        )
    }
    let message = decode_metadata(&frame[size_of::<u32>()..])?;
    let body_length = body_length(&message)?;
    let body_offset = offset + metadata_length;
    check_extent(source, body_offset, body_length)?;
    let body = source.read_byte_range(body_offset, body_length)?;
    Message::from_proto(message, body)
}

/// Read the frame starting at `offset` of `source`, taking its metadata length from the
/// frame's own prefix.
pub fn read_message_at<R: QuiverReadAt>(offset: u64, source: &R) -> QuiverResult<Message> {
    check_extent(source, offset, METADATA_PREFIX_LENGTH)?;
    let prefix = source.read_byte_range(offset, METADATA_PREFIX_LENGTH)?;
    let declared = read_prefix(&prefix);
    if declared == 0 {
        quiver_bail!(InvalidFormat: "expected a message at {} but found the end-of-stream marker", offset)
    }
    let metadata_length = u32::try_from(u64::from(declared) + METADATA_PREFIX_LENGTH)
        .map_err(|_| quiver_err!(InvalidFormat: "metadata length {} is too large", declared))?;
    read_message(offset, metadata_length, source)
}

/// Read the next message from a sequential source.
///
/// Returns `None` at the end-of-stream marker, or when the source ends cleanly before the
/// next frame starts. A frame cut short is a format error.
pub fn read_next_message<R: QuiverRead>(reader: &mut R) -> QuiverResult<Option<Message>> {
    let prefix = reader.read_up_to(METADATA_PREFIX_LENGTH)?;
    if prefix.is_empty() {
        return Ok(None);
    }
    if prefix.len() as u64 != METADATA_PREFIX_LENGTH {
        quiver_bail!(InvalidFormat: "stream ended inside a message length prefix")
    }
    let metadata_length = read_prefix(&prefix);
    if metadata_length == 0 {
        return Ok(None);
    }
    let metadata = reader
        .read_bytes(u64::from(metadata_length))
        .map_err(|e| truncated(e, "message metadata"))?;
    let message = decode_metadata(&metadata)?;
    let body = reader
        .read_bytes(body_length(&message)?)
        .map_err(|e| truncated(e, "message body"))?;
    Message::from_proto(message, body).map(Some)
}

fn read_prefix(bytes: &[u8]) -> u32 {
    let mut prefix = [0u8; 4];
    prefix.copy_from_slice(&bytes[..4]);
    u32::from_le_bytes(prefix)
}

fn decode_metadata(metadata: &[u8]) -> QuiverResult<pb::Message> {
    let message = pb::Message::decode_length_delimited(metadata)?;
    check_version(message.version)?;
    Ok(message)
}

/// Validate a metadata version tag read from a message or footer.
pub(crate) fn check_version(version: i32) -> QuiverResult<MetadataVersion> {
    match MetadataVersion::try_from(version) {
        Ok(version @ (MetadataVersion::V1 | MetadataVersion::V2 | MetadataVersion::V3)) => {
            Ok(version)
        }
        _ => quiver_bail!(InvalidFormat: "unsupported metadata version {}", version),
    }
}

fn body_length(message: &pb::Message) -> QuiverResult<u64> {
    u64::try_from(message.body_length)
        .map_err(|_| quiver_err!(InvalidFormat: "negative body length {}", message.body_length))
}

fn check_extent<R: QuiverReadAt>(source: &R, offset: u64, length: u64) -> QuiverResult<()> {
    let size = source.size()?;
    if offset.checked_add(length).is_none_or(|end| end > size) {
        quiver_bail!(
            InvalidFormat: "extent {}+{} lies outside of {} available bytes",
            offset,
            length,
            size
        )
    }
    Ok(())
}

fn truncated(err: io::Error, what: &str) -> QuiverError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        quiver_err!(InvalidFormat: "stream ended inside {}: {}", what, err)
    } else {
        QuiverError::from(err)
    }
}
