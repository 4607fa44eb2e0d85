use prost::Message as _;
use quiver_buffer::{Alignment, ByteBuffer, PADDING};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_io::QuiverWrite;
use quiver_proto as pb;

use crate::{CURRENT_METADATA_VERSION, MessageKind};

/// The number of bytes of the metadata length prefix.
pub const METADATA_PREFIX_LENGTH: u64 = 4;

/// The body of an outgoing message: buffers written back to back, each padded to the body
/// alignment.
#[derive(Debug, Clone)]
pub struct MessageBody {
    buffers: Vec<ByteBuffer>,
    length: u64,
    alignment: Alignment,
}

impl MessageBody {
    /// Create an empty body whose buffers are padded to `alignment`.
    pub fn new(alignment: Alignment) -> Self {
        Self {
            buffers: vec![],
            length: 0,
            alignment,
        }
    }

    /// Append a buffer, returning its location within the body.
    pub fn push(&mut self, buffer: ByteBuffer) -> QuiverResult<pb::Buffer> {
        let padded = u64::try_from(self.alignment.round_up(buffer.len()))
            .ok()
            .and_then(|padded| self.length.checked_add(padded));
        let (Ok(offset), Ok(length), Some(end)) = (
            i64::try_from(self.length),
            i64::try_from(buffer.len()),
            padded,
        ) else {
            quiver_bail!(
                "buffer of {} bytes at body offset {} is too large",
                buffer.len(),
                self.length
            )
        };
        self.length = end;
        self.buffers.push(buffer);
        Ok(pb::Buffer { offset, length })
    }

    /// The length of the body including padding.
    pub fn len(&self) -> u64 {
        self.length
    }

    /// Whether the body holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// The buffers in the order they are written.
    pub fn buffers(&self) -> &[ByteBuffer] {
        &self.buffers
    }
}

/// The number of bytes a framed message occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLengths {
    /// The length prefix plus the padded metadata. The body starts this many bytes after the
    /// start of the frame.
    pub metadata_length: u32,
    /// The padded body length.
    pub body_length: u64,
}

impl FrameLengths {
    /// The total number of bytes of the frame.
    pub fn total(&self) -> u64 {
        self.metadata_length as u64 + self.body_length
    }
}

/// Frame a message and write it to `sink` at its current position.
///
/// The metadata is padded so that it ends on a multiple of `alignment` relative to the start
/// of the sink, which places the body, and every buffer within it, on such a boundary too.
pub fn write_message<W: QuiverWrite>(
    header: pb::message::Header,
    body: &MessageBody,
    alignment: Alignment,
    sink: &mut W,
) -> QuiverResult<FrameLengths> {
    let kind = MessageKind::from(&header);
    let message = pb::Message {
        version: CURRENT_METADATA_VERSION as i32,
        body_length: i64::try_from(body.len())
            .map_err(|_| quiver_err!("message body of {} bytes is too large", body.len()))?,
        header: Some(header),
    };
    let metadata = message.encode_length_delimited_to_vec();

    let start = sink.tell()?;
    let unpadded_end = start + METADATA_PREFIX_LENGTH + metadata.len() as u64;
    let padding = alignment_padding(unpadded_end, alignment);
    let padded_length = (metadata.len() + padding) as u64;
    let (Ok(prefix), Ok(metadata_length)) = (
        u32::try_from(padded_length),
        i32::try_from(padded_length + METADATA_PREFIX_LENGTH),
    ) else {
        quiver_bail!("message metadata of {} bytes is too large", metadata.len())
    };

    sink.write_all(&prefix.to_le_bytes())?;
    sink.write_all(&metadata)?;
    sink.write_all(&PADDING[..padding])?;
    for buffer in body.buffers() {
        sink.write_all(buffer)?;
        sink.write_all(&PADDING[..body.alignment.padding_for(buffer.len())])?;
    }

    let lengths = FrameLengths {
        metadata_length: metadata_length.unsigned_abs(),
        body_length: body.len(),
    };
    log::trace!(
        "wrote {} message at {}: metadata {} bytes, body {} bytes",
        kind,
        start,
        lengths.metadata_length,
        lengths.body_length
    );
    Ok(lengths)
}

/// Write the end-of-stream marker, a zero metadata length.
pub fn write_end_of_stream<W: QuiverWrite>(sink: &mut W) -> QuiverResult<()> {
    sink.write_all(&0u32.to_le_bytes())?;
    Ok(())
}

fn alignment_padding(position: u64, alignment: Alignment) -> usize {
    let align = *alignment as u64;
    // Bounded by the alignment, itself a usize.
    #[allow(clippy::cast_possible_truncation)]
    let padding = ((align - position % align) % align) as usize;
    padding
}
