use crate::Schema;

/// The version of the metadata layout a message was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MetadataVersion {
    /// Never written, decoded from a missing or zeroed field.
    Unspecified = 0,
    /// The first layout.
    V1 = 1,
    /// Adds dictionary batches.
    V2 = 2,
    /// Adds tensors and the union type. The version written by this library.
    V3 = 3,
}

/// The metadata of one framed message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Message {
    /// The metadata version.
    #[prost(enumeration = "MetadataVersion", tag = "1")]
    pub version: i32,
    /// The number of body bytes following the metadata.
    #[prost(int64, tag = "2")]
    pub body_length: i64,
    /// What the message describes.
    #[prost(oneof = "message::Header", tags = "3, 4, 5, 6")]
    pub header: Option<message::Header>,
}

/// Nested types of [`Message`].
pub mod message {
    /// The kind-specific metadata of a message.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Header {
        /// A schema. Schema messages have no body.
        #[prost(message, tag = "3")]
        Schema(crate::Schema),
        /// The values of one dictionary, laid out as a single-column record batch.
        #[prost(message, tag = "4")]
        DictionaryBatch(super::DictionaryBatch),
        /// The buffer layout of a record batch.
        #[prost(message, tag = "5")]
        RecordBatch(super::RecordBatch),
        /// A dense tensor.
        #[prost(message, tag = "6")]
        Tensor(super::Tensor),
    }
}

/// The buffer layout of a record batch. Types are not repeated here; a reader interprets the
/// nodes and buffers against the schema it already knows.
#[derive(Clone, PartialEq, prost::Message)]
pub struct RecordBatch {
    /// The number of rows.
    #[prost(int64, tag = "1")]
    pub length: i64,
    /// One node per array, depth-first in pre-order.
    #[prost(message, repeated, tag = "2")]
    pub nodes: Vec<FieldNode>,
    /// Every buffer of every array, in the order the arrays appear in `nodes`.
    #[prost(message, repeated, tag = "3")]
    pub buffers: Vec<Buffer>,
}

/// The length and null count of one array of a record batch.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct FieldNode {
    /// The number of values.
    #[prost(int64, tag = "1")]
    pub length: i64,
    /// The number of null values.
    #[prost(int64, tag = "2")]
    pub null_count: i64,
}

/// The location of one buffer within a message body.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Buffer {
    /// The offset from the start of the body. Always a multiple of 8.
    #[prost(int64, tag = "1")]
    pub offset: i64,
    /// The length in bytes, excluding padding.
    #[prost(int64, tag = "2")]
    pub length: i64,
}

/// The values of a dictionary referenced by dictionary-encoded fields.
#[derive(Clone, PartialEq, prost::Message)]
pub struct DictionaryBatch {
    /// The dictionary id used by the schema.
    #[prost(int64, tag = "1")]
    pub id: i64,
    /// The layout of the dictionary values as a single-column record batch.
    #[prost(message, optional, tag = "2")]
    pub data: Option<RecordBatch>,
}

/// One dimension of a tensor.
#[derive(Clone, PartialEq, prost::Message)]
pub struct TensorDim {
    /// The number of elements along the dimension.
    #[prost(int64, tag = "1")]
    pub size: i64,
    /// The dimension name, empty when unnamed.
    #[prost(string, tag = "2")]
    pub name: String,
}

/// A dense tensor whose elements make up the message body.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Tensor {
    /// The primitive type tag of the elements.
    #[prost(uint32, tag = "1")]
    pub ptype: u32,
    /// The dimensions, outermost first.
    #[prost(message, repeated, tag = "2")]
    pub shape: Vec<TensorDim>,
    /// The byte stride of each dimension.
    #[prost(int64, repeated, tag = "3")]
    pub strides: Vec<i64>,
    /// The location of the elements within the body.
    #[prost(message, optional, tag = "4")]
    pub data: Option<Buffer>,
}

/// The location of one message within a file.
#[derive(Clone, Copy, PartialEq, Eq, prost::Message)]
pub struct Block {
    /// The absolute offset of the message from the start of the file.
    #[prost(int64, tag = "1")]
    pub offset: i64,
    /// The length of the length prefix and padded metadata.
    #[prost(int32, tag = "2")]
    pub metadata_length: i32,
    /// The length of the body.
    #[prost(int64, tag = "3")]
    pub body_length: i64,
}

/// The trailing index of a file.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Footer {
    /// The metadata version.
    #[prost(enumeration = "MetadataVersion", tag = "1")]
    pub version: i32,
    /// The file's schema.
    #[prost(message, optional, tag = "2")]
    pub schema: Option<Schema>,
    /// One block per dictionary batch, in write order.
    #[prost(message, repeated, tag = "3")]
    pub dictionaries: Vec<Block>,
    /// One block per record batch, in write order.
    #[prost(message, repeated, tag = "4")]
    pub record_batches: Vec<Block>,
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;
    use crate::{Field, Primitive, field};

    #[test]
    fn unknown_versions_are_detectable() {
        let message = Message {
            version: 42,
            body_length: 0,
            header: None,
        };
        let decoded = Message::decode(message.encode_to_vec().as_slice()).unwrap();
        assert!(MetadataVersion::try_from(decoded.version).is_err());
        assert_eq!(decoded.version(), MetadataVersion::Unspecified);
    }

    #[test]
    fn length_delimited_ignores_trailing_padding() {
        let message = Message {
            version: MetadataVersion::V3 as i32,
            body_length: 64,
            header: Some(message::Header::Schema(Schema {
                fields: vec![Field {
                    name: "f0".to_string(),
                    nullable: true,
                    num_children: 0,
                    dictionary: None,
                    r#type: Some(field::Type::Primitive(Primitive { ptype: 6 })),
                }],
            })),
        };
        let mut bytes = message.encode_length_delimited_to_vec();
        bytes.extend_from_slice(&[0; 7]);
        let decoded = Message::decode_length_delimited(bytes.as_slice()).unwrap();
        assert_eq!(decoded, message);
    }
}
