mod decoder;
mod encoder;

use std::fmt::{Display, Formatter};

pub use decoder::*;
pub use encoder::*;

/// The kinds of framed messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A schema, without a body.
    Schema,
    /// The values of one dictionary.
    DictionaryBatch,
    /// The columns of a record batch.
    RecordBatch,
    /// A dense tensor.
    Tensor,
}

impl Display for MessageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::DictionaryBatch => write!(f, "dictionary batch"),
            Self::RecordBatch => write!(f, "record batch"),
            Self::Tensor => write!(f, "tensor"),
        }
    }
}

impl From<&quiver_proto::message::Header> for MessageKind {
    fn from(value: &quiver_proto::message::Header) -> Self {
        use quiver_proto::message::Header;
        match value {
            Header::Schema(_) => Self::Schema,
            Header::DictionaryBatch(_) => Self::DictionaryBatch,
            Header::RecordBatch(_) => Self::RecordBatch,
            Header::Tensor(_) => Self::Tensor,
        }
    }
}
