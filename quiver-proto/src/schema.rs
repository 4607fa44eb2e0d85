/// An ordered list of fields, flattened in depth-first pre-order.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Schema {
    /// Every field of the schema, each followed by its children.
    #[prost(message, repeated, tag = "1")]
    pub fields: Vec<Field>,
}

/// One field of a schema. Its `num_children` children follow it directly.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Field {
    /// The field name.
    #[prost(string, tag = "1")]
    pub name: String,
    /// Whether values may be null.
    #[prost(bool, tag = "2")]
    pub nullable: bool,
    /// The number of child fields that follow this one.
    #[prost(uint32, tag = "3")]
    pub num_children: u32,
    /// Present when the field is dictionary-encoded, in which case the type describes the
    /// dictionary values.
    #[prost(message, optional, tag = "4")]
    pub dictionary: Option<DictionaryEncoding>,
    /// The logical type.
    #[prost(oneof = "field::Type", tags = "10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21")]
    pub r#type: Option<field::Type>,
}

/// Nested types of [`Field`].
pub mod field {
    /// The logical type of a field.
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Type {
        /// See [`super::Null`]
        #[prost(message, tag = "10")]
        Null(super::Null),
        /// See [`super::Bool`]
        #[prost(message, tag = "11")]
        Bool(super::Bool),
        /// See [`super::Primitive`]
        #[prost(message, tag = "12")]
        Primitive(super::Primitive),
        /// See [`super::Utf8`]
        #[prost(message, tag = "13")]
        Utf8(super::Utf8),
        /// See [`super::Binary`]
        #[prost(message, tag = "14")]
        Binary(super::Binary),
        /// See [`super::FixedSizeBinary`]
        #[prost(message, tag = "15")]
        FixedSizeBinary(super::FixedSizeBinary),
        /// See [`super::Date`]
        #[prost(message, tag = "16")]
        Date(super::Date),
        /// See [`super::Time`]
        #[prost(message, tag = "17")]
        Time(super::Time),
        /// See [`super::Timestamp`]
        #[prost(message, tag = "18")]
        Timestamp(super::Timestamp),
        /// See [`super::List`]
        #[prost(message, tag = "19")]
        List(super::List),
        /// See [`super::Struct`]
        #[prost(message, tag = "20")]
        Struct(super::Struct),
        /// See [`super::Union`]
        #[prost(message, tag = "21")]
        Union(super::Union),
    }
}

/// The null type.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Null {}

/// The boolean type.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Bool {}

/// A fixed-width numeric type.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Primitive {
    /// The primitive type tag.
    #[prost(uint32, tag = "1")]
    pub ptype: u32,
}

/// UTF-8 strings.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Utf8 {}

/// Variable-length binary.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Binary {}

/// Fixed-width binary.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct FixedSizeBinary {
    /// The number of bytes per value.
    #[prost(uint64, tag = "1")]
    pub byte_width: u64,
}

/// A date.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Date {
    /// The date unit tag.
    #[prost(uint32, tag = "1")]
    pub unit: u32,
}

/// A time of day.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Time {
    /// The time unit tag.
    #[prost(uint32, tag = "1")]
    pub unit: u32,
}

/// A point in time.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Timestamp {
    /// The time unit tag.
    #[prost(uint32, tag = "1")]
    pub unit: u32,
    /// The timezone, absent for timezone-naive timestamps.
    #[prost(string, optional, tag = "2")]
    pub timezone: Option<String>,
}

/// A variable-length list. The element field follows as the only child.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct List {}

/// A struct. Its fields follow as children.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct Struct {}

/// A union. Its members follow as children.
#[derive(Clone, PartialEq, prost::Message)]
pub struct Union {
    /// The union mode tag.
    #[prost(uint32, tag = "1")]
    pub mode: u32,
    /// The type code of each member, in member order.
    #[prost(int32, repeated, tag = "2")]
    pub type_codes: Vec<i32>,
}

/// How a field is dictionary-encoded.
#[derive(Clone, Copy, PartialEq, prost::Message)]
pub struct DictionaryEncoding {
    /// The id of the dictionary within the stream or file.
    #[prost(int64, tag = "1")]
    pub id: i64,
    /// The primitive type tag of the indices.
    #[prost(uint32, tag = "2")]
    pub index_ptype: u32,
    /// Whether the dictionary values are ordered.
    #[prost(bool, tag = "3")]
    pub ordered: bool,
}
