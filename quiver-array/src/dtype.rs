use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use DType::*;

use crate::field::Field;
use crate::{ArrayRef, PType};

/// The logical types of values in Quiver arrays.
///
/// The set of types is closed: every array, schema field and serialized type tag is one of
/// these variants. Nested variants carry their children as [`Field`]s so that child names and
/// nullability survive a round trip.
#[derive(Debug, Clone, PartialEq)]
pub enum DType {
    /// The logical null type, every value is `null`
    Null,
    /// Booleans, stored as a bitmap
    Bool,
    /// Fixed-width numeric values
    Primitive(PType),
    /// Variable-length UTF-8 strings with 32-bit offsets
    Utf8,
    /// Variable-length binary values with 32-bit offsets
    Binary,
    /// Binary values of a fixed number of bytes
    FixedSizeBinary(usize),
    /// Days or milliseconds since the UNIX epoch
    Date(DateUnit),
    /// Time since midnight
    Time(TimeUnit),
    /// Time since the UNIX epoch with an optional timezone
    Timestamp(TimeUnit, Option<Arc<str>>),
    /// A variable-length list of values of the element field's type
    List(Arc<Field>),
    /// An ordered list of named fields
    Struct(Arc<[Field]>),
    /// A value that is one of several child types
    Union(UnionDType),
    /// Integer indices into a dictionary of values
    Dictionary(DictionaryDType),
}

/// The resolution of a [`DType::Date`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum DateUnit {
    /// Days since the UNIX epoch, stored as `i32`
    Day = 0,
    /// Milliseconds since the UNIX epoch, stored as `i64`
    Millisecond = 1,
}

/// The resolution of a [`DType::Time`] or [`DType::Timestamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum TimeUnit {
    /// Seconds
    Second = 0,
    /// Milliseconds
    Millisecond = 1,
    /// Microseconds
    Microsecond = 2,
    /// Nanoseconds
    Nanosecond = 3,
}

/// How a union lays out the values of its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum UnionMode {
    /// Every child has the same length as the union
    Sparse = 0,
    /// Each slot stores an offset into the child selected by its type id
    Dense = 1,
}

/// The type of a union: its mode, its children and the type code that selects each child.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDType {
    mode: UnionMode,
    fields: Arc<[Field]>,
    type_codes: Arc<[i8]>,
}

impl UnionDType {
    /// Create a union type, validating that there is exactly one distinct type code per field.
    pub fn try_new(
        mode: UnionMode,
        fields: impl Into<Arc<[Field]>>,
        type_codes: impl Into<Arc<[i8]>>,
    ) -> QuiverResult<Self> {
        let fields = fields.into();
        let type_codes = type_codes.into();
        if fields.len() != type_codes.len() {
            quiver_bail!(
                "union has {} fields but {} type codes",
                fields.len(),
                type_codes.len()
            )
        }
        if !type_codes.iter().all_unique() {
            quiver_bail!("union type codes [{}] are not unique", type_codes.iter().join(", "))
        }
        Ok(Self {
            mode,
            fields,
            type_codes,
        })
    }

    /// The union's layout mode.
    pub fn mode(&self) -> UnionMode {
        self.mode
    }

    /// The union's child fields.
    pub fn fields(&self) -> &Arc<[Field]> {
        &self.fields
    }

    /// The type code of each child field, in field order.
    pub fn type_codes(&self) -> &Arc<[i8]> {
        &self.type_codes
    }

    /// The position of the child selected by `type_code`.
    pub fn child_index(&self, type_code: i8) -> Option<usize> {
        self.type_codes.iter().position(|c| *c == type_code)
    }
}

/// The type of a dictionary-encoded column.
///
/// The type holds the dictionary itself, so every field that was built from the same
/// dictionary shares one [`ArrayRef`]. Equality compares dictionaries by value; use
/// [`DictionaryDType::same_dictionary`] to compare by identity.
#[derive(Debug, Clone)]
pub struct DictionaryDType {
    index: PType,
    dictionary: ArrayRef,
    ordered: bool,
}

impl DictionaryDType {
    /// Create a dictionary type with the given integer index type.
    pub fn try_new(index: PType, dictionary: ArrayRef, ordered: bool) -> QuiverResult<Self> {
        if !index.is_int() {
            quiver_bail!("dictionary index type must be an integer, got {}", index)
        }
        if matches!(dictionary.dtype(), Dictionary(_)) {
            quiver_bail!(NotImplemented: "dictionary of dictionary", dictionary.dtype())
        }
        Ok(Self {
            index,
            dictionary,
            ordered,
        })
    }

    /// The integer type of the indices.
    pub fn index(&self) -> PType {
        self.index
    }

    /// The dictionary values.
    pub fn dictionary(&self) -> &ArrayRef {
        &self.dictionary
    }

    /// The type of the dictionary values.
    pub fn value_dtype(&self) -> &DType {
        self.dictionary.dtype()
    }

    /// Whether the order of the dictionary values is meaningful.
    pub fn is_ordered(&self) -> bool {
        self.ordered
    }

    /// Whether both types hold the very same dictionary instance.
    pub fn same_dictionary(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.dictionary, &other.dictionary)
    }
}

impl PartialEq for DictionaryDType {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
            && self.ordered == other.ordered
            && (self.same_dictionary(other) || self.dictionary == other.dictionary)
    }
}

impl DType {
    /// The number of bytes occupied by one value, for types stored as fixed-width values.
    ///
    /// Booleans are bit-packed and report `None`.
    pub fn value_width(&self) -> Option<usize> {
        match self {
            Primitive(p) => Some(p.byte_width()),
            FixedSizeBinary(w) => Some(*w),
            Date(_) | Time(_) | Timestamp(..) => self.storage_ptype().map(|p| p.byte_width()),
            _ => None,
        }
    }

    /// The primitive type that stores values of primitive and temporal types.
    pub fn storage_ptype(&self) -> Option<PType> {
        match self {
            Primitive(p) => Some(*p),
            Date(DateUnit::Day) => Some(PType::I32),
            Date(DateUnit::Millisecond) => Some(PType::I64),
            Time(TimeUnit::Second | TimeUnit::Millisecond) => Some(PType::I32),
            Time(TimeUnit::Microsecond | TimeUnit::Nanosecond) => Some(PType::I64),
            Timestamp(..) => Some(PType::I64),
            _ => None,
        }
    }

    /// Whether values of this type are stored as variable-length bytes with offsets.
    pub fn is_binary_like(&self) -> bool {
        matches!(self, Utf8 | Binary)
    }

    /// Whether this type has child fields.
    pub fn is_nested(&self) -> bool {
        matches!(self, List(_) | Struct(_) | Union(_))
    }

    /// The child fields of a nested type, empty for every other type.
    pub fn children(&self) -> &[Field] {
        match self {
            List(element) => std::slice::from_ref(element.as_ref()),
            Struct(fields) => fields,
            Union(u) => u.fields(),
            _ => &[],
        }
    }

    /// The number of levels of nested types below and including this one.
    pub fn nesting_depth(&self) -> usize {
        match self {
            Dictionary(d) => d.value_dtype().nesting_depth(),
            _ => {
                1 + self
                    .children()
                    .iter()
                    .map(|f| f.dtype().nesting_depth())
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Get the dictionary type if `self` is dictionary-encoded.
    pub fn as_dictionary(&self) -> Option<&DictionaryDType> {
        match self {
            Dictionary(d) => Some(d),
            _ => None,
        }
    }

    /// Get the element field if `self` is a list.
    pub fn as_list_element(&self) -> Option<&Arc<Field>> {
        match self {
            List(f) => Some(f),
            _ => None,
        }
    }

    /// Get the union type if `self` is a union.
    pub fn as_union(&self) -> Option<&UnionDType> {
        match self {
            Union(u) => Some(u),
            _ => None,
        }
    }

    /// Create a list type.
    pub fn list(element: Field) -> Self {
        List(Arc::new(element))
    }

    /// Create a struct type.
    pub fn struct_(fields: impl Into<Arc<[Field]>>) -> Self {
        Struct(fields.into())
    }

    /// Create a dictionary type from its parts.
    pub fn dictionary(index: PType, dictionary: ArrayRef, ordered: bool) -> QuiverResult<Self> {
        DictionaryDType::try_new(index, dictionary, ordered).map(Dictionary)
    }
}

impl From<PType> for DType {
    fn from(value: PType) -> Self {
        Primitive(value)
    }
}

impl TryFrom<&DType> for PType {
    type Error = quiver_error::QuiverError;

    fn try_from(value: &DType) -> QuiverResult<Self> {
        match value {
            Primitive(p) => Ok(*p),
            _ => Err(quiver_err!("Cannot convert non-primitive DType {} into PType", value)),
        }
    }
}

impl Display for DateUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DateUnit::Day => write!(f, "day"),
            DateUnit::Millisecond => write!(f, "ms"),
        }
    }
}

impl Display for TimeUnit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeUnit::Second => write!(f, "s"),
            TimeUnit::Millisecond => write!(f, "ms"),
            TimeUnit::Microsecond => write!(f, "us"),
            TimeUnit::Nanosecond => write!(f, "ns"),
        }
    }
}

impl Display for DType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Null => write!(f, "null"),
            Bool => write!(f, "bool"),
            Primitive(p) => write!(f, "{}", p),
            Utf8 => write!(f, "utf8"),
            Binary => write!(f, "binary"),
            FixedSizeBinary(w) => write!(f, "fixed_size_binary({})", w),
            Date(unit) => write!(f, "date[{}]", unit),
            Time(unit) => write!(f, "time[{}]", unit),
            Timestamp(unit, None) => write!(f, "timestamp[{}]", unit),
            Timestamp(unit, Some(tz)) => write!(f, "timestamp[{}, {}]", unit, tz),
            List(element) => write!(f, "list<{}>", element),
            Struct(fields) => write!(f, "{{{}}}", fields.iter().join(", ")),
            Union(u) => write!(
                f,
                "union[{}]<{}>",
                match u.mode() {
                    UnionMode::Sparse => "sparse",
                    UnionMode::Dense => "dense",
                },
                u.fields()
                    .iter()
                    .zip(u.type_codes().iter())
                    .map(|(field, code)| format!("{}={}", code, field))
                    .join(", ")
            ),
            Dictionary(d) => write!(
                f,
                "dictionary<values={}, indices={}{}>",
                d.value_dtype(),
                d.index(),
                if d.is_ordered() { ", ordered" } else { "" }
            ),
        }
    }
}
