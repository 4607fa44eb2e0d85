//! Named, typed columns and the schemas built from them.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use itertools::Itertools;

use crate::{DType, Nullability};

/// A name for a field
pub type FieldName = Arc<str>;

/// A named, typed column. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: FieldName,
    dtype: DType,
    nullability: Nullability,
}

impl Field {
    /// Create a new field.
    pub fn new(name: impl Into<FieldName>, dtype: DType, nullability: Nullability) -> Self {
        Self {
            name: name.into(),
            dtype,
            nullability,
        }
    }

    /// Create a new field whose values may be null.
    pub fn nullable(name: impl Into<FieldName>, dtype: DType) -> Self {
        Self::new(name, dtype, Nullability::Nullable)
    }

    /// Create a new field whose values are never null.
    pub fn non_nullable(name: impl Into<FieldName>, dtype: DType) -> Self {
        Self::new(name, dtype, Nullability::NonNullable)
    }

    /// The field's name.
    pub fn name(&self) -> &FieldName {
        &self.name
    }

    /// The field's logical type.
    pub fn dtype(&self) -> &DType {
        &self.dtype
    }

    /// Whether the field's values may be null.
    pub fn nullability(&self) -> Nullability {
        self.nullability
    }

    /// Shorthand for `self.nullability().is_nullable()`.
    pub fn is_nullable(&self) -> bool {
        self.nullability.is_nullable()
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}{}", self.name, self.dtype, self.nullability)
    }
}

/// A reference-counted [`Schema`].
pub type SchemaRef = Arc<Schema>;

/// An ordered list of fields describing the columns of a record batch.
///
/// Field order defines column order. Equality is structural.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Arc<[Field]>,
}

impl Schema {
    /// Create a schema from its fields.
    pub fn new(fields: impl Into<Arc<[Field]>>) -> Self {
        Self {
            fields: fields.into(),
        }
    }

    /// The schema's fields in column order.
    pub fn fields(&self) -> &Arc<[Field]> {
        &self.fields
    }

    /// The field at position `index`.
    pub fn field(&self, index: usize) -> Option<&Field> {
        self.fields.get(index)
    }

    /// The position of the first field with the given name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name().as_ref() == name)
    }

    /// The number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.fields.iter().join("\n"))
    }
}

impl FromIterator<Field> for Schema {
    fn from_iter<T: IntoIterator<Item = Field>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect::<Vec<_>>())
    }
}
