use std::fmt::{Display, Formatter};

/// Whether the values of a [`crate::Field`] may be `null`.
///
/// Nullability is part of a field's identity for schema equality. It does not change the
/// physical layout of an array: any array other than [`crate::DType::Null`] may carry a
/// validity bitmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Nullability {
    /// Values are guaranteed to be non-null
    NonNullable,
    /// Values may be null
    #[default]
    Nullable,
}

impl Nullability {
    /// Whether values may be null.
    #[inline]
    pub fn is_nullable(&self) -> bool {
        matches!(self, Nullability::Nullable)
    }
}

impl From<bool> for Nullability {
    fn from(value: bool) -> Self {
        if value {
            Self::Nullable
        } else {
            Self::NonNullable
        }
    }
}

impl From<Nullability> for bool {
    fn from(value: Nullability) -> Self {
        value.is_nullable()
    }
}

impl Display for Nullability {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonNullable => write!(f, " not null"),
            Self::Nullable => Ok(()),
        }
    }
}
