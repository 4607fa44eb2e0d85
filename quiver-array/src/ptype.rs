//! Physical type definitions and behavior.

use std::fmt::{Debug, Display, Formatter};

use half::f16;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use num_traits::ToPrimitive;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use static_assertions::const_assert_eq;

/// Physical type enum, representing the in-memory width and interpretation of fixed-width
/// numeric values.
///
/// The discriminant is the tag used for this type in serialized metadata and must never be
/// reordered.
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd, Eq, Ord, Hash, IntoPrimitive, TryFromPrimitive,
)]
#[repr(u8)]
pub enum PType {
    /// An 8-bit unsigned integer
    U8 = 0,
    /// A 16-bit unsigned integer
    U16 = 1,
    /// A 32-bit unsigned integer
    U32 = 2,
    /// A 64-bit unsigned integer
    U64 = 3,
    /// An 8-bit signed integer
    I8 = 4,
    /// A 16-bit signed integer
    I16 = 5,
    /// A 32-bit signed integer
    I32 = 6,
    /// A 64-bit signed integer
    I64 = 7,
    /// A 16-bit floating point number
    F16 = 8,
    /// A 32-bit floating point number
    F32 = 9,
    /// A 64-bit floating point number
    F64 = 10,
}

const_assert_eq!(size_of::<f16>(), 2);

/// A trait for native Rust types that correspond 1:1 to a PType.
///
/// Values are always stored little-endian in Quiver buffers, so they are read and written
/// through explicit byte conversions rather than by reinterpreting memory.
pub trait NativePType:
    Send + Sync + Clone + Copy + Debug + Display + PartialEq + PartialOrd + Default + 'static
{
    /// The PType that corresponds to this native type
    const PTYPE: PType;

    /// Decode one value from exactly `size_of::<Self>()` little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;

    /// Append the little-endian encoding of this value to `out`.
    fn extend_le(self, out: &mut Vec<u8>);

    /// Whether two values are equal, comparing floating point values by their bits.
    fn is_eq(self, other: Self) -> bool;
}

macro_rules! native_ptype {
    ($T:ty, $ptype:tt) => {
        impl NativePType for $T {
            const PTYPE: PType = PType::$ptype;

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut le = [0u8; size_of::<$T>()];
                le.copy_from_slice(bytes);
                <$T>::from_le_bytes(le)
            }

            #[inline]
            fn extend_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn is_eq(self, other: Self) -> bool {
                self == other
            }
        }
    };
}

macro_rules! native_float_ptype {
    ($T:ty, $ptype:tt) => {
        impl NativePType for $T {
            const PTYPE: PType = PType::$ptype;

            #[inline]
            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut le = [0u8; size_of::<$T>()];
                le.copy_from_slice(bytes);
                <$T>::from_le_bytes(le)
            }

            #[inline]
            fn extend_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            #[inline]
            fn is_eq(self, other: Self) -> bool {
                self.to_bits() == other.to_bits()
            }
        }
    };
}

native_ptype!(u8, U8);
native_ptype!(u16, U16);
native_ptype!(u32, U32);
native_ptype!(u64, U64);
native_ptype!(i8, I8);
native_ptype!(i16, I16);
native_ptype!(i32, I32);
native_ptype!(i64, I64);
native_float_ptype!(f16, F16);
native_float_ptype!(f32, F32);
native_float_ptype!(f64, F64);

/// Macro to match over each PType, binding the corresponding native type (from `NativePType`)
#[macro_export]
macro_rules! match_each_native_ptype {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::PType;
        use $crate::half::f16;
        match $self {
            PType::I8 => __with__! { i8 },
            PType::I16 => __with__! { i16 },
            PType::I32 => __with__! { i32 },
            PType::I64 => __with__! { i64 },
            PType::U8 => __with__! { u8 },
            PType::U16 => __with__! { u16 },
            PType::U32 => __with__! { u32 },
            PType::U64 => __with__! { u64 },
            PType::F16 => __with__! { f16 },
            PType::F32 => __with__! { f32 },
            PType::F64 => __with__! { f64 },
        }
    })
}

/// Macro to match over each integer PType, binding the corresponding native type (from `NativePType`)
#[macro_export]
macro_rules! match_each_integer_ptype {
    ($self:expr, | $_:tt $enc:ident | $($body:tt)*) => ({
        macro_rules! __with__ {( $_ $enc:ident ) => ( $($body)* )}
        use $crate::PType;
        use $crate::quiver_error::quiver_panic;
        match $self {
            PType::I8 => __with__! { i8 },
            PType::I16 => __with__! { i16 },
            PType::I32 => __with__! { i32 },
            PType::I64 => __with__! { i64 },
            PType::U8 => __with__! { u8 },
            PType::U16 => __with__! { u16 },
            PType::U32 => __with__! { u32 },
            PType::U64 => __with__! { u64 },
            other => quiver_panic!("Unsupported ptype {}", other),
        }
    })
}

impl PType {
    /// Returns `true` iff this PType is an unsigned integer type
    #[inline]
    pub const fn is_unsigned_int(self) -> bool {
        matches!(self, Self::U8 | Self::U16 | Self::U32 | Self::U64)
    }

    /// Returns `true` iff this PType is a signed integer type
    #[inline]
    pub const fn is_signed_int(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns `true` iff this PType is an integer type, equivalent to
    /// `self.is_signed_int() || self.is_unsigned_int()`.
    #[inline]
    pub const fn is_int(self) -> bool {
        self.is_unsigned_int() || self.is_signed_int()
    }

    /// Returns `true` iff this PType is a floating point type
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }

    /// Returns the number of bytes in this PType
    #[inline]
    pub const fn byte_width(&self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 | Self::F16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Returns the number of bits in this PType
    #[inline]
    pub const fn bit_width(&self) -> usize {
        self.byte_width() * 8
    }

    /// The serialized tag of this PType.
    #[inline]
    pub fn tag(self) -> u32 {
        u8::from(self) as u32
    }

    /// Resolve a PType from its serialized tag.
    pub fn from_tag(tag: u32) -> QuiverResult<Self> {
        let Ok(tag) = u8::try_from(tag) else {
            quiver_bail!(InvalidFormat: "invalid primitive type tag {}", tag)
        };
        Self::try_from(tag).map_err(|_| quiver_err!(InvalidFormat: "invalid primitive type tag {}", tag))
    }
}

/// Read the integer at `index` of a little-endian buffer of integers of type `ptype`, widened
/// to `i64`.
///
/// Returns `None` for values of `u64` that do not fit in an `i64`.
pub fn read_integer(ptype: PType, bytes: &[u8], index: usize) -> QuiverResult<Option<i64>> {
    if !ptype.is_int() {
        quiver_bail!("{} is not an integer type", ptype)
    }
    let width = ptype.byte_width();
    let Some(slice) = bytes.get(index * width..(index + 1) * width) else {
        quiver_bail!(OutOfBounds: index, 0, bytes.len() / width)
    };
    Ok(match_each_integer_ptype!(ptype, |$T| {
        <$T as NativePType>::from_le_slice(slice).to_i64()
    }))
}

impl Display for PType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::U8 => write!(f, "u8"),
            Self::U16 => write!(f, "u16"),
            Self::U32 => write!(f, "u32"),
            Self::U64 => write!(f, "u64"),
            Self::I8 => write!(f, "i8"),
            Self::I16 => write!(f, "i16"),
            Self::I32 => write!(f, "i32"),
            Self::I64 => write!(f, "i64"),
            Self::F16 => write!(f, "f16"),
            Self::F32 => write!(f, "f32"),
            Self::F64 => write!(f, "f64"),
        }
    }
}
