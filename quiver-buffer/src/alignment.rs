use std::fmt::{Display, Formatter};
use std::ops::Deref;

use quiver_error::quiver_panic;

/// The alignment of a buffer, always a power of two.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment(usize);

impl Alignment {
    /// Create a new alignment.
    ///
    /// ## Panics
    ///
    /// Panics if `align` is not a power of 2, or is greater than the size of [`super::PADDING`].
    #[inline]
    pub const fn new(align: usize) -> Self {
        assert!(align > 0, "Alignment must be greater than 0");
        assert!(align <= 64, "Alignment must be at most 64 bytes");
        assert!(align.is_power_of_two(), "Alignment must be a power of 2");
        Self(align)
    }

    /// Create a new 1-byte alignment.
    #[inline]
    pub const fn none() -> Self {
        Self::new(1)
    }

    /// Align the buffer to the alignment of the given type.
    #[inline]
    pub const fn of<T>() -> Self {
        Self::new(align_of::<T>())
    }

    /// Check if this alignment is a "larger" than another alignment.
    ///
    /// For example, 16 bytes is aligned to 8 bytes, but 8 bytes is not aligned to 16 bytes.
    #[inline]
    pub fn is_aligned_to(&self, other: Alignment) -> bool {
        self.0.trailing_zeros() >= other.0.trailing_zeros()
    }

    /// Returns the log2 of the alignment.
    pub fn exponent(&self) -> u8 {
        u8::try_from(self.0.trailing_zeros()).unwrap_or_else(|_| {
            quiver_panic!("alignment exponent {} does not fit in u8", self.0.trailing_zeros())
        })
    }

    /// The number of zero bytes required after `len` bytes to reach the next multiple of this
    /// alignment.
    #[inline]
    pub fn padding_for(&self, len: usize) -> usize {
        let mask = self.0 - 1;
        ((len + mask) & !mask) - len
    }

    /// `len` rounded up to the next multiple of this alignment.
    #[inline]
    pub fn round_up(&self, len: usize) -> usize {
        len + self.padding_for(len)
    }

    /// Whether `value` already sits on a multiple of this alignment.
    #[inline]
    pub fn is_multiple(&self, value: u64) -> bool {
        value & (self.0 as u64 - 1) == 0
    }
}

impl Display for Alignment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Deref for Alignment {
    type Target = usize;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<usize> for Alignment {
    fn from(value: usize) -> Self {
        Self::new(value)
    }
}

impl From<Alignment> for usize {
    fn from(value: Alignment) -> Self {
        value.0
    }
}
