use std::fmt::{Debug, Formatter};
use std::ops::{Bound, Deref, RangeBounds};

use bytes::{Buf, Bytes};
use quiver_error::{QuiverResult, quiver_bail, quiver_panic};

use crate::debug::HexPreview;
use crate::{Alignment, ByteBufferMut};

/// An immutable, cheaply cloneable buffer of bytes.
///
/// Clones and slices share the same underlying allocation, so a buffer produced by slicing a
/// message body keeps that body alive for as long as it exists.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteBuffer(Bytes);

impl ByteBuffer {
    /// Create a new empty buffer. Does not allocate.
    pub const fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Create a buffer that borrows a static slice.
    pub const fn from_static(bytes: &'static [u8]) -> Self {
        Self(Bytes::from_static(bytes))
    }

    /// Create a new buffer by copying the given bytes.
    pub fn copy_from(bytes: impl AsRef<[u8]>) -> Self {
        Self(Bytes::copy_from_slice(bytes.as_ref()))
    }

    /// Create a new buffer of `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::from(vec![0u8; len])
    }

    /// Length of the buffer in bytes.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the buffer holds no bytes.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Access the buffer as an immutable byte slice.
    #[inline(always)]
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// The alignment of the first byte of the buffer in memory.
    pub fn alignment(&self) -> Alignment {
        if self.is_empty() {
            return Alignment::new(64);
        }
        let addr = self.0.as_ptr() as usize;
        Alignment::new(1 << addr.trailing_zeros().min(6))
    }

    /// Returns a zero-copy slice of this buffer for the provided range.
    ///
    /// # Panics
    ///
    /// Requires that `begin <= end` and `end <= self.len()`.
    pub fn slice(&self, range: impl RangeBounds<usize>) -> Self {
        let (begin, end) = resolve_range(&range, self.len());
        if begin > end {
            quiver_panic!(
                "range start must not be greater than end: {:?} <= {:?}",
                begin,
                end
            );
        }
        if end > self.len() {
            quiver_panic!("range end out of bounds: {:?} <= {:?}", end, self.len());
        }
        if begin == end {
            // No need to hold a strong reference just to hold an empty slice.
            return Self::empty();
        }
        Self(self.0.slice(begin..end))
    }

    /// Returns a zero-copy slice of `length` bytes starting at `offset`, failing instead of
    /// panicking when the requested extent does not lie within the buffer.
    ///
    /// Use this for extents taken from untrusted metadata.
    pub fn try_slice(&self, offset: u64, length: u64) -> QuiverResult<Self> {
        let end = offset.checked_add(length);
        match end {
            Some(end) if end <= self.len() as u64 => {
                // Both values are bounded by self.len() which is a usize.
                #[allow(clippy::cast_possible_truncation)]
                let range = offset as usize..end as usize;
                Ok(self.slice(range))
            }
            _ => quiver_bail!(
                InvalidFormat: "buffer extent {}+{} lies outside of {} available bytes",
                offset,
                length,
                self.len()
            ),
        }
    }

    /// Whether two buffers are views over the exact same bytes in memory.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.0.as_ptr() == other.0.as_ptr() && self.len() == other.len()
    }

    /// Returns a reference to the underlying [`Bytes`].
    pub fn inner(&self) -> &Bytes {
        &self.0
    }

    /// Returns the underlying [`Bytes`].
    pub fn into_inner(self) -> Bytes {
        self.0
    }

    /// Convert into a mutable buffer, copying if the allocation is shared.
    pub fn into_mut(self) -> ByteBufferMut {
        ByteBufferMut::from(Vec::from(self.0))
    }
}

fn resolve_range(range: &impl RangeBounds<usize>, len: usize) -> (usize, usize) {
    let begin = match range.start_bound() {
        Bound::Included(&n) => n,
        Bound::Excluded(&n) => n.saturating_add(1),
        Bound::Unbounded => 0,
    };
    let end = match range.end_bound() {
        Bound::Included(&n) => n.saturating_add(1),
        Bound::Excluded(&n) => n,
        Bound::Unbounded => len,
    };
    (begin, end)
}

impl Debug for ByteBuffer {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("length", &self.len())
            .field("bytes", &HexPreview(self.as_slice()))
            .finish()
    }
}

impl Deref for ByteBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl AsRef<[u8]> for ByteBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl From<Vec<u8>> for ByteBuffer {
    fn from(value: Vec<u8>) -> Self {
        Self(Bytes::from(value))
    }
}

impl From<Bytes> for ByteBuffer {
    fn from(value: Bytes) -> Self {
        Self(value)
    }
}

impl From<ByteBuffer> for Bytes {
    fn from(value: ByteBuffer) -> Self {
        value.0
    }
}

impl From<&'static str> for ByteBuffer {
    fn from(value: &'static str) -> Self {
        Self::from_static(value.as_bytes())
    }
}

impl Buf for ByteBuffer {
    fn remaining(&self) -> usize {
        self.0.remaining()
    }

    fn chunk(&self) -> &[u8] {
        self.0.chunk()
    }

    fn advance(&mut self, cnt: usize) {
        self.0.advance(cnt)
    }

    fn copy_to_bytes(&mut self, len: usize) -> Bytes {
        self.0.copy_to_bytes(len)
    }
}
