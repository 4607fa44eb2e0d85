use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};

use bytes::BufMut;
use quiver_error::{QuiverResult, quiver_err};

use crate::debug::HexPreview;
use crate::{Alignment, ByteBuffer, PADDING};

/// A mutable, growable buffer of bytes that can be frozen into a [`ByteBuffer`].
///
/// All growth goes through fallible reservation so that an oversized request surfaces as an
/// allocation error rather than aborting the process.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteBufferMut(Vec<u8>);

impl ByteBufferMut {
    /// Create a new empty buffer. Does not allocate.
    pub const fn empty() -> Self {
        Self(Vec::new())
    }

    /// Create a new buffer with room for at least `capacity` bytes.
    pub fn try_with_capacity(capacity: usize) -> QuiverResult<Self> {
        let mut buffer = Self::empty();
        buffer.try_reserve(capacity)?;
        Ok(buffer)
    }

    /// Create a new buffer of `len` zero bytes.
    pub fn try_zeroed(len: usize) -> QuiverResult<Self> {
        let mut buffer = Self::try_with_capacity(len)?;
        buffer.0.resize(len, 0);
        Ok(buffer)
    }

    /// Reserve room for at least `additional` more bytes.
    pub fn try_reserve(&mut self, additional: usize) -> QuiverResult<()> {
        self.0
            .try_reserve_exact(additional)
            .map_err(|_| quiver_err!(Allocation: additional))
    }

    /// Append the given bytes, reserving capacity fallibly.
    pub fn try_extend_from_slice(&mut self, bytes: &[u8]) -> QuiverResult<()> {
        if self.0.capacity() - self.0.len() < bytes.len() {
            self.try_reserve(bytes.len())?;
        }
        self.0.extend_from_slice(bytes);
        Ok(())
    }

    /// Append zero bytes until the length is a multiple of `alignment`.
    pub fn try_pad_to(&mut self, alignment: Alignment) -> QuiverResult<()> {
        let padding = alignment.padding_for(self.len());
        self.try_extend_from_slice(&PADDING[..padding])
    }

    /// Resize the buffer to `len` bytes, filling new bytes with `value`.
    pub fn try_resize(&mut self, len: usize, value: u8) -> QuiverResult<()> {
        if len > self.0.len() {
            self.try_reserve(len - self.0.len())?;
        }
        self.0.resize(len, value);
        Ok(())
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

    /// Number of bytes the buffer can hold without reallocating.
    pub fn capacity(&self) -> usize {
        self.0.capacity()
    }

    /// Remove all bytes, keeping the allocation.
    pub fn clear(&mut self) {
        self.0.clear()
    }

    /// Access the buffer as an immutable byte slice.
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Access the buffer as a mutable byte slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.0
    }

    /// Freeze the buffer into an immutable [`ByteBuffer`]. Does not copy.
    pub fn freeze(self) -> ByteBuffer {
        ByteBuffer::from(self.0)
    }

    /// Returns the underlying vector.
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

impl Debug for ByteBufferMut {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteBufferMut")
            .field("length", &self.len())
            .field("bytes", &HexPreview(self.as_slice()))
            .finish()
    }
}

impl Deref for ByteBufferMut {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for ByteBufferMut {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl AsRef<[u8]> for ByteBufferMut {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for ByteBufferMut {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<ByteBufferMut> for ByteBuffer {
    fn from(value: ByteBufferMut) -> Self {
        value.freeze()
    }
}

impl Extend<u8> for ByteBufferMut {
    fn extend<T: IntoIterator<Item = u8>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

impl<'a> Extend<&'a u8> for ByteBufferMut {
    fn extend<T: IntoIterator<Item = &'a u8>>(&mut self, iter: T) {
        self.0.extend(iter)
    }
}

// SAFETY: delegates to the BufMut implementation of Vec<u8>.
unsafe impl BufMut for ByteBufferMut {
    fn remaining_mut(&self) -> usize {
        self.0.remaining_mut()
    }

    unsafe fn advance_mut(&mut self, cnt: usize) {
        // SAFETY: the caller upholds the contract of BufMut::advance_mut.
        unsafe { self.0.advance_mut(cnt) }
    }

    fn chunk_mut(&mut self) -> &mut bytes::buf::UninitSlice {
        self.0.chunk_mut()
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.0.extend_from_slice(src)
    }
}
