//! Bit-packed buffers, least significant bit first, as used for validity and boolean values.

use quiver_buffer::ByteBuffer;

/// The number of bytes needed to hold `bits` bits.
#[inline]
pub const fn bitmap_byte_len(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Read bit `index` of a bitmap.
#[inline]
pub fn get_bit(bytes: &[u8], index: usize) -> bool {
    bytes[index >> 3] & (1 << (index & 7)) != 0
}

/// Set bit `index` of a bitmap.
#[inline]
pub fn set_bit(bytes: &mut [u8], index: usize) {
    bytes[index >> 3] |= 1 << (index & 7);
}

/// Count the set bits in `bytes` within `[offset, offset + len)`.
pub fn count_set_bits(bytes: &[u8], offset: usize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let end = offset + len;
    let first_full = offset.div_ceil(8);
    let last_full = end / 8;
    if first_full >= last_full {
        return (offset..end).filter(|i| get_bit(bytes, *i)).count();
    }

    let head = (offset..first_full * 8).filter(|i| get_bit(bytes, *i)).count();
    let body: usize = bytes[first_full..last_full]
        .iter()
        .map(|b| b.count_ones() as usize)
        .sum();
    let tail = (last_full * 8..end).filter(|i| get_bit(bytes, *i)).count();
    head + body + tail
}

/// Copy `len` bits starting at bit `offset` into a new bitmap starting at bit zero.
///
/// Byte-aligned windows are sliced without copying.
pub fn slice_bitmap(bitmap: &ByteBuffer, offset: usize, len: usize) -> ByteBuffer {
    if offset % 8 == 0 {
        let start = offset / 8;
        return bitmap.slice(start..start + bitmap_byte_len(len));
    }
    let mut builder = BitmapBuilder::with_capacity(len);
    for i in offset..offset + len {
        builder.append(get_bit(bitmap, i));
    }
    builder.finish()
}

/// Whether two bitmap windows of `len` bits hold the same bits.
pub fn bitmaps_equal(a: &[u8], a_offset: usize, b: &[u8], b_offset: usize, len: usize) -> bool {
    if a_offset % 8 == 0 && b_offset % 8 == 0 {
        let (a_start, b_start) = (a_offset / 8, b_offset / 8);
        let full = len / 8;
        if a[a_start..a_start + full] != b[b_start..b_start + full] {
            return false;
        }
        return (full * 8..len).all(|i| get_bit(a, a_offset + i) == get_bit(b, b_offset + i));
    }
    (0..len).all(|i| get_bit(a, a_offset + i) == get_bit(b, b_offset + i))
}

/// Incrementally builds a bitmap.
#[derive(Debug, Default)]
pub struct BitmapBuilder {
    bytes: Vec<u8>,
    len: usize,
}

impl BitmapBuilder {
    /// Create a builder with room for `bits` bits.
    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bitmap_byte_len(bits)),
            len: 0,
        }
    }

    /// Append one bit.
    #[inline]
    pub fn append(&mut self, bit: bool) {
        if self.len % 8 == 0 {
            self.bytes.push(0);
        }
        if bit {
            set_bit(&mut self.bytes, self.len);
        }
        self.len += 1;
    }

    /// The number of bits appended so far.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no bits have been appended.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Finish the bitmap.
    pub fn finish(self) -> ByteBuffer {
        ByteBuffer::from(self.bytes)
    }
}

impl FromIterator<bool> for BitmapBuilder {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut builder = Self::with_capacity(iter.size_hint().0);
        iter.for_each(|b| builder.append(b));
        builder
    }
}
