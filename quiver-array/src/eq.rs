//! Logical equality of arrays.
//!
//! Two arrays are equal when they have the same type, length, null positions and values at
//! every valid position. Physical details such as offsets, padding, the contents of null slots
//! and whether a trivial buffer is present or absent are not observable.

use crate::bitmap::{bitmaps_equal, get_bit};
use crate::{ArrayData, DType};

impl PartialEq for ArrayData {
    fn eq(&self, other: &Self) -> bool {
        if self.dtype() != other.dtype() || self.len() != other.len() {
            return false;
        }
        if self.null_count() != other.null_count() {
            return false;
        }
        if self.null_count() == 0 {
            if let Some(equal) = dense_values_eq(self, other) {
                return equal;
            }
        }
        (0..self.len()).all(|i| value_eq(self, i, other, i))
    }
}

/// Compare arrays without nulls whose values can be compared as contiguous memory.
fn dense_values_eq(a: &ArrayData, b: &ArrayData) -> Option<bool> {
    match a.dtype() {
        DType::Bool => Some(bitmaps_equal(
            &a.buffer(0),
            a.offset(),
            &b.buffer(0),
            b.offset(),
            a.len(),
        )),
        dtype => {
            let width = dtype.value_width()?;
            let a_values = a.buffer(0);
            let b_values = b.buffer(0);
            Some(
                a_values[a.offset() * width..(a.offset() + a.len()) * width]
                    == b_values[b.offset() * width..(b.offset() + b.len()) * width],
            )
        }
    }
}

/// Whether value `i` of `a` equals value `j` of `b`, given both arrays have the same type.
pub(crate) fn value_eq(a: &ArrayData, i: usize, b: &ArrayData, j: usize) -> bool {
    let (a_valid, b_valid) = (a.is_valid(i), b.is_valid(j));
    if a_valid != b_valid {
        return false;
    }
    if !a_valid {
        return true;
    }
    match a.dtype() {
        DType::Null => true,
        DType::Bool => {
            get_bit(&a.buffer(0), a.offset() + i) == get_bit(&b.buffer(0), b.offset() + j)
        }
        DType::Primitive(_)
        | DType::FixedSizeBinary(_)
        | DType::Date(_)
        | DType::Time(_)
        | DType::Timestamp(..) => a.fixed_value(i) == b.fixed_value(j),
        DType::Utf8 | DType::Binary => a.bytes_value(i) == b.bytes_value(j),
        DType::List(_) => {
            let (a_range, b_range) = (a.value_range(i), b.value_range(j));
            a_range.len() == b_range.len()
                && a_range
                    .zip(b_range)
                    .all(|(x, y)| value_eq(&a.children()[0], x, &b.children()[0], y))
        }
        DType::Struct(_) => a
            .children()
            .iter()
            .zip(b.children().iter())
            .all(|(ac, bc)| value_eq(ac, a.offset() + i, bc, b.offset() + j)),
        DType::Union(_) => {
            if a.type_id(i) != b.type_id(j) {
                return false;
            }
            let (child, a_slot) = a.union_slot(i);
            let (_, b_slot) = b.union_slot(j);
            value_eq(&a.children()[child], a_slot, &b.children()[child], b_slot)
        }
        DType::Dictionary(dict) => {
            let (Ok(x), Ok(y)) = (a.dictionary_key(i), b.dictionary_key(j)) else {
                return false;
            };
            let values = dict.dictionary();
            let other_values = match b.dtype() {
                DType::Dictionary(other) => other.dictionary(),
                _ => return false,
            };
            value_eq(values, x, other_values, y)
        }
    }
}
