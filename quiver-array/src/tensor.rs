use itertools::Itertools;
use quiver_buffer::ByteBuffer;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};

use crate::PType;

/// A dense n-dimensional array of fixed-width numeric values.
///
/// Strides are in bytes. A tensor with an empty shape is a scalar holding one value.
#[derive(Debug, Clone)]
pub struct Tensor {
    ptype: PType,
    data: ByteBuffer,
    shape: Vec<i64>,
    strides: Vec<i64>,
    dim_names: Vec<String>,
}

impl Tensor {
    /// Create a tensor over `data`.
    ///
    /// Empty `strides` are filled with the row-major strides of `shape`. `dim_names` must be
    /// empty or name every dimension.
    pub fn try_new(
        ptype: PType,
        data: ByteBuffer,
        shape: Vec<i64>,
        strides: Vec<i64>,
        dim_names: Vec<String>,
    ) -> QuiverResult<Self> {
        if let Some(dim) = shape.iter().find(|d| **d < 0) {
            quiver_bail!("tensor dimensions must not be negative, got {}", dim)
        }
        if element_count(&shape).is_none() {
            quiver_bail!("tensor of shape [{}] has too many elements", shape.iter().join(", "))
        }
        let strides = if strides.is_empty() {
            row_major_strides(ptype, &shape).ok_or_else(|| {
                quiver_err!("row-major strides of shape [{}] overflow", shape.iter().join(", "))
            })?
        } else {
            strides
        };
        if strides.len() != shape.len() {
            quiver_bail!(
                "tensor has {} dimensions but {} strides",
                shape.len(),
                strides.len()
            )
        }
        if let Some(stride) = strides.iter().find(|s| **s < 0) {
            quiver_bail!("tensor strides must not be negative, got {}", stride)
        }
        if !dim_names.is_empty() && dim_names.len() != shape.len() {
            quiver_bail!(
                "tensor has {} dimensions but {} dimension names",
                shape.len(),
                dim_names.len()
            )
        }

        let tensor = Self {
            ptype,
            data,
            shape,
            strides,
            dim_names,
        };
        let Some(extent) = tensor.extent() else {
            quiver_bail!(
                "tensor of shape [{}] addresses too many bytes",
                tensor.shape.iter().join(", ")
            )
        };
        if !u64::try_from(extent).is_ok_and(|extent| extent <= tensor.data.len() as u64) {
            quiver_bail!(
                "tensor data of {} bytes cannot hold {} addressed bytes",
                tensor.data.len(),
                extent
            )
        }
        Ok(tensor)
    }

    /// The element type.
    pub fn ptype(&self) -> PType {
        self.ptype
    }

    /// The buffer holding the elements.
    pub fn data(&self) -> &ByteBuffer {
        &self.data
    }

    /// The size of each dimension.
    pub fn shape(&self) -> &[i64] {
        &self.shape
    }

    /// The byte stride of each dimension.
    pub fn strides(&self) -> &[i64] {
        &self.strides
    }

    /// The dimension names, empty when the dimensions are unnamed.
    pub fn dim_names(&self) -> &[String] {
        &self.dim_names
    }

    /// The name of dimension `index`, or the empty string when unnamed.
    pub fn dim_name(&self, index: usize) -> &str {
        self.dim_names.get(index).map_or("", |n| n.as_str())
    }

    /// The number of dimensions.
    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    /// The number of elements.
    pub fn size(&self) -> i64 {
        element_count(&self.shape).unwrap_or_default()
    }

    /// Whether the strides are the unique row-major strides of the shape.
    pub fn is_contiguous(&self) -> bool {
        row_major_strides(self.ptype, &self.shape).is_some_and(|strides| strides == self.strides)
    }

    /// The number of bytes from the start of the data addressed by the tensor's elements, or
    /// `None` if it does not fit in an `i64`.
    fn extent(&self) -> Option<i64> {
        if self.shape.contains(&0) {
            return Some(0);
        }
        self.shape
            .iter()
            .zip(self.strides.iter())
            .try_fold(self.ptype.byte_width() as i64, |extent, (dim, stride)| {
                (dim - 1).checked_mul(*stride)?.checked_add(extent)
            })
    }

    /// The byte offset of the element at row-major position `index`.
    // Offsets are bounded by the extent checked in `try_new`.
    #[allow(clippy::cast_possible_truncation)]
    fn element_offset(&self, mut index: i64) -> usize {
        let mut offset = 0;
        for (dim, stride) in self.shape.iter().zip(self.strides.iter()).rev() {
            offset += (index % dim) * stride;
            index /= dim;
        }
        offset as usize
    }

    /// The bytes of the element at row-major position `index`.
    pub fn element(&self, index: i64) -> &[u8] {
        let start = self.element_offset(index);
        &self.data[start..start + self.ptype.byte_width()]
    }
}

/// The strides, in bytes, of a row-major layout of `shape`, or `None` if they overflow.
pub fn row_major_strides(ptype: PType, shape: &[i64]) -> Option<Vec<i64>> {
    let mut remaining = ptype.byte_width() as i64;
    let mut strides = vec![0; shape.len()];
    for (i, (stride, dim)) in strides.iter_mut().zip(shape.iter()).enumerate().rev() {
        *stride = remaining;
        if i > 0 {
            remaining = remaining.checked_mul(*dim)?;
        }
    }
    Some(strides)
}

/// The product of `shape`, or `None` if it does not fit in an `i64`.
fn element_count(shape: &[i64]) -> Option<i64> {
    if shape.contains(&0) {
        return Some(0);
    }
    shape.iter().try_fold(1i64, |count, dim| count.checked_mul(*dim))
}

impl PartialEq for Tensor {
    /// Tensors are equal when their types, shapes, names and elements are equal, regardless of
    /// how the elements are laid out.
    fn eq(&self, other: &Self) -> bool {
        self.ptype == other.ptype
            && self.shape == other.shape
            && self.dim_names == other.dim_names
            && (0..self.size()).all(|i| self.element(i) == other.element(i))
    }
}
