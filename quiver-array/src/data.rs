use std::ops::Range;
use std::sync::Arc;

use quiver_buffer::ByteBuffer;
use quiver_error::{QuiverExpect, QuiverResult, quiver_bail, quiver_err, quiver_panic};

use crate::bitmap::{BitmapBuilder, bitmap_byte_len, count_set_bits, get_bit};
use crate::ptype::read_integer;
use crate::{DType, DictionaryDType, Field, NativePType, UnionDType, UnionMode};

/// A reference-counted [`ArrayData`].
pub type ArrayRef = Arc<ArrayData>;

/// A typed column of values, stored as a validity bitmap, a list of raw buffers and a list of
/// child arrays.
///
/// The buffers each type expects, in order:
///
/// | type | buffers | children |
/// |------|---------|----------|
/// | null | none | none |
/// | bool | bit-packed values | none |
/// | primitive, date, time, timestamp, fixed-size binary | values | none |
/// | utf8, binary | `i32` offsets, values | none |
/// | list | `i32` offsets | the elements |
/// | struct | none | one per field |
/// | sparse union | `i8` type ids | one per field |
/// | dense union | `i8` type ids, `i32` offsets | one per field |
/// | dictionary | indices | none |
///
/// An array is a window of `len` values starting at `offset` into its buffers, which is how
/// [`ArrayData::slice`] avoids copying. Children of structs and sparse unions are indexed with
/// the same offset as their parent.
#[derive(Debug, Clone)]
pub struct ArrayData {
    dtype: DType,
    len: usize,
    offset: usize,
    null_count: usize,
    validity: Option<ByteBuffer>,
    buffers: Vec<Option<ByteBuffer>>,
    children: Vec<ArrayRef>,
}

impl ArrayData {
    /// Create an array from its parts, validating that the buffers and children describe `len`
    /// values of `dtype`.
    pub fn try_new(
        dtype: DType,
        len: usize,
        validity: Option<ByteBuffer>,
        buffers: Vec<Option<ByteBuffer>>,
        children: Vec<ArrayRef>,
    ) -> QuiverResult<Self> {
        if matches!(dtype, DType::Null) && validity.is_some() {
            quiver_bail!("null arrays cannot carry a validity bitmap")
        }
        if let Some(validity) = &validity {
            if validity.len() < bitmap_byte_len(len) {
                quiver_bail!(
                    InvalidFormat: "validity bitmap of {} bytes cannot hold {} values",
                    validity.len(),
                    len
                )
            }
        }
        let array = Self::new_unchecked(dtype, len, validity, buffers, children);
        array.validate()?;
        Ok(array)
    }

    /// Create an array from parts that are known to be consistent.
    fn new_unchecked(
        dtype: DType,
        len: usize,
        validity: Option<ByteBuffer>,
        buffers: Vec<Option<ByteBuffer>>,
        children: Vec<ArrayRef>,
    ) -> Self {
        let null_count = match (&dtype, &validity) {
            (DType::Null, _) => len,
            (_, Some(v)) => len - count_set_bits(v, 0, len),
            (_, None) => 0,
        };
        Self {
            dtype,
            len,
            offset: 0,
            null_count,
            validity,
            buffers,
            children,
        }
    }

    /// Create an array of `len` nulls.
    pub fn new_null(len: usize) -> Self {
        Self::new_unchecked(DType::Null, len, None, vec![], vec![])
    }

    /// Create a primitive array from optional values.
    pub fn from_primitive<T: NativePType>(values: impl IntoIterator<Item = Option<T>>) -> Self {
        let (validity, bytes, len) = collect_fixed(values);
        Self::new_unchecked(
            DType::Primitive(T::PTYPE),
            len,
            validity,
            vec![Some(bytes)],
            vec![],
        )
    }

    /// Create a primitive array with no nulls.
    pub fn from_values<T: NativePType>(values: impl IntoIterator<Item = T>) -> Self {
        Self::from_primitive(values.into_iter().map(Some))
    }

    /// Create a date, time or timestamp array from optional values of its storage type.
    pub fn from_temporal<T: NativePType>(
        dtype: DType,
        values: impl IntoIterator<Item = Option<T>>,
    ) -> QuiverResult<Self> {
        if !matches!(dtype, DType::Date(_) | DType::Time(_) | DType::Timestamp(..)) {
            quiver_bail!("{} is not a temporal type", dtype)
        }
        if dtype.storage_ptype() != Some(T::PTYPE) {
            quiver_bail!("{} cannot be stored as {}", dtype, T::PTYPE)
        }
        let (validity, bytes, len) = collect_fixed(values);
        Ok(Self::new_unchecked(
            dtype,
            len,
            validity,
            vec![Some(bytes)],
            vec![],
        ))
    }

    /// Create a boolean array from optional values.
    pub fn from_bools(values: impl IntoIterator<Item = Option<bool>>) -> Self {
        let mut validity = ValidityBuilder::default();
        let mut bits = BitmapBuilder::default();
        for value in values {
            validity.append(value.is_some());
            bits.append(value.unwrap_or_default());
        }
        let len = bits.len();
        Self::new_unchecked(
            DType::Bool,
            len,
            validity.finish(),
            vec![Some(bits.finish())],
            vec![],
        )
    }

    /// Create a UTF-8 array from optional strings.
    pub fn from_utf8<S: AsRef<str>>(values: impl IntoIterator<Item = Option<S>>) -> Self {
        let (validity, offsets, bytes, len) =
            collect_var(values.into_iter().map(|v| v.map(|s| s.as_ref().as_bytes().to_vec())));
        Self::new_unchecked(
            DType::Utf8,
            len,
            validity,
            vec![Some(offsets), Some(bytes)],
            vec![],
        )
    }

    /// Create a binary array from optional byte strings.
    pub fn from_binary<B: AsRef<[u8]>>(values: impl IntoIterator<Item = Option<B>>) -> Self {
        let (validity, offsets, bytes, len) =
            collect_var(values.into_iter().map(|v| v.map(|b| b.as_ref().to_vec())));
        Self::new_unchecked(
            DType::Binary,
            len,
            validity,
            vec![Some(offsets), Some(bytes)],
            vec![],
        )
    }

    /// Create a fixed-size binary array. Null slots are zero-filled.
    pub fn from_fixed_size_binary<B: AsRef<[u8]>>(
        width: usize,
        values: impl IntoIterator<Item = Option<B>>,
    ) -> QuiverResult<Self> {
        let mut validity = ValidityBuilder::default();
        let mut bytes = Vec::new();
        for value in values {
            validity.append(value.is_some());
            match value {
                Some(v) if v.as_ref().len() == width => bytes.extend_from_slice(v.as_ref()),
                Some(v) => quiver_bail!(
                    "value of {} bytes in fixed_size_binary({})",
                    v.as_ref().len(),
                    width
                ),
                None => bytes.resize(bytes.len() + width, 0),
            }
        }
        let len = validity.len();
        Ok(Self::new_unchecked(
            DType::FixedSizeBinary(width),
            len,
            validity.finish(),
            vec![Some(ByteBuffer::from(bytes))],
            vec![],
        ))
    }

    /// Create a list array from `len + 1` offsets into `values`.
    pub fn try_new_list(
        element: Field,
        offsets: &[i32],
        values: ArrayRef,
        validity: Option<ByteBuffer>,
    ) -> QuiverResult<Self> {
        if element.dtype() != values.dtype() {
            quiver_bail!(
                "list element type {} does not match values of type {}",
                element.dtype(),
                values.dtype()
            )
        }
        let len = offsets.len().saturating_sub(1);
        Self::try_new(
            DType::list(element),
            len,
            validity,
            vec![Some(offsets_buffer(offsets))],
            vec![values],
        )
    }

    /// Create a struct array of `len` rows from one child per field.
    pub fn try_new_struct(
        fields: impl Into<Arc<[Field]>>,
        len: usize,
        children: Vec<ArrayRef>,
        validity: Option<ByteBuffer>,
    ) -> QuiverResult<Self> {
        let fields = fields.into();
        if fields.len() != children.len() {
            quiver_bail!(
                "struct has {} fields but {} children",
                fields.len(),
                children.len()
            )
        }
        if let Some((field, child)) = fields
            .iter()
            .zip(children.iter())
            .find(|(_, child)| child.len() != len)
        {
            quiver_bail!(
                "struct field {} has {} values, expected {}",
                field.name(),
                child.len(),
                len
            )
        }
        Self::try_new(DType::Struct(fields), len, validity, vec![], children)
    }

    /// Create a union array. Dense unions require `value_offsets`, sparse unions must not have
    /// them.
    pub fn try_new_union(
        dtype: UnionDType,
        type_ids: &[i8],
        value_offsets: Option<&[i32]>,
        children: Vec<ArrayRef>,
        validity: Option<ByteBuffer>,
    ) -> QuiverResult<Self> {
        let type_ids = ByteBuffer::from(type_ids.iter().map(|id| *id as u8).collect::<Vec<_>>());
        let buffers = match (dtype.mode(), value_offsets) {
            (UnionMode::Sparse, None) => vec![Some(type_ids)],
            (UnionMode::Dense, Some(offsets)) => {
                vec![Some(type_ids), Some(offsets_buffer(offsets))]
            }
            (UnionMode::Sparse, Some(_)) => quiver_bail!("sparse unions have no value offsets"),
            (UnionMode::Dense, None) => quiver_bail!("dense unions require value offsets"),
        };
        let len = buffers[0].as_ref().map_or(0, |b| b.len());
        Self::try_new(DType::Union(dtype), len, validity, buffers, children)
    }

    /// Create a dictionary-encoded array from an integer array of indices.
    pub fn try_new_dictionary(dtype: DictionaryDType, indices: &ArrayData) -> QuiverResult<Self> {
        if indices.dtype() != &DType::Primitive(dtype.index()) {
            quiver_bail!(
                "dictionary indices must be {}, got {}",
                dtype.index(),
                indices.dtype()
            )
        }
        let array = Self {
            dtype: DType::Dictionary(dtype),
            len: indices.len,
            offset: indices.offset,
            null_count: indices.null_count,
            validity: indices.validity.clone(),
            buffers: indices.buffers.clone(),
            children: vec![],
        };
        array.validate()?;
        Ok(array)
    }

    /// The logical type of the values.
    #[inline]
    pub fn dtype(&self) -> &DType {
        &self.dtype
    }

    /// The number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the array holds no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The position of the first value in the buffers.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The number of null values.
    #[inline]
    pub fn null_count(&self) -> usize {
        self.null_count
    }

    /// The validity bitmap, indexed from [`ArrayData::offset`]. `None` when every value is
    /// valid.
    pub fn validity(&self) -> Option<&ByteBuffer> {
        self.validity.as_ref()
    }

    /// The type-specific buffers.
    pub fn buffers(&self) -> &[Option<ByteBuffer>] {
        &self.buffers
    }

    /// The child arrays of nested types.
    pub fn children(&self) -> &[ArrayRef] {
        &self.children
    }

    /// The buffer at `index`, or an empty buffer if it is absent.
    pub fn buffer(&self, index: usize) -> ByteBuffer {
        self.buffers
            .get(index)
            .and_then(|b| b.clone())
            .unwrap_or_default()
    }

    fn buffer_slice(&self, index: usize) -> &[u8] {
        self.buffers
            .get(index)
            .and_then(|b| b.as_ref())
            .map_or(&[], |b| b.as_slice())
    }

    /// Whether the value at `index` is not null.
    #[inline]
    pub fn is_valid(&self, index: usize) -> bool {
        if index >= self.len {
            quiver_panic!(OutOfBounds: index, 0, self.len)
        }
        match (&self.dtype, &self.validity) {
            (DType::Null, _) => false,
            (_, None) => true,
            (_, Some(v)) => get_bit(v, self.offset + index),
        }
    }

    /// Whether the value at `index` is null.
    #[inline]
    pub fn is_null(&self, index: usize) -> bool {
        !self.is_valid(index)
    }

    /// The value at `index` of a primitive or temporal array, or the index stored at `index`
    /// of a dictionary array. Null slots return whatever the buffer holds.
    pub fn value<T: NativePType>(&self, index: usize) -> T {
        let ptype = match &self.dtype {
            DType::Dictionary(d) => Some(d.index()),
            other => other.storage_ptype(),
        };
        if ptype != Some(T::PTYPE) {
            quiver_panic!("cannot read {} values from {}", T::PTYPE, self.dtype)
        }
        if index >= self.len {
            quiver_panic!(OutOfBounds: index, 0, self.len)
        }
        let width = size_of::<T>();
        let start = (self.offset + index) * width;
        T::from_le_slice(&self.buffer_slice(0)[start..start + width])
    }

    /// The value at `index` of a boolean array.
    pub fn bool_value(&self, index: usize) -> bool {
        if self.dtype != DType::Bool {
            quiver_panic!("cannot read bool values from {}", self.dtype)
        }
        if index >= self.len {
            quiver_panic!(OutOfBounds: index, 0, self.len)
        }
        get_bit(self.buffer_slice(0), self.offset + index)
    }

    /// The raw bytes of the fixed-width value at `index`.
    pub fn fixed_value(&self, index: usize) -> &[u8] {
        let Some(width) = self.dtype.value_width() else {
            quiver_panic!("{} does not have fixed-width values", self.dtype)
        };
        let start = (self.offset + index) * width;
        &self.buffer_slice(0)[start..start + width]
    }

    /// The offset stored at position `index` of a variable-length array's offsets, relative to
    /// [`ArrayData::offset`]. Absent offsets read as zero.
    pub fn value_offset(&self, index: usize) -> usize {
        if !matches!(self.dtype, DType::Utf8 | DType::Binary | DType::List(_)) {
            quiver_panic!("{} does not have value offsets", self.dtype)
        }
        read_offset(self.buffer_slice(0), self.offset + index)
    }

    /// The range of values or elements that make up the value at `index` of a utf8, binary or
    /// list array.
    pub fn value_range(&self, index: usize) -> Range<usize> {
        if index >= self.len {
            quiver_panic!(OutOfBounds: index, 0, self.len)
        }
        self.value_offset(index)..self.value_offset(index + 1)
    }

    /// The bytes of the value at `index` of a utf8, binary or fixed-size binary array.
    pub fn bytes_value(&self, index: usize) -> &[u8] {
        match self.dtype {
            DType::Utf8 | DType::Binary => &self.buffer_slice(1)[self.value_range(index)],
            DType::FixedSizeBinary(_) => self.fixed_value(index),
            _ => quiver_panic!("cannot read bytes from {}", self.dtype),
        }
    }

    /// The string at `index` of a utf8 array.
    pub fn str_value(&self, index: usize) -> QuiverResult<&str> {
        std::str::from_utf8(self.bytes_value(index))
            .map_err(|e| quiver_err!(InvalidFormat: "invalid utf8 at index {}: {}", index, e))
    }

    /// The type id stored at `index` of a union array.
    pub fn type_id(&self, index: usize) -> i8 {
        if self.dtype.as_union().is_none() {
            quiver_panic!("{} does not have type ids", self.dtype)
        }
        self.buffer_slice(0)[self.offset + index] as i8
    }

    /// The child and the position within that child holding the value at `index` of a union
    /// array.
    pub fn union_slot(&self, index: usize) -> (usize, usize) {
        let Some(union) = self.dtype.as_union() else {
            quiver_panic!("{} is not a union", self.dtype)
        };
        let child = union
            .child_index(self.type_id(index))
            .quiver_expect("type ids are validated on construction");
        let slot = match union.mode() {
            UnionMode::Sparse => self.offset + index,
            UnionMode::Dense => read_offset(self.buffer_slice(1), self.offset + index),
        };
        (child, slot)
    }

    /// The dictionary position referenced by the value at `index` of a dictionary array.
    pub fn dictionary_key(&self, index: usize) -> QuiverResult<usize> {
        let Some(dict) = self.dtype.as_dictionary() else {
            quiver_bail!("{} is not a dictionary", self.dtype)
        };
        let key = read_integer(dict.index(), self.buffer_slice(0), self.offset + index)?;
        key.and_then(|k| usize::try_from(k).ok()).ok_or_else(|| {
            quiver_err!(InvalidFormat: "dictionary key at index {} is out of range", index)
        })
    }

    /// A zero-copy window of `len` values starting at `offset`.
    pub fn slice(&self, offset: usize, len: usize) -> QuiverResult<Self> {
        let end = offset.checked_add(len);
        if end.is_none_or(|end| end > self.len) {
            quiver_bail!(OutOfBounds: offset.saturating_add(len), 0, self.len)
        }
        let offset = self.offset + offset;
        let null_count = match (&self.dtype, &self.validity) {
            (DType::Null, _) => len,
            (_, Some(v)) => len - count_set_bits(v, offset, len),
            (_, None) => 0,
        };
        Ok(Self {
            dtype: self.dtype.clone(),
            len,
            offset,
            null_count,
            validity: self.validity.clone(),
            buffers: self.buffers.clone(),
            children: self.children.clone(),
        })
    }

    /// Check that every buffer and child is large enough for the values in this array and that
    /// every offset, type id and dictionary key points inside its target.
    pub fn validate(&self) -> QuiverResult<()> {
        let end = self.extent(1)?;
        let (nbuffers, nchildren) = expected_layout(&self.dtype);
        if self.buffers.len() != nbuffers {
            quiver_bail!(
                InvalidFormat: "{} expects {} buffers, got {}",
                self.dtype,
                nbuffers,
                self.buffers.len()
            )
        }
        if self.children.len() != nchildren {
            quiver_bail!(
                InvalidFormat: "{} expects {} children, got {}",
                self.dtype,
                nchildren,
                self.children.len()
            )
        }
        for (field, child) in self.dtype.children().iter().zip(self.children.iter()) {
            if field.dtype() != child.dtype() {
                quiver_bail!(
                    InvalidFormat: "child {} has type {}, expected {}",
                    field.name(),
                    child.dtype(),
                    field.dtype()
                )
            }
        }
        if let Some(validity) = &self.validity {
            check_len("validity", validity.len(), bitmap_byte_len(end))?;
        }

        match &self.dtype {
            DType::Null => {}
            DType::Bool => check_len("values", self.buffer_slice(0).len(), bitmap_byte_len(end))?,
            DType::Primitive(_)
            | DType::FixedSizeBinary(_)
            | DType::Date(_)
            | DType::Time(_)
            | DType::Timestamp(..) => {
                let width = self.dtype.value_width().unwrap_or_default();
                check_len("values", self.buffer_slice(0).len(), self.extent(width)?)?;
            }
            DType::Utf8 | DType::Binary => {
                let values = self.buffer_slice(1);
                self.validate_offsets(values.len())?;
                if self.dtype == DType::Utf8 {
                    for i in (0..self.len).filter(|i| self.is_valid(*i)) {
                        self.str_value(i)?;
                    }
                }
            }
            DType::List(_) => self.validate_offsets(self.children[0].len())?,
            DType::Struct(_) => {
                for child in &self.children {
                    check_len("struct child", child.len(), end)?;
                }
            }
            DType::Union(union) => {
                check_len("type ids", self.buffer_slice(0).len(), end)?;
                if union.mode() == UnionMode::Dense {
                    check_len("union offsets", self.buffer_slice(1).len(), self.extent(4)?)?;
                }
                for i in 0..self.len {
                    let Some(child) = union.child_index(self.type_id(i)) else {
                        quiver_bail!(
                            InvalidFormat: "type id {} at index {} is not a member of {}",
                            self.type_id(i),
                            i,
                            self.dtype
                        )
                    };
                    let slot = match union.mode() {
                        UnionMode::Sparse => self.offset + i,
                        UnionMode::Dense => read_offset(self.buffer_slice(1), self.offset + i),
                    };
                    if slot >= self.children[child].len() {
                        quiver_bail!(
                            InvalidFormat: "union slot {} at index {} exceeds child of length {}",
                            slot,
                            i,
                            self.children[child].len()
                        )
                    }
                }
            }
            DType::Dictionary(dict) => {
                check_len(
                    "indices",
                    self.buffer_slice(0).len(),
                    self.extent(dict.index().byte_width())?,
                )?;
                for i in (0..self.len).filter(|i| self.is_valid(*i)) {
                    let key = self.dictionary_key(i)?;
                    if key >= dict.dictionary().len() {
                        quiver_bail!(
                            InvalidFormat: "dictionary key {} at index {} exceeds dictionary of length {}",
                            key,
                            i,
                            dict.dictionary().len()
                        )
                    }
                }
            }
        }
        Ok(())
    }

    /// Bytes spanned by `offset + len` slots of `width` bytes each.
    fn extent(&self, width: usize) -> QuiverResult<usize> {
        self.offset
            .checked_add(self.len)
            .and_then(|end| end.checked_mul(width))
            .ok_or_else(|| {
                quiver_err!(
                    InvalidFormat: "{} values of {} bytes at offset {} overflow",
                    self.len,
                    width,
                    self.offset
                )
            })
    }

    fn validate_offsets(&self, target_len: usize) -> QuiverResult<()> {
        let offsets = self.buffer_slice(0);
        if offsets.is_empty() && self.len == 0 {
            return Ok(());
        }
        let end = self.extent(1)?;
        let Some(needed) = self.extent(4)?.checked_add(4) else {
            quiver_bail!(InvalidFormat: "offsets for {} values overflow", self.len)
        };
        check_len("offsets", offsets.len(), needed)?;
        let mut previous = 0;
        for i in self.offset..=end {
            let value = i32::from_le_slice(&offsets[i * 4..i * 4 + 4]);
            let Ok(value) = usize::try_from(value) else {
                quiver_bail!(InvalidFormat: "negative offset {} at position {}", value, i)
            };
            if i > self.offset && value < previous {
                quiver_bail!(
                    InvalidFormat: "offsets decrease from {} to {} at position {}",
                    previous,
                    value,
                    i
                )
            }
            previous = value;
        }
        if previous > target_len {
            quiver_bail!(
                InvalidFormat: "offset {} exceeds {} available values",
                previous,
                target_len
            )
        }
        Ok(())
    }
}

/// The number of buffers and children an array of `dtype` carries.
pub fn expected_layout(dtype: &DType) -> (usize, usize) {
    match dtype {
        DType::Null => (0, 0),
        DType::Bool
        | DType::Primitive(_)
        | DType::FixedSizeBinary(_)
        | DType::Date(_)
        | DType::Time(_)
        | DType::Timestamp(..)
        | DType::Dictionary(_) => (1, 0),
        DType::Utf8 | DType::Binary => (2, 0),
        DType::List(_) => (1, 1),
        DType::Struct(fields) => (0, fields.len()),
        DType::Union(union) => match union.mode() {
            UnionMode::Sparse => (1, union.fields().len()),
            UnionMode::Dense => (2, union.fields().len()),
        },
    }
}

fn check_len(what: &str, actual: usize, required: usize) -> QuiverResult<()> {
    if actual < required {
        quiver_bail!(
            InvalidFormat: "{} buffer of {} bytes is shorter than the {} bytes required",
            what,
            actual,
            required
        )
    }
    Ok(())
}

fn read_offset(offsets: &[u8], index: usize) -> usize {
    match offsets.get(index * 4..index * 4 + 4) {
        // Offsets are validated to be non-negative on construction.
        Some(bytes) => i32::from_le_slice(bytes).max(0) as usize,
        None => 0,
    }
}

fn offsets_buffer(offsets: &[i32]) -> ByteBuffer {
    let mut bytes = Vec::with_capacity(offsets.len() * 4);
    offsets.iter().for_each(|o| o.extend_le(&mut bytes));
    ByteBuffer::from(bytes)
}

#[derive(Default)]
struct ValidityBuilder {
    bits: BitmapBuilder,
    nulls: usize,
}

impl ValidityBuilder {
    fn append(&mut self, valid: bool) {
        self.nulls += usize::from(!valid);
        self.bits.append(valid);
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn finish(self) -> Option<ByteBuffer> {
        (self.nulls > 0).then(|| self.bits.finish())
    }
}

fn collect_fixed<T: NativePType>(
    values: impl IntoIterator<Item = Option<T>>,
) -> (Option<ByteBuffer>, ByteBuffer, usize) {
    let mut validity = ValidityBuilder::default();
    let mut bytes = Vec::new();
    for value in values {
        validity.append(value.is_some());
        value.unwrap_or_default().extend_le(&mut bytes);
    }
    let len = validity.len();
    (validity.finish(), ByteBuffer::from(bytes), len)
}

fn collect_var(
    values: impl IntoIterator<Item = Option<Vec<u8>>>,
) -> (Option<ByteBuffer>, ByteBuffer, ByteBuffer, usize) {
    let mut validity = ValidityBuilder::default();
    let mut offsets = vec![0i32];
    let mut bytes = Vec::new();
    for value in values {
        validity.append(value.is_some());
        if let Some(value) = value {
            bytes.extend_from_slice(&value);
        }
        offsets.push(
            i32::try_from(bytes.len())
                .ok()
                .quiver_expect("variable-length values exceed 32-bit offsets"),
        );
    }
    let len = validity.len();
    (
        validity.finish(),
        offsets_buffer(&offsets),
        ByteBuffer::from(bytes),
        len,
    )
}
