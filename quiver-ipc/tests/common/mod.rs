//! Batches covering every column type, built from a seeded generator.

#![allow(dead_code, clippy::unwrap_used, clippy::cast_possible_truncation)]

use std::sync::Arc;

use quiver_array::{
    ArrayData, ArrayRef, DType, DateUnit, Field, PType, RecordBatch, Schema, TimeUnit, UnionDType,
    UnionMode,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const LENGTH: usize = 50;

pub fn rng() -> StdRng {
    StdRng::seed_from_u64(0x5155_4956)
}

/// A batch whose schema has one nullable field per column, named after its position.
pub fn batch_of(columns: Vec<ArrayRef>) -> RecordBatch {
    let fields = columns
        .iter()
        .enumerate()
        .map(|(i, column)| Field::nullable(format!("f{i}"), column.dtype().clone()))
        .collect::<Vec<_>>();
    RecordBatch::try_from_columns(Schema::new(fields), columns).unwrap()
}

fn maybe<T>(rng: &mut StdRng, value: T) -> Option<T> {
    rng.random_bool(0.8).then_some(value)
}

pub fn primitive<T>(rng: &mut StdRng, len: usize, nulls: bool) -> ArrayRef
where
    T: quiver_array::NativePType,
    rand::distr::StandardUniform: rand::distr::Distribution<T>,
{
    let values = (0..len)
        .map(|_| {
            let value = rng.random::<T>();
            if nulls { maybe(rng, value) } else { Some(value) }
        })
        .collect::<Vec<_>>();
    Arc::new(ArrayData::from_primitive(values))
}

pub fn int_batch() -> RecordBatch {
    let mut rng = rng();
    batch_of(vec![
        primitive::<i8>(&mut rng, LENGTH, true),
        primitive::<u8>(&mut rng, LENGTH, true),
        primitive::<i16>(&mut rng, LENGTH, true),
        primitive::<u16>(&mut rng, LENGTH, true),
        primitive::<i32>(&mut rng, LENGTH, true),
        primitive::<u32>(&mut rng, LENGTH, true),
        primitive::<i64>(&mut rng, LENGTH, true),
        primitive::<u64>(&mut rng, LENGTH, true),
        primitive::<f32>(&mut rng, LENGTH, true),
        primitive::<f64>(&mut rng, LENGTH, true),
    ])
}

pub fn non_null_batch() -> RecordBatch {
    let mut rng = rng();
    batch_of(vec![
        primitive::<i32>(&mut rng, LENGTH, false),
        primitive::<f64>(&mut rng, LENGTH, false),
        Arc::new(ArrayData::from_utf8((0..LENGTH).map(|i| Some(i.to_string())))),
    ])
}

pub fn boolean_batch() -> RecordBatch {
    let mut rng = rng();
    let values = (0..LENGTH)
        .map(|_| {
            let value = rng.random_bool(0.5);
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    batch_of(vec![
        Arc::new(ArrayData::from_bools(values)),
        Arc::new(ArrayData::from_bools((0..LENGTH).map(|i| Some(i % 3 == 0)))),
    ])
}

fn random_bytes(rng: &mut StdRng, max_len: usize) -> Vec<u8> {
    let len = rng.random_range(0..=max_len);
    (0..len).map(|_| rng.random()).collect()
}

fn random_string(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.random_range(0..=max_len);
    (0..len).map(|_| rng.random_range('a'..='z')).collect()
}

pub fn utf8_array(rng: &mut StdRng, len: usize) -> ArrayRef {
    let values = (0..len)
        .map(|_| {
            let value = random_string(rng, 12);
            maybe(rng, value)
        })
        .collect::<Vec<_>>();
    Arc::new(ArrayData::from_utf8(values))
}

pub fn strings_batch() -> RecordBatch {
    let mut rng = rng();
    let binary = (0..LENGTH)
        .map(|_| {
            let value = random_bytes(&mut rng, 20);
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    batch_of(vec![
        utf8_array(&mut rng, LENGTH),
        Arc::new(ArrayData::from_binary(binary)),
    ])
}

pub fn fixed_width_binary_batch() -> RecordBatch {
    let mut rng = rng();
    let values = (0..LENGTH)
        .map(|_| {
            let value: [u8; 7] = rng.random();
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    batch_of(vec![Arc::new(
        ArrayData::from_fixed_size_binary(7, values).unwrap(),
    )])
}

/// A list column whose lists have between zero and four elements, some of them null.
pub fn list_array(rng: &mut StdRng, len: usize, values: impl Fn(&mut StdRng, usize) -> ArrayRef) -> ArrayRef {
    let mut offsets = vec![0i32];
    let mut valid = vec![];
    for _ in 0..len {
        let is_valid = rng.random_bool(0.8);
        let size = if is_valid { rng.random_range(0..5i32) } else { 0 };
        valid.push(is_valid);
        offsets.push(offsets[offsets.len() - 1] + size);
    }
    let total = usize::try_from(offsets[len]).unwrap();
    let values = values(rng, total);
    let validity = valid
        .into_iter()
        .collect::<quiver_array::bitmap::BitmapBuilder>()
        .finish();
    Arc::new(
        ArrayData::try_new_list(
            Field::nullable("item", values.dtype().clone()),
            &offsets,
            values,
            Some(validity),
        )
        .unwrap(),
    )
}

pub fn list_batch() -> RecordBatch {
    let mut rng = rng();
    batch_of(vec![
        list_array(&mut rng, LENGTH, |rng, len| primitive::<i32>(rng, len, true)),
        list_array(&mut rng, LENGTH, utf8_array),
        list_array(&mut rng, LENGTH, |rng, len| {
            list_array(rng, len, |rng, len| primitive::<i16>(rng, len, true))
        }),
    ])
}

/// One column of lists nested `depth` levels deep around `i32` values.
pub fn deeply_nested_list_batch(depth: usize) -> RecordBatch {
    let len = 5;
    let mut column: ArrayRef = Arc::new(ArrayData::from_values((0..len).map(|v| v as i32)));
    let offsets = (0..=len).map(|v| v as i32).collect::<Vec<_>>();
    for _ in 0..depth {
        column = Arc::new(
            ArrayData::try_new_list(
                Field::nullable("item", column.dtype().clone()),
                &offsets,
                column,
                None,
            )
            .unwrap(),
        );
    }
    batch_of(vec![column])
}

pub fn struct_array(rng: &mut StdRng, len: usize) -> ArrayRef {
    let fields = vec![
        Field::nullable("i", DType::Primitive(PType::I32)),
        Field::nullable("s", DType::Utf8),
        Field::nullable("l", DType::list(Field::nullable("item", DType::Primitive(PType::I32)))),
    ];
    let children = vec![
        primitive::<i32>(rng, len, true),
        utf8_array(rng, len),
        list_array(rng, len, |rng, len| primitive::<i32>(rng, len, true)),
    ];
    let validity = (0..len)
        .map(|i| i % 5 != 2)
        .collect::<quiver_array::bitmap::BitmapBuilder>()
        .finish();
    Arc::new(ArrayData::try_new_struct(fields, len, children, Some(validity)).unwrap())
}

pub fn struct_batch() -> RecordBatch {
    let mut rng = rng();
    batch_of(vec![struct_array(&mut rng, LENGTH), struct_array(&mut rng, LENGTH)])
}

fn union_fields() -> Vec<Field> {
    vec![
        Field::nullable("i", DType::Primitive(PType::I32)),
        Field::nullable("s", DType::Utf8),
    ]
}

pub fn sparse_union_array(rng: &mut StdRng, len: usize) -> ArrayRef {
    let dtype = UnionDType::try_new(UnionMode::Sparse, union_fields(), vec![0i8, 1]).unwrap();
    let type_ids = (0..len).map(|_| rng.random_range(0..2)).collect::<Vec<i8>>();
    let children = vec![primitive::<i32>(rng, len, true), utf8_array(rng, len)];
    Arc::new(ArrayData::try_new_union(dtype, &type_ids, None, children, None).unwrap())
}

pub fn dense_union_array(rng: &mut StdRng, len: usize) -> ArrayRef {
    let codes = [5i8, 0];
    let dtype = UnionDType::try_new(UnionMode::Dense, union_fields(), codes.to_vec()).unwrap();
    let mut counts = [0i32; 2];
    let mut type_ids = vec![];
    let mut offsets = vec![];
    for _ in 0..len {
        let child = rng.random_range(0..2);
        type_ids.push(codes[child]);
        offsets.push(counts[child]);
        counts[child] += 1;
    }
    let children = vec![
        primitive::<i32>(rng, usize::try_from(counts[0]).unwrap(), true),
        utf8_array(rng, usize::try_from(counts[1]).unwrap()),
    ];
    Arc::new(ArrayData::try_new_union(dtype, &type_ids, Some(&offsets), children, None).unwrap())
}

pub fn union_batch() -> RecordBatch {
    let mut rng = rng();
    batch_of(vec![
        sparse_union_array(&mut rng, LENGTH),
        dense_union_array(&mut rng, LENGTH),
    ])
}

/// A dictionary-encoded column of `len` rows over `dictionary`.
pub fn dictionary_array(rng: &mut StdRng, dictionary: &ArrayRef, len: usize) -> ArrayRef {
    let dtype = DType::dictionary(PType::I32, dictionary.clone(), false).unwrap();
    let size = i32::try_from(dictionary.len()).unwrap();
    let indices = (0..len)
        .map(|_| {
            let key = rng.random_range(0..size);
            maybe(rng, key)
        })
        .collect::<Vec<_>>();
    Arc::new(
        ArrayData::try_new_dictionary(
            dtype.as_dictionary().unwrap().clone(),
            &ArrayData::from_primitive(indices),
        )
        .unwrap(),
    )
}

/// Two columns sharing one dictionary, the second one inside a list, and a third column with
/// a dictionary of its own.
pub fn dictionary_batch() -> RecordBatch {
    let mut rng = rng();
    let shared: ArrayRef = Arc::new(ArrayData::from_utf8([Some("foo"), Some("bar"), Some("baz")]));
    let other: ArrayRef = Arc::new(ArrayData::from_values([10i64, 20, 30, 40]));
    batch_of(vec![
        dictionary_array(&mut rng, &shared, LENGTH),
        list_array(&mut rng, LENGTH, |rng, len| dictionary_array(rng, &shared, len)),
        dictionary_array(&mut rng, &other, LENGTH),
    ])
}

pub fn dates_batch() -> RecordBatch {
    let mut rng = rng();
    let days = (0..LENGTH)
        .map(|_| {
            let value = rng.random_range(-20_000i32..20_000);
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    let millis = (0..LENGTH)
        .map(|_| {
            let value = rng.random_range(0i64..1_700_000_000_000);
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    batch_of(vec![
        Arc::new(ArrayData::from_temporal(DType::Date(DateUnit::Day), days).unwrap()),
        Arc::new(ArrayData::from_temporal(DType::Date(DateUnit::Millisecond), millis).unwrap()),
    ])
}

fn temporal_i64(rng: &mut StdRng, dtype: DType) -> ArrayRef {
    let values = (0..LENGTH)
        .map(|_| {
            let value = rng.random::<i64>();
            maybe(rng, value)
        })
        .collect::<Vec<_>>();
    Arc::new(ArrayData::from_temporal(dtype, values).unwrap())
}

pub fn timestamps_batch() -> RecordBatch {
    let mut rng = rng();
    batch_of(vec![
        temporal_i64(&mut rng, DType::Timestamp(TimeUnit::Second, None)),
        temporal_i64(&mut rng, DType::Timestamp(TimeUnit::Millisecond, Some("UTC".into()))),
        temporal_i64(&mut rng, DType::Timestamp(TimeUnit::Microsecond, None)),
        temporal_i64(
            &mut rng,
            DType::Timestamp(TimeUnit::Nanosecond, Some("America/New_York".into())),
        ),
    ])
}

pub fn times_batch() -> RecordBatch {
    let mut rng = rng();
    let seconds = (0..LENGTH)
        .map(|_| {
            let value = rng.random_range(0i32..86_400);
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    let millis = (0..LENGTH)
        .map(|_| {
            let value = rng.random_range(0i32..86_400_000);
            maybe(&mut rng, value)
        })
        .collect::<Vec<_>>();
    batch_of(vec![
        Arc::new(ArrayData::from_temporal(DType::Time(TimeUnit::Second), seconds).unwrap()),
        Arc::new(ArrayData::from_temporal(DType::Time(TimeUnit::Millisecond), millis).unwrap()),
        temporal_i64(&mut rng, DType::Time(TimeUnit::Microsecond)),
        temporal_i64(&mut rng, DType::Time(TimeUnit::Nanosecond)),
    ])
}

pub fn null_batch() -> RecordBatch {
    batch_of(vec![
        Arc::new(ArrayData::new_null(LENGTH)),
        Arc::new(ArrayData::from_values((0..LENGTH).map(|v| v as u32))),
    ])
}

/// Every column type at length zero.
pub fn zero_length_batch() -> RecordBatch {
    let mut rng = rng();
    let shared: ArrayRef = Arc::new(ArrayData::from_utf8([Some("x")]));
    batch_of(vec![
        Arc::new(ArrayData::new_null(0)),
        primitive::<i64>(&mut rng, 0, true),
        Arc::new(ArrayData::from_bools(Vec::<Option<bool>>::new())),
        utf8_array(&mut rng, 0),
        Arc::new(ArrayData::from_binary(Vec::<Vec<u8>>::new().into_iter().map(Some))),
        Arc::new(ArrayData::from_fixed_size_binary(3, Vec::<Option<[u8; 3]>>::new()).unwrap()),
        list_array(&mut rng, 0, |rng, len| primitive::<i32>(rng, len, true)),
        struct_array(&mut rng, 0),
        sparse_union_array(&mut rng, 0),
        dense_union_array(&mut rng, 0),
        dictionary_array(&mut rng, &shared, 0),
    ])
}
