use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use itertools::Itertools;
use prost::Message as _;
use quiver_array::{
    DType, DateUnit, DictionaryDType, Field, Nullability, PType, Schema, TimeUnit, UnionDType,
    UnionMode,
};
use quiver_buffer::ByteBuffer;
use quiver_error::{QuiverResult, quiver_bail, quiver_err};
use quiver_proto as pb;
use quiver_proto::field::Type;

use crate::depth::RecursionBudget;
use crate::{
    CURRENT_METADATA_VERSION, DictionaryMemo, IpcReadOptions, IpcWriteOptions, Message,
};

/// Encode `schema` as the metadata of a schema message, without framing.
///
/// Dictionary-encoded fields are given ids by `memo`, so fields sharing a dictionary instance
/// share an id.
pub fn write_schema_message(
    schema: &Schema,
    memo: &mut DictionaryMemo,
    options: &IpcWriteOptions,
) -> QuiverResult<ByteBuffer> {
    let message = pb::Message {
        version: CURRENT_METADATA_VERSION as i32,
        body_length: 0,
        header: Some(pb::message::Header::Schema(schema_to_proto(
            schema, memo, options,
        )?)),
    };
    Ok(ByteBuffer::from(message.encode_length_delimited_to_vec()))
}

/// Decode the schema of a schema message, resolving dictionary-encoded fields against the
/// dictionaries registered in `memo`.
pub fn get_schema(
    message: &Message,
    memo: &DictionaryMemo,
    options: &IpcReadOptions,
) -> QuiverResult<Schema> {
    schema_from_proto(message.expect_schema()?, memo, options)
}

/// The value field of every dictionary referenced by a schema message, by dictionary id.
///
/// Readers use this to decode dictionary batches before the dictionaries are available to
/// resolve the full schema.
pub fn get_dictionary_types(
    message: &Message,
    options: &IpcReadOptions,
) -> QuiverResult<HashMap<i64, Field>> {
    dictionary_types_from_proto(message.expect_schema()?, options)
}

pub(crate) fn schema_to_proto(
    schema: &Schema,
    memo: &mut DictionaryMemo,
    options: &IpcWriteOptions,
) -> QuiverResult<pb::Schema> {
    let mut fields = Vec::with_capacity(schema.len());
    let budget = RecursionBudget::new(options.max_recursion_depth());
    for field in schema.fields().iter() {
        push_field(field, memo, budget, false, &mut fields)?;
    }
    Ok(pb::Schema { fields })
}

pub(crate) fn schema_from_proto(
    schema: &pb::Schema,
    memo: &DictionaryMemo,
    options: &IpcReadOptions,
) -> QuiverResult<Schema> {
    let mut resolve = |encoding: &pb::DictionaryEncoding,
                       value_field: Field|
     -> QuiverResult<DType> {
        let dictionary = memo.get_dictionary(encoding.id)?;
        if dictionary.dtype() != value_field.dtype() {
            quiver_bail!(
                InvalidFormat: "dictionary {} holds {} values but field {} expects {}",
                encoding.id,
                dictionary.dtype(),
                value_field.name(),
                value_field.dtype()
            )
        }
        Ok(DType::Dictionary(DictionaryDType::try_new(
            index_ptype(encoding)?,
            dictionary.clone(),
            encoding.ordered,
        )?))
    };
    let fields = read_fields(schema, options, &mut resolve)?;
    Ok(Schema::new(fields))
}

pub(crate) fn dictionary_types_from_proto(
    schema: &pb::Schema,
    options: &IpcReadOptions,
) -> QuiverResult<HashMap<i64, Field>> {
    let mut types: HashMap<i64, Field> = HashMap::new();
    let mut record = |encoding: &pb::DictionaryEncoding,
                      value_field: Field|
     -> QuiverResult<DType> {
        index_ptype(encoding)?;
        let dtype = value_field.dtype().clone();
        match types.entry(encoding.id) {
            Entry::Vacant(entry) => {
                entry.insert(value_field);
            }
            Entry::Occupied(entry) => {
                if entry.get().dtype() != value_field.dtype() {
                    quiver_bail!(
                        InvalidFormat: "dictionary {} is used with value types {} and {}",
                        encoding.id,
                        entry.get().dtype(),
                        value_field.dtype()
                    )
                }
            }
        }
        Ok(dtype)
    };
    read_fields(schema, options, &mut record)?;
    Ok(types)
}

fn push_field(
    field: &Field,
    memo: &mut DictionaryMemo,
    budget: RecursionBudget,
    inside_dictionary: bool,
    out: &mut Vec<pb::Field>,
) -> QuiverResult<()> {
    let children_budget = budget.descend()?;
    let (dtype, dictionary) = match field.dtype() {
        DType::Dictionary(dict) => {
            if inside_dictionary {
                quiver_bail!(NotImplemented: "nested dictionary encoding", field.name())
            }
            let encoding = pb::DictionaryEncoding {
                id: memo.get_or_assign_id(dict.dictionary()),
                index_ptype: dict.index().tag(),
                ordered: dict.is_ordered(),
            };
            (dict.value_dtype(), Some(encoding))
        }
        dtype => (dtype, None),
    };
    let children = dtype.children();
    let num_children = u32::try_from(children.len())
        .map_err(|_| quiver_err!("field {} has too many children", field.name()))?;
    out.push(pb::Field {
        name: field.name().to_string(),
        nullable: field.is_nullable(),
        num_children,
        dictionary,
        r#type: Some(type_to_proto(dtype)?),
    });
    let inside_dictionary = inside_dictionary || dictionary.is_some();
    for child in children {
        push_field(child, memo, children_budget, inside_dictionary, out)?;
    }
    Ok(())
}

fn type_to_proto(dtype: &DType) -> QuiverResult<Type> {
    Ok(match dtype {
        DType::Null => Type::Null(pb::Null {}),
        DType::Bool => Type::Bool(pb::Bool {}),
        DType::Primitive(ptype) => Type::Primitive(pb::Primitive {
            ptype: ptype.tag(),
        }),
        DType::Utf8 => Type::Utf8(pb::Utf8 {}),
        DType::Binary => Type::Binary(pb::Binary {}),
        DType::FixedSizeBinary(width) => Type::FixedSizeBinary(pb::FixedSizeBinary {
            byte_width: *width as u64,
        }),
        DType::Date(unit) => Type::Date(pb::Date {
            unit: u8::from(*unit).into(),
        }),
        DType::Time(unit) => Type::Time(pb::Time {
            unit: u8::from(*unit).into(),
        }),
        DType::Timestamp(unit, timezone) => Type::Timestamp(pb::Timestamp {
            unit: u8::from(*unit).into(),
            timezone: timezone.as_ref().map(|tz| tz.to_string()),
        }),
        DType::List(_) => Type::List(pb::List {}),
        DType::Struct(_) => Type::Struct(pb::Struct {}),
        DType::Union(union) => Type::Union(pb::Union {
            mode: u8::from(union.mode()).into(),
            type_codes: union.type_codes().iter().map(|c| i32::from(*c)).collect(),
        }),
        DType::Dictionary(_) => {
            quiver_bail!(NotImplemented: "dictionary of dictionary", dtype)
        }
    })
}

type ResolveDictionary<'a> =
    dyn FnMut(&pb::DictionaryEncoding, Field) -> QuiverResult<DType> + 'a;

fn read_fields(
    schema: &pb::Schema,
    options: &IpcReadOptions,
    resolve: &mut ResolveDictionary<'_>,
) -> QuiverResult<Vec<Field>> {
    let mut reader = FieldReader {
        fields: &schema.fields,
        position: 0,
    };
    let budget = RecursionBudget::new(options.max_recursion_depth());
    let mut fields = vec![];
    while reader.position < reader.fields.len() {
        fields.push(reader.read_field(budget, false, resolve)?);
    }
    Ok(fields)
}

/// Rebuilds the field tree from its pre-order flattening.
struct FieldReader<'a> {
    fields: &'a [pb::Field],
    position: usize,
}

impl FieldReader<'_> {
    fn read_field(
        &mut self,
        budget: RecursionBudget,
        inside_dictionary: bool,
        resolve: &mut ResolveDictionary<'_>,
    ) -> QuiverResult<Field> {
        let children_budget = budget.descend()?;
        let Some(proto) = self.fields.get(self.position) else {
            quiver_bail!(InvalidFormat: "schema ends inside a nested field")
        };
        self.position += 1;

        if proto.dictionary.is_some() && inside_dictionary {
            quiver_bail!(NotImplemented: "nested dictionary encoding", proto.name)
        }
        let num_children = proto.num_children as usize;
        let remaining = self.fields.len() - self.position;
        if num_children > remaining {
            quiver_bail!(
                InvalidFormat: "field {} declares {} children but only {} fields follow",
                proto.name,
                num_children,
                remaining
            )
        }
        let inside_dictionary = inside_dictionary || proto.dictionary.is_some();
        let mut children = Vec::with_capacity(num_children);
        for _ in 0..num_children {
            children.push(self.read_field(children_budget, inside_dictionary, resolve)?);
        }

        let name: Arc<str> = proto.name.as_str().into();
        let nullability = Nullability::from(proto.nullable);
        let dtype = type_from_proto(&proto.name, proto.r#type.as_ref(), children)?;
        let dtype = match &proto.dictionary {
            Some(encoding) => resolve(encoding, Field::new(name.clone(), dtype, nullability))?,
            None => dtype,
        };
        Ok(Field::new(name, dtype, nullability))
    }
}

fn type_from_proto(name: &str, proto: Option<&Type>, children: Vec<Field>) -> QuiverResult<DType> {
    let Some(proto) = proto else {
        quiver_bail!(InvalidFormat: "field {} has no type", name)
    };
    let nested = matches!(proto, Type::List(_) | Type::Struct(_) | Type::Union(_));
    if !nested && !children.is_empty() {
        quiver_bail!(
            InvalidFormat: "field {} of a non-nested type has {} children",
            name,
            children.len()
        )
    }
    Ok(match proto {
        Type::Null(_) => DType::Null,
        Type::Bool(_) => DType::Bool,
        Type::Primitive(p) => DType::Primitive(PType::from_tag(p.ptype)?),
        Type::Utf8(_) => DType::Utf8,
        Type::Binary(_) => DType::Binary,
        Type::FixedSizeBinary(b) => {
            DType::FixedSizeBinary(usize::try_from(b.byte_width).map_err(|_| {
                quiver_err!(InvalidFormat: "byte width {} is too large", b.byte_width)
            })?)
        }
        Type::Date(d) => DType::Date(unit_from_proto::<DateUnit>(d.unit)?),
        Type::Time(t) => DType::Time(unit_from_proto::<TimeUnit>(t.unit)?),
        Type::Timestamp(t) => DType::Timestamp(
            unit_from_proto::<TimeUnit>(t.unit)?,
            t.timezone.as_deref().map(Arc::from),
        ),
        Type::List(_) => {
            let Ok(element) = children.into_iter().exactly_one() else {
                quiver_bail!(InvalidFormat: "list field {} must have exactly one child", name)
            };
            DType::list(element)
        }
        Type::Struct(_) => DType::struct_(children),
        Type::Union(u) => {
            let mode = unit_from_proto::<UnionMode>(u.mode)?;
            let type_codes = u
                .type_codes
                .iter()
                .map(|code| {
                    i8::try_from(*code).map_err(|_| {
                        quiver_err!(InvalidFormat: "union type code {} is out of range", code)
                    })
                })
                .collect::<QuiverResult<Vec<_>>>()?;
            if type_codes.len() != children.len() || !type_codes.iter().all_unique() {
                quiver_bail!(
                    InvalidFormat: "union field {} has {} children but type codes [{}]",
                    name,
                    children.len(),
                    type_codes.iter().join(", ")
                )
            }
            DType::Union(UnionDType::try_new(mode, children, type_codes)?)
        }
    })
}

fn unit_from_proto<T: TryFrom<u8>>(tag: u32) -> QuiverResult<T> {
    u8::try_from(tag)
        .ok()
        .and_then(|tag| T::try_from(tag).ok())
        .ok_or_else(|| quiver_err!(InvalidFormat: "invalid type tag {}", tag))
}

fn index_ptype(encoding: &pb::DictionaryEncoding) -> QuiverResult<PType> {
    let ptype = PType::from_tag(encoding.index_ptype)?;
    if !ptype.is_int() {
        quiver_bail!(
            InvalidFormat: "dictionary {} has non-integer index type {}",
            encoding.id,
            ptype
        )
    }
    Ok(ptype)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use quiver_array::{ArrayData, ArrayRef};
    use rstest::rstest;

    use super::*;

    fn round_trip(schema: &Schema, memo: &mut DictionaryMemo) -> QuiverResult<Schema> {
        let metadata = write_schema_message(schema, memo, &IpcWriteOptions::default())?;
        let message = Message::try_from_parts(&metadata, ByteBuffer::empty())?;
        get_schema(&message, memo, &IpcReadOptions::default())
    }

    #[rstest]
    #[case::primitives(Schema::new(vec![
        Field::nullable("a", DType::Primitive(PType::I8)),
        Field::non_nullable("b", DType::Primitive(PType::U64)),
        Field::nullable("c", DType::Primitive(PType::F16)),
        Field::nullable("d", DType::Bool),
        Field::nullable("e", DType::Null),
    ]))]
    #[case::binary(Schema::new(vec![
        Field::nullable("s", DType::Utf8),
        Field::nullable("b", DType::Binary),
        Field::non_nullable("f", DType::FixedSizeBinary(12)),
    ]))]
    #[case::temporal(Schema::new(vec![
        Field::nullable("d", DType::Date(DateUnit::Millisecond)),
        Field::nullable("t", DType::Time(TimeUnit::Nanosecond)),
        Field::nullable("ts", DType::Timestamp(TimeUnit::Second, Some("Europe/Paris".into()))),
        Field::nullable("naive", DType::Timestamp(TimeUnit::Microsecond, None)),
    ]))]
    #[case::nested(Schema::new(vec![
        Field::nullable("l", DType::list(Field::non_nullable("item", DType::list(
            Field::nullable("inner", DType::Primitive(PType::I32)),
        )))),
        Field::nullable("s", DType::struct_(vec![
            Field::nullable("x", DType::Utf8),
            Field::non_nullable("y", DType::list(Field::nullable("item", DType::Bool))),
        ])),
        Field::nullable("u", DType::Union(UnionDType::try_new(
            UnionMode::Dense,
            vec![
                Field::nullable("i", DType::Primitive(PType::I64)),
                Field::nullable("s", DType::Utf8),
            ],
            vec![5i8, 0],
        ).unwrap())),
    ]))]
    #[case::empty(Schema::new(vec![]))]
    fn schema_round_trip(#[case] schema: Schema) {
        let mut memo = DictionaryMemo::new();
        assert_eq!(round_trip(&schema, &mut memo).unwrap(), schema);
    }

    #[test]
    fn dictionary_fields_share_ids() {
        let dictionary: ArrayRef = Arc::new(ArrayData::from_utf8([Some("x"), Some("y")]));
        let dtype = DType::dictionary(PType::I16, dictionary, true).unwrap();
        let schema = Schema::new(vec![
            Field::nullable("a", dtype.clone()),
            Field::nullable("b", DType::list(Field::nullable("item", dtype))),
        ]);

        let mut memo = DictionaryMemo::new();
        let metadata =
            write_schema_message(&schema, &mut memo, &IpcWriteOptions::default()).unwrap();
        assert_eq!(memo.len(), 1);
        let message = Message::try_from_parts(&metadata, ByteBuffer::empty()).unwrap();

        let types = get_dictionary_types(&message, &IpcReadOptions::default()).unwrap();
        assert_eq!(types.len(), 1);
        assert_eq!(types[&0].dtype(), &DType::Utf8);

        let unregistered = DictionaryMemo::new();
        assert!(
            get_schema(&message, &unregistered, &IpcReadOptions::default())
                .unwrap_err()
                .is_invalid_format()
        );

        let decoded = get_schema(&message, &memo, &IpcReadOptions::default()).unwrap();
        assert_eq!(decoded, schema);
        let first = decoded.fields()[0].dtype().as_dictionary().unwrap();
        let nested = decoded.fields()[1]
            .dtype()
            .as_list_element()
            .unwrap()
            .dtype()
            .as_dictionary()
            .unwrap();
        assert!(first.same_dictionary(nested));
        assert!(first.is_ordered());
    }

    #[test]
    fn nesting_limit_is_checked_on_both_sides() {
        let mut dtype = DType::Primitive(PType::I32);
        for _ in 0..10 {
            dtype = DType::list(Field::nullable("item", dtype));
        }
        let schema = Schema::new(vec![Field::nullable("f0", dtype)]);
        let mut memo = DictionaryMemo::new();

        let shallow = IpcWriteOptions::default().with_max_recursion_depth(10);
        assert!(
            write_schema_message(&schema, &mut memo, &shallow)
                .unwrap_err()
                .is_invalid_format()
        );

        let deep = IpcWriteOptions::default().with_max_recursion_depth(11);
        let metadata = write_schema_message(&schema, &mut memo, &deep).unwrap();
        let message = Message::try_from_parts(&metadata, ByteBuffer::empty()).unwrap();
        let read = |depth| {
            get_schema(
                &message,
                &memo,
                &IpcReadOptions::default().with_max_recursion_depth(depth),
            )
        };
        assert!(read(10).unwrap_err().is_invalid_format());
        assert_eq!(read(11).unwrap(), schema);
    }

    #[test]
    fn malformed_field_trees() {
        let leaf = |children: u32| pb::Field {
            name: "f".to_string(),
            nullable: true,
            num_children: children,
            dictionary: None,
            r#type: Some(Type::Bool(pb::Bool {})),
        };
        let list = |children: u32| pb::Field {
            r#type: Some(Type::List(pb::List {})),
            ..leaf(children)
        };
        let cases = [
            vec![list(u32::MAX)],
            vec![leaf(1), leaf(0)],
            vec![list(2), leaf(0), leaf(0)],
            vec![list(0)],
        ];
        for fields in cases {
            assert!(
                schema_from_proto(
                    &pb::Schema { fields },
                    &DictionaryMemo::new(),
                    &IpcReadOptions::default()
                )
                .unwrap_err()
                .is_invalid_format()
            );
        }
    }
}
