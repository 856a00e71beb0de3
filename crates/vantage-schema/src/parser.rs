use crate::error::{Result, SchemaError};
use crate::node::{ArrayKind, PrimitiveKind, Schema, SchemaNode};
use crate::transform::Transform;
use crate::value::{Record, Value};

/// Interprets a [`Schema`] against a payload buffer.
///
/// Parsing is two-pass per nesting level: a raw walk in declaration order
/// (with copy-of deferral) produces slots, then a resolution pass rewrites
/// every dependency-wrapped slot once its dependency's final value is known.
pub struct Parser<'s> {
    schema: &'s Schema,
}

/// Per-level read context carried through the schema walk.
#[derive(Debug, Clone, Copy)]
struct Ctx {
    /// Offset added to every field position.
    base: usize,
    /// Current array entry index; 0 outside arrays.
    index: usize,
    /// Whether fields advance by `size * index` (property-strided layouts).
    /// Entry-strided layouts advance `base` instead.
    property_strided: bool,
}

/// A parsed property before dependency resolution.
#[derive(Debug)]
enum Slot {
    Done(Value),
    Pending { value: Value, depends_on: String },
}

impl<'s> Parser<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self { schema }
    }

    /// Parse a payload with positions relative to its first byte.
    pub fn parse(&self, payload: &[u8]) -> Result<Record> {
        self.parse_at(payload, 0)
    }

    /// Parse with an extra base offset.
    ///
    /// Useful when the buffer still carries the 1-byte ACK header; the usual
    /// caller strips ACK and CRC first and parses at offset 0.
    pub fn parse_at(&self, payload: &[u8], offset: usize) -> Result<Record> {
        if offset >= payload.len() {
            return Err(SchemaError::MalformedData {
                base: offset,
                len: payload.len(),
            });
        }
        parse_level(
            self.schema,
            payload,
            Ctx {
                base: offset,
                index: 0,
                property_strided: true,
            },
        )
    }
}

fn parse_level(schema: &Schema, payload: &[u8], ctx: Ctx) -> Result<Record> {
    let mut raws: Vec<(&str, Option<i64>)> = Vec::new();
    let mut slots: Vec<(String, Slot)> = Vec::with_capacity(schema.len());
    let mut deferred: Vec<&(String, SchemaNode)> = Vec::new();

    for entry in schema.entries() {
        let (name, node) = entry;
        match node {
            SchemaNode::Field(spec) => {
                let raw = read_raw(payload, spec.kind, spec.position, ctx);
                raws.push((name, raw));
                let slot = run_pipeline(
                    raw,
                    &spec.nullables,
                    &spec.transform,
                    spec.depends_on.as_deref(),
                )
                .map_err(|e| e.at(name))?;
                slots.push((name.clone(), slot));
            }
            SchemaNode::CopyOf(spec) => {
                match raws.iter().find(|(n, _)| *n == spec.source) {
                    Some(&(_, raw)) => {
                        let slot = run_pipeline(
                            raw,
                            &spec.nullables,
                            &spec.transform,
                            spec.depends_on.as_deref(),
                        )
                        .map_err(|e| e.at(name))?;
                        slots.push((name.clone(), slot));
                    }
                    // Source not parsed yet: retried once after this level.
                    None => deferred.push(entry),
                }
            }
            SchemaNode::Array {
                element,
                length,
                kind,
            } => {
                let value =
                    parse_array(element, *length, *kind, payload, ctx).map_err(|e| e.at(name))?;
                slots.push((name.clone(), Slot::Done(value)));
            }
            SchemaNode::Object(inner) => {
                let record = parse_level(inner, payload, ctx).map_err(|e| e.at(name))?;
                slots.push((name.clone(), Slot::Done(Value::Record(record))));
            }
        }
    }

    for entry in deferred {
        let (name, node) = entry;
        let SchemaNode::CopyOf(spec) = node else {
            continue;
        };
        let raw = raws
            .iter()
            .find(|(n, _)| *n == spec.source)
            .map(|&(_, raw)| raw)
            .ok_or_else(|| SchemaError::UnresolvedCopy(spec.source.clone()).at(name))?;
        let slot = run_pipeline(
            raw,
            &spec.nullables,
            &spec.transform,
            spec.depends_on.as_deref(),
        )
        .map_err(|e| e.at(name))?;
        slots.push((name.clone(), slot));
    }

    resolve_level(slots)
}

fn parse_array(
    element: &SchemaNode,
    length: usize,
    kind: ArrayKind,
    payload: &[u8],
    ctx: Ctx,
) -> Result<Value> {
    let mut out = Vec::with_capacity(length);
    for index in 0..length {
        let entry_ctx = match kind {
            ArrayKind::PropertyBased => Ctx {
                base: ctx.base,
                index,
                property_strided: true,
            },
            ArrayKind::EntryBased { stride } => Ctx {
                base: ctx.base + stride * index,
                index,
                property_strided: false,
            },
        };
        let value = match element {
            SchemaNode::Field(spec) => {
                // A bare repeated field has no siblings to depend on.
                if let Some(dep) = &spec.depends_on {
                    return Err(SchemaError::UnresolvedDependency(dep.clone()));
                }
                let raw = read_raw(payload, spec.kind, spec.position, entry_ctx);
                match run_pipeline(raw, &spec.nullables, &spec.transform, None)? {
                    Slot::Done(value) => value,
                    Slot::Pending { .. } => unreachable!("no dependency declared"),
                }
            }
            SchemaNode::Object(inner) => Value::Record(parse_level(inner, payload, entry_ctx)?),
            SchemaNode::Array {
                element,
                length,
                kind,
            } => parse_array(element, *length, *kind, payload, entry_ctx)?,
            SchemaNode::CopyOf(spec) => {
                return Err(SchemaError::UnresolvedCopy(spec.source.clone()))
            }
        };
        out.push(value);
    }
    Ok(Value::Seq(out))
}

/// Nullable masking, then the transform pipeline, then dependency wrapping.
fn run_pipeline(
    raw: Option<i64>,
    nullables: &[i64],
    transforms: &[Transform],
    depends_on: Option<&str>,
) -> Result<Slot> {
    let mut value = match raw {
        Some(raw) if !nullables.contains(&raw) => Value::Number(raw as f64),
        _ => Value::Null,
    };

    if !value.is_null() {
        for transform in transforms {
            value = transform.apply(value)?;
            if value.is_null() {
                break;
            }
        }
    }

    Ok(match depends_on {
        Some(dep) => Slot::Pending {
            value,
            depends_on: dep.to_string(),
        },
        None => Slot::Done(value),
    })
}

/// Rewrite pending slots once their dependency's final value is known.
///
/// Dependencies are same-level by construction, so resolution loops within
/// the level until a pass makes no progress; chains terminate because source
/// fields are never pending on themselves without erroring out.
fn resolve_level(mut slots: Vec<(String, Slot)>) -> Result<Record> {
    loop {
        let mut progressed = false;
        let mut still_pending: Option<String> = None;

        for i in 0..slots.len() {
            let dep_name = match &slots[i].1 {
                Slot::Pending { depends_on, .. } => depends_on.clone(),
                Slot::Done(_) => continue,
            };
            let dep_is_null = match slots.iter().find(|(n, _)| *n == dep_name) {
                None => return Err(SchemaError::UnresolvedDependency(dep_name)),
                Some((_, Slot::Done(value))) => Some(value.is_null()),
                Some((_, Slot::Pending { .. })) => None,
            };

            match dep_is_null {
                Some(true) => {
                    slots[i].1 = Slot::Done(Value::Null);
                    progressed = true;
                }
                Some(false) => {
                    let slot = std::mem::replace(&mut slots[i].1, Slot::Done(Value::Null));
                    if let Slot::Pending { value, .. } = slot {
                        slots[i].1 = Slot::Done(value);
                    }
                    progressed = true;
                }
                None => still_pending = Some(dep_name),
            }
        }

        match still_pending {
            None => break,
            Some(dep) if !progressed => return Err(SchemaError::UnresolvedDependency(dep)),
            Some(_) => {}
        }
    }

    Ok(slots
        .into_iter()
        .map(|(name, slot)| match slot {
            Slot::Done(value) => (name, value),
            Slot::Pending { .. } => unreachable!("resolution loop drains all pendings"),
        })
        .collect())
}

fn read_raw(payload: &[u8], kind: PrimitiveKind, position: f64, ctx: Ctx) -> Option<i64> {
    let advance = if ctx.property_strided {
        kind.size() * ctx.index
    } else {
        0
    };
    let pos = ctx.base + position.trunc() as usize + advance;

    match kind {
        PrimitiveKind::U8 => payload.get(pos).map(|&b| i64::from(b)),
        PrimitiveKind::I8 => payload.get(pos).map(|&b| i64::from(b as i8)),
        PrimitiveKind::Bit => {
            let bit = ((position.fract() * 8.0).round() as u32).min(7);
            payload
                .get(pos)
                .map(|&byte| i64::from((byte >> (7 - bit)) & 1))
        }
        PrimitiveKind::U16Le => read_n::<2>(payload, pos).map(|b| i64::from(u16::from_le_bytes(b))),
        PrimitiveKind::U16Be => read_n::<2>(payload, pos).map(|b| i64::from(u16::from_be_bytes(b))),
        PrimitiveKind::I16Le => read_n::<2>(payload, pos).map(|b| i64::from(i16::from_le_bytes(b))),
        PrimitiveKind::I16Be => read_n::<2>(payload, pos).map(|b| i64::from(i16::from_be_bytes(b))),
        PrimitiveKind::U32Le => read_n::<4>(payload, pos).map(|b| i64::from(u32::from_le_bytes(b))),
        PrimitiveKind::U32Be => read_n::<4>(payload, pos).map(|b| i64::from(u32::from_be_bytes(b))),
        PrimitiveKind::I32Le => read_n::<4>(payload, pos).map(|b| i64::from(i32::from_le_bytes(b))),
        PrimitiveKind::I32Be => read_n::<4>(payload, pos).map(|b| i64::from(i32::from_be_bytes(b))),
    }
}

fn read_n<const N: usize>(payload: &[u8], pos: usize) -> Option<[u8; N]> {
    payload.get(pos..pos.checked_add(N)?)?.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ArrayKind, CopySpec, FieldSpec};

    #[test]
    fn reads_each_primitive_kind() {
        let schema = Schema::new()
            .field("byte", FieldSpec::u8(0.0))
            .field("signed_byte", FieldSpec::i8(1.0))
            .field("word", FieldSpec::u16(2.0))
            .field("word_be", FieldSpec::new(PrimitiveKind::U16Be, 2.0))
            .field("signed_word", FieldSpec::i16(4.0))
            .field("dword", FieldSpec::u32(6.0))
            .field("high_bit", FieldSpec::bit(0.0))
            .field("low_bit", FieldSpec::bit(0.875));

        // 0x81 = high bit set, low bit set.
        let payload = [0x81, 0xFE, 0x34, 0x12, 0xFF, 0xFF, 0x78, 0x56, 0x34, 0x12];
        let record = Parser::new(&schema).parse(&payload).unwrap();

        assert_eq!(record.get("byte"), Some(&Value::Number(0x81 as f64)));
        assert_eq!(record.get("signed_byte"), Some(&Value::Number(-2.0)));
        assert_eq!(record.get("word"), Some(&Value::Number(0x1234 as f64)));
        assert_eq!(record.get("word_be"), Some(&Value::Number(0x3412 as f64)));
        assert_eq!(record.get("signed_word"), Some(&Value::Number(-1.0)));
        assert_eq!(
            record.get("dword"),
            Some(&Value::Number(f64::from(0x12345678u32)))
        );
        assert_eq!(record.get("high_bit"), Some(&Value::Number(1.0)));
        assert_eq!(record.get("low_bit"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn bit_positions_are_msb_first() {
        let schema = Schema::new()
            .field("bit0", FieldSpec::bit(0.0))
            .field("bit1", FieldSpec::bit(0.125))
            .field("bit7", FieldSpec::bit(0.875));

        let record = Parser::new(&schema).parse(&[0b0100_0001]).unwrap();
        assert_eq!(record.get("bit0"), Some(&Value::Number(0.0)));
        assert_eq!(record.get("bit1"), Some(&Value::Number(1.0)));
        assert_eq!(record.get("bit7"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn nullable_sentinel_parses_to_null_and_skips_transforms() {
        let schema = Schema::new().field(
            "temperature",
            FieldSpec::i16(0.0)
                .nullable(32767)
                .transform(Transform::Scale(0.1)),
        );

        let dashed = Parser::new(&schema).parse(&32767i16.to_le_bytes()).unwrap();
        assert_eq!(dashed.get("temperature"), Some(&Value::Null));

        let live = Parser::new(&schema).parse(&725i16.to_le_bytes()).unwrap();
        assert_eq!(live.get("temperature"), Some(&Value::Number(72.5)));
    }

    #[test]
    fn transforms_compose_left_to_right() {
        let schema = Schema::new().field(
            "biased",
            FieldSpec::u8(0.0)
                .transform(Transform::Offset(-90.0))
                .transform(Transform::Scale(2.0)),
        );

        // (100 - 90) * 2, not (100 * 2) - 90.
        let record = Parser::new(&schema).parse(&[100]).unwrap();
        assert_eq!(record.get("biased"), Some(&Value::Number(20.0)));
    }

    #[test]
    fn dependency_nulls_field_when_target_is_null() {
        let schema = Schema::new()
            .field("storm", FieldSpec::u16(0.0).nullable(0xFFFF))
            .field(
                "storm_start",
                FieldSpec::u16(2.0).depends_on("storm"),
            );

        let mut payload = Vec::new();
        payload.extend_from_slice(&0xFFFFu16.to_le_bytes());
        payload.extend_from_slice(&1234u16.to_le_bytes());
        let record = Parser::new(&schema).parse(&payload).unwrap();

        assert_eq!(record.get("storm"), Some(&Value::Null));
        assert_eq!(record.get("storm_start"), Some(&Value::Null));
    }

    #[test]
    fn dependency_unwraps_when_target_is_live() {
        let schema = Schema::new()
            .field("storm", FieldSpec::u16(0.0).nullable(0xFFFF))
            .field("storm_start", FieldSpec::u16(2.0).depends_on("storm"));

        let mut payload = Vec::new();
        payload.extend_from_slice(&25u16.to_le_bytes());
        payload.extend_from_slice(&1234u16.to_le_bytes());
        let record = Parser::new(&schema).parse(&payload).unwrap();

        assert_eq!(record.get("storm_start"), Some(&Value::Number(1234.0)));
    }

    #[test]
    fn dependency_chain_resolves_transitively() {
        let schema = Schema::new()
            .field("a", FieldSpec::u8(0.0).nullable(255))
            .field("b", FieldSpec::u8(1.0).depends_on("a"))
            .field("c", FieldSpec::u8(2.0).depends_on("b"));

        let record = Parser::new(&schema).parse(&[255, 1, 2]).unwrap();
        assert_eq!(record.get("b"), Some(&Value::Null));
        assert_eq!(record.get("c"), Some(&Value::Null));

        let record = Parser::new(&schema).parse(&[1, 2, 3]).unwrap();
        assert_eq!(record.get("c"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn unresolved_dependency_is_a_schema_bug() {
        let schema = Schema::new().field("x", FieldSpec::u8(0.0).depends_on("ghost"));
        let err = Parser::new(&schema).parse(&[1]).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::UnresolvedDependency(name) if name == "ghost"
        ));
    }

    #[test]
    fn copy_adopts_pre_transform_raw_value() {
        let schema = Schema::new()
            .field(
                "pressure",
                FieldSpec::u16(0.0)
                    .transform(Transform::Scale(0.001))
                    .transform(Transform::Round(3)),
            )
            .copy("pressure_raw", CopySpec::of("pressure"));

        let record = Parser::new(&schema)
            .parse(&29921u16.to_le_bytes())
            .unwrap();
        assert_eq!(record.get("pressure"), Some(&Value::Number(29.921)));
        assert_eq!(record.get("pressure_raw"), Some(&Value::Number(29921.0)));
    }

    #[test]
    fn copy_before_source_is_deferred_and_retried() {
        let schema = Schema::new()
            .copy("alias", CopySpec::of("origin"))
            .field("origin", FieldSpec::u8(0.0));

        let record = Parser::new(&schema).parse(&[42]).unwrap();
        assert_eq!(record.get("alias"), Some(&Value::Number(42.0)));
        // Deferred copies land at the end of the level.
        assert_eq!(record.iter().last().unwrap().0, "alias");
    }

    #[test]
    fn copy_applies_its_own_pipeline() {
        let schema = Schema::new()
            .field("wind", FieldSpec::u8(0.0))
            .copy(
                "wind_kmh",
                CopySpec::of("wind")
                    .nullable(255)
                    .transform(Transform::Scale(1.609344))
                    .transform(Transform::Round(2)),
            );

        let record = Parser::new(&schema).parse(&[10]).unwrap();
        assert_eq!(record.get("wind"), Some(&Value::Number(10.0)));
        assert_eq!(record.get("wind_kmh"), Some(&Value::Number(16.09)));

        let dashed = Parser::new(&schema).parse(&[255]).unwrap();
        assert_eq!(dashed.get("wind"), Some(&Value::Number(255.0)));
        assert_eq!(dashed.get("wind_kmh"), Some(&Value::Null));
    }

    #[test]
    fn copy_of_missing_source_is_a_schema_bug() {
        let schema = Schema::new().copy("alias", CopySpec::of("nowhere"));
        let err = Parser::new(&schema).parse(&[0]).unwrap_err();
        assert!(matches!(err, SchemaError::Parser { .. }));
    }

    #[test]
    fn property_based_array_strides_by_field_size() {
        let schema = Schema::new().array(
            "words",
            SchemaNode::Field(FieldSpec::u16(1.0)),
            3,
            ArrayKind::PropertyBased,
        );

        // Elements at 1, 3, 5.
        let payload = [0xEE, 1, 0, 2, 0, 3, 0];
        let record = Parser::new(&schema).parse(&payload).unwrap();
        assert_eq!(
            record.get("words"),
            Some(&Value::Seq(vec![
                Value::Number(1.0),
                Value::Number(2.0),
                Value::Number(3.0)
            ]))
        );
    }

    #[test]
    fn property_based_array_of_records_strides_each_field_independently() {
        // Grouped layout: lows at 0..2, highs at 2..6 (u16).
        let element = Schema::new()
            .field("low", FieldSpec::u8(0.0))
            .field("high", FieldSpec::u16(2.0));
        let schema = Schema::new().array(
            "sensors",
            SchemaNode::Object(element),
            2,
            ArrayKind::PropertyBased,
        );

        let payload = [10, 20, 0x01, 0x00, 0x02, 0x00];
        let record = Parser::new(&schema).parse(&payload).unwrap();
        let sensors = record.get("sensors").unwrap().as_seq().unwrap();

        let first = sensors[0].as_record().unwrap();
        assert_eq!(first.get("low"), Some(&Value::Number(10.0)));
        assert_eq!(first.get("high"), Some(&Value::Number(1.0)));

        let second = sensors[1].as_record().unwrap();
        assert_eq!(second.get("low"), Some(&Value::Number(20.0)));
        assert_eq!(second.get("high"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn entry_based_array_advances_whole_element_base() {
        // Contiguous 4-byte entries: value u16 at 0, flag u8 at 2.
        let element = Schema::new()
            .field("value", FieldSpec::u16(0.0))
            .field("flag", FieldSpec::u8(2.0));
        let schema = Schema::new().array(
            "entries",
            SchemaNode::Object(element),
            2,
            ArrayKind::EntryBased { stride: 4 },
        );

        let payload = [0x0A, 0x00, 1, 0xEE, 0x0B, 0x00, 0, 0xEE];
        let record = Parser::new(&schema).parse(&payload).unwrap();
        let entries = record.get("entries").unwrap().as_seq().unwrap();

        let first = entries[0].as_record().unwrap();
        assert_eq!(first.get("value"), Some(&Value::Number(10.0)));
        assert_eq!(first.get("flag"), Some(&Value::Number(1.0)));

        let second = entries[1].as_record().unwrap();
        assert_eq!(second.get("value"), Some(&Value::Number(11.0)));
        assert_eq!(second.get("flag"), Some(&Value::Number(0.0)));
    }

    #[test]
    fn array_entries_resolve_their_own_dependencies() {
        let element = Schema::new()
            .field("extreme", FieldSpec::u8(0.0).nullable(255))
            .field(
                "time",
                FieldSpec::u16(2.0)
                    .nullable(0xFFFF)
                    .transform(Transform::TimeOfDay)
                    .depends_on("extreme"),
            );
        let schema = Schema::new().array(
            "days",
            SchemaNode::Object(element),
            2,
            ArrayKind::PropertyBased,
        );

        let mut payload = vec![70, 255];
        payload.extend_from_slice(&630u16.to_le_bytes());
        payload.extend_from_slice(&1415u16.to_le_bytes());
        let record = Parser::new(&schema).parse(&payload).unwrap();
        let days = record.get("days").unwrap().as_seq().unwrap();

        assert!(matches!(
            days[0].as_record().unwrap().get("time"),
            Some(Value::Time(_))
        ));
        // Second entry's extreme is dashed, so its time is nulled too.
        assert_eq!(days[1].as_record().unwrap().get("time"), Some(&Value::Null));
    }

    #[test]
    fn out_of_range_read_maps_to_null() {
        let schema = Schema::new()
            .field("present", FieldSpec::u8(0.0))
            .field("beyond", FieldSpec::u16(10.0));

        let record = Parser::new(&schema).parse(&[7]).unwrap();
        assert_eq!(record.get("present"), Some(&Value::Number(7.0)));
        assert_eq!(record.get("beyond"), Some(&Value::Null));
    }

    #[test]
    fn base_past_end_is_malformed_data() {
        let schema = Schema::new().field("x", FieldSpec::u8(0.0));
        let err = Parser::new(&schema).parse_at(&[1, 2], 2).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedData { base: 2, len: 2 }));

        let err = Parser::new(&schema).parse(&[]).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedData { .. }));
    }

    #[test]
    fn parse_at_shifts_every_position() {
        let schema = Schema::new().field("word", FieldSpec::u16(0.0));
        // Buffer still carries the ACK header.
        let payload = [0x06, 0x34, 0x12];
        let record = Parser::new(&schema).parse_at(&payload, 1).unwrap();
        assert_eq!(record.get("word"), Some(&Value::Number(0x1234 as f64)));
    }

    #[test]
    fn parsing_is_idempotent() {
        let element = Schema::new()
            .field("v", FieldSpec::u8(0.0).nullable(255))
            .field("t", FieldSpec::u16(4.0).depends_on("v"));
        let schema = Schema::new()
            .field("head", FieldSpec::u16(0.0))
            .array("tail", SchemaNode::Object(element), 2, ArrayKind::PropertyBased)
            .copy("head_again", CopySpec::of("head"));

        let payload = [9, 0, 255, 3, 1, 0, 2, 0];
        let parser = Parser::new(&schema);
        assert_eq!(parser.parse(&payload).unwrap(), parser.parse(&payload).unwrap());
    }

    #[test]
    fn errors_carry_the_field_path() {
        let inner = Schema::new().field(
            "value",
            FieldSpec::u8(0.0)
                .transform(Transform::TimeOfDay)
                .transform(Transform::Scale(0.1)),
        );
        let schema = Schema::new().object("nested", inner);

        let err = Parser::new(&schema).parse(&[10]).unwrap_err();
        let SchemaError::Parser { path, .. } = err else {
            panic!("expected annotated error, got {err:?}");
        };
        assert_eq!(path, "nested.value");
    }
}
