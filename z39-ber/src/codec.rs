//! The schema-driven codec driver
//!
//! One generic decode and one generic encode replace the per-type
//! encode/decode boilerplate: the driver walks a [`SequenceSchema`] in
//! field order against an [`ElementReader`], consuming optional fields
//! greedily when their tag matches, and mirrors the same order on
//! encode, omitting absent optionals.
//!
//! Decode is all-or-nothing: any failure aborts the whole message with
//! an error naming the message type and field.

use crate::element::{BerElement, ElementReader};
use crate::external::External;
use crate::primitive;
use crate::schema::{ChoiceSchema, FieldDescriptor, FieldType, SequenceSchema, TaggingMode};
use crate::tag::Tag;
use crate::value::{ChoiceValue, SequenceValue, Value};
use z39_core::{Z39Error, Z39Result};

/// Decode one message from a byte buffer that must contain exactly the
/// message's encoding.
pub fn decode(schema: &'static SequenceSchema, data: &[u8]) -> Z39Result<SequenceValue> {
    let element = BerElement::parse_single(data)?;
    decode_message(schema, &element)
}

/// Encode a message to bytes.
pub fn encode(value: &SequenceValue) -> Z39Result<Vec<u8>> {
    Ok(encode_message(value)?.encode())
}

/// Decode one CHOICE production from a byte buffer.
pub fn decode_choice(schema: &'static ChoiceSchema, data: &[u8]) -> Z39Result<ChoiceValue> {
    let element = BerElement::parse_single(data)?;
    decode_choice_value(schema, &element)
}

/// Encode a CHOICE production to bytes.
pub fn encode_choice(choice: &ChoiceValue) -> Z39Result<Vec<u8>> {
    Ok(encode_choice_value(choice)?.encode())
}

/// Decode a constructed element carrying the schema's own tag.
pub fn decode_message(
    schema: &'static SequenceSchema,
    element: &BerElement,
) -> Z39Result<SequenceValue> {
    if element.tag() != schema.root_tag {
        return Err(Z39Error::BadTag {
            context: schema.name.to_string(),
            expected: schema.root_tag.to_string(),
            found: element.tag().to_string(),
        });
    }
    decode_fields(schema, element.children()?)
}

/// Decode a SEQUENCE body: fields in schema order over the child list.
///
/// This is the entry point for positions where an implicit context tag
/// has already replaced the sequence's own tag.
pub fn decode_fields(
    schema: &'static SequenceSchema,
    children: &[BerElement],
) -> Z39Result<SequenceValue> {
    let mut reader = ElementReader::new(children);
    let mut value = SequenceValue::new(schema);

    for (index, field) in schema.fields.iter().enumerate() {
        let Some(element) = reader.peek() else {
            if field.optional {
                // Exhausted with an optional tail: remaining optionals
                // default to absent.
                continue;
            }
            return Err(Z39Error::IncompleteMessage {
                context: field_context(schema.name, field),
            });
        };

        match try_decode_field(field, element)
            .map_err(|e| e.qualify(&field_context(schema.name, field)))?
        {
            Some(decoded) => {
                value.set_at(index, decoded)?;
                let _ = reader.next();
            }
            None if field.optional => {
                // Not this field; the element may match a later one.
            }
            None => {
                return Err(Z39Error::BadTag {
                    context: field_context(schema.name, field),
                    expected: expected_description(field),
                    found: element.tag().to_string(),
                });
            }
        }
    }

    if !reader.is_exhausted() {
        return Err(Z39Error::ExtraData {
            context: schema.name.to_string(),
            count: reader.remaining(),
        });
    }
    Ok(value)
}

/// The explicit no-match probe: `Ok(None)` when the element's tag does
/// not belong to the field, `Err` only for genuinely malformed bytes
/// behind an accepted tag.
pub fn try_decode_field(
    field: &FieldDescriptor,
    element: &BerElement,
) -> Z39Result<Option<Value>> {
    if !field.accepts(element.tag()) {
        return Ok(None);
    }
    decode_field_value(field, element).map(Some)
}

fn field_context(message: &str, field: &FieldDescriptor) -> String {
    format!("{message}.{}", field.name)
}

fn expected_description(field: &FieldDescriptor) -> String {
    match field.expected_tag() {
        Some(tag) => tag.to_string(),
        None => match field.ty {
            FieldType::Choice(choice) => format!("an alternative of {}", choice.name),
            _ => "<untagged>".to_string(),
        },
    }
}

/// Decode an element whose tag has already been accepted for `field`.
fn decode_field_value(field: &FieldDescriptor, element: &BerElement) -> Z39Result<Value> {
    if field.repeated {
        return decode_repeated(field, element);
    }

    match field.tag {
        None => decode_untagged(field.ty, element),
        Some(_) => match (field.ty, field.tagging) {
            // A context tag on a CHOICE is necessarily an explicit
            // wrapper; the arm tag inside distinguishes alternatives.
            (FieldType::Choice(choice), _) => {
                let inner = unwrap_explicit(element)?;
                Ok(decode_choice_value(choice, inner)?.into())
            }
            (ty, TaggingMode::Explicit) => {
                let inner = unwrap_explicit(element)?;
                if !ty.accepts(inner.tag()) {
                    return Err(Z39Error::BadTag {
                        context: String::new(),
                        expected: ty
                            .natural_tag()
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "<untagged>".to_string()),
                        found: inner.tag().to_string(),
                    });
                }
                decode_untagged(ty, inner)
            }
            (ty, TaggingMode::Implicit) => decode_implicit(ty, element),
        },
    }
}

/// An explicitly tagged field is a constructed wrapper holding exactly
/// the nested encoding.
fn unwrap_explicit(element: &BerElement) -> Z39Result<&BerElement> {
    match element.children()? {
        [inner] => Ok(inner),
        children => Err(Z39Error::InvalidEncoding(format!(
            "explicit tag must wrap exactly one element, found {}",
            children.len()
        ))),
    }
}

/// Decode every child of a SEQUENCE OF wrapper as one element value.
fn decode_repeated(field: &FieldDescriptor, element: &BerElement) -> Z39Result<Value> {
    let mut items = Vec::new();
    for (position, child) in element.children()?.iter().enumerate() {
        let item = match field.expected_element_tag() {
            Some(expected) => {
                if child.tag() != expected {
                    return Err(Z39Error::BadTag {
                        context: format!("[{position}]"),
                        expected: expected.to_string(),
                        found: child.tag().to_string(),
                    });
                }
                if field.element_tag.is_some() {
                    decode_implicit(field.ty, child)
                } else {
                    decode_untagged(field.ty, child)
                }
            }
            None => decode_untagged(field.ty, child),
        };
        items.push(item.map_err(|e| e.qualify(&format!("[{position}]")))?);
    }
    Ok(Value::SequenceOf(items))
}

/// Decode an element carrying the type's natural tag.
fn decode_untagged(ty: FieldType, element: &BerElement) -> Z39Result<Value> {
    match ty {
        FieldType::Choice(choice) => Ok(decode_choice_value(choice, element)?.into()),
        _ => decode_implicit(ty, element),
    }
}

/// Decode an element's content as `ty`, ignoring the element's tag
/// (it is either the natural tag or an implicit replacement).
fn decode_implicit(ty: FieldType, element: &BerElement) -> Z39Result<Value> {
    match ty {
        FieldType::Integer => Ok(Value::Integer(primitive::decode_integer(
            element.content()?,
        )?)),
        FieldType::Boolean => Ok(Value::Boolean(primitive::decode_boolean(
            element.content()?,
        )?)),
        FieldType::Null => {
            primitive::decode_null(element.content()?)?;
            Ok(Value::Null)
        }
        FieldType::OctetString => Ok(Value::OctetString(element.content()?.to_vec())),
        FieldType::BitString => Ok(Value::BitString(primitive::decode_bit_string(
            element.content()?,
        )?)),
        FieldType::ObjectIdentifier => Ok(Value::ObjectIdentifier(primitive::decode_oid(
            element.content()?,
        )?)),
        FieldType::VisibleString => Ok(Value::VisibleString(primitive::decode_visible_string(
            element.content()?,
        )?)),
        FieldType::GeneralString => Ok(Value::GeneralString(primitive::decode_general_string(
            element.content()?,
        )?)),
        FieldType::External => Ok(External::from_children(element.children()?)?.into()),
        FieldType::Sequence(schema) => Ok(decode_fields(schema, element.children()?)?.into()),
        FieldType::Choice(_) => Err(Z39Error::Protocol(
            "a CHOICE cannot be implicitly tagged".to_string(),
        )),
    }
}

/// Decode a CHOICE: try each alternative's tag in schema order; the
/// first acceptance wins.
pub fn decode_choice_value(
    schema: &'static ChoiceSchema,
    element: &BerElement,
) -> Z39Result<ChoiceValue> {
    for (index, arm) in schema.arms.iter().enumerate() {
        if !arm.accepts(element.tag()) {
            continue;
        }
        let value = decode_field_value(arm, element)
            .map_err(|e| e.qualify(&field_context(schema.name, arm)))?;
        let mut choice = ChoiceValue::new(schema);
        choice.set_index(index, value)?;
        return Ok(choice);
    }
    Err(Z39Error::ChoiceNotMatched {
        context: schema.name.to_string(),
        found: element.tag().to_string(),
    })
}

/// Encode a message as a constructed element under the schema's tag.
pub fn encode_message(value: &SequenceValue) -> Z39Result<BerElement> {
    Ok(BerElement::constructed(
        value.schema().root_tag,
        encode_fields(value)?,
    ))
}

/// Encode a SEQUENCE body in schema order, omitting absent optionals.
///
/// Omission mirrors decode order exactly, so re-encoding a decoded
/// message reproduces an equivalent structure.
pub fn encode_fields(value: &SequenceValue) -> Z39Result<Vec<BerElement>> {
    let schema = value.schema();
    let mut children = Vec::new();
    for (index, field) in schema.fields.iter().enumerate() {
        match value.get_at(index) {
            Some(field_value) => {
                children.push(
                    encode_field(field, field_value)
                        .map_err(|e| e.qualify(&field_context(schema.name, field)))?,
                );
            }
            None if field.optional => {}
            None => {
                return Err(Z39Error::IncompleteMessage {
                    context: field_context(schema.name, field),
                });
            }
        }
    }
    Ok(children)
}

/// Encode one field value under the field's tagging rules.
fn encode_field(field: &FieldDescriptor, value: &Value) -> Z39Result<BerElement> {
    if field.repeated {
        return encode_repeated(field, value);
    }

    match field.tag {
        None => encode_untagged(field.ty, value),
        Some(number) => match (field.ty, field.tagging) {
            (FieldType::Choice(_), _) => Ok(BerElement::constructed(
                Tag::context(number),
                vec![encode_untagged(field.ty, value)?],
            )),
            (ty, TaggingMode::Explicit) => Ok(BerElement::constructed(
                Tag::context(number),
                vec![encode_untagged(ty, value)?],
            )),
            (ty, TaggingMode::Implicit) => encode_implicit(ty, value, Tag::context(number)),
        },
    }
}

fn encode_repeated(field: &FieldDescriptor, value: &Value) -> Z39Result<BerElement> {
    let Value::SequenceOf(items) = value else {
        return Err(type_mismatch("SEQUENCE OF", value));
    };
    let mut children = Vec::with_capacity(items.len());
    for (position, item) in items.iter().enumerate() {
        let element = match field.element_tag {
            Some(number) => encode_implicit(field.ty, item, Tag::context(number)),
            None => encode_untagged(field.ty, item),
        };
        children.push(element.map_err(|e| e.qualify(&format!("[{position}]")))?);
    }
    let wrapper_tag = match field.tag {
        Some(number) => Tag::context(number),
        None => Tag::SEQUENCE,
    };
    Ok(BerElement::constructed(wrapper_tag, children))
}

/// Encode a value under its type's natural tag.
fn encode_untagged(ty: FieldType, value: &Value) -> Z39Result<BerElement> {
    match ty {
        FieldType::Choice(_) => {
            let Value::Choice(choice) = value else {
                return Err(type_mismatch("CHOICE", value));
            };
            encode_choice_value(choice)
        }
        _ => {
            // Every non-choice type has a natural tag.
            let tag = ty.natural_tag().ok_or_else(|| {
                Z39Error::Protocol("untagged field without a natural tag".to_string())
            })?;
            encode_implicit(ty, value, tag)
        }
    }
}

/// Encode a value as `ty` under `tag` (natural or implicit context).
fn encode_implicit(ty: FieldType, value: &Value, tag: Tag) -> Z39Result<BerElement> {
    match (ty, value) {
        (FieldType::Integer, Value::Integer(v)) => {
            Ok(BerElement::primitive(tag, primitive::encode_integer(*v)))
        }
        (FieldType::Boolean, Value::Boolean(v)) => {
            Ok(BerElement::primitive(tag, primitive::encode_boolean(*v)))
        }
        (FieldType::Null, Value::Null) => Ok(BerElement::primitive(tag, Vec::new())),
        (FieldType::OctetString, Value::OctetString(v)) => {
            Ok(BerElement::primitive(tag, v.clone()))
        }
        (FieldType::BitString, Value::BitString(v)) => {
            Ok(BerElement::primitive(tag, primitive::encode_bit_string(v)))
        }
        (FieldType::ObjectIdentifier, Value::ObjectIdentifier(v)) => {
            Ok(BerElement::primitive(tag, primitive::encode_oid(v)))
        }
        (FieldType::VisibleString, Value::VisibleString(v))
        | (FieldType::GeneralString, Value::GeneralString(v)) => {
            Ok(BerElement::primitive(tag, primitive::encode_string(v)))
        }
        (FieldType::External, Value::External(v)) => {
            Ok(BerElement::constructed(tag, v.to_children()))
        }
        (FieldType::Sequence(_), Value::Sequence(v)) => {
            Ok(BerElement::constructed(tag, encode_fields(v)?))
        }
        (FieldType::Choice(_), _) => Err(Z39Error::Protocol(
            "a CHOICE cannot be implicitly tagged".to_string(),
        )),
        (ty, value) => Err(type_mismatch(&format!("{ty:?}"), value)),
    }
}

fn type_mismatch(expected: &str, found: &Value) -> Z39Error {
    Z39Error::Protocol(format!(
        "value type mismatch: schema expects {expected}, found {}",
        found.type_name()
    ))
}

/// Encode a CHOICE's selected alternative.
///
/// # Errors
///
/// Returns `ChoiceNotSet` when no alternative is selected; a second
/// selection was already rejected as `ChoiceMultiplySet` by
/// [`ChoiceValue::set`].
pub fn encode_choice_value(choice: &ChoiceValue) -> Z39Result<BerElement> {
    let schema = choice.schema();
    let (index, value) = choice.require_selected()?;
    let arm = &schema.arms[index];
    encode_field(arm, value).map_err(|e| e.qualify(&field_context(schema.name, arm)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use z39_core::Oid;

    // The worked example: {a: INTEGER tag 0 optional, b: BOOLEAN tag 1}.
    static PAIR: SequenceSchema = SequenceSchema::new(
        "Pair",
        &[
            FieldDescriptor::new("a", FieldType::Integer).tagged(0).optional(),
            FieldDescriptor::new("b", FieldType::Boolean).tagged(1),
        ],
    );

    static TERM: ChoiceSchema = ChoiceSchema::new(
        "Term",
        &[
            FieldDescriptor::new("general", FieldType::OctetString).tagged(45),
            FieldDescriptor::new("numeric", FieldType::Integer).tagged(215),
            FieldDescriptor::new("null", FieldType::Null).tagged(219),
        ],
    );

    static QUERY_LIKE: SequenceSchema = SequenceSchema::new(
        "QueryLike",
        &[
            FieldDescriptor::new("set", FieldType::ObjectIdentifier),
            FieldDescriptor::new("term", FieldType::Choice(&TERM)).tagged(21),
            FieldDescriptor::new("names", FieldType::GeneralString)
                .tagged(18)
                .repeated()
                .element_tagged(105)
                .optional(),
        ],
    );

    fn pair(a: Option<i64>, b: bool) -> SequenceValue {
        let mut value = SequenceValue::new(&PAIR);
        if let Some(a) = a {
            value.set("a", a.into()).unwrap();
        }
        value.set("b", b.into()).unwrap();
        value
    }

    #[test]
    fn test_absent_optional_is_omitted_and_stays_absent() {
        let encoded = encode(&pair(None, true)).unwrap();
        // SEQUENCE { [1] 0xFF } and nothing else.
        assert_eq!(encoded, vec![0x30, 0x03, 0x81, 0x01, 0xFF]);
        let decoded = decode(&PAIR, &encoded).unwrap();
        assert_eq!(decoded.integer("a").unwrap(), None);
        assert_eq!(decoded.require_boolean("b").unwrap(), true);
    }

    #[test]
    fn test_present_optional_round_trip() {
        let value = pair(Some(42), false);
        let decoded = decode(&PAIR, &encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_missing_mandatory_is_incomplete_message() {
        // Only the tag-0 INTEGER element, b missing.
        let data = [0x30, 0x03, 0x80, 0x01, 0x2A];
        match decode(&PAIR, &data) {
            Err(Z39Error::IncompleteMessage { context }) => {
                assert_eq!(context, "Pair.b");
            }
            other => panic!("expected IncompleteMessage, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_tag_at_mandatory_position_is_bad_tag() {
        // [2] in place of b's [1].
        let data = [0x30, 0x03, 0x82, 0x01, 0xFF];
        match decode(&PAIR, &data) {
            Err(Z39Error::BadTag { context, .. }) => assert_eq!(context, "Pair.b"),
            other => panic!("expected BadTag, got {other:?}"),
        }
    }

    #[test]
    fn test_trailing_element_is_extra_data() {
        let mut encoded = encode(&pair(None, true)).unwrap();
        // Append one extra [0] INTEGER element inside the sequence.
        encoded.extend_from_slice(&[0x80, 0x01, 0x07]);
        encoded[1] += 3;
        match decode(&PAIR, &encoded) {
            Err(Z39Error::ExtraData { context, count }) => {
                assert_eq!(context, "Pair");
                assert_eq!(count, 1);
            }
            other => panic!("expected ExtraData, got {other:?}"),
        }
    }

    #[test]
    fn test_root_tag_mismatch_is_bad_tag() {
        let data = [0x31, 0x03, 0x81, 0x01, 0xFF];
        assert!(matches!(
            decode(&PAIR, &data),
            Err(Z39Error::BadTag { .. })
        ));
    }

    #[test]
    fn test_malformed_content_behind_accepted_tag_is_hard_error() {
        // b present but with two content bytes.
        let data = [0x30, 0x04, 0x81, 0x02, 0x00, 0x00];
        match decode(&PAIR, &data) {
            Err(Z39Error::MalformedPrimitive { context, .. }) => {
                assert!(context.starts_with("Pair.b"));
            }
            other => panic!("expected MalformedPrimitive, got {other:?}"),
        }
    }

    #[test]
    fn test_choice_and_repeated_round_trip() {
        let mut value = SequenceValue::new(&QUERY_LIKE);
        value
            .set("set", Oid::bib1_attribute_set().into())
            .unwrap();
        value
            .set(
                "term",
                ChoiceValue::of(&TERM, "numeric", Value::Integer(1997)).unwrap().into(),
            )
            .unwrap();
        value
            .set(
                "names",
                Value::SequenceOf(vec![Value::general("marcxml"), Value::general("hbz")]),
            )
            .unwrap();

        let decoded = decode(&QUERY_LIKE, &encode(&value).unwrap()).unwrap();
        assert_eq!(decoded, value);
        let term = decoded.require_choice("term").unwrap();
        assert_eq!(term.selected(), Some(("numeric", &Value::Integer(1997))));
    }

    #[test]
    fn test_choice_no_arm_matches() {
        // [21] wrapper holding a [99] element no Term arm accepts.
        let element = BerElement::constructed(
            Tag::SEQUENCE,
            vec![
                BerElement::primitive(
                    Tag::OBJECT_IDENTIFIER,
                    primitive::encode_oid(&Oid::bib1_attribute_set()),
                ),
                BerElement::constructed(
                    Tag::context(21),
                    vec![BerElement::primitive(Tag::context(99), vec![])],
                ),
            ],
        );
        match decode(&QUERY_LIKE, &element.encode()) {
            Err(Z39Error::ChoiceNotMatched { context, found }) => {
                assert!(context.contains("Term"));
                assert_eq!(found, "[CONTEXT 99]");
            }
            other => panic!("expected ChoiceNotMatched, got {other:?}"),
        }
    }

    #[test]
    fn test_repeated_element_tag_mismatch() {
        let element = BerElement::constructed(
            Tag::SEQUENCE,
            vec![
                BerElement::primitive(
                    Tag::OBJECT_IDENTIFIER,
                    primitive::encode_oid(&Oid::bib1_attribute_set()),
                ),
                BerElement::constructed(
                    Tag::context(21),
                    vec![BerElement::primitive(Tag::context(219), vec![])],
                ),
                BerElement::constructed(
                    Tag::context(18),
                    // [106] instead of the declared [105] element tag.
                    vec![BerElement::primitive(Tag::context(106), b"x".to_vec())],
                ),
            ],
        );
        assert!(matches!(
            decode(&QUERY_LIKE, &element.encode()),
            Err(Z39Error::BadTag { .. })
        ));
    }

    #[test]
    fn test_encoding_unset_choice_is_choice_not_set() {
        let mut value = SequenceValue::new(&QUERY_LIKE);
        value.set("set", Oid::bib1_attribute_set().into()).unwrap();
        value
            .set("term", ChoiceValue::new(&TERM).into())
            .unwrap();
        assert!(matches!(
            encode(&value),
            Err(Z39Error::ChoiceNotSet { .. })
        ));
    }

    #[test]
    fn test_encoding_missing_mandatory_field_fails() {
        let value = SequenceValue::new(&PAIR);
        assert!(matches!(
            encode(&value),
            Err(Z39Error::IncompleteMessage { .. })
        ));
    }

    #[test]
    fn test_optional_mismatch_resynchronizes_to_later_field() {
        // QUERY_LIKE with `names` absent decodes even though the reader
        // is exhausted right after `term`.
        let mut value = SequenceValue::new(&QUERY_LIKE);
        value.set("set", Oid::bib1_attribute_set().into()).unwrap();
        value
            .set(
                "term",
                ChoiceValue::of(&TERM, "null", Value::Null).unwrap().into(),
            )
            .unwrap();
        let decoded = decode(&QUERY_LIKE, &encode(&value).unwrap()).unwrap();
        assert_eq!(decoded.sequence_of("names").unwrap(), None);
    }

    #[test]
    fn test_untagged_repeated_field_round_trip() {
        static BAG: SequenceSchema = SequenceSchema::new(
            "Bag",
            &[FieldDescriptor::new("xs", FieldType::Integer).repeated()],
        );
        let value = SequenceValue::new(&BAG)
            .with(
                "xs",
                Value::SequenceOf(vec![Value::Integer(1), Value::Integer(2)]),
            )
            .unwrap();
        let encoded = encode(&value).unwrap();
        // SEQUENCE { SEQUENCE OF { INTEGER 1, INTEGER 2 } }
        assert_eq!(
            encoded,
            vec![0x30, 0x08, 0x30, 0x06, 0x02, 0x01, 0x01, 0x02, 0x01, 0x02]
        );
        assert_eq!(decode(&BAG, &encoded).unwrap(), value);
    }

    #[test]
    fn test_explicit_tagging_wraps_and_unwraps() {
        static WRAPPED: SequenceSchema = SequenceSchema::new(
            "Wrapped",
            &[FieldDescriptor::new("inner", FieldType::Integer)
                .tagged(5)
                .explicit()],
        );
        let value = SequenceValue::new(&WRAPPED)
            .with("inner", Value::Integer(7))
            .unwrap();
        let encoded = encode(&value).unwrap();
        // SEQUENCE { [5] { INTEGER 7 } }
        assert_eq!(encoded, vec![0x30, 0x05, 0xA5, 0x03, 0x02, 0x01, 0x07]);
        assert_eq!(decode(&WRAPPED, &encoded).unwrap(), value);
    }
}
