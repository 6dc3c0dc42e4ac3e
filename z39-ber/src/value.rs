//! Generic decoded values
//!
//! The codec driver decodes into this representation: a [`Value`] per
//! field, a [`SequenceValue`] holding the positional field slots of a
//! SEQUENCE production, and a [`ChoiceValue`] holding the single
//! selected alternative of a CHOICE. Typed message structs convert to
//! and from these in the layer above.

use crate::external::External;
use crate::schema::{ChoiceSchema, SequenceSchema};
use std::fmt;
use z39_core::{BitString, Oid, Z39Error, Z39Result};

/// One decoded ASN.1 value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    Null,
    OctetString(Vec<u8>),
    BitString(BitString),
    ObjectIdentifier(Oid),
    VisibleString(String),
    GeneralString(String),
    External(Box<External>),
    Sequence(SequenceValue),
    Choice(Box<ChoiceValue>),
    SequenceOf(Vec<Value>),
}

impl Value {
    /// A GeneralString value.
    pub fn general(s: impl Into<String>) -> Self {
        Value::GeneralString(s.into())
    }

    /// A VisibleString value.
    pub fn visible(s: impl Into<String>) -> Self {
        Value::VisibleString(s.into())
    }

    /// Short name of the variant, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::Null => "NULL",
            Value::OctetString(_) => "OCTET STRING",
            Value::BitString(_) => "BIT STRING",
            Value::ObjectIdentifier(_) => "OBJECT IDENTIFIER",
            Value::VisibleString(_) => "VisibleString",
            Value::GeneralString(_) => "GeneralString",
            Value::External(_) => "EXTERNAL",
            Value::Sequence(_) => "SEQUENCE",
            Value::Choice(_) => "CHOICE",
            Value::SequenceOf(_) => "SEQUENCE OF",
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::OctetString(v)
    }
}

impl From<Oid> for Value {
    fn from(v: Oid) -> Self {
        Value::ObjectIdentifier(v)
    }
}

impl From<BitString> for Value {
    fn from(v: BitString) -> Self {
        Value::BitString(v)
    }
}

impl From<External> for Value {
    fn from(v: External) -> Self {
        Value::External(Box::new(v))
    }
}

impl From<SequenceValue> for Value {
    fn from(v: SequenceValue) -> Self {
        Value::Sequence(v)
    }
}

impl From<ChoiceValue> for Value {
    fn from(v: ChoiceValue) -> Self {
        Value::Choice(Box::new(v))
    }
}

/// A decoded SEQUENCE: one slot per schema field, in schema order.
/// Absent OPTIONAL fields stay `None`.
#[derive(Clone)]
pub struct SequenceValue {
    schema: &'static SequenceSchema,
    fields: Vec<Option<Value>>,
}

impl SequenceValue {
    /// An empty value for `schema`, all fields absent.
    pub fn new(schema: &'static SequenceSchema) -> Self {
        Self {
            schema,
            fields: vec![None; schema.fields.len()],
        }
    }

    /// The schema this value was decoded against.
    pub fn schema(&self) -> &'static SequenceSchema {
        self.schema
    }

    /// Set a field by name.
    ///
    /// # Errors
    ///
    /// Returns `Protocol` if the schema has no field of that name.
    pub fn set(&mut self, name: &str, value: Value) -> Z39Result<()> {
        let index = self.schema.field_index(name).ok_or_else(|| {
            Z39Error::Protocol(format!("{} has no field {name:?}", self.schema.name))
        })?;
        self.fields[index] = Some(value);
        Ok(())
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, name: &str, value: Value) -> Z39Result<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Set a field by position. Positions come from the schema; out of
    /// range is a driver bug, reported as `Protocol`.
    pub fn set_at(&mut self, index: usize, value: Value) -> Z39Result<()> {
        if index >= self.fields.len() {
            return Err(Z39Error::Protocol(format!(
                "{} field index {index} out of range",
                self.schema.name
            )));
        }
        self.fields[index] = Some(value);
        Ok(())
    }

    /// Get a field by name; `None` when absent or unknown.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self.schema.field_index(name)?;
        self.fields[index].as_ref()
    }

    /// Get a field by position.
    pub fn get_at(&self, index: usize) -> Option<&Value> {
        self.fields.get(index)?.as_ref()
    }

    fn mismatch(&self, name: &str, expected: &str, found: &Value) -> Z39Error {
        Z39Error::Protocol(format!(
            "{}.{name}: expected {expected}, found {}",
            self.schema.name,
            found.type_name()
        ))
    }

    fn missing(&self, name: &str) -> Z39Error {
        Z39Error::IncompleteMessage {
            context: format!("{}.{name}", self.schema.name),
        }
    }

    /// Get an optional INTEGER field.
    pub fn integer(&self, name: &str) -> Z39Result<Option<i64>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Integer(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(name, "INTEGER", other)),
        }
    }

    /// Get a mandatory INTEGER field.
    pub fn require_integer(&self, name: &str) -> Z39Result<i64> {
        self.integer(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional BOOLEAN field.
    pub fn boolean(&self, name: &str) -> Z39Result<Option<bool>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Boolean(v)) => Ok(Some(*v)),
            Some(other) => Err(self.mismatch(name, "BOOLEAN", other)),
        }
    }

    /// Get a mandatory BOOLEAN field.
    pub fn require_boolean(&self, name: &str) -> Z39Result<bool> {
        self.boolean(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional OCTET STRING field.
    pub fn octet_string(&self, name: &str) -> Z39Result<Option<&[u8]>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::OctetString(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "OCTET STRING", other)),
        }
    }

    /// Get an optional BIT STRING field.
    pub fn bit_string(&self, name: &str) -> Z39Result<Option<&BitString>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::BitString(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "BIT STRING", other)),
        }
    }

    /// Get a mandatory BIT STRING field.
    pub fn require_bit_string(&self, name: &str) -> Z39Result<&BitString> {
        self.bit_string(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional OBJECT IDENTIFIER field.
    pub fn oid(&self, name: &str) -> Z39Result<Option<&Oid>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::ObjectIdentifier(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "OBJECT IDENTIFIER", other)),
        }
    }

    /// Get a mandatory OBJECT IDENTIFIER field.
    pub fn require_oid(&self, name: &str) -> Z39Result<&Oid> {
        self.oid(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional character-string field (either string type).
    pub fn string(&self, name: &str) -> Z39Result<Option<&str>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::VisibleString(v)) | Some(Value::GeneralString(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "character string", other)),
        }
    }

    /// Get a mandatory character-string field.
    pub fn require_string(&self, name: &str) -> Z39Result<&str> {
        self.string(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional EXTERNAL field.
    pub fn external(&self, name: &str) -> Z39Result<Option<&External>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::External(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "EXTERNAL", other)),
        }
    }

    /// Get an optional nested SEQUENCE field.
    pub fn sequence(&self, name: &str) -> Z39Result<Option<&SequenceValue>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Sequence(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "SEQUENCE", other)),
        }
    }

    /// Get a mandatory nested SEQUENCE field.
    pub fn require_sequence(&self, name: &str) -> Z39Result<&SequenceValue> {
        self.sequence(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional nested CHOICE field.
    pub fn choice(&self, name: &str) -> Z39Result<Option<&ChoiceValue>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::Choice(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "CHOICE", other)),
        }
    }

    /// Get a mandatory nested CHOICE field.
    pub fn require_choice(&self, name: &str) -> Z39Result<&ChoiceValue> {
        self.choice(name)?.ok_or_else(|| self.missing(name))
    }

    /// Get an optional SEQUENCE OF field.
    pub fn sequence_of(&self, name: &str) -> Z39Result<Option<&[Value]>> {
        match self.get(name) {
            None => Ok(None),
            Some(Value::SequenceOf(v)) => Ok(Some(v)),
            Some(other) => Err(self.mismatch(name, "SEQUENCE OF", other)),
        }
    }

    /// Get a mandatory SEQUENCE OF field.
    pub fn require_sequence_of(&self, name: &str) -> Z39Result<&[Value]> {
        self.sequence_of(name)?.ok_or_else(|| self.missing(name))
    }
}

impl fmt::Debug for SequenceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_struct(self.schema.name);
        for (descriptor, value) in self.schema.fields.iter().zip(&self.fields) {
            match value {
                Some(value) => map.field(descriptor.name, value),
                None => map.field(descriptor.name, &format_args!("<absent>")),
            };
        }
        map.finish()
    }
}

impl PartialEq for SequenceValue {
    fn eq(&self, other: &Self) -> bool {
        // Schemas are compared by name; the tables are static and one
        // name maps to one table.
        self.schema.name == other.schema.name && self.fields == other.fields
    }
}

/// A decoded CHOICE: at most one selected alternative.
///
/// Selection is enforced on use: setting a second arm is
/// `ChoiceMultiplySet`, encoding with no arm selected is
/// `ChoiceNotSet`.
#[derive(Clone)]
pub struct ChoiceValue {
    schema: &'static ChoiceSchema,
    selected: Option<(usize, Box<Value>)>,
}

impl ChoiceValue {
    /// An unset choice for `schema`.
    pub fn new(schema: &'static ChoiceSchema) -> Self {
        Self {
            schema,
            selected: None,
        }
    }

    /// A choice with `arm` selected.
    pub fn of(schema: &'static ChoiceSchema, arm: &str, value: Value) -> Z39Result<Self> {
        let mut choice = Self::new(schema);
        choice.set(arm, value)?;
        Ok(choice)
    }

    /// The schema this value was decoded against.
    pub fn schema(&self) -> &'static ChoiceSchema {
        self.schema
    }

    /// Select an alternative.
    ///
    /// # Errors
    ///
    /// Returns `ChoiceMultiplySet` if an alternative is already
    /// selected, and `Protocol` if the schema has no arm of that name.
    pub fn set(&mut self, arm: &str, value: Value) -> Z39Result<()> {
        let index = self.schema.arm_index(arm).ok_or_else(|| {
            Z39Error::Protocol(format!("{} has no alternative {arm:?}", self.schema.name))
        })?;
        self.set_index(index, value)
    }

    /// Select an alternative by position.
    pub fn set_index(&mut self, index: usize, value: Value) -> Z39Result<()> {
        if self.selected.is_some() {
            return Err(Z39Error::ChoiceMultiplySet {
                context: self.schema.name.to_string(),
            });
        }
        if index >= self.schema.arms.len() {
            return Err(Z39Error::Protocol(format!(
                "{} alternative index {index} out of range",
                self.schema.name
            )));
        }
        self.selected = Some((index, Box::new(value)));
        Ok(())
    }

    /// The selected alternative, if any.
    pub fn selected(&self) -> Option<(&'static str, &Value)> {
        self.selected
            .as_ref()
            .map(|(index, value)| (self.schema.arms[*index].name, value.as_ref()))
    }

    /// The selected alternative, or `ChoiceNotSet`.
    pub fn require_selected(&self) -> Z39Result<(usize, &Value)> {
        self.selected
            .as_ref()
            .map(|(index, value)| (*index, value.as_ref()))
            .ok_or_else(|| Z39Error::ChoiceNotSet {
                context: self.schema.name.to_string(),
            })
    }

    /// Whether `arm` is the selected alternative.
    pub fn is(&self, arm: &str) -> bool {
        self.selected().is_some_and(|(name, _)| name == arm)
    }
}

impl fmt::Debug for ChoiceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.selected() {
            Some((arm, value)) => write!(f, "{}::{arm}({value:?})", self.schema.name),
            None => write!(f, "{}::<unset>", self.schema.name),
        }
    }
}

impl PartialEq for ChoiceValue {
    fn eq(&self, other: &Self) -> bool {
        self.schema.name == other.schema.name
            && match (&self.selected, &other.selected) {
                (Some((i, a)), Some((j, b))) => i == j && a == b,
                (None, None) => true,
                _ => false,
            }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, FieldType};

    static PAIR: SequenceSchema = SequenceSchema::new(
        "Pair",
        &[
            FieldDescriptor::new("a", FieldType::Integer).tagged(0).optional(),
            FieldDescriptor::new("b", FieldType::Boolean).tagged(1),
        ],
    );

    static EITHER: ChoiceSchema = ChoiceSchema::new(
        "Either",
        &[
            FieldDescriptor::new("left", FieldType::Integer).tagged(0),
            FieldDescriptor::new("right", FieldType::Boolean).tagged(1),
        ],
    );

    #[test]
    fn test_sequence_value_set_get() {
        let mut value = SequenceValue::new(&PAIR);
        value.set("b", Value::Boolean(true)).unwrap();
        assert_eq!(value.require_boolean("b").unwrap(), true);
        assert_eq!(value.integer("a").unwrap(), None);
        assert!(value.set("nope", Value::Null).is_err());
    }

    #[test]
    fn test_sequence_value_type_mismatch() {
        let value = SequenceValue::new(&PAIR)
            .with("b", Value::Integer(1))
            .unwrap();
        assert!(matches!(
            value.require_boolean("b"),
            Err(Z39Error::Protocol(_))
        ));
    }

    #[test]
    fn test_sequence_value_missing_mandatory() {
        let value = SequenceValue::new(&PAIR);
        assert!(matches!(
            value.require_boolean("b"),
            Err(Z39Error::IncompleteMessage { .. })
        ));
    }

    #[test]
    fn test_choice_set_twice_is_multiply_set() {
        let mut choice = ChoiceValue::new(&EITHER);
        choice.set("left", Value::Integer(1)).unwrap();
        assert!(matches!(
            choice.set("right", Value::Boolean(true)),
            Err(Z39Error::ChoiceMultiplySet { .. })
        ));
    }

    #[test]
    fn test_choice_unset_is_not_set() {
        let choice = ChoiceValue::new(&EITHER);
        assert!(matches!(
            choice.require_selected(),
            Err(Z39Error::ChoiceNotSet { .. })
        ));
    }

    #[test]
    fn test_choice_selected() {
        let choice = ChoiceValue::of(&EITHER, "right", Value::Boolean(false)).unwrap();
        assert_eq!(choice.selected(), Some(("right", &Value::Boolean(false))));
        assert!(choice.is("right"));
        assert!(!choice.is("left"));
    }

    #[test]
    fn test_sequence_value_equality_ignores_schema_identity_only_by_name() {
        let a = SequenceValue::new(&PAIR).with("b", Value::Boolean(true)).unwrap();
        let b = SequenceValue::new(&PAIR).with("b", Value::Boolean(true)).unwrap();
        assert_eq!(a, b);
    }
}
