//! Declarative message schemas
//!
//! A schema is static, read-only data: per message type, the ordered
//! list of fields with their tag, optionality, repetition, and tagging
//! mode. The codec driver in [`crate::codec`] interprets these tables;
//! no behavior lives here beyond tag acceptance.
//!
//! Schemas are meant to be declared as `static` items with the `const`
//! builder methods, e.g.:
//!
//! ```
//! use z39_ber::schema::{FieldDescriptor, FieldType, SequenceSchema};
//!
//! static PRESENT_STATUS: SequenceSchema = SequenceSchema::new(
//!     "PresentStatus",
//!     &[FieldDescriptor::new("value", FieldType::Integer).tagged(27)],
//! );
//! ```

use crate::tag::Tag;
use std::fmt;

/// How a context tag is applied to a field's natural encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaggingMode {
    /// The context tag replaces the type's natural tag.
    Implicit,
    /// The natural encoding is wrapped in an additional constructed
    /// layer carrying the context tag.
    Explicit,
}

/// The ASN.1 type of a field.
#[derive(Clone, Copy)]
pub enum FieldType {
    /// INTEGER
    Integer,
    /// BOOLEAN
    Boolean,
    /// NULL
    Null,
    /// OCTET STRING
    OctetString,
    /// BIT STRING
    BitString,
    /// OBJECT IDENTIFIER
    ObjectIdentifier,
    /// VisibleString
    VisibleString,
    /// GeneralString (Z39.50 InternationalString)
    GeneralString,
    /// EXTERNAL
    External,
    /// A nested SEQUENCE production.
    Sequence(&'static SequenceSchema),
    /// A nested CHOICE production.
    Choice(&'static ChoiceSchema),
}

impl FieldType {
    /// The type's own (universal) tag, or `None` for CHOICE, which has
    /// no tag of its own.
    pub fn natural_tag(&self) -> Option<Tag> {
        match self {
            FieldType::Integer => Some(Tag::INTEGER),
            FieldType::Boolean => Some(Tag::BOOLEAN),
            FieldType::Null => Some(Tag::NULL),
            FieldType::OctetString => Some(Tag::OCTET_STRING),
            FieldType::BitString => Some(Tag::BIT_STRING),
            FieldType::ObjectIdentifier => Some(Tag::OBJECT_IDENTIFIER),
            FieldType::VisibleString => Some(Tag::VISIBLE_STRING),
            FieldType::GeneralString => Some(Tag::GENERAL_STRING),
            FieldType::External => Some(Tag::EXTERNAL),
            FieldType::Sequence(_) => Some(Tag::SEQUENCE),
            FieldType::Choice(_) => None,
        }
    }

    /// Whether an element carrying `tag` can begin a value of this
    /// type. This is the explicit form of the try-decode probe: an
    /// untagged field or CHOICE arm is "present" exactly when the next
    /// element's tag is acceptable to its type.
    pub fn accepts(&self, tag: Tag) -> bool {
        match self {
            FieldType::Choice(choice) => choice.arms.iter().any(|arm| arm.accepts(tag)),
            other => other.natural_tag() == Some(tag),
        }
    }
}

impl fmt::Debug for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Nested schemas print by name; schema tables may be cyclic
        // (recursive productions like RPNStructure).
        match self {
            FieldType::Integer => write!(f, "Integer"),
            FieldType::Boolean => write!(f, "Boolean"),
            FieldType::Null => write!(f, "Null"),
            FieldType::OctetString => write!(f, "OctetString"),
            FieldType::BitString => write!(f, "BitString"),
            FieldType::ObjectIdentifier => write!(f, "ObjectIdentifier"),
            FieldType::VisibleString => write!(f, "VisibleString"),
            FieldType::GeneralString => write!(f, "GeneralString"),
            FieldType::External => write!(f, "External"),
            FieldType::Sequence(schema) => write!(f, "Sequence({})", schema.name),
            FieldType::Choice(schema) => write!(f, "Choice({})", schema.name),
        }
    }
}

/// One field of a SEQUENCE production, or one arm of a CHOICE.
///
/// Static and read-only; defined once per message type and consumed by
/// the codec driver.
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field name, used in error context strings.
    pub name: &'static str,
    /// The field's ASN.1 type. For repeated fields this is the type of
    /// each element of the SEQUENCE OF.
    pub ty: FieldType,
    /// Context-specific tag number, or `None` for a field tagged only
    /// by its own universal type.
    pub tag: Option<u32>,
    /// Implicit or explicit application of `tag`.
    pub tagging: TaggingMode,
    /// OPTIONAL fields may be absent; absence is decided by tag
    /// lookahead and never consumes an element.
    pub optional: bool,
    /// SEQUENCE OF: the field's element is a constructed wrapper whose
    /// children each decode as one `ty` value.
    pub repeated: bool,
    /// For repeated fields whose elements carry their own context tag
    /// (e.g. DatabaseName ::= [105] IMPLICIT InternationalString).
    pub element_tag: Option<u32>,
}

impl FieldDescriptor {
    /// A mandatory, untagged, implicit, non-repeated field.
    pub const fn new(name: &'static str, ty: FieldType) -> Self {
        Self {
            name,
            ty,
            tag: None,
            tagging: TaggingMode::Implicit,
            optional: false,
            repeated: false,
            element_tag: None,
        }
    }

    /// Assign a context-specific tag number.
    pub const fn tagged(mut self, number: u32) -> Self {
        self.tag = Some(number);
        self
    }

    /// Use explicit tagging for the context tag.
    pub const fn explicit(mut self) -> Self {
        self.tagging = TaggingMode::Explicit;
        self
    }

    /// Mark the field OPTIONAL.
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Mark the field as SEQUENCE OF its type.
    pub const fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Assign a context tag carried by each element of a repeated field.
    pub const fn element_tagged(mut self, number: u32) -> Self {
        self.element_tag = Some(number);
        self
    }

    /// The tag this field expects at its position, or `None` when the
    /// field is an untagged CHOICE (any arm tag is acceptable).
    ///
    /// A repeated field's element is the SEQUENCE OF wrapper, so an
    /// untagged repeated field expects UNIVERSAL 16 regardless of the
    /// element type.
    pub fn expected_tag(&self) -> Option<Tag> {
        match self.tag {
            Some(number) => Some(Tag::context(number)),
            None if self.repeated => Some(Tag::SEQUENCE),
            None => self.ty.natural_tag(),
        }
    }

    /// Whether an element carrying `tag` belongs to this field.
    pub fn accepts(&self, tag: Tag) -> bool {
        match self.expected_tag() {
            Some(expected) => tag == expected,
            None => self.ty.accepts(tag),
        }
    }

    /// The tag expected of each element of a repeated field.
    pub fn expected_element_tag(&self) -> Option<Tag> {
        match self.element_tag {
            Some(number) => Some(Tag::context(number)),
            None => self.ty.natural_tag(),
        }
    }
}

/// Schema of a SEQUENCE production: fields in encoding order.
#[derive(Debug)]
pub struct SequenceSchema {
    /// Production name, used in error context strings.
    pub name: &'static str,
    /// The tag of the production itself when it appears untagged.
    /// UNIVERSAL 16 for ordinary sequences; EXTERNAL-like productions
    /// override it.
    pub root_tag: Tag,
    /// Fields in declaration (= encoding) order.
    pub fields: &'static [FieldDescriptor],
}

impl SequenceSchema {
    /// A sequence with the standard UNIVERSAL 16 tag.
    pub const fn new(name: &'static str, fields: &'static [FieldDescriptor]) -> Self {
        Self {
            name,
            root_tag: Tag::SEQUENCE,
            fields,
        }
    }

    /// Look up a field's position by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

/// Schema of a CHOICE production: the alternatives in trial order.
#[derive(Debug)]
pub struct ChoiceSchema {
    /// Production name, used in error context strings.
    pub name: &'static str,
    /// Alternatives in declaration order; the first whose tag accepts
    /// the encountered element wins.
    pub arms: &'static [FieldDescriptor],
}

impl ChoiceSchema {
    pub const fn new(name: &'static str, arms: &'static [FieldDescriptor]) -> Self {
        Self { name, arms }
    }

    /// Look up an arm's position by name.
    pub fn arm_index(&self, name: &str) -> Option<usize> {
        self.arms.iter().position(|arm| arm.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static INNER: SequenceSchema = SequenceSchema::new(
        "Inner",
        &[FieldDescriptor::new("n", FieldType::Integer).tagged(0)],
    );

    static UNTAGGED_CHOICE: ChoiceSchema = ChoiceSchema::new(
        "AddInfo",
        &[
            FieldDescriptor::new("v2Addinfo", FieldType::VisibleString),
            FieldDescriptor::new("v3Addinfo", FieldType::GeneralString),
        ],
    );

    #[test]
    fn test_tagged_field_accepts_only_its_context_tag() {
        let field = FieldDescriptor::new("count", FieldType::Integer).tagged(23);
        assert!(field.accepts(Tag::context(23)));
        assert!(!field.accepts(Tag::context(24)));
        assert!(!field.accepts(Tag::INTEGER));
    }

    #[test]
    fn test_untagged_field_accepts_natural_tag() {
        let field = FieldDescriptor::new("set", FieldType::ObjectIdentifier);
        assert!(field.accepts(Tag::OBJECT_IDENTIFIER));
        assert!(!field.accepts(Tag::INTEGER));
    }

    #[test]
    fn test_untagged_sequence_field_accepts_universal_16() {
        let field = FieldDescriptor::new("inner", FieldType::Sequence(&INNER));
        assert!(field.accepts(Tag::SEQUENCE));
    }

    #[test]
    fn test_untagged_choice_accepts_any_arm_tag() {
        let field = FieldDescriptor::new("addinfo", FieldType::Choice(&UNTAGGED_CHOICE));
        assert!(field.accepts(Tag::VISIBLE_STRING));
        assert!(field.accepts(Tag::GENERAL_STRING));
        assert!(!field.accepts(Tag::INTEGER));
    }

    #[test]
    fn test_untagged_repeated_field_expects_the_wrapper_tag() {
        let field = FieldDescriptor::new("xs", FieldType::Integer).repeated();
        assert_eq!(field.expected_tag(), Some(Tag::SEQUENCE));
        assert!(field.accepts(Tag::SEQUENCE));
        assert!(!field.accepts(Tag::INTEGER));

        // Same for a repeated CHOICE: the wrapper tag, not the arm tags.
        let field = FieldDescriptor::new("alts", FieldType::Choice(&UNTAGGED_CHOICE)).repeated();
        assert_eq!(field.expected_tag(), Some(Tag::SEQUENCE));
        assert!(field.accepts(Tag::SEQUENCE));
        assert!(!field.accepts(Tag::VISIBLE_STRING));
    }

    #[test]
    fn test_expected_element_tag() {
        let field = FieldDescriptor::new("databaseNames", FieldType::GeneralString)
            .tagged(18)
            .repeated()
            .element_tagged(105);
        assert_eq!(field.expected_tag(), Some(Tag::context(18)));
        assert_eq!(field.expected_element_tag(), Some(Tag::context(105)));
    }

    #[test]
    fn test_field_index() {
        assert_eq!(INNER.field_index("n"), Some(0));
        assert_eq!(INNER.field_index("missing"), None);
    }
}
