//! Typed query productions
//!
//! The Query CHOICE of a SearchRequest and the recursive type-1 RPN
//! productions behind it. Each type converts to and from the generic
//! value representation against the tables in [`crate::schemas`].

use crate::convert::{
    as_choice, as_external, as_integer, as_octet_string, as_sequence, as_string, selected,
    unhandled_arm,
};
use crate::schemas;
use crate::types::OperatorKind;
use z39_ber::external::External;
use z39_ber::value::{ChoiceValue, SequenceValue, Value};
use z39_core::{Oid, Z39Result};

/// The query of a SearchRequest.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// type-1: an RPN query.
    Type1(RpnQuery),
    /// type-2: an ISO 2709 query in its raw byte form.
    Type2(Vec<u8>),
    /// type-104: an externally defined query.
    Type104(External),
}

impl Query {
    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            Query::Type1(rpn) => {
                ChoiceValue::of(&schemas::QUERY, "type-1", rpn.to_value()?.into())?
            }
            Query::Type2(bytes) => {
                ChoiceValue::of(&schemas::QUERY, "type-2", bytes.clone().into())?
            }
            Query::Type104(external) => {
                ChoiceValue::of(&schemas::QUERY, "type-104", external.clone().into())?
            }
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("type-1", value) => Ok(Query::Type1(RpnQuery::from_value(as_sequence(value)?)?)),
            ("type-2", value) => Ok(Query::Type2(as_octet_string(value)?.to_vec())),
            ("type-104", value) => Ok(Query::Type104(as_external(value)?.clone())),
            (arm, _) => Err(unhandled_arm("Query", arm)),
        }
    }
}

/// RPNQuery: an attribute set and the RPN expression tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RpnQuery {
    pub attribute_set: Oid,
    pub rpn: RpnStructure,
}

impl RpnQuery {
    /// An RPN query against the Bib-1 attribute set.
    pub fn bib1(rpn: RpnStructure) -> Self {
        Self {
            attribute_set: Oid::bib1_attribute_set(),
            rpn,
        }
    }

    pub(crate) fn to_value(&self) -> Z39Result<SequenceValue> {
        SequenceValue::new(&schemas::RPN_QUERY)
            .with("attributeSet", self.attribute_set.clone().into())?
            .with("rpn", self.rpn.to_value()?)
    }

    pub(crate) fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            attribute_set: value.require_oid("attributeSet")?.clone(),
            rpn: RpnStructure::from_value(value.require_choice("rpn")?)?,
        })
    }
}

/// The recursive RPN expression tree: a leaf operand or two subtrees
/// joined by an operator.
#[derive(Debug, Clone, PartialEq)]
pub enum RpnStructure {
    Op(Operand),
    RpnRpnOp {
        rpn1: Box<RpnStructure>,
        rpn2: Box<RpnStructure>,
        op: OperatorKind,
    },
}

impl RpnStructure {
    /// A leaf searching `term` under a single Bib-1 use attribute.
    pub fn attr_term(use_attribute: i64, term: Term) -> Self {
        RpnStructure::Op(Operand::AttrTerm(AttributesPlusTerm {
            attributes: vec![AttributeElement {
                attribute_set: None,
                attribute_type: 1,
                attribute_value: use_attribute,
            }],
            term,
        }))
    }

    /// Join two subtrees with `op`.
    pub fn join(op: OperatorKind, rpn1: RpnStructure, rpn2: RpnStructure) -> Self {
        RpnStructure::RpnRpnOp {
            rpn1: Box::new(rpn1),
            rpn2: Box::new(rpn2),
            op,
        }
    }

    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            RpnStructure::Op(operand) => {
                ChoiceValue::of(&schemas::RPN_STRUCTURE, "op", operand.to_value()?)?
            }
            RpnStructure::RpnRpnOp { rpn1, rpn2, op } => {
                let mut operator = ChoiceValue::new(&schemas::OPERATOR);
                operator.set_index(op.value() as usize, Value::Null)?;
                let body = SequenceValue::new(&schemas::RPN_RPN_OP)
                    .with("rpn1", rpn1.to_value()?)?
                    .with("rpn2", rpn2.to_value()?)?
                    .with("op", operator.into())?;
                ChoiceValue::of(&schemas::RPN_STRUCTURE, "rpnRpnOp", body.into())?
            }
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("op", value) => Ok(RpnStructure::Op(Operand::from_value(as_choice(value)?)?)),
            ("rpnRpnOp", value) => {
                let body = as_sequence(value)?;
                let (index, _) = body.require_choice("op")?.require_selected()?;
                Ok(RpnStructure::RpnRpnOp {
                    rpn1: Box::new(RpnStructure::from_value(body.require_choice("rpn1")?)?),
                    rpn2: Box::new(RpnStructure::from_value(body.require_choice("rpn2")?)?),
                    op: OperatorKind::from_value(index as i64)?,
                })
            }
            (arm, _) => Err(unhandled_arm("RPNStructure", arm)),
        }
    }
}

/// A leaf of the RPN tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A term qualified by attributes.
    AttrTerm(AttributesPlusTerm),
    /// A reference to a previously created result set.
    ResultSet(String),
}

impl Operand {
    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            Operand::AttrTerm(attr_term) => {
                ChoiceValue::of(&schemas::OPERAND, "attrTerm", attr_term.to_value()?.into())?
            }
            Operand::ResultSet(name) => {
                ChoiceValue::of(&schemas::OPERAND, "resultSet", Value::general(name.clone()))?
            }
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("attrTerm", value) => Ok(Operand::AttrTerm(AttributesPlusTerm::from_value(
                as_sequence(value)?,
            )?)),
            ("resultSet", value) => Ok(Operand::ResultSet(as_string(value)?.to_string())),
            (arm, _) => Err(unhandled_arm("Operand", arm)),
        }
    }
}

/// A search term with its qualifying attribute list.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributesPlusTerm {
    pub attributes: Vec<AttributeElement>,
    pub term: Term,
}

impl AttributesPlusTerm {
    pub(crate) fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut attributes = Vec::with_capacity(self.attributes.len());
        for attribute in &self.attributes {
            attributes.push(attribute.to_value()?.into());
        }
        SequenceValue::new(&schemas::ATTRIBUTES_PLUS_TERM)
            .with("attributes", Value::SequenceOf(attributes))?
            .with("term", self.term.to_value()?)
    }

    pub(crate) fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        let mut attributes = Vec::new();
        for item in value.require_sequence_of("attributes")? {
            attributes.push(AttributeElement::from_value(as_sequence(item)?)?);
        }
        Ok(Self {
            attributes,
            term: Term::from_value(value.require_choice("term")?)?,
        })
    }
}

/// One attribute of an AttributeList, e.g. Bib-1 use 4 (title).
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeElement {
    /// Attribute set the element belongs to, when it differs from the
    /// query's.
    pub attribute_set: Option<Oid>,
    pub attribute_type: i64,
    pub attribute_value: i64,
}

impl AttributeElement {
    pub(crate) fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::ATTRIBUTE_ELEMENT);
        if let Some(set) = &self.attribute_set {
            value.set("attributeSet", set.clone().into())?;
        }
        value.set("attributeType", self.attribute_type.into())?;
        value.set("attributeValue", self.attribute_value.into())?;
        Ok(value)
    }

    pub(crate) fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            attribute_set: value.oid("attributeSet")?.cloned(),
            attribute_type: value.require_integer("attributeType")?,
            attribute_value: value.require_integer("attributeValue")?,
        })
    }
}

/// A search term.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// The common form: uninterpreted bytes, usually the query string.
    General(Vec<u8>),
    Numeric(i64),
    CharacterString(String),
    Null,
}

impl Term {
    /// A general term from a string.
    pub fn general(s: impl Into<String>) -> Self {
        Term::General(s.into().into_bytes())
    }

    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            Term::General(bytes) => {
                ChoiceValue::of(&schemas::TERM, "general", bytes.clone().into())?
            }
            Term::Numeric(n) => ChoiceValue::of(&schemas::TERM, "numeric", (*n).into())?,
            Term::CharacterString(s) => {
                ChoiceValue::of(&schemas::TERM, "characterString", Value::general(s.clone()))?
            }
            Term::Null => ChoiceValue::of(&schemas::TERM, "null", Value::Null)?,
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("general", value) => Ok(Term::General(as_octet_string(value)?.to_vec())),
            ("numeric", value) => Ok(Term::Numeric(as_integer(value)?)),
            ("characterString", value) => {
                Ok(Term::CharacterString(as_string(value)?.to_string()))
            }
            ("null", _) => Ok(Term::Null),
            (arm, _) => Err(unhandled_arm("Term", arm)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpn_structure_round_trips_through_values() {
        let rpn = RpnStructure::join(
            OperatorKind::And,
            RpnStructure::attr_term(4, Term::general("dinosaur")),
            RpnStructure::Op(Operand::ResultSet("prev".to_string())),
        );
        let value = rpn.to_value().unwrap();
        let Value::Choice(choice) = &value else {
            panic!("expected a choice value");
        };
        assert_eq!(RpnStructure::from_value(choice).unwrap(), rpn);
    }

    #[test]
    fn test_operator_arm_index_matches_kind() {
        let rpn = RpnStructure::join(
            OperatorKind::AndNot,
            RpnStructure::attr_term(1, Term::Numeric(7)),
            RpnStructure::attr_term(1, Term::Null),
        );
        let value = rpn.to_value().unwrap();
        let Value::Choice(choice) = &value else {
            panic!("expected a choice value");
        };
        let RpnStructure::RpnRpnOp { op, .. } = RpnStructure::from_value(choice).unwrap() else {
            panic!("expected rpnRpnOp");
        };
        assert_eq!(op, OperatorKind::AndNot);
    }

    #[test]
    fn test_term_general_from_string() {
        assert_eq!(Term::general("abc"), Term::General(b"abc".to_vec()));
    }
}
