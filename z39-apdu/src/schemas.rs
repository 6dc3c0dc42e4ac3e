//! Static schema tables for the Z39.50 APDUs
//!
//! One table per production, with the tag assignments of ANSI/NISO
//! Z39.50-1995. These tables are the whole message definition layer:
//! the generic driver in `z39_ber::codec` interprets them, and the
//! typed structs in this crate convert the decoded values.

use z39_ber::schema::{ChoiceSchema, FieldDescriptor, FieldType, SequenceSchema};

/// ReferenceId ::= [2] IMPLICIT OCTET STRING, optional in every APDU.
const fn reference_id() -> FieldDescriptor {
    FieldDescriptor::new("referenceId", FieldType::OctetString)
        .tagged(2)
        .optional()
}

// ---- Initialize ----

/// IdPass ::= SEQUENCE, the username/password alternative of
/// IdAuthentication.
pub static ID_PASS: SequenceSchema = SequenceSchema::new(
    "IdPass",
    &[
        FieldDescriptor::new("groupId", FieldType::GeneralString)
            .tagged(0)
            .optional(),
        FieldDescriptor::new("userId", FieldType::GeneralString)
            .tagged(1)
            .optional(),
        FieldDescriptor::new("password", FieldType::GeneralString)
            .tagged(2)
            .optional(),
    ],
);

/// IdAuthentication ::= CHOICE { open VisibleString, idPass [0] SEQUENCE,
/// anonymous NULL, other EXTERNAL }.
pub static ID_AUTHENTICATION: ChoiceSchema = ChoiceSchema::new(
    "IdAuthentication",
    &[
        FieldDescriptor::new("open", FieldType::VisibleString),
        FieldDescriptor::new("idPass", FieldType::Sequence(&ID_PASS)).tagged(0),
        FieldDescriptor::new("anonymous", FieldType::Null),
        FieldDescriptor::new("other", FieldType::External),
    ],
);

pub static INITIALIZE_REQUEST: SequenceSchema = SequenceSchema::new(
    "InitializeRequest",
    &[
        reference_id(),
        FieldDescriptor::new("protocolVersion", FieldType::BitString).tagged(3),
        FieldDescriptor::new("options", FieldType::BitString).tagged(4),
        FieldDescriptor::new("preferredMessageSize", FieldType::Integer).tagged(5),
        FieldDescriptor::new("exceptionalRecordSize", FieldType::Integer).tagged(6),
        FieldDescriptor::new("idAuthentication", FieldType::Choice(&ID_AUTHENTICATION))
            .tagged(7)
            .optional(),
        FieldDescriptor::new("implementationId", FieldType::GeneralString)
            .tagged(110)
            .optional(),
        FieldDescriptor::new("implementationName", FieldType::GeneralString)
            .tagged(111)
            .optional(),
        FieldDescriptor::new("implementationVersion", FieldType::GeneralString)
            .tagged(112)
            .optional(),
    ],
);

pub static INITIALIZE_RESPONSE: SequenceSchema = SequenceSchema::new(
    "InitializeResponse",
    &[
        reference_id(),
        FieldDescriptor::new("protocolVersion", FieldType::BitString).tagged(3),
        FieldDescriptor::new("options", FieldType::BitString).tagged(4),
        FieldDescriptor::new("preferredMessageSize", FieldType::Integer).tagged(5),
        FieldDescriptor::new("exceptionalRecordSize", FieldType::Integer).tagged(6),
        FieldDescriptor::new("result", FieldType::Boolean).tagged(12),
        FieldDescriptor::new("implementationId", FieldType::GeneralString)
            .tagged(110)
            .optional(),
        FieldDescriptor::new("implementationName", FieldType::GeneralString)
            .tagged(111)
            .optional(),
        FieldDescriptor::new("implementationVersion", FieldType::GeneralString)
            .tagged(112)
            .optional(),
    ],
);

// ---- RPN query productions ----

/// AttributeElement ::= SEQUENCE { attributeSet [1] OPTIONAL,
/// attributeType [120], attributeValue [121] }.
pub static ATTRIBUTE_ELEMENT: SequenceSchema = SequenceSchema::new(
    "AttributeElement",
    &[
        FieldDescriptor::new("attributeSet", FieldType::ObjectIdentifier)
            .tagged(1)
            .optional(),
        FieldDescriptor::new("attributeType", FieldType::Integer).tagged(120),
        FieldDescriptor::new("attributeValue", FieldType::Integer).tagged(121),
    ],
);

/// Term ::= CHOICE; the common subset of the full production.
pub static TERM: ChoiceSchema = ChoiceSchema::new(
    "Term",
    &[
        FieldDescriptor::new("general", FieldType::OctetString).tagged(45),
        FieldDescriptor::new("numeric", FieldType::Integer).tagged(215),
        FieldDescriptor::new("characterString", FieldType::GeneralString).tagged(216),
        FieldDescriptor::new("null", FieldType::Null).tagged(219),
    ],
);

/// AttributesPlusTerm ::= [102] IMPLICIT SEQUENCE; the [102] tag is
/// applied where the production is used.
pub static ATTRIBUTES_PLUS_TERM: SequenceSchema = SequenceSchema::new(
    "AttributesPlusTerm",
    &[
        // AttributeList ::= [44] IMPLICIT SEQUENCE OF AttributeElement
        FieldDescriptor::new("attributes", FieldType::Sequence(&ATTRIBUTE_ELEMENT))
            .tagged(44)
            .repeated(),
        FieldDescriptor::new("term", FieldType::Choice(&TERM)),
    ],
);

/// Operand ::= CHOICE { attrTerm AttributesPlusTerm [102],
/// resultSet ResultSetId [31] }.
pub static OPERAND: ChoiceSchema = ChoiceSchema::new(
    "Operand",
    &[
        FieldDescriptor::new("attrTerm", FieldType::Sequence(&ATTRIBUTES_PLUS_TERM)).tagged(102),
        FieldDescriptor::new("resultSet", FieldType::GeneralString).tagged(31),
    ],
);

/// Operator ::= [46] CHOICE { and [0] NULL, or [1] NULL,
/// and-not [2] NULL }. Alternative numbers match
/// `types::OperatorKind` discriminants.
pub static OPERATOR: ChoiceSchema = ChoiceSchema::new(
    "Operator",
    &[
        FieldDescriptor::new("and", FieldType::Null).tagged(0),
        FieldDescriptor::new("or", FieldType::Null).tagged(1),
        FieldDescriptor::new("and-not", FieldType::Null).tagged(2),
    ],
);

/// The rpnRpnOp arm of RPNStructure: two sub-structures and an
/// operator. Recursive through [`RPN_STRUCTURE`].
pub static RPN_RPN_OP: SequenceSchema = SequenceSchema::new(
    "RpnRpnOp",
    &[
        FieldDescriptor::new("rpn1", FieldType::Choice(&RPN_STRUCTURE)),
        FieldDescriptor::new("rpn2", FieldType::Choice(&RPN_STRUCTURE)),
        FieldDescriptor::new("op", FieldType::Choice(&OPERATOR)).tagged(46),
    ],
);

/// RPNStructure ::= CHOICE { op [0] Operand, rpnRpnOp [1] IMPLICIT
/// SEQUENCE { rpn1, rpn2, op } }.
pub static RPN_STRUCTURE: ChoiceSchema = ChoiceSchema::new(
    "RPNStructure",
    &[
        FieldDescriptor::new("op", FieldType::Choice(&OPERAND)).tagged(0),
        FieldDescriptor::new("rpnRpnOp", FieldType::Sequence(&RPN_RPN_OP)).tagged(1),
    ],
);

/// RPNQuery ::= SEQUENCE { attributeSet OBJECT IDENTIFIER,
/// rpn RPNStructure }.
pub static RPN_QUERY: SequenceSchema = SequenceSchema::new(
    "RPNQuery",
    &[
        FieldDescriptor::new("attributeSet", FieldType::ObjectIdentifier),
        FieldDescriptor::new("rpn", FieldType::Choice(&RPN_STRUCTURE)),
    ],
);

/// Query ::= CHOICE { type-1 [1] IMPLICIT RPNQuery, type-2 [2] OCTET
/// STRING, type-104 [104] IMPLICIT EXTERNAL }.
pub static QUERY: ChoiceSchema = ChoiceSchema::new(
    "Query",
    &[
        FieldDescriptor::new("type-1", FieldType::Sequence(&RPN_QUERY)).tagged(1),
        FieldDescriptor::new("type-2", FieldType::OctetString).tagged(2),
        FieldDescriptor::new("type-104", FieldType::External).tagged(104),
    ],
);

pub static SEARCH_REQUEST: SequenceSchema = SequenceSchema::new(
    "SearchRequest",
    &[
        reference_id(),
        FieldDescriptor::new("smallSetUpperBound", FieldType::Integer).tagged(13),
        FieldDescriptor::new("largeSetLowerBound", FieldType::Integer).tagged(14),
        FieldDescriptor::new("mediumSetPresentNumber", FieldType::Integer).tagged(15),
        FieldDescriptor::new("replaceIndicator", FieldType::Boolean).tagged(16),
        FieldDescriptor::new("resultSetName", FieldType::GeneralString).tagged(17),
        // DatabaseName ::= [105] IMPLICIT InternationalString
        FieldDescriptor::new("databaseNames", FieldType::GeneralString)
            .tagged(18)
            .repeated()
            .element_tagged(105),
        FieldDescriptor::new("query", FieldType::Choice(&QUERY)).tagged(21),
    ],
);

// ---- Records and diagnostics ----

/// AddInfo: VisibleString in version 2, InternationalString in
/// version 3; both untagged.
pub static ADD_INFO: ChoiceSchema = ChoiceSchema::new(
    "AddInfo",
    &[
        FieldDescriptor::new("v2Addinfo", FieldType::VisibleString),
        FieldDescriptor::new("v3Addinfo", FieldType::GeneralString),
    ],
);

/// DefaultDiagFormat ::= SEQUENCE { diagnosticSetId, condition,
/// addinfo }.
pub static DEFAULT_DIAG_FORMAT: SequenceSchema = SequenceSchema::new(
    "DefaultDiagFormat",
    &[
        FieldDescriptor::new("diagnosticSetId", FieldType::ObjectIdentifier),
        FieldDescriptor::new("condition", FieldType::Integer),
        FieldDescriptor::new("addinfo", FieldType::Choice(&ADD_INFO)),
    ],
);

/// DiagRec ::= CHOICE { defaultFormat DefaultDiagFormat,
/// externallyDefined EXTERNAL }; both arms carry universal tags.
pub static DIAG_REC: ChoiceSchema = ChoiceSchema::new(
    "DiagRec",
    &[
        FieldDescriptor::new("defaultFormat", FieldType::Sequence(&DEFAULT_DIAG_FORMAT)),
        FieldDescriptor::new("externallyDefined", FieldType::External),
    ],
);

/// The record member of NamePlusRecord: CHOICE { retrievalRecord [1]
/// IMPLICIT EXTERNAL, surrogateDiagnostic [2] DiagRec }.
pub static RECORD: ChoiceSchema = ChoiceSchema::new(
    "Record",
    &[
        FieldDescriptor::new("retrievalRecord", FieldType::External).tagged(1),
        FieldDescriptor::new("surrogateDiagnostic", FieldType::Choice(&DIAG_REC)).tagged(2),
    ],
);

/// NamePlusRecord ::= SEQUENCE { name [0] OPTIONAL, record [1] CHOICE }.
pub static NAME_PLUS_RECORD: SequenceSchema = SequenceSchema::new(
    "NamePlusRecord",
    &[
        FieldDescriptor::new("name", FieldType::GeneralString)
            .tagged(0)
            .optional(),
        FieldDescriptor::new("record", FieldType::Choice(&RECORD)).tagged(1),
    ],
);

/// Records ::= CHOICE { responseRecords [28], nonSurrogateDiagnostic
/// [130], multipleNonSurDiagnostics [205] }.
pub static RECORDS: ChoiceSchema = ChoiceSchema::new(
    "Records",
    &[
        FieldDescriptor::new("responseRecords", FieldType::Sequence(&NAME_PLUS_RECORD))
            .tagged(28)
            .repeated(),
        FieldDescriptor::new(
            "nonSurrogateDiagnostic",
            FieldType::Sequence(&DEFAULT_DIAG_FORMAT),
        )
        .tagged(130),
        FieldDescriptor::new("multipleNonSurDiagnostics", FieldType::Choice(&DIAG_REC))
            .tagged(205)
            .repeated(),
    ],
);

pub static SEARCH_RESPONSE: SequenceSchema = SequenceSchema::new(
    "SearchResponse",
    &[
        reference_id(),
        FieldDescriptor::new("resultCount", FieldType::Integer).tagged(23),
        FieldDescriptor::new("numberOfRecordsReturned", FieldType::Integer).tagged(24),
        FieldDescriptor::new("nextResultSetPosition", FieldType::Integer).tagged(25),
        FieldDescriptor::new("searchStatus", FieldType::Boolean).tagged(22),
        FieldDescriptor::new("resultSetStatus", FieldType::Integer)
            .tagged(26)
            .optional(),
        FieldDescriptor::new("presentStatus", FieldType::Integer)
            .tagged(27)
            .optional(),
        FieldDescriptor::new("records", FieldType::Choice(&RECORDS)).optional(),
    ],
);

// ---- Present ----

pub static PRESENT_REQUEST: SequenceSchema = SequenceSchema::new(
    "PresentRequest",
    &[
        reference_id(),
        FieldDescriptor::new("resultSetId", FieldType::GeneralString).tagged(31),
        FieldDescriptor::new("resultSetStartPoint", FieldType::Integer).tagged(30),
        FieldDescriptor::new("numberOfRecordsRequested", FieldType::Integer).tagged(29),
        FieldDescriptor::new("preferredRecordSyntax", FieldType::ObjectIdentifier)
            .tagged(104)
            .optional(),
    ],
);

pub static PRESENT_RESPONSE: SequenceSchema = SequenceSchema::new(
    "PresentResponse",
    &[
        reference_id(),
        FieldDescriptor::new("numberOfRecordsReturned", FieldType::Integer).tagged(24),
        FieldDescriptor::new("nextResultSetPosition", FieldType::Integer).tagged(25),
        FieldDescriptor::new("presentStatus", FieldType::Integer).tagged(27),
        FieldDescriptor::new("records", FieldType::Choice(&RECORDS)).optional(),
    ],
);

// ---- Close ----

pub static CLOSE: SequenceSchema = SequenceSchema::new(
    "Close",
    &[
        reference_id(),
        FieldDescriptor::new("closeReason", FieldType::Integer).tagged(211),
        FieldDescriptor::new("diagnosticInformation", FieldType::GeneralString)
            .tagged(3)
            .optional(),
    ],
);

// ---- The top-level PDU choice ----

/// PDU ::= CHOICE, every arm an implicitly tagged SEQUENCE.
pub static PDU: ChoiceSchema = ChoiceSchema::new(
    "PDU",
    &[
        FieldDescriptor::new("initializeRequest", FieldType::Sequence(&INITIALIZE_REQUEST))
            .tagged(20),
        FieldDescriptor::new(
            "initializeResponse",
            FieldType::Sequence(&INITIALIZE_RESPONSE),
        )
        .tagged(21),
        FieldDescriptor::new("searchRequest", FieldType::Sequence(&SEARCH_REQUEST)).tagged(22),
        FieldDescriptor::new("searchResponse", FieldType::Sequence(&SEARCH_RESPONSE)).tagged(23),
        FieldDescriptor::new("presentRequest", FieldType::Sequence(&PRESENT_REQUEST)).tagged(24),
        FieldDescriptor::new("presentResponse", FieldType::Sequence(&PRESENT_RESPONSE)).tagged(25),
        FieldDescriptor::new("close", FieldType::Sequence(&CLOSE)).tagged(48),
    ],
);

#[cfg(test)]
mod tests {
    use super::*;
    use z39_ber::tag::Tag;

    #[test]
    fn test_pdu_arms_accept_their_apdu_tags() {
        for (name, number) in [
            ("initializeRequest", 20),
            ("initializeResponse", 21),
            ("searchRequest", 22),
            ("searchResponse", 23),
            ("presentRequest", 24),
            ("presentResponse", 25),
            ("close", 48),
        ] {
            let index = PDU.arm_index(name).unwrap();
            assert!(PDU.arms[index].accepts(Tag::context(number)), "{name}");
        }
    }

    #[test]
    fn test_rpn_structure_is_recursive() {
        // rpnRpnOp's sub-structures accept the same arm tags as the
        // top-level RPNStructure.
        let rpn1 = &RPN_RPN_OP.fields[RPN_RPN_OP.field_index("rpn1").unwrap()];
        assert!(rpn1.accepts(Tag::context(0)));
        assert!(rpn1.accepts(Tag::context(1)));
        assert!(!rpn1.accepts(Tag::context(2)));
    }

    #[test]
    fn test_database_names_element_tag() {
        let field = &SEARCH_REQUEST.fields[SEARCH_REQUEST.field_index("databaseNames").unwrap()];
        assert_eq!(field.expected_tag(), Some(Tag::context(18)));
        assert_eq!(field.expected_element_tag(), Some(Tag::context(105)));
    }

    #[test]
    fn test_records_field_is_untagged_choice() {
        let field = &SEARCH_RESPONSE.fields[SEARCH_RESPONSE.field_index("records").unwrap()];
        assert!(field.accepts(Tag::context(28)));
        assert!(field.accepts(Tag::context(130)));
        assert!(field.accepts(Tag::context(205)));
        assert!(!field.accepts(Tag::context(29)));
    }
}
