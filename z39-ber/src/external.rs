//! The ASN.1 EXTERNAL type
//!
//! EXTERNAL carries data described outside the current module. In
//! Z39.50 it is the envelope of every record payload: the
//! direct-reference OID names the record syntax (MARC21, SUTRS, XML)
//! and the encoding holds the record bytes.

use crate::element::{BerElement, ElementReader};
use crate::primitive;
use crate::tag::Tag;
use z39_core::{BitString, Oid, Z39Error, Z39Result};

/// A decoded EXTERNAL value.
///
/// `[UNIVERSAL 8] IMPLICIT SEQUENCE { direct-reference OBJECT
/// IDENTIFIER OPTIONAL, indirect-reference INTEGER OPTIONAL,
/// data-value-descriptor ObjectDescriptor OPTIONAL, encoding CHOICE {
/// single-ASN1-type [0] ANY, octet-aligned [1] IMPLICIT OCTET STRING,
/// arbitrary [2] IMPLICIT BIT STRING } }`
#[derive(Debug, Clone, PartialEq)]
pub struct External {
    /// OID naming the abstract syntax of the data.
    pub direct_reference: Option<Oid>,
    /// Presentation-context identifier alternative to the OID.
    pub indirect_reference: Option<i64>,
    /// Human-readable description of the data value.
    pub data_value_descriptor: Option<String>,
    /// The carried data.
    pub encoding: ExternalEncoding,
}

/// The encoding alternative of an EXTERNAL.
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalEncoding {
    /// `[0]` single-ASN1-type: one complete BER element of any type.
    SingleAsn1Type(BerElement),
    /// `[1]` octet-aligned: raw bytes.
    OctetAligned(Vec<u8>),
    /// `[2]` arbitrary: a bit string.
    Arbitrary(BitString),
}

impl External {
    /// An EXTERNAL wrapping octet-aligned data under a syntax OID, the
    /// common shape of a Z39.50 retrieval record.
    pub fn octet_aligned(syntax: Oid, data: Vec<u8>) -> Self {
        Self {
            direct_reference: Some(syntax),
            indirect_reference: None,
            data_value_descriptor: None,
            encoding: ExternalEncoding::OctetAligned(data),
        }
    }

    /// Decode from an element, which must carry the UNIVERSAL 8 tag.
    pub fn from_element(element: &BerElement) -> Z39Result<Self> {
        if element.tag() != Tag::EXTERNAL {
            return Err(Z39Error::BadTag {
                context: "EXTERNAL".to_string(),
                expected: Tag::EXTERNAL.to_string(),
                found: element.tag().to_string(),
            });
        }
        Self::from_children(element.children()?)
    }

    /// Decode from the child list, for positions where an implicit
    /// context tag has replaced the UNIVERSAL 8 tag.
    pub fn from_children(children: &[BerElement]) -> Z39Result<Self> {
        let mut reader = ElementReader::new(children);

        let direct_reference = match reader.peek() {
            Some(element) if element.tag() == Tag::OBJECT_IDENTIFIER => {
                let oid = primitive::decode_oid(element.content()?)
                    .map_err(|e| e.qualify("EXTERNAL.direct-reference"))?;
                let _ = reader.next();
                Some(oid)
            }
            _ => None,
        };

        let indirect_reference = match reader.peek() {
            Some(element) if element.tag() == Tag::INTEGER => {
                let reference = primitive::decode_integer(element.content()?)
                    .map_err(|e| e.qualify("EXTERNAL.indirect-reference"))?;
                let _ = reader.next();
                Some(reference)
            }
            _ => None,
        };

        let data_value_descriptor = match reader.peek() {
            Some(element) if element.tag() == Tag::OBJECT_DESCRIPTOR => {
                let descriptor = primitive::decode_general_string(element.content()?)
                    .map_err(|e| e.qualify("EXTERNAL.data-value-descriptor"))?;
                let _ = reader.next();
                Some(descriptor)
            }
            _ => None,
        };

        let Some(element) = reader.next() else {
            return Err(Z39Error::IncompleteMessage {
                context: "EXTERNAL.encoding".to_string(),
            });
        };
        let encoding = match (element.tag(), element) {
            (tag, BerElement::Constructed { children, .. }) if tag == Tag::context(0) => {
                let [inner] = children.as_slice() else {
                    return Err(Z39Error::InvalidEncoding(
                        "EXTERNAL.encoding: single-ASN1-type must hold exactly one element"
                            .to_string(),
                    ));
                };
                ExternalEncoding::SingleAsn1Type(inner.clone())
            }
            (tag, element) if tag == Tag::context(1) => {
                ExternalEncoding::OctetAligned(element.content()?.to_vec())
            }
            (tag, element) if tag == Tag::context(2) => ExternalEncoding::Arbitrary(
                primitive::decode_bit_string(element.content()?)
                    .map_err(|e| e.qualify("EXTERNAL.encoding"))?,
            ),
            (tag, _) => {
                return Err(Z39Error::ChoiceNotMatched {
                    context: "EXTERNAL.encoding".to_string(),
                    found: tag.to_string(),
                });
            }
        };

        if !reader.is_exhausted() {
            return Err(Z39Error::ExtraData {
                context: "EXTERNAL".to_string(),
                count: reader.remaining(),
            });
        }

        Ok(Self {
            direct_reference,
            indirect_reference,
            data_value_descriptor,
            encoding,
        })
    }

    /// Encode as a UNIVERSAL 8 constructed element.
    pub fn to_element(&self) -> BerElement {
        BerElement::constructed(Tag::EXTERNAL, self.to_children())
    }

    /// Encode the child list, omitting absent optional members.
    pub fn to_children(&self) -> Vec<BerElement> {
        let mut children = Vec::new();
        if let Some(oid) = &self.direct_reference {
            children.push(BerElement::primitive(
                Tag::OBJECT_IDENTIFIER,
                primitive::encode_oid(oid),
            ));
        }
        if let Some(reference) = self.indirect_reference {
            children.push(BerElement::primitive(
                Tag::INTEGER,
                primitive::encode_integer(reference),
            ));
        }
        if let Some(descriptor) = &self.data_value_descriptor {
            children.push(BerElement::primitive(
                Tag::OBJECT_DESCRIPTOR,
                primitive::encode_string(descriptor),
            ));
        }
        children.push(match &self.encoding {
            ExternalEncoding::SingleAsn1Type(inner) => {
                BerElement::constructed(Tag::context(0), vec![inner.clone()])
            }
            ExternalEncoding::OctetAligned(bytes) => {
                BerElement::primitive(Tag::context(1), bytes.clone())
            }
            ExternalEncoding::Arbitrary(bits) => {
                BerElement::primitive(Tag::context(2), primitive::encode_bit_string(bits))
            }
        });
        children
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_octet_aligned_round_trip() {
        let external = External::octet_aligned(Oid::marc21_syntax(), b"01234nam".to_vec());
        let element = external.to_element();
        assert_eq!(element.tag(), Tag::EXTERNAL);
        assert_eq!(External::from_element(&element).unwrap(), external);
    }

    #[test]
    fn test_single_asn1_type_round_trip() {
        let payload = BerElement::primitive(Tag::GENERAL_STRING, b"sutrs record".to_vec());
        let external = External {
            direct_reference: Some(Oid::sutrs_syntax()),
            indirect_reference: None,
            data_value_descriptor: Some("record".to_string()),
            encoding: ExternalEncoding::SingleAsn1Type(payload),
        };
        let element = external.to_element();
        assert_eq!(External::from_element(&element).unwrap(), external);
    }

    #[test]
    fn test_missing_encoding_is_incomplete() {
        let element = BerElement::constructed(
            Tag::EXTERNAL,
            vec![BerElement::primitive(
                Tag::OBJECT_IDENTIFIER,
                primitive::encode_oid(&Oid::marc21_syntax()),
            )],
        );
        assert!(matches!(
            External::from_element(&element),
            Err(Z39Error::IncompleteMessage { .. })
        ));
    }

    #[test]
    fn test_unknown_encoding_arm_not_matched() {
        let element = BerElement::constructed(
            Tag::EXTERNAL,
            vec![BerElement::primitive(Tag::context(9), vec![])],
        );
        assert!(matches!(
            External::from_element(&element),
            Err(Z39Error::ChoiceNotMatched { .. })
        ));
    }

    #[test]
    fn test_trailing_child_is_extra_data() {
        let mut children =
            External::octet_aligned(Oid::marc21_syntax(), vec![1, 2, 3]).to_children();
        children.push(BerElement::primitive(Tag::INTEGER, vec![0x01]));
        let element = BerElement::constructed(Tag::EXTERNAL, children);
        assert!(matches!(
            External::from_element(&element),
            Err(Z39Error::ExtraData { .. })
        ));
    }

    #[test]
    fn test_wrong_root_tag() {
        let element = BerElement::constructed(Tag::SEQUENCE, vec![]);
        assert!(matches!(
            External::from_element(&element),
            Err(Z39Error::BadTag { .. })
        ));
    }
}
