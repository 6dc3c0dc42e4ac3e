//! Parsed BER elements and the lexical tag/length/content layer
//!
//! A [`BerElement`] is one parsed encoding unit: a tag plus either
//! primitive content bytes or an ordered sequence of child elements.
//! A constructed element exclusively owns its children; the parse
//! produces an independent tree per message, so separate messages can
//! be decoded on separate threads with no synchronization.

use crate::tag::{Length, Tag};
use z39_core::{Z39Error, Z39Result};

/// Maximum constructed nesting the parser accepts. Z39.50 messages
/// stay in single digits apart from RPN trees, and even a degenerate
/// left-leaning RPN query of a thousand terms nests well below this.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A parsed BER element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BerElement {
    /// Leaf element; content is an uninterpreted byte string.
    Primitive { tag: Tag, content: Vec<u8> },
    /// Constructed element; content is an ordered list of child elements.
    Constructed {
        tag: Tag,
        children: Vec<BerElement>,
    },
}

impl BerElement {
    /// Create a primitive element.
    pub fn primitive(tag: Tag, content: Vec<u8>) -> Self {
        BerElement::Primitive { tag, content }
    }

    /// Create a constructed element.
    pub fn constructed(tag: Tag, children: Vec<BerElement>) -> Self {
        BerElement::Constructed { tag, children }
    }

    /// Get the element's tag.
    pub fn tag(&self) -> Tag {
        match self {
            BerElement::Primitive { tag, .. } => *tag,
            BerElement::Constructed { tag, .. } => *tag,
        }
    }

    /// Whether this element is constructed.
    pub fn is_constructed(&self) -> bool {
        matches!(self, BerElement::Constructed { .. })
    }

    /// Get primitive content bytes.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEncoding` if the element is constructed.
    pub fn content(&self) -> Z39Result<&[u8]> {
        match self {
            BerElement::Primitive { content, .. } => Ok(content),
            BerElement::Constructed { tag, .. } => Err(Z39Error::InvalidEncoding(format!(
                "expected primitive content, {tag} is constructed"
            ))),
        }
    }

    /// Get the child elements.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEncoding` if the element is primitive.
    pub fn children(&self) -> Z39Result<&[BerElement]> {
        match self {
            BerElement::Constructed { children, .. } => Ok(children),
            BerElement::Primitive { tag, .. } => Err(Z39Error::InvalidEncoding(format!(
                "expected constructed element, {tag} is primitive"
            ))),
        }
    }

    /// Parse one BER element from the front of `data`.
    ///
    /// Handles definite-length elements (the declared length must fit
    /// inside the buffer) and indefinite-length constructed elements
    /// terminated by the 00 00 end-of-contents octets. Constructed
    /// nesting deeper than [`MAX_NESTING_DEPTH`] is rejected as
    /// `InvalidEncoding`, bounding the parse stack on untrusted input.
    ///
    /// # Returns
    ///
    /// Returns `Ok((element, bytes_consumed))` on success.
    pub fn parse(data: &[u8]) -> Z39Result<(Self, usize)> {
        Self::parse_at_depth(data, 0)
    }

    fn parse_at_depth(data: &[u8], depth: usize) -> Z39Result<(Self, usize)> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Z39Error::InvalidEncoding(format!(
                "constructed nesting exceeds {MAX_NESTING_DEPTH} levels"
            )));
        }
        let (tag, constructed, tag_len) = Tag::decode(data)?;
        let (length, len_len) = Length::decode(&data[tag_len..])?;
        let header = tag_len + len_len;

        match length {
            Length::Definite(content_len) => {
                if data.len() < header + content_len {
                    return Err(Z39Error::Truncated(format!(
                        "{tag} declares {content_len} content byte(s), only {} available",
                        data.len() - header
                    )));
                }
                let content = &data[header..header + content_len];
                let element = if constructed {
                    BerElement::Constructed {
                        tag,
                        children: Self::parse_all_at_depth(content, depth + 1)?,
                    }
                } else {
                    BerElement::Primitive {
                        tag,
                        content: content.to_vec(),
                    }
                };
                Ok((element, header + content_len))
            }
            Length::Indefinite => {
                if !constructed {
                    return Err(Z39Error::InvalidEncoding(format!(
                        "{tag}: indefinite length on a primitive element"
                    )));
                }
                let mut children = Vec::new();
                let mut pos = header;
                loop {
                    match data.get(pos..pos + 2) {
                        Some([0x00, 0x00]) => {
                            pos += 2;
                            break;
                        }
                        None if data.len() <= pos => {
                            return Err(Z39Error::Truncated(format!(
                                "{tag}: missing end-of-contents octets"
                            )));
                        }
                        _ => {
                            let (child, consumed) = Self::parse_at_depth(&data[pos..], depth + 1)?;
                            children.push(child);
                            pos += consumed;
                        }
                    }
                }
                Ok((BerElement::Constructed { tag, children }, pos))
            }
        }
    }

    /// Parse a buffer holding a back-to-back run of elements.
    pub fn parse_all(data: &[u8]) -> Z39Result<Vec<BerElement>> {
        Self::parse_all_at_depth(data, 0)
    }

    fn parse_all_at_depth(mut data: &[u8], depth: usize) -> Z39Result<Vec<BerElement>> {
        let mut elements = Vec::new();
        while !data.is_empty() {
            let (element, consumed) = Self::parse_at_depth(data, depth)?;
            elements.push(element);
            data = &data[consumed..];
        }
        Ok(elements)
    }

    /// Parse a buffer that must contain exactly one element.
    ///
    /// # Errors
    ///
    /// Returns `InvalidEncoding` if bytes remain after the element.
    pub fn parse_single(data: &[u8]) -> Z39Result<BerElement> {
        let (element, consumed) = Self::parse(data)?;
        if consumed != data.len() {
            return Err(Z39Error::InvalidEncoding(format!(
                "{} trailing byte(s) after element",
                data.len() - consumed
            )));
        }
        Ok(element)
    }

    /// Serialize to definite-length BER.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.encode_into(&mut out);
        out
    }

    /// Serialize to definite-length BER, appending to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            BerElement::Primitive { tag, content } => {
                out.extend_from_slice(&tag.encode(false));
                out.extend_from_slice(&Length::encode_definite(content.len()));
                out.extend_from_slice(content);
            }
            BerElement::Constructed { tag, children } => {
                let mut inner = Vec::new();
                for child in children {
                    child.encode_into(&mut inner);
                }
                out.extend_from_slice(&tag.encode(true));
                out.extend_from_slice(&Length::encode_definite(inner.len()));
                out.extend_from_slice(&inner);
            }
        }
    }
}

/// Ordered, single-pass access to a constructed element's children.
///
/// Schema fields are consumed strictly in declaration order, so the
/// reader only ever moves forward. `peek_tag` supports the lookahead
/// the codec driver needs for OPTIONAL and CHOICE fields: look at the
/// next child's tag, consume only on a match.
pub struct ElementReader<'a> {
    children: &'a [BerElement],
    pos: usize,
}

impl<'a> ElementReader<'a> {
    /// Create a reader over a child list.
    pub fn new(children: &'a [BerElement]) -> Self {
        Self { children, pos: 0 }
    }

    /// Report the tag of the next unconsumed child without consuming it.
    pub fn peek_tag(&self) -> Option<Tag> {
        self.children.get(self.pos).map(BerElement::tag)
    }

    /// Look at the next unconsumed child without consuming it.
    pub fn peek(&self) -> Option<&'a BerElement> {
        self.children.get(self.pos)
    }

    /// Advance past and return the next unconsumed child, or `None`
    /// when exhausted.
    pub fn next(&mut self) -> Option<&'a BerElement> {
        let element = self.children.get(self.pos)?;
        self.pos += 1;
        Some(element)
    }

    /// The number of unconsumed children.
    pub fn remaining(&self) -> usize {
        self.children.len() - self.pos
    }

    /// Whether all children have been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitive() {
        // INTEGER 5
        let data = [0x02, 0x01, 0x05];
        let (element, consumed) = BerElement::parse(&data).unwrap();
        assert_eq!(consumed, 3);
        assert_eq!(element.tag(), Tag::INTEGER);
        assert_eq!(element.content().unwrap(), &[0x05]);
    }

    #[test]
    fn test_parse_constructed_recurses() {
        // SEQUENCE { INTEGER 5, BOOLEAN TRUE }
        let data = [0x30, 0x06, 0x02, 0x01, 0x05, 0x01, 0x01, 0xFF];
        let (element, consumed) = BerElement::parse(&data).unwrap();
        assert_eq!(consumed, 8);
        let children = element.children().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag(), Tag::INTEGER);
        assert_eq!(children[1].tag(), Tag::BOOLEAN);
    }

    #[test]
    fn test_parse_indefinite_length() {
        // SEQUENCE (indefinite) { INTEGER 5 } EOC
        let data = [0x30, 0x80, 0x02, 0x01, 0x05, 0x00, 0x00];
        let (element, consumed) = BerElement::parse(&data).unwrap();
        assert_eq!(consumed, 7);
        assert_eq!(element.children().unwrap().len(), 1);
        // Re-encoding always uses the definite form.
        assert_eq!(element.encode(), vec![0x30, 0x03, 0x02, 0x01, 0x05]);
    }

    #[test]
    fn test_parse_indefinite_missing_eoc() {
        let data = [0x30, 0x80, 0x02, 0x01, 0x05];
        assert!(matches!(
            BerElement::parse(&data),
            Err(Z39Error::Truncated(_))
        ));
    }

    #[test]
    fn test_parse_indefinite_primitive_rejected() {
        let data = [0x04, 0x80, 0x00, 0x00];
        assert!(matches!(
            BerElement::parse(&data),
            Err(Z39Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_declared_length_exceeding_buffer() {
        let data = [0x04, 0x05, 0x01, 0x02];
        assert!(matches!(
            BerElement::parse(&data),
            Err(Z39Error::Truncated(_))
        ));
    }

    #[test]
    fn test_parse_rejects_excessive_nesting() {
        // A SEQUENCE nested well past the depth limit must come back
        // as an error instead of exhausting the parse stack.
        let mut data = vec![0x02, 0x01, 0x00];
        for _ in 0..MAX_NESTING_DEPTH + 64 {
            let mut wrapped = vec![0x30];
            wrapped.extend_from_slice(&Length::encode_definite(data.len()));
            wrapped.extend_from_slice(&data);
            data = wrapped;
        }
        assert!(matches!(
            BerElement::parse(&data),
            Err(Z39Error::InvalidEncoding(_))
        ));

        // The same applies to indefinite-length nesting.
        let mut data = vec![0x02, 0x01, 0x00];
        for _ in 0..MAX_NESTING_DEPTH + 64 {
            let mut wrapped = vec![0x30, 0x80];
            wrapped.extend_from_slice(&data);
            wrapped.extend_from_slice(&[0x00, 0x00]);
            data = wrapped;
        }
        assert!(matches!(
            BerElement::parse(&data),
            Err(Z39Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_parse_accepts_nesting_at_the_limit() {
        let mut data = vec![0x02, 0x01, 0x2A];
        for _ in 0..MAX_NESTING_DEPTH {
            let mut wrapped = vec![0x30];
            wrapped.extend_from_slice(&Length::encode_definite(data.len()));
            wrapped.extend_from_slice(&data);
            data = wrapped;
        }
        assert!(BerElement::parse(&data).is_ok());
    }

    #[test]
    fn test_parse_single_rejects_trailing_bytes() {
        let data = [0x02, 0x01, 0x05, 0x00];
        assert!(matches!(
            BerElement::parse_single(&data),
            Err(Z39Error::InvalidEncoding(_))
        ));
    }

    #[test]
    fn test_encode_round_trip() {
        let element = BerElement::constructed(
            Tag::context(21),
            vec![BerElement::primitive(Tag::context(1), vec![0x2A])],
        );
        let encoded = element.encode();
        let decoded = BerElement::parse_single(&encoded).unwrap();
        assert_eq!(decoded, element);
    }

    #[test]
    fn test_element_reader_peek_and_next() {
        let children = vec![
            BerElement::primitive(Tag::context(0), vec![]),
            BerElement::primitive(Tag::context(1), vec![]),
        ];
        let mut reader = ElementReader::new(&children);
        assert_eq!(reader.peek_tag(), Some(Tag::context(0)));
        assert_eq!(reader.remaining(), 2);
        // Peek does not consume.
        assert_eq!(reader.peek_tag(), Some(Tag::context(0)));
        assert_eq!(reader.next().unwrap().tag(), Tag::context(0));
        assert_eq!(reader.next().unwrap().tag(), Tag::context(1));
        assert!(reader.is_exhausted());
        assert!(reader.next().is_none());
    }
}
