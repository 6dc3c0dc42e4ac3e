//! BER identifier octets: tag class, tag number, length

use std::fmt;
use z39_core::{Z39Error, Z39Result};

/// BER tag class
///
/// ASN.1 defines four tag classes:
/// - **Universal**: standard ASN.1 types (INTEGER, OCTET STRING, ...)
/// - **Application**: application-wide types (the Z39.50 APDUs in ANSI
///   Z39.50-1988; version 3 uses context tags instead)
/// - **Context-specific**: meaning depends on the enclosing SEQUENCE or
///   CHOICE; this is where nearly all Z39.50 field tags live
/// - **Private**: implementation-specific types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagClass {
    /// Universal class (bits 00)
    Universal = 0,
    /// Application class (bits 01)
    Application = 1,
    /// Context-specific class (bits 10)
    ContextSpecific = 2,
    /// Private class (bits 11)
    Private = 3,
}

impl TagClass {
    /// Get the tag class from bits 8-7 of an identifier octet.
    pub fn from_bits(byte: u8) -> Self {
        match (byte >> 6) & 0x03 {
            0 => TagClass::Universal,
            1 => TagClass::Application,
            2 => TagClass::ContextSpecific,
            _ => TagClass::Private,
        }
    }

    /// Convert the tag class to bits 8-7 of an identifier octet.
    pub fn to_bits(self) -> u8 {
        (self as u8) << 6
    }
}

impl fmt::Display for TagClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagClass::Universal => "UNIVERSAL",
            TagClass::Application => "APPLICATION",
            TagClass::ContextSpecific => "CONTEXT",
            TagClass::Private => "PRIVATE",
        };
        write!(f, "{name}")
    }
}

/// A BER tag: the (class, number) pair identifying an encoded element.
///
/// The constructed/primitive bit is deliberately not part of the tag.
/// The codec driver decides field presence by comparing tags during
/// lookahead, and a context tag matches whether the element carries
/// primitive or constructed content; constructedness is an attribute of
/// the parsed element instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Tag {
    class: TagClass,
    number: u32,
}

impl Tag {
    /// Create a new tag.
    pub const fn new(class: TagClass, number: u32) -> Self {
        Self { class, number }
    }

    /// Create a Universal class tag.
    pub const fn universal(number: u32) -> Self {
        Self::new(TagClass::Universal, number)
    }

    /// Create an Application class tag.
    pub const fn application(number: u32) -> Self {
        Self::new(TagClass::Application, number)
    }

    /// Create a Context-specific class tag.
    pub const fn context(number: u32) -> Self {
        Self::new(TagClass::ContextSpecific, number)
    }

    /// Create a Private class tag.
    pub const fn private(number: u32) -> Self {
        Self::new(TagClass::Private, number)
    }

    /// UNIVERSAL 1, BOOLEAN.
    pub const BOOLEAN: Tag = Tag::universal(1);
    /// UNIVERSAL 2, INTEGER.
    pub const INTEGER: Tag = Tag::universal(2);
    /// UNIVERSAL 3, BIT STRING.
    pub const BIT_STRING: Tag = Tag::universal(3);
    /// UNIVERSAL 4, OCTET STRING.
    pub const OCTET_STRING: Tag = Tag::universal(4);
    /// UNIVERSAL 5, NULL.
    pub const NULL: Tag = Tag::universal(5);
    /// UNIVERSAL 6, OBJECT IDENTIFIER.
    pub const OBJECT_IDENTIFIER: Tag = Tag::universal(6);
    /// UNIVERSAL 7, ObjectDescriptor.
    pub const OBJECT_DESCRIPTOR: Tag = Tag::universal(7);
    /// UNIVERSAL 8, EXTERNAL.
    pub const EXTERNAL: Tag = Tag::universal(8);
    /// UNIVERSAL 16, SEQUENCE and SEQUENCE OF.
    pub const SEQUENCE: Tag = Tag::universal(16);
    /// UNIVERSAL 26, VisibleString.
    pub const VISIBLE_STRING: Tag = Tag::universal(26);
    /// UNIVERSAL 27, GeneralString (Z39.50 InternationalString).
    pub const GENERAL_STRING: Tag = Tag::universal(27);

    /// Get the tag class.
    pub fn class(&self) -> TagClass {
        self.class
    }

    /// Get the tag number.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Encode the identifier octets.
    ///
    /// Tag numbers 0-30 use the one-byte short form; larger numbers use
    /// the extended form with base-128 continuation bytes.
    pub fn encode(&self, constructed: bool) -> Vec<u8> {
        let class_bits = self.class.to_bits();
        let constructed_bit = if constructed { 0x20 } else { 0x00 };

        if self.number <= 30 {
            return vec![class_bits | constructed_bit | (self.number as u8 & 0x1F)];
        }

        // Extended form: leading byte has all five tag bits set, then
        // base-128 continuation bytes, high bit set on all but the last.
        let mut result = vec![class_bits | constructed_bit | 0x1F];
        let mut remaining = self.number;
        let mut bytes = Vec::new();
        while remaining > 0 {
            bytes.push((remaining & 0x7F) as u8);
            remaining >>= 7;
        }
        for (i, &byte) in bytes.iter().rev().enumerate() {
            if i < bytes.len() - 1 {
                result.push(byte | 0x80);
            } else {
                result.push(byte);
            }
        }
        result
    }

    /// Decode identifier octets.
    ///
    /// # Returns
    ///
    /// Returns `Ok((tag, constructed, bytes_consumed))` on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer is empty, the extended form is
    /// unterminated, or the tag number overflows `u32`.
    pub fn decode(data: &[u8]) -> Z39Result<(Self, bool, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(Z39Error::Truncated("empty buffer for tag".to_string()));
        };

        let class = TagClass::from_bits(first_byte);
        let constructed = (first_byte & 0x20) != 0;
        let tag_bits = first_byte & 0x1F;

        if tag_bits < 31 {
            return Ok((Self::new(class, tag_bits as u32), constructed, 1));
        }

        // Extended form.
        let mut tag_number = 0u32;
        let mut pos = 1;
        loop {
            let Some(&byte) = data.get(pos) else {
                return Err(Z39Error::Truncated(
                    "unterminated extended tag".to_string(),
                ));
            };
            if tag_number > (u32::MAX >> 7) {
                return Err(Z39Error::InvalidEncoding(
                    "tag number exceeds u32".to_string(),
                ));
            }
            tag_number = (tag_number << 7) | (byte & 0x7F) as u32;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok((Self::new(class, tag_number), constructed, pos))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.class, self.number)
    }
}

/// BER length octets.
///
/// Definite lengths use the short form for 0-127 and the long form
/// (length-of-length prefix) above that. The indefinite form defers the
/// extent of a constructed element to an end-of-contents marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Length {
    /// Definite-length form; the declared length equals the byte span
    /// the content occupies.
    Definite(usize),
    /// Indefinite form, terminated by the 00 00 end-of-contents octets.
    /// Only constructed elements may use it.
    Indefinite,
}

impl Length {
    /// Encode a definite length, choosing the minimal form.
    pub fn encode_definite(length: usize) -> Vec<u8> {
        if length < 128 {
            return vec![length as u8];
        }
        let mut num_bytes = 0;
        let mut temp = length;
        while temp > 0 {
            num_bytes += 1;
            temp >>= 8;
        }
        let mut result = vec![0x80 | num_bytes as u8];
        for i in (0..num_bytes).rev() {
            result.push(((length >> (i * 8)) & 0xFF) as u8);
        }
        result
    }

    /// Decode length octets.
    ///
    /// # Returns
    ///
    /// Returns `Ok((length, bytes_consumed))` on success.
    pub fn decode(data: &[u8]) -> Z39Result<(Self, usize)> {
        let Some(&first_byte) = data.first() else {
            return Err(Z39Error::Truncated("empty buffer for length".to_string()));
        };

        if first_byte & 0x80 == 0 {
            return Ok((Length::Definite((first_byte & 0x7F) as usize), 1));
        }

        let num_bytes = (first_byte & 0x7F) as usize;
        if num_bytes == 0 {
            return Ok((Length::Indefinite, 1));
        }
        if num_bytes > 4 {
            return Err(Z39Error::InvalidEncoding(format!(
                "length of length too large: {num_bytes} bytes"
            )));
        }
        if data.len() < 1 + num_bytes {
            return Err(Z39Error::Truncated(format!(
                "long-form length needs {} bytes, have {}",
                1 + num_bytes,
                data.len()
            )));
        }

        let mut length = 0usize;
        for &byte in &data[1..1 + num_bytes] {
            length = (length << 8) | byte as usize;
        }
        Ok((Length::Definite(length), 1 + num_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_short_form() {
        let encoded = Tag::INTEGER.encode(false);
        assert_eq!(encoded, vec![0x02]);
        let encoded = Tag::SEQUENCE.encode(true);
        assert_eq!(encoded, vec![0x30]);
    }

    #[test]
    fn test_tag_context_class() {
        // SearchRequest query field, [21] constructed.
        let encoded = Tag::context(21).encode(true);
        assert_eq!(encoded, vec![0xB5]);
    }

    #[test]
    fn test_tag_extended_form() {
        // Close reason, [211] IMPLICIT INTEGER.
        let tag = Tag::context(211);
        let encoded = tag.encode(false);
        assert_eq!(encoded, vec![0x9F, 0x81, 0x53]);
        let (decoded, constructed, consumed) = Tag::decode(&encoded).unwrap();
        assert_eq!(decoded, tag);
        assert!(!constructed);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_tag_decode_short_form() {
        let (tag, constructed, consumed) = Tag::decode(&[0xA2, 0x00]).unwrap();
        assert_eq!(tag, Tag::context(2));
        assert!(constructed);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_tag_decode_truncated_extended_form() {
        assert!(matches!(
            Tag::decode(&[0x9F, 0x81]),
            Err(Z39Error::Truncated(_))
        ));
    }

    #[test]
    fn test_length_short_form() {
        assert_eq!(Length::encode_definite(100), vec![100]);
        let (length, consumed) = Length::decode(&[100]).unwrap();
        assert_eq!(length, Length::Definite(100));
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_length_long_form() {
        let encoded = Length::encode_definite(1000);
        assert_eq!(encoded, vec![0x82, 0x03, 0xE8]);
        let (length, consumed) = Length::decode(&encoded).unwrap();
        assert_eq!(length, Length::Definite(1000));
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_length_indefinite() {
        let (length, consumed) = Length::decode(&[0x80]).unwrap();
        assert_eq!(length, Length::Indefinite);
        assert_eq!(consumed, 1);
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(format!("{}", Tag::context(21)), "[CONTEXT 21]");
        assert_eq!(format!("{}", Tag::INTEGER), "[UNIVERSAL 2]");
    }
}
