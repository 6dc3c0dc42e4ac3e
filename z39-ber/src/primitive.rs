//! Content-level codecs for the primitive ASN.1 types
//!
//! These functions translate between typed values and the content
//! octets of a primitive BER element; tag and length handling lives in
//! [`crate::element`]. Decoding is total and exact: content that is not
//! a canonical encoding of the expected type fails with
//! `MalformedPrimitive` rather than being coerced.

use z39_core::{BitString, Oid, Z39Error, Z39Result};

fn malformed(ty: &str, detail: impl Into<String>) -> Z39Error {
    Z39Error::MalformedPrimitive {
        context: ty.to_string(),
        detail: detail.into(),
    }
}

/// Encode an INTEGER as minimal-length two's complement, big-endian.
pub fn encode_integer(value: i64) -> Vec<u8> {
    if value == 0 {
        return vec![0];
    }
    if value == -1 {
        return vec![0xFF];
    }

    let mut bytes = Vec::new();
    let mut temp = value;
    if value < 0 {
        while temp != -1 {
            bytes.push((temp & 0xFF) as u8);
            temp >>= 8;
        }
        // Keep the sign bit set in the most significant byte.
        if bytes.last().is_none_or(|b| b & 0x80 == 0) {
            bytes.push(0xFF);
        }
    } else {
        while temp > 0 {
            bytes.push((temp & 0xFF) as u8);
            temp >>= 8;
        }
        if bytes.last().is_some_and(|b| b & 0x80 != 0) {
            bytes.push(0x00);
        }
    }
    bytes.reverse();
    bytes
}

/// Decode INTEGER content.
///
/// # Errors
///
/// Fails on empty content, content longer than 8 bytes, and
/// non-canonical padding (a leading 0x00 before a byte without the sign
/// bit, or a leading 0xFF before a byte with it).
pub fn decode_integer(content: &[u8]) -> Z39Result<i64> {
    if content.is_empty() {
        return Err(malformed("INTEGER", "empty content"));
    }
    if content.len() > 8 {
        return Err(malformed(
            "INTEGER",
            format!("{} bytes exceed i64 range", content.len()),
        ));
    }
    if content.len() > 1 {
        let padded_positive = content[0] == 0x00 && content[1] & 0x80 == 0;
        let padded_negative = content[0] == 0xFF && content[1] & 0x80 != 0;
        if padded_positive || padded_negative {
            return Err(malformed("INTEGER", "non-minimal encoding"));
        }
    }

    let mut value = 0i64;
    for &byte in content {
        value = (value << 8) | byte as i64;
    }
    // Sign-extend.
    if content[0] & 0x80 != 0 {
        let shift = 64 - content.len() * 8;
        value = (value << shift) >> shift;
    }
    Ok(value)
}

/// Encode a BOOLEAN as a single byte, 0xFF for true.
pub fn encode_boolean(value: bool) -> Vec<u8> {
    vec![if value { 0xFF } else { 0x00 }]
}

/// Decode BOOLEAN content: exactly one byte, nonzero means true.
pub fn decode_boolean(content: &[u8]) -> Z39Result<bool> {
    match content {
        [byte] => Ok(*byte != 0),
        _ => Err(malformed(
            "BOOLEAN",
            format!("expected 1 content byte, found {}", content.len()),
        )),
    }
}

/// Decode NULL content, which must be empty.
pub fn decode_null(content: &[u8]) -> Z39Result<()> {
    if content.is_empty() {
        Ok(())
    } else {
        Err(malformed(
            "NULL",
            format!("expected empty content, found {} byte(s)", content.len()),
        ))
    }
}

/// Encode a BIT STRING: one unused-bits byte, then the bit bytes.
pub fn encode_bit_string(value: &BitString) -> Vec<u8> {
    let mut bytes = vec![value.unused_bits()];
    bytes.extend_from_slice(value.as_bytes());
    bytes
}

/// Decode BIT STRING content.
pub fn decode_bit_string(content: &[u8]) -> Z39Result<BitString> {
    let Some((&unused_bits, bits)) = content.split_first() else {
        return Err(malformed("BIT STRING", "empty content"));
    };
    if unused_bits > 7 {
        return Err(malformed(
            "BIT STRING",
            format!("unused bit count {unused_bits} out of range"),
        ));
    }
    if bits.is_empty() && unused_bits != 0 {
        return Err(malformed(
            "BIT STRING",
            "unused bits declared on empty bit string",
        ));
    }
    let num_bits = bits.len() * 8 - unused_bits as usize;
    BitString::new(bits.to_vec(), num_bits)
        .map_err(|e| malformed("BIT STRING", e.to_string()))
}

/// Encode an OBJECT IDENTIFIER: first two components packed as
/// 40*X + Y, remaining components in base-128.
pub fn encode_oid(oid: &Oid) -> Vec<u8> {
    let components = oid.components();
    // Oid::new enforces at least two in-range leading components.
    let mut bytes = Vec::new();
    push_base128(&mut bytes, components[0] * 40 + components[1]);
    for &component in &components[2..] {
        push_base128(&mut bytes, component);
    }
    bytes
}

fn push_base128(out: &mut Vec<u8>, mut value: u32) {
    let mut chunks = Vec::new();
    loop {
        chunks.push((value & 0x7F) as u8);
        value >>= 7;
        if value == 0 {
            break;
        }
    }
    for (i, &chunk) in chunks.iter().rev().enumerate() {
        if i < chunks.len() - 1 {
            out.push(chunk | 0x80);
        } else {
            out.push(chunk);
        }
    }
}

/// Decode OBJECT IDENTIFIER content.
///
/// # Errors
///
/// Fails on empty content, an unterminated base-128 component, a
/// component overflowing `u32`, and non-minimal component encodings
/// (a leading 0x80 continuation byte).
pub fn decode_oid(content: &[u8]) -> Z39Result<Oid> {
    if content.is_empty() {
        return Err(malformed("OBJECT IDENTIFIER", "empty content"));
    }

    let mut components = Vec::new();
    let mut pos = 0;
    while pos < content.len() {
        if content[pos] == 0x80 {
            return Err(malformed(
                "OBJECT IDENTIFIER",
                "non-minimal component encoding",
            ));
        }
        let mut component = 0u32;
        loop {
            let Some(&byte) = content.get(pos) else {
                return Err(malformed(
                    "OBJECT IDENTIFIER",
                    "unterminated component",
                ));
            };
            if component > (u32::MAX >> 7) {
                return Err(malformed("OBJECT IDENTIFIER", "component overflow"));
            }
            component = (component << 7) | (byte & 0x7F) as u32;
            pos += 1;
            if byte & 0x80 == 0 {
                break;
            }
        }
        if components.is_empty() {
            // First subidentifier packs the first two components.
            let (first, second) = if component < 80 {
                (component / 40, component % 40)
            } else {
                (2, component - 80)
            };
            components.push(first);
            components.push(second);
        } else {
            components.push(component);
        }
    }

    Oid::new(components).map_err(|e| malformed("OBJECT IDENTIFIER", e.to_string()))
}

/// Encode a character string as its raw bytes.
pub fn encode_string(value: &str) -> Vec<u8> {
    value.as_bytes().to_vec()
}

/// Decode VisibleString content: graphic ASCII plus space.
pub fn decode_visible_string(content: &[u8]) -> Z39Result<String> {
    if let Some(byte) = content.iter().find(|b| !(0x20..=0x7E).contains(*b)) {
        return Err(malformed(
            "VisibleString",
            format!("byte 0x{byte:02X} outside the visible range"),
        ));
    }
    Ok(String::from_utf8_lossy(content).into_owned())
}

/// Decode GeneralString content.
///
/// Z39.50's InternationalString is a GeneralString carrying, in
/// practice, UTF-8 or Latin-1 data; only valid UTF-8 is accepted here.
pub fn decode_general_string(content: &[u8]) -> Z39Result<String> {
    String::from_utf8(content.to_vec())
        .map_err(|_| malformed("GeneralString", "content is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_minimal_encoding() {
        assert_eq!(encode_integer(0), vec![0x00]);
        assert_eq!(encode_integer(127), vec![0x7F]);
        assert_eq!(encode_integer(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer(-1), vec![0xFF]);
        assert_eq!(encode_integer(-128), vec![0x80]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
        assert_eq!(encode_integer(256), vec![0x01, 0x00]);
    }

    #[test]
    fn test_integer_round_trip() {
        for value in [0, 1, -1, 127, 128, -128, -129, 65_535, i64::MAX, i64::MIN] {
            assert_eq!(decode_integer(&encode_integer(value)).unwrap(), value);
        }
    }

    #[test]
    fn test_integer_rejects_empty_and_oversize() {
        assert!(decode_integer(&[]).is_err());
        assert!(decode_integer(&[0x01; 9]).is_err());
    }

    #[test]
    fn test_integer_rejects_non_canonical_padding() {
        // 0x00 0x7F should have been 0x7F.
        assert!(decode_integer(&[0x00, 0x7F]).is_err());
        // 0xFF 0x80 should have been 0x80.
        assert!(decode_integer(&[0xFF, 0x80]).is_err());
        // 0x00 0x80 is the canonical form of 128.
        assert_eq!(decode_integer(&[0x00, 0x80]).unwrap(), 128);
    }

    #[test]
    fn test_boolean() {
        assert_eq!(decode_boolean(&encode_boolean(true)).unwrap(), true);
        assert_eq!(decode_boolean(&encode_boolean(false)).unwrap(), false);
        assert_eq!(decode_boolean(&[0x01]).unwrap(), true);
        assert!(decode_boolean(&[]).is_err());
        assert!(decode_boolean(&[0x00, 0x00]).is_err());
    }

    #[test]
    fn test_null() {
        assert!(decode_null(&[]).is_ok());
        assert!(decode_null(&[0x00]).is_err());
    }

    #[test]
    fn test_bit_string_round_trip() {
        let bits = BitString::with_bits_set(&[0, 1, 2]);
        let content = encode_bit_string(&bits);
        assert_eq!(content, vec![0x05, 0xE0]);
        assert_eq!(decode_bit_string(&content).unwrap(), bits);
    }

    #[test]
    fn test_bit_string_rejects_bad_unused_count() {
        assert!(decode_bit_string(&[]).is_err());
        assert!(decode_bit_string(&[0x08, 0xFF]).is_err());
        assert!(decode_bit_string(&[0x01]).is_err());
    }

    #[test]
    fn test_oid_round_trip() {
        let oid = Oid::bib1_attribute_set();
        let content = encode_oid(&oid);
        assert_eq!(content, vec![0x2A, 0x86, 0x48, 0xCE, 0x13, 0x03, 0x01]);
        assert_eq!(decode_oid(&content).unwrap(), oid);
    }

    #[test]
    fn test_oid_joint_arc_round_trip() {
        let oid = Oid::new(vec![2, 999, 3]).unwrap();
        assert_eq!(decode_oid(&encode_oid(&oid)).unwrap(), oid);
    }

    #[test]
    fn test_oid_rejects_malformed() {
        assert!(decode_oid(&[]).is_err());
        // Unterminated component.
        assert!(decode_oid(&[0x2A, 0x86]).is_err());
        // Non-minimal leading continuation byte.
        assert!(decode_oid(&[0x2A, 0x80, 0x01]).is_err());
    }

    #[test]
    fn test_visible_string() {
        assert_eq!(decode_visible_string(b"dublin core").unwrap(), "dublin core");
        assert!(decode_visible_string(b"line\nbreak").is_err());
    }

    #[test]
    fn test_general_string() {
        assert_eq!(
            decode_general_string("köln".as_bytes()).unwrap(),
            "köln"
        );
        assert!(decode_general_string(&[0xFF, 0xFE]).is_err());
    }
}
