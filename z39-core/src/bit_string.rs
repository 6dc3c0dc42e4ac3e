//! Bit string value type

use crate::error::{Z39Error, Z39Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Arbitrary string of bits. A bit string value can have any length
/// including zero; the trailing bits of the last byte beyond `num_bits`
/// must be zero.
///
/// Z39.50 uses bit strings for `protocolVersion` and `options` in the
/// Initialize exchange, where bit N set means version/option N+1 is
/// supported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitString {
    #[serde(with = "serde_bytes")]
    bytes: Vec<u8>,
    num_bits: usize,
}

impl BitString {
    /// Construct a new bit string.
    ///
    /// # Arguments
    ///
    /// * `bytes` - The bit string as a byte array, most significant bit first
    /// * `num_bits` - The number of significant bits
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bits > bytes.len() * 8`.
    pub fn new(bytes: Vec<u8>, num_bits: usize) -> Z39Result<Self> {
        if num_bits > bytes.len() * 8 {
            return Err(Z39Error::InvalidEncoding(format!(
                "bit string too short: {} byte(s) cannot hold {} bits",
                bytes.len(),
                num_bits
            )));
        }
        Ok(Self { bytes, num_bits })
    }

    /// An empty bit string.
    pub fn empty() -> Self {
        Self {
            bytes: Vec::new(),
            num_bits: 0,
        }
    }

    /// Construct a bit string with the given bit positions set
    /// (position 0 is the most significant bit of the first byte).
    pub fn with_bits_set(positions: &[usize]) -> Self {
        let num_bits = positions.iter().map(|p| p + 1).max().unwrap_or(0);
        let mut bytes = vec![0u8; num_bits.div_ceil(8)];
        for &position in positions {
            bytes[position / 8] |= 0x80 >> (position % 8);
        }
        Self { bytes, num_bits }
    }

    /// The underlying bytes, most significant bit first.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The number of significant bits.
    pub fn num_bits(&self) -> usize {
        self.num_bits
    }

    /// The number of unused bits in the last byte (0-7).
    pub fn unused_bits(&self) -> u8 {
        (self.bytes.len() * 8 - self.num_bits) as u8
    }

    /// Test whether the bit at `position` is set. Positions at or
    /// beyond `num_bits` read as unset.
    pub fn is_set(&self, position: usize) -> bool {
        if position >= self.num_bits {
            return false;
        }
        self.bytes[position / 8] & (0x80 >> (position % 8)) != 0
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for position in 0..self.num_bits {
            write!(f, "{}", if self.is_set(position) { '1' } else { '0' })?;
        }
        Ok(())
    }
}
