use crate::error::{Z39Error, Z39Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ASN.1 OBJECT IDENTIFIER value
///
/// An OID is a sequence of unsigned integer components. In Z39.50 OIDs
/// identify attribute sets, diagnostic sets, and record syntaxes; the
/// registry arc for the protocol is 1.2.840.10003.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Oid {
    components: Vec<u32>,
}

impl Oid {
    /// Create an OID from its components.
    ///
    /// # Errors
    ///
    /// Returns an error if fewer than two components are given, or if
    /// the first two components are out of the range BER can encode
    /// (first must be 0-2; second must be 0-39 when first is 0 or 1).
    pub fn new(components: Vec<u32>) -> Z39Result<Self> {
        if components.len() < 2 {
            return Err(Z39Error::InvalidEncoding(
                "object identifier must have at least 2 components".to_string(),
            ));
        }
        if components[0] > 2 {
            return Err(Z39Error::InvalidEncoding(format!(
                "invalid first OID component: {}",
                components[0]
            )));
        }
        if components[0] < 2 && components[1] > 39 {
            return Err(Z39Error::InvalidEncoding(format!(
                "invalid second OID component: {}",
                components[1]
            )));
        }
        Ok(Self { components })
    }

    /// Parse an OID from dotted notation, e.g. `"1.2.840.10003.3.1"`.
    pub fn from_string(s: &str) -> Z39Result<Self> {
        let mut components = Vec::new();
        for part in s.split('.') {
            let value = part.parse::<u32>().map_err(|_| {
                Z39Error::InvalidEncoding(format!("invalid OID component: {part:?}"))
            })?;
            components.push(value);
        }
        Self::new(components)
    }

    /// Get the OID components.
    pub fn components(&self) -> &[u32] {
        &self.components
    }

    /// The Bib-1 attribute set, 1.2.840.10003.3.1.
    pub fn bib1_attribute_set() -> Self {
        Self {
            components: vec![1, 2, 840, 10003, 3, 1],
        }
    }

    /// The Bib-1 diagnostic set, 1.2.840.10003.4.1.
    pub fn bib1_diagnostic_set() -> Self {
        Self {
            components: vec![1, 2, 840, 10003, 4, 1],
        }
    }

    /// The MARC21 (USMARC) record syntax, 1.2.840.10003.5.10.
    pub fn marc21_syntax() -> Self {
        Self {
            components: vec![1, 2, 840, 10003, 5, 10],
        }
    }

    /// The SUTRS record syntax, 1.2.840.10003.5.101.
    pub fn sutrs_syntax() -> Self {
        Self {
            components: vec![1, 2, 840, 10003, 5, 101],
        }
    }

    /// The XML record syntax, 1.2.840.10003.5.109.10.
    pub fn xml_syntax() -> Self {
        Self {
            components: vec![1, 2, 840, 10003, 5, 109, 10],
        }
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for component in &self.components {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{component}")?;
            first = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oid_from_string() {
        let oid = Oid::from_string("1.2.840.10003.3.1").unwrap();
        assert_eq!(oid, Oid::bib1_attribute_set());
        assert_eq!(oid.components(), &[1, 2, 840, 10003, 3, 1]);
    }

    #[test]
    fn test_oid_display() {
        let oid = Oid::marc21_syntax();
        assert_eq!(format!("{oid}"), "1.2.840.10003.5.10");
    }

    #[test]
    fn test_oid_rejects_single_component() {
        assert!(Oid::new(vec![1]).is_err());
    }

    #[test]
    fn test_oid_rejects_invalid_leading_components() {
        assert!(Oid::new(vec![3, 1]).is_err());
        assert!(Oid::new(vec![1, 40]).is_err());
        assert!(Oid::new(vec![2, 999]).is_ok());
    }

    #[test]
    fn test_oid_rejects_garbage_string() {
        assert!(Oid::from_string("1.2.x").is_err());
        assert!(Oid::from_string("").is_err());
    }
}
