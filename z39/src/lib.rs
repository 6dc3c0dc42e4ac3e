//! z39_rs - a schema-driven BER codec framework for Z39.50
//!
//! This library implements the ASN.1 Basic Encoding Rules machinery of
//! the Z39.50 information-retrieval protocol: a generic, declarative
//! codec where every message type is a static schema table interpreted
//! by one driver, plus typed APDU structs on top.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `z39-core`: Error taxonomy, object identifiers, bit strings
//! - `z39-ber`: The generic BER framework (tags, elements, primitive
//!   codecs, schemas, the codec driver, EXTERNAL)
//! - `z39-apdu`: Z39.50 APDU schemas and typed messages
//!
//! # Usage
//!
//! ```
//! use z39::apdu::{Pdu, Query, RpnQuery, RpnStructure, SearchRequest, Term};
//!
//! let request = SearchRequest::new(
//!     "books",
//!     Query::Type1(RpnQuery::bib1(RpnStructure::attr_term(
//!         4,
//!         Term::general("dinosaur"),
//!     ))),
//! );
//! let bytes = Pdu::SearchRequest(request).encode().unwrap();
//! let decoded = Pdu::decode(&bytes).unwrap();
//! assert!(matches!(decoded, Pdu::SearchRequest(_)));
//! ```

pub use z39_apdu as apdu;
pub use z39_ber as ber;
pub use z39_core as core;

pub use z39_apdu::Pdu;
pub use z39_core::{BitString, Oid, Z39Error, Z39Result};
