//! Schema-driven BER codec
//!
//! This crate implements the Basic Encoding Rules machinery underneath
//! the Z39.50 protocol layer:
//!
//! - [`tag`] and [`element`]: the lexical layer, identifier and length
//!   octets and the parsed element tree
//! - [`primitive`]: content codecs for INTEGER, BOOLEAN, BIT STRING,
//!   OBJECT IDENTIFIER and the string types
//! - [`schema`]: static, declarative message descriptions
//! - [`value`]: the generic decoded representation
//! - [`codec`]: the single driver that encodes and decodes any message
//!   from its schema
//! - [`external`]: the EXTERNAL envelope used for record payloads
//!
//! Message definitions reduce to schema tables; see [`crate::codec`]
//! for the decode algorithm.

pub mod codec;
pub mod element;
pub mod external;
pub mod primitive;
pub mod schema;
pub mod tag;
pub mod value;

pub use codec::{decode, decode_choice, encode, encode_choice};
pub use element::{BerElement, ElementReader};
pub use external::{External, ExternalEncoding};
pub use schema::{ChoiceSchema, FieldDescriptor, FieldType, SequenceSchema, TaggingMode};
pub use tag::{Length, Tag, TagClass};
pub use value::{ChoiceValue, SequenceValue, Value};
