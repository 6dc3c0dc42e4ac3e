//! Z39.50 APDU definitions
//!
//! The message layer on top of the generic BER framework: static
//! schema tables with the ANSI/NISO Z39.50-1995 tag assignments
//! ([`schemas`]), typed message structs with whole-message
//! `encode`/`decode` ([`pdu`], [`query`], [`records`]), and the small
//! protocol enumerations ([`types`]).

pub mod schemas;
pub mod types;

mod convert;
pub mod pdu;
pub mod query;
pub mod records;

pub use pdu::{
    Close, IdAuthentication, InitializeRequest, InitializeResponse, Pdu, PresentRequest,
    PresentResponse, SearchRequest, SearchResponse, protocol_version_3,
};
pub use query::{
    AttributeElement, AttributesPlusTerm, Operand, Query, RpnQuery, RpnStructure, Term,
};
pub use records::{DefaultDiagFormat, DiagRec, NamePlusRecord, Record, Records};
pub use types::{CloseReason, OperatorKind, PresentStatus, ResultSetStatus};
