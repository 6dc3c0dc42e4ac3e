//! Core types and utilities for the z39_rs Z39.50 BER codec
//!
//! This crate provides the error taxonomy shared by all layers and the
//! OBJECT IDENTIFIER value type with the well-known Z39.50 registry
//! constants.

pub mod bit_string;
pub mod error;
pub mod oid;

pub use bit_string::BitString;
pub use error::{Z39Error, Z39Result};
pub use oid::Oid;
