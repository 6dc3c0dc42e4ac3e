//! Helpers for pulling typed data out of generic [`Value`]s.

use z39_ber::external::External;
use z39_ber::value::{ChoiceValue, SequenceValue, Value};
use z39_core::{Z39Error, Z39Result};

fn mismatch(expected: &str, found: &Value) -> Z39Error {
    Z39Error::Protocol(format!(
        "expected {expected} value, found {}",
        found.type_name()
    ))
}

pub(crate) fn as_integer(value: &Value) -> Z39Result<i64> {
    match value {
        Value::Integer(v) => Ok(*v),
        other => Err(mismatch("INTEGER", other)),
    }
}

pub(crate) fn as_octet_string(value: &Value) -> Z39Result<&[u8]> {
    match value {
        Value::OctetString(v) => Ok(v),
        other => Err(mismatch("OCTET STRING", other)),
    }
}

pub(crate) fn as_string(value: &Value) -> Z39Result<&str> {
    match value {
        Value::VisibleString(v) | Value::GeneralString(v) => Ok(v),
        other => Err(mismatch("character string", other)),
    }
}

pub(crate) fn as_external(value: &Value) -> Z39Result<&External> {
    match value {
        Value::External(v) => Ok(v),
        other => Err(mismatch("EXTERNAL", other)),
    }
}

pub(crate) fn as_sequence(value: &Value) -> Z39Result<&SequenceValue> {
    match value {
        Value::Sequence(v) => Ok(v),
        other => Err(mismatch("SEQUENCE", other)),
    }
}

pub(crate) fn as_choice(value: &Value) -> Z39Result<&ChoiceValue> {
    match value {
        Value::Choice(v) => Ok(v),
        other => Err(mismatch("CHOICE", other)),
    }
}

/// The selected (arm name, arm value) of a CHOICE that the driver has
/// decoded; an unset choice here is a conversion bug.
pub(crate) fn selected(choice: &ChoiceValue) -> Z39Result<(&'static str, &Value)> {
    let (index, value) = choice.require_selected()?;
    Ok((choice.schema().arms[index].name, value))
}

/// An arm decoded by the driver that the typed layer has no variant
/// for.
pub(crate) fn unhandled_arm(production: &str, arm: &str) -> Z39Error {
    Z39Error::Protocol(format!("{production}: unhandled alternative {arm:?}"))
}
