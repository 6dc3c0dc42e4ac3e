//! Typed record and diagnostic productions
//!
//! The Records CHOICE shared by SearchResponse and PresentResponse,
//! and the diagnostic formats underneath it.

use crate::convert::{as_choice, as_external, as_sequence, as_string, selected, unhandled_arm};
use crate::schemas;
use z39_ber::external::External;
use z39_ber::value::{ChoiceValue, SequenceValue, Value};
use z39_core::{Oid, Z39Result};

/// The records member of a response.
#[derive(Debug, Clone, PartialEq)]
pub enum Records {
    /// The requested records, one per database hit.
    ResponseRecords(Vec<NamePlusRecord>),
    /// A single diagnostic replacing the whole record set.
    NonSurrogateDiagnostic(DefaultDiagFormat),
    /// Multiple diagnostics replacing the whole record set.
    MultipleNonSurDiagnostics(Vec<DiagRec>),
}

impl Records {
    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            Records::ResponseRecords(records) => {
                let mut items = Vec::with_capacity(records.len());
                for record in records {
                    items.push(record.to_value()?.into());
                }
                ChoiceValue::of(
                    &schemas::RECORDS,
                    "responseRecords",
                    Value::SequenceOf(items),
                )?
            }
            Records::NonSurrogateDiagnostic(diag) => ChoiceValue::of(
                &schemas::RECORDS,
                "nonSurrogateDiagnostic",
                diag.to_value()?.into(),
            )?,
            Records::MultipleNonSurDiagnostics(diags) => {
                let mut items = Vec::with_capacity(diags.len());
                for diag in diags {
                    items.push(diag.to_value()?);
                }
                ChoiceValue::of(
                    &schemas::RECORDS,
                    "multipleNonSurDiagnostics",
                    Value::SequenceOf(items),
                )?
            }
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("responseRecords", Value::SequenceOf(items)) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    records.push(NamePlusRecord::from_value(as_sequence(item)?)?);
                }
                Ok(Records::ResponseRecords(records))
            }
            ("nonSurrogateDiagnostic", value) => Ok(Records::NonSurrogateDiagnostic(
                DefaultDiagFormat::from_value(as_sequence(value)?)?,
            )),
            ("multipleNonSurDiagnostics", Value::SequenceOf(items)) => {
                let mut diags = Vec::with_capacity(items.len());
                for item in items {
                    diags.push(DiagRec::from_value(as_choice(item)?)?);
                }
                Ok(Records::MultipleNonSurDiagnostics(diags))
            }
            (arm, _) => Err(unhandled_arm("Records", arm)),
        }
    }
}

/// One returned record with the database it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct NamePlusRecord {
    /// Database name; may be omitted when the search named exactly one.
    pub name: Option<String>,
    pub record: Record,
}

impl NamePlusRecord {
    /// A retrieval record from `database`.
    pub fn retrieval(database: impl Into<String>, external: External) -> Self {
        Self {
            name: Some(database.into()),
            record: Record::RetrievalRecord(external),
        }
    }

    pub(crate) fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::NAME_PLUS_RECORD);
        if let Some(name) = &self.name {
            value.set("name", Value::general(name.clone()))?;
        }
        value.set("record", self.record.to_value()?)?;
        Ok(value)
    }

    pub(crate) fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            name: value.string("name")?.map(str::to_string),
            record: Record::from_value(value.require_choice("record")?)?,
        })
    }
}

/// The record member of NamePlusRecord: the payload or a surrogate
/// diagnostic standing in for it.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    RetrievalRecord(External),
    SurrogateDiagnostic(DiagRec),
}

impl Record {
    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            Record::RetrievalRecord(external) => ChoiceValue::of(
                &schemas::RECORD,
                "retrievalRecord",
                external.clone().into(),
            )?,
            Record::SurrogateDiagnostic(diag) => {
                ChoiceValue::of(&schemas::RECORD, "surrogateDiagnostic", diag.to_value()?)?
            }
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("retrievalRecord", value) => {
                Ok(Record::RetrievalRecord(as_external(value)?.clone()))
            }
            ("surrogateDiagnostic", value) => Ok(Record::SurrogateDiagnostic(
                DiagRec::from_value(as_choice(value)?)?,
            )),
            (arm, _) => Err(unhandled_arm("Record", arm)),
        }
    }
}

/// A diagnostic record: the default format or an externally defined
/// one.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagRec {
    DefaultFormat(DefaultDiagFormat),
    ExternallyDefined(External),
}

impl DiagRec {
    pub(crate) fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            DiagRec::DefaultFormat(diag) => {
                ChoiceValue::of(&schemas::DIAG_REC, "defaultFormat", diag.to_value()?.into())?
            }
            DiagRec::ExternallyDefined(external) => ChoiceValue::of(
                &schemas::DIAG_REC,
                "externallyDefined",
                external.clone().into(),
            )?,
        };
        Ok(choice.into())
    }

    pub(crate) fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        match selected(choice)? {
            ("defaultFormat", value) => Ok(DiagRec::DefaultFormat(
                DefaultDiagFormat::from_value(as_sequence(value)?)?,
            )),
            ("externallyDefined", value) => {
                Ok(DiagRec::ExternallyDefined(as_external(value)?.clone()))
            }
            (arm, _) => Err(unhandled_arm("DiagRec", arm)),
        }
    }
}

/// The default diagnostic format: a condition from a diagnostic set
/// plus free-text additional information.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultDiagFormat {
    pub diagnostic_set_id: Oid,
    pub condition: i64,
    pub addinfo: String,
}

impl DefaultDiagFormat {
    /// A Bib-1 diagnostic.
    pub fn bib1(condition: i64, addinfo: impl Into<String>) -> Self {
        Self {
            diagnostic_set_id: Oid::bib1_diagnostic_set(),
            condition,
            addinfo: addinfo.into(),
        }
    }

    pub(crate) fn to_value(&self) -> Z39Result<SequenceValue> {
        let addinfo = ChoiceValue::of(
            &schemas::ADD_INFO,
            "v3Addinfo",
            Value::general(self.addinfo.clone()),
        )?;
        SequenceValue::new(&schemas::DEFAULT_DIAG_FORMAT)
            .with("diagnosticSetId", self.diagnostic_set_id.clone().into())?
            .with("condition", self.condition.into())?
            .with("addinfo", addinfo.into())
    }

    pub(crate) fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        // Either addinfo arm carries a string; version does not matter
        // to the typed representation.
        let (_, addinfo) = selected(value.require_choice("addinfo")?)?;
        Ok(Self {
            diagnostic_set_id: value.require_oid("diagnosticSetId")?.clone(),
            condition: value.require_integer("condition")?,
            addinfo: as_string(addinfo)?.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diag_rec_round_trips_through_values() {
        let diag = DiagRec::DefaultFormat(DefaultDiagFormat::bib1(109, "database unavailable"));
        let value = diag.to_value().unwrap();
        let Value::Choice(choice) = &value else {
            panic!("expected a choice value");
        };
        assert_eq!(DiagRec::from_value(choice).unwrap(), diag);
    }

    #[test]
    fn test_records_round_trips_through_values() {
        let records = Records::ResponseRecords(vec![
            NamePlusRecord::retrieval(
                "books",
                External::octet_aligned(Oid::marc21_syntax(), b"01234nam".to_vec()),
            ),
            NamePlusRecord {
                name: None,
                record: Record::SurrogateDiagnostic(DiagRec::DefaultFormat(
                    DefaultDiagFormat::bib1(14, "record unavailable"),
                )),
            },
        ]);
        let value = records.to_value().unwrap();
        let Value::Choice(choice) = &value else {
            panic!("expected a choice value");
        };
        assert_eq!(Records::from_value(choice).unwrap(), records);
    }
}
