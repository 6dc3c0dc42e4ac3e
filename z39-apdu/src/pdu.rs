//! Typed Z39.50 APDUs
//!
//! One struct per APDU, converting to and from the generic value layer
//! against the tables in [`crate::schemas`], plus the top-level [`Pdu`]
//! enum with whole-message `encode`/`decode`.

use crate::convert::{as_sequence, unhandled_arm};
use crate::query::Query;
use crate::records::Records;
use crate::schemas;
use crate::types::{CloseReason, PresentStatus, ResultSetStatus};
use z39_ber::external::External;
use z39_ber::value::{ChoiceValue, SequenceValue, Value};
use z39_core::{BitString, Oid, Z39Result};

/// Version 3, the protocolVersion bit string {0, 1, 2}.
pub fn protocol_version_3() -> BitString {
    BitString::with_bits_set(&[0, 1, 2])
}

/// A decoded Z39.50 APDU.
#[derive(Debug, Clone, PartialEq)]
pub enum Pdu {
    InitializeRequest(InitializeRequest),
    InitializeResponse(InitializeResponse),
    SearchRequest(SearchRequest),
    SearchResponse(SearchResponse),
    PresentRequest(PresentRequest),
    PresentResponse(PresentResponse),
    Close(Close),
}

impl Pdu {
    /// The APDU's name, as used in logs and error contexts.
    pub fn name(&self) -> &'static str {
        match self {
            Pdu::InitializeRequest(_) => "InitializeRequest",
            Pdu::InitializeResponse(_) => "InitializeResponse",
            Pdu::SearchRequest(_) => "SearchRequest",
            Pdu::SearchResponse(_) => "SearchResponse",
            Pdu::PresentRequest(_) => "PresentRequest",
            Pdu::PresentResponse(_) => "PresentResponse",
            Pdu::Close(_) => "Close",
        }
    }

    /// Decode one APDU from a buffer containing exactly its encoding.
    pub fn decode(data: &[u8]) -> Z39Result<Self> {
        let choice = z39_ber::decode_choice(&schemas::PDU, data).inspect_err(|e| {
            log::debug!("APDU decode failed after {} byte(s): {e}", data.len());
        })?;
        let (index, value) = choice.require_selected()?;
        let body = as_sequence(value)?;
        let pdu = match schemas::PDU.arms[index].name {
            "initializeRequest" => Pdu::InitializeRequest(InitializeRequest::from_value(body)?),
            "initializeResponse" => {
                Pdu::InitializeResponse(InitializeResponse::from_value(body)?)
            }
            "searchRequest" => Pdu::SearchRequest(SearchRequest::from_value(body)?),
            "searchResponse" => Pdu::SearchResponse(SearchResponse::from_value(body)?),
            "presentRequest" => Pdu::PresentRequest(PresentRequest::from_value(body)?),
            "presentResponse" => Pdu::PresentResponse(PresentResponse::from_value(body)?),
            "close" => Pdu::Close(Close::from_value(body)?),
            arm => return Err(unhandled_arm("PDU", arm)),
        };
        log::debug!("decoded {} ({} bytes)", pdu.name(), data.len());
        Ok(pdu)
    }

    /// Encode to definite-length BER.
    pub fn encode(&self) -> Z39Result<Vec<u8>> {
        let (arm, body) = match self {
            Pdu::InitializeRequest(m) => ("initializeRequest", m.to_value()?),
            Pdu::InitializeResponse(m) => ("initializeResponse", m.to_value()?),
            Pdu::SearchRequest(m) => ("searchRequest", m.to_value()?),
            Pdu::SearchResponse(m) => ("searchResponse", m.to_value()?),
            Pdu::PresentRequest(m) => ("presentRequest", m.to_value()?),
            Pdu::PresentResponse(m) => ("presentResponse", m.to_value()?),
            Pdu::Close(m) => ("close", m.to_value()?),
        };
        let choice = ChoiceValue::of(&schemas::PDU, arm, body.into())?;
        z39_ber::encode_choice(&choice)
    }
}

/// The idAuthentication member of InitializeRequest.
#[derive(Debug, Clone, PartialEq)]
pub enum IdAuthentication {
    /// Free-form authentication string.
    Open(String),
    /// Structured group/user/password.
    IdPass {
        group_id: Option<String>,
        user_id: Option<String>,
        password: Option<String>,
    },
    /// Explicitly anonymous.
    Anonymous,
    /// Externally defined authentication data.
    Other(External),
}

impl IdAuthentication {
    fn to_value(&self) -> Z39Result<Value> {
        let choice = match self {
            IdAuthentication::Open(s) => ChoiceValue::of(
                &schemas::ID_AUTHENTICATION,
                "open",
                Value::visible(s.clone()),
            )?,
            IdAuthentication::IdPass {
                group_id,
                user_id,
                password,
            } => {
                let mut id_pass = SequenceValue::new(&schemas::ID_PASS);
                if let Some(group_id) = group_id {
                    id_pass.set("groupId", Value::general(group_id.clone()))?;
                }
                if let Some(user_id) = user_id {
                    id_pass.set("userId", Value::general(user_id.clone()))?;
                }
                if let Some(password) = password {
                    id_pass.set("password", Value::general(password.clone()))?;
                }
                ChoiceValue::of(&schemas::ID_AUTHENTICATION, "idPass", id_pass.into())?
            }
            IdAuthentication::Anonymous => {
                ChoiceValue::of(&schemas::ID_AUTHENTICATION, "anonymous", Value::Null)?
            }
            IdAuthentication::Other(external) => ChoiceValue::of(
                &schemas::ID_AUTHENTICATION,
                "other",
                external.clone().into(),
            )?,
        };
        Ok(choice.into())
    }

    fn from_value(choice: &ChoiceValue) -> Z39Result<Self> {
        use crate::convert::{as_external, as_string, selected};
        match selected(choice)? {
            ("open", value) => Ok(IdAuthentication::Open(as_string(value)?.to_string())),
            ("idPass", value) => {
                let id_pass = as_sequence(value)?;
                Ok(IdAuthentication::IdPass {
                    group_id: id_pass.string("groupId")?.map(str::to_string),
                    user_id: id_pass.string("userId")?.map(str::to_string),
                    password: id_pass.string("password")?.map(str::to_string),
                })
            }
            ("anonymous", _) => Ok(IdAuthentication::Anonymous),
            ("other", value) => Ok(IdAuthentication::Other(as_external(value)?.clone())),
            (arm, _) => Err(unhandled_arm("IdAuthentication", arm)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeRequest {
    pub reference_id: Option<Vec<u8>>,
    pub protocol_version: BitString,
    pub options: BitString,
    pub preferred_message_size: i64,
    pub exceptional_record_size: i64,
    pub id_authentication: Option<IdAuthentication>,
    pub implementation_id: Option<String>,
    pub implementation_name: Option<String>,
    pub implementation_version: Option<String>,
}

impl InitializeRequest {
    /// A version-3 request with the search and present options set and
    /// common default sizes.
    pub fn new() -> Self {
        Self {
            reference_id: None,
            protocol_version: protocol_version_3(),
            options: BitString::with_bits_set(&[0, 1]),
            preferred_message_size: 1024 * 1024,
            exceptional_record_size: 4 * 1024 * 1024,
            id_authentication: None,
            implementation_id: None,
            implementation_name: None,
            implementation_version: None,
        }
    }

    fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::INITIALIZE_REQUEST);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set("protocolVersion", self.protocol_version.clone().into())?;
        value.set("options", self.options.clone().into())?;
        value.set("preferredMessageSize", self.preferred_message_size.into())?;
        value.set(
            "exceptionalRecordSize",
            self.exceptional_record_size.into(),
        )?;
        if let Some(auth) = &self.id_authentication {
            value.set("idAuthentication", auth.to_value()?)?;
        }
        if let Some(id) = &self.implementation_id {
            value.set("implementationId", Value::general(id.clone()))?;
        }
        if let Some(name) = &self.implementation_name {
            value.set("implementationName", Value::general(name.clone()))?;
        }
        if let Some(version) = &self.implementation_version {
            value.set("implementationVersion", Value::general(version.clone()))?;
        }
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            protocol_version: value.require_bit_string("protocolVersion")?.clone(),
            options: value.require_bit_string("options")?.clone(),
            preferred_message_size: value.require_integer("preferredMessageSize")?,
            exceptional_record_size: value.require_integer("exceptionalRecordSize")?,
            id_authentication: value
                .choice("idAuthentication")?
                .map(IdAuthentication::from_value)
                .transpose()?,
            implementation_id: value.string("implementationId")?.map(str::to_string),
            implementation_name: value.string("implementationName")?.map(str::to_string),
            implementation_version: value.string("implementationVersion")?.map(str::to_string),
        })
    }
}

impl Default for InitializeRequest {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InitializeResponse {
    pub reference_id: Option<Vec<u8>>,
    pub protocol_version: BitString,
    pub options: BitString,
    pub preferred_message_size: i64,
    pub exceptional_record_size: i64,
    /// Whether the association was accepted.
    pub result: bool,
    pub implementation_id: Option<String>,
    pub implementation_name: Option<String>,
    pub implementation_version: Option<String>,
}

impl InitializeResponse {
    fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::INITIALIZE_RESPONSE);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set("protocolVersion", self.protocol_version.clone().into())?;
        value.set("options", self.options.clone().into())?;
        value.set("preferredMessageSize", self.preferred_message_size.into())?;
        value.set(
            "exceptionalRecordSize",
            self.exceptional_record_size.into(),
        )?;
        value.set("result", self.result.into())?;
        if let Some(id) = &self.implementation_id {
            value.set("implementationId", Value::general(id.clone()))?;
        }
        if let Some(name) = &self.implementation_name {
            value.set("implementationName", Value::general(name.clone()))?;
        }
        if let Some(version) = &self.implementation_version {
            value.set("implementationVersion", Value::general(version.clone()))?;
        }
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            protocol_version: value.require_bit_string("protocolVersion")?.clone(),
            options: value.require_bit_string("options")?.clone(),
            preferred_message_size: value.require_integer("preferredMessageSize")?,
            exceptional_record_size: value.require_integer("exceptionalRecordSize")?,
            result: value.require_boolean("result")?,
            implementation_id: value.string("implementationId")?.map(str::to_string),
            implementation_name: value.string("implementationName")?.map(str::to_string),
            implementation_version: value.string("implementationVersion")?.map(str::to_string),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub reference_id: Option<Vec<u8>>,
    pub small_set_upper_bound: i64,
    pub large_set_lower_bound: i64,
    pub medium_set_present_number: i64,
    pub replace_indicator: bool,
    pub result_set_name: String,
    pub database_names: Vec<String>,
    pub query: Query,
}

impl SearchRequest {
    /// A request with the common piggyback-less defaults: no records
    /// in the search response, result set "default".
    pub fn new(database: impl Into<String>, query: Query) -> Self {
        Self {
            reference_id: None,
            small_set_upper_bound: 0,
            large_set_lower_bound: 1,
            medium_set_present_number: 0,
            replace_indicator: true,
            result_set_name: "default".to_string(),
            database_names: vec![database.into()],
            query,
        }
    }

    fn to_value(&self) -> Z39Result<SequenceValue> {
        let names = self
            .database_names
            .iter()
            .map(|name| Value::general(name.clone()))
            .collect();
        let mut value = SequenceValue::new(&schemas::SEARCH_REQUEST);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set("smallSetUpperBound", self.small_set_upper_bound.into())?;
        value.set("largeSetLowerBound", self.large_set_lower_bound.into())?;
        value.set(
            "mediumSetPresentNumber",
            self.medium_set_present_number.into(),
        )?;
        value.set("replaceIndicator", self.replace_indicator.into())?;
        value.set("resultSetName", Value::general(self.result_set_name.clone()))?;
        value.set("databaseNames", Value::SequenceOf(names))?;
        value.set("query", self.query.to_value()?)?;
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        let mut database_names = Vec::new();
        for item in value.require_sequence_of("databaseNames")? {
            database_names.push(crate::convert::as_string(item)?.to_string());
        }
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            small_set_upper_bound: value.require_integer("smallSetUpperBound")?,
            large_set_lower_bound: value.require_integer("largeSetLowerBound")?,
            medium_set_present_number: value.require_integer("mediumSetPresentNumber")?,
            replace_indicator: value.require_boolean("replaceIndicator")?,
            result_set_name: value.require_string("resultSetName")?.to_string(),
            database_names,
            query: Query::from_value(value.require_choice("query")?)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub reference_id: Option<Vec<u8>>,
    pub result_count: i64,
    pub number_of_records_returned: i64,
    pub next_result_set_position: i64,
    pub search_status: bool,
    pub result_set_status: Option<ResultSetStatus>,
    pub present_status: Option<PresentStatus>,
    pub records: Option<Records>,
}

impl SearchResponse {
    fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::SEARCH_RESPONSE);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set("resultCount", self.result_count.into())?;
        value.set(
            "numberOfRecordsReturned",
            self.number_of_records_returned.into(),
        )?;
        value.set(
            "nextResultSetPosition",
            self.next_result_set_position.into(),
        )?;
        value.set("searchStatus", self.search_status.into())?;
        if let Some(status) = self.result_set_status {
            value.set("resultSetStatus", status.value().into())?;
        }
        if let Some(status) = self.present_status {
            value.set("presentStatus", status.value().into())?;
        }
        if let Some(records) = &self.records {
            value.set("records", records.to_value()?)?;
        }
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            result_count: value.require_integer("resultCount")?,
            number_of_records_returned: value.require_integer("numberOfRecordsReturned")?,
            next_result_set_position: value.require_integer("nextResultSetPosition")?,
            search_status: value.require_boolean("searchStatus")?,
            result_set_status: value
                .integer("resultSetStatus")?
                .map(ResultSetStatus::from_value)
                .transpose()?,
            present_status: value
                .integer("presentStatus")?
                .map(PresentStatus::from_value)
                .transpose()?,
            records: value
                .choice("records")?
                .map(Records::from_value)
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentRequest {
    pub reference_id: Option<Vec<u8>>,
    pub result_set_id: String,
    pub result_set_start_point: i64,
    pub number_of_records_requested: i64,
    pub preferred_record_syntax: Option<Oid>,
}

impl PresentRequest {
    /// Request `count` records of `result_set` starting at `start`
    /// (1-based).
    pub fn new(result_set: impl Into<String>, start: i64, count: i64) -> Self {
        Self {
            reference_id: None,
            result_set_id: result_set.into(),
            result_set_start_point: start,
            number_of_records_requested: count,
            preferred_record_syntax: None,
        }
    }

    fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::PRESENT_REQUEST);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set("resultSetId", Value::general(self.result_set_id.clone()))?;
        value.set("resultSetStartPoint", self.result_set_start_point.into())?;
        value.set(
            "numberOfRecordsRequested",
            self.number_of_records_requested.into(),
        )?;
        if let Some(syntax) = &self.preferred_record_syntax {
            value.set("preferredRecordSyntax", syntax.clone().into())?;
        }
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            result_set_id: value.require_string("resultSetId")?.to_string(),
            result_set_start_point: value.require_integer("resultSetStartPoint")?,
            number_of_records_requested: value.require_integer("numberOfRecordsRequested")?,
            preferred_record_syntax: value.oid("preferredRecordSyntax")?.cloned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresentResponse {
    pub reference_id: Option<Vec<u8>>,
    pub number_of_records_returned: i64,
    pub next_result_set_position: i64,
    pub present_status: PresentStatus,
    pub records: Option<Records>,
}

impl PresentResponse {
    fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::PRESENT_RESPONSE);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set(
            "numberOfRecordsReturned",
            self.number_of_records_returned.into(),
        )?;
        value.set(
            "nextResultSetPosition",
            self.next_result_set_position.into(),
        )?;
        value.set("presentStatus", self.present_status.value().into())?;
        if let Some(records) = &self.records {
            value.set("records", records.to_value()?)?;
        }
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            number_of_records_returned: value.require_integer("numberOfRecordsReturned")?,
            next_result_set_position: value.require_integer("nextResultSetPosition")?,
            present_status: PresentStatus::from_value(value.require_integer("presentStatus")?)?,
            records: value
                .choice("records")?
                .map(Records::from_value)
                .transpose()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Close {
    pub reference_id: Option<Vec<u8>>,
    pub close_reason: CloseReason,
    pub diagnostic_information: Option<String>,
}

impl Close {
    pub fn new(reason: CloseReason) -> Self {
        Self {
            reference_id: None,
            close_reason: reason,
            diagnostic_information: None,
        }
    }

    fn to_value(&self) -> Z39Result<SequenceValue> {
        let mut value = SequenceValue::new(&schemas::CLOSE);
        if let Some(id) = &self.reference_id {
            value.set("referenceId", id.clone().into())?;
        }
        value.set("closeReason", self.close_reason.value().into())?;
        if let Some(info) = &self.diagnostic_information {
            value.set("diagnosticInformation", Value::general(info.clone()))?;
        }
        Ok(value)
    }

    fn from_value(value: &SequenceValue) -> Z39Result<Self> {
        Ok(Self {
            reference_id: value.octet_string("referenceId")?.map(<[u8]>::to_vec),
            close_reason: CloseReason::from_value(value.require_integer("closeReason")?)?,
            diagnostic_information: value
                .string("diagnosticInformation")?
                .map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_encodes_with_extended_tag() {
        let close = Pdu::Close(Close::new(CloseReason::Finished));
        let encoded = close.encode().unwrap();
        // [48] constructed wrapper, then [211] in extended tag form.
        assert_eq!(encoded[0], 0xBF);
        assert_eq!(encoded[1], 0x30);
        assert!(encoded.windows(3).any(|w| w == [0x9F, 0x81, 0x53]));
        assert_eq!(Pdu::decode(&encoded).unwrap(), close);
    }

    #[test]
    fn test_initialize_request_round_trip() {
        let mut request = InitializeRequest::new();
        request.reference_id = Some(vec![0x00, 0x01]);
        request.id_authentication = Some(IdAuthentication::IdPass {
            group_id: None,
            user_id: Some("reader".to_string()),
            password: Some("s3cret".to_string()),
        });
        request.implementation_name = Some("z39_rs".to_string());
        let pdu = Pdu::InitializeRequest(request);
        assert_eq!(Pdu::decode(&pdu.encode().unwrap()).unwrap(), pdu);
    }

    #[test]
    fn test_anonymous_authentication_round_trip() {
        let mut request = InitializeRequest::new();
        request.id_authentication = Some(IdAuthentication::Anonymous);
        let pdu = Pdu::InitializeRequest(request);
        assert_eq!(Pdu::decode(&pdu.encode().unwrap()).unwrap(), pdu);
    }

    #[test]
    fn test_present_request_round_trip() {
        let mut request = PresentRequest::new("default", 1, 10);
        request.preferred_record_syntax = Some(Oid::marc21_syntax());
        let pdu = Pdu::PresentRequest(request);
        assert_eq!(Pdu::decode(&pdu.encode().unwrap()).unwrap(), pdu);
    }

    #[test]
    fn test_unknown_apdu_tag_is_choice_not_matched() {
        // A [99] constructed element is no known APDU.
        let data = [0xBF, 0x63, 0x00];
        assert!(matches!(
            Pdu::decode(&data),
            Err(z39_core::Z39Error::ChoiceNotMatched { .. })
        ));
    }
}
