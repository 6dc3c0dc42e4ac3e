//! Z39.50 protocol enumerations
//!
//! Small integer-valued or position-valued enumerations used inside the
//! APDUs. Each converts to and from its on-the-wire integer with
//! `value`/`from_value`; an out-of-range integer is a protocol error,
//! not a codec error.

use z39_core::{Z39Error, Z39Result};

/// Close reason, `[211] IMPLICIT INTEGER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloseReason {
    /// Normal completion of the association
    Finished = 0,
    /// The peer is shutting down
    Shutdown = 1,
    /// System problem
    SystemProblem = 2,
    /// Cost limit reached
    CostLimit = 3,
    /// Resources exhausted
    Resources = 4,
    /// Security violation
    SecurityViolation = 5,
    /// Protocol error
    ProtocolError = 6,
    /// Lack of activity
    LackOfActivity = 7,
    /// Abort initiated by the peer
    PeerAbort = 8,
    /// Unspecified reason
    Unspecified = 9,
}

impl CloseReason {
    /// Create from the wire integer.
    pub fn from_value(value: i64) -> Z39Result<Self> {
        match value {
            0 => Ok(CloseReason::Finished),
            1 => Ok(CloseReason::Shutdown),
            2 => Ok(CloseReason::SystemProblem),
            3 => Ok(CloseReason::CostLimit),
            4 => Ok(CloseReason::Resources),
            5 => Ok(CloseReason::SecurityViolation),
            6 => Ok(CloseReason::ProtocolError),
            7 => Ok(CloseReason::LackOfActivity),
            8 => Ok(CloseReason::PeerAbort),
            9 => Ok(CloseReason::Unspecified),
            _ => Err(Z39Error::Protocol(format!(
                "invalid CloseReason value: {value}"
            ))),
        }
    }

    /// Get the wire integer.
    pub fn value(self) -> i64 {
        self as i64
    }
}

/// Present status, `[27] IMPLICIT INTEGER`.
///
/// Reports how much of the requested record range a Present or Search
/// operation actually returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentStatus {
    /// All expected records were returned
    Success = 0,
    /// Not all records returned; request terminated by access control
    Partial1 = 1,
    /// Not all records returned; exceeded the message size limit
    Partial2 = 2,
    /// Not all records returned; resource control, origin request
    Partial3 = 3,
    /// Not all records returned; resource control, target decision
    Partial4 = 4,
    /// No records returned due to one or more non-surrogate diagnostics
    Failure = 5,
}

impl PresentStatus {
    /// Create from the wire integer.
    pub fn from_value(value: i64) -> Z39Result<Self> {
        match value {
            0 => Ok(PresentStatus::Success),
            1 => Ok(PresentStatus::Partial1),
            2 => Ok(PresentStatus::Partial2),
            3 => Ok(PresentStatus::Partial3),
            4 => Ok(PresentStatus::Partial4),
            5 => Ok(PresentStatus::Failure),
            _ => Err(Z39Error::Protocol(format!(
                "invalid PresentStatus value: {value}"
            ))),
        }
    }

    /// Get the wire integer.
    pub fn value(self) -> i64 {
        self as i64
    }
}

/// Result-set status, `[26] IMPLICIT INTEGER`; reported by a search
/// whose status is failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultSetStatus {
    /// The result set contains a subset of the hits
    Subset = 1,
    /// The result set is an interim result, possibly inaccurate
    Interim = 2,
    /// No result set is available
    Empty = 3,
}

impl ResultSetStatus {
    /// Create from the wire integer.
    pub fn from_value(value: i64) -> Z39Result<Self> {
        match value {
            1 => Ok(ResultSetStatus::Subset),
            2 => Ok(ResultSetStatus::Interim),
            3 => Ok(ResultSetStatus::Empty),
            _ => Err(Z39Error::Protocol(format!(
                "invalid ResultSetStatus value: {value}"
            ))),
        }
    }

    /// Get the wire integer.
    pub fn value(self) -> i64 {
        self as i64
    }
}

/// RPN operator.
///
/// On the wire this is a CHOICE of NULL alternatives under `[46]`; the
/// discriminant doubles as the alternative's context tag number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperatorKind {
    /// Boolean AND
    And = 0,
    /// Boolean OR
    Or = 1,
    /// Boolean AND-NOT
    AndNot = 2,
}

impl OperatorKind {
    /// Create from the alternative number.
    pub fn from_value(value: i64) -> Z39Result<Self> {
        match value {
            0 => Ok(OperatorKind::And),
            1 => Ok(OperatorKind::Or),
            2 => Ok(OperatorKind::AndNot),
            _ => Err(Z39Error::Protocol(format!(
                "invalid OperatorKind value: {value}"
            ))),
        }
    }

    /// Get the alternative number.
    pub fn value(self) -> i64 {
        self as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_reason_round_trip() {
        for reason in [
            CloseReason::Finished,
            CloseReason::Shutdown,
            CloseReason::SystemProblem,
            CloseReason::CostLimit,
            CloseReason::Resources,
            CloseReason::SecurityViolation,
            CloseReason::ProtocolError,
            CloseReason::LackOfActivity,
            CloseReason::PeerAbort,
            CloseReason::Unspecified,
        ] {
            assert_eq!(CloseReason::from_value(reason.value()).unwrap(), reason);
        }
    }

    #[test]
    fn test_close_reason_rejects_out_of_range() {
        assert!(CloseReason::from_value(10).is_err());
        assert!(CloseReason::from_value(-1).is_err());
    }

    #[test]
    fn test_present_status_round_trip() {
        assert_eq!(
            PresentStatus::from_value(0).unwrap(),
            PresentStatus::Success
        );
        assert_eq!(
            PresentStatus::from_value(5).unwrap(),
            PresentStatus::Failure
        );
        assert!(PresentStatus::from_value(6).is_err());
    }

    #[test]
    fn test_result_set_status_starts_at_one() {
        assert!(ResultSetStatus::from_value(0).is_err());
        assert_eq!(
            ResultSetStatus::from_value(1).unwrap(),
            ResultSetStatus::Subset
        );
    }

    #[test]
    fn test_operator_kind() {
        assert_eq!(OperatorKind::from_value(2).unwrap(), OperatorKind::AndNot);
        assert!(OperatorKind::from_value(3).is_err());
    }
}
