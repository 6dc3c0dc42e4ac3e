use thiserror::Error;

/// Main error type for z39_rs operations
///
/// Decode-side variants carry a `context` string of the form
/// `MessageType.field`, filled in by the codec driver as it walks a
/// schema. A failure anywhere aborts the whole message's decode; there
/// is no partial or recoverable decode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Z39Error {
    /// Wrong tag or tag class at a mandatory position.
    #[error("{context}: bad tag: expected {expected}, found {found}")]
    BadTag {
        context: String,
        expected: String,
        found: String,
    },

    /// Children exhausted before all mandatory fields were satisfied.
    #[error("{context}: incomplete message: mandatory field missing")]
    IncompleteMessage { context: String },

    /// Unconsumed children left over after all schema fields decoded.
    #[error("{context}: extra data: {count} unconsumed element(s) after last field")]
    ExtraData { context: String, count: usize },

    /// No CHOICE alternative matched the encountered tag.
    #[error("{context}: no choice alternative matched tag {found}")]
    ChoiceNotMatched { context: String, found: String },

    /// More than one CHOICE alternative was populated before encoding.
    #[error("{context}: more than one choice alternative set")]
    ChoiceMultiplySet { context: String },

    /// A CHOICE was encoded with no alternative populated.
    #[error("{context}: no choice alternative set")]
    ChoiceNotSet { context: String },

    /// Primitive content bytes that cannot be decoded as the expected type.
    #[error("{context}: malformed primitive: {detail}")]
    MalformedPrimitive { context: String, detail: String },

    /// The byte buffer ended inside a tag, length, or content field.
    #[error("truncated encoding: {0}")]
    Truncated(String),

    /// Structurally invalid BER at the lexical layer.
    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A protocol-level constraint violated outside the codec itself.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl Z39Error {
    /// Prefix the message-type-qualified context onto an error raised
    /// below the driver, so every decode failure names the field that
    /// caused it.
    pub fn qualify(self, context: &str) -> Self {
        let merge = |inner: String| {
            if inner.is_empty() {
                context.to_string()
            } else {
                format!("{context}: {inner}")
            }
        };
        match self {
            Z39Error::BadTag {
                context: c,
                expected,
                found,
            } => Z39Error::BadTag {
                context: merge(c),
                expected,
                found,
            },
            Z39Error::IncompleteMessage { context: c } => Z39Error::IncompleteMessage {
                context: merge(c),
            },
            Z39Error::ExtraData { context: c, count } => Z39Error::ExtraData {
                context: merge(c),
                count,
            },
            Z39Error::ChoiceNotMatched { context: c, found } => Z39Error::ChoiceNotMatched {
                context: merge(c),
                found,
            },
            Z39Error::ChoiceMultiplySet { context: c } => Z39Error::ChoiceMultiplySet {
                context: merge(c),
            },
            Z39Error::ChoiceNotSet { context: c } => Z39Error::ChoiceNotSet {
                context: merge(c),
            },
            Z39Error::MalformedPrimitive { context: c, detail } => Z39Error::MalformedPrimitive {
                context: merge(c),
                detail,
            },
            other => other,
        }
    }
}

/// Result type alias for z39_rs operations
pub type Z39Result<T> = Result<T, Z39Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_fills_empty_context() {
        let err = Z39Error::MalformedPrimitive {
            context: String::new(),
            detail: "empty integer".to_string(),
        };
        let err = err.qualify("SearchRequest.resultCount");
        assert_eq!(
            err.to_string(),
            "SearchRequest.resultCount: malformed primitive: empty integer"
        );
    }

    #[test]
    fn test_qualify_prefixes_existing_context() {
        let err = Z39Error::IncompleteMessage {
            context: "AttributeElement".to_string(),
        };
        let err = err.qualify("SearchRequest.query");
        assert_eq!(
            err.to_string(),
            "SearchRequest.query: AttributeElement: incomplete message: mandatory field missing"
        );
    }

    #[test]
    fn test_lexical_errors_pass_through_qualify() {
        let err = Z39Error::Truncated("length".to_string());
        assert_eq!(err.clone().qualify("Close"), err);
    }
}
