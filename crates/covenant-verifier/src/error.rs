//! Verifier error types.

use covenant_jsonassert::{AssertionError, PathError};
use covenant_xeger::RegexError;
use thiserror::Error;

/// Result type for verifier operations.
pub type VerifierResult<T> = Result<T, VerifierError>;

/// Errors that can occur while converting, generating or verifying bodies.
#[derive(Error, Debug)]
pub enum VerifierError {
    /// A recorded assertion failed against a body.
    #[error(transparent)]
    Assertion(#[from] AssertionError),

    /// A matcher path could not be parsed.
    #[error(transparent)]
    Path(#[from] PathError),

    /// A regex property holds an expression the generator rejects.
    #[error(transparent)]
    Regex(#[from] RegexError),

    /// No generated text both matched the pattern and converted to the
    /// requested type.
    #[error("cannot generate a {kind} matching `{pattern}`, last attempt `{value}`")]
    Generation {
        /// The source pattern.
        pattern: String,
        /// The requested value kind.
        kind: String,
        /// The last generated text.
        value: String,
    },

    /// An equality matcher points at a value missing from the body.
    #[error("value [{path}] not found in JSON [{json}]")]
    MissingBodyValue {
        /// The matcher path.
        path: String,
        /// The body, serialised.
        json: String,
    },

    /// An equality matcher was converted without a body to read from.
    #[error("body hasn't been passed for matcher [{path}]")]
    BodyRequired {
        /// The matcher path.
        path: String,
    },

    /// A body could not be parsed.
    #[error("invalid JSON body: {0}")]
    InvalidBody(#[from] serde_json::Error),
}

impl VerifierError {
    /// Create a missing body value error.
    pub fn missing_body_value(path: impl Into<String>, json: &serde_json::Value) -> Self {
        Self::MissingBodyValue {
            path: path.into(),
            json: json.to_string(),
        }
    }

    /// Returns true if this error is an assertion failure.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, Self::Assertion(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_body_value_display() {
        let err = VerifierError::missing_body_value("$.a", &json!({"b": 1}));
        assert_eq!(err.to_string(), "value [$.a] not found in JSON [{\"b\":1}]");
        assert!(!err.is_assertion_failure());
    }

    #[test]
    fn test_assertion_error_is_transparent() {
        let inner = AssertionError::NoMatch {
            path: "$.x".to_string(),
            json: "{}".to_string(),
        };
        let message = inner.to_string();
        let err: VerifierError = inner.into();
        assert!(err.is_assertion_failure());
        assert_eq!(err.to_string(), message);
    }

    #[test]
    fn test_generation_display() {
        let err = VerifierError::Generation {
            pattern: "[0-9]+".to_string(),
            kind: "Short".to_string(),
            value: "99999999".to_string(),
        };
        assert!(err.to_string().contains("99999999"));
        assert!(err.to_string().contains("Short"));
    }
}
