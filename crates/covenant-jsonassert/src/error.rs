//! JSON path and assertion error types.

use thiserror::Error;

/// Result type for JSON path operations.
pub type PathResult<T> = Result<T, PathError>;

/// Result type for JSON assertions.
pub type AssertionResult<T> = Result<T, AssertionError>;

/// Errors raised while parsing or reading a JSON path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    /// The path text is malformed.
    #[error("invalid JSON path `{path}` at position {position}: {message}")]
    Syntax {
        /// The path text.
        path: String,
        /// Byte offset of the problem.
        position: usize,
        /// Description of the problem.
        message: String,
    },

    /// A `=~` filter holds a regex the engine rejects.
    #[error("invalid regex `{pattern}` in JSON path: {message}")]
    InvalidRegex {
        /// The regex as written in the path.
        pattern: String,
        /// Why it was rejected.
        message: String,
    },

    /// A definite path matched nothing.
    #[error("no value found at JSON path `{path}`")]
    NotFound {
        /// The path that was read.
        path: String,
    },
}

/// A failed JSON assertion.
#[derive(Error, Debug)]
pub enum AssertionError {
    /// The path matched nothing in the document.
    #[error("parsed JSON [{json}] doesn't match the JSON path [{path}]")]
    NoMatch {
        /// The JSON path that was checked.
        path: String,
        /// The document, serialised.
        json: String,
    },

    /// The matched collection has the wrong size.
    #[error("JSON path [{path}] has size {actual}, expected {expected}")]
    SizeMismatch {
        /// The JSON path that was checked.
        path: String,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// The matched value is not empty.
    #[error("JSON path [{path}] is not empty in [{json}]")]
    NotEmpty {
        /// The JSON path that was checked.
        path: String,
        /// The document, serialised.
        json: String,
    },

    /// A matched value is not an instance of the expected class.
    #[error("JSON path [{path}] is not an instance of {class} in [{json}]")]
    WrongType {
        /// The JSON path that was checked.
        path: String,
        /// The expected class name.
        class: String,
        /// The document, serialised.
        json: String,
    },

    /// The assertion built an unparsable path.
    #[error(transparent)]
    Path(#[from] PathError),

    /// The document text is not JSON.
    #[error("invalid JSON document: {source}")]
    InvalidJson {
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// The value at the path could not be deserialised into the requested type.
    #[error("cannot read JSON path [{path}]: {source}")]
    Deserialize {
        /// The JSON path that was read.
        path: String,
        /// Deserialisation error.
        #[source]
        source: serde_json::Error,
    },
}

impl AssertionError {
    /// The JSON path the failure refers to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::NoMatch { path, .. }
            | Self::SizeMismatch { path, .. }
            | Self::NotEmpty { path, .. }
            | Self::WrongType { path, .. }
            | Self::Deserialize { path, .. } => Some(path),
            Self::Path(PathError::Syntax { path, .. } | PathError::NotFound { path }) => {
                Some(path)
            }
            Self::Path(PathError::InvalidRegex { .. }) | Self::InvalidJson { .. } => None,
        }
    }
}
