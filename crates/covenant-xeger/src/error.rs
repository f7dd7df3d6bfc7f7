//! Regex compilation error types.

use thiserror::Error;

/// Result type for regex compilation.
pub type RegexResult<T> = Result<T, RegexError>;

/// Errors raised while compiling a regular expression into an automaton.
///
/// Positions are byte offsets into the expression as it was handed to the
/// parser, after shorthand classes were expanded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// The expression is malformed.
    #[error("syntax error at position {position}: {message}")]
    Syntax {
        /// Byte offset of the offending character.
        position: usize,
        /// Description of the problem.
        message: String,
    },

    /// The expression uses a construct the generator cannot honour.
    #[error("unsupported construct `{construct}` at position {position}")]
    Unsupported {
        /// Byte offset of the construct.
        position: usize,
        /// The construct as written.
        construct: String,
    },

    /// A repetition bound is larger than the generator allows.
    #[error("repetition bound {bound} at position {position} exceeds the limit of {limit}")]
    RepetitionTooLarge {
        /// Byte offset of the repetition.
        position: usize,
        /// The requested bound.
        bound: u32,
        /// The maximum accepted bound.
        limit: u32,
    },

    /// Expanding the expression produced too many automaton states.
    #[error("expression is too complex: more than {limit} automaton states")]
    TooComplex {
        /// The state limit that was exceeded.
        limit: usize,
    },
}

impl RegexError {
    /// Creates a syntax error.
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            message: message.into(),
        }
    }

    /// Creates an unsupported-construct error.
    pub fn unsupported(position: usize, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            position,
            construct: construct.into(),
        }
    }

    /// Returns the byte offset the error refers to, if any.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Syntax { position, .. }
            | Self::Unsupported { position, .. }
            | Self::RepetitionTooLarge { position, .. } => Some(*position),
            Self::TooComplex { .. } => None,
        }
    }
}
