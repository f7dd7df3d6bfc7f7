//! Configuration for body conversion and test generation.
//!
//! This module provides the options that shape the generated assertion
//! chains and the target language of generated test bodies.

use serde::{Deserialize, Serialize};

use crate::recorder::FieldNotation;

/// Target language of generated test bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFramework {
    /// JUnit style: statements end with `;`, BDD labels are comments.
    #[default]
    Java,
    /// Spock style: no statement terminator, bare BDD labels.
    Groovy,
}

impl TestFramework {
    /// The statement terminator, if any.
    pub fn line_suffix(self) -> Option<&'static str> {
        match self {
            Self::Java => Some(";"),
            Self::Groovy => None,
        }
    }

    /// The label placed between the generated assertion blocks.
    pub fn assertion_joiner(self) -> &'static str {
        match self {
            Self::Java => "// and:",
            Self::Groovy => "and:",
        }
    }
}

/// Options for turning a body into assertion chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConverterConfig {
    /// Verify array sizes and element order.
    pub assert_json_size: bool,
    /// How field names are written.
    pub notation: FieldNotation,
    /// Emit `isEmpty()` for an empty root instead of nothing.
    pub include_empty_check: bool,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            assert_json_size: false,
            notation: FieldNotation::Bracketed,
            include_empty_check: false,
        }
    }
}

impl ConverterConfig {
    /// Turn on ordered verification with size checks.
    pub fn ordered(mut self) -> Self {
        self.assert_json_size = true;
        self
    }

    /// Emit an emptiness check for empty bodies.
    pub fn with_empty_check(mut self) -> Self {
        self.include_empty_check = true;
        self
    }

    /// Set the field-name notation.
    pub fn with_notation(mut self, notation: FieldNotation) -> Self {
        self.notation = notation;
        self
    }
}

/// Configuration for the verifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Verify array sizes and element order.
    pub assert_json_size: bool,
    /// Write field names as `['name']`.
    pub bracket_notation: bool,
    /// Emit an emptiness check for empty bodies.
    pub include_empty_check: bool,
    /// Target language of generated test bodies.
    pub test_framework: TestFramework,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            assert_json_size: false,
            bracket_notation: true,
            include_empty_check: false,
            test_framework: TestFramework::Java,
        }
    }
}

impl VerifierConfig {
    /// Create a strict configuration that checks sizes, order and emptiness.
    pub fn strict() -> Self {
        Self {
            assert_json_size: true,
            include_empty_check: true,
            ..Self::default()
        }
    }

    /// Set the test framework.
    pub fn with_framework(mut self, framework: TestFramework) -> Self {
        self.test_framework = framework;
        self
    }

    /// The converter options implied by this configuration.
    pub fn converter(&self) -> ConverterConfig {
        ConverterConfig {
            assert_json_size: self.assert_json_size,
            notation: if self.bracket_notation {
                FieldNotation::Bracketed
            } else {
                FieldNotation::Plain
            },
            include_empty_check: self.include_empty_check,
        }
    }
}
