//! Covenant Verifier - JSON Response Body Verification
//!
//! This crate turns an expected JSON body into recorded assertion chains,
//! replays those chains against actual bodies, and writes them out as the
//! body-checking part of generated Java or Groovy tests.
//!
//! # Overview
//!
//! - [`DelegatingJsonVerifiable`] records every assertion call made through it
//! - [`JsonToJsonPathsConverter`] walks an expected body and records one chain per leaf
//! - [`BodyMatchers`] exclude entries from literal comparison and check them by rule
//! - [`RegexProperty`] stands for "any value matching this pattern" and generates samples
//! - [`JsonBodyVerificationBuilder`] renders chains and matchers as test source
//!
//! # Architecture
//!
//! ```text
//!   expected body ──► remove_matching_json_paths ──► JsonToJsonPathsConverter
//!                                                           │
//!                                                           ▼
//!                                                       JsonPaths
//!                                                     │           │
//!                                     verify(actual)  ▼           ▼  render
//!                                           JsonAsserter   JsonBodyVerificationBuilder
//! ```
//!
//! # Example
//!
//! ```
//! use covenant_verifier::ContractVerifier;
//! use serde_json::json;
//!
//! let verifier = ContractVerifier::with_defaults();
//! let expected = json!({"name": "covenant", "tags": ["a", "b"]});
//!
//! let paths = verifier.json_paths(&expected)?;
//! assert_eq!(paths.len(), 3);
//!
//! verifier.verify_body(&expected, &json!({"name": "covenant", "tags": ["b", "a"]}))?;
//! assert!(verifier
//!     .verify_body(&expected, &json!({"name": "other", "tags": ["a", "b"]}))
//!     .is_err());
//! # Ok::<(), covenant_verifier::VerifierError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod block;
pub mod builder;
pub mod config;
pub mod converter;
pub mod error;
pub mod matchers;
pub mod recorder;
pub mod regex_property;

// Re-exports for convenience
pub use block::BlockBuilder;
pub use builder::JsonBodyVerificationBuilder;
pub use config::{ConverterConfig, TestFramework, VerifierConfig};
pub use converter::{JsonPaths, JsonToJsonPathsConverter};
pub use error::{VerifierError, VerifierResult};
pub use matchers::{
    convert_json_path_and_regex_to_a_json_path, generated_values, remove_matching_json_paths,
    BodyMatcher, BodyMatchers, MatchingType,
};
pub use recorder::{
    escape_java, wrap_value_with_quotes, Call, ChainState, DelegatingJsonVerifiable, FieldNotation,
};
pub use regex_property::{RegexPatterns, RegexProperty, ValueKind, REGEX_MARKER, TYPE_MARKER};

use covenant_jsonassert::{read_element, AssertionError, JsonAssertion, JsonVerifiable};
use serde_json::Value;
use tracing::debug;

/// Entry point tying conversion, verification and generation together.
#[derive(Debug, Clone, Default)]
pub struct ContractVerifier {
    config: VerifierConfig,
}

impl ContractVerifier {
    /// Create a verifier with the given configuration.
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// Create a verifier with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(VerifierConfig::default())
    }

    /// Get the configuration.
    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Records the assertion chains for an expected body.
    pub fn json_paths(&self, expected: &Value) -> VerifierResult<JsonPaths> {
        JsonToJsonPathsConverter::new(self.config.converter()).transform_to_json_paths(expected)
    }

    /// Checks `actual` against every literal entry of `expected`.
    pub fn verify_body(&self, expected: &Value, actual: &Value) -> VerifierResult<()> {
        self.verify_body_with_matchers(expected, actual, &BodyMatchers::new())
    }

    /// Checks `actual` against `expected`, using `matchers` for the entries
    /// they cover instead of literal comparison.
    pub fn verify_body_with_matchers(
        &self,
        expected: &Value,
        actual: &Value,
        matchers: &BodyMatchers,
    ) -> VerifierResult<()> {
        let stripped = remove_matching_json_paths(expected, matchers);
        let paths = self.json_paths(&stripped)?;
        paths.verify(actual)?;
        let asserter = JsonAssertion::assert_that(actual.clone());
        for matcher in matchers {
            match matcher.matching_type {
                MatchingType::Command => continue,
                MatchingType::Null => {
                    if !read_element(actual, &matcher.path)?.is_null() {
                        return Err(AssertionError::NoMatch {
                            path: matcher.path.clone(),
                            json: actual.to_string(),
                        }
                        .into());
                    }
                    continue;
                }
                _ => {}
            }
            let path = convert_json_path_and_regex_to_a_json_path(matcher, Some(expected))?;
            asserter.matches_json_path(&path)?;
        }
        debug!(
            paths = paths.len(),
            matchers = matchers.matchers().len(),
            "verified body"
        );
        Ok(())
    }

    /// Writes the body-checking test source for `expected`.
    ///
    /// `response_string` is the expression yielding the actual response
    /// text in the generated test.
    pub fn generate_test_body(
        &self,
        expected: &Value,
        matchers: &BodyMatchers,
        response_string: &str,
    ) -> VerifierResult<String> {
        let mut bb = BlockBuilder::new("\t");
        if let Some(suffix) = self.config.test_framework.line_suffix() {
            bb = bb.with_line_ending(suffix);
        }
        bb.start_block();
        JsonBodyVerificationBuilder::new(self.config.clone())
            .add_json_response_body_check(&mut bb, expected, matchers, response_string)?;
        Ok(bb.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verifier_defaults() {
        let verifier = ContractVerifier::with_defaults();
        assert!(!verifier.config().assert_json_size);
        assert_eq!(verifier.config().test_framework, TestFramework::Java);
    }

    #[test]
    fn test_verify_with_regex_matcher() {
        let verifier = ContractVerifier::with_defaults();
        let expected = json!({"id": "1", "name": "a"});
        let matchers = BodyMatchers::new().by_regex("$.id", "[0-9]+");
        verifier
            .verify_body_with_matchers(&expected, &json!({"id": "42", "name": "a"}), &matchers)
            .unwrap();
        let err = verifier
            .verify_body_with_matchers(&expected, &json!({"id": "x", "name": "a"}), &matchers)
            .unwrap_err();
        assert!(err.is_assertion_failure());
    }

    #[test]
    fn test_verify_with_type_matcher() {
        let verifier = ContractVerifier::with_defaults();
        let expected = json!({"xs": [1, 2]});
        let matchers = BodyMatchers::new().by_type("$.xs", Some(1), Some(3));
        verifier
            .verify_body_with_matchers(&expected, &json!({"xs": [5]}), &matchers)
            .unwrap();
        assert!(verifier
            .verify_body_with_matchers(&expected, &json!({"xs": [1, 2, 3, 4]}), &matchers)
            .is_err());
    }

    #[test]
    fn test_verify_with_null_matcher() {
        let verifier = ContractVerifier::with_defaults();
        let matchers = BodyMatchers::new().by_null("$.n");
        let expected = json!({"n": null});
        verifier
            .verify_body_with_matchers(&expected, &expected, &matchers)
            .unwrap();
        assert!(verifier
            .verify_body_with_matchers(&expected, &json!({"n": 1}), &matchers)
            .is_err());
    }

    #[test]
    fn test_strict_verifier_checks_order() {
        let verifier = ContractVerifier::new(VerifierConfig::strict());
        let expected = json!({"xs": ["a", "b"]});
        verifier.verify_body(&expected, &expected).unwrap();
        assert!(verifier.verify_body(&expected, &json!({"xs": ["b", "a"]})).is_err());
    }

    #[test]
    fn test_generate_test_body() {
        let verifier = ContractVerifier::with_defaults();
        let text = verifier
            .generate_test_body(&json!({"a": true}), &BodyMatchers::new(), "body")
            .unwrap();
        assert_eq!(
            text,
            "\tDocumentContext parsedJson = JsonPath.parse(body);\n\
             \tassertThatJson(parsedJson).field(\"['a']\").isEqualTo(true);\n"
        );
    }
}
