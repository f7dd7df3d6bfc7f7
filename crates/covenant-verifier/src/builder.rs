//! Test source generation for JSON response bodies.
//!
//! [`JsonBodyVerificationBuilder`] writes the assertion part of a generated
//! test: the parsed document, one `assertThatJson` line per recorded chain
//! and one line per body matcher.
//!
//! ```text
//! DocumentContext parsedJson = JsonPath.parse(response.getBody().asString());
//! assertThatJson(parsedJson).field("['name']").isEqualTo("a");
//!
//! // and:
//! assertThat(parsedJson.read("$.id", String.class)).matches("[0-9]+");
//! ```

use covenant_jsonassert::read_element;
use serde_json::Value;
use tracing::debug;

use crate::block::BlockBuilder;
use crate::config::{TestFramework, VerifierConfig};
use crate::converter::JsonToJsonPathsConverter;
use crate::error::{VerifierError, VerifierResult};
use crate::matchers::{remove_matching_json_paths, BodyMatcher, BodyMatchers, MatchingType};
use crate::recorder::escape_java;
use crate::regex_property::RegexProperty;

/// Writes JSON body assertions into a [`BlockBuilder`].
#[derive(Debug, Clone)]
pub struct JsonBodyVerificationBuilder {
    config: VerifierConfig,
}

impl JsonBodyVerificationBuilder {
    /// Create a builder.
    pub fn new(config: VerifierConfig) -> Self {
        Self { config }
    }

    /// The target language.
    pub fn framework(&self) -> TestFramework {
        self.config.test_framework
    }

    /// Writes the checks for `body` and returns the body without the
    /// entries covered by `matchers`.
    ///
    /// `response_string` is the expression yielding the actual response text
    /// in the generated test.
    pub fn add_json_response_body_check(
        &self,
        bb: &mut BlockBuilder,
        body: &Value,
        matchers: &BodyMatchers,
        response_string: &str,
    ) -> VerifierResult<Value> {
        bb.add_line(&format!(
            "DocumentContext parsedJson = JsonPath.parse({response_string})"
        ));
        self.add_colon_if_required(bb);
        let stripped = remove_matching_json_paths(body, matchers);
        let json_paths =
            JsonToJsonPathsConverter::new(self.config.converter()).transform_to_json_paths(&stripped)?;
        for verifiable in &json_paths {
            bb.add_line(&format!("assertThatJson(parsedJson){}", verifiable.method()));
            self.add_colon_if_required(bb);
        }
        if matchers.has_matchers() {
            bb.add_empty_line();
            self.add_body_matching_block(bb, matchers, body)?;
        }
        debug!(
            paths = json_paths.len(),
            matchers = matchers.matchers().len(),
            "generated json body checks"
        );
        Ok(stripped)
    }

    fn add_colon_if_required(&self, bb: &mut BlockBuilder) {
        if let Some(suffix) = self.framework().line_suffix() {
            bb.add_at_the_end(suffix);
        }
    }

    fn add_body_matching_block(
        &self,
        bb: &mut BlockBuilder,
        matchers: &BodyMatchers,
        body: &Value,
    ) -> VerifierResult<()> {
        bb.end_block();
        bb.add_line(self.framework().assertion_joiner());
        bb.start_block();
        for matcher in matchers {
            match matcher.matching_type {
                MatchingType::Null => self.null_check(bb, matcher),
                MatchingType::Command => self.command_execution(bb, matcher, body)?,
                MatchingType::Type => self.type_check(bb, matcher, body)?,
                _ => self.equality_check(bb, matcher, body)?,
            }
        }
        Ok(())
    }

    fn null_check(&self, bb: &mut BlockBuilder, matcher: &BodyMatcher) {
        let path = quoted_and_escaped(&matcher.path);
        bb.add_line(&format!("assertThat((Object) parsedJson.read({path})).isNull()"));
        self.add_colon_if_required(bb);
    }

    fn equality_check(
        &self,
        bb: &mut BlockBuilder,
        matcher: &BodyMatcher,
        body: &Value,
    ) -> VerifierResult<()> {
        let path = quoted_and_escaped(&matcher.path);
        let retrieved = matcher_value(body, matcher)?;
        let retrieved = match RegexProperty::from_marker(&retrieved) {
            Some(pattern) => Value::String(pattern.to_string()),
            None => retrieved,
        };
        let value_as_param = match &retrieved {
            Value::String(text) => quoted_and_escaped(text),
            other => object_to_string(other),
        };
        if array_related(&path) && matcher.matching_type.is_regex_related() {
            bb.add_line(&format!(
                "assertThat((java.lang.Iterable) parsedJson.read({path}, java.util.Collection.class)).as({path}).allElementsMatch({value_as_param})"
            ));
        } else {
            let comparison = if matcher.matching_type == MatchingType::Equality {
                "isEqualTo"
            } else {
                "matches"
            };
            let class = class_name(&retrieved);
            bb.add_line(&format!(
                "assertThat(parsedJson.read({path}, {class}.class)).{comparison}({value_as_param})"
            ));
        }
        self.add_colon_if_required(bb);
        Ok(())
    }

    fn command_execution(
        &self,
        bb: &mut BlockBuilder,
        matcher: &BodyMatcher,
        body: &Value,
    ) -> VerifierResult<()> {
        let path = quoted_and_escaped(&matcher.path);
        retrieve_object_by_path(body, &matcher.path)?;
        let command = matcher.value.as_deref().unwrap_or_default();
        bb.add_line(&command.replace("$it", &format!("parsedJson.read({path})")));
        self.add_colon_if_required(bb);
        Ok(())
    }

    fn type_check(
        &self,
        bb: &mut BlockBuilder,
        matcher: &BodyMatcher,
        body: &Value,
    ) -> VerifierResult<()> {
        let element = matcher_value(body, matcher)?;
        let path = quoted_and_escaped(&matcher.path);
        bb.add_line(&format!(
            "assertThat((Object) parsedJson.read({path})).isInstanceOf({}.class)",
            class_to_check(&element)
        ));
        self.add_colon_if_required(bb);
        if matcher.min_type_occurrence.is_some() || matcher.max_type_occurrence.is_some() {
            bb.add_line(&format!(
                "assertThat((java.lang.Iterable) parsedJson.read({path}, java.util.Collection.class)).{}",
                size_check_method(matcher, &path)
            ));
            self.add_colon_if_required(bb);
        }
        Ok(())
    }
}

fn matcher_value(body: &Value, matcher: &BodyMatcher) -> VerifierResult<Value> {
    match (&matcher.value, matcher.matching_type) {
        (Some(value), kind) if kind != MatchingType::Equality => Ok(Value::String(value.clone())),
        _ => retrieve_object_by_path(body, &matcher.path),
    }
}

fn retrieve_object_by_path(body: &Value, path: &str) -> VerifierResult<Value> {
    read_element(body, path).map_err(|_| VerifierError::missing_body_value(path, body))
}

fn size_check_method(matcher: &BodyMatcher, quoted_path: &str) -> String {
    let flattened = if array_related(&matcher.path) {
        "Flattened"
    } else {
        ""
    };
    let prefix = format!("as({quoted_path}).has{flattened}Size");
    match (matcher.min_type_occurrence, matcher.max_type_occurrence) {
        (Some(min), Some(max)) => format!("{prefix}Between({min}, {max})"),
        (Some(min), None) => format!("{prefix}GreaterThanOrEqualTo({min})"),
        (None, Some(max)) => format!("{prefix}LessThanOrEqualTo({max})"),
        (None, None) => prefix,
    }
}

fn array_related(path: &str) -> bool {
    path.contains("[*]") || path.contains("..")
}

fn quoted_and_escaped(text: &str) -> String {
    format!("\"{}\"", escape_java(text))
}

enum JavaNumber {
    Integer,
    Long,
    Double,
}

fn java_number(value: &serde_json::Number) -> JavaNumber {
    match value.as_i64() {
        Some(n) if i32::try_from(n).is_ok() => JavaNumber::Integer,
        Some(_) => JavaNumber::Long,
        None if value.is_u64() => JavaNumber::Long,
        None => JavaNumber::Double,
    }
}

fn object_to_string(value: &Value) -> String {
    match value {
        Value::Number(n) => match java_number(n) {
            JavaNumber::Integer => n.to_string(),
            JavaNumber::Long => format!("{n}L"),
            JavaNumber::Double => format!("{n}D"),
        },
        Value::Array(_) | Value::Object(_) => quoted_and_escaped(&value.to_string()),
        other => other.to_string(),
    }
}

fn class_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "String",
        Value::Bool(_) => "Boolean",
        Value::Number(n) => match java_number(n) {
            JavaNumber::Integer => "Integer",
            JavaNumber::Long => "Long",
            JavaNumber::Double => "Double",
        },
        Value::Array(_) => "java.util.ArrayList",
        Value::Object(_) => "java.util.LinkedHashMap",
        Value::Null => "Object",
    }
}

fn class_to_check(value: &Value) -> &'static str {
    match value {
        Value::Array(_) => "java.util.List",
        Value::Object(_) => "java.util.Map",
        Value::Null => "java.lang.Object",
        Value::String(_) => "java.lang.String",
        Value::Bool(_) => "java.lang.Boolean",
        Value::Number(n) => match java_number(n) {
            JavaNumber::Integer => "java.lang.Integer",
            JavaNumber::Long => "java.lang.Long",
            JavaNumber::Double => "java.lang.Double",
        },
    }
}
