//! Regex-backed dynamic values.
//!
//! A [`RegexProperty`] stands for "any value matching this pattern". It
//! generates concrete, typed sample values through Xeger and is embedded in
//! expected bodies as a `{"$regex": "<pattern>"}` marker.

use std::fmt;

use covenant_xeger::Xeger;
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use tracing::trace;

use crate::error::{VerifierError, VerifierResult};
use crate::recorder::escape_java;

/// Key of the JSON object that marks a regex property inside a body.
pub const REGEX_MARKER: &str = "$regex";

/// Key holding the value kind of a non-text regex marker.
pub const TYPE_MARKER: &str = "$type";

const GENERATION_ATTEMPTS: usize = 100;

/// The type a generated value is converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Text, unchanged.
    #[default]
    String,
    /// 32-bit integer.
    Integer,
    /// 64-bit float.
    Double,
    /// 32-bit float.
    Float,
    /// 64-bit integer.
    Long,
    /// 16-bit integer.
    Short,
    /// `true` for "true" in any case, `false` otherwise.
    Boolean,
}

impl ValueKind {
    /// Whether values of this kind are numbers.
    pub fn is_number(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::Double | Self::Float | Self::Long | Self::Short
        )
    }

    /// Converts generated text, or `None` when it does not parse.
    fn convert(self, text: &str) -> Option<Value> {
        Some(match self {
            Self::String => Value::String(text.to_string()),
            Self::Integer => Value::from(text.parse::<i32>().ok()?),
            Self::Long => Value::from(text.parse::<i64>().ok()?),
            Self::Short => Value::from(text.parse::<i16>().ok()?),
            Self::Double => Value::Number(Number::from_f64(text.parse::<f64>().ok()?)?),
            Self::Float => {
                Value::Number(Number::from_f64(f64::from(text.parse::<f32>().ok()?))?)
            }
            Self::Boolean => Value::Bool(text.eq_ignore_ascii_case("true")),
        })
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "String",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::Float => "Float",
            Self::Long => "Long",
            Self::Short => "Short",
            Self::Boolean => "Boolean",
        };
        f.write_str(name)
    }
}

/// A value described by a regular expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegexProperty {
    pattern: String,
    #[serde(default)]
    kind: ValueKind,
}

impl RegexProperty {
    /// Create a string-valued property.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            kind: ValueKind::String,
        }
    }

    /// The regular expression.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// The generated value type.
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Same pattern, different value type.
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    /// Generate 32-bit integers.
    pub fn as_integer(self) -> Self {
        self.with_kind(ValueKind::Integer)
    }

    /// Generate 64-bit floats.
    pub fn as_double(self) -> Self {
        self.with_kind(ValueKind::Double)
    }

    /// Generate 32-bit floats.
    pub fn as_float(self) -> Self {
        self.with_kind(ValueKind::Float)
    }

    /// Generate 64-bit integers.
    pub fn as_long(self) -> Self {
        self.with_kind(ValueKind::Long)
    }

    /// Generate 16-bit integers.
    pub fn as_short(self) -> Self {
        self.with_kind(ValueKind::Short)
    }

    /// Generate text.
    pub fn as_string(self) -> Self {
        self.with_kind(ValueKind::String)
    }

    /// Generate booleans.
    pub fn as_boolean(self) -> Self {
        self.with_kind(ValueKind::Boolean)
    }

    /// Generates a typed sample value.
    ///
    /// Text cut short by the iteration limit, or that does not convert to
    /// the kind, is discarded and generated again. After 100 failed attempts
    /// the last text is reported in [`VerifierError::Generation`].
    pub fn generate(&self) -> VerifierResult<Value> {
        let mut xeger = Xeger::from_entropy(&self.pattern)?;
        self.generate_with(&mut xeger)
    }

    /// Generates a typed sample value from a fixed seed.
    pub fn generate_seeded(&self, seed: u64) -> VerifierResult<Value> {
        let mut xeger = Xeger::seeded(&self.pattern, seed)?;
        self.generate_with(&mut xeger)
    }

    fn generate_with<R: Rng>(&self, xeger: &mut Xeger<R>) -> VerifierResult<Value> {
        let mut text = String::new();
        for _ in 0..GENERATION_ATTEMPTS {
            text = xeger.generate();
            if xeger.automaton().accepts(&text) {
                if let Some(value) = self.kind.convert(&text) {
                    return Ok(value);
                }
            }
            trace!(pattern = %self.pattern, value = %text, kind = %self.kind, "retrying generation");
        }
        Err(VerifierError::Generation {
            pattern: self.pattern.clone(),
            kind: self.kind.to_string(),
            value: text,
        })
    }

    /// Generates a value; non-numeric values are returned as Java-escaped text.
    pub fn generate_and_escape_java_string_if_needed(&self) -> VerifierResult<Value> {
        let generated = self.generate()?;
        if self.kind.is_number() {
            return Ok(generated);
        }
        let text = match generated {
            Value::String(text) => text,
            other => other.to_string(),
        };
        Ok(Value::String(escape_java(&text)))
    }

    /// The body marker standing for this property.
    ///
    /// Text properties are `{"$regex": pattern}`; other kinds add a
    /// `"$type"` entry.
    pub fn to_marker(&self) -> Value {
        match self.kind {
            ValueKind::String => json!({ REGEX_MARKER: self.pattern }),
            kind => json!({ REGEX_MARKER: self.pattern, TYPE_MARKER: kind }),
        }
    }

    /// The pattern of a body marker, if `value` is one.
    pub fn from_marker(value: &Value) -> Option<&str> {
        let map = value.as_object()?;
        let pattern = map.get(REGEX_MARKER)?.as_str()?;
        match map.len() {
            1 => Some(pattern),
            2 if map.contains_key(TYPE_MARKER) => Some(pattern),
            _ => None,
        }
    }

    /// The property a body marker stands for, if `value` is one.
    pub fn parse_marker(value: &Value) -> Option<Self> {
        let pattern = Self::from_marker(value)?;
        let kind = match value.get(TYPE_MARKER) {
            Some(kind) => ValueKind::deserialize(kind).ok()?,
            None => ValueKind::String,
        };
        Some(Self::new(pattern).with_kind(kind))
    }
}

impl fmt::Display for RegexProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Predefined patterns for common value shapes.
#[derive(Debug, Clone, Copy)]
pub struct RegexPatterns;

impl RegexPatterns {
    /// `true` or `false`.
    pub const TRUE_OR_FALSE: &'static str = "(true|false)";
    /// ASCII letters and digits.
    pub const ALPHA_NUMERIC: &'static str = "[a-zA-Z0-9]+";
    /// Integer or decimal, optionally negative.
    pub const NUMBER: &'static str = "-?(\\d*\\.\\d+|\\d+)";
    /// Integer, optionally negative.
    pub const INTEGER: &'static str = "-?(\\d+)";
    /// Integer greater than zero.
    pub const POSITIVE_INT: &'static str = "([1-9]\\d*)";
    /// Decimal with a fractional part, optionally negative.
    pub const DOUBLE: &'static str = "-?(\\d*\\.\\d+)";
    /// Hexadecimal digits.
    pub const HEX: &'static str = "[a-fA-F0-9]+";
    /// Dotted IPv4 address.
    pub const IP_ADDRESS: &'static str = "([01]?\\d\\d?|2[0-4]\\d|25[0-5])\\.([01]?\\d\\d?|2[0-4]\\d|25[0-5])\\.([01]?\\d\\d?|2[0-4]\\d|25[0-5])\\.([01]?\\d\\d?|2[0-4]\\d|25[0-5])";
    /// Scheme, host and optional port.
    pub const HOSTNAME: &'static str = "((http[s]?|ftp):/)/?([^:/\\s]+)(:[0-9]{1,5})?";
    /// E-mail address.
    pub const EMAIL: &'static str = "[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\\.[a-zA-Z]{2,6}";
    /// Lowercase UUID.
    pub const UUID: &'static str =
        "[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}";
    /// `yyyy-MM-dd`.
    pub const ANY_DATE: &'static str = "(\\d\\d\\d\\d)-(0[1-9]|1[012])-(0[1-9]|[12][0-9]|3[01])";
    /// `yyyy-MM-ddTHH:mm:ss`.
    pub const ANY_DATE_TIME: &'static str = "([0-9]{4})-(1[0-2]|0[1-9])-(3[01]|0[1-9]|[12][0-9])T(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])";
    /// `HH:mm:ss`.
    pub const ANY_TIME: &'static str = "(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])";
    /// At least one character.
    pub const NON_EMPTY: &'static str = "[\\S\\s]+";
    /// At least one non-whitespace character.
    pub const NON_BLANK: &'static str = "^\\s*\\S[\\S\\s]*";
    /// ISO 8601 timestamp with a zone offset.
    pub const ISO8601_WITH_OFFSET: &'static str = "([0-9]{4})-(1[0-2]|0[1-9])-(3[01]|0[1-9]|[12][0-9])T(2[0-3]|[01][0-9]):([0-5][0-9]):([0-5][0-9])(\\.\\d{3})?(Z|[+-][01]\\d:[0-5]\\d)";

    /// ASCII letters and digits.
    pub fn alpha_numeric() -> RegexProperty {
        RegexProperty::new(Self::ALPHA_NUMERIC)
    }

    /// Any number, as a double.
    pub fn number() -> RegexProperty {
        RegexProperty::new(Self::NUMBER).as_double()
    }

    /// Positive integer.
    pub fn positive_int() -> RegexProperty {
        RegexProperty::new(Self::POSITIVE_INT).as_integer()
    }

    /// Boolean.
    pub fn any_boolean() -> RegexProperty {
        RegexProperty::new(Self::TRUE_OR_FALSE).as_boolean()
    }

    /// Integer.
    pub fn an_integer() -> RegexProperty {
        RegexProperty::new(Self::INTEGER).as_integer()
    }

    /// Double.
    pub fn a_double() -> RegexProperty {
        RegexProperty::new(Self::DOUBLE).as_double()
    }

    /// IPv4 address.
    pub fn ip_address() -> RegexProperty {
        RegexProperty::new(Self::IP_ADDRESS)
    }

    /// Host with scheme.
    pub fn hostname() -> RegexProperty {
        RegexProperty::new(Self::HOSTNAME)
    }

    /// E-mail address.
    pub fn email() -> RegexProperty {
        RegexProperty::new(Self::EMAIL)
    }

    /// UUID.
    pub fn uuid() -> RegexProperty {
        RegexProperty::new(Self::UUID)
    }

    /// ISO date.
    pub fn iso_date() -> RegexProperty {
        RegexProperty::new(Self::ANY_DATE)
    }

    /// ISO date and time.
    pub fn iso_date_time() -> RegexProperty {
        RegexProperty::new(Self::ANY_DATE_TIME)
    }

    /// ISO time.
    pub fn iso_time() -> RegexProperty {
        RegexProperty::new(Self::ANY_TIME)
    }

    /// ISO 8601 timestamp with offset.
    pub fn iso8601_with_offset() -> RegexProperty {
        RegexProperty::new(Self::ISO8601_WITH_OFFSET)
    }

    /// Non-empty text.
    pub fn non_empty() -> RegexProperty {
        RegexProperty::new(Self::NON_EMPTY)
    }

    /// Text with a non-whitespace character.
    pub fn non_blank() -> RegexProperty {
        RegexProperty::new(Self::NON_BLANK)
    }

    /// Hexadecimal digits.
    pub fn hex() -> RegexProperty {
        RegexProperty::new(Self::HEX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    fn full_match(pattern: &str) -> Regex {
        Regex::new(&format!("(?s)^(?:{pattern})$")).unwrap()
    }

    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    #[test]
    fn test_string_patterns_generate_matching_text() {
        let properties = [
            RegexPatterns::alpha_numeric(),
            RegexPatterns::ip_address(),
            RegexPatterns::email(),
            RegexPatterns::uuid(),
            RegexPatterns::iso_date(),
            RegexPatterns::iso_date_time(),
            RegexPatterns::iso_time(),
            RegexPatterns::iso8601_with_offset(),
            RegexPatterns::non_empty(),
            RegexPatterns::non_blank(),
            RegexPatterns::hex(),
        ];
        for property in properties {
            let matcher = full_match(property.pattern());
            for seed in 0..20 {
                let value = property.generate_seeded(seed).unwrap();
                assert!(value.is_string());
                assert!(
                    matcher.is_match(&text(&value)),
                    "{value} does not match {property}"
                );
            }
        }
    }

    #[test]
    fn test_numeric_patterns_generate_numbers() {
        for seed in 0..20 {
            let int = RegexPatterns::positive_int().generate_seeded(seed);
            if let Ok(int) = int {
                assert!(int.as_i64().unwrap() > 0);
            }
            let double = RegexPatterns::a_double().generate_seeded(seed).unwrap();
            assert!(double.is_f64());
            let number = RegexPatterns::number().generate_seeded(seed).unwrap();
            assert!(number.is_number());
        }
    }

    #[test]
    fn test_boolean_kind() {
        for seed in 0..10 {
            assert!(RegexPatterns::any_boolean().generate_seeded(seed).unwrap().is_boolean());
        }
        assert_eq!(ValueKind::Boolean.convert("TRUE"), Some(Value::Bool(true)));
        assert_eq!(ValueKind::Boolean.convert("nope"), Some(Value::Bool(false)));
    }

    #[test]
    fn test_conversion_failures_exhaust_retries() {
        let err = RegexProperty::new("[a-z]{3}").as_integer().generate().unwrap_err();
        match err {
            VerifierError::Generation { kind, value, .. } => {
                assert_eq!(kind, "Integer");
                assert_eq!(value.len(), 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_truncated_walks_are_not_returned() {
        let err = RegexProperty::new("[a-z]{300}").generate_seeded(1).unwrap_err();
        match err {
            VerifierError::Generation { kind, value, .. } => {
                assert_eq!(kind, "String");
                assert_eq!(value.chars().count(), 200);
            }
            other => panic!("unexpected error: {other}"),
        }
        let matcher = full_match(RegexPatterns::EMAIL);
        for seed in 0..200 {
            let value = RegexPatterns::email().generate_seeded(seed).unwrap();
            assert!(matcher.is_match(&text(&value)), "{value}");
        }
    }

    #[test]
    fn test_short_overflow_fails() {
        assert!(RegexProperty::new("9{6}").as_short().generate().is_err());
        assert_eq!(
            RegexProperty::new("12").as_short().generate().unwrap(),
            Value::from(12)
        );
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RegexProperty::new("[a-").generate().unwrap_err();
        assert!(matches!(err, VerifierError::Regex(_)));
    }

    #[test]
    fn test_escape_java_string_if_needed() {
        let quoted = RegexProperty::new("a\\\"b").generate_and_escape_java_string_if_needed();
        assert_eq!(quoted.unwrap(), Value::String("a\\\"b".to_string()));
        let number = RegexProperty::new("42").as_long().generate_and_escape_java_string_if_needed();
        assert_eq!(number.unwrap(), Value::from(42));
        let flag = RegexProperty::new("true").as_boolean().generate_and_escape_java_string_if_needed();
        assert_eq!(flag.unwrap(), Value::String("true".to_string()));
    }

    #[test]
    fn test_marker() {
        let property = RegexPatterns::uuid();
        let marker = property.to_marker();
        assert_eq!(RegexProperty::from_marker(&marker), Some(RegexPatterns::UUID));
        assert_eq!(RegexProperty::from_marker(&json!({"$regex": 1})), None);
        assert_eq!(RegexProperty::from_marker(&json!({"$regex": "a", "b": 1})), None);
        assert_eq!(RegexProperty::from_marker(&json!("a")), None);
    }

    #[test]
    fn test_typed_marker() {
        let marker = RegexPatterns::positive_int().to_marker();
        assert_eq!(marker, json!({"$regex": RegexPatterns::POSITIVE_INT, "$type": "integer"}));
        let parsed = RegexProperty::parse_marker(&marker).unwrap();
        assert_eq!(parsed.kind(), ValueKind::Integer);
        assert_eq!(parsed.pattern(), RegexPatterns::POSITIVE_INT);
        assert!(RegexProperty::parse_marker(&json!({"$regex": "a", "$type": "bogus"})).is_none());
        assert_eq!(
            RegexProperty::parse_marker(&RegexPatterns::hex().to_marker()).unwrap().kind(),
            ValueKind::String
        );
    }

    #[test]
    fn test_display_and_kind_names() {
        assert_eq!(RegexPatterns::hex().to_string(), RegexPatterns::HEX);
        assert_eq!(ValueKind::Double.to_string(), "Double");
        assert!(ValueKind::Short.is_number());
        assert!(!ValueKind::Boolean.is_number());
    }
}
