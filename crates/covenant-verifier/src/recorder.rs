//! Assertion-chain recording.
//!
//! [`DelegatingJsonVerifiable`] decorates a [`JsonVerifiable`]: every call is
//! forwarded to the delegate and also written down, both as the text of the
//! equivalent fluent call (for generated test sources) and as a [`Call`]
//! (for replaying the chain against another document).
//!
//! ```
//! use covenant_jsonassert::JsonAssertion;
//! use covenant_verifier::DelegatingJsonVerifiable;
//! use serde_json::json;
//!
//! let root = DelegatingJsonVerifiable::new(JsonAssertion::assert_that(json!({"a": "b"})));
//! let chain = root.field("a").is_equal_to("b")?;
//! assert_eq!(chain.method(), r#".field("a").isEqualTo("b")"#);
//! # Ok::<(), covenant_jsonassert::AssertionError>(())
//! ```

use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};

use covenant_jsonassert::{AssertionResult, JsonAsserter, JsonVerifiable};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Number, Value};

static FIELD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\.field\((")?(.)+(")?\)$"#).expect("valid field pattern"));
static ARRAY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\.array\((")?(.)+(")?\)$"#).expect("valid array pattern"));

/// How field names are handed to the delegate and recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldNotation {
    /// Names are used as given.
    #[default]
    Plain,
    /// Names are wrapped as `['name']`, so keys with dots or spaces survive.
    Bracketed,
}

impl FieldNotation {
    /// Applies the notation to `name`.
    pub fn wrap(self, name: &str) -> String {
        match self {
            Self::Plain => name.to_string(),
            Self::Bracketed if name.parse::<i64>().is_ok() => name.to_string(),
            Self::Bracketed => format!("['{}']", name.replace('\'', "\\'")),
        }
    }
}

/// Whether the chain can still be extended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainState {
    /// Navigation may continue.
    Extendable,
    /// A check was applied.
    Terminal {
        /// The delegate's path before the check.
        key_before_checking: String,
    },
}

/// One operation performed on the delegate.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    /// `contains(value)`.
    Contains(Value),
    /// `field(name)`.
    Field(String),
    /// `array(name)`.
    Array(String),
    /// `anonymous_array()`.
    AnonymousArray,
    /// `array_field()`.
    ArrayField,
    /// `element_with_index(index)`.
    ElementWithIndex(usize),
    /// `is_equal_to(value)`.
    IsEqualTo(Value),
    /// `is_null()`.
    IsNull,
    /// `is_empty()`.
    IsEmpty,
    /// `matches(pattern)`.
    Matches(String),
    /// `is_instance_of(class)`.
    IsInstanceOf(String),
    /// `has_size(size)`.
    HasSize(usize),
    /// `value()`.
    Value,
}

impl Call {
    /// Performs the call on `target`.
    ///
    /// # Errors
    ///
    /// Propagates the failure of a check.
    pub fn apply<V: JsonVerifiable>(&self, target: &V) -> AssertionResult<V> {
        Ok(match self {
            Self::Contains(value) => target.contains(value.clone()),
            Self::Field(name) => target.field(name),
            Self::Array(name) => target.array(name),
            Self::AnonymousArray => target.anonymous_array(),
            Self::ArrayField => target.array_field(),
            Self::ElementWithIndex(index) => target.element_with_index(*index),
            Self::IsEqualTo(value) => target.is_equal_to(value.clone())?,
            Self::IsNull => target.is_null()?,
            Self::IsEmpty => target.is_empty()?,
            Self::Matches(pattern) => target.matches(pattern)?,
            Self::IsInstanceOf(class) => target.is_instance_of(class)?,
            Self::HasSize(size) => target.has_size(*size)?,
            Self::Value => target.value()?,
        })
    }
}

/// A [`JsonVerifiable`] decorator that records the calls made through it.
///
/// Every step returns a new recorder holding its own copy of the buffer;
/// the receiver is never changed.
#[derive(Debug, Clone)]
pub struct DelegatingJsonVerifiable<V = JsonAsserter> {
    delegate: V,
    methods_buffer: Vec<String>,
    calls: Vec<Call>,
    state: ChainState,
    notation: FieldNotation,
}

impl<V: JsonVerifiable> DelegatingJsonVerifiable<V> {
    /// Wraps `delegate` with an empty buffer and plain field names.
    pub fn new(delegate: V) -> Self {
        Self {
            delegate,
            methods_buffer: Vec::new(),
            calls: Vec::new(),
            state: ChainState::Extendable,
            notation: FieldNotation::Plain,
        }
    }

    /// Sets the field-name notation.
    pub fn with_notation(mut self, notation: FieldNotation) -> Self {
        self.notation = notation;
        self
    }

    fn extend(&self, delegate: V, calls: impl IntoIterator<Item = Call>) -> Self {
        let mut next = Self {
            delegate,
            methods_buffer: self.methods_buffer.clone(),
            calls: self.calls.clone(),
            state: self.state.clone(),
            notation: self.notation,
        };
        next.calls.extend(calls);
        next
    }

    fn finish(&self, delegate: V, calls: impl IntoIterator<Item = Call>) -> Self {
        let mut next = self.extend(delegate, calls);
        next.state = ChainState::Terminal {
            key_before_checking: self.delegate.json_path(),
        };
        next
    }

    fn record(mut self, method: impl Into<String>) -> Self {
        self.methods_buffer.push(method.into());
        self
    }

    fn record_with_value(self, name: &str, value: &str) -> Self {
        self.record(format!(".{name}({value})"))
    }

    fn record_with_quoted_value(self, name: &str, value: &str) -> Self {
        let quoted = quote(value);
        self.record_with_value(name, &quoted)
    }

    fn last_record(&self) -> Option<&str> {
        self.methods_buffer.last().map(String::as_str)
    }

    /// Terminal check that `value` is among the selected values.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn contains(&self, value: impl Into<Value>) -> AssertionResult<Self> {
        let value = value.into();
        let delegate = self.delegate.contains(value.clone());
        let wrapped = wrap_value_with_quotes(Some(&value)).unwrap_or_default();
        if self.is_asserting_a_value_in_array() {
            let delegate = delegate.value()?;
            return Ok(self
                .finish(delegate, [Call::Contains(value), Call::Value])
                .record_with_value("contains", &wrapped)
                .record(".value()"));
        }
        Ok(self
            .finish(delegate, [Call::Contains(value)])
            .record_with_value("contains", &wrapped))
    }

    /// Descends into `name`, recorded as `.contains(..)` while iterating.
    pub fn field(&self, name: &str) -> Self {
        let wrapped = self.notation.wrap(name);
        let next = self.extend(
            self.delegate.field(&wrapped),
            [Call::Field(wrapped.clone())],
        );
        if self.delegate.is_iterating_over_array() {
            next.record_with_quoted_value("contains", &wrapped)
        } else {
            next.record_with_quoted_value("field", &wrapped)
        }
    }

    /// Descends into `name`, always recorded as `.field(..)`.
    pub fn traverse_field(&self, name: &str) -> Self {
        let wrapped = self.notation.wrap(name);
        self.extend(
            self.delegate.field(&wrapped),
            [Call::Field(wrapped.clone())],
        )
        .record_with_quoted_value("field", &wrapped)
    }

    /// Descends through several names in turn.
    pub fn field_path(&self, names: &[&str]) -> Self {
        names
            .iter()
            .fold(self.clone(), |verifiable, name| verifiable.field(name))
    }

    /// Iterates over the array member `name`.
    pub fn array(&self, name: &str) -> Self {
        let wrapped = self.notation.wrap(name);
        self.extend(
            self.delegate.array(&wrapped),
            [Call::Array(wrapped.clone())],
        )
        .record_with_quoted_value("array", &wrapped)
    }

    /// Iterates over the primitive values of the array member `name`.
    pub fn array_field_named(&self, name: &str) -> Self {
        let wrapped = self.notation.wrap(name);
        self.extend(
            self.delegate.field(&wrapped).array_field(),
            [Call::Field(wrapped.clone()), Call::ArrayField],
        )
        .record_with_quoted_value("array", &wrapped)
    }

    /// Treats the current array as holding primitive values.
    pub fn array_field(&self) -> Self {
        self.extend(self.delegate.array_field(), [Call::ArrayField])
            .record(".arrayField()")
    }

    /// Iterates over the current, nameless array.
    pub fn anonymous_array(&self) -> Self {
        self.extend(self.delegate.anonymous_array(), [Call::AnonymousArray])
            .record(".array()")
    }

    /// Selects the element at `index`.
    pub fn element_with_index(&self, index: usize) -> Self {
        self.extend(
            self.delegate.element_with_index(index),
            [Call::ElementWithIndex(index)],
        )
        .record(format!(".elementWithIndex({index})"))
    }

    /// Keeps iterating over the array already selected.
    pub fn iteration_passing_array(&self) -> Self {
        self.clone()
    }

    /// Terminal equality check, dispatched on the JSON type of `value`.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn is_equal_to(&self, value: impl Into<Value>) -> AssertionResult<Self> {
        match value.into() {
            Value::Null => self.is_null(),
            Value::Bool(flag) => self.is_equal_to_bool(flag),
            Value::Number(number) => self.is_equal_to_number(&number),
            Value::String(text) => self.is_equal_to_string(&text),
            other => self.is_equal_to_string(&other.to_string()),
        }
    }

    fn is_equal_to_string(&self, value: &str) -> AssertionResult<Self> {
        let delegate = self.delegate.is_equal_to(value)?;
        let in_array = self.delegate.is_asserting_a_value_in_array();
        let last = self.last_record();
        let checked = self.finish(delegate, [Call::IsEqualTo(Value::from(value))]);
        Ok(if in_array && last == Some(".arrayField()") {
            checked
                .record_with_value("isEqualTo", &java_string(value))
                .record(".value()")
        } else if in_array && last.is_some_and(|record| !record.contains("array")) {
            checked.record(".value()")
        } else {
            checked.record_with_value("isEqualTo", &java_string(value))
        })
    }

    fn is_equal_to_number(&self, value: &Number) -> AssertionResult<Self> {
        let delegate = self.delegate.is_equal_to(value.clone())?;
        let contains_a_matcher = self.last_record().is_some_and(|record| {
            record.contains("isEqualTo") || record.contains("matches") || record.contains("isNull")
        });
        let checked = self.finish(delegate, [Call::IsEqualTo(Value::Number(value.clone()))]);
        Ok(
            if self.delegate.is_asserting_a_value_in_array() && contains_a_matcher {
                checked.record(".value()")
            } else {
                checked.record_with_value("isEqualTo", &number_literal(value))
            },
        )
    }

    fn is_equal_to_bool(&self, value: bool) -> AssertionResult<Self> {
        let delegate = self.delegate.is_equal_to(value)?;
        let checked = self.finish(delegate, [Call::IsEqualTo(Value::Bool(value))]);
        Ok(if self.delegate.is_asserting_a_value_in_array() {
            checked.record(".value()")
        } else {
            checked.record_with_value("isEqualTo", &value.to_string())
        })
    }

    /// Terminal null check.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn is_null(&self) -> AssertionResult<Self> {
        let delegate = self.delegate.is_null()?;
        Ok(self.finish(delegate, [Call::IsNull]).record(".isNull()"))
    }

    /// Terminal emptiness check.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn is_empty(&self) -> AssertionResult<Self> {
        let delegate = self.delegate.is_empty()?;
        Ok(self.finish(delegate, [Call::IsEmpty]).record(".isEmpty()"))
    }

    /// Terminal regex check.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn matches(&self, pattern: &str) -> AssertionResult<Self> {
        let delegate = self.delegate.matches(pattern)?;
        let checked = self
            .finish(delegate, [Call::Matches(pattern.to_string())])
            .record_with_value("matches", &java_string(pattern));
        Ok(if self.delegate.is_asserting_a_value_in_array() {
            checked.record(".value()")
        } else {
            checked
        })
    }

    /// Terminal type check, recorded as `.isInstanceOf(<class>.class)`.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn is_instance_of(&self, class: &str) -> AssertionResult<Self> {
        let delegate = self.delegate.is_instance_of(class)?;
        Ok(self
            .finish(delegate, [Call::IsInstanceOf(class.to_string())])
            .record(format!(".isInstanceOf({class}.class)")))
    }

    /// Terminal size check.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn has_size(&self, size: usize) -> AssertionResult<Self> {
        let delegate = self.delegate.has_size(size)?;
        Ok(self
            .finish(delegate, [Call::HasSize(size)])
            .record(format!(".hasSize({size})")))
    }

    /// Terminal existence check.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn value(&self) -> AssertionResult<Self> {
        let delegate = self.delegate.value()?;
        Ok(self.finish(delegate, [Call::Value]))
    }

    /// The recorded chain as fluent call text.
    pub fn method(&self) -> String {
        self.methods_buffer.concat()
    }

    /// The individual recorded call texts.
    pub fn methods(&self) -> &[String] {
        &self.methods_buffer
    }

    /// The delegate operations performed so far.
    pub fn calls(&self) -> &[Call] {
        &self.calls
    }

    /// The delegate's current JSON path.
    pub fn json_path(&self) -> String {
        self.delegate.json_path()
    }

    /// The delegate's path before the terminal check, or its current path.
    pub fn key_before_checking(&self) -> String {
        match &self.state {
            ChainState::Terminal {
                key_before_checking,
            } => key_before_checking.clone(),
            ChainState::Extendable => self.delegate.json_path(),
        }
    }

    /// The chain state.
    pub fn state(&self) -> &ChainState {
        &self.state
    }

    /// Whether a terminal check has been applied.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, ChainState::Terminal { .. })
    }

    /// Whether the chain checks a size or emptiness.
    pub fn asserts_size(&self) -> bool {
        self.methods_buffer
            .iter()
            .any(|record| record.contains(".hasSize(") || record.contains(".isEmpty()"))
    }

    /// Whether the chain navigates through a named field or array.
    pub fn asserts_concrete_value(&self) -> bool {
        self.methods_buffer
            .iter()
            .any(|record| FIELD_PATTERN.is_match(record) || ARRAY_PATTERN.is_match(record))
    }

    /// Whether the delegate iterates over array elements.
    pub fn is_iterating_over_array(&self) -> bool {
        self.delegate.is_iterating_over_array()
    }

    /// Whether the delegate iterates over a root array.
    pub fn is_iterating_over_nameless_array(&self) -> bool {
        self.delegate.is_iterating_over_nameless_array()
    }

    /// Whether checks apply to primitive array values.
    pub fn is_asserting_a_value_in_array(&self) -> bool {
        self.delegate.is_asserting_a_value_in_array()
    }

    /// The wrapped delegate.
    pub fn delegate(&self) -> &V {
        &self.delegate
    }

    /// The delegate with checks disabled.
    pub fn without_throwing_exception(&self) -> V {
        self.delegate.without_throwing_exception()
    }

    /// Checks an arbitrary path through the delegate.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn matches_json_path(&self, path: &str) -> AssertionResult<()> {
        self.delegate.matches_json_path(path)
    }

    /// Reads the current value through the delegate.
    ///
    /// # Errors
    ///
    /// Propagates the delegate's failure.
    pub fn read<T: serde::de::DeserializeOwned>(&self) -> AssertionResult<T> {
        self.delegate.read()
    }

    /// Performs the recorded delegate operations again, starting at `root`.
    ///
    /// # Errors
    ///
    /// Fails with the first check that does not hold for `root`'s document.
    pub fn replay<T: JsonVerifiable>(&self, root: T) -> AssertionResult<T> {
        self.calls
            .iter()
            .try_fold(root, |target, call| call.apply(&target))
    }
}

impl<V> PartialEq for DelegatingJsonVerifiable<V> {
    fn eq(&self, other: &Self) -> bool {
        self.methods_buffer == other.methods_buffer
    }
}

impl<V> Eq for DelegatingJsonVerifiable<V> {}

impl<V> Hash for DelegatingJsonVerifiable<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.methods_buffer.hash(state);
    }
}

impl<V> fmt::Display for DelegatingJsonVerifiable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.methods_buffer.concat())
    }
}

/// Renders a value as a call argument: strings are quoted with inner quotes
/// escaped, everything else uses its JSON text.
pub fn wrap_value_with_quotes(value: Option<&Value>) -> Option<String> {
    value.map(|value| match value {
        Value::String(text) => quote(text),
        other => other.to_string(),
    })
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\\\""))
}

/// A Java string literal holding `text`.
fn java_string(text: &str) -> String {
    format!("\"{}\"", escape_java(text))
}

fn number_literal(value: &Number) -> String {
    let wide = match (value.as_i64(), value.as_u64()) {
        (Some(n), _) => i32::try_from(n).is_err(),
        (None, Some(_)) => true,
        _ => false,
    };
    if wide {
        format!("{value}L")
    } else {
        value.to_string()
    }
}

/// Escapes `text` as the body of a Java string literal.
pub fn escape_java(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{8}' => out.push_str("\\b"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '\r' => out.push_str("\\r"),
            c if c < ' ' || c > '\u{7f}' => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{unit:04X}");
                }
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_jsonassert::JsonAssertion;
    use serde_json::json;
    use std::collections::HashSet;

    fn recorder(json: Value) -> DelegatingJsonVerifiable {
        DelegatingJsonVerifiable::new(JsonAssertion::assert_that(json))
    }

    #[test]
    fn test_field_is_equal_to() {
        let chain = recorder(json!({"a": "b"})).field("a").is_equal_to("b").unwrap();
        assert_eq!(chain.method(), ".field(\"a\").isEqualTo(\"b\")");
        assert!(chain.is_finished());
        assert_eq!(chain.key_before_checking(), "$.a");
    }

    #[test]
    fn test_receiver_buffer_is_untouched() {
        let root = recorder(json!({"a": {"b": 1}}));
        let a = root.field("a");
        let _ = a.field("b");
        let _ = a.traverse_field("c");
        assert_eq!(root.method(), "");
        assert_eq!(a.method(), ".field(\"a\")");
    }

    #[test]
    fn test_field_while_iterating_records_contains() {
        let chain = recorder(json!({"items": [{"id": 1}]}))
            .array("items")
            .field("id")
            .is_equal_to(1)
            .unwrap();
        assert_eq!(chain.method(), ".array(\"items\").contains(\"id\").isEqualTo(1)");
        let traversed = recorder(json!({"items": [{"id": 1}]}))
            .array("items")
            .traverse_field("id");
        assert_eq!(traversed.method(), ".array(\"items\").field(\"id\")");
    }

    #[test]
    fn test_string_in_array_after_array_field() {
        let chain = recorder(json!({"tags": ["x", "y"]}))
            .array("tags")
            .array_field()
            .is_equal_to("y")
            .unwrap();
        assert_eq!(
            chain.method(),
            ".array(\"tags\").arrayField().isEqualTo(\"y\").value()"
        );
    }

    #[test]
    fn test_string_in_array_after_value_record() {
        let values = recorder(json!({"tags": ["x"]})).array_field_named("tags");
        assert_eq!(values.method(), ".array(\"tags\")");
        let chain = values.is_equal_to("x").unwrap();
        assert_eq!(chain.method(), ".array(\"tags\").isEqualTo(\"x\")");

        let contains = values.contains("x").unwrap();
        assert_eq!(contains.method(), ".array(\"tags\").contains(\"x\").value()");
        assert!(contains.is_finished());
    }

    #[test]
    fn test_number_in_array_after_matcher_records_value() {
        let values = recorder(json!([1, 2])).array_field();
        let first = values.is_equal_to(1).unwrap();
        assert_eq!(first.method(), ".arrayField().isEqualTo(1)");
        let base = DelegatingJsonVerifiable {
            methods_buffer: vec![".matches(\"x\")".to_string()],
            ..values.clone()
        };
        assert_eq!(base.is_equal_to(2).unwrap().method(), ".matches(\"x\").value()");
    }

    #[test]
    fn test_long_suffix() {
        let big = 5_000_000_000_i64;
        let chain = recorder(json!({"n": big})).field("n").is_equal_to(big).unwrap();
        assert_eq!(chain.method(), ".field(\"n\").isEqualTo(5000000000L)");
        let small = recorder(json!({"n": 7})).field("n").is_equal_to(7).unwrap();
        assert_eq!(small.method(), ".field(\"n\").isEqualTo(7)");
        let float = recorder(json!({"n": 1.5})).field("n").is_equal_to(1.5).unwrap();
        assert_eq!(float.method(), ".field(\"n\").isEqualTo(1.5)");
    }

    #[test]
    fn test_boolean() {
        let chain = recorder(json!({"ok": true})).field("ok").is_equal_to(true).unwrap();
        assert_eq!(chain.method(), ".field(\"ok\").isEqualTo(true)");
        let in_array = recorder(json!([true])).array_field().is_equal_to(true).unwrap();
        assert_eq!(in_array.method(), ".arrayField().value()");
    }

    #[test]
    fn test_null_and_empty_and_size() {
        let doc = json!({"n": null, "e": [], "s": [1, 2]});
        assert_eq!(
            recorder(doc.clone()).field("n").is_equal_to(Value::Null).unwrap().method(),
            ".field(\"n\").isNull()"
        );
        let empty = recorder(doc.clone()).array("e").is_empty().unwrap();
        assert_eq!(empty.method(), ".array(\"e\").isEmpty()");
        assert!(empty.asserts_size());
        let sized = recorder(doc).field("s").has_size(2).unwrap();
        assert_eq!(sized.method(), ".field(\"s\").hasSize(2)");
        assert!(sized.asserts_size());
    }

    #[test]
    fn test_matches_escaping() {
        let chain = recorder(json!({"a": "x\"y"}))
            .field("a")
            .matches("x\"y")
            .unwrap();
        assert_eq!(chain.method(), ".field(\"a\").matches(\"x\\\"y\")");
        let digits = recorder(json!({"a": "12"})).field("a").matches("\\d+").unwrap();
        assert_eq!(digits.method(), ".field(\"a\").matches(\"\\\\d+\")");
    }

    #[test]
    fn test_is_equal_to_escapes_once() {
        let quoted = recorder(json!({"a": "x\"y"})).field("a").is_equal_to("x\"y").unwrap();
        assert_eq!(quoted.method(), r#".field("a").isEqualTo("x\"y")"#);
        let slashed = recorder(json!({"a": "c:\\tmp"}))
            .field("a")
            .is_equal_to("c:\\tmp")
            .unwrap();
        assert_eq!(slashed.method(), r#".field("a").isEqualTo("c:\\tmp")"#);
        let in_array = recorder(json!(["\"q\""])).array_field().is_equal_to("\"q\"").unwrap();
        assert_eq!(in_array.method(), r#".arrayField().isEqualTo("\"q\"").value()"#);
    }

    #[test]
    fn test_is_instance_of_is_terminal() {
        let doc = json!({"id": 7, "name": "a"});
        let chain = recorder(doc.clone())
            .field("id")
            .is_instance_of("java.lang.Integer")
            .unwrap();
        assert_eq!(chain.method(), ".field(\"id\").isInstanceOf(java.lang.Integer.class)");
        assert!(chain.is_finished());
        assert_eq!(chain.key_before_checking(), "$.id");
        chain.replay(JsonAssertion::assert_that(doc.clone())).unwrap();
        assert!(chain.replay(JsonAssertion::assert_that(json!({"id": "7"}))).is_err());
        assert!(recorder(doc).field("name").is_instance_of("java.lang.Long").is_err());
    }

    #[test]
    fn test_matches_in_array_appends_value() {
        let chain = recorder(json!(["ab"])).array_field().matches("[a-z]+").unwrap();
        assert_eq!(chain.method(), ".arrayField().matches(\"[a-z]+\").value()");
    }

    #[test]
    fn test_element_with_index_recorded_on_new_chain() {
        let root = recorder(json!({"xs": [10, 20]}));
        let xs = root.field("xs");
        let indexed = xs.element_with_index(1);
        assert_eq!(xs.method(), ".field(\"xs\")");
        assert_eq!(indexed.method(), ".field(\"xs\").elementWithIndex(1)");
        assert_eq!(indexed.json_path(), "$.xs[1]");
    }

    #[test]
    fn test_iteration_passing_array_is_identity() {
        let items = recorder(json!({"items": [{"a": 1}]})).array("items");
        let passed = items.iteration_passing_array();
        assert_eq!(passed, items);
        assert_eq!(passed.json_path(), items.json_path());
    }

    #[test]
    fn test_anonymous_array() {
        let chain = recorder(json!([{"a": 1}])).anonymous_array();
        assert!(chain.is_iterating_over_nameless_array());
        assert_eq!(chain.method(), ".array()");
    }

    #[test]
    fn test_bracketed_notation() {
        let root = recorder(json!({"a.b": {"c": "d"}})).with_notation(FieldNotation::Bracketed);
        let chain = root.field("a.b").field("c").is_equal_to("d").unwrap();
        assert_eq!(chain.method(), ".field(\"['a.b']\").field(\"['c']\").isEqualTo(\"d\")");
        assert!(chain.asserts_concrete_value());
    }

    #[test]
    fn test_bracket_wrap_keeps_numbers_and_escapes_quotes() {
        assert_eq!(FieldNotation::Bracketed.wrap("12"), "12");
        assert_eq!(FieldNotation::Bracketed.wrap("it's"), "['it\\'s']");
        assert_eq!(FieldNotation::Plain.wrap("it's"), "it's");
    }

    #[test]
    fn test_asserts_concrete_value() {
        let root = recorder(json!({"a": [1]}));
        assert!(!root.asserts_concrete_value());
        assert!(!root.array_field().asserts_concrete_value());
        assert!(root.field("a").asserts_concrete_value());
        assert!(root.array("a").asserts_concrete_value());
        assert!(!root.anonymous_array().asserts_concrete_value());
    }

    #[test]
    fn test_failures_propagate() {
        let err = recorder(json!({"a": 1})).field("a").is_equal_to(2).unwrap_err();
        assert_eq!(err.path(), Some("$[?(@.a == 2)]"));
    }

    #[test]
    fn test_equality_and_hash_by_method() {
        let one = recorder(json!({"a": 1})).field("a");
        let other = recorder(json!({"a": 2})).field("a");
        assert_eq!(one, other);
        let set: HashSet<_> = [one, other].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_replay() {
        let chain = recorder(json!({"items": [{"id": 1}, {"id": 2}]}))
            .array("items")
            .field("id")
            .is_equal_to(2)
            .unwrap();
        assert!(chain
            .replay(JsonAssertion::assert_that(json!({"items": [{"id": 2}]})))
            .is_ok());
        assert!(chain
            .replay(JsonAssertion::assert_that(json!({"items": [{"id": 3}]})))
            .is_err());
    }

    #[test]
    fn test_wrap_value_with_quotes() {
        assert_eq!(wrap_value_with_quotes(None), None);
        assert_eq!(wrap_value_with_quotes(Some(&json!("x"))).unwrap(), "\"x\"");
        assert_eq!(wrap_value_with_quotes(Some(&json!("a\"b"))).unwrap(), "\"a\\\"b\"");
        assert_eq!(wrap_value_with_quotes(Some(&json!(5))).unwrap(), "5");
    }

    #[test]
    fn test_escape_java() {
        assert_eq!(escape_java("a\"b\\c\n"), "a\\\"b\\\\c\\n");
        assert_eq!(escape_java("é"), "\\u00E9");
        assert_eq!(escape_java("\u{1F600}"), "\\uD83D\\uDE00");
        assert_eq!(escape_java("plain [a-z]/"), "plain [a-z]/");
    }

    #[test]
    fn test_display_is_method() {
        let chain = recorder(json!({"a": 1})).field("a");
        assert_eq!(chain.to_string(), chain.method());
    }
}
