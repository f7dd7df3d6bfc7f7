//! JSON path assertions over a parsed document.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use crate::error::{AssertionError, AssertionResult};
use crate::path::{read_element, JsonPath};
use crate::verifiable::JsonVerifiable;

/// Entry point for building assertions.
///
/// ```
/// use covenant_jsonassert::{JsonAssertion, JsonVerifiable};
/// use serde_json::json;
///
/// let body = json!({"user": {"name": "ada", "roles": ["admin", "dev"]}});
/// let check = JsonAssertion::assert_that(body);
/// check.field("user").field("name").is_equal_to("ada")?;
/// check.field("user").array("roles").array_field().is_equal_to("dev")?;
/// # Ok::<(), covenant_jsonassert::AssertionError>(())
/// ```
#[derive(Debug, Clone, Copy)]
pub struct JsonAssertion;

impl JsonAssertion {
    /// Starts assertions at the root of `json`.
    pub fn assert_that(json: impl Into<Value>) -> JsonAsserter {
        JsonAsserter::new(Arc::new(json.into()))
    }

    /// Parses `text` and starts assertions at its root.
    ///
    /// # Errors
    ///
    /// Returns [`AssertionError::InvalidJson`] when `text` is not JSON.
    pub fn assert_that_json(text: &str) -> AssertionResult<JsonAsserter> {
        serde_json::from_str::<Value>(text)
            .map(Self::assert_that)
            .map_err(|source| AssertionError::InvalidJson { source })
    }
}

/// What the last navigation step selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Root,
    Field,
    Array { nameless: bool },
    ArrayValue,
    IndexedElement,
    ReadyToCheck,
}

/// The concrete [`JsonVerifiable`] backed by the JSON path evaluator.
#[derive(Debug, Clone)]
pub struct JsonAsserter {
    json: Arc<Value>,
    path: Vec<String>,
    field_name: Option<String>,
    position: Position,
    throwing: bool,
}

impl JsonAsserter {
    fn new(json: Arc<Value>) -> Self {
        Self {
            json,
            path: vec!["$".to_string()],
            field_name: None,
            position: Position::Root,
            throwing: true,
        }
    }

    /// The document under test.
    #[must_use]
    pub fn document(&self) -> &Value {
        &self.json
    }

    /// Whether checks are enforced.
    #[must_use]
    pub fn is_throwing(&self) -> bool {
        self.throwing
    }

    fn step(&self, position: Position, field_name: Option<String>, segment: Option<String>) -> Self {
        let mut next = self.clone();
        next.position = position;
        next.field_name = field_name;
        next.path.extend(segment);
        next
    }

    /// Appends `[?(@<.field> <op> <rhs>)]`, replacing the last segment when
    /// the condition applies to a field.
    fn with_condition(&self, op: &str, rhs: &str) -> Self {
        let mut next = self.clone();
        match (&self.position, &self.field_name) {
            (Position::Field, Some(name)) => {
                next.path.pop();
                next.path.push(format!("[?(@.{name} {op} {rhs})]"));
            }
            _ => next.path.push(format!("[?(@ {op} {rhs})]")),
        }
        next.position = Position::ReadyToCheck;
        next
    }

    fn finished(&self) -> Self {
        let mut next = self.clone();
        next.position = Position::ReadyToCheck;
        next
    }

    fn matched(&self, path: &str) -> AssertionResult<Vec<&Value>> {
        Ok(JsonPath::parse(path)?.evaluate(&self.json))
    }

    fn check(self) -> AssertionResult<Self> {
        if self.throwing {
            let path = self.json_path();
            trace!(path = %path, "checking JSON path");
            if self.matched(&path)?.is_empty() {
                return Err(self.no_match(path));
            }
        }
        Ok(self)
    }

    fn no_match(&self, path: String) -> AssertionError {
        AssertionError::NoMatch {
            path,
            json: self.json.to_string(),
        }
    }
}

/// Renders `value` as a filter literal.
#[must_use]
pub fn filter_literal(value: &Value) -> String {
    match value {
        Value::String(s) => quote(s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        other => quote(&other.to_string()),
    }
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Escapes `/` so the pattern can sit between regex delimiters.
fn escape_slashes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    for c in pattern.chars() {
        if c == '/' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

fn value_label(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether `value` is what a Java reader would deserialise as `class`.
fn is_instance(value: &Value, class: &str) -> bool {
    let simple = class.rsplit('.').next().unwrap_or(class);
    match simple {
        "Object" => true,
        "String" | "CharSequence" => value.is_string(),
        "Boolean" => value.is_boolean(),
        "Integer" | "Long" | "Short" | "BigInteger" => value.is_i64() || value.is_u64(),
        "Number" | "Double" | "Float" | "BigDecimal" => value.is_number(),
        "List" | "Collection" | "Iterable" => value.is_array(),
        "Map" => value.is_object(),
        _ => false,
    }
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

impl JsonVerifiable for JsonAsserter {
    fn contains(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        if self.position == Position::ArrayValue {
            let condition = format!("[?(@ == {})]", filter_literal(&value));
            return self.step(Position::ReadyToCheck, None, Some(condition));
        }
        self.step(
            Position::Field,
            Some(value_label(&value)),
            Some("[*]".to_string()),
        )
    }

    fn field(&self, name: &str) -> Self {
        self.step(
            Position::Field,
            Some(name.to_string()),
            Some(format!(".{name}")),
        )
    }

    fn array(&self, name: &str) -> Self {
        self.step(
            Position::Array { nameless: false },
            Some(name.to_string()),
            Some(format!(".{name}[*]")),
        )
    }

    fn anonymous_array(&self) -> Self {
        let nameless = self.path.len() == 1;
        self.step(
            Position::Array { nameless },
            None,
            Some("[*]".to_string()),
        )
    }

    fn array_field(&self) -> Self {
        let mut next = self.clone();
        next.position = Position::ArrayValue;
        next
    }

    fn element_with_index(&self, index: usize) -> Self {
        let mut next = self.step(Position::IndexedElement, None, None);
        if let Some(last) = next.path.pop() {
            match last.strip_suffix("[*]") {
                Some("") => {}
                Some(prefix) => next.path.push(prefix.to_string()),
                None => next.path.push(last),
            }
        }
        next.path.push(format!("[{index}]"));
        next
    }

    fn is_equal_to(&self, value: impl Into<Value>) -> AssertionResult<Self> {
        self.with_condition("==", &filter_literal(&value.into()))
            .check()
    }

    fn is_null(&self) -> AssertionResult<Self> {
        self.with_condition("==", "null").check()
    }

    fn is_empty(&self) -> AssertionResult<Self> {
        let next = self.finished();
        if next.throwing {
            let path = next.json_path();
            if !next.matched(&path)?.into_iter().all(is_empty_value) {
                return Err(AssertionError::NotEmpty {
                    path,
                    json: next.json.to_string(),
                });
            }
        }
        Ok(next)
    }

    fn is_instance_of(&self, class: &str) -> AssertionResult<Self> {
        let next = self.finished();
        if next.throwing {
            let path = next.json_path();
            let matched = next.matched(&path)?;
            if matched.is_empty() {
                return Err(next.no_match(path));
            }
            if !matched.into_iter().all(|value| is_instance(value, class)) {
                return Err(AssertionError::WrongType {
                    path,
                    class: class.to_string(),
                    json: next.json.to_string(),
                });
            }
        }
        Ok(next)
    }

    fn matches(&self, pattern: &str) -> AssertionResult<Self> {
        self.with_condition("=~", &format!("/{}/", escape_slashes(pattern)))
            .check()
    }

    fn has_size(&self, size: usize) -> AssertionResult<Self> {
        let next = self.finished();
        if next.throwing {
            let path = next.json_path();
            let matched = next.matched(&path)?;
            let actual = match matched.as_slice() {
                [Value::Array(items)] => items.len(),
                _ => matched.len(),
            };
            if actual != size {
                return Err(AssertionError::SizeMismatch {
                    path,
                    expected: size,
                    actual,
                });
            }
        }
        Ok(next)
    }

    fn value(&self) -> AssertionResult<Self> {
        self.finished().check()
    }

    fn json_path(&self) -> String {
        self.path.concat()
    }

    fn is_iterating_over_array(&self) -> bool {
        matches!(
            self.position,
            Position::Array { .. } | Position::ArrayValue | Position::IndexedElement
        )
    }

    fn is_iterating_over_nameless_array(&self) -> bool {
        self.position == Position::Array { nameless: true }
    }

    fn is_asserting_a_value_in_array(&self) -> bool {
        self.position == Position::ArrayValue
    }

    fn without_throwing_exception(&self) -> Self {
        let mut next = self.clone();
        next.throwing = false;
        next
    }

    fn matches_json_path(&self, path: &str) -> AssertionResult<()> {
        if self.throwing && self.matched(path)?.is_empty() {
            return Err(self.no_match(path.to_string()));
        }
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self) -> AssertionResult<T> {
        let path = self.json_path();
        let value = read_element(&self.json, &path)?;
        serde_json::from_value(value).map_err(|source| AssertionError::Deserialize { path, source })
    }
}
