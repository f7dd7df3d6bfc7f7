//! Expected body to assertion chains.
//!
//! The converter walks an expected JSON body and records, for every leaf,
//! the chain of [`DelegatingJsonVerifiable`] calls that checks it. The
//! recorded chains are collected into [`JsonPaths`], which can be rendered
//! as source text or replayed against an actual body.
//!
//! ```text
//! {"user": {"name": "a"}, "tags": ["x"]}
//!         │
//!         ▼
//! .field("['user']").field("['name']").isEqualTo("a")
//! .array("['tags']").arrayField().isEqualTo("x").value()
//! ```

use covenant_jsonassert::{AssertionResult, JsonAsserter, JsonAssertion, JsonVerifiable};
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::ConverterConfig;
use crate::error::VerifierResult;
use crate::recorder::DelegatingJsonVerifiable;
use crate::regex_property::RegexProperty;

type Key = DelegatingJsonVerifiable<JsonAsserter>;

/// Recorded assertion chains, unique by method text, in emission order.
#[derive(Debug, Clone, Default)]
pub struct JsonPaths {
    paths: IndexMap<String, Key>,
}

impl JsonPaths {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chain; returns false if an equal chain is already present.
    pub fn add(&mut self, verifiable: Key) -> bool {
        let method = verifiable.method();
        if self.paths.contains_key(&method) {
            return false;
        }
        self.paths.insert(method, verifiable);
        true
    }

    /// Number of chains.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether no chain was recorded.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Iterate over the chains.
    pub fn iter(&self) -> impl Iterator<Item = &Key> {
        self.paths.values()
    }

    /// The method text of every chain.
    pub fn methods(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(String::as_str)
    }

    /// Replays every chain against `body`, failing on the first chain that
    /// does not hold.
    ///
    /// # Errors
    ///
    /// Returns the failing chain's assertion error.
    pub fn verify(&self, body: &Value) -> AssertionResult<()> {
        let root = JsonAssertion::assert_that(body.clone());
        for verifiable in self.paths.values() {
            trace!(method = %verifiable.method(), "replaying assertion chain");
            verifiable.replay(root.clone())?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a JsonPaths {
    type Item = &'a Key;
    type IntoIter = indexmap::map::Values<'a, String, Key>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.values()
    }
}

/// Converts expected bodies into [`JsonPaths`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonToJsonPathsConverter {
    config: ConverterConfig,
}

impl JsonToJsonPathsConverter {
    /// Create a converter.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// The converter options.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    /// Records the assertion chains checking `json`.
    ///
    /// A `null` body yields nothing. An empty body yields nothing, or a
    /// single `isEmpty()` check when the empty check is enabled. A string
    /// body holding JSON text is parsed first.
    ///
    /// # Errors
    ///
    /// Returns an error when a recorded check cannot be built.
    pub fn transform_to_json_paths(&self, json: &Value) -> VerifierResult<JsonPaths> {
        let mut paths = JsonPaths::new();
        if json.is_null() || (is_empty_json(json) && !self.config.include_empty_check) {
            return Ok(paths);
        }
        let document = match json {
            Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| json.clone()),
            other => other.clone(),
        };
        let root = DelegatingJsonVerifiable::new(
            JsonAssertion::assert_that(document.clone()).without_throwing_exception(),
        )
        .with_notation(self.config.notation);
        if is_empty_json(json) {
            paths.add(root.is_empty()?);
            return Ok(paths);
        }
        let mut traverser = Traverser {
            ordered: self.config.assert_json_size,
            paths: &mut paths,
        };
        traverser.process_value(&root, &document)?;
        debug!(
            count = paths.len(),
            ordered = self.config.assert_json_size,
            "converted body to json paths"
        );
        Ok(paths)
    }
}

struct Traverser<'a> {
    ordered: bool,
    paths: &'a mut JsonPaths,
}

impl Traverser<'_> {
    fn emit(&mut self, key: Key) {
        trace!(method = %key.method(), path = %key.json_path(), "recorded assertion chain");
        self.paths.add(key);
    }

    fn process_value(&mut self, key: &Key, value: &Value) -> VerifierResult<()> {
        if RegexProperty::from_marker(value).is_some() {
            return self.emit_value(key, value);
        }
        match value {
            Value::String(text) if !text.is_empty() => self.process_string(key, text, value),
            Value::Object(map) => self.process_map(key, map),
            Value::Array(list) => self.process_list(key, list),
            Value::Null => self.emit_value(key, value),
            primitive => {
                if key.is_iterating_over_array() {
                    let contained = key.array_field().contains(primitive.clone())?;
                    self.process_value(&contained, primitive)?;
                }
                self.emit_value(key, primitive)
            }
        }
    }

    fn process_string(&mut self, key: &Key, text: &str, value: &Value) -> VerifierResult<()> {
        match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => self.process_map(key, &map),
            _ => self.emit_value(key, value),
        }
    }

    fn process_map(
        &mut self,
        key: &Key,
        map: &serde_json::Map<String, Value>,
    ) -> VerifierResult<()> {
        if map.is_empty() {
            let empty = key.is_empty()?;
            self.emit(empty);
            return Ok(());
        }
        for (name, value) in map {
            let entry = key_for_entry(key, name, value)?;
            self.process_value(&entry, value)?;
        }
        Ok(())
    }

    fn process_list(&mut self, key: &Key, list: &[Value]) -> VerifierResult<()> {
        if list.is_empty() {
            self.emit(key.clone());
            return Ok(());
        }
        if contains_only_primitives(list) {
            self.add_size_check_if_enabled(key, list)?;
            return self.process_primitive_list(key, list);
        }
        self.process_complex_list(key, list)
    }

    fn process_primitive_list(&mut self, key: &Key, list: &[Value]) -> VerifierResult<()> {
        if self.ordered {
            for (index, element) in list.iter().enumerate() {
                let asserter = value_to_asserter(&key.element_with_index(index), element)?;
                self.process_value(&asserter, element)?;
            }
        } else {
            let array_key = key.array_field();
            for element in list {
                let asserter = value_to_asserter(&array_key, element)?;
                self.process_value(&asserter, element)?;
            }
        }
        Ok(())
    }

    fn process_complex_list(&mut self, key: &Key, list: &[Value]) -> VerifierResult<()> {
        if self.ordered {
            for (index, element) in list.iter().enumerate() {
                let asserter = list_element_asserter(&key.element_with_index(index), element)?;
                self.process_value(&asserter, element)?;
            }
        } else {
            let array_key = array_asserter(key, list);
            for element in list {
                let asserter = list_element_asserter(&array_key, element)?;
                self.process_value(&asserter, element)?;
            }
        }
        Ok(())
    }

    fn add_size_check_if_enabled(&mut self, key: &Key, list: &[Value]) -> VerifierResult<()> {
        if !self.ordered || list.is_empty() || !contains_only_primitives(list) {
            return Ok(());
        }
        if is_root(key) || key.asserts_concrete_value() {
            let sized = key.has_size(list.len())?;
            self.emit(sized);
        }
        Ok(())
    }

    fn emit_value(&mut self, key: &Key, value: &Value) -> VerifierResult<()> {
        let is_collection = is_collection(value);
        if is_collection || (key.is_finished() && !key.is_asserting_a_value_in_array()) {
            self.emit(key.clone());
        } else {
            let asserter = value_to_asserter(key, value)?;
            self.emit(asserter);
        }
        Ok(())
    }
}

fn key_for_entry(parent: &Key, name: &str, value: &Value) -> AssertionResult<Key> {
    Ok(match value {
        Value::Array(list) if list.is_empty() => parent.array(name).is_empty()?,
        Value::Array(list) if contains_only_primitives(list) => parent.array_field_named(name),
        Value::Array(_) => parent.array(name),
        _ => parent.traverse_field(name),
    })
}

fn array_asserter(key: &Key, list: &[Value]) -> Key {
    if key.is_iterating_over_nameless_array() {
        return key.anonymous_array();
    }
    if key.is_iterating_over_array() && is_list_of_lists(list) {
        let all_primitive = list.iter().all(|item| match item {
            Value::Array(inner) => contains_only_primitives(inner),
            _ => false,
        });
        return if all_primitive {
            key.iteration_passing_array()
        } else {
            key.anonymous_array()
        };
    }
    if key.is_iterating_over_array() {
        return key.iteration_passing_array();
    }
    if is_root(key) && !is_list_of_lists(list) {
        return key.anonymous_array();
    }
    key.clone()
}

fn list_element_asserter(key: &Key, element: &Value) -> AssertionResult<Key> {
    if key.is_asserting_a_value_in_array() {
        if let Some(pattern) = RegexProperty::from_marker(element) {
            return key.matches(pattern);
        }
        if is_collection(element) {
            return Ok(key.clone());
        }
        return key.contains(element.clone());
    }
    match element {
        Value::Array(inner) if contains_only_primitives(inner) => Ok(key.anonymous_array()),
        _ => Ok(key.clone()),
    }
}

fn value_to_asserter(key: &Key, value: &Value) -> AssertionResult<Key> {
    if key.is_finished() {
        return Ok(key.clone());
    }
    if let Some(pattern) = RegexProperty::from_marker(value) {
        return key.matches(pattern);
    }
    key.is_equal_to(value.clone())
}

fn is_root(key: &Key) -> bool {
    key.json_path() == "$"
}

fn is_empty_json(json: &Value) -> bool {
    match json {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Array(list) => list.is_empty(),
        _ => false,
    }
}

fn is_collection(value: &Value) -> bool {
    RegexProperty::from_marker(value).is_none() && (value.is_object() || value.is_array())
}

fn is_primitive(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
        || RegexProperty::from_marker(value).is_some()
}

fn contains_only_primitives(list: &[Value]) -> bool {
    !list.is_empty() && list.iter().all(is_primitive)
}

fn is_list_of_lists(list: &[Value]) -> bool {
    list.iter().all(Value::is_array)
}
