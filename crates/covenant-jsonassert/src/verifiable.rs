//! The fluent JSON assertion interface.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AssertionResult;

/// A step-by-step JSON path builder that checks the path against a document.
///
/// Navigation methods return a new verifiable with the path extended.
/// Terminal methods finish the path with a condition and check it, returning
/// the finished verifiable or the assertion failure.
pub trait JsonVerifiable: Sized + Clone {
    /// Selects the member named `value` of each array element.
    fn contains(&self, value: impl Into<Value>) -> Self;

    /// Descends into the member `name`.
    fn field(&self, name: &str) -> Self;

    /// Descends through several members in turn.
    fn field_path(&self, names: &[&str]) -> Self {
        names
            .iter()
            .fold(self.clone(), |verifiable, name| verifiable.field(name))
    }

    /// Iterates over the elements of the array member `name`.
    fn array(&self, name: &str) -> Self;

    /// Iterates over the elements of the current array.
    fn anonymous_array(&self) -> Self;

    /// Treats the current array as holding primitive values.
    fn array_field(&self) -> Self;

    /// Selects the element at `index`.
    fn element_with_index(&self, index: usize) -> Self;

    /// Checks that the current value equals `value`.
    ///
    /// # Errors
    ///
    /// Fails when no value satisfies the condition.
    fn is_equal_to(&self, value: impl Into<Value>) -> AssertionResult<Self>;

    /// Checks that the current value is `null`.
    ///
    /// # Errors
    ///
    /// Fails when no value satisfies the condition.
    fn is_null(&self) -> AssertionResult<Self>;

    /// Checks that the current collection or string is empty.
    ///
    /// # Errors
    ///
    /// Fails when a matched value is not empty.
    fn is_empty(&self) -> AssertionResult<Self>;

    /// Checks that the current value fully matches `pattern`.
    ///
    /// # Errors
    ///
    /// Fails when no value satisfies the condition.
    fn matches(&self, pattern: &str) -> AssertionResult<Self>;

    /// Checks that every current value is an instance of the Java class
    /// `class`, such as `String`, `java.lang.Long` or `java.util.Map`.
    ///
    /// # Errors
    ///
    /// Fails when nothing matches or a matched value has another type.
    fn is_instance_of(&self, class: &str) -> AssertionResult<Self>;

    /// Checks the size of the current collection.
    ///
    /// # Errors
    ///
    /// Fails when the size differs.
    fn has_size(&self, size: usize) -> AssertionResult<Self>;

    /// Checks that the current path matches something.
    ///
    /// # Errors
    ///
    /// Fails when nothing matches.
    fn value(&self) -> AssertionResult<Self>;

    /// The JSON path built so far.
    fn json_path(&self) -> String;

    /// Whether the path currently iterates over array elements.
    fn is_iterating_over_array(&self) -> bool;

    /// Whether the path iterates over a root array.
    fn is_iterating_over_nameless_array(&self) -> bool;

    /// Whether terminal checks apply to primitive array values.
    fn is_asserting_a_value_in_array(&self) -> bool;

    /// Returns a copy whose checks always pass.
    #[must_use]
    fn without_throwing_exception(&self) -> Self;

    /// Checks an arbitrary path against the document.
    ///
    /// # Errors
    ///
    /// Fails when nothing matches.
    fn matches_json_path(&self, path: &str) -> AssertionResult<()>;

    /// Deserialises the value at the current path.
    ///
    /// # Errors
    ///
    /// Fails when the path matches nothing or the value has the wrong shape.
    fn read<T: DeserializeOwned>(&self) -> AssertionResult<T>;
}
