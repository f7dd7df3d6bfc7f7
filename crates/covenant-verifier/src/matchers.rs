//! Body matchers: JSON paths whose values are checked by rule instead of by
//! literal comparison.
//!
//! Matched entries are removed from the expected body before it is converted
//! into assertion chains, and each matcher becomes a filter path of its own.

use covenant_jsonassert::{delete, read_element, PathError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{VerifierError, VerifierResult};
use crate::regex_property::{RegexPatterns, RegexProperty};

static ANY_ARRAY_NOTATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(.*?)\]").expect("valid array notation pattern"));

/// How a matched value is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchingType {
    /// Equal to the value in the expected body.
    Equality,
    /// Same type, optionally with collection size bounds.
    Type,
    /// Checked by a custom command.
    Command,
    /// Matches a regular expression.
    Regex,
    /// Matches an ISO date.
    Date,
    /// Matches an ISO time.
    Time,
    /// Matches an ISO date-time.
    Timestamp,
    /// Is `null`.
    Null,
}

impl MatchingType {
    /// Whether the check is a regex match.
    pub fn is_regex_related(self) -> bool {
        matches!(self, Self::Regex | Self::Date | Self::Time | Self::Timestamp)
    }
}

/// A single path matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BodyMatcher {
    /// JSON path of the checked value.
    pub path: String,
    /// The check to apply.
    #[serde(rename = "type")]
    pub matching_type: MatchingType,
    /// Regex pattern or command, depending on the type.
    #[serde(default)]
    pub value: Option<String>,
    /// Minimum collection size for type checks.
    #[serde(default)]
    pub min_type_occurrence: Option<usize>,
    /// Maximum collection size for type checks.
    #[serde(default)]
    pub max_type_occurrence: Option<usize>,
}

impl BodyMatcher {
    /// Create a matcher without a value or bounds.
    pub fn new(path: impl Into<String>, matching_type: MatchingType) -> Self {
        Self {
            path: path.into(),
            matching_type,
            value: None,
            min_type_occurrence: None,
            max_type_occurrence: None,
        }
    }

    /// Set the value.
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// An ordered list of body matchers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BodyMatchers {
    matchers: Vec<BodyMatcher>,
}

impl BodyMatchers {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a matcher.
    pub fn push(&mut self, matcher: BodyMatcher) {
        self.matchers.push(matcher);
    }

    /// Add a matcher, builder style.
    pub fn json_path(mut self, matcher: BodyMatcher) -> Self {
        self.push(matcher);
        self
    }

    /// Match `path` against `pattern`.
    pub fn by_regex(self, path: impl Into<String>, pattern: impl Into<String>) -> Self {
        self.json_path(BodyMatcher::new(path, MatchingType::Regex).with_value(pattern))
    }

    /// Match `path` against an ISO date.
    pub fn by_date(self, path: impl Into<String>) -> Self {
        self.json_path(BodyMatcher::new(path, MatchingType::Date).with_value(RegexPatterns::ANY_DATE))
    }

    /// Match `path` against an ISO time.
    pub fn by_time(self, path: impl Into<String>) -> Self {
        self.json_path(BodyMatcher::new(path, MatchingType::Time).with_value(RegexPatterns::ANY_TIME))
    }

    /// Match `path` against an ISO date-time.
    pub fn by_timestamp(self, path: impl Into<String>) -> Self {
        self.json_path(
            BodyMatcher::new(path, MatchingType::Timestamp).with_value(RegexPatterns::ANY_DATE_TIME),
        )
    }

    /// Require `path` to equal the expected body's value.
    pub fn by_equality(self, path: impl Into<String>) -> Self {
        self.json_path(BodyMatcher::new(path, MatchingType::Equality))
    }

    /// Require `path` to have the expected body's type, within size bounds.
    pub fn by_type(
        self,
        path: impl Into<String>,
        min: Option<usize>,
        max: Option<usize>,
    ) -> Self {
        let mut matcher = BodyMatcher::new(path, MatchingType::Type);
        matcher.min_type_occurrence = min;
        matcher.max_type_occurrence = max;
        self.json_path(matcher)
    }

    /// Require `path` to be null.
    pub fn by_null(self, path: impl Into<String>) -> Self {
        self.json_path(BodyMatcher::new(path, MatchingType::Null))
    }

    /// Check `path` with a command; `$it` stands for the read value.
    pub fn by_command(self, path: impl Into<String>, command: impl Into<String>) -> Self {
        self.json_path(BodyMatcher::new(path, MatchingType::Command).with_value(command))
    }

    /// Whether any matcher is present.
    pub fn has_matchers(&self) -> bool {
        !self.matchers.is_empty()
    }

    /// The matchers, in insertion order.
    pub fn matchers(&self) -> &[BodyMatcher] {
        &self.matchers
    }

    /// Iterate over the matchers.
    pub fn iter(&self) -> std::slice::Iter<'_, BodyMatcher> {
        self.matchers.iter()
    }
}

impl<'a> IntoIterator for &'a BodyMatchers {
    type Item = &'a BodyMatcher;
    type IntoIter = std::slice::Iter<'a, BodyMatcher>;

    fn into_iter(self) -> Self::IntoIter {
        self.matchers.iter()
    }
}

/// Returns a copy of `json` without the entries the matchers cover.
///
/// Containers left holding only empty containers are removed too, except
/// for the root array itself.
pub fn remove_matching_json_paths(json: &Value, matchers: &BodyMatchers) -> Value {
    let mut copy = json.clone();
    if !matchers.has_matchers() {
        return copy;
    }
    let mut deleted = Vec::new();
    for matcher in matchers {
        match delete(&mut copy, &matcher.path) {
            Ok(0) => {}
            Ok(count) => {
                trace!(path = %matcher.path, count, "removed matched entries");
                deleted.push(matcher.path.clone());
            }
            Err(e) => trace!(path = %matcher.path, error = %e, "cannot delete matched path"),
        }
    }
    deleted.sort_unstable_by(|a, b| b.cmp(a));
    for path in &deleted {
        if let Err(e) = remove_trailing_containers(path, &mut copy) {
            trace!(path = %path, error = %e, "cannot remove trailing containers");
        }
    }
    debug!(removed = deleted.len(), "removed body matcher paths");
    copy
}

fn remove_trailing_containers(path: &str, json: &mut Value) -> Result<(), PathError> {
    let without_array = match ANY_ARRAY_NOTATION.find_iter(path).last() {
        Some(last) => path
            .rfind(last.as_str())
            .map_or(path, |index| &path[..index]),
        None => path,
    };
    let object = read_element(json, without_array).ok();
    if object.as_ref().is_some_and(contains_only_empty_elements) && path != "$[*]" {
        let to_delete = if without_array == "$" {
            "$[*]"
        } else {
            without_array
        };
        if to_delete.contains("..") {
            if root_contains_only_empty(json) {
                delete(json, "$[*]")?;
            }
            return Ok(());
        }
        delete(json, to_delete)?;
        return remove_trailing_containers(to_delete, json);
    }
    let Some(last_dot) = path.rfind('.') else {
        return Ok(());
    };
    let parent = &path[..last_dot];
    let parent_object = read_element(json, parent)?;
    if contains_only_empty_elements(&parent_object) && parent != "$" {
        delete(json, parent)?;
        return remove_trailing_containers(parent, json);
    }
    Ok(())
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

fn contains_only_empty_elements(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.values().all(is_empty_container),
        Value::Array(items) => items.iter().all(is_empty_container),
        _ => false,
    }
}

fn root_contains_only_empty(root: &Value) -> bool {
    match root {
        Value::Array(items) => items.iter().all(contains_only_empty_elements),
        _ => false,
    }
}

/// Replaces every regex marker in `json` with a generated value.
pub fn generated_values(json: &Value) -> VerifierResult<Value> {
    if let Some(property) = RegexProperty::parse_marker(json) {
        return property.generate_and_escape_java_string_if_needed();
    }
    Ok(match json {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, value)| Ok((key.clone(), generated_values(value)?)))
                .collect::<VerifierResult<_>>()?,
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(generated_values)
                .collect::<VerifierResult<_>>()?,
        ),
        other => other.clone(),
    })
}

/// Turns a matcher into a single filter path.
///
/// Regex matchers become `<parent>[?(@.<last> =~ /(<regex>)/)]`, equality
/// matchers compare with the value read from `body`, and type matchers bound
/// `.size()`. Matchers without a value that need one are returned unchanged.
pub fn convert_json_path_and_regex_to_a_json_path(
    matcher: &BodyMatcher,
    body: Option<&Value>,
) -> VerifierResult<String> {
    let path = matcher.path.as_str();
    let value = matcher.value.as_deref();
    if value.is_none()
        && !matches!(
            matcher.matching_type,
            MatchingType::Equality | MatchingType::Type
        )
    {
        return Ok(path.to_string());
    }
    let last_dot = find_last_dot_index(path);
    let (to_last_dot, property_name) = match last_dot {
        Some(index) => (&path[..index], format!("@.{}", &path[index + 1..])),
        None => ("$", "@".to_string()),
    };
    let comparison = match matcher.matching_type {
        MatchingType::Equality => equality_comparison(&property_name, matcher, body)?,
        MatchingType::Type => {
            let Some(comparison) = type_comparison(&property_name, matcher) else {
                return Ok(path.to_string());
            };
            comparison
        }
        _ => regex_comparison(&property_name, value.unwrap_or_default()),
    };
    Ok(format!("{to_last_dot}[?({comparison})]"))
}

fn find_last_dot_index(path: &str) -> Option<usize> {
    match path.rfind("['") {
        Some(bracket) => path[..bracket].rfind('.'),
        None => path.rfind('.'),
    }
}

fn equality_comparison(
    property_name: &str,
    matcher: &BodyMatcher,
    body: Option<&Value>,
) -> VerifierResult<String> {
    let body = body.ok_or_else(|| VerifierError::BodyRequired {
        path: matcher.path.clone(),
    })?;
    let converted = generated_values(body)?;
    let retrieved = read_element(&converted, &matcher.path)
        .map_err(|_| VerifierError::missing_body_value(&matcher.path, body))?;
    let wrapped = match retrieved {
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{s}'"),
        other => format!("'{other}'"),
    };
    Ok(format!("{property_name} == {wrapped}"))
}

fn type_comparison(property_name: &str, matcher: &BodyMatcher) -> Option<String> {
    let bounds: Vec<String> = [
        matcher
            .min_type_occurrence
            .map(|min| format!("{property_name}.size() >= {min}")),
        matcher
            .max_type_occurrence
            .map(|max| format!("{property_name}.size() <= {max}")),
    ]
    .into_iter()
    .flatten()
    .collect();
    if bounds.is_empty() {
        None
    } else {
        Some(bounds.join(" && "))
    }
}

fn regex_comparison(property_name: &str, value: &str) -> String {
    let converted = if value.contains("\\/") {
        value.to_string()
    } else {
        value.replace('/', "\\/")
    };
    format!("{property_name} =~ /({converted})/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use covenant_jsonassert::JsonPath;
    use serde_json::json;

    #[test]
    fn test_regex_conversion() {
        let matcher = BodyMatcher::new("$.a.b", MatchingType::Regex).with_value("[0-9]+");
        let path = convert_json_path_and_regex_to_a_json_path(&matcher, None).unwrap();
        assert_eq!(path, "$.a[?(@.b =~ /([0-9]+)/)]");
        let doc = json!({"a": {"b": "123"}});
        assert_eq!(JsonPath::parse(&path).unwrap().evaluate(&doc).len(), 1);
    }

    #[test]
    fn test_regex_conversion_escapes_slashes() {
        let matcher = BodyMatcher::new("$.url", MatchingType::Regex).with_value("http://.*");
        let path = convert_json_path_and_regex_to_a_json_path(&matcher, None).unwrap();
        assert_eq!(path, "$[?(@.url =~ /(http:\\/\\/.*)/)]");
        let already = BodyMatcher::new("$.url", MatchingType::Regex).with_value("a\\/b");
        let path = convert_json_path_and_regex_to_a_json_path(&already, None).unwrap();
        assert_eq!(path, "$[?(@.url =~ /(a\\/b)/)]");
    }

    #[test]
    fn test_bracket_path_conversion() {
        let matcher = BodyMatcher::new("$.a['b.c']", MatchingType::Regex).with_value("x");
        let path = convert_json_path_and_regex_to_a_json_path(&matcher, None).unwrap();
        assert_eq!(path, "$[?(@.a['b.c'] =~ /(x)/)]");
    }

    #[test]
    fn test_path_without_dot() {
        let matcher = BodyMatcher::new("$", MatchingType::Regex).with_value("x");
        let path = convert_json_path_and_regex_to_a_json_path(&matcher, None).unwrap();
        assert_eq!(path, "$[?(@ =~ /(x)/)]");
    }

    #[test]
    fn test_date_matchers_carry_patterns() {
        let matchers = BodyMatchers::new().by_date("$.d").by_time("$.t").by_timestamp("$.ts");
        let paths: Vec<String> = matchers
            .iter()
            .map(|m| convert_json_path_and_regex_to_a_json_path(m, None).unwrap())
            .collect();
        assert_eq!(paths[0], format!("$[?(@.d =~ /({})/)]", RegexPatterns::ANY_DATE));
        assert!(matchers.iter().all(|m| m.matching_type.is_regex_related()));
    }

    #[test]
    fn test_equality_conversion() {
        let body = json!({"a": {"n": 5, "s": "x"}});
        let number = BodyMatcher::new("$.a.n", MatchingType::Equality);
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&number, Some(&body)).unwrap(),
            "$.a[?(@.n == 5)]"
        );
        let text = BodyMatcher::new("$.a.s", MatchingType::Equality);
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&text, Some(&body)).unwrap(),
            "$.a[?(@.s == 'x')]"
        );
    }

    #[test]
    fn test_equality_requires_body_and_value() {
        let matcher = BodyMatcher::new("$.missing", MatchingType::Equality);
        assert!(matches!(
            convert_json_path_and_regex_to_a_json_path(&matcher, None),
            Err(VerifierError::BodyRequired { .. })
        ));
        assert!(matches!(
            convert_json_path_and_regex_to_a_json_path(&matcher, Some(&json!({}))),
            Err(VerifierError::MissingBodyValue { .. })
        ));
    }

    #[test]
    fn test_equality_reads_generated_value() {
        let body = json!({"n": RegexProperty::new("7").as_integer().to_marker()});
        let matcher = BodyMatcher::new("$.n", MatchingType::Equality);
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&matcher, Some(&body)).unwrap(),
            "$[?(@.n == 7)]"
        );
    }

    #[test]
    fn test_type_conversion() {
        let both = BodyMatchers::new().by_type("$.xs", Some(1), Some(3));
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&both.matchers()[0], None).unwrap(),
            "$[?(@.xs.size() >= 1 && @.xs.size() <= 3)]"
        );
        let max = BodyMatchers::new().by_type("$.a.xs", None, Some(2));
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&max.matchers()[0], None).unwrap(),
            "$.a[?(@.xs.size() <= 2)]"
        );
        let unbounded = BodyMatchers::new().by_type("$.xs", None, None);
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&unbounded.matchers()[0], None).unwrap(),
            "$.xs"
        );
    }

    #[test]
    fn test_null_matcher_returns_path() {
        let matcher = BodyMatcher::new("$.n", MatchingType::Null);
        assert_eq!(
            convert_json_path_and_regex_to_a_json_path(&matcher, None).unwrap(),
            "$.n"
        );
    }

    #[test]
    fn test_remove_matching_paths() {
        let body = json!({"id": "abc", "name": "n", "nested": {"when": "2020-01-01"}});
        let matchers = BodyMatchers::new().by_regex("$.id", "[a-z]+").by_date("$.nested.when");
        let stripped = remove_matching_json_paths(&body, &matchers);
        assert_eq!(stripped, json!({"name": "n"}));
        assert_eq!(body["id"], json!("abc"));
    }

    #[test]
    fn test_remove_cleans_empty_arrays() {
        let body = json!({"items": [{"id": 1}, {"id": 2}], "keep": true});
        let matchers = BodyMatchers::new().by_regex("$.items[*].id", "[0-9]+");
        let stripped = remove_matching_json_paths(&body, &matchers);
        assert_eq!(stripped, json!({"keep": true}));
    }

    #[test]
    fn test_remove_keeps_root_array() {
        let body = json!([{"id": 1}]);
        let matchers = BodyMatchers::new().by_regex("$[*].id", "[0-9]+");
        let stripped = remove_matching_json_paths(&body, &matchers);
        assert_eq!(stripped, json!([]));
    }

    #[test]
    fn test_remove_without_matchers_copies() {
        let body = json!({"a": 1});
        assert_eq!(remove_matching_json_paths(&body, &BodyMatchers::new()), body);
    }

    #[test]
    fn test_remove_ignores_missing_and_invalid_paths() {
        let body = json!({"a": 1});
        let matchers = BodyMatchers::new().by_regex("$.b", "x").by_regex("nope", "x");
        assert_eq!(remove_matching_json_paths(&body, &matchers), body);
    }

    #[test]
    fn test_matchers_deserialize() {
        let matchers: BodyMatchers = serde_json::from_value(json!([
            {"path": "$.id", "type": "regex", "value": "[0-9]+"},
            {"path": "$.xs", "type": "type", "min_type_occurrence": 1}
        ]))
        .unwrap();
        assert_eq!(matchers.matchers().len(), 2);
        assert_eq!(matchers.matchers()[1].matching_type, MatchingType::Type);
        assert_eq!(matchers.matchers()[1].min_type_occurrence, Some(1));
    }

    #[test]
    fn test_generated_values() {
        let body = json!({"a": [RegexPatterns::uuid().to_marker()], "b": 1});
        let generated = generated_values(&body).unwrap();
        assert_eq!(generated["b"], json!(1));
        assert_eq!(generated["a"][0].as_str().unwrap().len(), 36);
    }
}
