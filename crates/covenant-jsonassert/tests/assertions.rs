//! Integration tests for fluent JSON assertions.

use covenant_jsonassert::{
    delete, read_element, AssertionError, JsonAssertion, JsonPath, JsonVerifiable,
};
use proptest::prelude::*;
use serde::Deserialize;
use serde_json::{json, Value};

fn order() -> Value {
    json!({
        "id": "ord-17",
        "total": 41.5,
        "paid": false,
        "customer": {"name": "Grace Hopper", "email": "grace@navy.mil"},
        "lines": [
            {"sku": "KB-1", "qty": 2, "tags": ["usb", "wired"]},
            {"sku": "MS-9", "qty": 1, "tags": []}
        ],
        "notes": null
    })
}

#[test]
fn test_navigates_nested_objects_and_arrays() {
    let root = JsonAssertion::assert_that(order());
    assert!(root.field("customer").field("name").is_equal_to("Grace Hopper").is_ok());
    assert!(root.array("lines").field("sku").is_equal_to("MS-9").is_ok());
    assert!(root.array("lines").field("qty").is_equal_to(2).is_ok());
    assert!(root.field("paid").is_equal_to(false).is_ok());
    assert!(root.field("notes").is_null().is_ok());
}

#[test]
fn test_primitive_values_inside_nested_arrays() {
    let root = JsonAssertion::assert_that(order());
    let tags = root.array("lines").array("tags").array_field();
    assert!(tags.is_equal_to("wired").is_ok());
    assert!(tags.is_equal_to("wireless").is_err());
}

#[test]
fn test_regex_checks() {
    let root = JsonAssertion::assert_that(order());
    assert!(root.field("id").matches("ord-[0-9]+").is_ok());
    assert!(root.field("id").matches("[0-9]+").is_err());
    assert!(root
        .field("customer")
        .field("email")
        .matches("[a-z]+@[a-z.]+")
        .is_ok());
}

#[test]
fn test_failure_reports_path_and_document() {
    let err = JsonAssertion::assert_that(json!({"a": 1}))
        .field("a")
        .is_equal_to(2)
        .unwrap_err();
    match err {
        AssertionError::NoMatch { path, json } => {
            assert_eq!(path, "$[?(@.a == 2)]");
            assert_eq!(json, "{\"a\":1}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_read_typed_value() {
    #[derive(Debug, Deserialize, PartialEq)]
    struct Customer {
        name: String,
        email: String,
    }

    let customer: Customer = JsonAssertion::assert_that(order())
        .field("customer")
        .read()
        .unwrap();
    assert_eq!(
        customer,
        Customer {
            name: "Grace Hopper".to_string(),
            email: "grace@navy.mil".to_string(),
        }
    );
}

#[test]
fn test_delete_then_read() {
    let mut doc = order();
    assert_eq!(delete(&mut doc, "$.lines[*].tags").unwrap(), 2);
    assert!(read_element(&doc, "$.lines[0].tags").is_err());
    assert_eq!(read_element(&doc, "$.lines[0].sku").unwrap(), json!("KB-1"));
}

#[test]
fn test_path_display_round_trips_source() {
    let text = "$.lines[?(@.qty >= 1 && @.sku =~ /[A-Z]{2}-\\d/)].sku";
    let path: JsonPath = text.parse().unwrap();
    assert_eq!(path.to_string(), text);
    assert_eq!(path.evaluate(&order()).len(), 2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_every_string_field_asserts_itself(
        key in "[a-z]{1,8}",
        value in "[ -~]{0,16}",
    ) {
        let root = JsonAssertion::assert_that(json!({ key.clone(): value.clone() }));
        let field = format!("['{key}']");
        prop_assert!(root.field(&field).is_equal_to(value.as_str()).is_ok());
    }

    #[test]
    fn prop_integer_arrays_contain_their_elements(values in prop::collection::vec(-1000i64..1000, 1..8)) {
        let root = JsonAssertion::assert_that(json!({ "xs": values.clone() }));
        for v in &values {
            prop_assert!(root.array("xs").array_field().is_equal_to(*v).is_ok());
        }
        prop_assert!(root.field("xs").has_size(values.len()).is_ok());
    }
}
