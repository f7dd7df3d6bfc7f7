//! Covenant JSON Assert - JSON path evaluation and fluent assertions
//!
//! This crate builds JSON paths step by step and checks them against a
//! parsed document. It is the assertion engine that recorded verification
//! chains are replayed against.
//!
//! # Overview
//!
//! - [`path`] parses and evaluates a JSON path dialect with child, index,
//!   wildcard, descendant and filter segments (`==`, `!=`, `<`, `<=`, `>`,
//!   `>=`, `=~ /regex/`, `&&`, `||`, `.size()`).
//! - [`JsonVerifiable`] is the fluent navigation and check interface.
//! - [`JsonAsserter`] implements it on top of the evaluator.
//!
//! # Example
//!
//! ```
//! use covenant_jsonassert::{JsonAssertion, JsonVerifiable};
//!
//! let asserter = JsonAssertion::assert_that_json(r#"{"items": [{"id": 1}, {"id": 2}]}"#)?;
//! let checked = asserter.array("items").field("id").is_equal_to(2)?;
//! assert_eq!(checked.json_path(), "$.items[*][?(@.id == 2)]");
//! # Ok::<(), covenant_jsonassert::AssertionError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod asserter;
pub mod error;
pub mod path;
pub mod verifiable;

// Re-exports for convenience
pub use asserter::{filter_literal, JsonAsserter, JsonAssertion};
pub use error::{AssertionError, AssertionResult, PathError, PathResult};
pub use path::{delete, read_element, JsonPath, Step};
pub use verifiable::JsonVerifiable;
