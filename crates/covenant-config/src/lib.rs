//! Layered configuration for Covenant tools.
//!
//! This crate loads a [`CovenantConfig`] with support for:
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Configuration File Format
//!
//! ```toml
//! [generator]
//! iteration_limit = 200
//! seed = 42
//!
//! [verifier]
//! assert_json_size = false
//! bracket_notation = true
//! include_empty_check = false
//! test_framework = "java"
//!
//! [logging]
//! enabled = true
//! level = "warn"
//! format = "compact"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Every value can be overridden with `PREFIX__SECTION__KEY`:
//!
//! - `COVENANT__GENERATOR__SEED=42`
//! - `COVENANT__VERIFIER__TEST_FRAMEWORK=groovy`
//! - `COVENANT__LOGGING__LEVEL=debug`

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod loader;

pub use config::{CovenantConfig, GeneratorConfig, LoggingConfig};
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX};
