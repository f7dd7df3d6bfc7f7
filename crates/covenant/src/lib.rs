//! # Covenant
//!
//! **Contract testing helpers for JSON APIs**
//!
//! - **Sample generation** – produce random strings matching a regular expression
//! - **Body assertions** – record a fluent assertion chain per leaf of an expected JSON body
//! - **Replay** – check those chains against an actual body
//! - **Test generation** – render the chains as Java or Groovy test source
//!
//! ## Quick Start
//!
//! ```
//! use covenant::prelude::*;
//! use serde_json::json;
//!
//! let mut xeger = Xeger::seeded("[A-Z]{2}[0-9]{4}", 7)?;
//! let code = xeger.generate();
//! assert_eq!(code.len(), 6);
//!
//! let expected = json!({"code": RegexProperty::new("[A-Z]{2}[0-9]{4}").to_marker()});
//! ContractVerifier::with_defaults().verify_body(&expected, &json!({"code": code}))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! regex ──► covenant-xeger ──► sample strings
//!                                   │
//! expected body ──► covenant-verifier ──► assertion chains ──► test source
//!                         │
//!                         ▼
//!                 covenant-jsonassert ──► pass / fail against actual body
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export generator types
pub use covenant_xeger as xeger;

// Re-export JSON assertion types
pub use covenant_jsonassert as jsonassert;

// Re-export verification types
pub use covenant_verifier as verifier;

// Re-export configuration types
pub use covenant_config as config;

// Re-export logging setup
pub use covenant_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use covenant::prelude::*;
/// ```
pub mod prelude {
    pub use covenant_xeger::{RegexError, Xeger};

    pub use covenant_jsonassert::{AssertionError, JsonAssertion, JsonVerifiable};

    pub use covenant_verifier::{
        BodyMatchers, ContractVerifier, DelegatingJsonVerifiable, JsonToJsonPathsConverter,
        RegexPatterns, RegexProperty, TestFramework, VerifierConfig, VerifierError,
    };

    pub use covenant_config::{ConfigLoader, CovenantConfig};
}
