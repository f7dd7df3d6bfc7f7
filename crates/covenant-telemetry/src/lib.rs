//! Logging setup for Covenant tools.
//!
//! Library crates in the workspace only emit `tracing` events. Binaries call
//! [`init_logging`] once at startup to route those events to stderr.
//!
//! # Architecture
//!
//! ```text
//!  covenant-xeger ─┐
//!  covenant-verifier ─┼──► tracing events ──► EnvFilter ──► fmt layer ──► stderr
//!  covenant-cli ───┘                                    (json | pretty | compact)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use covenant_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::default())?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;

// Re-exports for convenience
pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, is_known_level, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
