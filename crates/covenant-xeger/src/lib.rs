//! Covenant Xeger - random text from regular expressions
//!
//! Xeger is the inverse of a regex matcher: given an expression it produces
//! strings the expression matches. The expression is compiled into a
//! deterministic automaton and a random walk from the initial state emits one
//! character per transition until it chooses to stop on an accepting state.
//!
//! # Architecture
//!
//! ```text
//!   "[ab]{4,6}c"
//!        │ translate \d \w \s
//!        ▼
//!   ┌──────────┐  Node   ┌─────────────┐  DFA   ┌──────────┐
//!   │  parser  │────────►│  automaton  │───────►│  Xeger   │──► "abbac"
//!   └──────────┘         │ NFA ► DFA   │        │ (walk)   │
//!                        │ ► prune     │        └──────────┘
//!                        └─────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use covenant_xeger::Xeger;
//!
//! let mut xeger = Xeger::seeded("\\d{3}-\\d{4}", 7)?;
//! let phone = xeger.generate();
//! assert_eq!(phone.len(), 8);
//! # Ok::<(), covenant_xeger::RegexError>(())
//! ```
//!
//! Walks are bounded by an iteration limit (200 characters by default, set
//! per generator with [`Xeger::with_iteration_limit`]) so unbounded
//! repetitions always terminate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod automaton;
pub mod charset;
pub mod error;
pub mod parser;
pub mod xeger;

// Re-exports for convenience
pub use automaton::{Automaton, State, Transition};
pub use charset::CharSet;
pub use error::{RegexError, RegexResult};
pub use xeger::{random_int, translate_shorthand, Xeger, DEFAULT_ITERATION_LIMIT};
