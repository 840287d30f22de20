//! # Error Handling
//!
//! Error types for secret reference resolution, defined with `thiserror`.
//!
//! Resolution distinguishes two failure kinds that matter to operators:
//! - **Addressing**: a reference looked like a backend reference but is missing
//!   required fields. Raised before any backend call.
//! - **Backend**: the backend client call itself failed. Propagated with the
//!   client's own message.
//!
//! Values that do not look like a reference are not errors; they pass through.

pub mod types;

pub use types::{Result, SecretEnvError};
