//! # Observability
//!
//! Structured logging for resolution passes using the tracing ecosystem.

pub mod logging;

pub use logging::init_logging;
