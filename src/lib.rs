//! # secretenv
//!
//! Resolves secret references held in environment variables into the secret
//! material they point to, before an application starts.
//!
//! ## Architecture
//!
//! ```text
//! Environment Snapshot → Resolver Registry → Backend Resolvers → Atomic Commit
//!                             ↓                     ↓
//!                      Reference Grammar     Backend Clients (GCP / AWS SDKs)
//! ```
//!
//! ## Core Components
//!
//! - **Reference Grammar**: one fixed pattern per backend
//! - **Backend Resolvers**: GCP Secret Manager, AWS SSM Parameter Store, AWS Secrets Manager
//! - **Resolver Registry**: ordered classification, first match wins
//! - **Resolution Engine**: concurrent lookups with an all-or-nothing commit
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> secretenv::Result<()> {
//!     let report = secretenv::resolve_env().await?;
//!     tracing::info!(resolved = report.resolved_count(), "secrets ready");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod observability;
pub mod secrets;

// Re-export commonly used types and traits
pub use config::{BackendSettings, RunConfig};
pub use errors::{Result, SecretEnvError};
pub use secrets::{resolve_env, ResolutionReport, SecretEnv};

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
