//! # Configuration Management
//!
//! Settings for backend client construction (endpoint overrides, TLS, KMS key)
//! and for the `secretenv` binary itself.

pub mod settings;

pub use settings::{AwsEndpointSettings, BackendSettings};

use std::path::PathBuf;

/// Runtime options for the `secretenv` binary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Enable debug logging
    pub verbose: bool,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Resolve without writing back into the environment
    pub dry_run: bool,
    /// Explicit `.env` file; `None` loads `./.env` when present
    pub env_file: Option<PathBuf>,
}

impl RunConfig {
    /// Load the dotenv file into the process environment
    ///
    /// A missing default `.env` is not an error; a missing explicit file is.
    pub fn load_env_file(&self) -> crate::Result<()> {
        match &self.env_file {
            Some(path) => dotenvy::from_path(path).map_err(|e| {
                crate::SecretEnvError::config_with_source(
                    format!("Failed to load env file {}", path.display()),
                    Box::new(e),
                )
            }),
            None => match dotenvy::dotenv() {
                Ok(_) => Ok(()),
                Err(e) if e.not_found() => Ok(()),
                Err(e) => Err(crate::SecretEnvError::config_with_source(
                    "Failed to load .env file",
                    Box::new(e),
                )),
            },
        }
    }
}
