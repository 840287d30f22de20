//! # Error Types
//!
//! Error taxonomy for secret reference resolution using `thiserror`.

use crate::secrets::SecretBackendType;

/// Custom result type for secretenv operations
pub type Result<T> = std::result::Result<T, SecretEnvError>;

/// Main error type for secret reference resolution
#[derive(thiserror::Error, Debug)]
pub enum SecretEnvError {
    /// A reference matched a backend's syntax but lacks required fields
    #[error("{} missing required values: {}", .backend.label(), .missing.join(", "))]
    Addressing { backend: SecretBackendType, missing: Vec<&'static str> },

    /// The backend lookup itself failed
    #[error("{} lookup failed for '{target}': {message}", .backend.label())]
    Backend {
        backend: SecretBackendType,
        target: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A backend client could not be constructed
    #[error("{} client initialization failed: {message}", .backend.label())]
    ClientInit { backend: SecretBackendType, message: String },

    /// A resolved entry cannot be written into the environment
    #[error("Cannot write environment variable '{key}': {reason}")]
    Commit { key: String, reason: &'static str },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal errors (a lookup task panicked or was cancelled)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl SecretEnvError {
    /// Create an addressing error listing every missing field
    pub fn addressing(backend: SecretBackendType, missing: Vec<&'static str>) -> Self {
        Self::Addressing { backend, missing }
    }

    /// Create a backend error without an underlying source
    pub fn backend<T: Into<String>, M: Into<String>>(
        backend: SecretBackendType,
        target: T,
        message: M,
    ) -> Self {
        Self::Backend { backend, target: target.into(), message: message.into(), source: None }
    }

    /// Create a backend error wrapping the client's failure
    pub fn backend_with_source<T, E>(backend: SecretBackendType, target: T, source: E) -> Self
    where
        T: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Backend {
            backend,
            target: target.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a client initialization error
    pub fn client_init<S: Into<String>>(backend: SecretBackendType, message: S) -> Self {
        Self::ClientInit { backend, message: message.into() }
    }

    /// Create a commit error for `key`
    pub fn commit<K: Into<String>>(key: K, reason: &'static str) -> Self {
        Self::Commit { key: key.into(), reason }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S: Into<String>>(
        message: S,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Config { message: message.into(), source: Some(source) }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal { message: message.into() }
    }

    /// True when the reference itself was malformed
    pub fn is_addressing(&self) -> bool {
        matches!(self, SecretEnvError::Addressing { .. })
    }

    /// True when the failure is scoped to a backend lookup.
    ///
    /// Covers both a failed call and a client that could not be built for it;
    /// see [`Self::is_client_init`] to tell them apart.
    pub fn is_backend(&self) -> bool {
        matches!(self, SecretEnvError::Backend { .. } | SecretEnvError::ClientInit { .. })
    }

    /// True when the backend client could not be constructed
    pub fn is_client_init(&self) -> bool {
        matches!(self, SecretEnvError::ClientInit { .. })
    }

    /// The backend involved in the failure, if any
    pub fn backend_type(&self) -> Option<SecretBackendType> {
        match self {
            SecretEnvError::Addressing { backend, .. }
            | SecretEnvError::Backend { backend, .. }
            | SecretEnvError::ClientInit { backend, .. } => Some(*backend),
            SecretEnvError::Commit { .. }
            | SecretEnvError::Config { .. }
            | SecretEnvError::Internal { .. } => None,
        }
    }
}

impl From<tokio::task::JoinError> for SecretEnvError {
    fn from(error: tokio::task::JoinError) -> Self {
        if error.is_panic() {
            Self::internal("secret lookup task panicked")
        } else {
            Self::internal("secret lookup task was cancelled")
        }
    }
}
