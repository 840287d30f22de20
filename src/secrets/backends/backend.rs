//! Secret backend types and client contracts
//!
//! Defines the narrow "fetch-by-key" interface each secret store exposes, and the
//! factory that builds region- and endpoint-scoped clients on demand.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Type of secret backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretBackendType {
    /// GCP Secret Manager
    GcpSecretManager,
    /// AWS Systems Manager Parameter Store
    AwsSsm,
    /// AWS Secrets Manager
    AwsSecretsManager,
}

impl SecretBackendType {
    /// Stable identifier used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GcpSecretManager => "gcp_secret_manager",
            Self::AwsSsm => "aws_ssm",
            Self::AwsSecretsManager => "aws_secrets_manager",
        }
    }

    /// Human-readable label used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            Self::GcpSecretManager => "gcp secret",
            Self::AwsSsm => "aws ssm parameter",
            Self::AwsSecretsManager => "aws secrets manager",
        }
    }

    /// Cargo feature that compiles the backend's SDK client
    pub fn feature(&self) -> &'static str {
        match self {
            Self::GcpSecretManager => "gcp",
            Self::AwsSsm | Self::AwsSecretsManager => "aws",
        }
    }
}

impl FromStr for SecretBackendType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "gcp_secret_manager" => Ok(Self::GcpSecretManager),
            "aws_ssm" => Ok(Self::AwsSsm),
            "aws_secrets_manager" => Ok(Self::AwsSecretsManager),
            _ => Err(format!("Unknown secret backend type: {}", s)),
        }
    }
}

impl fmt::Display for SecretBackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// GCP Secret Manager client contract
#[async_trait]
pub trait GcpSecretsClient: Send + Sync {
    /// Access a secret version by full resource name
    /// (`projects/<p>/secrets/<s>/versions/<v>`).
    ///
    /// Returns `Ok(None)` when the version carries no payload.
    async fn access_secret_version(&self, name: &str) -> Result<Option<String>>;
}

/// AWS SSM Parameter Store client contract
#[async_trait]
pub trait SsmClient: Send + Sync {
    /// Fetch a parameter value, optionally asking the service to decrypt it.
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> Result<Option<String>>;

    /// Create or overwrite a `SecureString` parameter.
    ///
    /// Setup tooling only; resolution never writes.
    async fn put_parameter(&self, name: &str, value: &str, kms_key_id: Option<&str>) -> Result<()>;
}

/// Lookup request for AWS Secrets Manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretValueRequest {
    pub secret_id: String,
    pub version_stage: Option<String>,
    pub version_id: Option<String>,
}

/// AWS Secrets Manager client contract
#[async_trait]
pub trait SecretsManagerClient: Send + Sync {
    /// Fetch the `SecretString` of a secret.
    ///
    /// Stage and id are independent filters; the service rejects a pair that
    /// points to different versions.
    async fn get_secret_value(&self, request: &SecretValueRequest) -> Result<Option<String>>;
}

/// Options for building a region-scoped AWS client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsClientOptions {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub tls_enabled: bool,
}

impl AwsClientOptions {
    pub fn new(region: impl Into<String>) -> Self {
        Self { region: region.into(), endpoint_url: None, tls_enabled: true }
    }

    /// Endpoint to hand to the SDK, with the scheme downgraded when TLS is off
    ///
    /// `None` without an override, whatever `tls_enabled` says: the SDK then
    /// resolves its own HTTPS endpoint for the region.
    pub fn effective_endpoint(&self) -> Option<String> {
        let endpoint = self.endpoint_url.as_deref()?;
        if self.tls_enabled {
            return Some(endpoint.to_string());
        }
        match endpoint.strip_prefix("https://") {
            Some(rest) => Some(format!("http://{}", rest)),
            None => Some(endpoint.to_string()),
        }
    }
}

/// Builds backend clients for resolvers
///
/// AWS clients are requested per lookup and scoped to the reference's region;
/// the GCP client is region-free.
#[async_trait]
pub trait ClientFactory: Send + Sync + fmt::Debug {
    async fn gcp_client(&self) -> Result<Arc<dyn GcpSecretsClient>>;

    async fn ssm_client(&self, options: &AwsClientOptions) -> Result<Arc<dyn SsmClient>>;

    async fn secrets_manager_client(
        &self,
        options: &AwsClientOptions,
    ) -> Result<Arc<dyn SecretsManagerClient>>;
}
