//! # Backend Settings
//!
//! Process-wide configuration consumed by the backend resolvers. None of it is
//! part of a reference string; it shapes how clients are built.
//!
//! Reading the settings never fails. An endpoint override is validated when a
//! client for its service is requested, so a bad `AWS_SSM_ENDPOINT_URL` only
//! fails SSM lookups and leaves every other key alone.

use crate::errors::{Result, SecretEnvError};
use crate::secrets::backends::{AwsClientOptions, SecretBackendType};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const AWS_SSM_ENDPOINT_URL: &str = "AWS_SSM_ENDPOINT_URL";
pub const AWS_SSM_ENDPOINT_TLS: &str = "AWS_SSM_ENDPOINT_TLS";
pub const AWS_SECRETS_MANAGER_ENDPOINT_URL: &str = "AWS_SECRETS_MANAGER_ENDPOINT_URL";
pub const AWS_SECRETS_MANAGER_ENDPOINT_TLS: &str = "AWS_SECRETS_MANAGER_ENDPOINT_TLS";
pub const AWS_SSM_KMS_KEY_ID: &str = "AWS_SSM_KMS_KEY_ID";

fn validate_endpoint_url(endpoint: &str) -> std::result::Result<(), ValidationError> {
    match url::Url::parse(endpoint) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => {
            let mut error = ValidationError::new("endpoint_url");
            error.message = Some(format!("'{}' is not an absolute http(s) URL", endpoint).into());
            Err(error)
        }
    }
}

/// Endpoint override for one AWS service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AwsEndpointSettings {
    /// Custom endpoint URL (e.g. a local emulator)
    #[validate(custom(function = "validate_endpoint_url"))]
    pub endpoint_url: Option<String>,

    /// `false` when the `*_ENDPOINT_TLS` variable is `0`
    pub tls_enabled: bool,
}

impl Default for AwsEndpointSettings {
    fn default() -> Self {
        Self { endpoint_url: None, tls_enabled: true }
    }
}

impl AwsEndpointSettings {
    fn from_lookup<F>(lookup: &F, url_var: &str, tls_var: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            endpoint_url: lookup(url_var).filter(|url| !url.is_empty()),
            tls_enabled: lookup(tls_var).as_deref() != Some("0"),
        }
    }

    /// Client options for a `backend` lookup in `region`
    ///
    /// An invalid endpoint override fails this lookup with a client
    /// initialization error for `backend`.
    pub fn client_options(&self, backend: SecretBackendType, region: &str) -> Result<AwsClientOptions> {
        self.validate().map_err(|e| {
            SecretEnvError::client_init(backend, format!("invalid endpoint override: {}", e))
        })?;
        Ok(AwsClientOptions {
            region: region.to_string(),
            endpoint_url: self.endpoint_url.clone(),
            tls_enabled: self.tls_enabled,
        })
    }
}

/// Settings threaded through to backend client construction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    pub ssm: AwsEndpointSettings,

    pub secrets_manager: AwsEndpointSettings,

    /// Default KMS key used when creating SSM parameters (setup tooling only)
    pub ssm_kms_key_id: Option<String>,
}

impl BackendSettings {
    /// Build settings from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            ssm: AwsEndpointSettings::from_lookup(&lookup, AWS_SSM_ENDPOINT_URL, AWS_SSM_ENDPOINT_TLS),
            secrets_manager: AwsEndpointSettings::from_lookup(
                &lookup,
                AWS_SECRETS_MANAGER_ENDPOINT_URL,
                AWS_SECRETS_MANAGER_ENDPOINT_TLS,
            ),
            ssm_kms_key_id: lookup(AWS_SSM_KMS_KEY_ID).filter(|key| !key.is_empty()),
        }
    }

    /// Options for an SSM client in `region`
    pub fn ssm_client_options(&self, region: &str) -> Result<AwsClientOptions> {
        self.ssm.client_options(SecretBackendType::AwsSsm, region)
    }

    /// Options for a Secrets Manager client in `region`
    pub fn secrets_manager_client_options(&self, region: &str) -> Result<AwsClientOptions> {
        self.secrets_manager.client_options(SecretBackendType::AwsSecretsManager, region)
    }
}
