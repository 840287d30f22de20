//! Backend resolvers
//!
//! One resolver per backend. A resolver takes the raw [`ReferenceMatch`],
//! validates the fields its backend needs, asks the [`ClientFactory`] for a
//! client and performs exactly one lookup. Backend failures are propagated
//! untouched; the resolver never retries.

use super::backends::{ClientFactory, SecretBackendType};
use super::grammar::ReferenceMatch;
use super::reference::{AwsSecretRef, GcpSecretRef, SsmParameterRef};
use super::types::SecretString;
use crate::config::BackendSettings;
use crate::errors::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Resolves one matched reference to its secret value
///
/// `Ok(None)` means the backend holds no value for the target, which is
/// distinct from a failed lookup.
#[async_trait]
pub trait SecretResolver: Send + Sync + std::fmt::Debug {
    fn backend_type(&self) -> SecretBackendType;

    async fn resolve(
        &self,
        reference: &ReferenceMatch,
        settings: &BackendSettings,
    ) -> Result<Option<SecretString>>;
}

/// GCP Secret Manager resolver
#[derive(Debug, Clone)]
pub struct GcpSecretResolver {
    clients: Arc<dyn ClientFactory>,
}

impl GcpSecretResolver {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl SecretResolver for GcpSecretResolver {
    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::GcpSecretManager
    }

    async fn resolve(
        &self,
        reference: &ReferenceMatch,
        _settings: &BackendSettings,
    ) -> Result<Option<SecretString>> {
        let secret = GcpSecretRef::from_match(reference)?;
        let resource_name = secret.resource_name();

        debug!(resource_name = %resource_name, "Resolving GCP secret version");

        let client = self.clients.gcp_client().await?;
        let payload = client.access_secret_version(&resource_name).await?;

        // No fallback default: an empty payload is "no value", not ""
        Ok(payload.filter(|value| !value.is_empty()).map(SecretString::new))
    }
}

/// AWS SSM Parameter Store resolver
#[derive(Debug, Clone)]
pub struct SsmParameterResolver {
    clients: Arc<dyn ClientFactory>,
}

impl SsmParameterResolver {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl SecretResolver for SsmParameterResolver {
    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::AwsSsm
    }

    async fn resolve(
        &self,
        reference: &ReferenceMatch,
        settings: &BackendSettings,
    ) -> Result<Option<SecretString>> {
        let parameter = SsmParameterRef::from_match(reference)?;

        debug!(
            parameter = %parameter.parameter_id,
            region = %parameter.region,
            encrypted = parameter.encrypted,
            "Resolving AWS SSM parameter"
        );

        let options = settings.ssm_client_options(&parameter.region)?;
        let client = self.clients.ssm_client(&options).await?;
        let value = client.get_parameter(&parameter.parameter_id, parameter.encrypted).await?;

        Ok(value.map(SecretString::new))
    }
}

/// AWS Secrets Manager resolver
#[derive(Debug, Clone)]
pub struct SecretsManagerResolver {
    clients: Arc<dyn ClientFactory>,
}

impl SecretsManagerResolver {
    pub fn new(clients: Arc<dyn ClientFactory>) -> Self {
        Self { clients }
    }
}

#[async_trait]
impl SecretResolver for SecretsManagerResolver {
    fn backend_type(&self) -> SecretBackendType {
        SecretBackendType::AwsSecretsManager
    }

    async fn resolve(
        &self,
        reference: &ReferenceMatch,
        settings: &BackendSettings,
    ) -> Result<Option<SecretString>> {
        let secret = AwsSecretRef::from_match(reference)?;

        debug!(
            secret_id = %secret.secret_id,
            region = %secret.region,
            version_stage = ?secret.version_stage,
            version_id = ?secret.version_id,
            "Resolving AWS Secrets Manager secret"
        );

        let options = settings.secrets_manager_client_options(&secret.region)?;
        let client = self.clients.secrets_manager_client(&options).await?;
        let value = client.get_secret_value(&secret.to_request()).await?;

        Ok(value.map(SecretString::new))
    }
}
