//! Production client factory
//!
//! Builds SDK-backed clients for each backend. The GCP client is created
//! lazily on first use and shared; AWS clients are built fresh for every lookup
//! because each reference carries its own region.

use super::backend::{
    AwsClientOptions, ClientFactory, GcpSecretsClient, SecretsManagerClient, SsmClient,
};
#[cfg(not(all(feature = "gcp", feature = "aws")))]
use super::backend::SecretBackendType;
use crate::errors::Result;
#[cfg(not(all(feature = "gcp", feature = "aws")))]
use crate::errors::SecretEnvError;
use async_trait::async_trait;
use std::sync::Arc;

/// Client factory backed by the cloud provider SDKs
#[derive(Default)]
pub struct SdkClientFactory {
    #[cfg(feature = "gcp")]
    gcp: tokio::sync::OnceCell<Arc<super::gcp::GcpSdkClient>>,
}

impl std::fmt::Debug for SdkClientFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdkClientFactory")
            .field("gcp", &cfg!(feature = "gcp"))
            .field("aws", &cfg!(feature = "aws"))
            .finish()
    }
}

impl SdkClientFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(not(all(feature = "gcp", feature = "aws")))]
fn feature_disabled(backend: SecretBackendType) -> SecretEnvError {
    SecretEnvError::client_init(
        backend,
        format!("secretenv was built without the '{}' feature", backend.feature()),
    )
}

#[async_trait]
impl ClientFactory for SdkClientFactory {
    #[cfg(feature = "gcp")]
    async fn gcp_client(&self) -> Result<Arc<dyn GcpSecretsClient>> {
        let client = self
            .gcp
            .get_or_try_init(|| async { super::gcp::GcpSdkClient::new().await.map(Arc::new) })
            .await?;
        Ok(client.clone())
    }

    #[cfg(not(feature = "gcp"))]
    async fn gcp_client(&self) -> Result<Arc<dyn GcpSecretsClient>> {
        Err(feature_disabled(SecretBackendType::GcpSecretManager))
    }

    #[cfg(feature = "aws")]
    async fn ssm_client(&self, options: &AwsClientOptions) -> Result<Arc<dyn SsmClient>> {
        Ok(Arc::new(super::aws::SsmSdkClient::new(options).await))
    }

    #[cfg(not(feature = "aws"))]
    async fn ssm_client(&self, _options: &AwsClientOptions) -> Result<Arc<dyn SsmClient>> {
        Err(feature_disabled(SecretBackendType::AwsSsm))
    }

    #[cfg(feature = "aws")]
    async fn secrets_manager_client(
        &self,
        options: &AwsClientOptions,
    ) -> Result<Arc<dyn SecretsManagerClient>> {
        Ok(Arc::new(super::aws::SecretsManagerSdkClient::new(options).await))
    }

    #[cfg(not(feature = "aws"))]
    async fn secrets_manager_client(
        &self,
        _options: &AwsClientOptions,
    ) -> Result<Arc<dyn SecretsManagerClient>> {
        Err(feature_disabled(SecretBackendType::AwsSecretsManager))
    }
}
