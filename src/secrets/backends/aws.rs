//! AWS SSM Parameter Store and Secrets Manager client implementations
//!
//! Clients are built per lookup and scoped to the region named in the
//! reference. Credentials come from the standard AWS provider chain
//! (environment, profile, instance metadata).
//!
//! ## Endpoint overrides
//!
//! - `AWS_SSM_ENDPOINT_URL` / `AWS_SSM_ENDPOINT_TLS`
//! - `AWS_SECRETS_MANAGER_ENDPOINT_URL` / `AWS_SECRETS_MANAGER_ENDPOINT_TLS`
//!
//! A TLS value of `0` downgrades the override endpoint to plain HTTP, which is
//! how local emulators such as LocalStack are reached. Without an override URL
//! the TLS variable is ignored and the SDK's regional HTTPS endpoint is used;
//! the public AWS endpoints are never contacted over plain HTTP.

use super::backend::{
    AwsClientOptions, SecretBackendType, SecretValueRequest, SecretsManagerClient, SsmClient,
};
use crate::errors::{Result, SecretEnvError};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, error, info};

async fn load_sdk_config(options: &AwsClientOptions) -> aws_config::SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(options.region.clone()))
        .load()
        .await
}

/// SSM Parameter Store client backed by `aws-sdk-ssm`
#[derive(Debug, Clone)]
pub struct SsmSdkClient {
    client: aws_sdk_ssm::Client,
    region: String,
}

impl SsmSdkClient {
    /// Create a region-scoped SSM client
    pub async fn new(options: &AwsClientOptions) -> Self {
        let sdk_config = load_sdk_config(options).await;
        let mut builder = aws_sdk_ssm::config::Builder::from(&sdk_config);
        if let Some(endpoint) = options.effective_endpoint() {
            debug!(endpoint = %endpoint, "Using custom SSM endpoint");
            builder = builder.endpoint_url(endpoint);
        }

        info!(region = %options.region, "Initialized AWS SSM client");

        Self { client: aws_sdk_ssm::Client::from_conf(builder.build()), region: options.region.clone() }
    }
}

#[async_trait]
impl SsmClient for SsmSdkClient {
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> Result<Option<String>> {
        debug!(
            parameter = %name,
            region = %self.region,
            with_decryption,
            "Fetching parameter from AWS SSM"
        );

        let output = self
            .client
            .get_parameter()
            .name(name)
            .with_decryption(with_decryption)
            .send()
            .await
            .map_err(|e| {
                let message = aws_sdk_ssm::error::DisplayErrorContext(&e).to_string();
                error!(parameter = %name, region = %self.region, error = %message, "SSM lookup failed");
                SecretEnvError::backend(SecretBackendType::AwsSsm, name, message)
            })?;

        Ok(output.parameter().and_then(|parameter| parameter.value()).map(str::to_owned))
    }

    async fn put_parameter(&self, name: &str, value: &str, kms_key_id: Option<&str>) -> Result<()> {
        debug!(parameter = %name, region = %self.region, "Writing SecureString parameter to AWS SSM");

        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(aws_sdk_ssm::types::ParameterType::SecureString)
            .overwrite(true)
            .set_key_id(kms_key_id.map(str::to_owned))
            .send()
            .await
            .map_err(|e| {
                SecretEnvError::backend(
                    SecretBackendType::AwsSsm,
                    name,
                    aws_sdk_ssm::error::DisplayErrorContext(&e).to_string(),
                )
            })?;

        Ok(())
    }
}

/// Secrets Manager client backed by `aws-sdk-secretsmanager`
#[derive(Debug, Clone)]
pub struct SecretsManagerSdkClient {
    client: aws_sdk_secretsmanager::Client,
    region: String,
}

impl SecretsManagerSdkClient {
    /// Create a region-scoped Secrets Manager client
    pub async fn new(options: &AwsClientOptions) -> Self {
        let sdk_config = load_sdk_config(options).await;
        let mut builder = aws_sdk_secretsmanager::config::Builder::from(&sdk_config);
        if let Some(endpoint) = options.effective_endpoint() {
            debug!(endpoint = %endpoint, "Using custom Secrets Manager endpoint");
            builder = builder.endpoint_url(endpoint);
        }

        info!(region = %options.region, "Initialized AWS Secrets Manager client");

        Self {
            client: aws_sdk_secretsmanager::Client::from_conf(builder.build()),
            region: options.region.clone(),
        }
    }
}

#[async_trait]
impl SecretsManagerClient for SecretsManagerSdkClient {
    async fn get_secret_value(&self, request: &SecretValueRequest) -> Result<Option<String>> {
        debug!(
            secret_id = %request.secret_id,
            region = %self.region,
            version_stage = ?request.version_stage,
            version_id = ?request.version_id,
            "Fetching secret from AWS Secrets Manager"
        );

        let output = self
            .client
            .get_secret_value()
            .secret_id(&request.secret_id)
            .set_version_stage(request.version_stage.clone())
            .set_version_id(request.version_id.clone())
            .send()
            .await
            .map_err(|e| {
                let message = aws_sdk_secretsmanager::error::DisplayErrorContext(&e).to_string();
                error!(
                    secret_id = %request.secret_id,
                    region = %self.region,
                    error = %message,
                    "Secrets Manager lookup failed"
                );
                SecretEnvError::backend(
                    SecretBackendType::AwsSecretsManager,
                    request.secret_id.as_str(),
                    message,
                )
            })?;

        Ok(output.secret_string().map(str::to_owned))
    }
}
