//! Common test utilities for all integration tests.
//!
//! Provides an in-memory [`ClientFactory`] whose stores mimic the three
//! backends closely enough to exercise the resolution engine end to end.

#![allow(dead_code)]
#![allow(clippy::duplicate_mod)]

use async_trait::async_trait;
use secretenv::secrets::{
    AwsClientOptions, ClientFactory, GcpSecretsClient, SecretBackendType, SecretValueRequest,
    SecretsManagerClient, SsmClient,
};
use secretenv::{Result, SecretEnvError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const GCP_REF: &str = "gcp-secrets://projects/projectfoo/secrets/secretbar/versions/latest";
pub const SSM_ENCRYPTED_REF: &str =
    "aws-ssm://arn:aws:ssm:us-east-2:123456789:parameter/my/parameter:encrypted";
pub const SSM_UNDEFINED_REF: &str =
    "aws-ssm://arn:aws:ssm:us-east-2:123456789:parameter/my/undefined/parameter:encrypted";
pub const SM_ARN: &str = "aws-secrets://arn:aws:secretsmanager:us-east-2:123456789012:secret:";

pub const SPECIFIC_VERSION_ID: &str = "f5529425-1aa3-4f8b-85c6-7e94e559bd0d";
pub const DEV_VERSION_ID: &str = "3bb6519e-bd6e-4db6-a52e-3671015e2cda";

/// One stored version of a Secrets Manager secret
#[derive(Debug, Clone)]
pub struct MockSecretVersion {
    pub version_id: String,
    pub stages: Vec<String>,
    pub value: Option<String>,
}

impl MockSecretVersion {
    pub fn new(version_id: &str, stages: &[&str], value: &str) -> Self {
        Self {
            version_id: version_id.to_string(),
            stages: stages.iter().map(|s| s.to_string()).collect(),
            value: Some(value.to_string()),
        }
    }
}

/// A recorded SSM `GetParameter` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsmCall {
    pub region: String,
    pub endpoint: Option<String>,
    pub name: String,
    pub with_decryption: bool,
}

#[derive(Debug, Default)]
struct MockState {
    gcp: HashMap<String, Option<String>>,
    ssm: Mutex<HashMap<String, Option<String>>>,
    secrets: HashMap<String, Vec<MockSecretVersion>>,
    ssm_calls: Mutex<Vec<SsmCall>>,
    secrets_regions: Mutex<Vec<String>>,
    gcp_clients_built: AtomicUsize,
    lookups: AtomicUsize,
    latency: Duration,
}

impl MockState {
    async fn lookup_delay(&self) {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

/// In-memory stand-in for the cloud SDK clients
#[derive(Debug, Clone, Default)]
pub struct MockClientFactory {
    state: Arc<MockState>,
}

impl MockClientFactory {
    /// Factory seeded with the fixture values used across the integration tests
    pub fn seeded() -> Self {
        Self::seeded_with_latency(Duration::ZERO)
    }

    pub fn seeded_with_latency(latency: Duration) -> Self {
        let mut state = MockState { latency, ..Default::default() };

        state.gcp.insert(
            "projects/projectfoo/secrets/secretbar/versions/latest".into(),
            Some("somesecretvalue".into()),
        );
        state.gcp.insert("projects/projectfoo/secrets/empty/versions/1".into(), Some(String::new()));
        state.gcp.insert("projects/projectfoo/secrets/nopayload/versions/2".into(), None);

        {
            let ssm = state.ssm.get_mut().unwrap();
            ssm.insert("my/parameter".into(), Some("my-value".into()));
            ssm.insert("my/undefined/parameter".into(), None);
        }

        state.secrets.insert(
            "my-simple-secret".into(),
            vec![MockSecretVersion::new(
                "0d3b3c4e-0000-4000-8000-000000000001",
                &["AWSCURRENT"],
                "my-simple-secret-value",
            )],
        );
        state.secrets.insert(
            "my/Complex/Secret@".into(),
            vec![
                MockSecretVersion::new(
                    "0d3b3c4e-0000-4000-8000-000000000002",
                    &["AWSCURRENT"],
                    "my-complex-secret-value",
                ),
                MockSecretVersion::new(
                    "0d3b3c4e-0000-4000-8000-000000000003",
                    &["STAGING"],
                    "my-complex-secret-value-staging",
                ),
                MockSecretVersion::new(SPECIFIC_VERSION_ID, &[], "my-complex-secret-value-specificid"),
                MockSecretVersion::new(DEV_VERSION_ID, &["DEV"], "my-complex-secret-value-both"),
            ],
        );

        Self { state: Arc::new(state) }
    }

    pub fn ssm_calls(&self) -> Vec<SsmCall> {
        self.state.ssm_calls.lock().unwrap().clone()
    }

    pub fn secrets_regions(&self) -> Vec<String> {
        self.state.secrets_regions.lock().unwrap().clone()
    }

    pub fn gcp_clients_built(&self) -> usize {
        self.state.gcp_clients_built.load(Ordering::SeqCst)
    }

    pub fn lookups(&self) -> usize {
        self.state.lookups.load(Ordering::SeqCst)
    }

    pub fn ssm_value(&self, name: &str) -> Option<Option<String>> {
        self.state.ssm.lock().unwrap().get(name).cloned()
    }
}

struct MockGcp(Arc<MockState>);

#[async_trait]
impl GcpSecretsClient for MockGcp {
    async fn access_secret_version(&self, name: &str) -> Result<Option<String>> {
        self.0.lookup_delay().await;
        self.0.gcp.get(name).cloned().ok_or_else(|| {
            SecretEnvError::backend(
                SecretBackendType::GcpSecretManager,
                name,
                format!("NOT_FOUND: Secret Version [{}] not found", name),
            )
        })
    }
}

struct MockSsm(Arc<MockState>, AwsClientOptions);

#[async_trait]
impl SsmClient for MockSsm {
    async fn get_parameter(&self, name: &str, with_decryption: bool) -> Result<Option<String>> {
        self.0.lookup_delay().await;
        self.0.ssm_calls.lock().unwrap().push(SsmCall {
            region: self.1.region.clone(),
            endpoint: self.1.effective_endpoint(),
            name: name.to_string(),
            with_decryption,
        });
        self.0.ssm.lock().unwrap().get(name).cloned().ok_or_else(|| {
            SecretEnvError::backend(SecretBackendType::AwsSsm, name, "ParameterNotFound")
        })
    }

    async fn put_parameter(&self, name: &str, value: &str, _kms_key_id: Option<&str>) -> Result<()> {
        self.0.ssm.lock().unwrap().insert(name.to_string(), Some(value.to_string()));
        Ok(())
    }
}

struct MockSecretsManager(Arc<MockState>, AwsClientOptions);

#[async_trait]
impl SecretsManagerClient for MockSecretsManager {
    async fn get_secret_value(&self, request: &SecretValueRequest) -> Result<Option<String>> {
        self.0.lookup_delay().await;
        self.0.secrets_regions.lock().unwrap().push(self.1.region.clone());

        let backend = SecretBackendType::AwsSecretsManager;
        let versions = self.0.secrets.get(&request.secret_id).ok_or_else(|| {
            SecretEnvError::backend(backend, &request.secret_id, "ResourceNotFoundException")
        })?;

        let by_stage = |stage: &str| versions.iter().find(|v| v.stages.iter().any(|s| s == stage));
        let by_id = |id: &str| versions.iter().find(|v| v.version_id == id);

        let version = match (request.version_stage.as_deref(), request.version_id.as_deref()) {
            (None, None) => by_stage("AWSCURRENT"),
            (Some(stage), None) => by_stage(stage),
            (None, Some(id)) => by_id(id),
            (Some(stage), Some(id)) => match (by_stage(stage), by_id(id)) {
                (Some(a), Some(b)) if a.version_id == b.version_id => Some(a),
                (Some(_), Some(_)) => {
                    return Err(SecretEnvError::backend(
                        backend,
                        &request.secret_id,
                        format!(
                            "InvalidRequestException: version stage {} does not label version {}",
                            stage, id
                        ),
                    ))
                }
                _ => None,
            },
        };

        version.map(|v| v.value.clone()).ok_or_else(|| {
            SecretEnvError::backend(backend, &request.secret_id, "ResourceNotFoundException")
        })
    }
}

#[async_trait]
impl ClientFactory for MockClientFactory {
    async fn gcp_client(&self) -> Result<Arc<dyn GcpSecretsClient>> {
        self.state.gcp_clients_built.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockGcp(self.state.clone())))
    }

    async fn ssm_client(&self, options: &AwsClientOptions) -> Result<Arc<dyn SsmClient>> {
        Ok(Arc::new(MockSsm(self.state.clone(), options.clone())))
    }

    async fn secrets_manager_client(
        &self,
        options: &AwsClientOptions,
    ) -> Result<Arc<dyn SecretsManagerClient>> {
        Ok(Arc::new(MockSecretsManager(self.state.clone(), options.clone())))
    }
}

/// Secrets Manager reference for `secret_id` with an optional suffix
pub fn sm_ref(secret_id: &str, suffix: &str) -> String {
    format!("{}{}{}", SM_ARN, secret_id, suffix)
}
