//! GCP Secret Manager client implementation
//!
//! Accesses secret versions by full resource name
//! (`projects/<project>/secrets/<name>/versions/<version>`).
//!
//! ## Credentials
//!
//! Application default credentials, first found wins:
//! 1. `GOOGLE_APPLICATION_CREDENTIALS` - path to a service account key or an
//!    authorized user file
//! 2. the gcloud user credentials written by
//!    `gcloud auth application-default login` (under `CLOUDSDK_CONFIG` when set)
//! 3. the GCE/GKE/Cloud Run instance metadata server
//!
//! The project is always taken from the reference itself, so one client serves
//! every GCP reference in a pass.

#[cfg(feature = "gcp")]
use super::backend::{GcpSecretsClient, SecretBackendType};
#[cfg(feature = "gcp")]
use crate::errors::{Result, SecretEnvError};
#[cfg(feature = "gcp")]
use async_trait::async_trait;
#[cfg(feature = "gcp")]
use tracing::{debug, error, info};

#[cfg(feature = "gcp")]
use google_secretmanager1::{hyper_rustls, hyper_util, SecretManager};
use std::path::{Path, PathBuf};

/// Where the GCP client takes its credentials from
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(not(feature = "gcp"), allow(dead_code))]
pub(crate) enum CredentialSource {
    /// File named by `GOOGLE_APPLICATION_CREDENTIALS`
    KeyFile(PathBuf),
    /// gcloud application default user credentials
    GcloudUser(PathBuf),
    InstanceMetadata,
}

#[cfg_attr(not(feature = "gcp"), allow(dead_code))]
pub(crate) fn credential_source<F, E>(lookup: F, exists: E) -> CredentialSource
where
    F: Fn(&str) -> Option<String>,
    E: Fn(&Path) -> bool,
{
    if let Some(path) = lookup("GOOGLE_APPLICATION_CREDENTIALS").filter(|path| !path.is_empty()) {
        return CredentialSource::KeyFile(PathBuf::from(path));
    }

    let config_dir = match lookup("CLOUDSDK_CONFIG").filter(|dir| !dir.is_empty()) {
        Some(dir) => Some(PathBuf::from(dir)),
        None if cfg!(windows) => lookup("APPDATA").map(|dir| PathBuf::from(dir).join("gcloud")),
        None => lookup("HOME").map(|dir| PathBuf::from(dir).join(".config").join("gcloud")),
    };
    match config_dir.map(|dir| dir.join("application_default_credentials.json")) {
        Some(path) if exists(&path) => CredentialSource::GcloudUser(path),
        _ => CredentialSource::InstanceMetadata,
    }
}

/// Decode a secret payload, treating absent or empty data as "no value"
#[cfg_attr(not(feature = "gcp"), allow(dead_code))]
pub(crate) fn decode_payload(
    name: &str,
    data: Option<Vec<u8>>,
) -> std::result::Result<Option<String>, std::string::FromUtf8Error> {
    match data {
        Some(bytes) if !bytes.is_empty() => String::from_utf8(bytes).map(Some).map_err(|e| {
            tracing::warn!(resource_name = %name, "Secret payload is not valid UTF-8");
            e
        }),
        _ => Ok(None),
    }
}

/// GCP Secret Manager client backed by `google-secretmanager1`
///
/// Authenticates with application default credentials (see the module docs).
#[cfg(feature = "gcp")]
pub struct GcpSdkClient {
    hub: SecretManager<
        hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>,
    >,
}

#[cfg(feature = "gcp")]
impl std::fmt::Debug for GcpSdkClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpSdkClient").field("hub", &"[SecretManager]").finish()
    }
}

#[cfg(feature = "gcp")]
impl GcpSdkClient {
    /// Create a new GCP Secret Manager client
    pub async fn new() -> Result<Self> {
        let backend = SecretBackendType::GcpSecretManager;

        // Build HTTPS client
        let client =
            hyper_util::client::legacy::Client::builder(hyper_util::rt::TokioExecutor::new())
                .build(
                    hyper_rustls::HttpsConnectorBuilder::new()
                        .with_native_roots()
                        .map_err(|e| {
                            SecretEnvError::client_init(
                                backend,
                                format!("Failed to load native TLS roots: {}", e),
                            )
                        })?
                        .https_or_http()
                        .enable_http2()
                        .build(),
                );

        let auth_error = |e: std::io::Error| {
            SecretEnvError::client_init(backend, format!("Failed to build GCP authenticator: {}", e))
        };
        let read_error = |path: &Path, e: std::io::Error| {
            SecretEnvError::client_init(
                backend,
                format!("Failed to read GCP credentials from {}: {}", path.display(), e),
            )
        };

        let source = credential_source(|name| std::env::var(name).ok(), |path| path.is_file());
        debug!(source = ?source, "Selected GCP credential source");

        let auth = match source {
            CredentialSource::KeyFile(path) => match yup_oauth2::read_service_account_key(&path).await {
                Ok(key) => yup_oauth2::ServiceAccountAuthenticator::builder(key).build().await,
                Err(key_error) => {
                    // Not a service account key; gcloud user credentials share the variable
                    let secret = yup_oauth2::read_authorized_user_secret(&path)
                        .await
                        .map_err(|_| read_error(path.as_path(), key_error))?;
                    yup_oauth2::AuthorizedUserAuthenticator::builder(secret).build().await
                }
            },
            CredentialSource::GcloudUser(path) => {
                let secret = yup_oauth2::read_authorized_user_secret(&path)
                    .await
                    .map_err(|e| read_error(path.as_path(), e))?;
                yup_oauth2::AuthorizedUserAuthenticator::builder(secret).build().await
            }
            CredentialSource::InstanceMetadata => {
                use yup_oauth2::authenticator::ApplicationDefaultCredentialsTypes;

                let opts = yup_oauth2::ApplicationDefaultCredentialsFlowOpts::default();
                match yup_oauth2::ApplicationDefaultCredentialsAuthenticator::builder(opts).await {
                    ApplicationDefaultCredentialsTypes::InstanceMetadata(auth) => auth.build().await,
                    ApplicationDefaultCredentialsTypes::ServiceAccount(auth) => auth.build().await,
                }
            }
        }
        .map_err(auth_error)?;

        let hub = SecretManager::new(client, auth);

        info!("Initialized GCP Secret Manager client");

        Ok(Self { hub })
    }
}

#[cfg(feature = "gcp")]
#[async_trait]
impl GcpSecretsClient for GcpSdkClient {
    async fn access_secret_version(&self, name: &str) -> Result<Option<String>> {
        let backend = SecretBackendType::GcpSecretManager;

        debug!(resource_name = %name, "Accessing secret version in GCP Secret Manager");

        let (_, response) =
            self.hub.projects().secrets_versions_access(name).doit().await.map_err(|e| {
                error!(
                    resource_name = %name,
                    error = %e,
                    "Failed to access secret version in GCP Secret Manager"
                );
                SecretEnvError::backend(backend, name, e.to_string())
            })?;

        let data = response.payload.and_then(|payload| payload.data);
        decode_payload(name, data)
            .map_err(|e| SecretEnvError::backend_with_source(backend, name, e))
    }
}
