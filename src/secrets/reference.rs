//! Typed secret references
//!
//! Converts a [`ReferenceMatch`] into the addressing fields one backend needs.
//! Every required slot is checked; when any are absent the conversion fails
//! with an addressing error that lists all of them in declaration order.

use super::backends::{SecretBackendType, SecretValueRequest};
use super::grammar::{
    ReferenceMatch, Slot, GCP_PROJECT, GCP_SECRET_NAME, GCP_VERSION, SM_REGION, SM_SECRET_ID,
    SM_VERSION_ID, SM_VERSION_STAGE, SSM_ENCRYPTED, SSM_PARAMETER_ID, SSM_REGION,
};
use crate::errors::{Result, SecretEnvError};

/// Addressing error naming every absent slot, in declaration order
fn missing_fields(backend: SecretBackendType, m: &ReferenceMatch, slots: &[Slot]) -> SecretEnvError {
    let missing = slots.iter().filter(|slot| !m.contains(slot)).map(|slot| slot.label).collect();
    SecretEnvError::addressing(backend, missing)
}

/// `gcp-secrets://projects/<project>/secrets/<secret_name>/versions/<version>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpSecretRef {
    pub project: String,
    pub secret_name: String,
    pub version: String,
}

impl GcpSecretRef {
    pub fn from_match(m: &ReferenceMatch) -> Result<Self> {
        match (m.get(&GCP_PROJECT), m.get(&GCP_SECRET_NAME), m.get(&GCP_VERSION)) {
            (Some(project), Some(secret_name), Some(version)) => Ok(Self {
                project: project.to_string(),
                secret_name: secret_name.to_string(),
                version: version.to_string(),
            }),
            _ => Err(missing_fields(
                SecretBackendType::GcpSecretManager,
                m,
                &[GCP_PROJECT, GCP_SECRET_NAME, GCP_VERSION],
            )),
        }
    }

    /// Full resource name of the secret version
    pub fn resource_name(&self) -> String {
        format!("projects/{}/secrets/{}/versions/{}", self.project, self.secret_name, self.version)
    }
}

/// `aws-ssm://arn:aws:ssm:<region>:<account_id>:parameter/<parameter_id>[:encrypted]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsmParameterRef {
    pub region: String,
    pub parameter_id: String,
    /// Request decryption from the service
    pub encrypted: bool,
}

impl SsmParameterRef {
    pub fn from_match(m: &ReferenceMatch) -> Result<Self> {
        match (m.get(&SSM_REGION), m.get(&SSM_PARAMETER_ID)) {
            (Some(region), Some(parameter_id)) => Ok(Self {
                region: region.to_string(),
                parameter_id: parameter_id.to_string(),
                encrypted: m.contains(&SSM_ENCRYPTED),
            }),
            _ => Err(missing_fields(SecretBackendType::AwsSsm, m, &[SSM_REGION, SSM_PARAMETER_ID])),
        }
    }
}

/// `aws-secrets://arn:aws:secretsmanager:<region>:<account_id>:secret:<secret_id>[:stage:<s>][:version:<id>]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsSecretRef {
    pub region: String,
    pub secret_id: String,
    pub version_stage: Option<String>,
    pub version_id: Option<String>,
}

impl AwsSecretRef {
    pub fn from_match(m: &ReferenceMatch) -> Result<Self> {
        match (m.get(&SM_REGION), m.get(&SM_SECRET_ID)) {
            (Some(region), Some(secret_id)) => Ok(Self {
                region: region.to_string(),
                secret_id: secret_id.to_string(),
                version_stage: m.get(&SM_VERSION_STAGE).map(str::to_owned),
                version_id: m.get(&SM_VERSION_ID).map(str::to_owned),
            }),
            _ => Err(missing_fields(
                SecretBackendType::AwsSecretsManager,
                m,
                &[SM_REGION, SM_SECRET_ID],
            )),
        }
    }

    /// Lookup request forwarding both optional filters as-is
    pub fn to_request(&self) -> SecretValueRequest {
        SecretValueRequest {
            secret_id: self.secret_id.clone(),
            version_stage: self.version_stage.clone(),
            version_id: self.version_id.clone(),
        }
    }
}

/// A fully addressed reference for one backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretReference {
    Gcp(GcpSecretRef),
    Ssm(SsmParameterRef),
    SecretsManager(AwsSecretRef),
}

impl SecretReference {
    /// Validate a match against the fields of the backend that produced it
    pub fn from_match(m: &ReferenceMatch) -> Result<Self> {
        match m.backend() {
            SecretBackendType::GcpSecretManager => GcpSecretRef::from_match(m).map(Self::Gcp),
            SecretBackendType::AwsSsm => SsmParameterRef::from_match(m).map(Self::Ssm),
            SecretBackendType::AwsSecretsManager => {
                AwsSecretRef::from_match(m).map(Self::SecretsManager)
            }
        }
    }

    pub fn backend(&self) -> SecretBackendType {
        match self {
            Self::Gcp(_) => SecretBackendType::GcpSecretManager,
            Self::Ssm(_) => SecretBackendType::AwsSsm,
            Self::SecretsManager(_) => SecretBackendType::AwsSecretsManager,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::grammar::{AWS_SECRETS_MANAGER_PATTERN, AWS_SSM_PATTERN, GCP_SECRET_PATTERN};

    const GCP: &str = "gcp-secrets://projects/my-project/secrets/my-secret/versions/latest";
    const SSM: &str = "aws-ssm://arn:aws:ssm:us-east-2:123456789:parameter/my/parameter:encrypted";
    const SM: &str =
        "aws-secrets://arn:aws:secretsmanager:us-east-1:123456789012:secret:tutorials/MyFirstSecret-jiObOV";

    #[test]
    fn test_gcp_ref_from_match() {
        let m = GCP_SECRET_PATTERN.captures(GCP).unwrap();
        let r = GcpSecretRef::from_match(&m).unwrap();
        assert_eq!(r.resource_name(), "projects/my-project/secrets/my-secret/versions/latest");
    }

    #[test]
    fn test_gcp_ref_missing_single_field() {
        let m = GCP_SECRET_PATTERN.captures(GCP).unwrap().without(&GCP_SECRET_NAME);
        let err = GcpSecretRef::from_match(&m).unwrap_err();
        assert_eq!(err.to_string(), "gcp secret missing required values: GCP secret name");
    }

    #[test]
    fn test_gcp_ref_from_foreign_match_lists_all_fields() {
        let m = AWS_SSM_PATTERN.captures(SSM).unwrap();
        let err = GcpSecretRef::from_match(&m).unwrap_err();
        assert!(err.is_addressing());
        assert_eq!(
            err.to_string(),
            "gcp secret missing required values: GCP project id, GCP secret name, GCP secret version"
        );
    }

    #[test]
    fn test_ssm_ref_from_match() {
        let m = AWS_SSM_PATTERN.captures(SSM).unwrap();
        let r = SsmParameterRef::from_match(&m).unwrap();
        assert_eq!(r.region, "us-east-2");
        assert_eq!(r.parameter_id, "my/parameter");
        assert!(r.encrypted);
    }

    #[test]
    fn test_ssm_ref_missing_region() {
        let m = AWS_SSM_PATTERN.captures(SSM).unwrap().without(&SSM_REGION);
        let err = SsmParameterRef::from_match(&m).unwrap_err();
        assert_eq!(err.to_string(), "aws ssm parameter missing required values: AWS region");
    }

    #[test]
    fn test_ssm_ref_from_foreign_match() {
        let m = GCP_SECRET_PATTERN.captures(GCP).unwrap();
        let err = SsmParameterRef::from_match(&m).unwrap_err();
        assert_eq!(
            err.to_string(),
            "aws ssm parameter missing required values: AWS region, AWS SSM parameter id"
        );
    }

    #[test]
    fn test_secrets_manager_ref_missing_fields() {
        let m = GCP_SECRET_PATTERN.captures(GCP).unwrap();
        let err = AwsSecretRef::from_match(&m).unwrap_err();
        assert_eq!(
            err.to_string(),
            "aws secrets manager missing required values: AWS region, AWS Secrets Manager secret name"
        );

        let m = AWS_SECRETS_MANAGER_PATTERN.captures(SM).unwrap().without(&SM_REGION);
        let err = AwsSecretRef::from_match(&m).unwrap_err();
        assert_eq!(err.to_string(), "aws secrets manager missing required values: AWS region");
    }

    #[test]
    fn test_secrets_manager_request_forwards_filters() {
        let m = AWS_SECRETS_MANAGER_PATTERN
            .captures(
                "aws-secrets://arn:aws:secretsmanager:us-east-2:123456789012:secret:my/Complex/Secret@:stage:DEV:version:3bb6519e-bd6e-4db6-a52e-3671015e2cda",
            )
            .unwrap();
        let request = AwsSecretRef::from_match(&m).unwrap().to_request();
        assert_eq!(request.secret_id, "my/Complex/Secret@");
        assert_eq!(request.version_stage.as_deref(), Some("DEV"));
        assert_eq!(request.version_id.as_deref(), Some("3bb6519e-bd6e-4db6-a52e-3671015e2cda"));
    }

    #[test]
    fn test_secret_reference_dispatches_on_backend() {
        let m = AWS_SECRETS_MANAGER_PATTERN.captures(SM).unwrap();
        let reference = SecretReference::from_match(&m).unwrap();
        assert_eq!(reference.backend(), SecretBackendType::AwsSecretsManager);
        assert!(matches!(reference, SecretReference::SecretsManager(_)));
    }
}
