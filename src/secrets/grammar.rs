//! Reference grammar
//!
//! One fixed pattern per backend, each with named capture slots:
//!
//! ```text
//! gcp-secrets://projects/<project>/secrets/<secret_name>/versions/<version>
//! aws-ssm://arn:aws:ssm:<region>:<account_id>:parameter/<parameter_id>[:encrypted]
//! aws-secrets://arn:aws:secretsmanager:<region>:<account_id>:secret:<secret_id>[:stage:<version_stage>][:version:<version_id>]
//! ```
//!
//! A value belongs to a backend as soon as it starts with that backend's scheme
//! prefix (case-sensitive). The rest of the string is then laid against the
//! pattern: each slot that captured non-empty text is recorded, an empty or
//! missing segment leaves the slot absent. A remainder that does not fit the
//! layout at all records no slots. Matching never performs I/O and never fails;
//! checking that the required slots are present is a separate step (see
//! [`super::reference`]), so a half-written reference surfaces as an
//! addressing error instead of passing through as a literal.

use super::backends::SecretBackendType;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Capture slot in a reference pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Capture group name
    pub name: &'static str,
    /// Human-readable field name used in addressing errors
    pub label: &'static str,
    pub required: bool,
}

impl Slot {
    const fn required(name: &'static str, label: &'static str) -> Self {
        Self { name, label, required: true }
    }

    const fn optional(name: &'static str, label: &'static str) -> Self {
        Self { name, label, required: false }
    }
}

pub const GCP_PROJECT: Slot = Slot::required("gcp_project", "GCP project id");
pub const GCP_SECRET_NAME: Slot = Slot::required("secret_name", "GCP secret name");
pub const GCP_VERSION: Slot = Slot::required("version", "GCP secret version");

pub const SSM_REGION: Slot = Slot::required("region", "AWS region");
pub const SSM_ACCOUNT_ID: Slot = Slot::optional("account_id", "AWS account id");
pub const SSM_PARAMETER_ID: Slot = Slot::required("parameter_id", "AWS SSM parameter id");
pub const SSM_ENCRYPTED: Slot = Slot::optional("encrypted", "AWS SSM decryption flag");

pub const SM_REGION: Slot = Slot::required("region", "AWS region");
pub const SM_ACCOUNT_ID: Slot = Slot::optional("account_id", "AWS account id");
pub const SM_SECRET_ID: Slot = Slot::required("secret_id", "AWS Secrets Manager secret name");
pub const SM_VERSION_STAGE: Slot = Slot::optional("version_stage", "AWS Secrets Manager version stage");
pub const SM_VERSION_ID: Slot = Slot::optional("version_id", "AWS Secrets Manager version id");

/// Backend-specific reference pattern
#[derive(Debug)]
pub struct ReferencePattern {
    backend: SecretBackendType,
    scheme: &'static str,
    regex: Regex,
    slots: &'static [Slot],
}

impl ReferencePattern {
    fn new(
        backend: SecretBackendType,
        scheme: &'static str,
        pattern: &str,
        slots: &'static [Slot],
    ) -> Self {
        let regex = Regex::new(pattern).expect("reference pattern should be a valid regex");
        debug_assert!(slots.iter().all(|slot| regex.capture_names().flatten().any(|n| n == slot.name)));
        Self { backend, scheme, regex, slots }
    }

    pub fn backend(&self) -> SecretBackendType {
        self.backend
    }

    /// Scheme prefix including `://`
    pub fn scheme(&self) -> &'static str {
        self.scheme
    }

    /// Slots in declaration order
    pub fn slots(&self) -> &'static [Slot] {
        self.slots
    }

    /// Whether `value` carries this pattern's scheme prefix
    pub fn claims(&self, value: &str) -> bool {
        value.starts_with(self.scheme)
    }

    /// Apply the pattern to a full string
    ///
    /// `None` only when the scheme prefix differs.
    pub fn captures(&self, value: &str) -> Option<ReferenceMatch> {
        if !self.claims(value) {
            return None;
        }
        let slots = match self.regex.captures(value) {
            Some(captures) => self
                .slots
                .iter()
                .filter_map(|slot| {
                    captures
                        .name(slot.name)
                        .filter(|m| !m.as_str().is_empty())
                        .map(|m| (slot.name, m.as_str().to_string()))
                })
                .collect(),
            None => BTreeMap::new(),
        };
        Some(ReferenceMatch { backend: self.backend, slots })
    }
}

/// Outcome of a scheme match
///
/// Only slots that captured text are present; an empty segment or a slot that
/// did not participate is absent rather than an empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMatch {
    backend: SecretBackendType,
    slots: BTreeMap<&'static str, String>,
}

impl ReferenceMatch {
    /// Backend whose pattern produced this match
    pub fn backend(&self) -> SecretBackendType {
        self.backend
    }

    pub fn get(&self, slot: &Slot) -> Option<&str> {
        self.slots.get(slot.name).map(String::as_str)
    }

    pub fn contains(&self, slot: &Slot) -> bool {
        self.slots.contains_key(slot.name)
    }

    #[cfg(test)]
    pub(crate) fn without(mut self, slot: &Slot) -> Self {
        self.slots.remove(slot.name);
        self
    }
}

pub static GCP_SECRET_PATTERN: Lazy<ReferencePattern> = Lazy::new(|| {
    static SLOTS: [Slot; 3] = [GCP_PROJECT, GCP_SECRET_NAME, GCP_VERSION];
    ReferencePattern::new(
        SecretBackendType::GcpSecretManager,
        "gcp-secrets://",
        concat!(
            r"^gcp-secrets://projects/(?P<gcp_project>[^/]*)",
            r"(?:/secrets/(?P<secret_name>[^/]*)",
            r"(?:/versions/(?P<version>[^/]*))?)?$",
        ),
        &SLOTS,
    )
});

pub static AWS_SSM_PATTERN: Lazy<ReferencePattern> = Lazy::new(|| {
    static SLOTS: [Slot; 4] = [SSM_REGION, SSM_ACCOUNT_ID, SSM_PARAMETER_ID, SSM_ENCRYPTED];
    ReferencePattern::new(
        SecretBackendType::AwsSsm,
        "aws-ssm://",
        concat!(
            r"^aws-ssm://arn:aws:ssm:(?P<region>[^:/]*):(?P<account_id>[^:/]*):parameter/",
            r"(?P<parameter_id>[^:]*)(?P<encrypted>:encrypted)?$",
        ),
        &SLOTS,
    )
});

pub static AWS_SECRETS_MANAGER_PATTERN: Lazy<ReferencePattern> = Lazy::new(|| {
    static SLOTS: [Slot; 5] =
        [SM_REGION, SM_ACCOUNT_ID, SM_SECRET_ID, SM_VERSION_STAGE, SM_VERSION_ID];
    ReferencePattern::new(
        SecretBackendType::AwsSecretsManager,
        "aws-secrets://",
        concat!(
            r"^aws-secrets://arn:aws:secretsmanager:(?P<region>[^:/]*):(?P<account_id>[^:/]*):secret:",
            r"(?P<secret_id>[a-zA-Z0-9/_+=.@-]*)",
            r"(?::stage:(?P<version_stage>[a-zA-Z0-9]+))?",
            r"(?::version:(?P<version_id>[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}))?$",
        ),
        &SLOTS,
    )
});
