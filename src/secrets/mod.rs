//! Secret reference resolution.
//!
//! Environment variable values may hold references to secrets kept in a cloud
//! secret store. This module recognizes those references, fetches the secret
//! material and rewrites the environment in place.
//!
//! # Architecture
//!
//! Leaf first:
//!
//! - [`grammar`]: one fixed pattern per backend with named slots
//! - [`reference`]: typed, validated addressing fields per backend
//! - [`resolvers`]: one [`SecretResolver`] per backend, each performing a single lookup
//!   through a [`ClientFactory`]
//! - [`registry`]: ordered (pattern, resolver) pairs, first match wins
//! - [`engine`]: snapshot, concurrent resolution and atomic commit
//!
//! # Supported References
//!
//! ```text
//! gcp-secrets://projects/<project>/secrets/<secret_name>/versions/<version>
//! aws-ssm://arn:aws:ssm:<region>:<account_id>:parameter/<parameter_id>[:encrypted]
//! aws-secrets://arn:aws:secretsmanager:<region>:<account_id>:secret:<secret_id>[:stage:<stage>][:version:<uuid>]
//! ```
//!
//! # Basic Example
//!
//! ```rust,ignore
//! use secretenv::secrets::{MemoryEnvironment, SecretEnv};
//!
//! let env = MemoryEnvironment::new([(
//!     "DATABASE_PASSWORD",
//!     "aws-ssm://arn:aws:ssm:us-east-2:123456789012:parameter/prod/db/password:encrypted",
//! )]);
//! let report = SecretEnv::default().resolve_env(&env).await?;
//! println!("resolved {} references", report.resolved_count());
//! ```
//!
//! # Security Considerations
//!
//! - Resolved values are held as [`SecretString`] until commit and never logged
//! - Nothing is cached between passes
//! - A failed pass leaves the environment exactly as it was

pub mod backends;
pub mod engine;
pub mod environment;
pub mod grammar;
pub mod reference;
pub mod registry;
pub mod resolvers;
pub mod types;

pub use backends::{
    AwsClientOptions, ClientFactory, GcpSecretsClient, SdkClientFactory, SecretBackendType,
    SecretValueRequest, SecretsManagerClient, SsmClient,
};
pub use engine::{resolve_env, ResolutionOutcome, ResolutionReport, ResolvedEnv, SecretEnv};
pub use environment::{EnvSnapshot, Environment, MemoryEnvironment, ProcessEnvironment};
pub use grammar::{
    ReferenceMatch, ReferencePattern, Slot, AWS_SECRETS_MANAGER_PATTERN, AWS_SSM_PATTERN,
    GCP_SECRET_PATTERN,
};
pub use reference::{AwsSecretRef, GcpSecretRef, SecretReference, SsmParameterRef};
pub use registry::{Classified, ResolverRegistry};
pub use resolvers::{
    GcpSecretResolver, SecretResolver, SecretsManagerResolver, SsmParameterResolver,
};
pub use types::SecretString;
