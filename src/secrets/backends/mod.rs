//! Secret backend clients
//!
//! Each backend is reached through a narrow "fetch-by-key" client trait. The
//! resolvers never talk to an SDK directly; they ask a [`ClientFactory`] for a
//! client, which lets tests substitute in-memory stores.
//!
//! ## Supported Backends
//!
//! - **GCP Secret Manager**: (`gcp` feature)
//! - **AWS SSM Parameter Store**: (`aws` feature)
//! - **AWS Secrets Manager**: (`aws` feature)

#[cfg(feature = "aws")]
pub mod aws;
pub mod backend;
pub mod factory;
pub mod gcp;

pub use backend::{
    AwsClientOptions, ClientFactory, GcpSecretsClient, SecretBackendType, SecretValueRequest,
    SecretsManagerClient, SsmClient,
};
pub use factory::SdkClientFactory;
