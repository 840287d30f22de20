//! Resolver registry
//!
//! An ordered list of (pattern, resolver) entries. Classification walks the
//! list in order and the first pattern whose scheme prefix the value carries
//! wins, even when required fields are missing; the resolver then reports them.
//! A value carrying no known scheme is not a reference and passes through
//! untouched.

use super::backends::{ClientFactory, SdkClientFactory, SecretBackendType};
use super::grammar::{
    ReferenceMatch, ReferencePattern, AWS_SECRETS_MANAGER_PATTERN, AWS_SSM_PATTERN,
    GCP_SECRET_PATTERN,
};
use super::resolvers::{
    GcpSecretResolver, SecretResolver, SecretsManagerResolver, SsmParameterResolver,
};
use std::sync::Arc;
use tracing::info;

/// A classified reference and the resolver responsible for it
#[derive(Debug, Clone)]
pub struct Classified {
    pub reference: ReferenceMatch,
    pub resolver: Arc<dyn SecretResolver>,
}

/// Ordered registry of secret resolvers
#[derive(Clone)]
pub struct ResolverRegistry {
    entries: Vec<(&'static ReferencePattern, Arc<dyn SecretResolver>)>,
}

impl std::fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverRegistry")
            .field("backends", &self.backends())
            .finish()
    }
}

impl ResolverRegistry {
    /// Create a registry with no resolvers
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Registry with the built-in resolvers in their fixed order:
    /// GCP Secret Manager, AWS SSM, AWS Secrets Manager
    pub fn with_factory(clients: Arc<dyn ClientFactory>) -> Self {
        let mut registry = Self::empty();
        registry.register(&GCP_SECRET_PATTERN, Arc::new(GcpSecretResolver::new(clients.clone())));
        registry.register(&AWS_SSM_PATTERN, Arc::new(SsmParameterResolver::new(clients.clone())));
        registry.register(
            &AWS_SECRETS_MANAGER_PATTERN,
            Arc::new(SecretsManagerResolver::new(clients)),
        );
        registry
    }

    /// Append a resolver; it is tried after every resolver already registered
    pub fn register(&mut self, pattern: &'static ReferencePattern, resolver: Arc<dyn SecretResolver>) {
        info!(
            backend = %resolver.backend_type(),
            scheme = pattern.scheme(),
            position = self.entries.len(),
            "Registering secret resolver"
        );
        self.entries.push((pattern, resolver));
    }

    /// Backends in classification order
    pub fn backends(&self) -> Vec<SecretBackendType> {
        self.entries.iter().map(|(pattern, _)| pattern.backend()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the first resolver whose scheme prefix `value` carries
    pub fn classify(&self, value: &str) -> Option<Classified> {
        self.entries.iter().find_map(|(pattern, resolver)| {
            pattern
                .captures(value)
                .map(|reference| Classified { reference, resolver: resolver.clone() })
        })
    }
}

impl Default for ResolverRegistry {
    fn default() -> Self {
        Self::with_factory(Arc::new(SdkClientFactory::default()))
    }
}
