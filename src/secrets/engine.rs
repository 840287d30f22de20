//! Environment resolution engine
//!
//! A pass moves through three states:
//!
//! 1. **Snapshot**: every environment entry is copied once.
//! 2. **Resolving**: each value is classified; references are resolved
//!    concurrently, one task per reference, literals pass through unchanged.
//! 3. **Committed**: after every lookup succeeded, all keys are written back in
//!    one batch. A value with nothing set in its backend is committed as `""`.
//!
//! Any failure aborts the pass before commit and the environment is untouched.
//! A value the environment cannot hold (a NUL byte) fails the commit itself,
//! again before any key is written.
//! Resolution never recurses: a resolved value is not classified again within
//! the same pass.

use super::environment::{EnvSnapshot, Environment, ProcessEnvironment};
use super::registry::{Classified, ResolverRegistry};
use super::types::SecretString;
use super::SecretBackendType;
use crate::config::BackendSettings;
use crate::errors::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, Instrument, Span};

/// What happened to one key during a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    /// The backend returned a value
    Resolved { backend: SecretBackendType },
    /// The backend holds no value; committed as an empty string
    Unset { backend: SecretBackendType },
    /// Not a reference; value kept as-is
    Literal,
}

impl ResolutionOutcome {
    pub fn backend(&self) -> Option<SecretBackendType> {
        match self {
            Self::Resolved { backend } | Self::Unset { backend } => Some(*backend),
            Self::Literal => None,
        }
    }

    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Literal)
    }
}

/// Per-key outcomes of a successful pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    outcomes: BTreeMap<String, ResolutionOutcome>,
}

impl ResolutionReport {
    pub fn outcome(&self, key: &str) -> Option<ResolutionOutcome> {
        self.outcomes.get(key).copied()
    }

    pub fn outcomes(&self) -> impl Iterator<Item = (&str, ResolutionOutcome)> {
        self.outcomes.iter().map(|(key, outcome)| (key.as_str(), *outcome))
    }

    /// Keys whose value came from a backend, including unset ones
    pub fn reference_keys(&self) -> impl Iterator<Item = &str> {
        self.outcomes().filter(|(_, outcome)| outcome.is_reference()).map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn resolved_count(&self) -> usize {
        self.count(|o| matches!(o, ResolutionOutcome::Resolved { .. }))
    }

    pub fn unset_count(&self) -> usize {
        self.count(|o| matches!(o, ResolutionOutcome::Unset { .. }))
    }

    pub fn literal_count(&self) -> usize {
        self.count(|o| matches!(o, ResolutionOutcome::Literal))
    }

    fn count(&self, predicate: impl Fn(&ResolutionOutcome) -> bool) -> usize {
        self.outcomes.values().filter(|o| predicate(o)).count()
    }
}

/// Resolved values of a pass that has not been committed
#[derive(Debug, Clone)]
pub struct ResolvedEnv {
    values: BTreeMap<String, SecretString>,
    report: ResolutionReport,
}

impl ResolvedEnv {
    pub fn report(&self) -> &ResolutionReport {
        &self.report
    }

    pub fn get(&self, key: &str) -> Option<&SecretString> {
        self.values.get(key)
    }

    /// Keys whose resolved value differs from `snapshot`
    pub fn changed_keys<'a>(&'a self, snapshot: &'a EnvSnapshot) -> impl Iterator<Item = &'a str> {
        self.values
            .iter()
            .filter(move |(key, value)| {
                snapshot.get(key.as_str()).map(String::as_str) != Some(value.expose_secret())
            })
            .map(|(key, _)| key.as_str())
    }

    /// Plain key/value pairs to write into the environment
    pub fn commit_map(&self) -> BTreeMap<String, String> {
        self.values
            .iter()
            .map(|(key, value)| (key.clone(), value.expose_secret().to_string()))
            .collect()
    }

    pub fn into_report(self) -> ResolutionReport {
        self.report
    }
}

/// Resolves secret references held in an environment
#[derive(Debug, Clone)]
pub struct SecretEnv {
    registry: Arc<ResolverRegistry>,
}

impl Default for SecretEnv {
    fn default() -> Self {
        Self::new(ResolverRegistry::default())
    }
}

impl SecretEnv {
    pub fn new(registry: ResolverRegistry) -> Self {
        Self { registry: Arc::new(registry) }
    }

    pub fn registry(&self) -> &ResolverRegistry {
        &self.registry
    }

    /// Run one full pass over `env` and commit on success
    pub async fn resolve_env(&self, env: &dyn Environment) -> Result<ResolutionReport> {
        let snapshot = env.snapshot();
        let resolved = self.resolve_snapshot(&snapshot).await?;
        env.commit(&resolved.commit_map()).map_err(|e| {
            error!(error = %e, "Environment commit rejected, nothing written");
            e
        })?;
        Ok(resolved.into_report())
    }

    /// Resolve a snapshot without writing anything back
    pub async fn resolve_snapshot(&self, snapshot: &EnvSnapshot) -> Result<ResolvedEnv> {
        let span = crate::pass_span!(snapshot.len());
        self.resolve_in_span(snapshot).instrument(span).await
    }

    async fn resolve_in_span(&self, snapshot: &EnvSnapshot) -> Result<ResolvedEnv> {
        // Backend settings come from the same snapshot, read once per pass
        let settings = Arc::new(BackendSettings::from_lookup(|name| snapshot.get(name).cloned()));

        let mut values = BTreeMap::new();
        let mut outcomes = BTreeMap::new();
        let mut lookups = JoinSet::new();

        for (key, value) in snapshot {
            let Some(Classified { reference, resolver }) = self.registry.classify(value) else {
                values.insert(key.clone(), SecretString::new(value.as_str()));
                outcomes.insert(key.clone(), ResolutionOutcome::Literal);
                continue;
            };

            let backend = resolver.backend_type();
            let settings = settings.clone();
            let key = key.clone();
            let span = crate::lookup_span!(key, backend);
            lookups.spawn(
                async move {
                    debug!("Resolving secret reference");
                    let result = resolver.resolve(&reference, &settings).await;
                    (key, backend, result)
                }
                .instrument(span),
            );
        }

        Span::current().record("references", lookups.len());

        while let Some(joined) = lookups.join_next().await {
            let (key, backend, result) = joined?;
            match result {
                Ok(Some(secret)) => {
                    values.insert(key.clone(), secret);
                    outcomes.insert(key, ResolutionOutcome::Resolved { backend });
                }
                Ok(None) => {
                    debug!(key = %key, backend = %backend, "Backend holds no value, committing empty string");
                    values.insert(key.clone(), SecretString::new(String::new()));
                    outcomes.insert(key, ResolutionOutcome::Unset { backend });
                }
                Err(e) => {
                    // Dropping the JoinSet aborts the remaining lookups
                    error!(key = %key, backend = %backend, error = %e, "Secret reference resolution failed");
                    return Err(e);
                }
            }
        }

        let report = ResolutionReport { outcomes };
        info!(
            resolved = report.resolved_count(),
            unset = report.unset_count(),
            literal = report.literal_count(),
            "Environment resolution complete"
        );

        Ok(ResolvedEnv { values, report })
    }
}

/// Resolve every secret reference in the live process environment
///
/// Uses the built-in resolvers backed by the cloud SDK clients.
pub async fn resolve_env() -> Result<ResolutionReport> {
    SecretEnv::default().resolve_env(&ProcessEnvironment).await
}
