//! Environment access
//!
//! The engine reads the environment once into an [`EnvSnapshot`] and writes
//! back through [`Environment::commit`] only after every reference resolved.
//! A commit checks every entry before it writes the first one, so it either
//! applies the whole batch or nothing.

use crate::errors::{Result, SecretEnvError};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::warn;

/// Point-in-time copy of the environment, ordered by key
pub type EnvSnapshot = BTreeMap<String, String>;

/// A key/value environment the engine can snapshot and commit into
pub trait Environment: Send + Sync {
    /// Copy every key/value pair
    fn snapshot(&self) -> EnvSnapshot;

    /// Write all `updates`; keys not in `updates` are left untouched
    fn commit(&self, updates: &BTreeMap<String, String>) -> Result<()>;
}

/// Reject any entry the process environment cannot hold
pub fn check_entries(updates: &BTreeMap<String, String>) -> Result<()> {
    for (key, value) in updates {
        let reason = if key.is_empty() {
            Some("key is empty")
        } else if key.contains('=') {
            Some("key contains '='")
        } else if key.contains('\0') {
            Some("key contains a NUL byte")
        } else if value.contains('\0') {
            Some("value contains a NUL byte")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(SecretEnvError::commit(key.as_str(), reason));
        }
    }
    Ok(())
}

/// The live process environment
///
/// Entries whose key or value is not valid UTF-8 are left out of snapshots and
/// therefore never touched, as are keys that cannot be set again (the hidden
/// `=C:` drive entries on Windows).
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn snapshot(&self) -> EnvSnapshot {
        std::env::vars_os()
            .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
                (Ok(key), _) if key.is_empty() || key.contains('=') => None,
                (Ok(key), Ok(value)) => Some((key, value)),
                (Ok(key), Err(_)) => {
                    warn!(key = %key, "Skipping environment variable with non UTF-8 value");
                    None
                }
                (Err(_), _) => None,
            })
            .collect()
    }

    fn commit(&self, updates: &BTreeMap<String, String>) -> Result<()> {
        // set_var panics on these, which would leave a partial write behind
        check_entries(updates)?;
        for (key, value) in updates {
            std::env::set_var(key, value);
        }
        Ok(())
    }
}

/// In-memory environment for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryEnvironment {
    vars: Mutex<EnvSnapshot>,
}

impl MemoryEnvironment {
    pub fn new<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self { vars: Mutex::new(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()) }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EnvSnapshot> {
        // A poisoned map is still a consistent map
        self.vars.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Environment for MemoryEnvironment {
    fn snapshot(&self) -> EnvSnapshot {
        self.lock().clone()
    }

    fn commit(&self, updates: &BTreeMap<String, String>) -> Result<()> {
        check_entries(updates)?;
        let mut vars = self.lock();
        for (key, value) in updates {
            vars.insert(key.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    static ENV_MUTEX: StdMutex<()> = StdMutex::new(());

    #[test]
    fn test_memory_environment_commit_merges() {
        let env = MemoryEnvironment::new([("A", "1"), ("B", "2")]);
        let mut updates = BTreeMap::new();
        updates.insert("B".to_string(), "two".to_string());
        updates.insert("C".to_string(), String::new());
        env.commit(&updates).unwrap();

        assert_eq!(env.get("A").as_deref(), Some("1"));
        assert_eq!(env.get("B").as_deref(), Some("two"));
        assert_eq!(env.get("C").as_deref(), Some(""));
        assert_eq!(env.snapshot().len(), 3);
    }

    #[test]
    fn test_process_environment_roundtrip() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("SECRETENV_TEST_PROCESS_ENV", "before");

        let env = ProcessEnvironment;
        assert_eq!(
            env.snapshot().get("SECRETENV_TEST_PROCESS_ENV").map(String::as_str),
            Some("before")
        );

        let mut updates = BTreeMap::new();
        updates.insert("SECRETENV_TEST_PROCESS_ENV".to_string(), "after".to_string());
        env.commit(&updates).unwrap();
        assert_eq!(std::env::var("SECRETENV_TEST_PROCESS_ENV").unwrap(), "after");

        std::env::remove_var("SECRETENV_TEST_PROCESS_ENV");
    }

    #[test]
    fn test_process_commit_with_nul_value_writes_nothing() {
        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("SECRETENV_TEST_COMMIT_A", "old-a");
        std::env::set_var("SECRETENV_TEST_COMMIT_B", "old-b");

        let mut updates = BTreeMap::new();
        updates.insert("SECRETENV_TEST_COMMIT_A".to_string(), "new-a".to_string());
        updates.insert("SECRETENV_TEST_COMMIT_B".to_string(), "sec\0ret".to_string());
        let err = ProcessEnvironment.commit(&updates).unwrap_err();

        assert!(matches!(err, SecretEnvError::Commit { .. }));
        assert!(err.to_string().contains("SECRETENV_TEST_COMMIT_B"));
        assert_eq!(std::env::var("SECRETENV_TEST_COMMIT_A").unwrap(), "old-a");
        assert_eq!(std::env::var("SECRETENV_TEST_COMMIT_B").unwrap(), "old-b");

        std::env::remove_var("SECRETENV_TEST_COMMIT_A");
        std::env::remove_var("SECRETENV_TEST_COMMIT_B");
    }

    #[test]
    fn test_check_entries_rejects_unwritable_keys() {
        for (key, value, reason) in [
            ("", "v", "key is empty"),
            ("A=B", "v", "key contains '='"),
            ("A\0B", "v", "key contains a NUL byte"),
            ("A", "v\0", "value contains a NUL byte"),
        ] {
            let updates = BTreeMap::from([(key.to_string(), value.to_string())]);
            let err = check_entries(&updates).unwrap_err();
            assert!(err.to_string().ends_with(reason), "{}", err);
        }

        let env = MemoryEnvironment::new([("A", "1")]);
        let updates = BTreeMap::from([
            ("A".to_string(), "2".to_string()),
            ("B".to_string(), "x\0".to_string()),
        ]);
        assert!(env.commit(&updates).is_err());
        assert_eq!(env.snapshot(), BTreeMap::from([("A".to_string(), "1".to_string())]));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_environment_skips_non_utf8() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let _guard = ENV_MUTEX.lock().unwrap();
        std::env::set_var("SECRETENV_TEST_NON_UTF8", OsStr::from_bytes(&[0x66, 0x6f, 0x80]));

        let snapshot = ProcessEnvironment.snapshot();
        assert!(!snapshot.contains_key("SECRETENV_TEST_NON_UTF8"));

        std::env::remove_var("SECRETENV_TEST_NON_UTF8");
    }
}
