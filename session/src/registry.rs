use std::{collections::HashMap, sync::Arc};

use once_cell::sync::Lazy;
use parking_lot::RwLock;

use crate::{error::RegistryError, SessionManager};

static GLOBAL: Lazy<SessionRegistry> = Lazy::new(SessionRegistry::new);

/// The process-wide registry used by cached session layers.
pub fn registry() -> &'static SessionRegistry {
    &GLOBAL
}

/// Named session managers, looked up by key from anywhere in the process.
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    managers: Arc<RwLock<HashMap<String, SessionManager>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `manager` under `key`, replacing and returning any manager
    /// already registered there.
    pub fn register(
        &self,
        key: impl Into<String>,
        manager: SessionManager,
    ) -> Option<SessionManager> {
        let key = key.into();

        #[cfg(feature = "tracing")]
        tracing::debug!(%key, "Registered session manager");

        self.managers.write().insert(key, manager)
    }

    /// Registers `manager` under `key`, refusing a missing manager or a key
    /// that is already taken.
    pub fn register_strict(
        &self,
        key: impl Into<String>,
        manager: Option<SessionManager>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        let Some(manager) = manager else {
            return Err(RegistryError::NilConfig { key });
        };

        let mut managers = self.managers.write();
        if managers.contains_key(&key) {
            return Err(RegistryError::DuplicateKey { key });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(%key, "Registered session manager");

        managers.insert(key, manager);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<SessionManager> {
        self.managers.read().get(key).cloned()
    }

    pub fn remove(&self, key: &str) -> Option<SessionManager> {
        self.managers.write().remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.managers.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.managers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.managers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::MemoryStore;

    fn manager() -> SessionManager {
        SessionManager::builder()
            .with_store(MemoryStore::with_cleanup_interval(Duration::ZERO))
            .build()
    }

    #[test]
    fn test_register_and_get() {
        let registry = SessionRegistry::new();
        let manager = manager();
        assert!(registry.register("admin", manager.clone()).is_none());

        let found = registry.get("admin").unwrap();
        assert_eq!(found.context_key(), manager.context_key());
        assert!(registry.contains("admin"));
        assert!(registry.get("user").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_overwrites() {
        let registry = SessionRegistry::new();
        let first = manager();
        let second = manager();
        registry.register("admin", first.clone());

        let replaced = registry.register("admin", second.clone()).unwrap();
        assert_eq!(replaced.context_key(), first.context_key());
        assert_eq!(
            registry.get("admin").unwrap().context_key(),
            second.context_key()
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_strict_rejects_duplicate_key() {
        let registry = SessionRegistry::new();
        registry.register_strict("admin", Some(manager())).unwrap();

        let err = registry
            .register_strict("admin", Some(manager()))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateKey {
                key: "admin".into()
            }
        );
    }

    #[test]
    fn test_register_strict_rejects_missing_manager() {
        let registry = SessionRegistry::new();
        let err = registry.register_strict("admin", None).unwrap_err();

        assert_eq!(err, RegistryError::NilConfig { key: "admin".into() });
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        registry.register("admin", manager());

        assert!(registry.remove("admin").is_some());
        assert!(registry.remove("admin").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let registry = SessionRegistry::new();
        let clone = registry.clone();
        clone.register("shared", manager());

        assert!(registry.contains("shared"));
    }
}
