//! Named in-process locks
//!
//! Link issuance must be serialized per tenant: the lock name embeds the
//! tenant id, so unrelated tenants never contend. The registry is injected
//! into the services that need it rather than living in a global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Registry of named async locks. Entries are created lazily on first use and
/// kept for the registry's lifetime; cardinality is bounded by the number of
/// distinct names (tenants), so entries are never evicted.
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock registered under `name`, creating it if absent. Two callers
    /// passing the same name always receive the same lock.
    pub fn lock_for(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        locks
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_yields_same_lock() {
        let registry = LockRegistry::new();
        let a = registry.lock_for("create-link-by-tenant-1");
        let b = registry.lock_for("create-link-by-tenant-1");
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn different_names_yield_independent_locks() {
        let registry = LockRegistry::new();
        let a = registry.lock_for("create-link-by-tenant-1");
        let b = registry.lock_for("create-link-by-tenant-2");
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn lock_excludes_second_holder_until_released() {
        let registry = LockRegistry::new();
        let lock = registry.lock_for("create-link-by-tenant-1");

        let guard = lock.lock().await;
        assert!(registry
            .lock_for("create-link-by-tenant-1")
            .try_lock()
            .is_err());
        drop(guard);
        assert!(registry
            .lock_for("create-link-by-tenant-1")
            .try_lock()
            .is_ok());
    }
}
