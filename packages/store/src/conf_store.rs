//! Deployment-unit repository shared by the nodes of a cluster.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use crate::error::{Result, StoreError};
use crate::models::DeploymentUnit;

/// Persistent record of deployed units, visible to every node.
pub trait ConfStore: Send + Sync {
    /// Insert or replace a deployment unit.
    fn put(&self, du: DeploymentUnit) -> Result<()>;

    /// Insert a deployment unit unless one with the same name exists.
    ///
    /// # Errors
    /// `StoreError::AlreadyDeployed` when the name is taken; the stored unit
    /// is left untouched.
    fn insert_new(&self, du: DeploymentUnit) -> Result<()>;

    fn get(&self, name: &str) -> Result<Option<DeploymentUnit>>;

    /// Remove a deployment unit, returning it if it existed.
    fn remove(&self, name: &str) -> Result<Option<DeploymentUnit>>;

    /// Names of all deployment units, sorted.
    fn list(&self) -> Result<Vec<String>>;

    /// Allocate the next process version number. Versions are unique and
    /// increasing across the whole store.
    fn next_version(&self) -> Result<u64>;
}

/// Process-local [`ConfStore`].
#[derive(Debug, Default)]
pub struct InMemoryConfStore {
    units: RwLock<BTreeMap<String, DeploymentUnit>>,
    version: AtomicU64,
}

impl InMemoryConfStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfStore for InMemoryConfStore {
    fn put(&self, du: DeploymentUnit) -> Result<()> {
        let mut units = self
            .units
            .write()
            .map_err(|_| StoreError::LockPoisoned("conf store"))?;
        units.insert(du.name.clone(), du);
        Ok(())
    }

    fn insert_new(&self, du: DeploymentUnit) -> Result<()> {
        let mut units = self
            .units
            .write()
            .map_err(|_| StoreError::LockPoisoned("conf store"))?;
        match units.entry(du.name.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyDeployed(du.name)),
            Entry::Vacant(slot) => {
                slot.insert(du);
                Ok(())
            }
        }
    }

    fn get(&self, name: &str) -> Result<Option<DeploymentUnit>> {
        let units = self
            .units
            .read()
            .map_err(|_| StoreError::LockPoisoned("conf store"))?;
        Ok(units.get(name).cloned())
    }

    fn remove(&self, name: &str) -> Result<Option<DeploymentUnit>> {
        let mut units = self
            .units
            .write()
            .map_err(|_| StoreError::LockPoisoned("conf store"))?;
        Ok(units.remove(name))
    }

    fn list(&self) -> Result<Vec<String>> {
        let units = self
            .units
            .read()
            .map_err(|_| StoreError::LockPoisoned("conf store"))?;
        Ok(units.keys().cloned().collect())
    }

    fn next_version(&self) -> Result<u64> {
        Ok(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn unit(name: &str, version: u64) -> DeploymentUnit {
        DeploymentUnit {
            name: name.to_string(),
            version,
            deployed_at: Utc::now(),
            processes: Vec::new(),
        }
    }

    #[test]
    fn test_put_get_remove() {
        let store = InMemoryConfStore::new();
        store.put(unit("shop-1", 1)).unwrap();
        store.put(unit("billing", 2)).unwrap();

        assert_eq!(store.get("shop-1").unwrap().map(|du| du.version), Some(1));
        assert_eq!(store.list().unwrap(), vec!["billing", "shop-1"]);

        assert!(store.remove("shop-1").unwrap().is_some());
        assert!(store.remove("shop-1").unwrap().is_none());
        assert!(store.get("shop-1").unwrap().is_none());
    }

    #[test]
    fn test_insert_new_keeps_existing() {
        let store = InMemoryConfStore::new();
        store.insert_new(unit("shop-1", 1)).unwrap();
        assert!(matches!(
            store.insert_new(unit("shop-1", 2)),
            Err(StoreError::AlreadyDeployed(name)) if name == "shop-1"
        ));
        assert_eq!(store.get("shop-1").unwrap().map(|du| du.version), Some(1));
    }

    #[test]
    fn test_versions_increase() {
        let store = InMemoryConfStore::new();
        let first = store.next_version().unwrap();
        let second = store.next_version().unwrap();
        assert_eq!(first, 1);
        assert!(second > first);
    }
}
