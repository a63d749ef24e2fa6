//! In-memory item store.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::app::bootstrap::BootstrapError;

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub quantity: u32,
}

/// A thread-safe store of items.
#[derive(Clone)]
pub struct ItemStore {
    inner: Arc<DashMap<u64, Item>>,
    next_id: Arc<AtomicU64>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Load a store from a JSON array of items.
    pub async fn load_seed(path: &Path) -> Result<Self, BootstrapError> {
        let content = tokio::fs::read(path).await.map_err(|e| {
            BootstrapError::Resource(format!("seed file {}: {}", path.display(), e))
        })?;
        let items: Vec<Item> = serde_json::from_slice(&content).map_err(|e| {
            BootstrapError::Application(format!("seed file {}: {}", path.display(), e))
        })?;

        let store = Self::new();
        for item in items {
            store.put(item).map_err(|e| {
                BootstrapError::Application(format!("seed file {}: {}", path.display(), e))
            })?;
        }
        tracing::info!(path = %path.display(), items = store.len(), "Loaded catalog seed");
        Ok(store)
    }

    /// Insert an item with a known id.
    ///
    /// Fails when no id would remain for items created afterwards.
    pub fn put(&self, item: Item) -> Result<(), BootstrapError> {
        let next = item
            .id
            .checked_add(1)
            .ok_or_else(|| BootstrapError::Application(format!("item id {} is out of range", item.id)))?;
        self.next_id.fetch_max(next, Ordering::SeqCst);
        self.inner.insert(item.id, item);
        Ok(())
    }

    /// Insert a new item and assign it an id.
    pub fn create(&self, name: String, quantity: u32) -> Item {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let item = Item { id, name, quantity };
        self.inner.insert(id, item.clone());
        item
    }

    pub fn get(&self, id: u64) -> Option<Item> {
        self.inner.get(&id).map(|entry| entry.value().clone())
    }

    /// All items ordered by id.
    pub fn list(&self) -> Vec<Item> {
        let mut items: Vec<Item> = self.inner.iter().map(|entry| entry.value().clone()).collect();
        items.sort_by_key(|item| item.id);
        items
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = ItemStore::new();
        let a = store.create("bolt".into(), 3);
        let b = store.create("nut".into(), 5);
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.list(), vec![a, b]);
    }

    #[test]
    fn test_put_advances_next_id() {
        let store = ItemStore::new();
        store
            .put(Item {
                id: 10,
                name: "washer".into(),
                quantity: 1,
            })
            .unwrap();
        assert_eq!(store.create("nut".into(), 1).id, 11);
        assert_eq!(store.get(10).unwrap().name, "washer");
    }

    #[tokio::test]
    async fn test_missing_seed_is_resource_error() {
        let err = ItemStore::load_seed(Path::new("/nonexistent/seed.json"))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BootstrapError::Resource(_)));
    }

    #[tokio::test]
    async fn test_load_seed() {
        let path = std::env::temp_dir().join(format!("catalog-seed-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"[{"id": 42, "name": "gear", "quantity": 7}]"#)
            .await
            .unwrap();

        let store = ItemStore::load_seed(&path).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(42).unwrap().quantity, 7);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[test]
    fn test_put_rejects_largest_id() {
        let store = ItemStore::new();
        let err = store
            .put(Item {
                id: u64::MAX,
                name: "overflow".into(),
                quantity: 1,
            })
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Application(_)));
        assert!(store.is_empty());
        assert_eq!(store.create("nut".into(), 1).id, 1);
    }

    #[tokio::test]
    async fn test_seed_with_largest_id_fails_build() {
        let path = std::env::temp_dir().join(format!("catalog-seed-max-{}.json", std::process::id()));
        tokio::fs::write(
            &path,
            r#"[{"id": 18446744073709551615, "name": "gear", "quantity": 1}]"#,
        )
        .await
        .unwrap();

        let err = ItemStore::load_seed(&path).await.err().unwrap();
        assert!(matches!(err, BootstrapError::Application(_)));

        let _ = tokio::fs::remove_file(&path).await;
    }
}
