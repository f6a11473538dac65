//! In-memory item store backing the `/items` routes.

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ItemInput {
    pub name: String,
}

struct Inner {
    items: Vec<Item>,
    next_id: u64,
}

/// Items live for the life of the process. Ids are never reused, even after
/// a delete.
pub struct ItemStore {
    inner: RwLock<Inner>,
}

impl ItemStore {
    pub fn empty() -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: Vec::new(),
                next_id: 1,
            }),
        }
    }

    /// Store holding the two sample items.
    pub fn seeded() -> Self {
        Self {
            inner: RwLock::new(Inner {
                items: vec![
                    Item {
                        id: 1,
                        name: "Item One".to_string(),
                    },
                    Item {
                        id: 2,
                        name: "Item Two".to_string(),
                    },
                ],
                next_id: 3,
            }),
        }
    }

    pub async fn list(&self) -> Vec<Item> {
        self.inner.read().await.items.clone()
    }

    pub async fn get(&self, id: u64) -> Option<Item> {
        self.inner
            .read()
            .await
            .items
            .iter()
            .find(|i| i.id == id)
            .cloned()
    }

    pub async fn create(&self, name: String) -> Item {
        let mut inner = self.inner.write().await;
        let item = Item {
            id: inner.next_id,
            name,
        };
        inner.next_id += 1;
        inner.items.push(item.clone());
        item
    }

    pub async fn update(&self, id: u64, name: String) -> Option<Item> {
        let mut inner = self.inner.write().await;
        let item = inner.items.iter_mut().find(|i| i.id == id)?;
        item.name = name;
        Some(item.clone())
    }

    /// Returns false if no item had this id.
    pub async fn delete(&self, id: u64) -> bool {
        let mut inner = self.inner.write().await;
        let before = inner.items.len();
        inner.items.retain(|i| i.id != id);
        inner.items.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_items() {
        let store = ItemStore::seeded();
        let items = store.list().await;
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].name, "Item One");
        assert_eq!(store.get(2).await.unwrap().name, "Item Two");
        assert!(store.get(3).await.is_none());
    }

    #[tokio::test]
    async fn test_ids_not_reused_after_delete() {
        let store = ItemStore::seeded();
        assert!(store.delete(2).await);
        let created = store.create("Item Three".to_string()).await;
        assert_eq!(created.id, 3);
        assert!(!store.delete(2).await);
    }

    #[tokio::test]
    async fn test_update() {
        let store = ItemStore::empty();
        let item = store.create("draft".to_string()).await;
        assert_eq!(item.id, 1);
        let updated = store.update(1, "final".to_string()).await.unwrap();
        assert_eq!(updated.name, "final");
        assert!(store.update(9, "x".to_string()).await.is_none());
    }
}
