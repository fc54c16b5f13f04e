// src/db/memory_store.rs

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::document_store::{patch_object, strip_id, ChangeFeed, Collection, Document, DocumentStore},
};

// Banco em memória: usado quando não há DATABASE_URL e nos testes.
// Documentos ficam ordenados pelo id, como no banco hospedado.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
    feed: ChangeFeed,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document { id: id.to_string(), data: data.clone() }))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, AppError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, data)| Document { id: id.clone(), data: data.clone() })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<Document, AppError> {
        let id = Uuid::new_v4().to_string();
        self.set(collection, &id, data).await
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<Document, AppError> {
        let data = strip_id(data);
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection)
                .or_default()
                .insert(id.to_string(), data.clone());
        }
        self.feed.notify(collection);
        Ok(Document { id: id.to_string(), data })
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<Document, AppError> {
        let patch = patch_object(patch)?;
        let merged = {
            let mut collections = self.collections.write().await;
            let current = collections
                .get_mut(&collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| AppError::DocumentNotFound {
                    collection: collection.name(),
                    id: id.to_string(),
                })?;

            match &mut *current {
                Value::Object(fields) => fields.extend(patch),
                other => *other = Value::Object(patch),
            }
            current.clone()
        };
        self.feed.notify(collection);
        Ok(Document { id: id.to_string(), data: merged })
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError> {
        let removed = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(&collection)
                .and_then(|docs| docs.remove(id))
                .is_some()
        };
        if removed {
            self.feed.notify(collection);
        }
        Ok(removed)
    }

    fn changes(&self, collection: Collection) -> broadcast::Receiver<()> {
        self.feed.subscribe(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_assigns_an_id_and_lists_it() {
        let store = MemoryDocumentStore::new();
        let doc = store
            .create(Collection::Products, json!({ "id": "ignored", "name": "Shirt" }))
            .await
            .unwrap();

        assert_ne!(doc.id, "ignored");
        assert!(doc.data.get("id").is_none());
        let listed = store.list(Collection::Products).await.unwrap();
        assert_eq!(listed, vec![doc]);
        assert!(store.list(Collection::Orders).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_merges_shallowly_and_requires_the_document() {
        let store = MemoryDocumentStore::new();
        store
            .set(Collection::Orders, "o1", json!({ "status": "Pending", "totalAmount": "$10" }))
            .await
            .unwrap();

        let updated = store
            .update(Collection::Orders, "o1", json!({ "status": "Shipped" }))
            .await
            .unwrap();
        assert_eq!(updated.data, json!({ "status": "Shipped", "totalAmount": "$10" }));

        let missing = store
            .update(Collection::Orders, "nope", json!({ "status": "Shipped" }))
            .await;
        assert!(matches!(missing, Err(AppError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDocumentStore::new();
        store.set(Collection::Users, "u1", json!({})).await.unwrap();

        assert!(store.delete(Collection::Users, "u1").await.unwrap());
        assert!(!store.delete(Collection::Users, "u1").await.unwrap());
        assert!(store.get(Collection::Users, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn writes_are_announced_on_the_collection_feed() {
        let store = MemoryDocumentStore::new();
        let mut orders = store.changes(Collection::Orders);
        let mut users = store.changes(Collection::Users);

        store.set(Collection::Orders, "o1", json!({})).await.unwrap();

        assert!(orders.try_recv().is_ok());
        assert!(users.try_recv().is_err());
    }
}
