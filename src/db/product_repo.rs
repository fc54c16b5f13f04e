// src/db/product_repo.rs

use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    db::document_store::{decode_all, Collection, SharedStore},
    models::products::{Product, ProductPayload},
};

#[derive(Clone)]
pub struct ProductRepository {
    store: SharedStore,
}

impl ProductRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Product>, AppError> {
        let docs = self.store.list(Collection::Products).await?;
        Ok(decode_all(Collection::Products, &docs))
    }

    pub async fn create(&self, payload: &ProductPayload) -> Result<Product, AppError> {
        let mut data = product_fields(payload);
        data["createdAt"] = json!(Utc::now().to_rfc3339());

        let doc = self.store.create(Collection::Products, data).await?;
        Ok(doc.decode()?)
    }

    pub async fn update(&self, id: &str, payload: &ProductPayload) -> Result<Product, AppError> {
        let doc = self
            .store
            .update(Collection::Products, id, product_fields(payload))
            .await?;
        Ok(doc.decode()?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.store.delete(Collection::Products, id).await
    }
}

// O estoque é sempre gravado como número
fn product_fields(payload: &ProductPayload) -> Value {
    json!({
        "name": payload.name.trim(),
        "category": payload.category.trim(),
        "price": payload.price.trim(),
        "stock": payload.numeric_stock(),
        "description": payload.description,
        "size": payload.size,
        "colors": payload.colors,
        "image": payload.image,
    })
}
