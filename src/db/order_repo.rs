// src/db/order_repo.rs

use serde_json::json;

use crate::{
    common::error::AppError,
    db::document_store::{decode_all, Collection, SharedStore},
    models::orders::{Order, ShippingAddress},
};

// Pedidos (`orders`) e endereços de entrega (`shippingAddresses`)
#[derive(Clone)]
pub struct OrderRepository {
    store: SharedStore,
}

impl OrderRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        let docs = self.store.list(Collection::Orders).await?;
        Ok(decode_all(Collection::Orders, &docs))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Order>, AppError> {
        let doc = self.store.get(Collection::Orders, id).await?;
        Ok(doc.map(|d| d.decode()).transpose()?)
    }

    pub async fn update_status(&self, id: &str, status: &str) -> Result<Order, AppError> {
        let doc = self
            .store
            .update(Collection::Orders, id, json!({ "status": status }))
            .await?;
        Ok(doc.decode()?)
    }

    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        self.store.delete(Collection::Orders, id).await
    }

    pub async fn list_shipping_addresses(&self) -> Result<Vec<ShippingAddress>, AppError> {
        let docs = self.store.list(Collection::ShippingAddresses).await?;
        Ok(decode_all(Collection::ShippingAddresses, &docs))
    }
}
