// src/services/order_service.rs

use crate::{
    common::error::AppError,
    db::{Collection, OrderRepository},
    models::orders::Order,
};

#[derive(Clone)]
pub struct OrderService {
    order_repo: OrderRepository,
}

impl OrderService {
    pub fn new(order_repo: OrderRepository) -> Self {
        Self { order_repo }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        self.order_repo.list_orders().await
    }

    pub async fn get_order(&self, id: &str) -> Result<Order, AppError> {
        self.order_repo.find_by_id(id).await?.ok_or_else(|| not_found(id))
    }

    // O status é texto livre; qualquer valor não vazio é aceito
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Order, AppError> {
        let status = status.trim();
        if status.is_empty() {
            return Err(AppError::InvalidInput("required"));
        }
        let order = self.order_repo.update_status(id, status).await?;
        tracing::info!(order_id = %id, status, "Status do pedido atualizado");
        Ok(order)
    }

    pub async fn delete_order(&self, id: &str) -> Result<(), AppError> {
        if !self.order_repo.delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(order_id = %id, "Pedido removido");
        Ok(())
    }
}

fn not_found(id: &str) -> AppError {
    AppError::DocumentNotFound { collection: Collection::Orders.name(), id: id.to_string() }
}
