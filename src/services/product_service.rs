// src/services/product_service.rs

use crate::{
    common::error::AppError,
    db::{Collection, ProductRepository},
    models::products::{Product, ProductPayload},
};

#[derive(Clone)]
pub struct ProductService {
    product_repo: ProductRepository,
}

impl ProductService {
    pub fn new(product_repo: ProductRepository) -> Self {
        Self { product_repo }
    }

    // Busca vazia devolve o catálogo inteiro
    pub async fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>, AppError> {
        let products = self.product_repo.list().await?;
        Ok(match search.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => products.into_iter().filter(|p| p.matches(term)).collect(),
            None => products,
        })
    }

    /// O payload já chega validado pelo handler.
    pub async fn create_product(&self, payload: &ProductPayload) -> Result<Product, AppError> {
        let product = self.product_repo.create(payload).await?;
        tracing::info!(product_id = %product.id, "Produto criado");
        Ok(product)
    }

    pub async fn update_product(&self, id: &str, payload: &ProductPayload) -> Result<Product, AppError> {
        self.product_repo.update(id, payload).await
    }

    pub async fn delete_product(&self, id: &str) -> Result<(), AppError> {
        if !self.product_repo.delete(id).await? {
            return Err(AppError::DocumentNotFound { collection: Collection::Products.name(), id: id.to_string() });
        }
        tracing::info!(product_id = %id, "Produto removido");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryDocumentStore, SharedStore};
    use rust_decimal::Decimal;
    use serde_json::json;
    use std::sync::Arc;

    fn payload(name: &str, category: &str) -> ProductPayload {
        ProductPayload {
            name: name.into(),
            category: category.into(),
            price: "₦10,000".into(),
            stock: json!("12"),
            description: None,
            size: None,
            colors: None,
            image: Some("https://img/shirt.png".into()),
        }
    }

    #[tokio::test]
    async fn create_search_update_delete() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let service = ProductService::new(ProductRepository::new(store));

        let shirt = service.create_product(&payload("Ankara Shirt", "Clothing")).await.unwrap();
        service.create_product(&payload("Beaded Necklace", "Jewelry")).await.unwrap();
        assert_eq!(shirt.stock, Some(Decimal::from(12)));

        assert_eq!(service.list_products(None).await.unwrap().len(), 2);
        assert_eq!(service.list_products(Some("  ")).await.unwrap().len(), 2);
        let found = service.list_products(Some("jewel")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name.as_deref(), Some("Beaded Necklace"));

        let renamed = service.update_product(&shirt.id, &payload("Kaftan", "Clothing")).await.unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Kaftan"));

        service.delete_product(&shirt.id).await.unwrap();
        let missing = service.delete_product(&shirt.id).await;
        assert!(matches!(missing, Err(AppError::DocumentNotFound { .. })));
    }

    #[tokio::test]
    async fn updating_a_missing_product_is_not_found() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let service = ProductService::new(ProductRepository::new(store));
        let result = service.update_product("ghost", &payload("X", "Y")).await;
        assert!(matches!(result, Err(AppError::DocumentNotFound { .. })));
    }
}
