// src/db/target_repo.rs

use rust_decimal::Decimal;
use serde_json::json;

use crate::{
    common::error::AppError,
    db::document_store::{Collection, SharedStore},
    models::dashboard::{RevenueTarget, TimeRange},
};

// Metas de receita: um documento por período, com o rótulo como id
#[derive(Clone)]
pub struct TargetRepository {
    store: SharedStore,
}

impl TargetRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get_target(&self, range: TimeRange) -> Result<Option<Decimal>, AppError> {
        let doc = self.store.get(Collection::RevenueTargets, range.label()).await?;
        let target = doc.map(|d| d.decode::<RevenueTarget>()).transpose()?;
        Ok(target.and_then(|t| t.target))
    }

    pub async fn set_target(&self, range: TimeRange, target: Decimal) -> Result<(), AppError> {
        self.store
            .set(Collection::RevenueTargets, range.label(), json!({ "target": target }))
            .await?;
        Ok(())
    }
}
