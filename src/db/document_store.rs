// src/db/document_store.rs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::broadcast;

use crate::common::error::AppError;

// Capacidade do canal de mudanças. Como cada aviso só diz "a coleção mudou",
// perder avisos (Lagged) é inofensivo: quem escuta relê o snapshot inteiro.
const CHANGE_FEED_CAPACITY: usize = 64;

// --- Coleções ---
// Os nomes são os históricos do banco hospedado (inclusive a caixa).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Orders,
    Users,
    NewUsers,
    Products,
    ShippingAddresses,
    RevenueTargets,
}

impl Collection {
    pub const ALL: [Collection; 6] = [
        Collection::Orders,
        Collection::Users,
        Collection::NewUsers,
        Collection::Products,
        Collection::ShippingAddresses,
        Collection::RevenueTargets,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Users => "Users",
            Collection::NewUsers => "newusers",
            Collection::Products => "newproducts",
            Collection::ShippingAddresses => "shippingAddresses",
            Collection::RevenueTargets => "revenueTargets",
        }
    }

    pub fn from_name(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == raw)
    }
}

// --- Documento ---
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decodifica para um registro tipado, com o `id` do documento injetado no objeto.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        match &self.data {
            Value::Object(map) => {
                let mut map = map.clone();
                map.insert("id".to_string(), Value::String(self.id.clone()));
                serde_json::from_value(Value::Object(map))
            }
            other => serde_json::from_value(other.clone()),
        }
    }
}

/// Decodifica um snapshot inteiro. Documentos malformados são logados e ignorados.
pub fn decode_all<T: DeserializeOwned>(collection: Collection, documents: &[Document]) -> Vec<T> {
    documents
        .iter()
        .filter_map(|doc| match doc.decode::<T>() {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(collection = collection.name(), id = %doc.id, "Documento ignorado: {}", e);
                None
            }
        })
        .collect()
}

/// Remove o `id` do corpo: ele vive só na chave do documento.
pub fn strip_id(data: Value) -> Value {
    match data {
        Value::Object(mut map) => {
            map.remove("id");
            Value::Object(map)
        }
        other => other,
    }
}

/// Patches precisam ser objetos (merge raso, campo a campo).
pub fn patch_object(patch: Value) -> Result<Map<String, Value>, AppError> {
    match strip_id(patch) {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::InvalidInput("validation.invalid_fields")),
    }
}

// --- Canal de mudanças ---
// Um `broadcast` por coleção; o aviso não carrega dados.
pub struct ChangeFeed {
    senders: HashMap<Collection, broadcast::Sender<()>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        let senders = Collection::ALL
            .into_iter()
            .map(|c| (c, broadcast::channel(CHANGE_FEED_CAPACITY).0))
            .collect();
        Self { senders }
    }

    pub fn subscribe(&self, collection: Collection) -> broadcast::Receiver<()> {
        self.sender(collection).subscribe()
    }

    pub fn notify(&self, collection: Collection) {
        // Sem ouvintes o envio falha, e tudo bem.
        let _ = self.sender(collection).send(());
    }

    pub fn notify_all(&self) {
        Collection::ALL.into_iter().for_each(|c| self.notify(c));
    }

    fn sender(&self, collection: Collection) -> &broadcast::Sender<()> {
        // Todas as coleções são registradas em `new`.
        &self.senders[&collection]
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

// --- O contrato do banco de documentos ---
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, AppError>;

    /// Snapshot completo da coleção.
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, AppError>;

    /// Cria com um id gerado pelo próprio banco (UUID v4).
    async fn create(&self, collection: Collection, data: Value) -> Result<Document, AppError>;

    /// Upsert com id escolhido por quem chama.
    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<Document, AppError>;

    /// Merge raso. `DocumentNotFound` se o documento não existir.
    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<Document, AppError>;

    /// Idempotente: devolve se algo foi de fato removido.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError>;

    fn changes(&self, collection: Collection) -> broadcast::Receiver<()>;
}

pub type SharedStore = Arc<dyn DocumentStore>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Named {
        id: String,
        name: String,
    }

    #[test]
    fn collection_names_round_trip() {
        for collection in Collection::ALL {
            assert_eq!(Collection::from_name(collection.name()), Some(collection));
        }
        assert_eq!(Collection::from_name("users"), None);
    }

    #[test]
    fn decode_all_skips_malformed_documents() {
        let docs = vec![
            Document { id: "a".into(), data: json!({ "name": "Ada" }) },
            Document { id: "b".into(), data: json!({ "name": 42 }) },
            Document { id: "c".into(), data: json!("not an object") },
        ];
        let decoded: Vec<Named> = decode_all(Collection::Users, &docs);
        assert_eq!(decoded.len(), 1);
        assert_eq!(decoded[0].id, "a");
        assert_eq!(decoded[0].name, "Ada");
    }

    #[test]
    fn patches_must_be_objects() {
        assert!(patch_object(json!({ "id": "x", "a": 1 })).unwrap().get("id").is_none());
        assert!(patch_object(json!([1, 2])).is_err());
    }
}
