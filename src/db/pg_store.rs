// src/db/pg_store.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgListener, types::Json, PgPool};
use std::{sync::Arc, time::Duration};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::document_store::{patch_object, strip_id, ChangeFeed, Collection, Document, DocumentStore},
};

// Canal do LISTEN/NOTIFY; o trigger da migração publica o nome da coleção nele.
const CHANGE_CHANNEL: &str = "document_changes";

// Todos os documentos numa tabela só, `documents(collection, id, data JSONB)`.
pub struct PgDocumentStore {
    pool: PgPool,
    feed: Arc<ChangeFeed>,
}

impl PgDocumentStore {
    /// Abre o LISTEN e liga o canal de mudanças. Escritas de outros processos
    /// também chegam por aqui.
    pub async fn connect(pool: PgPool) -> Result<Self, AppError> {
        let feed = Arc::new(ChangeFeed::new());

        let mut listener = PgListener::connect_with(&pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;
        tokio::spawn(forward_changes(listener, feed.clone()));

        tracing::info!("📡 Escutando mudanças em '{}'", CHANGE_CHANNEL);
        Ok(Self { pool, feed })
    }
}

async fn forward_changes(mut listener: PgListener, feed: Arc<ChangeFeed>) {
    loop {
        // `recv` engoliria a queda de conexão; `try_recv` a devolve como `Ok(None)`.
        match listener.try_recv().await {
            Ok(received) => dispatch_change(&feed, received.as_ref().map(|n| n.payload())),
            Err(e) => {
                // Avisos podem ter sido perdidos: força todos a relerem.
                tracing::warn!("Falha no LISTEN, reconectando: {}", e);
                feed.notify_all();
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

// `None` = conexão perdida. O listener já reconectou (eager_reconnect), mas os
// avisos do intervalo sumiram, então todas as coleções são relidas.
fn dispatch_change(feed: &ChangeFeed, payload: Option<&str>) {
    match payload {
        Some(name) => match Collection::from_name(name) {
            Some(collection) => feed.notify(collection),
            None => tracing::debug!("Notificação de coleção desconhecida: {}", name),
        },
        None => {
            tracing::warn!("Conexão do LISTEN perdida e refeita; relendo todas as coleções");
            feed.notify_all();
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, AppError> {
        let row = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT id, data FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(id, Json(data))| Document { id, data }))
    }

    async fn list(&self, collection: Collection) -> Result<Vec<Document>, AppError> {
        let rows = sqlx::query_as::<_, (String, Json<Value>)>(
            "SELECT id, data FROM documents WHERE collection = $1 ORDER BY id",
        )
        .bind(collection.name())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, Json(data))| Document { id, data })
            .collect())
    }

    async fn create(&self, collection: Collection, data: Value) -> Result<Document, AppError> {
        let id = Uuid::new_v4().to_string();
        self.set(collection, &id, data).await
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> Result<Document, AppError> {
        let (id, Json(data)) = sqlx::query_as::<_, (String, Json<Value>)>(
            r#"
            INSERT INTO documents (collection, id, data)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, id)
            DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
            RETURNING id, data
            "#,
        )
        .bind(collection.name())
        .bind(id)
        .bind(Json(strip_id(data)))
        .fetch_one(&self.pool)
        .await?;

        Ok(Document { id, data })
    }

    async fn update(&self, collection: Collection, id: &str, patch: Value) -> Result<Document, AppError> {
        let patch = Value::Object(patch_object(patch)?);

        // `||` em JSONB é exatamente o merge raso
        let row = sqlx::query_as::<_, (String, Json<Value>)>(
            r#"
            UPDATE documents
            SET data = data || $3, updated_at = NOW()
            WHERE collection = $1 AND id = $2
            RETURNING id, data
            "#,
        )
        .bind(collection.name())
        .bind(id)
        .bind(Json(patch))
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(id, Json(data))| Document { id, data })
            .ok_or_else(|| AppError::DocumentNotFound {
                collection: collection.name(),
                id: id.to_string(),
            })
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection.name())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    fn changes(&self, collection: Collection) -> broadcast::Receiver<()> {
        self.feed.subscribe(collection)
    }
}
