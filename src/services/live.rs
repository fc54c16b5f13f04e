// src/services/live.rs

use std::{
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};
use tokio::{
    sync::broadcast::error::{RecvError, TryRecvError},
    task::AbortHandle,
};

use crate::db::{Collection, Document, SharedStore};

// Leitura que falhou é repetida sozinha, com espera dobrando até o teto.
const RETRY_MIN: Duration = Duration::from_millis(200);
const RETRY_MAX: Duration = Duration::from_secs(30);

/// Assinatura ao vivo de uma coleção.
///
/// O callback recebe sempre o snapshot completo (primeiro o inicial, depois um
/// a cada mudança). Avisos que chegam em rajada são agrupados numa releitura só.
/// Depois de `unsubscribe` (ou do drop) o callback não é mais chamado.
pub struct Subscription {
    collection: Collection,
    // O callback roda com este lock; `unsubscribe` espera o callback em curso terminar.
    active: Arc<Mutex<bool>>,
    task: AbortHandle,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Idempotente. Não chame de dentro do próprio callback.
    pub fn unsubscribe(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active {
            *active = false;
            self.task.abort();
            tracing::debug!(collection = self.collection.name(), "Assinatura encerrada");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

pub fn subscribe<F>(store: SharedStore, collection: Collection, mut on_snapshot: F) -> Subscription
where
    F: FnMut(Vec<Document>) + Send + 'static,
{
    // Escuta antes da leitura inicial para não perder mudanças entre as duas.
    let mut changes = store.changes(collection);
    let active = Arc::new(Mutex::new(true));
    let flag = active.clone();

    let task = tokio::spawn(async move {
        let mut retry = RETRY_MIN;
        loop {
            let failed = match store.list(collection).await {
                Ok(snapshot) => {
                    let still_active = flag.lock().unwrap_or_else(PoisonError::into_inner);
                    if !*still_active {
                        break;
                    }
                    on_snapshot(snapshot);
                    retry = RETRY_MIN;
                    false
                }
                Err(e) => {
                    tracing::warn!(collection = collection.name(), "Falha ao ler snapshot ao vivo: {}", e);
                    true
                }
            };

            // Depois de uma falha, relê quando der o tempo ou quando chegar um aviso.
            let woke = if failed {
                tokio::select! {
                    _ = tokio::time::sleep(retry) => {
                        retry = (retry * 2).min(RETRY_MAX);
                        Ok(())
                    }
                    received = changes.recv() => received,
                }
            } else {
                changes.recv().await
            };

            match woke {
                // Lagged só significa avisos perdidos; a releitura cobre todos.
                Ok(()) | Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }

            loop {
                match changes.try_recv() {
                    Ok(()) | Err(TryRecvError::Lagged(_)) => continue,
                    Err(_) => break,
                }
            }
        }
    });

    tracing::debug!(collection = collection.name(), "Assinatura aberta");
    Subscription { collection, active, task: task.abort_handle() }
}

/// Dono de no máximo uma assinatura: reassinar sempre encerra a anterior antes.
#[derive(Default)]
pub struct SubscriptionSlot {
    current: Option<Subscription>,
}

impl SubscriptionSlot {
    pub fn subscribe<F>(&mut self, store: SharedStore, collection: Collection, on_snapshot: F)
    where
        F: FnMut(Vec<Document>) + Send + 'static,
    {
        self.clear();
        self.current = Some(subscribe(store, collection, on_snapshot));
    }

    pub fn clear(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.unsubscribe();
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.as_ref().is_some_and(Subscription::is_active)
    }
}
