// src/services/notification_service.rs

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::{
    db::{document_store::decode_all, Collection, SharedStore},
    models::{
        notifications::{NotificationState, ViewState},
        orders::Order,
    },
    services::live::SubscriptionSlot,
};

// O contador de pedidos "não vistos", compartilhado pelo app inteiro.
// Criado uma vez no AppState; só estes métodos escrevem no estado.
#[derive(Clone)]
pub struct NotificationCenter {
    state: Arc<watch::Sender<NotificationState>>,
    feed: Arc<Mutex<SubscriptionSlot>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(NotificationState::default());
        Self {
            state: Arc::new(state),
            feed: Arc::new(Mutex::new(SubscriptionSlot::default())),
        }
    }

    /// Liga o contador à coleção `orders`. Reconectar troca a assinatura anterior.
    pub fn connect(&self, store: SharedStore) {
        // O callback segura só o estado; segurar o slot criaria um ciclo de Arc.
        let state = self.state.clone();
        let mut feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner);
        feed.subscribe(store, Collection::Orders, move |docs| {
            apply_snapshot(&state, decode_all(Collection::Orders, &docs));
        });
    }

    pub fn disconnect(&self) {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    pub fn current(&self) -> NotificationState {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<NotificationState> {
        self.state.subscribe()
    }

    /// Novo snapshot: o contador passa a ser o tamanho dele. Um snapshot não vazio
    /// volta o estado para `Unviewed`, mesmo que já tenha sido visto.
    pub fn apply_snapshot(&self, orders: Vec<Order>) {
        apply_snapshot(&self.state, orders);
    }

    pub fn mark_viewed(&self) {
        self.state.send_modify(|state| {
            state.count = 0;
            state.view_state = ViewState::Viewed;
        });
    }

    // Com o push desligado o contador fica em zero.
    pub fn set_count(&self, count: usize) {
        self.state.send_modify(|state| {
            if state.push_enabled {
                state.count = count;
            }
        });
    }

    /// Desligar zera o contador; religar reaplica o tamanho do último snapshot.
    pub fn set_push_enabled(&self, enabled: bool) {
        self.state.send_modify(|state| {
            state.push_enabled = enabled;
            if enabled {
                state.count = state.orders.len();
                if state.count > 0 {
                    state.view_state = ViewState::Unviewed;
                }
            } else {
                state.count = 0;
            }
        });
    }
}

fn apply_snapshot(state: &watch::Sender<NotificationState>, orders: Vec<Order>) {
    state.send_modify(|state| {
        state.orders = Arc::new(orders);
        if state.push_enabled {
            state.count = state.orders.len();
            if state.count > 0 {
                state.view_state = ViewState::Unviewed;
            }
        }
    });
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use serde_json::json;
    use std::time::Duration;

    fn orders(n: usize) -> Vec<Order> {
        (0..n).map(|i| Order { id: i.to_string(), ..Default::default() }).collect()
    }

    #[test]
    fn mark_viewed_resets_and_new_snapshots_count_again() {
        let center = NotificationCenter::new();
        center.apply_snapshot(orders(3));
        assert_eq!(center.current().count, 3);
        assert_eq!(center.current().view_state, ViewState::Unviewed);

        center.mark_viewed();
        assert_eq!(center.current().count, 0);
        assert_eq!(center.current().view_state, ViewState::Viewed);

        center.apply_snapshot(orders(4));
        assert_eq!(center.current().count, 4);
        assert_eq!(center.current().view_state, ViewState::Unviewed);
    }

    #[test]
    fn empty_snapshot_keeps_the_viewed_state() {
        let center = NotificationCenter::new();
        center.mark_viewed();
        center.apply_snapshot(Vec::new());
        assert_eq!(center.current().count, 0);
        assert_eq!(center.current().view_state, ViewState::Viewed);
    }

    #[test]
    fn push_preference_pins_the_counter_to_zero() {
        let center = NotificationCenter::new();
        center.set_push_enabled(false);
        center.apply_snapshot(orders(2));
        assert_eq!(center.current().count, 0);
        assert_eq!(center.current().orders.len(), 2);

        center.set_push_enabled(true);
        assert_eq!(center.current().count, 2);
    }

    #[test]
    fn watchers_see_every_change() {
        let center = NotificationCenter::new();
        let mut rx = center.watch();
        center.set_count(7);
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().count, 7);
    }

    #[tokio::test]
    async fn follows_the_orders_collection() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let center = NotificationCenter::new();
        let mut rx = center.watch();
        center.connect(store.clone());

        store.set(Collection::Orders, "o1", json!({ "status": "Pending" })).await.unwrap();

        let counted = matches!(
            tokio::time::timeout(Duration::from_secs(1), rx.wait_for(|s| s.count == 1)).await,
            Ok(Ok(_))
        );
        assert!(counted);

        center.disconnect();
    }
}
