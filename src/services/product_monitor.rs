// src/services/product_monitor.rs

use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

use crate::{
    db::{document_store::decode_all, Collection, SharedStore},
    models::{dashboard::ProductStats, orders::Order, products::Product},
    services::{aggregation, live::SubscriptionSlot},
};

#[derive(Default)]
struct Snapshots {
    products: Vec<Product>,
    orders: Vec<Order>,
}

// Cards da página de produtos ao vivo: catálogo + receita dos pedidos
#[derive(Clone)]
pub struct ProductMonitor {
    currency_symbol: Arc<str>,
    snapshots: Arc<Mutex<Snapshots>>,
    stats: Arc<watch::Sender<ProductStats>>,
    feeds: Arc<Mutex<[SubscriptionSlot; 2]>>,
}

impl ProductMonitor {
    pub fn new(currency_symbol: &str) -> Self {
        let (stats, _) = watch::channel(aggregation::product_stats(&[], &[], currency_symbol));
        Self {
            currency_symbol: Arc::from(currency_symbol),
            snapshots: Arc::new(Mutex::new(Snapshots::default())),
            stats: Arc::new(stats),
            feeds: Arc::new(Mutex::new(Default::default())),
        }
    }

    pub fn connect(&self, store: SharedStore) {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        let [products_feed, orders_feed] = &mut *feeds;

        let (snapshots, stats, symbol) = (self.snapshots.clone(), self.stats.clone(), self.currency_symbol.clone());
        products_feed.subscribe(store.clone(), Collection::Products, move |docs| {
            let mut current = snapshots.lock().unwrap_or_else(PoisonError::into_inner);
            current.products = decode_all(Collection::Products, &docs);
            publish(&current, &stats, &symbol);
        });

        let (snapshots, stats, symbol) = (self.snapshots.clone(), self.stats.clone(), self.currency_symbol.clone());
        orders_feed.subscribe(store, Collection::Orders, move |docs| {
            let mut current = snapshots.lock().unwrap_or_else(PoisonError::into_inner);
            current.orders = decode_all(Collection::Orders, &docs);
            publish(&current, &stats, &symbol);
        });
    }

    pub fn disconnect(&self) {
        let mut feeds = self.feeds.lock().unwrap_or_else(PoisonError::into_inner);
        feeds.iter_mut().for_each(SubscriptionSlot::clear);
    }

    pub fn watch(&self) -> watch::Receiver<ProductStats> {
        self.stats.subscribe()
    }
}

fn publish(current: &Snapshots, stats: &watch::Sender<ProductStats>, symbol: &str) {
    stats.send_replace(aggregation::product_stats(&current.products, &current.orders, symbol));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDocumentStore;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn recomputes_on_product_and_order_changes() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let monitor = ProductMonitor::new("₦");
        let mut rx = monitor.watch();
        monitor.connect(store.clone());

        store.set(Collection::Products, "p1", json!({ "name": "Shirt", "stock": 80 })).await.unwrap();
        store.set(Collection::Orders, "o1", json!({ "totalAmount": "₦1,500" })).await.unwrap();

        let updated = matches!(
            tokio::time::timeout(
                Duration::from_secs(1),
                rx.wait_for(|s| s.top_selling == 1 && s.total_revenue == "₦1,500.00"),
            )
            .await,
            Ok(Ok(_))
        );
        assert!(updated);
        monitor.disconnect();
    }
}
