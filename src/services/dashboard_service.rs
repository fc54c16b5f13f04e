// src/services/dashboard_service.rs

use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::{future::Future, sync::Arc, time::Duration};

use crate::{
    common::{dates::now_local, error::AppError},
    db::{Collection, OrderRepository, ProductRepository, TargetRepository, UserRepository},
    models::{
        dashboard::{
            ActivityRow, AmountEntry, CountEntry, DailyOrders, MonthlyUsers, OrderStats, OverviewStats,
            ProductStats, RevenueReport, SalesEntry, SalesStats, TimeRange, UserStats,
        },
        orders::{Order, ShippingAddress},
        products::Product,
        users::UserProfile,
    },
    services::{
        aggregation::{self, StatusBucketPolicy},
        user_directory::merge_users,
    },
};

#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub tz: Tz,
    pub status_policy: StatusBucketPolicy,
    pub currency_symbol: Arc<str>,
    pub read_timeout: Duration,
}

// Cada widget lê o que precisa e dobra em memória. Falha de leitura (ou
// timeout) vira agregado vazio com um warn; nunca chega ao widget vizinho.
#[derive(Clone)]
pub struct DashboardService {
    order_repo: OrderRepository,
    user_repo: UserRepository,
    product_repo: ProductRepository,
    target_repo: TargetRepository,
    options: DashboardOptions,
}

impl DashboardService {
    pub fn new(
        order_repo: OrderRepository,
        user_repo: UserRepository,
        product_repo: ProductRepository,
        target_repo: TargetRepository,
        options: DashboardOptions,
    ) -> Self {
        Self { order_repo, user_repo, product_repo, target_repo, options }
    }

    async fn read<T, F>(&self, widget: &'static str, source: &'static str, read: F) -> T
    where
        T: Default,
        F: Future<Output = Result<T, AppError>>,
    {
        match tokio::time::timeout(self.options.read_timeout, read).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                tracing::warn!(widget, "Widget sem dados: {}", e);
                T::default()
            }
            Err(_) => {
                tracing::warn!(widget, "Widget sem dados: {}", AppError::ReadTimeout(source));
                T::default()
            }
        }
    }

    async fn orders(&self, widget: &'static str) -> Vec<Order> {
        self.read(widget, Collection::Orders.name(), self.order_repo.list_orders()).await
    }

    async fn accounts(&self, widget: &'static str) -> Vec<UserProfile> {
        self.read(widget, Collection::Users.name(), self.user_repo.list(Collection::Users)).await
    }

    async fn directory(&self, widget: &'static str) -> Vec<UserProfile> {
        let (accounts, profiles) = tokio::join!(
            self.read(widget, Collection::Users.name(), self.user_repo.list(Collection::Users)),
            self.read(widget, Collection::NewUsers.name(), self.user_repo.list(Collection::NewUsers)),
        );
        merge_users(&accounts, &profiles)
    }

    async fn products(&self, widget: &'static str) -> Vec<Product> {
        self.read(widget, Collection::Products.name(), self.product_repo.list()).await
    }

    async fn addresses(&self, widget: &'static str) -> Vec<ShippingAddress> {
        self.read(widget, Collection::ShippingAddresses.name(), self.order_repo.list_shipping_addresses()).await
    }

    // --- Visão geral / vendas ---

    pub async fn overview(&self) -> OverviewStats {
        let (orders, users, products) = tokio::join!(
            self.orders("overview"),
            self.accounts("overview"),
            self.products("overview"),
        );
        aggregation::overview_stats(&orders, users.len(), products.len())
    }

    pub async fn sales_stats(&self) -> SalesStats {
        let (orders, users) = tokio::join!(self.orders("sales/stats"), self.accounts("sales/stats"));
        aggregation::sales_stats(&orders, users.len(), now_local(self.options.tz), self.options.tz)
    }

    pub async fn sales_trend(&self, range: TimeRange) -> Vec<SalesEntry> {
        let orders = self.orders("sales/trend").await;
        aggregation::sales_trend(&orders, range, now_local(self.options.tz), self.options.tz)
    }

    pub async fn sales_by_month(&self) -> Vec<SalesEntry> {
        aggregation::sales_by_month(&self.orders("sales/by-month").await, self.options.tz)
    }

    pub async fn sales_by_category(&self) -> Vec<AmountEntry> {
        aggregation::sales_by_category(&self.orders("sales/by-category").await)
    }

    pub async fn sales_by_weekday(&self) -> Vec<SalesEntry> {
        aggregation::sales_by_weekday(&self.orders("sales/by-weekday").await, self.options.tz)
    }

    pub async fn revenue(&self, range: TimeRange) -> RevenueReport {
        let (orders, target) = tokio::join!(
            self.orders("revenue"),
            self.read("revenue", Collection::RevenueTargets.name(), self.target_repo.get_target(range)),
        );

        let rollup = aggregation::revenue_by_period(&orders, self.options.tz);
        let today = now_local(self.options.tz).date();
        RevenueReport {
            range,
            entries: aggregation::revenue_for_range(&rollup, range, today),
            rollup,
            target: target.unwrap_or(Decimal::ZERO),
        }
    }

    /// Escrita: aqui o erro sobe para o handler.
    pub async fn set_revenue_target(&self, range: TimeRange, target: Decimal) -> Result<(), AppError> {
        self.target_repo.set_target(range, target).await?;
        tracing::info!(range = range.label(), %target, "Meta de receita atualizada");
        Ok(())
    }

    // --- Pedidos ---

    pub async fn order_stats(&self) -> OrderStats {
        aggregation::order_stats(&self.orders("orders/stats").await, &self.options.currency_symbol)
    }

    pub async fn order_status(&self) -> Vec<CountEntry> {
        aggregation::status_distribution(&self.orders("orders/status").await, self.options.status_policy)
    }

    pub async fn daily_orders(&self) -> Vec<DailyOrders> {
        aggregation::daily_orders(&self.orders("orders/daily").await, self.options.tz)
    }

    // --- Produtos ---

    pub async fn product_stats(&self) -> ProductStats {
        let (products, orders) = tokio::join!(self.products("products/stats"), self.orders("products/stats"));
        aggregation::product_stats(&products, &orders, &self.options.currency_symbol)
    }

    pub async fn product_performance(&self) -> Vec<SalesEntry> {
        aggregation::product_sales(&self.orders("products/performance").await)
    }

    pub async fn product_categories(&self) -> Vec<CountEntry> {
        aggregation::category_distribution(&self.products("products/categories").await)
    }

    // --- Usuários ---

    pub async fn user_stats(&self) -> UserStats {
        let users = self.directory("users/stats").await;
        aggregation::user_stats(&users, now_local(self.options.tz).date(), self.options.tz)
    }

    pub async fn user_growth(&self) -> Vec<MonthlyUsers> {
        aggregation::user_growth(&self.accounts("users/growth").await, self.options.tz)
    }

    pub async fn user_activity(&self) -> Vec<ActivityRow> {
        aggregation::activity_heatmap(&self.accounts("users/activity").await, self.options.tz)
    }

    pub async fn user_demographics(&self) -> Vec<AmountEntry> {
        aggregation::demographics_by_state(&self.addresses("users/demographics").await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{
        Document, DocumentStore, MemoryDocumentStore, SharedStore,
    };
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use tokio::sync::broadcast;

    // Banco que nunca responde, para exercitar o timeout
    struct StalledStore {
        feed: crate::db::document_store::ChangeFeed,
    }

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn get(&self, _: Collection, _: &str) -> Result<Option<Document>, AppError> {
            std::future::pending().await
        }
        async fn list(&self, _: Collection) -> Result<Vec<Document>, AppError> {
            std::future::pending().await
        }
        async fn create(&self, _: Collection, _: Value) -> Result<Document, AppError> {
            std::future::pending().await
        }
        async fn set(&self, _: Collection, _: &str, _: Value) -> Result<Document, AppError> {
            std::future::pending().await
        }
        async fn update(&self, _: Collection, _: &str, _: Value) -> Result<Document, AppError> {
            std::future::pending().await
        }
        async fn delete(&self, _: Collection, _: &str) -> Result<bool, AppError> {
            std::future::pending().await
        }
        fn changes(&self, collection: Collection) -> broadcast::Receiver<()> {
            self.feed.subscribe(collection)
        }
    }

    fn service(store: SharedStore) -> DashboardService {
        DashboardService::new(
            OrderRepository::new(store.clone()),
            UserRepository::new(store.clone()),
            ProductRepository::new(store.clone()),
            TargetRepository::new(store),
            DashboardOptions {
                tz: chrono_tz::UTC,
                status_policy: StatusBucketPolicy::Exclude,
                currency_symbol: Arc::from("₦"),
                read_timeout: Duration::from_millis(50),
            },
        )
    }

    #[tokio::test]
    async fn slow_reads_fall_back_to_defaults() {
        let store: SharedStore = Arc::new(StalledStore { feed: Default::default() });
        let dashboard = service(store);

        assert_eq!(dashboard.overview().await, OverviewStats::default());
        assert_eq!(dashboard.order_status().await.iter().map(|e| e.value).sum::<u64>(), 0);
        assert_eq!(dashboard.revenue(TimeRange::ThisYear).await.target, Decimal::ZERO);
    }

    #[tokio::test]
    async fn widgets_read_the_store() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        for (id, status) in [("o1", "Pending"), ("o2", "Pending"), ("o3", "Delivered"), ("o4", "Bogus")] {
            store
                .set(Collection::Orders, id, json!({ "status": status, "totalAmount": "₦1,000", "date": "2024-01-15" }))
                .await
                .unwrap();
        }
        store.set(Collection::Users, "u1", json!({ "email": "a@x.com" })).await.unwrap();
        store.set(Collection::NewUsers, "u2", json!({ "email": "b@x.com" })).await.unwrap();

        let dashboard = service(store);
        let histogram = dashboard.order_status().await;
        assert_eq!(histogram[0].value, 2);
        assert_eq!(histogram[2].value, 1);

        let overview = dashboard.overview().await;
        assert_eq!(overview.total_orders, 4);
        assert_eq!(overview.total_users, 1);
        assert_eq!(overview.conversion_rate, Decimal::from(400));

        assert_eq!(dashboard.user_stats().await.total_users, 2);
        assert_eq!(dashboard.order_stats().await.total_revenue, "₦4,000.00");
    }

    #[tokio::test]
    async fn revenue_targets_round_trip_through_the_store() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let dashboard = service(store);

        dashboard.set_revenue_target(TimeRange::ThisMonth, Decimal::from(5000)).await.unwrap();
        assert_eq!(dashboard.revenue(TimeRange::ThisMonth).await.target, Decimal::from(5000));
        assert_eq!(dashboard.revenue(TimeRange::ThisWeek).await.target, Decimal::ZERO);
    }
}
