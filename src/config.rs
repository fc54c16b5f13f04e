// src/config.rs

use anyhow::{bail, Context};
use chrono_tz::Tz;
use sqlx::postgres::PgPoolOptions;
use std::{env, sync::Arc, time::Duration};

use crate::{
    common::i18n::I18nStore,
    db::{
        MemoryDocumentStore, OrderRepository, PgDocumentStore, ProductRepository, SharedStore, TargetRepository,
        UserRepository,
    },
    models::users::Role,
    services::{
        aggregation::StatusBucketPolicy,
        asset_service::{AssetService, AssetSettings},
        auth::AuthService,
        dashboard_service::{DashboardOptions, DashboardService},
        notification_service::NotificationCenter,
        order_service::OrderService,
        product_monitor::ProductMonitor,
        product_service::ProductService,
        user_directory::UserDirectory,
        user_service::UserService,
    },
};

// --- Configuração ---

#[derive(Clone)]
pub struct Settings {
    pub bind_addr: String,
    // Sem DATABASE_URL o app sobe com o banco em memória
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub timezone: Tz,
    pub read_timeout: Duration,
    pub status_policy: StatusBucketPolicy,
    pub default_role: Role,
    pub recent_login_secs: i64,
    pub currency_symbol: String,
    pub assets: AssetSettings,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let timezone = match var("DASHBOARD_TZ") {
            Some(raw) => raw
                .parse::<Tz>()
                .map_err(|e| anyhow::anyhow!("DASHBOARD_TZ inválido '{}': {}", raw, e))?,
            None => chrono_tz::UTC,
        };

        let read_timeout = match var("READ_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().context("READ_TIMEOUT_SECS deve ser um inteiro")?;
                // Zero faria todo widget cair no valor padrão na hora
                if secs == 0 {
                    bail!("READ_TIMEOUT_SECS deve ser maior que zero");
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(10),
        };

        let status_policy = match var("STATUS_BUCKETS") {
            Some(raw) => raw.parse::<StatusBucketPolicy>().map_err(anyhow::Error::msg)?,
            None => StatusBucketPolicy::default(),
        };

        let default_role = match var("DEFAULT_ROLE").as_deref() {
            None | Some("user") => Role::User,
            Some("Admin") => Role::Admin,
            Some(other) => bail!("DEFAULT_ROLE desconhecido: '{}' (use 'user' ou 'Admin')", other),
        };

        let recent_login_secs = match var("RECENT_LOGIN_SECS") {
            Some(raw) => raw.parse().context("RECENT_LOGIN_SECS deve ser um inteiro")?,
            None => 300,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: var("DATABASE_URL"),
            jwt_secret,
            timezone,
            read_timeout,
            status_policy,
            default_role,
            recent_login_secs,
            currency_symbol: var("CURRENCY_SYMBOL").unwrap_or_else(|| "₦".to_string()),
            assets: AssetSettings {
                upload_url: var("ASSET_UPLOAD_URL").unwrap_or_default(),
                upload_preset: var("ASSET_UPLOAD_PRESET").unwrap_or_default(),
                folder: var("ASSET_UPLOAD_FOLDER").unwrap_or_else(|| "dashboard".to_string()),
            },
        })
    }
}

// --- Estado compartilhado ---

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub store: SharedStore,
    pub i18n_store: Arc<I18nStore>,

    pub auth_service: AuthService,
    pub dashboard_service: DashboardService,
    pub product_service: ProductService,
    pub user_service: UserService,
    pub order_service: OrderService,
    pub asset_service: AssetService,

    // Valores ao vivo
    pub notifications: NotificationCenter,
    pub user_directory: UserDirectory,
    pub product_monitor: ProductMonitor,
}

impl AppState {
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        let store: SharedStore = match &settings.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!()
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgDocumentStore::connect(db_pool).await?)
            }
            None => {
                tracing::warn!("DATABASE_URL ausente: usando banco em memória (os dados somem ao reiniciar)");
                Arc::new(MemoryDocumentStore::new())
            }
        };

        Ok(Self::for_store(settings, store))
    }

    // --- Monta o gráfico de dependências ---
    pub fn for_store(settings: Settings, store: SharedStore) -> Self {
        let order_repo = OrderRepository::new(store.clone());
        let user_repo = UserRepository::new(store.clone());
        let product_repo = ProductRepository::new(store.clone());
        let target_repo = TargetRepository::new(store.clone());

        let dashboard_options = DashboardOptions {
            tz: settings.timezone,
            status_policy: settings.status_policy,
            currency_symbol: Arc::from(settings.currency_symbol.as_str()),
            read_timeout: settings.read_timeout,
        };

        Self {
            auth_service: AuthService::new(
                user_repo.clone(),
                settings.jwt_secret.clone(),
                settings.default_role,
                settings.recent_login_secs,
            ),
            dashboard_service: DashboardService::new(
                order_repo.clone(),
                user_repo.clone(),
                product_repo.clone(),
                target_repo,
                dashboard_options,
            ),
            product_service: ProductService::new(product_repo),
            user_service: UserService::new(user_repo, settings.timezone),
            order_service: OrderService::new(order_repo),
            asset_service: AssetService::new(settings.assets.clone()),
            notifications: NotificationCenter::new(),
            user_directory: UserDirectory::new(),
            product_monitor: ProductMonitor::new(&settings.currency_symbol),
            i18n_store: Arc::new(I18nStore::new()),
            settings: Arc::new(settings),
            store,
        }
    }

    /// Liga os valores ao vivo às coleções. Pode ser chamado de novo após `disconnect_live`.
    pub fn connect_live(&self) {
        self.notifications.connect(self.store.clone());
        self.user_directory.connect(self.store.clone());
        self.product_monitor.connect(self.store.clone());
    }

    pub fn disconnect_live(&self) {
        self.notifications.disconnect();
        self.user_directory.disconnect();
        self.product_monitor.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_secret_is_set() {
        let settings = settings(&[("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(settings.bind_addr, "0.0.0.0:3000");
        assert!(settings.database_url.is_none());
        assert_eq!(settings.timezone, chrono_tz::UTC);
        assert_eq!(settings.read_timeout, Duration::from_secs(10));
        assert_eq!(settings.status_policy, StatusBucketPolicy::Exclude);
        assert_eq!(settings.default_role, Role::User);
        assert_eq!(settings.recent_login_secs, 300);
        assert_eq!(settings.currency_symbol, "₦");
    }

    #[test]
    fn the_secret_is_required() {
        assert!(settings(&[]).is_err());
        assert!(settings(&[("JWT_SECRET", "  ")]).is_err());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("JWT_SECRET", "s"), ("DASHBOARD_TZ", "Mars/Olympus")]).is_err());
        assert!(settings(&[("JWT_SECRET", "s"), ("STATUS_BUCKETS", "maybe")]).is_err());
        assert!(settings(&[("JWT_SECRET", "s"), ("DEFAULT_ROLE", "root")]).is_err());
        assert!(settings(&[("JWT_SECRET", "s"), ("READ_TIMEOUT_SECS", "soon")]).is_err());
        assert!(settings(&[("JWT_SECRET", "s"), ("READ_TIMEOUT_SECS", "0")]).is_err());
    }

    #[test]
    fn reads_overrides() {
        let settings = settings(&[
            ("JWT_SECRET", "s"),
            ("DASHBOARD_TZ", "Africa/Lagos"),
            ("STATUS_BUCKETS", "other"),
            ("CURRENCY_SYMBOL", "$"),
        ])
        .unwrap();
        assert_eq!(settings.timezone, chrono_tz::Africa::Lagos);
        assert_eq!(settings.status_policy, StatusBucketPolicy::Other);
        assert_eq!(settings.currency_symbol, "$");
    }
}
