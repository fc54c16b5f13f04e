// src/handlers/dashboard.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        dates::now_local,
        error::{ApiError, AppError},
    },
    config::AppState,
    handlers::streams::watch_events,
    middleware::i18n::Locale,
    // Importamos os models para referenciar no Swagger
    models::dashboard::{
        ActivityRow, AmountEntry, CountEntry, DailyOrders, MonthlyUsers, OrderStats, OverviewStats, ProductStats,
        RangeQuery, RevenueReport, RevenueTargetPayload, SalesEntry, SalesStats, TimeRange, UserStats,
    },
    services::aggregation,
};

// Os widgets nunca falham: leitura com problema vira agregado vazio no serviço.

// GET /api/dashboard/overview
#[utoipa::path(
    get,
    path = "/api/dashboard/overview",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Cards da visão geral", body = OverviewStats),
        (status = 401, description = "Não autorizado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_overview(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.overview().await))
}

// GET /api/dashboard/sales/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/sales/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Cards da página de vendas", body = SalesStats)),
    security(("api_jwt" = []))
)]
pub async fn get_sales_stats(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.sales_stats().await))
}

// GET /api/dashboard/sales/trend?range=
#[utoipa::path(
    get,
    path = "/api/dashboard/sales/trend",
    tag = "Dashboard",
    params(("range" = Option<String>, Query, description = "This Week | This Month | This Quarter | This Year (padrão: This Month)")),
    responses(
        (status = 200, description = "Vendas no período", body = Vec<SalesEntry>),
        (status = 400, description = "Período desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sales_trend(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = query
        .time_range(TimeRange::ThisMonth)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(app_state.dashboard_service.sales_trend(range).await)))
}

// GET /api/dashboard/sales/by-month
#[utoipa::path(
    get,
    path = "/api/dashboard/sales/by-month",
    tag = "Dashboard",
    responses((status = 200, description = "Receita por mês", body = Vec<SalesEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_sales_by_month(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.sales_by_month().await))
}

// GET /api/dashboard/sales/by-category
#[utoipa::path(
    get,
    path = "/api/dashboard/sales/by-category",
    tag = "Dashboard",
    responses((status = 200, description = "Receita por categoria", body = Vec<AmountEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_sales_by_category(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.sales_by_category().await))
}

// GET /api/dashboard/sales/by-weekday
#[utoipa::path(
    get,
    path = "/api/dashboard/sales/by-weekday",
    tag = "Dashboard",
    responses((status = 200, description = "Receita por dia da semana", body = Vec<SalesEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_sales_by_weekday(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.sales_by_weekday().await))
}

// GET /api/dashboard/revenue?range=
#[utoipa::path(
    get,
    path = "/api/dashboard/revenue",
    tag = "Dashboard",
    params(("range" = Option<String>, Query, description = "Período (padrão: This Year)")),
    responses(
        (status = 200, description = "Receita por período e meta", body = RevenueReport),
        (status = 400, description = "Período desconhecido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_revenue(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<RangeQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let range = query
        .time_range(TimeRange::ThisYear)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(app_state.dashboard_service.revenue(range).await)))
}

// PUT /api/dashboard/revenue/target
#[utoipa::path(
    put,
    path = "/api/dashboard/revenue/target",
    tag = "Dashboard",
    request_body = RevenueTargetPayload,
    responses(
        (status = 204, description = "Meta gravada"),
        (status = 400, description = "Meta não numérica")
    ),
    security(("api_jwt" = []))
)]
pub async fn set_revenue_target(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<RevenueTargetPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .dashboard_service
        .set_revenue_target(payload.range, payload.numeric_target())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/dashboard/orders/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/orders/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Cards da página de pedidos", body = OrderStats)),
    security(("api_jwt" = []))
)]
pub async fn get_order_stats(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.order_stats().await))
}

// GET /api/dashboard/orders/status
#[utoipa::path(
    get,
    path = "/api/dashboard/orders/status",
    tag = "Dashboard",
    responses((status = 200, description = "Pedidos por status", body = Vec<CountEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_order_status(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.order_status().await))
}

// GET /api/dashboard/orders/daily
#[utoipa::path(
    get,
    path = "/api/dashboard/orders/daily",
    tag = "Dashboard",
    responses((status = 200, description = "Pedidos por dia", body = Vec<DailyOrders>)),
    security(("api_jwt" = []))
)]
pub async fn get_daily_orders(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.daily_orders().await))
}

// GET /api/dashboard/products/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/products/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Cards da página de produtos", body = ProductStats)),
    security(("api_jwt" = []))
)]
pub async fn get_product_stats(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.product_stats().await))
}

// GET /api/dashboard/products/performance
#[utoipa::path(
    get,
    path = "/api/dashboard/products/performance",
    tag = "Dashboard",
    responses((status = 200, description = "Vendas por produto", body = Vec<SalesEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_product_performance(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.product_performance().await))
}

// GET /api/dashboard/products/categories
#[utoipa::path(
    get,
    path = "/api/dashboard/products/categories",
    tag = "Dashboard",
    responses((status = 200, description = "Produtos por categoria", body = Vec<CountEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_product_categories(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.product_categories().await))
}

// GET /api/dashboard/users/stats
#[utoipa::path(
    get,
    path = "/api/dashboard/users/stats",
    tag = "Dashboard",
    responses((status = 200, description = "Cards da página de usuários", body = UserStats)),
    security(("api_jwt" = []))
)]
pub async fn get_user_stats(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.user_stats().await))
}

// GET /api/dashboard/users/growth
#[utoipa::path(
    get,
    path = "/api/dashboard/users/growth",
    tag = "Dashboard",
    responses((status = 200, description = "Novos usuários por mês", body = Vec<MonthlyUsers>)),
    security(("api_jwt" = []))
)]
pub async fn get_user_growth(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.user_growth().await))
}

// GET /api/dashboard/users/activity
#[utoipa::path(
    get,
    path = "/api/dashboard/users/activity",
    tag = "Dashboard",
    responses((status = 200, description = "Heatmap de cadastros (dia x bloco de 4h)", body = Vec<ActivityRow>)),
    security(("api_jwt" = []))
)]
pub async fn get_user_activity(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.user_activity().await))
}

// GET /api/dashboard/users/demographics
#[utoipa::path(
    get,
    path = "/api/dashboard/users/demographics",
    tag = "Dashboard",
    responses((status = 200, description = "Endereços de entrega por estado", body = Vec<AmountEntry>)),
    security(("api_jwt" = []))
)]
pub async fn get_user_demographics(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.dashboard_service.user_demographics().await))
}

// --- Ao vivo (SSE) ---

// GET /api/dashboard/users/stats/stream
#[utoipa::path(
    get,
    path = "/api/dashboard/users/stats/stream",
    tag = "Dashboard",
    responses((status = 200, description = "Evento `user-stats` a cada mudança em Users/newusers", content_type = "text/event-stream", body = UserStats)),
    security(("api_jwt" = []))
)]
pub async fn stream_user_stats(State(app_state): State<AppState>) -> impl IntoResponse {
    let tz = app_state.settings.timezone;
    watch_events(app_state.user_directory.watch(), "user-stats", move |users| {
        aggregation::user_stats(users, now_local(tz).date(), tz)
    })
}

// GET /api/dashboard/products/stats/stream
#[utoipa::path(
    get,
    path = "/api/dashboard/products/stats/stream",
    tag = "Dashboard",
    responses((status = 200, description = "Evento `product-stats` a cada mudança em produtos ou pedidos", content_type = "text/event-stream", body = ProductStats)),
    security(("api_jwt" = []))
)]
pub async fn stream_product_stats(State(app_state): State<AppState>) -> impl IntoResponse {
    watch_events(app_state.product_monitor.watch(), "product-stats", ProductStats::clone)
}
