// src/handlers/notifications.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use crate::{
    config::AppState,
    handlers::streams::watch_events,
    models::notifications::{NotificationBadge, NotificationPreferences, NotificationState},
};

// GET /api/notifications
#[utoipa::path(
    get,
    path = "/api/notifications",
    tag = "Notifications",
    responses((status = 200, description = "Contador e pedidos do último snapshot", body = NotificationState)),
    security(("api_jwt" = []))
)]
pub async fn get_notifications(State(app_state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(app_state.notifications.current()))
}

// POST /api/notifications/viewed
#[utoipa::path(
    post,
    path = "/api/notifications/viewed",
    tag = "Notifications",
    responses((status = 200, description = "Contador zerado", body = NotificationBadge)),
    security(("api_jwt" = []))
)]
pub async fn mark_viewed(State(app_state): State<AppState>) -> impl IntoResponse {
    app_state.notifications.mark_viewed();
    let badge = NotificationBadge::from(&app_state.notifications.current());
    (StatusCode::OK, Json(badge))
}

// PUT /api/notifications/preferences
#[utoipa::path(
    put,
    path = "/api/notifications/preferences",
    tag = "Notifications",
    request_body = NotificationPreferences,
    responses((status = 200, description = "Preferência aplicada", body = NotificationBadge)),
    security(("api_jwt" = []))
)]
pub async fn update_preferences(
    State(app_state): State<AppState>,
    Json(preferences): Json<NotificationPreferences>,
) -> impl IntoResponse {
    app_state.notifications.set_push_enabled(preferences.push);
    tracing::info!(push = preferences.push, "Preferência de notificações alterada");
    let badge = NotificationBadge::from(&app_state.notifications.current());
    (StatusCode::OK, Json(badge))
}

// GET /api/notifications/stream
#[utoipa::path(
    get,
    path = "/api/notifications/stream",
    tag = "Notifications",
    responses((status = 200, description = "Evento `badge` a cada mudança do contador", content_type = "text/event-stream", body = NotificationBadge)),
    security(("api_jwt" = []))
)]
pub async fn stream_notifications(State(app_state): State<AppState>) -> impl IntoResponse {
    watch_events(app_state.notifications.watch(), "badge", |state| NotificationBadge::from(state))
}
