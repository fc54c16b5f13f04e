// src/routes.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    config::AppState,
    docs::ApiDoc,
    handlers,
    middleware::{auth::auth_guard, rbac::admin_guard},
};

// Limite do corpo no upload de imagens
const UPLOAD_LIMIT_BYTES: usize = 10 * 1024 * 1024;

pub fn build_router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Conta do próprio usuário: só exige token, qualquer papel
    let account_routes = Router::new()
        .route("/me", get(handlers::auth::get_me).delete(handlers::auth::delete_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let dashboard_routes = Router::new()
        .route("/overview", get(handlers::dashboard::get_overview))
        .route("/sales/stats", get(handlers::dashboard::get_sales_stats))
        .route("/sales/trend", get(handlers::dashboard::get_sales_trend))
        .route("/sales/by-month", get(handlers::dashboard::get_sales_by_month))
        .route("/sales/by-category", get(handlers::dashboard::get_sales_by_category))
        .route("/sales/by-weekday", get(handlers::dashboard::get_sales_by_weekday))
        .route("/revenue", get(handlers::dashboard::get_revenue))
        .route("/revenue/target", put(handlers::dashboard::set_revenue_target))
        .route("/orders/stats", get(handlers::dashboard::get_order_stats))
        .route("/orders/status", get(handlers::dashboard::get_order_status))
        .route("/orders/daily", get(handlers::dashboard::get_daily_orders))
        .route("/products/stats", get(handlers::dashboard::get_product_stats))
        .route("/products/stats/stream", get(handlers::dashboard::stream_product_stats))
        .route("/products/performance", get(handlers::dashboard::get_product_performance))
        .route("/products/categories", get(handlers::dashboard::get_product_categories))
        .route("/users/stats", get(handlers::dashboard::get_user_stats))
        .route("/users/stats/stream", get(handlers::dashboard::stream_user_stats))
        .route("/users/growth", get(handlers::dashboard::get_user_growth))
        .route("/users/activity", get(handlers::dashboard::get_user_activity))
        .route("/users/demographics", get(handlers::dashboard::get_user_demographics));

    let notification_routes = Router::new()
        .route("/", get(handlers::notifications::get_notifications))
        .route("/viewed", post(handlers::notifications::mark_viewed))
        .route("/preferences", put(handlers::notifications::update_preferences))
        .route("/stream", get(handlers::notifications::stream_notifications));

    let catalog_routes = Router::new()
        .route(
            "/products",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route(
            "/products/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route(
            "/users",
            get(handlers::users::list_users).post(handlers::users::create_user),
        )
        .route(
            "/users/{id}",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        .route("/orders", get(handlers::orders::list_orders))
        .route(
            "/orders/{id}",
            get(handlers::orders::get_order).delete(handlers::orders::delete_order),
        )
        .route("/orders/{id}/status", put(handlers::orders::update_order_status))
        .route(
            "/uploads",
            post(handlers::uploads::upload_image).layer(DefaultBodyLimit::max(UPLOAD_LIMIT_BYTES)),
        );

    // Tudo do painel: token válido + papel Admin (o auth_guard roda primeiro)
    let admin_routes = Router::new()
        .nest("/dashboard", dashboard_routes)
        .nest("/notifications", notification_routes)
        .merge(catalog_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), admin_guard))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes.merge(account_routes))
        .nest("/api", admin_routes)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::Settings,
        db::{Collection, DocumentStore, MemoryDocumentStore, SharedStore},
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app() -> (SharedStore, Router) {
        let settings = Settings::from_lookup(|key| (key == "JWT_SECRET").then(|| "test-secret".to_string())).unwrap();
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let state = AppState::for_store(settings, store.clone());
        (store, build_router(state))
    }

    fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn register(app: &Router, email: &str) -> String {
        let body = json!({ "email": email, "password": "segredo123", "firstName": "Ada" });
        let response = app.clone().oneshot(request("POST", "/api/auth/register", None, Some(body))).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    async fn admin_token(app: &Router, store: &SharedStore) -> String {
        register(app, "admin@loja.com").await;
        let accounts = store.list(Collection::Users).await.unwrap();
        let admin = accounts.iter().find(|d| d.data["email"] == "admin@loja.com").unwrap();
        store.update(Collection::Users, &admin.id, json!({ "role": "Admin" })).await.unwrap();

        let body = json!({ "email": "admin@loja.com", "password": "segredo123" });
        let response = app.clone().oneshot(request("POST", "/api/auth/login", None, Some(body))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        json_body(response).await["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (_, app) = app();
        let response = app.oneshot(request("GET", "/api/health", None, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn dashboard_needs_an_admin_token() {
        let (_, app) = app();

        let anonymous = app.clone().oneshot(request("GET", "/api/dashboard/overview", None, None)).await.unwrap();
        assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

        let token = register(&app, "user@loja.com").await;
        let me = app.clone().oneshot(request("GET", "/api/auth/me", Some(&token), None)).await.unwrap();
        assert_eq!(me.status(), StatusCode::OK);
        assert_eq!(json_body(me).await["email"], "user@loja.com");

        let refused = app.clone().oneshot(request("GET", "/api/dashboard/overview", Some(&token), None)).await.unwrap();
        assert_eq!(refused.status(), StatusCode::FORBIDDEN);

        // Login de não administrador também é recusado
        let body = json!({ "email": "user@loja.com", "password": "segredo123" });
        let login = app.oneshot(request("POST", "/api/auth/login", None, Some(body))).await.unwrap();
        assert_eq!(login.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn products_are_validated_before_any_write() {
        let (store, app) = app();
        let token = admin_token(&app, &store).await;

        let invalid = json!({ "name": "Shirt", "category": "Clothing", "price": "₦10,000", "stock": "lots" });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/products")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR")
                    .body(Body::from(invalid.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Um ou mais campos são inválidos.");
        assert!(body["details"]["stock"].is_array());
        assert!(body["details"]["image"].is_array());
        assert!(store.list(Collection::Products).await.unwrap().is_empty());

        let valid = json!({
            "name": "Shirt", "category": "Clothing", "price": "₦10,000", "stock": 80, "image": "https://img/shirt.png"
        });
        let created = app.clone().oneshot(request("POST", "/api/products", Some(&token), Some(valid))).await.unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);

        let categories = app
            .oneshot(request("GET", "/api/dashboard/products/categories", Some(&token), None))
            .await
            .unwrap();
        let body = json_body(categories).await;
        assert_eq!(body, json!([{ "name": "Clothing", "value": 1 }]));
    }

    #[tokio::test]
    async fn unknown_ranges_are_rejected() {
        let (store, app) = app();
        let token = admin_token(&app, &store).await;

        let ok = app
            .clone()
            .oneshot(request("GET", "/api/dashboard/revenue?range=This%20Month", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(ok.status(), StatusCode::OK);
        assert_eq!(json_body(ok).await["range"], "This Month");

        let bad = app
            .oneshot(request("GET", "/api/dashboard/sales/trend?range=Forever", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn orders_and_notifications() {
        let (store, app) = app();
        let token = admin_token(&app, &store).await;
        store
            .set(Collection::Orders, "o1", json!({ "status": "Pending", "totalAmount": "₦1,000" }))
            .await
            .unwrap();

        let update = app
            .clone()
            .oneshot(request("PUT", "/api/orders/o1/status", Some(&token), Some(json!({ "status": "Delivered" }))))
            .await
            .unwrap();
        assert_eq!(update.status(), StatusCode::OK);
        assert_eq!(json_body(update).await["status"], "Delivered");

        let missing = app
            .clone()
            .oneshot(request("GET", "/api/orders/ghost", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let viewed = app
            .clone()
            .oneshot(request("POST", "/api/notifications/viewed", Some(&token), None))
            .await
            .unwrap();
        assert_eq!(json_body(viewed).await, json!({ "count": 0, "viewState": "Viewed" }));

        let preferences = app
            .oneshot(request("PUT", "/api/notifications/preferences", Some(&token), Some(json!({ "push": false }))))
            .await
            .unwrap();
        assert_eq!(preferences.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn uploads_need_a_file_field() {
        let (store, app) = app();
        let token = admin_token(&app, &store).await;

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/uploads")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "multipart/form-data; boundary=XBOUNDARY")
                    .body(Body::from("--XBOUNDARY--\r\n"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
