// src/middleware/rbac.rs

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::users::Role,
};

/// Guardião do painel: roda depois do `auth_guard` e só deixa passar `Admin`.
/// Papel ausente ou desconhecido conta como `user`.
pub async fn admin_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let role = request
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.profile.role());

    match role {
        Some(Role::Admin) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("Acesso negado: usuário sem papel de administrador");
            Err(AppError::NotAdmin.to_api_error(&locale, &app_state.i18n_store))
        }
        None => Err(AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store)),
    }
}
