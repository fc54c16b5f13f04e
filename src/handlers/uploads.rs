// src/handlers/uploads.rs

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = "https://res.cloudinary.com/demo/image/upload/v1/dashboard/shirt.png")]
    pub secure_url: String,
}

// Só para o Swagger: o formulário multipart esperado
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct UploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

// POST /api/uploads
#[utoipa::path(
    post,
    path = "/api/uploads",
    tag = "Uploads",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Imagem enviada ao host de arquivos", body = UploadResponse),
        (status = 400, description = "Nenhum arquivo no campo `file`"),
        (status = 502, description = "Host de arquivos recusou o upload")
    ),
    security(("api_jwt" = []))
)]
pub async fn upload_image(
    State(app_state): State<AppState>,
    locale: Locale,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| to_api(AppError::InvalidInput("validation.missing_file")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|_| to_api(AppError::InvalidInput("validation.missing_file")))?;

        if bytes.is_empty() {
            break;
        }

        let secure_url = app_state
            .asset_service
            .upload(file_name, content_type, bytes.to_vec())
            .await
            .map_err(to_api)?;

        return Ok((StatusCode::OK, Json(UploadResponse { secure_url })));
    }

    Err(to_api(AppError::InvalidInput("validation.missing_file")))
}
