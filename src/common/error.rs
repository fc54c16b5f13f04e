// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// O erro "interno" da aplicação. Todo serviço e repositório devolve este tipo.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Falhas de validação que não vêm do `validator` (ex: estoque não numérico).
    // O conteúdo é a chave de tradução da mensagem.
    #[error("Entrada inválida: {0}")]
    InvalidInput(&'static str),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Operação exige login recente")]
    RequiresRecentLogin,

    #[error("Usuário não é administrador")]
    NotAdmin,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Documento '{id}' não encontrado em '{collection}'")]
    DocumentNotFound { collection: &'static str, id: String },

    #[error("Tempo esgotado ao ler a coleção '{0}'")]
    ReadTimeout(&'static str),

    #[error("Falha no upload do arquivo: {0}")]
    UploadError(String),

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Documento malformado: {0}")]
    DecodeError(#[from] serde_json::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro no cliente HTTP: {0}")]
    HttpError(#[from] reqwest::Error),
}

// O erro "externo": o que de fato vai para o cliente HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Violação do índice único de e-mail (migração) vira conflito de cadastro.
    pub fn or_email_conflict(self) -> AppError {
        match self {
            AppError::DatabaseError(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                AppError::EmailAlreadyExists
            }
            other => other,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::RequiresRecentLogin | AppError::NotAdmin => StatusCode::FORBIDDEN,
            AppError::UserNotFound | AppError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::ReadTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::UploadError(_) | AppError::HttpError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Chave de tradução usada para montar a mensagem pública.
    pub fn message_key(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "validation.invalid_fields",
            AppError::InvalidInput(key) => *key,
            AppError::EmailAlreadyExists => "auth.email_exists",
            AppError::InvalidCredentials => "auth.invalid_credentials",
            AppError::RequiresRecentLogin => "auth.requires_recent_login",
            AppError::NotAdmin => "auth.not_admin",
            AppError::InvalidToken => "auth.invalid_token",
            AppError::UserNotFound => "auth.user_not_found",
            AppError::DocumentNotFound { .. } => "store.not_found",
            AppError::ReadTimeout(_) => "store.timeout",
            AppError::UploadError(_) | AppError::HttpError(_) => "upload.failed",
            _ => "generic.unexpected",
        }
    }

    /// Política única de apresentação de erros: loga o que for interno e traduz a mensagem.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {}", self);
        } else {
            tracing::debug!("Requisição rejeitada: {}", self);
        }

        let error = i18n.translate(&locale.0, self.message_key());

        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details: HashMap<String, Vec<String>> = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages = field_errors
                        .iter()
                        .map(|e| {
                            let key = e.message.as_deref().unwrap_or(&*e.code);
                            i18n.translate(&locale.0, key)
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(json!(details))
            }
            AppError::UploadError(reason) => Some(json!({ "reason": reason })),
            _ => None,
        };

        ApiError { status, error, details }
    }
}
