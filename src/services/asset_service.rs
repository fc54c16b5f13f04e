// src/services/asset_service.rs

use reqwest::{multipart, Client};
use serde_json::Value;

use crate::common::error::AppError;

#[derive(Debug, Clone)]
pub struct AssetSettings {
    pub upload_url: String,
    pub upload_preset: String,
    pub folder: String,
}

// Repassa imagens para o host de arquivos e devolve a URL pública
#[derive(Clone)]
pub struct AssetService {
    client: Client,
    settings: AssetSettings,
}

impl AssetService {
    pub fn new(settings: AssetSettings) -> Self {
        Self { client: Client::new(), settings }
    }

    pub async fn upload(&self, file_name: String, content_type: Option<String>, bytes: Vec<u8>) -> Result<String, AppError> {
        if self.settings.upload_url.is_empty() {
            return Err(AppError::UploadError("ASSET_UPLOAD_URL não configurado".into()));
        }

        let mut part = multipart::Part::bytes(bytes).file_name(file_name);
        if let Some(mime) = content_type {
            part = part.mime_str(&mime)?;
        }

        let form = multipart::Form::new()
            .part("file", part)
            .text("upload_preset", self.settings.upload_preset.clone())
            .text("folder", self.settings.folder.clone());

        let response = self.client.post(&self.settings.upload_url).multipart(form).send().await?;
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let reason = provider_message(&body).unwrap_or_else(|| status.to_string());
            tracing::warn!(%status, "Upload recusado pelo host: {}", reason);
            return Err(AppError::UploadError(reason));
        }

        body.get("secure_url")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| AppError::UploadError("resposta sem secure_url".into()))
    }
}

fn provider_message(body: &Value) -> Option<String> {
    body.pointer("/error/message").and_then(Value::as_str).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reads_the_provider_error_message() {
        let body = json!({ "error": { "message": "Invalid upload preset" } });
        assert_eq!(provider_message(&body).as_deref(), Some("Invalid upload preset"));
        assert_eq!(provider_message(&json!({})), None);
    }

    #[tokio::test]
    async fn refuses_to_upload_without_an_endpoint() {
        let service = AssetService::new(AssetSettings {
            upload_url: String::new(),
            upload_preset: "preset".into(),
            folder: "dashboard".into(),
        });
        let result = service.upload("a.png".into(), None, vec![1, 2, 3]).await;
        assert!(matches!(result, Err(AppError::UploadError(_))));
    }
}
