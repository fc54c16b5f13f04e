// src/services/auth.rs

use bcrypt::{hash, verify};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    common::error::AppError,
    db::{user_repo::NewAccount, UserRepository},
    models::{
        auth::{Claims, RegisterUserPayload},
        users::{Role, UserProfile},
    },
};

#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_secret: String,
    default_role: Role,
    recent_login_secs: i64,
    // Serializa "e-mail livre?" + criação; o banco de documentos não tem chave única.
    registration: Arc<Mutex<()>>,
}

impl AuthService {
    pub fn new(user_repo: UserRepository, jwt_secret: String, default_role: Role, recent_login_secs: i64) -> Self {
        Self {
            user_repo,
            jwt_secret,
            default_role,
            recent_login_secs,
            registration: Arc::new(Mutex::new(())),
        }
    }

    pub async fn register_user(&self, payload: &RegisterUserPayload) -> Result<String, AppError> {
        // O hash vem antes do lock para não segurar os outros cadastros.
        let password_clone = payload.password.clone();
        let hashed_password = tokio::task::spawn_blocking(move || hash(&password_clone, bcrypt::DEFAULT_COST))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;

        let _guard = self.registration.lock().await;

        if self.user_repo.find_by_email(&payload.email).await?.is_some() {
            return Err(AppError::EmailAlreadyExists);
        }

        let user = self
            .user_repo
            .create_account(NewAccount {
                email: &payload.email,
                password_hash: &hashed_password,
                first_name: payload.first_name.as_deref(),
                last_name: payload.last_name.as_deref(),
                role: self.default_role,
            })
            .await
            // Outro processo no mesmo banco ganhou a corrida
            .map_err(AppError::or_email_conflict)?;

        tracing::info!(user_id = %user.id, "Conta criada");
        self.create_token(&user.id)
    }

    /// Só administradores entram no painel.
    pub async fn login_user(&self, email: &str, password: &str) -> Result<String, AppError> {
        let user = self
            .user_repo
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        // Conta sem senha (ex.: criada por provedor externo) não entra por aqui
        let password_hash = user.password_hash.clone().ok_or(AppError::InvalidCredentials)?;
        let password_clone = password.to_owned();

        // Executa a verificação em um thread separado
        let is_password_valid = tokio::task::spawn_blocking(move || verify(&password_clone, &password_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))??;

        if !is_password_valid {
            tracing::info!(user_id = %user.id, "Senha incorreta");
            return Err(AppError::InvalidCredentials);
        }

        if user.role() != Role::Admin {
            tracing::warn!(user_id = %user.id, "Login recusado: usuário sem papel de administrador");
            return Err(AppError::NotAdmin);
        }

        self.create_token(&user.id)
    }

    pub async fn validate_token(&self, token: &str) -> Result<(UserProfile, Claims), AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::default(),
        )
        .map_err(|_| AppError::InvalidToken)?;

        let user = self
            .user_repo
            .find_by_id(&token_data.claims.sub)
            .await?
            .ok_or(AppError::UserNotFound)?;

        Ok((user, token_data.claims))
    }

    /// Exclusão da própria conta; exige um login recente.
    pub async fn delete_account(&self, claims: &Claims) -> Result<(), AppError> {
        let now = Utc::now().timestamp();
        if now - claims.iat as i64 > self.recent_login_secs {
            return Err(AppError::RequiresRecentLogin);
        }

        if !self.user_repo.delete(&claims.sub).await? {
            return Err(AppError::UserNotFound);
        }
        tracing::info!(user_id = %claims.sub, "Conta excluída");
        Ok(())
    }

    fn create_token(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::days(7);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_ref()),
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Collection, MemoryDocumentStore, SharedStore};
    use serde_json::json;
    use std::sync::Arc;

    fn payload(email: &str) -> RegisterUserPayload {
        RegisterUserPayload {
            email: email.into(),
            password: "segredo123".into(),
            first_name: Some("Ada".into()),
            last_name: None,
        }
    }

    fn service(store: SharedStore, recent_login_secs: i64) -> AuthService {
        AuthService::new(UserRepository::new(store), "test-secret".into(), Role::User, recent_login_secs)
    }

    async fn promote(store: &SharedStore, email: &str) {
        let accounts = store.list(Collection::Users).await.unwrap();
        let doc = accounts.iter().find(|d| d.data["email"] == email).unwrap();
        store.update(Collection::Users, &doc.id, json!({ "role": "Admin" })).await.unwrap();
    }

    #[tokio::test]
    async fn register_rejects_duplicate_emails() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let auth = service(store, 300);

        auth.register_user(&payload("ada@x.com")).await.unwrap();
        let again = auth.register_user(&payload("ADA@x.com")).await;
        assert!(matches!(again, Err(AppError::EmailAlreadyExists)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_registrations_create_one_account() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let auth = service(store.clone(), 300);
        let p = payload("ada@x.com");

        let (a, b) = tokio::join!(auth.register_user(&p), auth.register_user(&p));

        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(AppError::EmailAlreadyExists)));
        assert_eq!(store.list(Collection::Users).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn login_requires_admin_role() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let auth = service(store.clone(), 300);
        auth.register_user(&payload("ada@x.com")).await.unwrap();

        let refused = auth.login_user("ada@x.com", "segredo123").await;
        assert!(matches!(refused, Err(AppError::NotAdmin)));

        let wrong = auth.login_user("ada@x.com", "errada").await;
        assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

        promote(&store, "ada@x.com").await;
        let token = auth.login_user("ada@x.com", "segredo123").await.unwrap();
        let (user, claims) = auth.validate_token(&token).await.unwrap();
        assert_eq!(user.role(), Role::Admin);
        assert_eq!(claims.sub, user.id);
    }

    #[tokio::test]
    async fn garbage_tokens_are_rejected() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let auth = service(store, 300);
        assert!(matches!(auth.validate_token("nope").await, Err(AppError::InvalidToken)));
    }

    #[tokio::test]
    async fn deleting_an_account_needs_a_recent_login() {
        let store: SharedStore = Arc::new(MemoryDocumentStore::new());
        let auth = service(store.clone(), 300);
        let token = auth.register_user(&payload("ada@x.com")).await.unwrap();
        let (_, claims) = auth.validate_token(&token).await.unwrap();

        let stale = Claims { iat: claims.iat - 3600, ..claims.clone() };
        assert!(matches!(auth.delete_account(&stale).await, Err(AppError::RequiresRecentLogin)));

        auth.delete_account(&claims).await.unwrap();
        assert!(store.list(Collection::Users).await.unwrap().is_empty());
    }
}
