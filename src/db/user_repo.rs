// src/db/user_repo.rs

use chrono::Utc;
use serde_json::{json, Value};

use crate::{
    common::error::AppError,
    db::document_store::{decode_all, Collection, SharedStore},
    models::users::{CreateUserPayload, Role, UserProfile},
};

// Onde um "usuário" pode estar: contas (`Users`) e cadastros feitos pelo painel (`newusers`)
pub const USER_SOURCES: [Collection; 2] = [Collection::Users, Collection::NewUsers];

pub struct NewAccount<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub role: Role,
}

#[derive(Clone)]
pub struct UserRepository {
    store: SharedStore,
}

impl UserRepository {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(&self, source: Collection) -> Result<Vec<UserProfile>, AppError> {
        let docs = self.store.list(source).await?;
        Ok(decode_all(source, &docs))
    }

    // Busca uma conta pelo e-mail (sem diferenciar maiúsculas)
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserProfile>, AppError> {
        let email = email.trim();
        let accounts = self.list(Collection::Users).await?;
        Ok(accounts.into_iter().find(|user| {
            user.email
                .as_deref()
                .is_some_and(|e| e.trim().eq_ignore_ascii_case(email))
        }))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserProfile>, AppError> {
        let doc = self.store.get(Collection::Users, id).await?;
        Ok(doc.map(|d| d.decode()).transpose()?)
    }

    pub async fn create_account(&self, account: NewAccount<'_>) -> Result<UserProfile, AppError> {
        let now = Utc::now().to_rfc3339();
        let data = json!({
            "email": account.email.trim(),
            "passwordHash": account.password_hash,
            "firstName": account.first_name,
            "lastName": account.last_name,
            "role": account.role.as_str(),
            "isActive": true,
            "createdAt": now,
            "updatedAt": now,
        });

        let doc = self.store.create(Collection::Users, data).await?;
        Ok(doc.decode()?)
    }

    // Cadastro feito pelo formulário do painel
    pub async fn create_profile(&self, payload: &CreateUserPayload, age: Option<i64>) -> Result<UserProfile, AppError> {
        let now = Utc::now().to_rfc3339();
        let data = json!({
            "name": payload.name.trim(),
            "email": payload.email.trim(),
            "phone": payload.phone,
            "address": payload.address,
            "username": payload.username,
            "country": payload.country,
            "image": payload.image,
            "birthDate": payload.birth_date.map(|d| d.to_string()),
            "age": age,
            "role": Role::User.as_str(),
            "isActive": true,
            "createdAt": now,
            "updatedAt": now,
        });

        let doc = self.store.create(Collection::NewUsers, data).await?;
        Ok(doc.decode()?)
    }

    /// Aplica o patch nas duas coleções. Falta em uma delas não é erro;
    /// falta nas duas é `DocumentNotFound`.
    pub async fn patch(&self, id: &str, mut patch: Value) -> Result<(), AppError> {
        patch["updatedAt"] = json!(Utc::now().to_rfc3339());

        let mut found = false;
        for source in USER_SOURCES {
            match self.store.update(source, id, patch.clone()).await {
                Ok(_) => found = true,
                Err(AppError::DocumentNotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }

        if found {
            Ok(())
        } else {
            Err(AppError::DocumentNotFound { collection: Collection::Users.name(), id: id.to_string() })
        }
    }

    /// Remove o id das duas coleções; devolve se algo foi removido.
    pub async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut removed = false;
        for source in USER_SOURCES {
            removed |= self.store.delete(source, id).await?;
        }
        Ok(removed)
    }
}
