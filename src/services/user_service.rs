// src/services/user_service.rs

use chrono::NaiveDate;
use chrono_tz::Tz;
use serde_json::json;

use crate::{
    common::{dates::now_local, error::AppError},
    db::{Collection, UserRepository},
    models::users::{age_on, CreateUserPayload, UpdateUserPayload, UserProfile},
    services::user_directory::merge_users,
};

// CRUD de usuários sobre as duas coleções (`Users` e `newusers`)
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    tz: Tz,
}

impl UserService {
    pub fn new(user_repo: UserRepository, tz: Tz) -> Self {
        Self { user_repo, tz }
    }

    /// Diretório mesclado, filtrado por nome ou e-mail.
    pub async fn list_users(&self, search: Option<&str>) -> Result<Vec<UserProfile>, AppError> {
        let (accounts, profiles) = tokio::try_join!(
            self.user_repo.list(Collection::Users),
            self.user_repo.list(Collection::NewUsers),
        )?;
        let users = merge_users(&accounts, &profiles);

        Ok(match search.map(str::trim).filter(|term| !term.is_empty()) {
            Some(term) => {
                let term = term.to_lowercase();
                users
                    .into_iter()
                    .filter(|user| {
                        [Some(user.display_name()), user.email.clone()]
                            .into_iter()
                            .flatten()
                            .any(|field| field.to_lowercase().contains(&term))
                    })
                    .collect()
            }
            None => users,
        })
    }

    pub async fn create_user(&self, payload: &CreateUserPayload) -> Result<UserProfile, AppError> {
        let today = now_local(self.tz).date();
        let age = payload.birth_date.map(|birth: NaiveDate| age_on(birth, today));

        let user = self.user_repo.create_profile(payload, age).await?;
        tracing::info!(user_id = %user.id, "Usuário cadastrado pelo painel");
        Ok(user)
    }

    pub async fn update_user(&self, id: &str, payload: &UpdateUserPayload) -> Result<(), AppError> {
        self.user_repo
            .patch(id, json!({ "name": payload.name.trim(), "email": payload.email.trim() }))
            .await
            .map_err(AppError::or_email_conflict)
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        if !self.user_repo.delete(id).await? {
            return Err(AppError::DocumentNotFound { collection: Collection::Users.name(), id: id.to_string() });
        }
        tracing::info!(user_id = %id, "Usuário removido");
        Ok(())
    }
}
