// src/models/users.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::dates::deserialize_timestamp;

// --- Papel ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    #[serde(rename = "user")]
    User,
}

impl Role {
    /// Papéis ausentes ou desconhecidos nunca viram `Admin`.
    pub fn from_document(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("Admin") => Role::Admin,
            _ => Role::User,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "user",
        }
    }
}

// Perfil de usuário, vindo tanto de `Users` quanto de `newusers`
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub country: Option<String>,
    pub image: Option<String>,
    pub photo: Option<String>,
    #[schema(example = "user")]
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub churn_rate: Option<f64>,
    pub birth_date: Option<String>,
    pub age: Option<i64>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(skip_serializing)]
    #[schema(ignore)]
    pub password_hash: Option<String>,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        Role::from_document(self.role.as_deref())
    }

    /// Nome para exibição: `name`, senão "primeiro sobrenome", senão o e-mail.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let joined = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return joined;
        }
        self.email.clone().unwrap_or_default()
    }

    /// Instante usado para decidir qual cópia vence numa mesclagem.
    pub fn last_written_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Ada Obi")]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub username: Option<String>,
    pub country: Option<String>,

    // URL já enviada via /api/uploads
    #[validate(required(message = "image_required"), length(min = 1, message = "image_required"))]
    pub image: Option<String>,

    #[validate(required(message = "birth_date_required"))]
    #[schema(value_type = Option<String>, example = "1990-05-17")]
    pub birth_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(email(message = "invalid_email"))]
    pub email: String,
}

/// Idade completa em `today`.
pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i64 {
    use chrono::Datelike;
    let mut age = i64::from(today.year() - birth_date.year());
    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_roles_are_never_privileged() {
        assert_eq!(Role::from_document(Some("Admin")), Role::Admin);
        assert_eq!(Role::from_document(Some("admin ")), Role::User);
        assert_eq!(Role::from_document(Some("superuser")), Role::User);
        assert_eq!(Role::from_document(None), Role::User);
    }

    #[test]
    fn display_name_falls_back_to_first_and_last() {
        let user = UserProfile {
            first_name: Some("Ada".into()),
            last_name: Some("Obi".into()),
            ..Default::default()
        };
        assert_eq!(user.display_name(), "Ada Obi");
    }

    #[test]
    fn age_counts_whole_years() {
        let birth = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2024, 5, 16).unwrap()), 33);
        assert_eq!(age_on(birth, NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()), 34);
    }

    #[test]
    fn password_hash_is_never_serialised() {
        let user = UserProfile {
            id: "u1".into(),
            password_hash: Some("secret".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("passwordHash").is_none());
    }
}
