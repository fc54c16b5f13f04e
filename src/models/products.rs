// src/models/products.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::money::{deserialize_display_string, deserialize_lenient_decimal};

// Produto do catálogo (`newproducts`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Product {
    pub id: String,
    #[schema(example = "Ankara Shirt")]
    pub name: Option<String>,
    #[schema(example = "Clothing")]
    pub category: Option<String>,
    #[serde(deserialize_with = "deserialize_display_string")]
    #[schema(example = "₦10,000")]
    pub price: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_decimal")]
    #[schema(value_type = Option<f64>, example = 25)]
    pub stock: Option<Decimal>,
    pub description: Option<String>,
    pub size: Option<String>,
    pub colors: Option<String>,
    pub image: Option<String>,
}

impl Product {
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        [self.name.as_deref(), self.category.as_deref()]
            .into_iter()
            .flatten()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductPayload {
    #[validate(length(min = 1, message = "required"))]
    pub name: String,
    #[validate(length(min = 1, message = "required"))]
    pub category: String,
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "₦10,000")]
    pub price: String,

    // Aceita número ou texto numérico, mas nunca negativo
    #[validate(custom(function = "validate_stock"))]
    #[schema(value_type = f64, example = 25)]
    pub stock: Value,

    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub colors: Option<String>,

    #[validate(required(message = "image_required"), length(min = 1, message = "image_required"))]
    pub image: Option<String>,
}

impl ProductPayload {
    /// Estoque já validado; chamar só depois de `validate()`.
    pub fn numeric_stock(&self) -> Decimal {
        stock_value(&self.stock).unwrap_or(Decimal::ZERO)
    }
}

fn stock_value(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn validate_stock(raw: &Value) -> Result<(), ValidationError> {
    match stock_value(raw) {
        Some(stock) if stock >= Decimal::ZERO => Ok(()),
        _ => Err(ValidationError::new("invalid_stock").with_message("invalid_stock".into())),
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(stock: Value, image: Option<&str>) -> ProductPayload {
        ProductPayload {
            name: "Shirt".into(),
            category: "Clothing".into(),
            price: "$10".into(),
            stock,
            description: None,
            size: None,
            colors: None,
            image: image.map(String::from),
        }
    }

    #[test]
    fn stock_must_be_a_non_negative_number() {
        assert!(payload(json!(3), Some("https://img")).validate().is_ok());
        assert!(payload(json!("12"), Some("https://img")).validate().is_ok());
        assert!(payload(json!(-1), Some("https://img")).validate().is_err());
        assert!(payload(json!("lots"), Some("https://img")).validate().is_err());
        assert!(payload(json!(null), Some("https://img")).validate().is_err());
    }

    #[test]
    fn image_is_required() {
        let errors = payload(json!(1), None).validate().unwrap_err();
        assert!(errors.field_errors().contains_key("image"));
    }

    #[test]
    fn search_matches_name_or_category() {
        let product = Product {
            name: Some("Ankara Shirt".into()),
            category: Some("Clothing".into()),
            ..Default::default()
        };
        assert!(product.matches("shirt"));
        assert!(product.matches("CLOTH"));
        assert!(!product.matches("shoes"));
    }
}
