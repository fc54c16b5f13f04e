// src/models/orders.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::money::{deserialize_display_string, deserialize_lenient_decimal, parse_amount};

// --- Status ---
// O status é texto livre no banco; estes são os valores conhecidos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Other,
}

impl OrderStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("Pending") => OrderStatus::Pending,
            Some("Processing") => OrderStatus::Processing,
            Some("Shipped") => OrderStatus::Shipped,
            Some("Delivered") => OrderStatus::Delivered,
            _ => OrderStatus::Other,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Processing => "Processing",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Other => "Other",
        }
    }
}

// --- Documentos ---

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CartItem {
    #[schema(example = "Shirt")]
    pub name: Option<String>,
    #[serde(deserialize_with = "deserialize_display_string")]
    #[schema(example = "₦10,000")]
    pub price: Option<String>,
    #[serde(deserialize_with = "deserialize_lenient_decimal")]
    #[schema(value_type = Option<f64>, example = 2)]
    pub quantity: Option<Decimal>,
    pub color: Option<String>,
    pub size: Option<String>,
}

impl CartItem {
    pub fn unit_price(&self) -> Decimal {
        parse_amount(self.price.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    #[schema(example = "Ada Obi")]
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    #[schema(example = "Lagos")]
    pub state: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Order {
    pub id: String,
    #[serde(alias = "userName")]
    pub customer_name: Option<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub cart_items: Vec<CartItem>,
    #[serde(deserialize_with = "deserialize_display_string")]
    #[schema(example = "₦25,500.00")]
    pub total_amount: Option<String>,
    #[schema(example = "Pending")]
    pub status: Option<String>,
    #[serde(deserialize_with = "deserialize_display_string")]
    #[schema(example = "2024-03-05")]
    pub date: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
}

impl Order {
    /// Valor total do pedido (zero quando ausente ou ilegível).
    pub fn total(&self) -> Decimal {
        parse_amount(self.total_amount.as_deref())
    }

    pub fn status(&self) -> OrderStatus {
        OrderStatus::parse(self.status.as_deref())
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Payloads ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderStatusPayload {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Shipped")]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_loose_documents() {
        let order: Order = serde_json::from_value(serde_json::json!({
            "id": "o1",
            "userName": "Ada",
            "cartItems": null,
            "totalAmount": 1500,
            "status": "Bogus",
            "date": "2024-03-05"
        }))
        .unwrap();

        assert_eq!(order.customer_name.as_deref(), Some("Ada"));
        assert!(order.cart_items.is_empty());
        assert_eq!(order.total(), Decimal::from(1500));
        assert_eq!(order.status(), OrderStatus::Other);
    }

    #[test]
    fn cart_quantities_accept_text() {
        let item: CartItem = serde_json::from_value(serde_json::json!({
            "name": "Shirt", "price": "$10", "quantity": "2"
        }))
        .unwrap();
        assert_eq!(item.quantity, Some(Decimal::from(2)));
        assert_eq!(item.unit_price(), Decimal::from(10));
    }
}
