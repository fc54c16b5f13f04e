// src/models/notifications.rs

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::models::orders::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum ViewState {
    Unviewed,
    Viewed,
}

// O que o contador publica a cada mudança
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationState {
    pub count: usize,
    pub view_state: ViewState,
    pub push_enabled: bool,
    #[schema(value_type = Vec<Order>)]
    pub orders: Arc<Vec<Order>>,
}

impl Default for NotificationState {
    fn default() -> Self {
        Self {
            count: 0,
            view_state: ViewState::Unviewed,
            push_enabled: true,
            orders: Arc::new(Vec::new()),
        }
    }
}

// Versão enxuta para o SSE (sem a lista de pedidos)
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBadge {
    pub count: usize,
    pub view_state: ViewState,
}

impl From<&NotificationState> for NotificationBadge {
    fn from(state: &NotificationState) -> Self {
        Self { count: state.count, view_state: state.view_state }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationPreferences {
    pub push: bool,
}
