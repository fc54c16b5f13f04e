// src/models/dashboard.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::common::{error::AppError, money::deserialize_lenient_decimal};

// --- Filtros de período ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum TimeRange {
    #[serde(rename = "This Week")]
    ThisWeek,
    #[serde(rename = "This Month")]
    ThisMonth,
    #[serde(rename = "This Quarter")]
    ThisQuarter,
    #[serde(rename = "This Year")]
    ThisYear,
}

impl TimeRange {
    pub fn label(self) -> &'static str {
        match self {
            TimeRange::ThisWeek => "This Week",
            TimeRange::ThisMonth => "This Month",
            TimeRange::ThisQuarter => "This Quarter",
            TimeRange::ThisYear => "This Year",
        }
    }
}

impl FromStr for TimeRange {
    type Err = ();

    // Aceita o rótulo ("This Week") e variações como "this-week"
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "this week" => Ok(TimeRange::ThisWeek),
            "this month" => Ok(TimeRange::ThisMonth),
            "this quarter" => Ok(TimeRange::ThisQuarter),
            "this year" => Ok(TimeRange::ThisYear),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RangeQuery {
    #[schema(example = "This Month")]
    pub range: Option<String>,
}

impl RangeQuery {
    /// Período pedido, ou `default` quando o parâmetro não veio.
    pub fn time_range(&self, default: TimeRange) -> Result<TimeRange, AppError> {
        match self.range.as_deref() {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| AppError::InvalidInput("validation.invalid_range")),
        }
    }
}

// --- Formatos dos gráficos ---

// Pizza / barras com contagem
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct CountEntry {
    pub name: String,
    pub value: u64,
}

// Pizza / barras com valor (ou percentual)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AmountEntry {
    pub name: String,
    pub value: Decimal,
}

// Séries de vendas (mês, dia da semana, dia do mês...)
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SalesEntry {
    pub name: String,
    pub sales: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct MonthlyUsers {
    #[schema(example = "Jan")]
    pub month: String,
    pub users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DailyOrders {
    #[schema(example = "2024-03-05")]
    pub date: String,
    pub orders: u64,
}

// Linha do heatmap: um dia da semana x seis blocos de 4 horas
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ActivityRow {
    #[schema(example = "Mon")]
    pub name: String,
    #[serde(rename = "0-4")]
    pub block_0_4: u64,
    #[serde(rename = "4-8")]
    pub block_4_8: u64,
    #[serde(rename = "8-12")]
    pub block_8_12: u64,
    #[serde(rename = "12-16")]
    pub block_12_16: u64,
    #[serde(rename = "16-20")]
    pub block_16_20: u64,
    #[serde(rename = "20-24")]
    pub block_20_24: u64,
}

impl ActivityRow {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            block_0_4: 0,
            block_4_8: 0,
            block_8_12: 0,
            block_12_16: 0,
            block_16_20: 0,
            block_20_24: 0,
        }
    }

    /// Incrementa o bloco da hora (0..=23).
    pub fn bump(&mut self, hour: u32) {
        let slot = match hour / 4 {
            0 => &mut self.block_0_4,
            1 => &mut self.block_4_8,
            2 => &mut self.block_8_12,
            3 => &mut self.block_12_16,
            4 => &mut self.block_16_20,
            _ => &mut self.block_20_24,
        };
        *slot += 1;
    }

    pub fn total(&self) -> u64 {
        self.block_0_4 + self.block_4_8 + self.block_8_12 + self.block_12_16 + self.block_16_20 + self.block_20_24
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PeriodRevenue {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = "Q1")]
    pub label: String,
    pub revenue: Decimal,
}

// Receita de um passe só, em quatro granularidades independentes
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueRollup {
    pub weekly: Vec<PeriodRevenue>,
    pub monthly: Vec<PeriodRevenue>,
    pub quarterly: Vec<PeriodRevenue>,
    pub yearly: Vec<PeriodRevenue>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueReport {
    pub range: TimeRange,
    pub rollup: RevenueRollup,
    // Só as entradas do período escolhido, no ano corrente
    pub entries: Vec<PeriodRevenue>,
    pub target: Decimal,
}

// --- Metas de receita (`revenueTargets`) ---

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RevenueTarget {
    #[serde(deserialize_with = "deserialize_lenient_decimal")]
    pub target: Option<Decimal>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevenueTargetPayload {
    pub range: TimeRange,
    #[validate(custom(function = "validate_target"))]
    #[schema(value_type = f64, example = 500000)]
    pub target: Value,
}

impl RevenueTargetPayload {
    pub fn numeric_target(&self) -> Decimal {
        target_value(&self.target).unwrap_or(Decimal::ZERO)
    }
}

fn target_value(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn validate_target(raw: &Value) -> Result<(), ValidationError> {
    target_value(raw)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("invalid_target").with_message("invalid_target".into()))
}

// --- Cards ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverviewStats {
    pub total_sales: Decimal,
    pub total_orders: u64,
    pub total_users: u64,
    pub total_products: u64,
    pub conversion_rate: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesStats {
    pub total_revenue: Decimal,
    pub average_order_value: Decimal,
    pub conversion_rate: Decimal,
    pub sales_growth: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total_orders: u64,
    pub pending_orders: u64,
    pub completed_orders: u64,
    #[schema(example = "₦125,000.00")]
    pub total_revenue: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductStats {
    pub total_products: u64,
    pub top_selling: u64,
    pub low_stock: u64,
    #[schema(example = "₦125,000.00")]
    pub total_revenue: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: u64,
    pub new_users_today: u64,
    pub active_users: u64,
    pub churn_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges_parse_from_labels_and_slugs() {
        assert_eq!("This Week".parse(), Ok(TimeRange::ThisWeek));
        assert_eq!("this-quarter".parse(), Ok(TimeRange::ThisQuarter));
        assert_eq!(" THIS_YEAR ".parse(), Ok(TimeRange::ThisYear));
        assert_eq!("Last Year".parse::<TimeRange>(), Err(()));
    }

    #[test]
    fn missing_range_falls_back_and_unknown_is_rejected() {
        let missing = RangeQuery { range: None };
        assert_eq!(missing.time_range(TimeRange::ThisMonth).unwrap(), TimeRange::ThisMonth);

        let bad = RangeQuery { range: Some("Forever".into()) };
        assert!(matches!(bad.time_range(TimeRange::ThisMonth), Err(AppError::InvalidInput(_))));
    }
}
