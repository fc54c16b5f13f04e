// src/services/aggregation.rs
//
// Folds puros sobre snapshots completos. Cada chamada recalcula tudo a partir
// do snapshot recebido; nada é acumulado entre chamadas. Entradas vazias
// sempre produzem um resultado vazio (ou zerado) no mesmo formato.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::{
    collections::{BTreeMap, HashMap},
    hash::Hash,
    str::FromStr,
};

use crate::{
    common::{
        dates::{self, parse_calendar_date, start_of_week, to_local, MONTHS_SHORT, WEEKDAYS, WEEKDAYS_SUNDAY_FIRST},
        money::{format_currency, round_cents},
    },
    models::{
        dashboard::{
            ActivityRow, AmountEntry, CountEntry, DailyOrders, MonthlyUsers, OrderStats, OverviewStats,
            PeriodRevenue, ProductStats, RevenueRollup, SalesEntry, SalesStats, TimeRange, UserStats,
        },
        orders::{Order, OrderStatus, ShippingAddress},
        products::Product,
        users::UserProfile,
    },
};

// --- Política dos status fora dos três baldes ---
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusBucketPolicy {
    /// Status desconhecidos (e `Shipped`) ficam fora do histograma.
    #[default]
    Exclude,
    /// Status desconhecidos (e `Shipped`) vão para um balde "Other".
    Other,
}

impl FromStr for StatusBucketPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exclude" => Ok(StatusBucketPolicy::Exclude),
            "other" => Ok(StatusBucketPolicy::Other),
            other => Err(format!("STATUS_BUCKETS desconhecido: '{}'", other)),
        }
    }
}

const STATUS_BUCKETS: [OrderStatus; 3] = [OrderStatus::Pending, OrderStatus::Processing, OrderStatus::Delivered];

// Acima disso o produto conta como "top selling"; abaixo (e > 0), "low stock"
const STOCK_THRESHOLD: i64 = 50;

// Somas saturam em vez de estourar: um valor absurdo num documento não derruba o widget.
trait Accumulate: Default {
    fn accumulate(&mut self, amount: Self);
}

impl Accumulate for Decimal {
    fn accumulate(&mut self, amount: Self) {
        *self = self.saturating_add(amount);
    }
}

impl Accumulate for u64 {
    fn accumulate(&mut self, amount: Self) {
        *self = self.saturating_add(amount);
    }
}

fn sum_money(amounts: impl IntoIterator<Item = Decimal>) -> Decimal {
    amounts.into_iter().fold(Decimal::ZERO, Decimal::saturating_add)
}

// Soma por chave, preservando a ordem da primeira aparição
struct Tally<K, V> {
    order: Vec<K>,
    sums: HashMap<K, V>,
}

impl<K, V> Tally<K, V>
where
    K: Eq + Hash + Clone,
    V: Accumulate,
{
    fn new() -> Self {
        Self { order: Vec::new(), sums: HashMap::new() }
    }

    fn add(&mut self, key: K, amount: V) {
        match self.sums.get_mut(&key) {
            Some(sum) => sum.accumulate(amount),
            None => {
                self.order.push(key.clone());
                self.sums.insert(key, amount);
            }
        }
    }

    fn into_entries(self) -> Vec<(K, V)> {
        let Tally { order, mut sums } = self;
        order
            .into_iter()
            .map(|key| {
                let sum = sums.remove(&key).unwrap_or_default();
                (key, sum)
            })
            .collect()
    }
}

fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.trim().is_empty())
}

fn order_moment(order: &Order, tz: Tz) -> Option<NaiveDateTime> {
    order.date.as_deref().and_then(|raw| parse_calendar_date(raw, tz))
}

fn created_moment(user: &UserProfile, tz: Tz) -> Option<NaiveDateTime> {
    user.created_at.map(|at| to_local(at, tz))
}

// Pedidos com data legível, já com o valor parseado
fn dated_sales(orders: &[Order], tz: Tz) -> Vec<(NaiveDateTime, Decimal)> {
    orders
        .iter()
        .filter_map(|order| order_moment(order, tz).map(|moment| (moment, order.total())))
        .collect()
}

fn percent(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        Decimal::ZERO
    } else {
        round_cents(part * Decimal::ONE_HUNDRED / whole)
    }
}

fn count(n: usize) -> Decimal {
    Decimal::from(n as u64)
}

// --- Receita ---

pub fn total_revenue(orders: &[Order]) -> Decimal {
    sum_money(orders.iter().map(Order::total))
}

/// Receita por semana do mês, mês, trimestre e ano, num passe só.
/// Pedidos sem data legível ficam de fora.
pub fn revenue_by_period(orders: &[Order], tz: Tz) -> RevenueRollup {
    let mut weekly: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    let mut monthly: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    let mut quarterly: BTreeMap<(i32, u32), Decimal> = BTreeMap::new();
    let mut yearly: BTreeMap<i32, Decimal> = BTreeMap::new();

    for (moment, revenue) in dated_sales(orders, tz) {
        let year = moment.year();
        weekly.entry((year, dates::week_of_month(moment.day()))).or_default().accumulate(revenue);
        monthly.entry((year, moment.month())).or_default().accumulate(revenue);
        quarterly.entry((year, dates::quarter(moment.month()))).or_default().accumulate(revenue);
        yearly.entry(year).or_default().accumulate(revenue);
    }

    let period = |year: i32, label: String, revenue: Decimal| PeriodRevenue { year, label, revenue };

    RevenueRollup {
        weekly: weekly
            .into_iter()
            .map(|((year, week), revenue)| period(year, format!("Week {}", week), revenue))
            .collect(),
        monthly: monthly
            .into_iter()
            .map(|((year, month), revenue)| period(year, dates::month_long(month).to_string(), revenue))
            .collect(),
        quarterly: quarterly
            .into_iter()
            .map(|((year, q), revenue)| period(year, format!("Q{}", q), revenue))
            .collect(),
        yearly: yearly
            .into_iter()
            .map(|(year, revenue)| period(year, year.to_string(), revenue))
            .collect(),
    }
}

/// Entradas do rollup que pertencem ao período corrente de `today`.
pub fn revenue_for_range(rollup: &RevenueRollup, range: TimeRange, today: NaiveDate) -> Vec<PeriodRevenue> {
    let year = today.year();
    let (entries, label) = match range {
        TimeRange::ThisWeek => (&rollup.weekly, None),
        TimeRange::ThisMonth => (&rollup.monthly, Some(dates::month_long(today.month()).to_string())),
        TimeRange::ThisQuarter => (&rollup.quarterly, Some(format!("Q{}", dates::quarter(today.month())))),
        TimeRange::ThisYear => (&rollup.yearly, None),
    };

    entries
        .iter()
        .filter(|e| e.year == year)
        .filter(|e| label.as_ref().is_none_or(|l| &e.label == l))
        .cloned()
        .collect()
}

// --- Pedidos ---

/// Histograma fixo {Pending, Processing, Delivered}; o resto segue a `policy`.
pub fn status_distribution(orders: &[Order], policy: StatusBucketPolicy) -> Vec<CountEntry> {
    let mut counts = [0u64; STATUS_BUCKETS.len()];
    let mut other = 0u64;

    for order in orders {
        match STATUS_BUCKETS.iter().position(|s| *s == order.status()) {
            Some(i) => counts[i] += 1,
            None => other += 1,
        }
    }

    let mut entries: Vec<CountEntry> = STATUS_BUCKETS
        .iter()
        .zip(counts)
        .map(|(status, value)| CountEntry { name: status.label().to_string(), value })
        .collect();

    if policy == StatusBucketPolicy::Other {
        entries.push(CountEntry { name: OrderStatus::Other.label().to_string(), value: other });
    }
    entries
}

/// Pedidos por dia (`YYYY-MM-DD`), em ordem crescente.
pub fn daily_orders(orders: &[Order], tz: Tz) -> Vec<DailyOrders> {
    let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
    for (moment, _) in dated_sales(orders, tz) {
        *per_day.entry(moment.date()).or_default() += 1;
    }

    per_day
        .into_iter()
        .map(|(date, orders)| DailyOrders { date: date.format("%Y-%m-%d").to_string(), orders })
        .collect()
}

// --- Vendas ---

/// Explode os itens dos carrinhos e soma `preço x quantidade` por nome de produto.
/// Itens sem nome, preço ou quantidade são ignorados.
pub fn product_sales(orders: &[Order]) -> Vec<SalesEntry> {
    let mut tally = Tally::new();

    for item in orders.iter().flat_map(|order| order.cart_items.iter()) {
        let name = non_blank(item.name.as_deref());
        let price = non_blank(item.price.as_deref());
        let quantity = item.quantity.filter(|q| !q.is_zero());

        if let (Some(name), Some(_), Some(quantity)) = (name, price, quantity) {
            tally.add(name.to_string(), item.unit_price().saturating_mul(quantity));
        }
    }

    tally
        .into_entries()
        .into_iter()
        .map(|(name, sales)| SalesEntry { name, sales })
        .collect()
}

/// Receita por mês abreviado, só os meses com vendas, em ordem de calendário.
pub fn sales_by_month(orders: &[Order], tz: Tz) -> Vec<SalesEntry> {
    let mut per_month: BTreeMap<u32, Decimal> = BTreeMap::new();
    for (moment, revenue) in dated_sales(orders, tz) {
        per_month.entry(moment.month()).or_default().accumulate(revenue);
    }

    per_month
        .into_iter()
        .map(|(month, sales)| SalesEntry { name: dates::month_short(month).to_string(), sales })
        .collect()
}

/// Receita por dia da semana, de segunda a domingo (só os dias com vendas).
pub fn sales_by_weekday(orders: &[Order], tz: Tz) -> Vec<SalesEntry> {
    let mut per_day: [Option<Decimal>; 7] = [None; 7];
    for (moment, revenue) in dated_sales(orders, tz) {
        let slot = &mut per_day[moment.weekday().num_days_from_monday() as usize];
        *slot = Some(slot.unwrap_or_default().saturating_add(revenue));
    }

    WEEKDAYS
        .iter()
        .zip(per_day)
        .filter_map(|(name, sales)| sales.map(|sales| SalesEntry { name: name.to_string(), sales }))
        .collect()
}

/// A "categoria" de uma venda é o nome do primeiro item do carrinho.
pub fn sales_by_category(orders: &[Order]) -> Vec<AmountEntry> {
    let mut tally = Tally::new();
    for order in orders {
        let category = order
            .cart_items
            .first()
            .and_then(|item| non_blank(item.name.as_deref()))
            .unwrap_or("Others");
        tally.add(category.to_string(), order.total());
    }

    tally
        .into_entries()
        .into_iter()
        .map(|(name, value)| AmountEntry { name, value })
        .collect()
}

/// Série de vendas do período corrente de `now`.
///
/// `This Week`: domingo a sábado, um ponto por dia (zeros incluídos).
/// `This Month`: por dia do mês ("01".."31"), só dias com vendas.
/// `This Quarter` / `This Year`: por mês abreviado, só meses com vendas.
pub fn sales_trend(orders: &[Order], range: TimeRange, now: NaiveDateTime, tz: Tz) -> Vec<SalesEntry> {
    let sales = dated_sales(orders, tz);
    let today = now.date();

    match range {
        TimeRange::ThisWeek => {
            let first_day = start_of_week(now).date();
            WEEKDAYS_SUNDAY_FIRST
                .iter()
                .enumerate()
                .map(|(offset, name)| {
                    let day = first_day + Duration::days(offset as i64);
                    let total = sum_money(
                        sales
                            .iter()
                            .filter(|(moment, _)| moment.date() == day)
                            .map(|(_, amount)| *amount),
                    );
                    SalesEntry { name: name.to_string(), sales: total }
                })
                .collect()
        }
        TimeRange::ThisMonth => {
            let mut per_day: BTreeMap<u32, Decimal> = BTreeMap::new();
            for (moment, amount) in &sales {
                if moment.year() == today.year() && moment.month() == today.month() {
                    per_day.entry(moment.day()).or_default().accumulate(*amount);
                }
            }
            per_day
                .into_iter()
                .map(|(day, sales)| SalesEntry { name: format!("{:02}", day), sales })
                .collect()
        }
        TimeRange::ThisQuarter | TimeRange::ThisYear => {
            let quarter = dates::quarter(today.month());
            let mut per_month: BTreeMap<u32, Decimal> = BTreeMap::new();
            for (moment, amount) in &sales {
                let in_range = moment.year() == today.year()
                    && (range == TimeRange::ThisYear || dates::quarter(moment.month()) == quarter);
                if in_range {
                    per_month.entry(moment.month()).or_default().accumulate(*amount);
                }
            }
            per_month
                .into_iter()
                .map(|(month, sales)| SalesEntry { name: MONTHS_SHORT[(month - 1) as usize].to_string(), sales })
                .collect()
        }
    }
}

// --- Usuários ---

/// Cadastros por mês, sempre com os 12 meses (jan..dez), zerados quando vazios.
pub fn user_growth(users: &[UserProfile], tz: Tz) -> Vec<MonthlyUsers> {
    let mut per_month = [0u64; 12];
    for moment in users.iter().filter_map(|u| created_moment(u, tz)) {
        per_month[moment.month0() as usize] += 1;
    }

    MONTHS_SHORT
        .iter()
        .zip(per_month)
        .map(|(month, users)| MonthlyUsers { month: month.to_string(), users })
        .collect()
}

/// Grade 7x6 (dia da semana x bloco de 4 horas) com todas as células presentes.
pub fn activity_heatmap(users: &[UserProfile], tz: Tz) -> Vec<ActivityRow> {
    let mut rows: Vec<ActivityRow> = WEEKDAYS.iter().map(|day| ActivityRow::empty(day)).collect();
    for moment in users.iter().filter_map(|u| created_moment(u, tz)) {
        rows[moment.weekday().num_days_from_monday() as usize].bump(moment.hour());
    }
    rows
}

/// Percentual de endereços por estado (duas casas). Sem estado vira "Unknown".
pub fn demographics_by_state(addresses: &[ShippingAddress]) -> Vec<AmountEntry> {
    let mut tally = Tally::new();
    for address in addresses {
        let state = non_blank(address.state.as_deref()).unwrap_or("Unknown");
        tally.add(state.to_string(), 1u64);
    }

    let total = count(addresses.len());
    tally
        .into_entries()
        .into_iter()
        .map(|(name, n)| AmountEntry { name, value: percent(Decimal::from(n), total) })
        .collect()
}

// --- Produtos ---

pub fn category_distribution(products: &[Product]) -> Vec<CountEntry> {
    let mut tally = Tally::new();
    for product in products {
        let category = non_blank(product.category.as_deref()).unwrap_or("Uncategorized");
        tally.add(category.to_string(), 1u64);
    }

    tally
        .into_entries()
        .into_iter()
        .map(|(name, value)| CountEntry { name, value })
        .collect()
}

// --- Cards ---

/// Conversão = pedidos / usuários x 100.
pub fn overview_stats(orders: &[Order], user_count: usize, product_count: usize) -> OverviewStats {
    OverviewStats {
        total_sales: total_revenue(orders),
        total_orders: orders.len() as u64,
        total_users: user_count as u64,
        total_products: product_count as u64,
        conversion_rate: percent(count(orders.len()), count(user_count)),
    }
}

/// Crescimento compara os pedidos dos últimos 30 dias com todos os anteriores.
pub fn sales_stats(orders: &[Order], user_count: usize, now: NaiveDateTime, tz: Tz) -> SalesStats {
    let revenue = total_revenue(orders);
    let average_order_value = if orders.is_empty() {
        Decimal::ZERO
    } else {
        round_cents(revenue / count(orders.len()))
    };

    let cutoff = now - Duration::days(30);
    let recent = orders
        .iter()
        .filter_map(|order| order_moment(order, tz))
        .filter(|moment| *moment >= cutoff)
        .count();
    let earlier = orders.len() - recent;

    let sales_growth = if earlier > 0 {
        let delta = Decimal::from(recent as i64 - earlier as i64);
        round_cents(delta * Decimal::ONE_HUNDRED / count(earlier))
    } else if recent > 0 {
        Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    SalesStats {
        total_revenue: revenue,
        average_order_value,
        conversion_rate: percent(count(orders.len()), count(user_count)),
        sales_growth,
    }
}

pub fn order_stats(orders: &[Order], currency_symbol: &str) -> OrderStats {
    let with_status = |status: OrderStatus| orders.iter().filter(|o| o.status() == status).count() as u64;

    OrderStats {
        total_orders: orders.len() as u64,
        pending_orders: with_status(OrderStatus::Pending),
        completed_orders: with_status(OrderStatus::Delivered),
        total_revenue: format_currency(total_revenue(orders), currency_symbol),
    }
}

pub fn product_stats(products: &[Product], orders: &[Order], currency_symbol: &str) -> ProductStats {
    let threshold = Decimal::from(STOCK_THRESHOLD);
    let stocks = || products.iter().filter_map(|p| p.stock);

    ProductStats {
        total_products: products.len() as u64,
        top_selling: stocks().filter(|s| *s > threshold).count() as u64,
        low_stock: stocks().filter(|s| *s > Decimal::ZERO && *s < threshold).count() as u64,
        total_revenue: format_currency(total_revenue(orders), currency_symbol),
    }
}

/// `users` deve ser o diretório já mesclado (cada id uma vez só).
pub fn user_stats(users: &[UserProfile], today: NaiveDate, tz: Tz) -> UserStats {
    let new_users_today = users
        .iter()
        .filter_map(|u| created_moment(u, tz))
        .filter(|moment| moment.date() == today)
        .count() as u64;
    let active_users = users.iter().filter(|u| u.is_active == Some(true)).count() as u64;
    let churn_sum: f64 = users.iter().filter_map(|u| u.churn_rate).sum();

    UserStats {
        total_users: users.len() as u64,
        new_users_today,
        active_users,
        churn_rate: churn_sum / users.len().max(1) as f64,
    }
}
