// src/common/money.rs

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Converte um valor de exibição ("₦12,345.50", "$10", "R$ 1.234") em número.
///
/// Remove tudo que não for dígito, `.` ou `-` e lê o maior prefixo numérico
/// válido do que sobrou. Valores ausentes, vazios ou ilegíveis valem zero.
pub fn parse_amount(raw: Option<&str>) -> Decimal {
    let Some(raw) = raw else {
        return Decimal::ZERO;
    };

    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();

    numeric_prefix(&cleaned)
        .and_then(|number| Decimal::from_str(&number).ok())
        .unwrap_or(Decimal::ZERO)
}

// "-12.5.3" -> "-12.5", "12." -> "12", ".5" -> "0.5", "-" -> None
fn numeric_prefix(cleaned: &str) -> Option<String> {
    let bytes = cleaned.as_bytes();
    let mut pos = 0;

    let negative = bytes.first() == Some(&b'-');
    if negative {
        pos = 1;
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_part = &cleaned[int_start..pos];

    let mut frac_part = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        frac_part = &cleaned[frac_start..end];
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut number = String::with_capacity(int_part.len() + frac_part.len() + 3);
    if negative {
        number.push('-');
    }
    number.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        number.push('.');
        number.push_str(frac_part);
    }
    Some(number)
}

/// Soma os valores de exibição, ignorando (como zero) os que não forem legíveis.
pub fn sum_amounts<'a, I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    amounts.into_iter().map(parse_amount).fold(Decimal::ZERO, Decimal::saturating_add)
}

/// Duas casas, meio centavo para cima (3.125 vira 3.13).
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Formata como moeda: símbolo, separador de milhar e duas casas ("₦12,345.50").
pub fn format_currency(value: Decimal, symbol: &str) -> String {
    let rounded = round_cents(value);
    let plain = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    format!("{sign}{symbol}{grouped}.{frac_part}")
}

/// Valores monetários chegam como texto ou como número, dependendo de quem gravou o documento.
pub fn deserialize_display_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Quantidades e estoques: número JSON ou texto numérico. Qualquer outra coisa vira `None`.
pub fn deserialize_lenient_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => Decimal::from_str(&n.to_string())
            .ok()
            .or_else(|| n.as_f64().and_then(|f| Decimal::try_from(f).ok())),
        Some(Value::String(s)) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    })
}
