// src/common/dates.rs

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

pub const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub const MONTHS_LONG: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

// Ordem canônica dos gráficos (segunda primeiro)
pub const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

// Ordem do "This Week" (a semana começa no domingo)
pub const WEEKDAYS_SUNDAY_FIRST: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

pub fn month_short(month: u32) -> &'static str {
    MONTHS_SHORT[(month.clamp(1, 12) - 1) as usize]
}

pub fn month_long(month: u32) -> &'static str {
    MONTHS_LONG[(month.clamp(1, 12) - 1) as usize]
}

pub fn weekday_short(day: Weekday) -> &'static str {
    WEEKDAYS[day.num_days_from_monday() as usize]
}

/// "Week 1" cobre os dias 1-7, "Week 2" os dias 8-14 e assim por diante.
pub fn week_of_month(day: u32) -> u32 {
    day.div_ceil(7)
}

pub fn quarter(month: u32) -> u32 {
    (month.clamp(1, 12) - 1) / 3 + 1
}

/// Converte um instante para o relógio de parede do fuso configurado.
pub fn to_local(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

pub fn now_local(tz: Tz) -> NaiveDateTime {
    to_local(Utc::now(), tz)
}

/// Lê a data de um pedido.
///
/// Textos com fuso (RFC 3339) são convertidos para `tz`; textos sem fuso
/// ("2024-03-05", "2024-03-05T10:00:00", "03/05/2024") já são tratados como
/// horário local de `tz`.
pub fn parse_calendar_date(raw: &str, tz: Tz) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
        return Some(to_local(with_offset.with_timezone(&Utc), tz));
    }

    const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }

    const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

/// Timestamps de criação vêm em vários formatos: RFC 3339, milissegundos desde a
/// época, ou o objeto `{ seconds, nanoseconds }` do banco hospedado.
/// Formatos desconhecidos viram `None` em vez de invalidar o documento inteiro.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(timestamp_from_value))
}

fn timestamp_from_value(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| Utc.from_utc_datetime(&naive))
            }),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        Value::Object(map) => {
            let seconds = map
                .get("seconds")
                .or_else(|| map.get("_seconds"))
                .and_then(Value::as_i64)?;
            let nanos = map
                .get("nanoseconds")
                .or_else(|| map.get("_nanoseconds"))
                .and_then(Value::as_u64)
                .unwrap_or(0);
            DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?)
        }
        _ => None,
    }
}

/// Início do dia (00:00) de uma data local.
pub fn start_of_day(moment: NaiveDateTime) -> NaiveDateTime {
    moment.date().and_time(chrono::NaiveTime::MIN)
}

/// Domingo da semana corrente, às 00:00.
pub fn start_of_week(moment: NaiveDateTime) -> NaiveDateTime {
    let offset = moment.weekday().num_days_from_sunday() as i64;
    start_of_day(moment) - chrono::Duration::days(offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Stamped {
        #[serde(default, deserialize_with = "deserialize_timestamp")]
        created_at: Option<DateTime<Utc>>,
    }

    fn created_at(json: &str) -> Option<DateTime<Utc>> {
        serde_json::from_str::<Stamped>(json).unwrap().created_at
    }

    #[test]
    fn calendar_labels() {
        assert_eq!(week_of_month(1), 1);
        assert_eq!(week_of_month(7), 1);
        assert_eq!(week_of_month(8), 2);
        assert_eq!(week_of_month(31), 5);
        assert_eq!(quarter(1), 1);
        assert_eq!(quarter(3), 1);
        assert_eq!(quarter(4), 2);
        assert_eq!(quarter(12), 4);
        assert_eq!(month_short(3), "Mar");
        assert_eq!(month_long(12), "December");
        assert_eq!(weekday_short(Weekday::Sun), "Sun");
    }

    #[test]
    fn parses_order_dates_in_the_configured_zone() {
        let lagos: Tz = "Africa/Lagos".parse().unwrap();

        let plain = parse_calendar_date("2024-03-05", lagos).unwrap();
        assert_eq!((plain.month(), plain.day(), plain.hour()), (3, 5, 0));

        // 23:30 UTC já é dia seguinte em Lagos (UTC+1)
        let shifted = parse_calendar_date("2024-03-05T23:30:00Z", lagos).unwrap();
        assert_eq!((shifted.day(), shifted.hour()), (6, 0));

        let us = parse_calendar_date("12/25/2023", lagos).unwrap();
        assert_eq!((us.year(), us.month(), us.day()), (2023, 12, 25));

        assert!(parse_calendar_date("not a date", lagos).is_none());
        assert!(parse_calendar_date("", lagos).is_none());
    }

    #[test]
    fn accepts_the_usual_timestamp_shapes() {
        let rfc = created_at(r#"{"created_at":"2024-01-15T10:00:00Z"}"#).unwrap();
        let millis = created_at(r#"{"created_at":1705312800000}"#).unwrap();
        let object = created_at(r#"{"created_at":{"seconds":1705312800,"nanoseconds":0}}"#).unwrap();
        assert_eq!(rfc, millis);
        assert_eq!(rfc, object);

        assert!(created_at(r#"{"created_at":true}"#).is_none());
        assert!(created_at(r#"{"created_at":null}"#).is_none());
        assert!(created_at(r#"{}"#).is_none());
    }

    #[test]
    fn out_of_range_nanoseconds_are_rejected() {
        assert!(created_at(r#"{"created_at":{"seconds":1705312800,"nanoseconds":4294967296}}"#).is_none());
        assert!(created_at(r#"{"created_at":{"seconds":1705312800,"nanoseconds":4294967297}}"#).is_none());
    }

    #[test]
    fn week_starts_on_sunday() {
        let wednesday = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap().and_hms_opt(15, 0, 0).unwrap();
        let start = start_of_week(wednesday);
        assert_eq!(start.date(), NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
        assert_eq!(start.hour(), 0);
    }
}
