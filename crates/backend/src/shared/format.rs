use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Время в формате SP-API: `2024-05-01T10:00:00.000Z` (UTC, миллисекунды)
pub fn to_amz_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Разбор даты/времени из ответов Amazon и колонок MTR.
///
/// Встречаются RFC 3339 (`2024-04-02T10:11:12Z`, со смещением), а в
/// отчётах - `2024-04-02 10:11:12` и `02-04-2024 10:11:12`.
pub fn parse_amz_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Some(naive) = parse_naive_datetime(value) {
        return Some(naive.and_utc());
    }
    parse_amz_date(value).and_then(|d| d.and_hms_opt(0, 0, 0)).map(|n| n.and_utc())
}

fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%d-%m-%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%d-%m-%Y %H:%M",
    ];
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
}

/// Дата без времени (для `posting_date`).
///
/// Числовые даты читаются как день-месяц-год, как в индийских отчётах MTR:
/// `04/05/2024` это 4 мая.
pub fn parse_amz_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }
    parse_amz_datetime_prefix(value).or_else(|| parse_naive_datetime(value).map(|dt| dt.date()))
}

fn parse_amz_datetime_prefix(value: &str) -> Option<NaiveDate> {
    // "2024-04-02T10:11:12+05:30" и подобные, где нужна только дата
    value
        .get(..10)
        .filter(|_| value.len() > 10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

/// Денежная сумма из строки отчёта: пусто → 0, "1,234.50" → 1234.5
pub fn parse_amount(value: &str) -> Option<f64> {
    let cleaned: String = value.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok()
}
