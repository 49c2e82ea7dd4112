use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use cron::Schedule;

/// Интервал для заданий без cron-выражения
pub const DEFAULT_INTERVAL_MINUTES: i64 = 60;

/// Разобрать cron-выражение с секундами: `"0 */5 * * * *"`
pub fn parse_schedule(expr: &str) -> anyhow::Result<Schedule> {
    Schedule::from_str(expr.trim())
        .map_err(|e| anyhow::anyhow!("Invalid cron expression '{}': {}", expr, e))
}

/// Время следующего запуска после `after`
pub fn next_run_after(expr: Option<&str>, after: DateTime<Utc>) -> anyhow::Result<DateTime<Utc>> {
    match expr.map(str::trim).filter(|e| !e.is_empty()) {
        Some(expr) => parse_schedule(expr)?
            .after(&after)
            .next()
            .ok_or_else(|| anyhow::anyhow!("Cron expression '{}' has no upcoming runs", expr)),
        None => Ok(after + Duration::minutes(DEFAULT_INTERVAL_MINUTES)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_run_follows_cron() {
        let now = Utc.with_ymd_and_hms(2024, 4, 2, 10, 2, 30).unwrap();
        assert_eq!(
            next_run_after(Some("0 */5 * * * *"), now).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 2, 10, 5, 0).unwrap()
        );
        assert_eq!(
            next_run_after(Some("0 0 * * * *"), now).unwrap(),
            Utc.with_ymd_and_hms(2024, 4, 2, 11, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_without_cron_runs_hourly() {
        let now = Utc.with_ymd_and_hms(2024, 4, 2, 10, 2, 30).unwrap();
        assert_eq!(next_run_after(None, now).unwrap(), now + Duration::hours(1));
        assert_eq!(next_run_after(Some("  "), now).unwrap(), now + Duration::hours(1));
    }

    #[test]
    fn test_invalid_cron() {
        assert!(parse_schedule("every five minutes").is_err());
    }
}
