use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Синхронный запрос отчёта: создать, дождаться, скачать
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchReportRequest {
    pub settings_code: String,
    pub report_type: String,
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}
