pub mod a001_amazon_sp_settings;
pub mod a002_common_settings;
pub mod a003_on_demand_report;
pub mod a004_amazon_order_log;
pub mod a005_sales_invoice;
pub mod logs;
pub mod master_data;
pub mod mtr;
pub mod oauth;
pub mod orders;
pub mod reports;
pub mod sys_scheduled_task;

use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

/// Ошибка обработчика: статус и `{"error": ...}` в теле
pub type ApiError = (StatusCode, Json<serde_json::Value>);

pub fn api_error(status: StatusCode, e: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": e.to_string() })))
}

pub fn bad_request(e: impl std::fmt::Display) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, e)
}

/// Разбор UUID из пути
pub fn parse_uuid(id: &str) -> Result<uuid::Uuid, StatusCode> {
    uuid::Uuid::parse_str(id).map_err(|_| StatusCode::BAD_REQUEST)
}

/// `?limit=` для списков
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u64>,
}

impl ListParams {
    pub fn limit_or(&self, default: u64) -> u64 {
        self.limit.filter(|l| *l > 0).unwrap_or(default).min(1000)
    }
}
