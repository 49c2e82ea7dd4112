use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Запрос на загрузку заказов из Orders API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchOrdersRequest {
    pub settings_code: String,

    /// Нижняя граница даты создания; по умолчанию из настроек
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
}

/// Запрос на создание счетов по журналу заказов
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessPendingRequest {
    #[serde(default)]
    pub settings_code: Option<String>,
    #[serde(default)]
    pub submit: bool,
}
