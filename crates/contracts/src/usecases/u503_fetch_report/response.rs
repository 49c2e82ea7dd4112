use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchReportStatus {
    /// Документ скачан и сохранён
    Done,
    /// Amazon вернул FATAL или CANCELLED
    Failed,
    /// Отчёт не готов за отведённое время или число попыток
    TimedOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchReportResponse {
    pub status: FetchReportStatus,
    pub report_id: String,
    /// Последний `processingStatus` от Amazon
    pub processing_status: String,
    pub file_id: Option<String>,
    pub file_name: Option<String>,
    pub size: Option<usize>,
    pub poll_attempts: u32,
    /// Ответ Amazon для FATAL/CANCELLED
    pub payload: Option<serde_json::Value>,
}
