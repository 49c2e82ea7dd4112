use serde::{Deserialize, Serialize};

/// Запись журнала ошибок, видимого оператору
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: i64,
    pub timestamp: String,
    /// Подсистема: "oauth", "reports", "mtr", "orders", ...
    pub source: String,
    pub category: String,
    pub message: String,
}
