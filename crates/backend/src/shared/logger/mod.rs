//! Журнал ошибок для оператора (таблица `system_log`).
//!
//! Дублирует важные события из tracing туда, где их видно через `/api/logs`.

pub mod repository;

use sea_orm::DatabaseConnection;

/// Записать ошибку подсистемы. Сбой записи журнала только логируется.
pub async fn log_error(db: &DatabaseConnection, source: &str, message: &str) {
    if let Err(e) = repository::log_event(db, source, "error", message).await {
        tracing::error!("Failed to write system log entry: {}", e);
    }
}

pub async fn log_info(db: &DatabaseConnection, source: &str, message: &str) {
    if let Err(e) = repository::log_event(db, source, "info", message).await {
        tracing::error!("Failed to write system log entry: {}", e);
    }
}
