use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Описание сохранённого файла (без содержимого)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub id: String,
    pub file_name: String,
    pub is_private: bool,
    /// Документ, к которому приложен файл: ("a003_on_demand_report", id)
    pub attached_to_doctype: Option<String>,
    pub attached_to_name: Option<String>,
    pub size: i64,
    pub created_at: DateTime<Utc>,
}
