use serde::{Deserialize, Serialize};

/// Источник данных для агрегата
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Origin {
    /// Amazon Selling Partner API (заказы, отчёты)
    Amazon,
    /// Учётные документы ERP (счета, контрагенты, справочники)
    Erp,
    /// Собственные настройки сервиса
    #[serde(rename = "self")]
    Self_,
}
