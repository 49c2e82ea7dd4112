pub mod amazon;

use serde::Serialize;

/// Результат проверки подключения к маркетплейсу
#[derive(Debug, Clone, Serialize)]
pub struct TestConnectionResult {
    pub success: bool,
    pub message: String,
    pub details: Option<String>,
}
