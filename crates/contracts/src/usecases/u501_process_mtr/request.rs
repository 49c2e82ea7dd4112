use serde::{Deserialize, Serialize};

/// Запрос на сверку MTR-файла
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessMtrRequest {
    /// Код настроек продавца (a001)
    pub settings_code: String,

    /// Файл для обработки; без него берётся последний файл `GST_MTR_B2*`
    #[serde(default)]
    pub file_id: Option<String>,

    /// Проводить созданные счета
    #[serde(default)]
    pub submit: bool,
}
