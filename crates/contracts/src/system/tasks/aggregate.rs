use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Уникальный идентификатор регламентного задания
    ScheduledTaskId
);

// ============================================================================
// Aggregate Root
// ============================================================================

/// Регламентное задание (Scheduled Task)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    #[serde(flatten)]
    pub base: BaseAggregate<ScheduledTaskId>,

    /// Тип задания (ключ менеджера в реестре)
    pub task_type: String,

    /// Cron-выражение с секундами: "0 */5 * * * *"
    pub schedule_cron: Option<String>,

    /// Параметры в формате JSON
    pub config_json: String,

    pub is_enabled: bool,

    pub last_run_at: Option<DateTime<Utc>>,

    pub next_run_at: Option<DateTime<Utc>>,

    pub last_run_status: Option<String>,

    /// Путь к лог-файлу последнего запуска
    pub last_run_log_file: Option<String>,
}

impl ScheduledTask {
    pub fn new_for_insert(
        code: String,
        description: String,
        task_type: String,
        schedule_cron: Option<String>,
        is_enabled: bool,
        config_json: String,
    ) -> Self {
        Self {
            base: BaseAggregate::new(ScheduledTaskId::new_v4(), code, description),
            task_type,
            schedule_cron,
            config_json,
            is_enabled,
            last_run_at: None,
            next_run_at: None,
            last_run_status: None,
            last_run_log_file: None,
        }
    }

    /// Пора ли запускать задание. Без `next_run_at` задание запускается сразу.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled && self.next_run_at.map(|next| next <= now).unwrap_or(true)
    }

    /// Разобрать параметры задания; пустая строка даёт значения по умолчанию
    pub fn config<T: DeserializeOwned + Default>(&self) -> Result<T, serde_json::Error> {
        if self.config_json.trim().is_empty() {
            Ok(T::default())
        } else {
            serde_json::from_str(&self.config_json)
        }
    }
}

impl AggregateRoot for ScheduledTask {
    type Id = ScheduledTaskId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "sys"
    }

    fn collection_name() -> &'static str {
        "tasks"
    }

    fn element_name() -> &'static str {
        "Регламентное задание"
    }

    fn list_name() -> &'static str {
        "Регламентные задания"
    }

    fn origin() -> Origin {
        Origin::Self_
    }
}

/// Общие параметры заданий интеграции
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AmazonTaskConfig {
    /// Ограничить задание одними настройками; пусто - все включённые
    #[serde(default)]
    pub settings_code: Option<String>,
    /// Проводить созданные счета (плановая сверка оставляет черновики)
    #[serde(default)]
    pub submit: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_is_due() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let mut task = ScheduledTask::new_for_insert(
            "poll".into(),
            "Poll".into(),
            "poll_amazon_reports".into(),
            Some("0 */5 * * * *".into()),
            true,
            String::new(),
        );
        assert!(task.is_due(now));
        task.next_run_at = Some(now + Duration::minutes(5));
        assert!(!task.is_due(now));
        task.next_run_at = Some(now - Duration::seconds(1));
        task.is_enabled = false;
        assert!(!task.is_due(now));
    }

    #[test]
    fn test_config_defaults_on_empty_json() {
        let mut task = ScheduledTask::new_for_insert(
            "c".into(),
            "c".into(),
            "t".into(),
            None,
            true,
            String::new(),
        );
        let cfg: AmazonTaskConfig = task.config().unwrap();
        assert_eq!(cfg, AmazonTaskConfig::default());
        task.config_json = r#"{"settings_code":"Default","submit":true}"#.into();
        let cfg: AmazonTaskConfig = task.config().unwrap();
        assert_eq!(cfg.settings_code.as_deref(), Some("Default"));
        assert!(cfg.submit);
    }
}
