use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Идентификатор задания на отчёт Amazon
    OnDemandReportId
);

// ============================================================================
// Enums
// ============================================================================

/// Статус обработки отчёта на стороне Amazon.
///
/// `New` и `TimedOut` - локальные статусы: задание ещё не отправлено, либо
/// Amazon не завершил отчёт за отведённое время.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    #[default]
    New,
    InQueue,
    InProgress,
    Done,
    Fatal,
    Cancelled,
    TimedOut,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::New => "NEW",
            ProcessingStatus::InQueue => "IN_QUEUE",
            ProcessingStatus::InProgress => "IN_PROGRESS",
            ProcessingStatus::Done => "DONE",
            ProcessingStatus::Fatal => "FATAL",
            ProcessingStatus::Cancelled => "CANCELLED",
            ProcessingStatus::TimedOut => "TIMED_OUT",
        }
    }

    /// Разбор статуса из ответа Reports API (`processingStatus`)
    pub fn from_remote(value: &str) -> Option<Self> {
        match value {
            "NEW" => Some(ProcessingStatus::New),
            "IN_QUEUE" => Some(ProcessingStatus::InQueue),
            "IN_PROGRESS" => Some(ProcessingStatus::InProgress),
            "DONE" => Some(ProcessingStatus::Done),
            "FATAL" => Some(ProcessingStatus::Fatal),
            "CANCELLED" => Some(ProcessingStatus::Cancelled),
            "TIMED_OUT" => Some(ProcessingStatus::TimedOut),
            _ => None,
        }
    }

    /// Amazon ещё формирует отчёт
    pub fn is_waiting(&self) -> bool {
        matches!(self, ProcessingStatus::InQueue | ProcessingStatus::InProgress)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProcessingStatus::Done
                | ProcessingStatus::Fatal
                | ProcessingStatus::Cancelled
                | ProcessingStatus::TimedOut
        )
    }
}

impl std::fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Запись в ленте комментариев задания: что вернул Amazon при опросе
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusLogEntry {
    pub at: DateTime<Utc>,
    pub status: ProcessingStatus,
    pub payload: serde_json::Value,
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Задание на отчёт (On Demand Report)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnDemandReport {
    #[serde(flatten)]
    pub base: BaseAggregate<OnDemandReportId>,

    /// Код настроек продавца (a001)
    pub settings_code: String,
    pub report_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,

    pub report_id: Option<String>,
    pub report_document_id: Option<String>,
    pub status: ProcessingStatus,
    pub submitted_at: Option<DateTime<Utc>>,
    pub last_polled_at: Option<DateTime<Utc>>,
    pub poll_attempts: i32,
    /// Секунды от отправки до последнего опроса
    pub time_taken_secs: Option<i64>,

    /// Скачанный документ (file_attachment.id)
    pub file_id: Option<String>,
    /// Результат сверки уже получен; повторно документ не обрабатывается
    pub is_processed: bool,
    pub processing_summary: Option<String>,
    pub error_message: Option<String>,
    pub status_log: Vec<StatusLogEntry>,
}

impl OnDemandReport {
    pub fn new_for_insert(
        settings_code: String,
        report_type: String,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
    ) -> Self {
        let id = OnDemandReportId::new_v4();
        let code = format!("RPT-{}", &id.0.simple().to_string()[..12]);
        let description = report_type.clone();
        Self {
            base: BaseAggregate::new(id, code, description),
            settings_code,
            report_type,
            start_time,
            end_time,
            report_id: None,
            report_document_id: None,
            status: ProcessingStatus::New,
            submitted_at: None,
            last_polled_at: None,
            poll_attempts: 0,
            time_taken_secs: None,
            file_id: None,
            is_processed: false,
            processing_summary: None,
            error_message: None,
            status_log: Vec::new(),
        }
    }

    /// Окно по умолчанию: последний час до `now`
    pub fn apply_window_defaults(&mut self, now: DateTime<Utc>) {
        if self.start_time.is_none() {
            self.start_time = Some(now - Duration::hours(1));
        }
        if self.end_time.is_none() {
            self.end_time = Some(now);
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.settings_code.trim().is_empty() {
            return Err("Settings must be set".into());
        }
        if self.report_type.trim().is_empty() {
            return Err("Report type must be set".into());
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            if start > end {
                return Err("Start time must not be after end time".into());
            }
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }

    /// Amazon принял запрос на отчёт
    pub fn mark_submitted(&mut self, report_id: String, now: DateTime<Utc>) {
        self.report_id = Some(report_id);
        self.status = ProcessingStatus::InQueue;
        self.submitted_at = Some(now);
    }

    /// Зафиксировать результат очередного опроса статуса
    pub fn record_poll(
        &mut self,
        status: ProcessingStatus,
        report_document_id: Option<String>,
        payload: serde_json::Value,
        now: DateTime<Utc>,
    ) {
        self.status = status;
        if report_document_id.is_some() {
            self.report_document_id = report_document_id;
        }
        self.poll_attempts += 1;
        self.last_polled_at = Some(now);
        self.time_taken_secs = self.submitted_at.map(|s| (now - s).num_seconds());
        self.status_log.push(StatusLogEntry {
            at: now,
            status,
            payload,
        });
    }

    /// Задание не удалось отправить или Amazon вернул ошибку
    pub fn mark_failed(&mut self, status: ProcessingStatus, message: String) {
        self.status = status;
        self.error_message = Some(message);
    }

    /// Задание висит в очереди Amazon дольше `max_age`
    pub fn is_overdue(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.status.is_waiting()
            && self
                .submitted_at
                .map(|submitted| now - submitted > max_age)
                .unwrap_or(false)
    }

    pub fn needs_polling(&self) -> bool {
        self.status.is_waiting() && self.report_id.is_some()
    }

    pub fn ready_for_processing(&self) -> bool {
        self.status == ProcessingStatus::Done && !self.is_processed && self.file_id.is_some()
    }

    /// Имя файла для документа, скачанного по расписанию
    pub fn document_file_name(&self) -> String {
        let start = self
            .start_time
            .map(|t| t.format("%Y-%m-%dT%H%M%S").to_string())
            .unwrap_or_else(|| "unbounded".to_string());
        format!("{}_{}.csv", self.report_type, start)
    }
}

impl AggregateRoot for OnDemandReport {
    type Id = OnDemandReportId;

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
        "a003"
    }

    fn collection_name() -> &'static str {
        "on_demand_report"
    }

    fn element_name() -> &'static str {
        "On Demand Report"
    }

    fn list_name() -> &'static str {
        "On Demand Reports"
    }

    fn origin() -> Origin {
        Origin::Amazon
    }
}

// ============================================================================
// Forms / DTOs
// ============================================================================

/// DTO для создания задания на отчёт
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnDemandReportDto {
    pub settings_code: String,
    pub report_type: String,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}
