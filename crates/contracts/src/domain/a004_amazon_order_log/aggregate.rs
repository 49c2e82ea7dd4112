use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор записи журнала заказов Amazon
    AmazonOrderLogId
);

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderLogStatus {
    /// Заказ получен из Orders API, счёт ещё не создан
    Pending,
    Processed,
    Error,
}

impl OrderLogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderLogStatus::Pending => "Pending",
            OrderLogStatus::Processed => "Processed",
            OrderLogStatus::Error => "Error",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "Pending" => Some(OrderLogStatus::Pending),
            "Processed" => Some(OrderLogStatus::Processed),
            "Error" => Some(OrderLogStatus::Error),
            _ => None,
        }
    }
}

/// Откуда пришла запись
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderLogSource {
    OrdersApi,
    MtrReport,
}

impl OrderLogSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderLogSource::OrdersApi => "OrdersApi",
            OrderLogSource::MtrReport => "MtrReport",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "OrdersApi" => Some(OrderLogSource::OrdersApi),
            "MtrReport" => Some(OrderLogSource::MtrReport),
            _ => None,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Запись журнала заказов Amazon.
///
/// Для Orders API - одна запись на заказ, для MTR - одна на строку отчёта.
/// Записи не удаляются: это аудит и очередь повторной обработки.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmazonOrderLog {
    #[serde(flatten)]
    pub base: BaseAggregate<AmazonOrderLogId>,

    pub amazon_order_id: String,
    pub settings_code: String,
    pub source: OrderLogSource,
    /// Shipment Item Id или номер строки MTR
    pub line_ref: Option<String>,
    pub status: OrderLogStatus,
    /// Исходные данные (строка отчёта или заказ с позициями) в JSON
    pub raw_json: String,
    /// Имя созданного счета (a005.code)
    pub sales_invoice: Option<String>,
    pub error_message: Option<String>,
    /// Задание на отчёт, из документа которого пришла строка
    pub report_job_id: Option<String>,
}

impl AmazonOrderLog {
    fn new(
        amazon_order_id: &str,
        settings_code: &str,
        source: OrderLogSource,
        status: OrderLogStatus,
        raw_json: String,
    ) -> Self {
        Self {
            base: BaseAggregate::new(
                AmazonOrderLogId::new_v4(),
                amazon_order_id.to_string(),
                format!("Amazon order {}", amazon_order_id),
            ),
            amazon_order_id: amazon_order_id.to_string(),
            settings_code: settings_code.to_string(),
            source,
            line_ref: None,
            status,
            raw_json,
            sales_invoice: None,
            error_message: None,
            report_job_id: None,
        }
    }

    /// Заказ из Orders API, ожидающий создания счета
    pub fn pending_order(amazon_order_id: &str, settings_code: &str, raw_json: String) -> Self {
        Self::new(
            amazon_order_id,
            settings_code,
            OrderLogSource::OrdersApi,
            OrderLogStatus::Pending,
            raw_json,
        )
    }

    /// Заказ из Orders API, который нельзя выставить (например, нет товара)
    pub fn rejected_order(
        amazon_order_id: &str,
        settings_code: &str,
        raw_json: String,
        error: String,
    ) -> Self {
        let mut log = Self::new(
            amazon_order_id,
            settings_code,
            OrderLogSource::OrdersApi,
            OrderLogStatus::Error,
            raw_json,
        );
        log.error_message = Some(error);
        log
    }

    /// Строка MTR, по которой создан счёт
    pub fn processed_line(
        amazon_order_id: &str,
        settings_code: &str,
        line_ref: Option<String>,
        raw_json: String,
        sales_invoice: &str,
    ) -> Self {
        let mut log = Self::new(
            amazon_order_id,
            settings_code,
            OrderLogSource::MtrReport,
            OrderLogStatus::Processed,
            raw_json,
        );
        log.line_ref = line_ref;
        log.sales_invoice = Some(sales_invoice.to_string());
        log
    }

    /// Строка MTR, заказ которой обработать не удалось
    pub fn error_line(
        amazon_order_id: &str,
        settings_code: &str,
        line_ref: Option<String>,
        raw_json: String,
        error: String,
    ) -> Self {
        let mut log = Self::new(
            amazon_order_id,
            settings_code,
            OrderLogSource::MtrReport,
            OrderLogStatus::Error,
            raw_json,
        );
        log.line_ref = line_ref;
        log.error_message = Some(error);
        log
    }

    pub fn with_report_job(mut self, report_job_id: Option<String>) -> Self {
        self.report_job_id = report_job_id;
        self
    }

    pub fn mark_processed(&mut self, sales_invoice: &str) {
        self.status = OrderLogStatus::Processed;
        self.sales_invoice = Some(sales_invoice.to_string());
        self.error_message = None;
    }

    pub fn mark_error(&mut self, error: String) {
        self.status = OrderLogStatus::Error;
        self.error_message = Some(error);
    }

    /// Запись ждёт счета при обычном (плановом) проходе
    pub fn awaits_invoice(&self) -> bool {
        self.status == OrderLogStatus::Pending && self.sales_invoice.is_none()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.amazon_order_id.trim().is_empty() {
            return Err("Amazon order id must not be empty".into());
        }
        if self.status == OrderLogStatus::Processed && self.sales_invoice.is_none() {
            return Err("Processed log must reference a sales invoice".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for AmazonOrderLog {
    type Id = AmazonOrderLogId;

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
        "a004"
    }

    fn collection_name() -> &'static str {
        "amazon_order_log"
    }

    fn element_name() -> &'static str {
        "Amazon Order Log"
    }

    fn list_name() -> &'static str {
        "Amazon Order Logs"
    }

    fn origin() -> Origin {
        Origin::Amazon
    }
}
