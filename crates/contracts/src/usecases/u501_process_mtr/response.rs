use crate::usecases::common::{BatchCounters, OrderOutcome};
use serde::{Deserialize, Serialize};

/// Итог сверки одного MTR-файла
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MtrBatchReport {
    pub file_name: Option<String>,
    /// Все строки файла
    pub total_rows: usize,
    /// Строки отгрузок с количеством > 0
    pub shipment_rows: usize,
    pub orders: usize,
    pub counters: BatchCounters,
    pub outcomes: Vec<OrderOutcome>,
}

impl MtrBatchReport {
    pub fn summary(&self) -> String {
        format!(
            "{} orders from {} shipment rows: {} created, {} skipped, {} failed",
            self.orders,
            self.shipment_rows,
            self.counters.created,
            self.counters.skipped,
            self.counters.failed
        )
    }
}
