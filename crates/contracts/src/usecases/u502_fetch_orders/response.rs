use crate::usecases::common::{BatchCounters, OrderOutcome};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FetchOrdersResponse {
    /// Заказов получено из API
    pub fetched: usize,
    /// Записано в журнал как Pending
    pub logged: usize,
    /// Уже были в журнале
    pub already_logged: usize,
    /// Записано в журнал как Error (нет товара и т.п.)
    pub rejected: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProcessPendingResponse {
    pub counters: BatchCounters,
    pub outcomes: Vec<OrderOutcome>,
}
