use serde::{Deserialize, Serialize};

/// Результат обработки одного заказа Amazon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OrderOutcome {
    /// Создан счёт
    Created {
        amazon_order_id: String,
        sales_invoice: String,
        lines: usize,
    },
    /// Счёт уже существует, заказ пропущен
    Skipped {
        amazon_order_id: String,
        sales_invoice: Option<String>,
    },
    Failed {
        amazon_order_id: String,
        error: String,
    },
}

impl OrderOutcome {
    pub fn amazon_order_id(&self) -> &str {
        match self {
            OrderOutcome::Created { amazon_order_id, .. }
            | OrderOutcome::Skipped { amazon_order_id, .. }
            | OrderOutcome::Failed { amazon_order_id, .. } => amazon_order_id,
        }
    }
}

/// Счётчики итогов пакетной обработки
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BatchCounters {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchCounters {
    pub fn from_outcomes(outcomes: &[OrderOutcome]) -> Self {
        let mut counters = Self::default();
        for outcome in outcomes {
            match outcome {
                OrderOutcome::Created { .. } => counters.created += 1,
                OrderOutcome::Skipped { .. } => counters.skipped += 1,
                OrderOutcome::Failed { .. } => counters.failed += 1,
            }
        }
        counters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_is_tagged() {
        let outcome = OrderOutcome::Skipped {
            amazon_order_id: "408-1".into(),
            sales_invoice: Some("ACC-SINV-2024-00001".into()),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "skipped");
        assert_eq!(outcome.amazon_order_id(), "408-1");
    }

    #[test]
    fn test_counters() {
        let outcomes = vec![
            OrderOutcome::Created {
                amazon_order_id: "1".into(),
                sales_invoice: "A".into(),
                lines: 1,
            },
            OrderOutcome::Failed {
                amazon_order_id: "2".into(),
                error: "x".into(),
            },
            OrderOutcome::Failed {
                amazon_order_id: "3".into(),
                error: "y".into(),
            },
        ];
        let c = BatchCounters::from_outcomes(&outcomes);
        assert_eq!((c.created, c.skipped, c.failed), (1, 0, 2));
    }
}
