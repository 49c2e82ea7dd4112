use anyhow::Result;
use async_trait::async_trait;
use chrono::Duration;
use contracts::system::tasks::aggregate::ScheduledTask;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::shared::marketplaces::amazon::SpApiFactory;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::system::tenant_locks::TenantLocks;
use crate::usecases::u503_fetch_report::{poll_reports_scheduled, process_done_reports};

/// Опрос ожидающих отчётов; готовые сразу сверяются
pub struct PollAmazonReportsManager {
    db: DatabaseConnection,
    factory: Arc<dyn SpApiFactory>,
    locks: Arc<TenantLocks>,
    max_age: Duration,
}

impl PollAmazonReportsManager {
    pub const TASK_TYPE: &'static str = "poll_amazon_reports";

    pub fn new(
        db: DatabaseConnection,
        factory: Arc<dyn SpApiFactory>,
        locks: Arc<TenantLocks>,
        max_age: Duration,
    ) -> Self {
        Self {
            db,
            factory,
            locks,
            max_age,
        }
    }
}

#[async_trait]
impl TaskManager for PollAmazonReportsManager {
    fn task_type(&self) -> &'static str {
        Self::TASK_TYPE
    }

    async fn run(&self, _task: &ScheduledTask, session_id: &str, logger: Arc<TaskLogger>) -> Result<()> {
        let polled =
            poll_reports_scheduled(&self.db, self.factory.as_ref(), &self.locks, self.max_age).await?;
        logger.write_log(
            session_id,
            &format!("Polled {} report jobs, {} failed", polled.succeeded, polled.failed),
        )?;

        let processed = process_done_reports(&self.db).await?;
        if processed.total() > 0 {
            logger.write_log(
                session_id,
                &format!(
                    "Reconciled {} report files, {} failed",
                    processed.succeeded, processed.failed
                ),
            )?;
        }

        if polled.failed + processed.failed > 0 {
            anyhow::bail!(
                "{} polls and {} reconciliations failed",
                polled.failed,
                processed.failed
            );
        }
        Ok(())
    }
}
