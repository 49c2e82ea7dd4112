use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::{AmazonTaskConfig, ScheduledTask};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::shared::marketplaces::amazon::SpApiFactory;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u503_fetch_report::create_reports_scheduled;

/// Заказ отчётов по расписанию
pub struct CreateAmazonReportsManager {
    db: DatabaseConnection,
    factory: Arc<dyn SpApiFactory>,
}

impl CreateAmazonReportsManager {
    pub const TASK_TYPE: &'static str = "create_amazon_reports";

    pub fn new(db: DatabaseConnection, factory: Arc<dyn SpApiFactory>) -> Self {
        Self { db, factory }
    }
}

#[async_trait]
impl TaskManager for CreateAmazonReportsManager {
    fn task_type(&self) -> &'static str {
        Self::TASK_TYPE
    }

    async fn run(&self, task: &ScheduledTask, session_id: &str, logger: Arc<TaskLogger>) -> Result<()> {
        let config: AmazonTaskConfig = task.config()?;
        logger.write_log(session_id, "Requesting Amazon reports...")?;

        let summary =
            create_reports_scheduled(&self.db, self.factory.as_ref(), config.settings_code.as_deref())
                .await?;
        logger.write_log(
            session_id,
            &format!("Submitted {} report jobs, {} failed", summary.succeeded, summary.failed),
        )?;

        if summary.failed > 0 {
            anyhow::bail!("{} of {} report requests failed", summary.failed, summary.total());
        }
        Ok(())
    }
}
