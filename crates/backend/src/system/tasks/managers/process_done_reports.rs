use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::ScheduledTask;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u503_fetch_report::process_done_reports;

/// Сверка скачанных, но ещё не обработанных отчётов
pub struct ProcessDoneReportsManager {
    db: DatabaseConnection,
}

impl ProcessDoneReportsManager {
    pub const TASK_TYPE: &'static str = "process_done_reports";

    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TaskManager for ProcessDoneReportsManager {
    fn task_type(&self) -> &'static str {
        Self::TASK_TYPE
    }

    async fn run(&self, _task: &ScheduledTask, session_id: &str, logger: Arc<TaskLogger>) -> Result<()> {
        let summary = process_done_reports(&self.db).await?;
        logger.write_log(
            session_id,
            &format!("Reconciled {} report files, {} failed", summary.succeeded, summary.failed),
        )?;
        if summary.failed > 0 {
            anyhow::bail!("{} report files failed to reconcile", summary.failed);
        }
        Ok(())
    }
}
