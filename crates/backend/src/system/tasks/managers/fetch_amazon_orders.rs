use anyhow::Result;
use async_trait::async_trait;
use contracts::system::tasks::aggregate::{AmazonTaskConfig, ScheduledTask};
use contracts::usecases::u502_fetch_orders::request::{FetchOrdersRequest, ProcessPendingRequest};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::domain::a001_amazon_sp_settings;
use crate::shared::marketplaces::amazon::SpApiFactory;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tasks::manager::TaskManager;
use crate::usecases::u502_fetch_orders::{fetch_and_log_orders, process_pending_logs};

/// Загрузка заказов из Orders API и создание счетов по журналу
pub struct FetchAmazonOrdersManager {
    db: DatabaseConnection,
    factory: Arc<dyn SpApiFactory>,
}

impl FetchAmazonOrdersManager {
    pub const TASK_TYPE: &'static str = "fetch_amazon_orders";

    pub fn new(db: DatabaseConnection, factory: Arc<dyn SpApiFactory>) -> Self {
        Self { db, factory }
    }
}

#[async_trait]
impl TaskManager for FetchAmazonOrdersManager {
    fn task_type(&self) -> &'static str {
        Self::TASK_TYPE
    }

    async fn run(&self, task: &ScheduledTask, session_id: &str, logger: Arc<TaskLogger>) -> Result<()> {
        let config: AmazonTaskConfig = task.config()?;
        let mut failed = 0usize;

        let enabled = a001_amazon_sp_settings::repository::list_enabled(&self.db).await?;
        for settings in enabled
            .iter()
            .filter(|s| config.settings_code.as_deref().map_or(true, |code| s.base.code == code))
        {
            let code = settings.base.code.clone();
            let fetched = match self.factory.orders(settings) {
                Ok(api) => {
                    let request = FetchOrdersRequest {
                        settings_code: code.clone(),
                        created_after: None,
                    };
                    fetch_and_log_orders(&self.db, api.as_ref(), &request).await
                }
                Err(e) => Err(e.into()),
            };
            match fetched {
                Ok(response) => logger.write_log(
                    session_id,
                    &format!(
                        "{}: {} orders fetched, {} logged, {} already logged, {} rejected",
                        code, response.fetched, response.logged, response.already_logged, response.rejected
                    ),
                )?,
                Err(e) => {
                    failed += 1;
                    logger.write_log(session_id, &format!("{}: fetch failed: {:#}", code, e))?;
                    continue;
                }
            }

            let processed = process_pending_logs(
                &self.db,
                &ProcessPendingRequest {
                    settings_code: Some(code.clone()),
                    submit: config.submit,
                },
            )
            .await?;
            logger.write_log(
                session_id,
                &format!(
                    "{}: {} invoices created, {} skipped, {} failed",
                    code, processed.counters.created, processed.counters.skipped, processed.counters.failed
                ),
            )?;
        }

        if failed > 0 {
            anyhow::bail!("Order fetch failed for {} settings", failed);
        }
        Ok(())
    }
}
