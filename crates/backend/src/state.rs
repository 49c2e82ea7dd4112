use std::sync::Arc;
use std::time::Duration;

use sea_orm::DatabaseConnection;

use crate::shared::config::Config;
use crate::shared::marketplaces::amazon::{ClientFactory, SpApiFactory};
use crate::system::oauth::OAuthStateStore;
use crate::system::tasks::logger::TaskLogger;
use crate::system::tenant_locks::TenantLocks;
use crate::usecases::u503_fetch_report::PollPolicy;

/// Общее состояние HTTP-обработчиков
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<Config>,
    pub factory: Arc<dyn SpApiFactory>,
    pub http: reqwest::Client,
    pub oauth_states: Arc<OAuthStateStore>,
    pub locks: Arc<TenantLocks>,
    pub task_logger: Arc<TaskLogger>,
    pub polling: PollPolicy,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: Config) -> anyhow::Result<Self> {
        let factory = ClientFactory::new(&config.sp_api)
            .map_err(|e| anyhow::anyhow!("Failed to build SP-API client: {}", e))?;
        let http = factory.http().clone();

        Ok(Self {
            db,
            factory: Arc::new(factory),
            http,
            oauth_states: Arc::new(OAuthStateStore::new(Duration::from_secs(
                config.oauth.state_ttl_secs,
            ))),
            locks: Arc::new(TenantLocks::new()),
            task_logger: Arc::new(TaskLogger::new(&config.scheduler.task_log_dir)),
            polling: PollPolicy::from_config(&config.report_polling),
            config: Arc::new(config),
        })
    }

    /// Максимальный возраст задания отчёта до перевода в TIMED_OUT
    pub fn report_job_max_age(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.config.scheduler.report_job_max_age_minutes)
    }
}

/// Состояние поверх заполненной тестовой базы
#[cfg(test)]
pub(crate) async fn test_state() -> AppState {
    let (db, _) = crate::usecases::fixtures::seeded_db().await;
    let config: Config = toml::from_str(
        "[database]\npath = \"unused.db\"\n[server]\npublic_base_url = \"https://erp.example.com\"\n",
    )
    .unwrap();
    AppState::new(db, config).unwrap()
}
