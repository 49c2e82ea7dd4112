use anyhow::Result;
use chrono::Duration;
use contracts::system::tasks::request::CreateScheduledTaskDto;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::shared::config::SchedulerConfig;
use crate::shared::marketplaces::amazon::SpApiFactory;
use crate::system::tenant_locks::TenantLocks;

use super::{
    logger::TaskLogger,
    managers::{
        CreateAmazonReportsManager, FetchAmazonOrdersManager, PollAmazonReportsManager,
        ProcessDoneReportsManager,
    },
    registry::TaskManagerRegistry,
    repository, service,
    worker::ScheduledTaskWorker,
};

struct DefaultTask {
    code: &'static str,
    description: &'static str,
    task_type: &'static str,
    cron: &'static str,
    is_enabled: bool,
}

const DEFAULT_TASKS: &[DefaultTask] = &[
    DefaultTask {
        code: "amazon_create_reports",
        description: "Request MTR reports for the last hour",
        task_type: CreateAmazonReportsManager::TASK_TYPE,
        cron: "0 0 * * * *",
        is_enabled: true,
    },
    DefaultTask {
        code: "amazon_poll_reports",
        description: "Poll pending reports, download and reconcile finished ones",
        task_type: PollAmazonReportsManager::TASK_TYPE,
        cron: "0 */5 * * * *",
        is_enabled: true,
    },
    DefaultTask {
        code: "amazon_process_done_reports",
        description: "Reconcile downloaded reports not processed yet",
        task_type: ProcessDoneReportsManager::TASK_TYPE,
        cron: "0 */30 * * * *",
        is_enabled: true,
    },
    DefaultTask {
        code: "amazon_fetch_orders",
        description: "Fetch shipped FBA orders and invoice them",
        task_type: FetchAmazonOrdersManager::TASK_TYPE,
        cron: "0 15 * * * *",
        is_enabled: false,
    },
];

/// Создать недостающие стандартные задания. Существующие не трогаются.
pub async fn ensure_default_tasks(db: &DatabaseConnection) -> Result<usize> {
    let mut created = 0;
    for task in DEFAULT_TASKS {
        if repository::get_by_code(db, task.code).await?.is_some() {
            continue;
        }
        service::create(
            db,
            CreateScheduledTaskDto {
                code: task.code.to_string(),
                description: task.description.to_string(),
                task_type: task.task_type.to_string(),
                schedule_cron: Some(task.cron.to_string()),
                is_enabled: task.is_enabled,
                config_json: String::new(),
            },
        )
        .await?;
        tracing::info!("Created default scheduled task '{}'", task.code);
        created += 1;
    }
    Ok(created)
}

pub fn build_registry(
    db: &DatabaseConnection,
    factory: Arc<dyn SpApiFactory>,
    locks: Arc<TenantLocks>,
    config: &SchedulerConfig,
) -> TaskManagerRegistry {
    let mut registry = TaskManagerRegistry::new();
    registry.register(CreateAmazonReportsManager::new(db.clone(), factory.clone()));
    registry.register(PollAmazonReportsManager::new(
        db.clone(),
        factory.clone(),
        locks,
        Duration::minutes(config.report_job_max_age_minutes),
    ));
    registry.register(ProcessDoneReportsManager::new(db.clone()));
    registry.register(FetchAmazonOrdersManager::new(db.clone(), factory));
    registry
}

/// Инициализирует реестр задач и фоновый воркер.
pub async fn initialize_scheduled_tasks(
    db: &DatabaseConnection,
    factory: Arc<dyn SpApiFactory>,
    locks: Arc<TenantLocks>,
    config: &SchedulerConfig,
) -> Result<ScheduledTaskWorker> {
    ensure_default_tasks(db).await?;
    let registry = build_registry(db, factory, locks, config);
    let logger = Arc::new(TaskLogger::new(&config.task_log_dir));
    Ok(ScheduledTaskWorker::new(
        db.clone(),
        Arc::new(registry),
        logger,
        config.tick_seconds,
    ))
}
