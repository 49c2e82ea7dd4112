use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use contracts::domain::common::AggregateId;
use contracts::system::tasks::aggregate::ScheduledTask;
use contracts::system::tasks::progress::TaskStatus;
use sea_orm::DatabaseConnection;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::schedule::{next_run_after, DEFAULT_INTERVAL_MINUTES};
use super::{logger::TaskLogger, registry::TaskManagerRegistry, service};

/// Фоновый воркер для выполнения запланированных задач.
pub struct ScheduledTaskWorker {
    db: DatabaseConnection,
    registry: Arc<TaskManagerRegistry>,
    logger: Arc<TaskLogger>,
    interval_seconds: u64,
    running: Arc<Mutex<HashSet<Uuid>>>,
}

impl ScheduledTaskWorker {
    pub fn new(
        db: DatabaseConnection,
        registry: Arc<TaskManagerRegistry>,
        logger: Arc<TaskLogger>,
        interval_seconds: u64,
    ) -> Self {
        Self {
            db,
            registry,
            logger,
            interval_seconds,
            running: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn logger(&self) -> Arc<TaskLogger> {
        Arc::clone(&self.logger)
    }

    /// Запускает цикл выполнения задач.
    pub async fn run_loop(&self) {
        info!(
            "Scheduled task worker started with interval {} seconds",
            self.interval_seconds
        );
        let mut interval = time::interval(time::Duration::from_secs(self.interval_seconds.max(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;
            if let Err(e) = self.run_due_tasks(Utc::now()).await {
                error!("Error processing scheduled tasks: {:#}", e);
            }
        }
    }

    /// Запустить задачи, время которых наступило. Задача, чей прошлый запуск
    /// ещё идёт, пропускается.
    pub async fn run_due_tasks(&self, now: DateTime<Utc>) -> Result<Vec<JoinHandle<()>>> {
        let mut handles = Vec::new();

        for task in service::list_enabled_tasks(&self.db).await? {
            if !task.is_due(now) {
                continue;
            }
            let task_id = task.base.id.0;
            {
                let mut running = self.running.lock().unwrap_or_else(|p| p.into_inner());
                if !running.insert(task_id) {
                    warn!("Task '{}' is still running, skipping this tick", task.base.code);
                    continue;
                }
            }
            handles.push(self.start(task, now).await);
        }
        Ok(handles)
    }

    async fn start(&self, task: ScheduledTask, now: DateTime<Utc>) -> JoinHandle<()> {
        let session_id = Uuid::new_v4().to_string();
        info!(
            "Task '{}' ({}) is due, session {}",
            task.base.code,
            task.base.id.as_string(),
            session_id
        );

        let next_run = match next_run_after(task.schedule_cron.as_deref(), now) {
            Ok(next) => next,
            Err(e) => {
                error!("Task '{}': {:#}", task.base.code, e);
                now + Duration::minutes(DEFAULT_INTERVAL_MINUTES)
            }
        };

        let db = self.db.clone();
        let registry = Arc::clone(&self.registry);
        let logger = Arc::clone(&self.logger);
        let running = Arc::clone(&self.running);

        if let Err(e) = service::update_run_status(
            &db,
            &task.base.id,
            Some(now),
            Some(next_run),
            Some(logger.get_log_file_path(&session_id)),
            TaskStatus::Running,
        )
        .await
        {
            error!("Failed to mark task '{}' as running: {:#}", task.base.code, e);
        }

        tokio::spawn(async move {
            let status = match registry.get(&task.task_type) {
                Some(manager) => match manager.run(&task, &session_id, Arc::clone(&logger)).await {
                    Ok(()) => {
                        info!("Task '{}' session {} completed", task.base.code, session_id);
                        TaskStatus::Completed
                    }
                    Err(e) => {
                        error!("Task '{}' session {} failed: {:#}", task.base.code, session_id, e);
                        let _ = logger.write_log(&session_id, &format!("Failed: {:#}", e));
                        TaskStatus::Failed
                    }
                },
                None => {
                    warn!(
                        "No manager found for task type '{}' for task '{}'",
                        task.task_type, task.base.code
                    );
                    let _ = logger.write_log(
                        &session_id,
                        &format!("Unknown task type '{}'", task.task_type),
                    );
                    TaskStatus::Failed
                }
            };

            if let Err(e) =
                service::update_run_status(&db, &task.base.id, Some(now), Some(next_run), None, status).await
            {
                error!("Failed to store status of task '{}': {:#}", task.base.code, e);
            }
            running
                .lock()
                .unwrap_or_else(|p| p.into_inner())
                .remove(&task.base.id.0);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use crate::system::tasks::manager::TaskManager;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use contracts::system::tasks::request::CreateScheduledTaskDto;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingManager {
        runs: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl TaskManager for CountingManager {
        fn task_type(&self) -> &'static str {
            "counting"
        }

        async fn run(&self, _task: &ScheduledTask, session_id: &str, logger: Arc<TaskLogger>) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            logger.write_log(session_id, "counted")?;
            Ok(())
        }
    }

    async fn add_task(db: &DatabaseConnection, code: &str, task_type: &str) {
        service::create(
            db,
            CreateScheduledTaskDto {
                code: code.into(),
                description: code.into(),
                task_type: task_type.into(),
                schedule_cron: Some("0 */5 * * * *".into()),
                is_enabled: true,
                config_json: String::new(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_due_task_runs_and_is_rescheduled() {
        let db = connect_in_memory().await;
        let dir = tempfile::tempdir().unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let mut registry = TaskManagerRegistry::new();
        registry.register(CountingManager { runs: runs.clone() });
        let worker = ScheduledTaskWorker::new(
            db.clone(),
            Arc::new(registry),
            Arc::new(TaskLogger::new(dir.path())),
            30,
        );
        add_task(&db, "count", "counting").await;
        add_task(&db, "orphan", "no_such_manager").await;

        let now = Utc.with_ymd_and_hms(2024, 4, 2, 10, 2, 30).unwrap();
        for handle in worker.run_due_tasks(now).await.unwrap() {
            handle.await.unwrap();
        }
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let tasks = service::list_all(&db).await.unwrap();
        let count = tasks.iter().find(|t| t.base.code == "count").unwrap();
        assert_eq!(count.last_run_status.as_deref(), Some("Completed"));
        assert_eq!(count.next_run_at, Some(Utc.with_ymd_and_hms(2024, 4, 2, 10, 5, 0).unwrap()));
        let log_file = count.last_run_log_file.clone().unwrap();
        assert!(std::fs::read_to_string(log_file).unwrap().contains("counted"));

        let orphan = tasks.iter().find(|t| t.base.code == "orphan").unwrap();
        assert_eq!(orphan.last_run_status.as_deref(), Some("Failed"));

        // До следующего слота ничего не запускается
        assert!(worker.run_due_tasks(now).await.unwrap().is_empty());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
