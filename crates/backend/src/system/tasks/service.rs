use anyhow::Result;
use chrono::{DateTime, Utc};
use contracts::system::tasks::aggregate::{ScheduledTask, ScheduledTaskId};
use contracts::system::tasks::progress::TaskStatus;
use contracts::system::tasks::request::{CreateScheduledTaskDto, UpdateScheduledTaskDto};
use sea_orm::DatabaseConnection;

use super::schedule::parse_schedule;
use crate::system::tasks::repository;

fn validate_cron(expr: Option<&str>) -> Result<()> {
    if let Some(expr) = expr.filter(|e| !e.trim().is_empty()) {
        parse_schedule(expr)?;
    }
    Ok(())
}

pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<ScheduledTask>> {
    repository::list_all(db).await
}

pub async fn list_enabled_tasks(db: &DatabaseConnection) -> Result<Vec<ScheduledTask>> {
    repository::list_enabled(db).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: &ScheduledTaskId) -> Result<Option<ScheduledTask>> {
    repository::get_by_id(db, id.0).await
}

pub async fn create(db: &DatabaseConnection, dto: CreateScheduledTaskDto) -> Result<ScheduledTaskId> {
    validate_cron(dto.schedule_cron.as_deref())?;
    if repository::get_by_code(db, &dto.code).await?.is_some() {
        anyhow::bail!("Scheduled task '{}' already exists", dto.code);
    }

    let task = ScheduledTask::new_for_insert(
        dto.code,
        dto.description,
        dto.task_type,
        dto.schedule_cron,
        dto.is_enabled,
        dto.config_json,
    );
    repository::insert(db, &task).await?;
    Ok(task.base.id)
}

pub async fn update(
    db: &DatabaseConnection,
    id: &ScheduledTaskId,
    dto: UpdateScheduledTaskDto,
) -> Result<()> {
    validate_cron(dto.schedule_cron.as_deref())?;
    let mut task = get_by_id(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Scheduled task not found"))?;

    // Новое расписание пересчитывается на ближайшем тике воркера
    if task.schedule_cron != dto.schedule_cron {
        task.next_run_at = None;
    }
    task.base.code = dto.code;
    task.base.description = dto.description;
    task.base.comment = dto.comment;
    task.task_type = dto.task_type;
    task.schedule_cron = dto.schedule_cron;
    task.is_enabled = dto.is_enabled;
    task.config_json = dto.config_json;
    task.base.metadata.updated_at = Utc::now();

    repository::update(db, &task).await
}

pub async fn delete(db: &DatabaseConnection, id: &ScheduledTaskId) -> Result<()> {
    if !repository::soft_delete(db, id.0).await? {
        anyhow::bail!("Scheduled task not found");
    }
    Ok(())
}

pub async fn toggle_enabled(db: &DatabaseConnection, id: &ScheduledTaskId, is_enabled: bool) -> Result<()> {
    let mut task = get_by_id(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Scheduled task not found"))?;
    task.is_enabled = is_enabled;
    task.base.metadata.updated_at = Utc::now();
    repository::update(db, &task).await
}

/// Записать итог запуска. `None` в `last_run_log_file` оставляет прежний путь.
pub async fn update_run_status(
    db: &DatabaseConnection,
    id: &ScheduledTaskId,
    last_run_at: Option<DateTime<Utc>>,
    next_run_at: Option<DateTime<Utc>>,
    last_run_log_file: Option<String>,
    status: TaskStatus,
) -> Result<()> {
    let found = repository::record_run(
        db,
        id.0,
        last_run_at,
        next_run_at,
        last_run_log_file,
        &status.to_string(),
    )
    .await?;
    if !found {
        anyhow::bail!("Scheduled task not found");
    }
    Ok(())
}
