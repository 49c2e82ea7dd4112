use chrono::{DateTime, Utc};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use contracts::system::tasks::aggregate::{ScheduledTask, ScheduledTaskId};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sys_tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub comment: Option<String>,
    pub task_type: String,
    pub schedule_cron: Option<String>,
    pub config_json: Option<String>,
    pub is_enabled: bool,
    pub last_run_at: Option<DateTime<Utc>>,
    pub next_run_at: Option<DateTime<Utc>>,
    pub last_run_status: Option<String>,
    pub last_run_log_file: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ScheduledTask {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, 1);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        ScheduledTask {
            base: BaseAggregate::with_metadata(
                ScheduledTaskId(uuid),
                m.code,
                m.description.unwrap_or_default(),
                m.comment,
                metadata,
            ),
            task_type: m.task_type,
            schedule_cron: m.schedule_cron.filter(|c| !c.trim().is_empty()),
            config_json: m.config_json.unwrap_or_default(),
            is_enabled: m.is_enabled,
            last_run_at: m.last_run_at,
            next_run_at: m.next_run_at,
            last_run_status: m.last_run_status,
            last_run_log_file: m.last_run_log_file,
        }
    }
}

fn to_active(task: &ScheduledTask) -> ActiveModel {
    ActiveModel {
        id: Set(task.base.id.0.to_string()),
        code: Set(task.base.code.clone()),
        description: Set(Some(task.base.description.clone())),
        comment: Set(task.base.comment.clone()),
        task_type: Set(task.task_type.clone()),
        schedule_cron: Set(task.schedule_cron.clone()),
        config_json: Set(Some(task.config_json.clone())),
        is_enabled: Set(task.is_enabled),
        last_run_at: Set(task.last_run_at),
        next_run_at: Set(task.next_run_at),
        last_run_status: Set(task.last_run_status.clone()),
        last_run_log_file: Set(task.last_run_log_file.clone()),
        is_deleted: Set(task.base.metadata.is_deleted),
        created_at: Set(Some(task.base.metadata.created_at)),
        updated_at: Set(Some(Utc::now())),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<ScheduledTask>> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .all(db)
        .await?;
    Ok(models.into_iter().map(Into::into).collect())
}

/// Включённые задачи, по коду
pub async fn list_enabled(db: &DatabaseConnection) -> anyhow::Result<Vec<ScheduledTask>> {
    let models = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::IsEnabled.eq(true))
        .order_by_asc(Column::Code)
        .all(db)
        .await?;
    Ok(models.into_iter().map(Into::into).collect())
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<ScheduledTask>> {
    let model = Entity::find_by_id(id.to_string())
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

pub async fn get_by_code(db: &DatabaseConnection, code: &str) -> anyhow::Result<Option<ScheduledTask>> {
    let model = Entity::find()
        .filter(Column::Code.eq(code))
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(model.map(Into::into))
}

pub async fn insert(db: &DatabaseConnection, task: &ScheduledTask) -> anyhow::Result<()> {
    to_active(task).insert(db).await?;
    Ok(())
}

/// Обновить описание задачи. Поля последнего запуска пишет только `record_run`.
pub async fn update(db: &DatabaseConnection, task: &ScheduledTask) -> anyhow::Result<()> {
    let mut active = to_active(task);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.last_run_at = sea_orm::ActiveValue::NotSet;
    active.last_run_status = sea_orm::ActiveValue::NotSet;
    active.last_run_log_file = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}

/// Итог запуска. `None` в `log_file` сохраняет прежний путь к журналу.
pub async fn record_run(
    db: &DatabaseConnection,
    id: Uuid,
    last_run_at: Option<DateTime<Utc>>,
    next_run_at: Option<DateTime<Utc>>,
    log_file: Option<String>,
    status: &str,
) -> anyhow::Result<bool> {
    let mut update = Entity::update_many()
        .col_expr(Column::LastRunAt, Expr::value(last_run_at))
        .col_expr(Column::NextRunAt, Expr::value(next_run_at))
        .col_expr(Column::LastRunStatus, Expr::value(status.to_string()))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()));
    if let Some(log_file) = log_file {
        update = update.col_expr(Column::LastRunLogFile, Expr::value(log_file));
    }
    let result = update
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::IsDeleted.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

pub async fn soft_delete(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsDeleted, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}
