use chrono::Utc;
use contracts::domain::a003_on_demand_report::aggregate::{
    OnDemandReport, OnDemandReportId, ProcessingStatus,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, QuerySelect, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a003_on_demand_report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub settings_code: String,
    pub report_type: String,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    pub report_id: Option<String>,
    pub report_document_id: Option<String>,
    pub status: String,
    pub submitted_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_polled_at: Option<chrono::DateTime<chrono::Utc>>,
    pub poll_attempts: i32,
    pub time_taken_secs: Option<i64>,
    pub file_id: Option<String>,
    pub is_processed: bool,
    pub processing_summary: Option<String>,
    pub error_message: Option<String>,
    pub status_log_json: String,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for OnDemandReport {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        let status = ProcessingStatus::from_remote(&m.status).unwrap_or_else(|| {
            tracing::warn!("Unknown report status '{}' on job {}", m.status, m.code);
            ProcessingStatus::Fatal
        });

        OnDemandReport {
            base: BaseAggregate::with_metadata(
                OnDemandReportId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            settings_code: m.settings_code,
            report_type: m.report_type,
            start_time: m.start_time,
            end_time: m.end_time,
            report_id: m.report_id,
            report_document_id: m.report_document_id,
            status,
            submitted_at: m.submitted_at,
            last_polled_at: m.last_polled_at,
            poll_attempts: m.poll_attempts,
            time_taken_secs: m.time_taken_secs,
            file_id: m.file_id,
            is_processed: m.is_processed,
            processing_summary: m.processing_summary,
            error_message: m.error_message,
            status_log: serde_json::from_str(&m.status_log_json).unwrap_or_default(),
        }
    }
}

fn to_active(aggregate: &OnDemandReport) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        settings_code: Set(aggregate.settings_code.clone()),
        report_type: Set(aggregate.report_type.clone()),
        start_time: Set(aggregate.start_time),
        end_time: Set(aggregate.end_time),
        report_id: Set(aggregate.report_id.clone()),
        report_document_id: Set(aggregate.report_document_id.clone()),
        status: Set(aggregate.status.as_str().to_string()),
        submitted_at: Set(aggregate.submitted_at),
        last_polled_at: Set(aggregate.last_polled_at),
        poll_attempts: Set(aggregate.poll_attempts),
        time_taken_secs: Set(aggregate.time_taken_secs),
        file_id: Set(aggregate.file_id.clone()),
        is_processed: Set(aggregate.is_processed),
        processing_summary: Set(aggregate.processing_summary.clone()),
        error_message: Set(aggregate.error_message.clone()),
        status_log_json: Set(serde_json::to_string(&aggregate.status_log)?),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

pub async fn insert(db: &DatabaseConnection, aggregate: &OnDemandReport) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(db).await?;
    Ok(uuid)
}

pub async fn update(db: &DatabaseConnection, aggregate: &OnDemandReport) -> anyhow::Result<()> {
    let mut active = to_active(aggregate)?;
    active.created_at = sea_orm::ActiveValue::NotSet;
    // флаг обработки меняется только через claim_for_processing
    active.is_processed = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<OnDemandReport>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(result.map(Into::into))
}

pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<OnDemandReport>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Задания в очереди Amazon, по всем продавцам
pub async fn list_waiting(db: &DatabaseConnection) -> anyhow::Result<Vec<OnDemandReport>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Status.is_in([
            ProcessingStatus::InQueue.as_str(),
            ProcessingStatus::InProgress.as_str(),
        ]))
        .order_by_asc(Column::SubmittedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Готовые и ещё не обработанные задания с приложенным файлом
pub async fn list_ready(db: &DatabaseConnection) -> anyhow::Result<Vec<OnDemandReport>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Status.eq(ProcessingStatus::Done.as_str()))
        .filter(Column::IsProcessed.eq(false))
        .filter(Column::FileId.is_not_null())
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

/// Атомарно пометить задание обработанным. `false` - его уже забрал другой запуск.
pub async fn claim_for_processing(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::IsProcessed, Expr::value(true))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::IsProcessed.eq(false))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Итог обработки файла задания
pub async fn set_processing_result(
    db: &DatabaseConnection,
    id: Uuid,
    summary: Option<String>,
    error_message: Option<String>,
) -> anyhow::Result<()> {
    Entity::update_many()
        .col_expr(Column::ProcessingSummary, Expr::value(summary))
        .col_expr(Column::ErrorMessage, Expr::value(error_message))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Id.eq(id.to_string()))
        .exec(db)
        .await?;
    Ok(())
}
