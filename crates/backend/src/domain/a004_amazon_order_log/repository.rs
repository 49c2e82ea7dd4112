use contracts::domain::a004_amazon_order_log::aggregate::{
    AmazonOrderLog, AmazonOrderLogId, OrderLogSource, OrderLogStatus,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a004_amazon_order_log")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub amazon_order_id: String,
    pub settings_code: String,
    pub source: String,
    pub line_ref: Option<String>,
    pub status: String,
    pub raw_json: String,
    pub sales_invoice: Option<String>,
    pub error_message: Option<String>,
    pub report_job_id: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AmazonOrderLog {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());

        AmazonOrderLog {
            base: BaseAggregate::with_metadata(
                AmazonOrderLogId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            amazon_order_id: m.amazon_order_id,
            settings_code: m.settings_code,
            source: OrderLogSource::from_str_opt(&m.source).unwrap_or(OrderLogSource::OrdersApi),
            line_ref: m.line_ref,
            status: OrderLogStatus::from_str_opt(&m.status).unwrap_or(OrderLogStatus::Error),
            raw_json: m.raw_json,
            sales_invoice: m.sales_invoice,
            error_message: m.error_message,
            report_job_id: m.report_job_id,
        }
    }
}

fn to_active(aggregate: &AmazonOrderLog) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        amazon_order_id: Set(aggregate.amazon_order_id.clone()),
        settings_code: Set(aggregate.settings_code.clone()),
        source: Set(aggregate.source.as_str().to_string()),
        line_ref: Set(aggregate.line_ref.clone()),
        status: Set(aggregate.status.as_str().to_string()),
        raw_json: Set(aggregate.raw_json.clone()),
        sales_invoice: Set(aggregate.sales_invoice.clone()),
        error_message: Set(aggregate.error_message.clone()),
        report_job_id: Set(aggregate.report_job_id.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

pub async fn insert(db: &DatabaseConnection, aggregate: &AmazonOrderLog) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate).insert(db).await?;
    Ok(uuid)
}

pub async fn update(db: &DatabaseConnection, aggregate: &AmazonOrderLog) -> anyhow::Result<()> {
    let mut active = to_active(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<AmazonOrderLog>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(result.map(Into::into))
}

/// Есть ли уже запись по заказу из данного источника
pub async fn exists_for_order(
    db: &DatabaseConnection,
    amazon_order_id: &str,
    source: OrderLogSource,
) -> anyhow::Result<bool> {
    let count = Entity::find()
        .filter(Column::AmazonOrderId.eq(amazon_order_id))
        .filter(Column::Source.eq(source.as_str()))
        .filter(Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// Записи Orders API, ожидающие счета
pub async fn list_pending(
    db: &DatabaseConnection,
    settings_code: Option<&str>,
) -> anyhow::Result<Vec<AmazonOrderLog>> {
    let mut query = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::Status.eq(OrderLogStatus::Pending.as_str()))
        .filter(Column::SalesInvoice.is_null());
    if let Some(code) = settings_code {
        query = query.filter(Column::SettingsCode.eq(code));
    }
    let items = query
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn list_for_order(
    db: &DatabaseConnection,
    amazon_order_id: &str,
) -> anyhow::Result<Vec<AmazonOrderLog>> {
    let items = Entity::find()
        .filter(Column::AmazonOrderId.eq(amazon_order_id))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn list_recent(
    db: &DatabaseConnection,
    status: Option<OrderLogStatus>,
    limit: u64,
) -> anyhow::Result<Vec<AmazonOrderLog>> {
    let mut query = Entity::find().filter(Column::IsDeleted.eq(false));
    if let Some(status) = status {
        query = query.filter(Column::Status.eq(status.as_str()));
    }
    let items = query
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}
