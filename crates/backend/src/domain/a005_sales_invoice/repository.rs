use contracts::domain::a005_sales_invoice::aggregate::{
    DocStatus, SalesInvoice, SalesInvoiceId, SalesInvoiceLine, SalesInvoiceTax,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::shared::data::db::is_unique_violation;

/// Сколько раз пробуем взять следующий номер, если его занял параллельный запуск
const NAME_RETRIES: usize = 5;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a005_sales_invoice")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub naming_series: String,
    pub company: String,
    pub customer: String,
    pub contact_person: Option<String>,
    pub shipping_address_name: Option<String>,
    pub amazon_order_id: String,
    pub marketplace_id: Option<String>,
    pub settings_code: String,
    pub posting_date: chrono::NaiveDate,
    pub due_date: chrono::NaiveDate,
    pub tax_category: String,
    pub gst_category: String,
    pub billing_gstin: Option<String>,
    pub debit_to: Option<String>,
    pub docstatus: i32,
    pub items_json: String,
    pub taxes_json: String,
    pub net_total: f64,
    pub total_taxes: f64,
    pub grand_total: f64,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SalesInvoice {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        let items: Vec<SalesInvoiceLine> = serde_json::from_str(&m.items_json).unwrap_or_default();
        let taxes: Vec<SalesInvoiceTax> = serde_json::from_str(&m.taxes_json).unwrap_or_default();

        SalesInvoice {
            base: BaseAggregate::with_metadata(
                SalesInvoiceId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            naming_series: m.naming_series,
            company: m.company,
            customer: m.customer,
            contact_person: m.contact_person,
            shipping_address_name: m.shipping_address_name,
            amazon_order_id: m.amazon_order_id,
            marketplace_id: m.marketplace_id,
            settings_code: m.settings_code,
            posting_date: m.posting_date,
            due_date: m.due_date,
            tax_category: m.tax_category,
            gst_category: m.gst_category,
            billing_gstin: m.billing_gstin,
            debit_to: m.debit_to,
            docstatus: DocStatus::from_i32(m.docstatus),
            items,
            taxes,
            net_total: m.net_total,
            total_taxes: m.total_taxes,
            grand_total: m.grand_total,
        }
    }
}

fn to_active(aggregate: &SalesInvoice) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        naming_series: Set(aggregate.naming_series.clone()),
        company: Set(aggregate.company.clone()),
        customer: Set(aggregate.customer.clone()),
        contact_person: Set(aggregate.contact_person.clone()),
        shipping_address_name: Set(aggregate.shipping_address_name.clone()),
        amazon_order_id: Set(aggregate.amazon_order_id.clone()),
        marketplace_id: Set(aggregate.marketplace_id.clone()),
        settings_code: Set(aggregate.settings_code.clone()),
        posting_date: Set(aggregate.posting_date),
        due_date: Set(aggregate.due_date),
        tax_category: Set(aggregate.tax_category.clone()),
        gst_category: Set(aggregate.gst_category.clone()),
        billing_gstin: Set(aggregate.billing_gstin.clone()),
        debit_to: Set(aggregate.debit_to.clone()),
        docstatus: Set(aggregate.docstatus.as_i32()),
        items_json: Set(serde_json::to_string(&aggregate.items)?),
        taxes_json: Set(serde_json::to_string(&aggregate.taxes)?),
        net_total: Set(aggregate.net_total),
        total_taxes: Set(aggregate.total_taxes),
        grand_total: Set(aggregate.grand_total),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

/// Результат вставки счета
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// Счёт записан под этим именем
    Inserted(String),
    /// По заказу уже есть счёт
    Duplicate,
}

/// Следующее свободное имя в серии: `{prefix}{NNNNN}`
pub async fn next_name(db: &DatabaseConnection, prefix: &str) -> anyhow::Result<String> {
    let codes: Vec<String> = Entity::find()
        .select_only()
        .column(Column::Code)
        .filter(Column::Code.starts_with(prefix))
        .into_tuple()
        .all(db)
        .await?;
    let last = codes
        .iter()
        .filter_map(|c| c.get(prefix.len()..).and_then(|n| n.parse::<u64>().ok()))
        .max()
        .unwrap_or(0);
    Ok(format!("{}{:05}", prefix, last + 1))
}

/// Вставить счёт, присвоив ему имя из серии.
///
/// Повтор по тому же заказу не создаёт второй счёт: UNIQUE на `amazon_order_id`.
pub async fn insert_named(
    db: &DatabaseConnection,
    aggregate: &mut SalesInvoice,
    prefix: &str,
) -> anyhow::Result<InsertOutcome> {
    for _ in 0..NAME_RETRIES {
        aggregate.base.code = next_name(db, prefix).await?;
        match to_active(aggregate)?.insert(db).await {
            Ok(_) => return Ok(InsertOutcome::Inserted(aggregate.base.code.clone())),
            Err(e) if is_unique_violation(&e, "amazon_order_id") => {
                return Ok(InsertOutcome::Duplicate)
            }
            Err(e) if is_unique_violation(&e, "a005_sales_invoice.code") => {
                tracing::warn!("Invoice name {} taken, retrying", aggregate.base.code);
                continue;
            }
            Err(e) => return Err(e.into()),
        }
    }
    anyhow::bail!("Could not allocate an invoice name with prefix {}", prefix)
}

pub async fn get_by_code(db: &DatabaseConnection, code: &str) -> anyhow::Result<Option<SalesInvoice>> {
    let result = Entity::find()
        .filter(Column::Code.eq(code))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn get_by_amazon_order_id(
    db: &DatabaseConnection,
    amazon_order_id: &str,
) -> anyhow::Result<Option<SalesInvoice>> {
    let result = Entity::find()
        .filter(Column::AmazonOrderId.eq(amazon_order_id))
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<SalesInvoice>> {
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
