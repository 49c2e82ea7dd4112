use chrono::Utc;
use contracts::domain::a011_item_tax_template::aggregate::{ItemTaxTemplate, ItemTaxTemplateId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use contracts::enums::TaxColumn;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set};
use uuid::Uuid;

/// Допуск при сравнении ставки из отчёта со ставкой шаблона
const RATE_EPSILON: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "a011_item_tax_template")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub company: Option<String>,
    pub mtr_tax_column: String,
    pub mtr_tax_rate: f64,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ItemTaxTemplate {
    type Error = anyhow::Error;

    fn try_from(m: Model) -> Result<Self, Self::Error> {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        let column = TaxColumn::from_str_opt(&m.mtr_tax_column).ok_or_else(|| {
            anyhow::anyhow!("Unknown tax column '{}' on template {}", m.mtr_tax_column, m.code)
        })?;
        Ok(ItemTaxTemplate {
            base: BaseAggregate::with_metadata(
                ItemTaxTemplateId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            company: m.company,
            mtr_tax_column: column,
            mtr_tax_rate: m.mtr_tax_rate,
        })
    }
}

fn to_active(aggregate: &ItemTaxTemplate) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        company: Set(aggregate.company.clone()),
        mtr_tax_column: Set(aggregate.mtr_tax_column.as_str().to_string()),
        mtr_tax_rate: Set(aggregate.mtr_tax_rate),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<ItemTaxTemplate>> {
    Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .all(db)
        .await?
        .into_iter()
        .map(ItemTaxTemplate::try_from)
        .collect()
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<ItemTaxTemplate>> {
    Entity::find_by_id(id.to_string())
        .one(db)
        .await?
        .map(ItemTaxTemplate::try_from)
        .transpose()
}

/// Шаблон для колонки и ставки из MTR
pub async fn find_by_column_and_rate(
    db: &DatabaseConnection,
    column: TaxColumn,
    rate: f64,
) -> anyhow::Result<Option<ItemTaxTemplate>> {
    let candidates = Entity::find()
        .filter(Column::MtrTaxColumn.eq(column.as_str()))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .all(db)
        .await?;
    candidates
        .into_iter()
        .find(|m| (m.mtr_tax_rate - rate).abs() < RATE_EPSILON)
        .map(ItemTaxTemplate::try_from)
        .transpose()
}

pub async fn insert(db: &DatabaseConnection, aggregate: &ItemTaxTemplate) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate).insert(db).await?;
    Ok(uuid)
}

pub async fn update(db: &DatabaseConnection, aggregate: &ItemTaxTemplate) -> anyhow::Result<()> {
    let mut active = to_active(aggregate);
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
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
