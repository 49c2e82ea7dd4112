use chrono::Utc;
use contracts::domain::a009_item::aggregate::{Item, ItemId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use contracts::enums::ItemLookupField;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a009_item")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub item_description: String,
    pub asin: Option<String>,
    pub amazon_sku: Option<String>,
    pub stock_uom: String,
    pub gst_hsn_code: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Item {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        Item {
            base: BaseAggregate::with_metadata(ItemId(uuid), m.code, m.description, m.comment, metadata),
            item_description: m.item_description,
            asin: m.asin,
            amazon_sku: m.amazon_sku,
            stock_uom: m.stock_uom,
            gst_hsn_code: m.gst_hsn_code,
        }
    }
}

fn to_active(aggregate: &Item) -> ActiveModel {
    ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        item_description: Set(aggregate.item_description.clone()),
        asin: Set(aggregate.asin.clone()),
        amazon_sku: Set(aggregate.amazon_sku.clone()),
        stock_uom: Set(aggregate.stock_uom.clone()),
        gst_hsn_code: Set(aggregate.gst_hsn_code.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Item>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .all(db)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(items)
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<Item>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(result.map(Into::into))
}

/// Первый неудалённый товар, у которого поле `field` равно `value`
pub async fn find_by_field(
    db: &DatabaseConnection,
    field: ItemLookupField,
    value: &str,
) -> anyhow::Result<Option<Item>> {
    let column = match field {
        ItemLookupField::Asin => Column::Asin,
        ItemLookupField::AmazonSku => Column::AmazonSku,
        ItemLookupField::ItemCode => Column::Code,
    };
    let result = Entity::find()
        .filter(column.eq(value))
        .filter(Column::IsDeleted.eq(false))
        .order_by_asc(Column::Code)
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(db: &DatabaseConnection, aggregate: &Item) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate).insert(db).await?;
    Ok(uuid)
}

pub async fn update(db: &DatabaseConnection, aggregate: &Item) -> anyhow::Result<()> {
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
