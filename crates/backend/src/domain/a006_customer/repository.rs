use contracts::domain::a006_customer::aggregate::{Customer, CustomerId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::{QueryOrder, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a006_customer")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub customer_group: String,
    pub territory: String,
    pub customer_type: String,
    pub gstin: Option<String>,
    pub gst_category: String,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Customer {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        Customer {
            base: BaseAggregate::with_metadata(CustomerId(uuid), m.code, m.description, m.comment, metadata),
            customer_group: m.customer_group,
            territory: m.territory,
            customer_type: m.customer_type,
            gstin: m.gstin,
            gst_category: m.gst_category,
        }
    }
}

pub async fn get_by_name(db: &DatabaseConnection, name: &str) -> anyhow::Result<Option<Customer>> {
    let result = Entity::find().filter(Column::Code.eq(name)).one(db).await?;
    Ok(result.map(Into::into))
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Customer>> {
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

pub async fn insert(db: &DatabaseConnection, aggregate: &Customer) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        customer_group: Set(aggregate.customer_group.clone()),
        territory: Set(aggregate.territory.clone()),
        customer_type: Set(aggregate.customer_type.clone()),
        gstin: Set(aggregate.gstin.clone()),
        gst_category: Set(aggregate.gst_category.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(())
}
