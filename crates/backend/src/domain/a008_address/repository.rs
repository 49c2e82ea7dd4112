use contracts::domain::a008_address::aggregate::{Address, AddressId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a008_address")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub address_title: String,
    pub address_type: String,
    pub address_line1: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub link_customer: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Address {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        Address {
            base: BaseAggregate::with_metadata(AddressId(uuid), m.code, m.description, m.comment, metadata),
            address_title: m.address_title,
            address_type: m.address_type,
            address_line1: m.address_line1,
            city: m.city,
            state: m.state,
            pincode: m.pincode,
            country: m.country,
            link_customer: m.link_customer,
        }
    }
}

pub async fn get_by_name(db: &DatabaseConnection, name: &str) -> anyhow::Result<Option<Address>> {
    let result = Entity::find().filter(Column::Code.eq(name)).one(db).await?;
    Ok(result.map(Into::into))
}

pub async fn insert(db: &DatabaseConnection, aggregate: &Address) -> Result<(), DbErr> {
    let active = ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        address_title: Set(aggregate.address_title.clone()),
        address_type: Set(aggregate.address_type.clone()),
        address_line1: Set(aggregate.address_line1.clone()),
        city: Set(aggregate.city.clone()),
        state: Set(aggregate.state.clone()),
        pincode: Set(aggregate.pincode.clone()),
        country: Set(aggregate.country.clone()),
        link_customer: Set(aggregate.link_customer.clone()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };
    active.insert(db).await?;
    Ok(())
}
