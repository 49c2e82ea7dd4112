use contracts::domain::a002_common_settings::aggregate::{
    CommonSettings, CommonSettingsId, COMMON_SETTINGS_CODE,
};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a002_common_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub b2c_customer: String,
    pub in_state_tax_category: String,
    pub out_state_tax_category: String,
    pub cgst_account: Option<String>,
    pub sgst_account: Option<String>,
    pub igst_account: Option<String>,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CommonSettings {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        CommonSettings {
            base: BaseAggregate::with_metadata(
                CommonSettingsId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            b2c_customer: m.b2c_customer,
            in_state_tax_category: m.in_state_tax_category,
            out_state_tax_category: m.out_state_tax_category,
            cgst_account: m.cgst_account,
            sgst_account: m.sgst_account,
            igst_account: m.igst_account,
        }
    }
}

/// Единственная запись общих настроек
pub async fn get(db: &DatabaseConnection) -> anyhow::Result<Option<CommonSettings>> {
    let result = Entity::find()
        .filter(Column::Code.eq(COMMON_SETTINGS_CODE))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

/// Вставка или обновление по коду
pub async fn upsert(db: &DatabaseConnection, aggregate: &CommonSettings) -> anyhow::Result<()> {
    let existing = Entity::find()
        .filter(Column::Code.eq(COMMON_SETTINGS_CODE))
        .one(db)
        .await?;

    let mut active = ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        b2c_customer: Set(aggregate.b2c_customer.clone()),
        in_state_tax_category: Set(aggregate.in_state_tax_category.clone()),
        out_state_tax_category: Set(aggregate.out_state_tax_category.clone()),
        cgst_account: Set(aggregate.cgst_account.clone()),
        sgst_account: Set(aggregate.sgst_account.clone()),
        igst_account: Set(aggregate.igst_account.clone()),
        is_deleted: Set(false),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    };

    match existing {
        Some(row) => {
            active.id = Set(row.id);
            active.created_at = sea_orm::ActiveValue::NotSet;
            active.update(db).await?;
        }
        None => {
            active.insert(db).await?;
        }
    }
    Ok(())
}
