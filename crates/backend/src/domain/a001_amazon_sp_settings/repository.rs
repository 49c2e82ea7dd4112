use chrono::Utc;
use contracts::domain::a001_amazon_sp_settings::aggregate::{AmazonSpSettings, AmazonSpSettingsId};
use contracts::domain::common::{BaseAggregate, EntityMetadata};
use contracts::enums::ItemLookupField;
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::Expr;
use sea_orm::{QueryOrder, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "a001_amazon_sp_settings")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub description: String,
    pub comment: Option<String>,
    pub company: String,
    pub is_default: bool,
    pub is_enabled: bool,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
    pub application_id: String,
    pub seller_central_url: String,
    pub oauth_path: String,
    pub oauth_redirect_uri: String,
    pub oauth_token_url: Option<String>,
    pub public_base_url: Option<String>,
    pub marketplace_id: String,
    pub sp_api_endpoint: Option<String>,
    pub report_types_json: String,
    pub orders_created_after_days: i64,
    pub sales_invoice_series: Option<String>,
    pub debit_to: Option<String>,
    pub default_warehouse: Option<String>,
    pub customer_group: String,
    pub territory: String,
    pub customer_type: String,
    pub item_lookup_field: String,
    pub is_deleted: bool,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    pub version: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AmazonSpSettings {
    fn from(m: Model) -> Self {
        let metadata = EntityMetadata::restore(m.created_at, m.updated_at, m.is_deleted, m.version);
        let uuid = Uuid::parse_str(&m.id).unwrap_or_else(|_| Uuid::new_v4());
        let report_types: Vec<String> =
            serde_json::from_str(&m.report_types_json).unwrap_or_default();

        AmazonSpSettings {
            base: BaseAggregate::with_metadata(
                AmazonSpSettingsId(uuid),
                m.code,
                m.description,
                m.comment,
                metadata,
            ),
            company: m.company,
            is_default: m.is_default,
            is_enabled: m.is_enabled,
            client_id: m.client_id,
            client_secret: m.client_secret,
            refresh_token: m.refresh_token,
            application_id: m.application_id,
            seller_central_url: m.seller_central_url,
            oauth_path: m.oauth_path,
            oauth_redirect_uri: m.oauth_redirect_uri,
            oauth_token_url: m.oauth_token_url,
            public_base_url: m.public_base_url,
            marketplace_id: m.marketplace_id,
            sp_api_endpoint: m.sp_api_endpoint,
            report_types,
            orders_created_after_days: m.orders_created_after_days,
            sales_invoice_series: m.sales_invoice_series,
            debit_to: m.debit_to,
            default_warehouse: m.default_warehouse,
            customer_group: m.customer_group,
            territory: m.territory,
            customer_type: m.customer_type,
            item_lookup_field: ItemLookupField::from_code(&m.item_lookup_field).unwrap_or_default(),
        }
    }
}

fn to_active(aggregate: &AmazonSpSettings) -> anyhow::Result<ActiveModel> {
    Ok(ActiveModel {
        id: Set(aggregate.base.id.value().to_string()),
        code: Set(aggregate.base.code.clone()),
        description: Set(aggregate.base.description.clone()),
        comment: Set(aggregate.base.comment.clone()),
        company: Set(aggregate.company.clone()),
        is_default: Set(aggregate.is_default),
        is_enabled: Set(aggregate.is_enabled),
        client_id: Set(aggregate.client_id.clone()),
        client_secret: Set(aggregate.client_secret.clone()),
        refresh_token: Set(aggregate.refresh_token.clone()),
        application_id: Set(aggregate.application_id.clone()),
        seller_central_url: Set(aggregate.seller_central_url.clone()),
        oauth_path: Set(aggregate.oauth_path.clone()),
        oauth_redirect_uri: Set(aggregate.oauth_redirect_uri.clone()),
        oauth_token_url: Set(aggregate.oauth_token_url.clone()),
        public_base_url: Set(aggregate.public_base_url.clone()),
        marketplace_id: Set(aggregate.marketplace_id.clone()),
        sp_api_endpoint: Set(aggregate.sp_api_endpoint.clone()),
        report_types_json: Set(serde_json::to_string(&aggregate.report_types)?),
        orders_created_after_days: Set(aggregate.orders_created_after_days),
        sales_invoice_series: Set(aggregate.sales_invoice_series.clone()),
        debit_to: Set(aggregate.debit_to.clone()),
        default_warehouse: Set(aggregate.default_warehouse.clone()),
        customer_group: Set(aggregate.customer_group.clone()),
        territory: Set(aggregate.territory.clone()),
        customer_type: Set(aggregate.customer_type.clone()),
        item_lookup_field: Set(aggregate.item_lookup_field.code().to_string()),
        is_deleted: Set(aggregate.base.metadata.is_deleted),
        created_at: Set(Some(aggregate.base.metadata.created_at)),
        updated_at: Set(Some(aggregate.base.metadata.updated_at)),
        version: Set(aggregate.base.metadata.version),
    })
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<AmazonSpSettings>> {
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

/// Включённые настройки с пройденной авторизацией
pub async fn list_enabled(db: &DatabaseConnection) -> anyhow::Result<Vec<AmazonSpSettings>> {
    let items = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .filter(Column::IsEnabled.eq(true))
        .filter(Column::RefreshToken.is_not_null())
        .order_by_asc(Column::Code)
        .all(db)
        .await?
        .into_iter()
        .map(AmazonSpSettings::from)
        .filter(|s| s.is_authorized())
        .collect();
    Ok(items)
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<AmazonSpSettings>> {
    let result = Entity::find_by_id(id.to_string()).one(db).await?;
    Ok(result.map(Into::into))
}

pub async fn get_by_code(db: &DatabaseConnection, code: &str) -> anyhow::Result<Option<AmazonSpSettings>> {
    let result = Entity::find()
        .filter(Column::Code.eq(code))
        .filter(Column::IsDeleted.eq(false))
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

/// Настройки, отмеченные как основные (или первые по коду)
pub async fn get_default(db: &DatabaseConnection) -> anyhow::Result<Option<AmazonSpSettings>> {
    let result = Entity::find()
        .filter(Column::IsDeleted.eq(false))
        .order_by_desc(Column::IsDefault)
        .order_by_asc(Column::Code)
        .one(db)
        .await?;
    Ok(result.map(Into::into))
}

pub async fn insert(db: &DatabaseConnection, aggregate: &AmazonSpSettings) -> anyhow::Result<Uuid> {
    let uuid = aggregate.base.id.value();
    to_active(aggregate)?.insert(db).await?;
    Ok(uuid)
}

/// Обновление без перезаписи refresh token
pub async fn update(db: &DatabaseConnection, aggregate: &AmazonSpSettings) -> anyhow::Result<()> {
    let mut active = to_active(aggregate)?;
    active.refresh_token = sea_orm::ActiveValue::NotSet;
    active.created_at = sea_orm::ActiveValue::NotSet;
    active.update(db).await?;
    Ok(())
}

/// Записать refresh token, полученный через OAuth
pub async fn set_refresh_token(
    db: &DatabaseConnection,
    code: &str,
    refresh_token: &str,
) -> anyhow::Result<bool> {
    let result = Entity::update_many()
        .col_expr(Column::RefreshToken, Expr::value(refresh_token.to_string()))
        .col_expr(Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(Column::Code.eq(code))
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
