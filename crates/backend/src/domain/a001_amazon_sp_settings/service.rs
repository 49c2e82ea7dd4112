use super::repository;
use contracts::domain::a001_amazon_sp_settings::aggregate::{AmazonSpSettings, AmazonSpSettingsDto};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Создание настроек продавца
pub async fn create(db: &DatabaseConnection, dto: AmazonSpSettingsDto) -> anyhow::Result<Uuid> {
    let code = dto
        .code
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| "Default".to_string());
    if repository::get_by_code(db, &code).await?.is_some() {
        anyhow::bail!("Settings '{}' already exist", code);
    }

    let mut aggregate = AmazonSpSettings::new_for_insert(
        code,
        dto.description.clone(),
        dto.company.clone(),
        dto.client_id.clone(),
        dto.client_secret.clone().unwrap_or_default(),
        dto.application_id.clone(),
        dto.marketplace_id.clone(),
    );
    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(db, &aggregate).await
}

pub async fn update(db: &DatabaseConnection, dto: AmazonSpSettingsDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;

    let mut aggregate = repository::get_by_id(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::update(db, &aggregate).await
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(db, id).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<AmazonSpSettings>> {
    repository::get_by_id(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<AmazonSpSettings>> {
    repository::list_all(db).await
}

/// Настройки по коду; без кода берутся основные
pub async fn resolve(
    db: &DatabaseConnection,
    code: Option<&str>,
) -> anyhow::Result<AmazonSpSettings> {
    match code.filter(|c| !c.trim().is_empty()) {
        Some(code) => repository::get_by_code(db, code)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Amazon SP settings '{}' not found", code)),
        None => repository::get_default(db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No Amazon SP settings configured")),
    }
}
