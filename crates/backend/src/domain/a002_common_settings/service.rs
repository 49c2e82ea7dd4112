use super::repository;
use contracts::domain::a002_common_settings::aggregate::{CommonSettings, CommonSettingsDto};
use sea_orm::DatabaseConnection;

/// Общие настройки; если запись ещё не создана, возвращаются значения по умолчанию
pub async fn get(db: &DatabaseConnection) -> anyhow::Result<CommonSettings> {
    Ok(repository::get(db).await?.unwrap_or_default())
}

pub async fn save(db: &DatabaseConnection, dto: CommonSettingsDto) -> anyhow::Result<CommonSettings> {
    let mut aggregate = get(db).await?;
    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::upsert(db, &aggregate).await?;
    Ok(aggregate)
}
