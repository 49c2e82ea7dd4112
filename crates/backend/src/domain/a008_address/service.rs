use super::repository;
use crate::shared::data::db::is_unique_violation;
use contracts::domain::a008_address::aggregate::Address;
use sea_orm::DatabaseConnection;

/// Создать адрес доставки заказа, если его ещё нет. Возвращает имя адреса.
pub async fn ensure(db: &DatabaseConnection, mut address: Address) -> anyhow::Result<String> {
    let name = address.base.code.clone();
    if repository::get_by_name(db, &name).await?.is_some() {
        return Ok(name);
    }

    address
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    address.before_write();

    match repository::insert(db, &address).await {
        Ok(()) => Ok(name),
        Err(e) if is_unique_violation(&e, "code") => Ok(name),
        Err(e) => Err(e.into()),
    }
}
