use super::repository;
use crate::shared::data::db::is_unique_violation;
use contracts::domain::a006_customer::aggregate::Customer;
use sea_orm::DatabaseConnection;

/// Создать покупателя, если покупателя с таким именем ещё нет. Возвращает имя.
pub async fn ensure(db: &DatabaseConnection, mut customer: Customer) -> anyhow::Result<String> {
    let name = customer.base.code.trim().to_string();
    if repository::get_by_name(db, &name).await?.is_some() {
        return Ok(name);
    }

    customer
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    customer.before_write();

    match repository::insert(db, &customer).await {
        Ok(()) => {
            tracing::info!("Created customer {}", name);
            Ok(name)
        }
        Err(e) if is_unique_violation(&e, "code") => Ok(name),
        Err(e) => Err(e.into()),
    }
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Customer>> {
    repository::list_all(db).await
}
