use super::repository;
use crate::shared::data::db::is_unique_violation;
use contracts::domain::a007_contact::aggregate::Contact;
use sea_orm::DatabaseConnection;

/// Создать контакт покупателя, если его ещё нет. Возвращает имя контакта.
pub async fn ensure(db: &DatabaseConnection, mut contact: Contact) -> anyhow::Result<String> {
    let name = contact.base.code.clone();
    if repository::get_by_name(db, &name).await?.is_some() {
        return Ok(name);
    }

    contact
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    contact.before_write();

    match repository::insert(db, &contact).await {
        Ok(()) => Ok(name),
        Err(e) if is_unique_violation(&e, "code") => Ok(name),
        Err(e) => Err(e.into()),
    }
}
