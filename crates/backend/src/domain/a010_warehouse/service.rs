use super::repository;
use contracts::domain::a010_warehouse::aggregate::{Warehouse, WarehouseDto};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub async fn create(db: &DatabaseConnection, dto: WarehouseDto) -> anyhow::Result<Uuid> {
    let mut aggregate = Warehouse::new_for_insert(dto.name, dto.company, dto.fba_fulfilment_center);
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();
    repository::insert(db, &aggregate).await
}

pub async fn update(db: &DatabaseConnection, dto: WarehouseDto) -> anyhow::Result<()> {
    let id = dto
        .id
        .as_ref()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid ID"))?;
    let mut aggregate = repository::get_by_id(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Not found"))?;

    aggregate.base.code = dto.name.clone();
    aggregate.base.description = dto.name;
    aggregate.company = dto.company;
    aggregate.fba_fulfilment_center = dto.fba_fulfilment_center;

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();
    repository::update(db, &aggregate).await
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Warehouse>> {
    repository::list_all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_fulfilment_center_lookup_is_case_insensitive() {
        let db = connect_in_memory().await;
        create(
            &db,
            WarehouseDto {
                id: None,
                name: "BLR8 - TC".into(),
                company: "Test Co".into(),
                fba_fulfilment_center: Some(" blr8 ".into()),
            },
        )
        .await
        .unwrap();

        let found = repository::find_by_fulfilment_center(&db, "Test Co", "Blr8")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.base.code, "BLR8 - TC");
        assert!(repository::find_by_fulfilment_center(&db, "Other Co", "BLR8")
            .await
            .unwrap()
            .is_none());
    }
}
