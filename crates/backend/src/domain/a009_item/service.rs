use super::repository;
use contracts::domain::a009_item::aggregate::{Item, ItemDto};
use contracts::enums::ItemLookupField;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub async fn create(db: &DatabaseConnection, dto: ItemDto) -> anyhow::Result<Uuid> {
    let mut aggregate = Item::new_for_insert(dto.item_code.clone(), dto.item_name.clone());
    aggregate.update(&dto);

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(db, &aggregate).await
}

pub async fn update(db: &DatabaseConnection, dto: ItemDto) -> anyhow::Result<()> {
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

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<Item>> {
    repository::list_all(db).await
}

/// Товар по полю, выбранному в настройках продавца
pub async fn find_for_order_item(
    db: &DatabaseConnection,
    field: ItemLookupField,
    value: &str,
) -> anyhow::Result<Option<Item>> {
    repository::find_by_field(db, field, value).await
}

/// Товар для строки MTR: сначала по `amazon_sku`, затем по коду, затем по ASIN
pub async fn find_for_mtr_line(
    db: &DatabaseConnection,
    sku: &str,
    asin: Option<&str>,
) -> anyhow::Result<Option<Item>> {
    if let Some(item) = repository::find_by_field(db, ItemLookupField::AmazonSku, sku).await? {
        return Ok(Some(item));
    }
    if let Some(item) = repository::find_by_field(db, ItemLookupField::ItemCode, sku).await? {
        return Ok(Some(item));
    }
    match asin.filter(|a| !a.trim().is_empty()) {
        Some(asin) => repository::find_by_field(db, ItemLookupField::Asin, asin).await,
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;

    #[tokio::test]
    async fn test_mtr_lookup_order() {
        let db = connect_in_memory().await;
        create(
            &db,
            ItemDto {
                item_code: "ITEM1".into(),
                item_name: "Item one".into(),
                amazon_sku: Some("SKU1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create(
            &db,
            ItemDto {
                item_code: "SKU2".into(),
                item_name: "Item two".into(),
                asin: Some("B0000002".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let by_sku = find_for_mtr_line(&db, "SKU1", None).await.unwrap().unwrap();
        assert_eq!(by_sku.item_code(), "ITEM1");
        let by_code = find_for_mtr_line(&db, "SKU2", None).await.unwrap().unwrap();
        assert_eq!(by_code.item_code(), "SKU2");
        let by_asin = find_for_mtr_line(&db, "UNKNOWN", Some("B0000002")).await.unwrap().unwrap();
        assert_eq!(by_asin.item_code(), "SKU2");
        assert!(find_for_mtr_line(&db, "UNKNOWN", None).await.unwrap().is_none());
    }
}
