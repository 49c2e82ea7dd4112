use super::repository;
use contracts::domain::a011_item_tax_template::aggregate::{ItemTaxTemplate, ItemTaxTemplateDto};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub async fn create(db: &DatabaseConnection, dto: ItemTaxTemplateDto) -> anyhow::Result<Uuid> {
    let mut aggregate = ItemTaxTemplate::new_for_insert(dto.name, dto.mtr_tax_column, dto.mtr_tax_rate);
    aggregate.company = dto.company;
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();
    repository::insert(db, &aggregate).await
}

pub async fn update(db: &DatabaseConnection, dto: ItemTaxTemplateDto) -> anyhow::Result<()> {
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
    aggregate.mtr_tax_column = dto.mtr_tax_column;
    aggregate.mtr_tax_rate = dto.mtr_tax_rate;

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();
    repository::update(db, &aggregate).await
}

pub async fn delete(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<bool> {
    repository::soft_delete(db, id).await
}

pub async fn list_all(db: &DatabaseConnection) -> anyhow::Result<Vec<ItemTaxTemplate>> {
    repository::list_all(db).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::enums::TaxColumn;

    #[tokio::test]
    async fn test_template_selected_by_column_and_rate() {
        let db = connect_in_memory().await;
        for (name, column) in [("GST 5% In", TaxColumn::InState), ("GST 5% Out", TaxColumn::OutState)] {
            create(
                &db,
                ItemTaxTemplateDto {
                    id: None,
                    name: name.into(),
                    company: None,
                    mtr_tax_column: column,
                    mtr_tax_rate: 0.05,
                },
            )
            .await
            .unwrap();
        }

        let in_state = repository::find_by_column_and_rate(&db, TaxColumn::InState, 0.05)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(in_state.base.code, "GST 5% In");
        let out_state = repository::find_by_column_and_rate(&db, TaxColumn::OutState, 0.05)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(out_state.base.code, "GST 5% Out");
        assert!(repository::find_by_column_and_rate(&db, TaxColumn::InState, 0.18)
            .await
            .unwrap()
            .is_none());
    }
}
