use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use crate::enums::TaxColumn;
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор шаблона налога товара
    ItemTaxTemplateId
);

/// Шаблон налога товара (например, "GST 5% In State").
///
/// Подбирается для строки MTR по паре (колонка налога, ставка).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTaxTemplate {
    #[serde(flatten)]
    pub base: BaseAggregate<ItemTaxTemplateId>,

    pub company: Option<String>,
    pub mtr_tax_column: TaxColumn,
    /// Ставка в долях, как в отчёте: 0.05 = 5%
    pub mtr_tax_rate: f64,
}

impl ItemTaxTemplate {
    pub fn new_for_insert(name: String, mtr_tax_column: TaxColumn, mtr_tax_rate: f64) -> Self {
        Self {
            base: BaseAggregate::new(ItemTaxTemplateId::new_v4(), name.clone(), name),
            company: None,
            mtr_tax_column,
            mtr_tax_rate,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Template name must not be empty".into());
        }
        if !(0.0..=1.0).contains(&self.mtr_tax_rate) {
            return Err(format!(
                "Tax rate {} must be a fraction between 0 and 1",
                self.mtr_tax_rate
            ));
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for ItemTaxTemplate {
    type Id = ItemTaxTemplateId;

    fn id(&self) -> Self::Id {
        self.base.id
    }

    fn code(&self) -> &str {
        &self.base.code
    }

    fn description(&self) -> &str {
        &self.base.description
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.base.metadata
    }

    fn metadata_mut(&mut self) -> &mut EntityMetadata {
        &mut self.base.metadata
    }

    fn aggregate_index() -> &'static str {
        "a011"
    }

    fn collection_name() -> &'static str {
        "item_tax_template"
    }

    fn element_name() -> &'static str {
        "Item Tax Template"
    }

    fn list_name() -> &'static str {
        "Item Tax Templates"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemTaxTemplateDto {
    pub id: Option<String>,
    pub name: String,
    pub company: Option<String>,
    pub mtr_tax_column: TaxColumn,
    pub mtr_tax_rate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_must_be_fraction() {
        let mut t = ItemTaxTemplate::new_for_insert("GST 5%".into(), TaxColumn::InState, 0.05);
        assert!(t.validate().is_ok());
        t.mtr_tax_rate = 5.0;
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_column_serializes_as_report_label() {
        let json = serde_json::to_string(&TaxColumn::OutState).unwrap();
        assert_eq!(json, "\"Out State\"");
    }
}
