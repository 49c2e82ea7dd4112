use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор склада ERP
    WarehouseId
);

/// Склад ERP, сопоставленный с FBA fulfilment center Amazon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warehouse {
    #[serde(flatten)]
    pub base: BaseAggregate<WarehouseId>,

    pub company: String,
    /// Код FC из колонки "Warehouse Id" отчёта MTR (например, "BLR7")
    pub fba_fulfilment_center: Option<String>,
}

impl Warehouse {
    pub fn new_for_insert(name: String, company: String, fba_fulfilment_center: Option<String>) -> Self {
        Self {
            base: BaseAggregate::new(WarehouseId::new_v4(), name.clone(), name),
            company,
            fba_fulfilment_center,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Warehouse name must not be empty".into());
        }
        if self.company.trim().is_empty() {
            return Err("Warehouse company must be set".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.fba_fulfilment_center = self
            .fba_fulfilment_center
            .take()
            .map(|fc| fc.trim().to_uppercase())
            .filter(|fc| !fc.is_empty());
        self.base.touch();
    }
}

impl AggregateRoot for Warehouse {
    type Id = WarehouseId;

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
        "a010"
    }

    fn collection_name() -> &'static str {
        "warehouse"
    }

    fn element_name() -> &'static str {
        "Warehouse"
    }

    fn list_name() -> &'static str {
        "Warehouses"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WarehouseDto {
    pub id: Option<String>,
    pub name: String,
    pub company: String,
    pub fba_fulfilment_center: Option<String>,
}
