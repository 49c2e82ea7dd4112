use crate::domain::a002_common_settings::aggregate::CommonSettings;
use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор клиента ERP
    CustomerId
);

/// Клиент ERP. `code` - имя клиента, оно же ключ поиска.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    #[serde(flatten)]
    pub base: BaseAggregate<CustomerId>,

    pub customer_group: String,
    pub territory: String,
    pub customer_type: String,
    pub gstin: Option<String>,
    pub gst_category: String,
}

impl Customer {
    /// Клиент B2B, созданный по строке MTR с GSTIN покупателя
    pub fn new_for_insert(
        name: String,
        customer_group: String,
        territory: String,
        customer_type: String,
        gstin: Option<String>,
    ) -> Self {
        let gstin = gstin.filter(|g| !g.trim().is_empty());
        let gst_category = CommonSettings::gst_category_for(gstin.as_deref()).to_string();
        Self {
            base: BaseAggregate::new(CustomerId::new_v4(), name.clone(), name),
            customer_group,
            territory,
            customer_type,
            gstin,
            gst_category,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Customer name must not be empty".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.code = self.base.code.trim().to_string();
        self.base.touch();
    }
}

impl AggregateRoot for Customer {
    type Id = CustomerId;

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
        "a006"
    }

    fn collection_name() -> &'static str {
        "customer"
    }

    fn element_name() -> &'static str {
        "Customer"
    }

    fn list_name() -> &'static str {
        "Customers"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}
