use crate::domain::a005_sales_invoice::aggregate::DEFAULT_STOCK_UOM;
use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор товара ERP
    ItemId
);

/// Карточка товара ERP. `code` - item_code, `description` - item_name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    #[serde(flatten)]
    pub base: BaseAggregate<ItemId>,

    pub item_description: String,
    pub asin: Option<String>,
    pub amazon_sku: Option<String>,
    pub stock_uom: String,
    pub gst_hsn_code: Option<String>,
}

impl Item {
    pub fn new_for_insert(item_code: String, item_name: String) -> Self {
        Self {
            base: BaseAggregate::new(ItemId::new_v4(), item_code, item_name.clone()),
            item_description: item_name,
            asin: None,
            amazon_sku: None,
            stock_uom: DEFAULT_STOCK_UOM.to_string(),
            gst_hsn_code: None,
        }
    }

    pub fn item_code(&self) -> &str {
        &self.base.code
    }

    pub fn item_name(&self) -> &str {
        &self.base.description
    }

    pub fn update(&mut self, dto: &ItemDto) {
        self.base.code = dto.item_code.clone();
        self.base.description = dto.item_name.clone();
        self.item_description = dto
            .description
            .clone()
            .unwrap_or_else(|| dto.item_name.clone());
        self.asin = dto.asin.clone();
        self.amazon_sku = dto.amazon_sku.clone();
        if let Some(uom) = &dto.stock_uom {
            self.stock_uom = uom.clone();
        }
        self.gst_hsn_code = dto.gst_hsn_code.clone();
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Item code must not be empty".into());
        }
        if self.base.description.trim().is_empty() {
            return Err("Item name must not be empty".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.asin = self.asin.take().filter(|v| !v.trim().is_empty());
        self.amazon_sku = self.amazon_sku.take().filter(|v| !v.trim().is_empty());
        self.base.touch();
    }
}

impl AggregateRoot for Item {
    type Id = ItemId;

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
        "a009"
    }

    fn collection_name() -> &'static str {
        "item"
    }

    fn element_name() -> &'static str {
        "Item"
    }

    fn list_name() -> &'static str {
        "Items"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ItemDto {
    pub id: Option<String>,
    pub item_code: String,
    pub item_name: String,
    pub description: Option<String>,
    pub asin: Option<String>,
    pub amazon_sku: Option<String>,
    pub stock_uom: Option<String>,
    pub gst_hsn_code: Option<String>,
}
