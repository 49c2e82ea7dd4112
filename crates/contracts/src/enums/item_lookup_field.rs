use serde::{Deserialize, Serialize};

/// Поле справочника товаров, по которому сопоставляется строка заказа Amazon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemLookupField {
    #[default]
    Asin,
    /// Seller SKU, сохранённый в карточке товара (`amazon_sku`)
    AmazonSku,
    /// Seller SKU совпадает с кодом товара ERP
    ItemCode,
}

impl ItemLookupField {
    /// Код поля для хранения в БД
    pub fn code(&self) -> &'static str {
        match self {
            ItemLookupField::Asin => "asin",
            ItemLookupField::AmazonSku => "amazon_sku",
            ItemLookupField::ItemCode => "item_code",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "asin" => Some(ItemLookupField::Asin),
            "amazon_sku" => Some(ItemLookupField::AmazonSku),
            "item_code" => Some(ItemLookupField::ItemCode),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for field in [
            ItemLookupField::Asin,
            ItemLookupField::AmazonSku,
            ItemLookupField::ItemCode,
        ] {
            assert_eq!(ItemLookupField::from_code(field.code()), Some(field));
        }
        assert_eq!(ItemLookupField::from_code("barcode"), None);
    }
}
