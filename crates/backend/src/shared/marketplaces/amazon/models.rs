//! DTO ответов Selling Partner API.
//!
//! Reports API 2021-06-30 использует camelCase, Orders API v0 - PascalCase
//! внутри `payload`.

use serde::{Deserialize, Serialize};

// ============================================================================
// Reports API 2021-06-30
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportSpecification {
    pub report_type: String,
    pub marketplace_ids: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_end_time: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportResponse {
    pub report_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub report_id: String,
    pub report_type: String,
    pub processing_status: String,
    #[serde(default)]
    pub report_document_id: Option<String>,
    #[serde(default)]
    pub data_start_time: Option<String>,
    #[serde(default)]
    pub data_end_time: Option<String>,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub processing_start_time: Option<String>,
    #[serde(default)]
    pub processing_end_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub report_document_id: String,
    pub url: String,
    /// "GZIP", если документ сжат
    #[serde(default)]
    pub compression_algorithm: Option<String>,
    /// Присутствует только у документов старой версии API
    #[serde(default)]
    pub encryption_details: Option<EncryptionDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptionDetails {
    /// "AES"
    pub standard: String,
    /// base64
    pub initialization_vector: String,
    /// base64
    pub key: String,
}

// ============================================================================
// Orders API v0
// ============================================================================

/// Параметры выборки заказов
#[derive(Debug, Clone, PartialEq)]
pub struct OrdersQuery {
    pub marketplace_ids: Vec<String>,
    /// ISO 8601, UTC
    pub created_after: String,
    pub order_statuses: Vec<String>,
    /// "AFN" - Fulfilled by Amazon (FBA)
    pub fulfillment_channels: Vec<String>,
    pub max_results_per_page: u32,
}

impl OrdersQuery {
    /// Отгруженные FBA-заказы, страницы по 50
    pub fn shipped_fba(marketplace_id: &str, created_after: String) -> Self {
        Self {
            marketplace_ids: vec![marketplace_id.to_string()],
            created_after,
            order_statuses: vec!["Shipped".to_string()],
            fulfillment_channels: vec!["AFN".to_string()],
            max_results_per_page: 50,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrdersEnvelope {
    pub payload: OrdersPage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct OrdersPage {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    pub amazon_order_id: String,
    pub purchase_date: String,
    pub order_status: String,
    #[serde(default)]
    pub fulfillment_channel: Option<String>,
    #[serde(default)]
    pub marketplace_id: Option<String>,
    #[serde(default)]
    pub order_total: Option<Money>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub buyer_info: Option<BuyerInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Money {
    pub currency_code: String,
    /// Десятичная строка, как в API
    pub amount: String,
}

impl Money {
    pub fn value(&self) -> f64 {
        self.amount.trim().parse().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct ShippingAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state_or_region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "PascalCase")]
pub struct BuyerInfo {
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub buyer_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderItemsEnvelope {
    pub payload: OrderItemsPage,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItemsPage {
    #[serde(default)]
    pub amazon_order_id: Option<String>,
    #[serde(default)]
    pub order_items: Vec<OrderItem>,
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct OrderItem {
    #[serde(rename = "ASIN")]
    pub asin: String,
    #[serde(rename = "SellerSKU", default)]
    pub seller_sku: Option<String>,
    pub order_item_id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub quantity_ordered: i64,
    #[serde(default)]
    pub quantity_shipped: Option<i64>,
    /// Цена позиции за всё количество, с налогом
    #[serde(default)]
    pub item_price: Option<Money>,
    #[serde(default)]
    pub item_tax: Option<Money>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_envelope_parses_pascal_case() {
        let json = r#"{
            "payload": {
                "Orders": [{
                    "AmazonOrderId": "408-1234567-1234567",
                    "PurchaseDate": "2024-04-02T10:11:12Z",
                    "OrderStatus": "Shipped",
                    "FulfillmentChannel": "AFN",
                    "ShippingAddress": {"City": "BENGALURU", "StateOrRegion": "KARNATAKA", "CountryCode": "IN"}
                }],
                "NextToken": "abc"
            }
        }"#;
        let env: OrdersEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.payload.orders.len(), 1);
        assert_eq!(env.payload.next_token.as_deref(), Some("abc"));
        let addr = env.payload.orders[0].shipping_address.as_ref().unwrap();
        assert_eq!(addr.state_or_region.as_deref(), Some("KARNATAKA"));
    }

    #[test]
    fn test_order_item_field_names() {
        let json = r#"{
            "ASIN": "B000TEST01",
            "SellerSKU": "SKU1",
            "OrderItemId": "1",
            "QuantityOrdered": 2,
            "ItemPrice": {"CurrencyCode": "INR", "Amount": "210.00"},
            "ItemTax": {"CurrencyCode": "INR", "Amount": "10.00"}
        }"#;
        let item: OrderItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.seller_sku.as_deref(), Some("SKU1"));
        assert_eq!(item.item_price.unwrap().value(), 210.0);
    }

    #[test]
    fn test_report_spec_serializes_camel_case() {
        let spec = CreateReportSpecification {
            report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
            marketplace_ids: vec!["A21TJRUUN4KGV".into()],
            data_start_time: Some("2024-05-01T10:00:00.000Z".into()),
            data_end_time: None,
        };
        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["reportType"], "GET_GST_MTR_B2B_CUSTOM");
        assert_eq!(value["dataStartTime"], "2024-05-01T10:00:00.000Z");
        assert!(value.get("dataEndTime").is_none());
    }
}
