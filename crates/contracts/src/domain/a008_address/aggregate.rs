use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор адреса ERP
    AddressId
);

pub const ADDRESS_TYPE_SHIPPING: &str = "Shipping";
pub const ADDRESS_LINE_NOT_PROVIDED: &str = "Not Provided";

/// Адрес доставки заказа. Имя `"{order-id} - Shipping"` уникально,
/// повторная вставка того же адреса игнорируется.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    #[serde(flatten)]
    pub base: BaseAggregate<AddressId>,

    pub address_title: String,
    pub address_type: String,
    pub address_line1: String,
    pub city: String,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub country: String,
    pub link_customer: Option<String>,
}

impl Address {
    pub fn shipping_for_order(
        amazon_order_id: &str,
        city: Option<String>,
        state: Option<String>,
        pincode: Option<String>,
        country_code: Option<&str>,
    ) -> Self {
        let title = format!("{} - {}", amazon_order_id, ADDRESS_TYPE_SHIPPING);
        Self {
            base: BaseAggregate::new(AddressId::new_v4(), title.clone(), title),
            address_title: amazon_order_id.to_string(),
            address_type: ADDRESS_TYPE_SHIPPING.to_string(),
            address_line1: ADDRESS_LINE_NOT_PROVIDED.to_string(),
            city: city
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| ADDRESS_LINE_NOT_PROVIDED.to_string()),
            state: state.filter(|s| !s.trim().is_empty()),
            pincode: pincode.filter(|p| !p.trim().is_empty()),
            country: country_name(country_code.unwrap_or("IN")),
            link_customer: None,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Address name must not be empty".into());
        }
        if self.country.trim().is_empty() {
            return Err("Country must be set".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

/// Название страны ERP по коду из отчёта Amazon
pub fn country_name(code: &str) -> String {
    match code.trim().to_uppercase().as_str() {
        "" | "IN" | "IND" => "India".to_string(),
        "US" => "United States".to_string(),
        "GB" | "UK" => "United Kingdom".to_string(),
        "AE" => "United Arab Emirates".to_string(),
        _ => code.trim().to_string(),
    }
}

impl AggregateRoot for Address {
    type Id = AddressId;

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
        "a008"
    }

    fn collection_name() -> &'static str {
        "address"
    }

    fn element_name() -> &'static str {
        "Address"
    }

    fn list_name() -> &'static str {
        "Addresses"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipping_address_defaults() {
        let a = Address::shipping_for_order(
            "408-1234567",
            Some("BENGALURU".into()),
            Some("KARNATAKA".into()),
            Some("".into()),
            Some("IN"),
        );
        assert_eq!(a.base.code, "408-1234567 - Shipping");
        assert_eq!(a.address_line1, "Not Provided");
        assert_eq!(a.country, "India");
        assert_eq!(a.pincode, None);
    }

    #[test]
    fn test_country_name_passthrough() {
        assert_eq!(country_name("in"), "India");
        assert_eq!(country_name("Nepal"), "Nepal");
    }
}
