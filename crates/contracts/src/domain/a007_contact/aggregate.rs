use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use serde::{Deserialize, Serialize};

crate::uuid_aggregate_id!(
    /// Идентификатор контакта ERP
    ContactId
);

/// Контактное лицо, привязанное к клиенту
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    #[serde(flatten)]
    pub base: BaseAggregate<ContactId>,

    pub first_name: String,
    /// Имя клиента (a006.code)
    pub link_customer: String,
    pub email: Option<String>,
}

impl Contact {
    pub fn new_for_insert(name: String, link_customer: String, email: Option<String>) -> Self {
        Self {
            base: BaseAggregate::new(ContactId::new_v4(), name.clone(), name.clone()),
            first_name: name,
            link_customer,
            email,
        }
    }

    /// Контакт B2C-покупателя: `Buyer-{order_id}` у общего клиента
    pub fn for_b2c_buyer(amazon_order_id: &str, b2c_customer: &str, email: Option<String>) -> Self {
        Self::new_for_insert(
            format!("Buyer-{}", amazon_order_id),
            b2c_customer.to_string(),
            email,
        )
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.code.trim().is_empty() {
            return Err("Contact name must not be empty".into());
        }
        if self.link_customer.trim().is_empty() {
            return Err("Contact must be linked to a customer".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.base.touch();
    }
}

impl AggregateRoot for Contact {
    type Id = ContactId;

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
        "a007"
    }

    fn collection_name() -> &'static str {
        "contact"
    }

    fn element_name() -> &'static str {
        "Contact"
    }

    fn list_name() -> &'static str {
        "Contacts"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_b2c_contact_name() {
        let c = Contact::for_b2c_buyer("408-1234567", "Amazon B2C", None);
        assert_eq!(c.base.code, "Buyer-408-1234567");
        assert_eq!(c.link_customer, "Amazon B2C");
        assert!(c.validate().is_ok());
    }
}
