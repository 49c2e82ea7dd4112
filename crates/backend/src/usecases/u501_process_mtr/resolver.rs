//! Поиск и создание связанных документов для строк MTR

use anyhow::Context;
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a002_common_settings::aggregate::CommonSettings;
use contracts::domain::a006_customer::aggregate::Customer;
use contracts::domain::a007_contact::aggregate::Contact;
use contracts::domain::a008_address::aggregate::Address;
use contracts::domain::a009_item::aggregate::Item;
use contracts::enums::TaxColumn;

use super::parser::{MtrOrder, MtrRow};
use crate::shared::data::erp_store::ErpStore;

/// Клиент, контакт и адрес доставки заказа
#[derive(Debug, Clone, PartialEq)]
pub struct Party {
    pub customer: String,
    pub contact: String,
    pub address: String,
    pub gstin: Option<String>,
}

/// Колонка и ставка шаблона налога: SGST → "In State", иначе IGST → "Out State"
pub fn tax_template_key(row: &MtrRow) -> Option<(TaxColumn, f64)> {
    if let Some(rate) = row.sgst_rate {
        return Some((TaxColumn::InState, rate));
    }
    row.igst_rate.map(|rate| (TaxColumn::OutState, rate))
}

/// Клиент и контакт заказа: для B2B по покупателю, для B2C общий клиент
pub async fn resolve_party(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    common: &CommonSettings,
    order: &MtrOrder,
    is_b2b: bool,
) -> anyhow::Result<Party> {
    let first = order.first();
    let gstin = if is_b2b { first.gstin.clone() } else { None };

    let (customer, contact) = if is_b2b {
        let buyer = first
            .buyer_name
            .clone()
            .or_else(|| gstin.clone())
            .ok_or_else(|| anyhow::anyhow!("B2B order {} has no buyer name", order.order_id))?;
        let customer = store
            .ensure_customer(Customer::new_for_insert(
                buyer.clone(),
                settings.customer_group.clone(),
                settings.territory.clone(),
                settings.customer_type.clone(),
                gstin.clone(),
            ))
            .await
            .with_context(|| format!("Failed to create customer '{}'", buyer))?;
        let contact = store
            .ensure_contact(Contact::new_for_insert(buyer, customer.clone(), None))
            .await?;
        (customer, contact)
    } else {
        let customer = common.b2c_customer.trim();
        if customer.is_empty() {
            anyhow::bail!("B2C customer is not configured in common settings");
        }
        let contact = store
            .ensure_contact(Contact::for_b2c_buyer(&order.order_id, customer, None))
            .await?;
        (customer.to_string(), contact)
    };

    let mut address = Address::shipping_for_order(
        &order.order_id,
        first.ship_to_city.clone(),
        first.ship_to_state.clone(),
        first.ship_to_postal_code.clone(),
        first.ship_to_country.as_deref(),
    );
    address.link_customer = Some(customer.clone());
    let address = store.ensure_address(address).await?;

    Ok(Party {
        customer,
        contact,
        address,
        gstin,
    })
}

/// Склад по коду FC, иначе склад по умолчанию из настроек
pub async fn resolve_warehouse(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    row: &MtrRow,
) -> anyhow::Result<String> {
    if let Some(fc) = row.warehouse_id.as_deref() {
        if let Some(warehouse) = store.find_warehouse(&settings.company, fc).await? {
            return Ok(warehouse);
        }
    }
    settings
        .default_warehouse
        .clone()
        .filter(|w| !w.trim().is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No warehouse of {} for fulfilment center {}",
                settings.company,
                row.warehouse_id.as_deref().unwrap_or("(empty)")
            )
        })
}

pub async fn resolve_item(store: &dyn ErpStore, row: &MtrRow) -> anyhow::Result<Item> {
    store
        .find_item_for_sku(&row.sku, row.asin.as_deref())
        .await?
        .ok_or_else(|| anyhow::anyhow!("No item found for SKU {}", row.sku))
}

/// Шаблон налога товара; строка без ставок идёт без шаблона
pub async fn resolve_tax_template(
    store: &dyn ErpStore,
    row: &MtrRow,
) -> anyhow::Result<Option<String>> {
    let Some((column, rate)) = tax_template_key(row) else {
        return Ok(None);
    };
    let template = store
        .find_tax_template(column, rate)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No item tax template for {} rate {}", column, rate))?;
    Ok(Some(template))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(sgst: Option<f64>, igst: Option<f64>) -> MtrRow {
        MtrRow {
            line: 2,
            order_id: "408-1".into(),
            transaction_type: "Shipment".into(),
            quantity: 1.0,
            sku: "SKU1".into(),
            asin: None,
            invoice_date: None,
            line_ref: None,
            ship_to_city: None,
            ship_to_state: None,
            ship_to_country: None,
            ship_to_postal_code: None,
            hsn_sac: None,
            tax_exclusive_gross: 0.0,
            invoice_amount: 0.0,
            cgst_rate: sgst,
            sgst_rate: sgst,
            igst_rate: igst,
            cgst_tax: 0.0,
            sgst_tax: 0.0,
            igst_tax: 0.0,
            warehouse_id: None,
            gstin: None,
            buyer_name: None,
            raw: Default::default(),
        }
    }

    #[test]
    fn test_tax_template_key() {
        assert_eq!(
            tax_template_key(&row(Some(0.05), None)),
            Some((TaxColumn::InState, 0.05))
        );
        assert_eq!(
            tax_template_key(&row(None, Some(0.05))),
            Some((TaxColumn::OutState, 0.05))
        );
        assert_eq!(tax_template_key(&row(None, None)), None);
    }
}
