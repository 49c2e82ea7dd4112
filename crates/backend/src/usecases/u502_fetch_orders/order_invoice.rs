//! Счёт по заказу из журнала (Orders API)

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a002_common_settings::aggregate::CommonSettings;
use contracts::domain::a004_amazon_order_log::aggregate::{AmazonOrderLog, OrderLogSource};
use contracts::domain::a005_sales_invoice::aggregate::{SalesInvoice, SalesInvoiceLine};
use contracts::domain::a007_contact::aggregate::Contact;
use contracts::domain::a008_address::aggregate::Address;
use contracts::enums::ItemLookupField;
use contracts::usecases::common::OrderOutcome;
use serde::{Deserialize, Serialize};

use crate::shared::data::erp_store::{ErpStore, InsertOutcome};
use crate::shared::format::parse_amz_date;
use crate::shared::marketplaces::amazon::models::{Order, OrderItem};

/// Заказ с позициями в том виде, в каком он хранится в журнале
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggedOrder {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Значение позиции заказа для поиска товара по полю из настроек
pub fn lookup_value(field: ItemLookupField, item: &OrderItem) -> Option<&str> {
    let value = match field {
        ItemLookupField::Asin => Some(item.asin.as_str()),
        ItemLookupField::AmazonSku | ItemLookupField::ItemCode => item.seller_sku.as_deref(),
    };
    value.filter(|v| !v.trim().is_empty())
}

/// Количество позиции: отгруженное, а если его нет - заказанное
fn line_qty(item: &OrderItem) -> f64 {
    item.quantity_shipped
        .filter(|q| *q > 0)
        .unwrap_or(item.quantity_ordered) as f64
}

/// Выставить счёт по записи журнала и обновить запись.
///
/// Запись получает статус Processed со ссылкой на счёт, в том числе когда
/// счёт по заказу уже существует, или Error с текстом ошибки.
pub async fn create_invoice_from_log(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    log: &mut AmazonOrderLog,
    submit: bool,
) -> anyhow::Result<OrderOutcome> {
    let amazon_order_id = log.amazon_order_id.clone();
    if let Some(existing) = log.sales_invoice.clone() {
        return Ok(OrderOutcome::Skipped {
            amazon_order_id,
            sales_invoice: Some(existing),
        });
    }

    let outcome = match invoice_logged_order(store, settings, log, submit).await {
        Ok(InvoiceResult::Inserted { name, lines }) => {
            log.mark_processed(&name);
            tracing::info!("Created sales invoice {} for order {}", name, amazon_order_id);
            OrderOutcome::Created {
                amazon_order_id,
                sales_invoice: name,
                lines,
            }
        }
        Ok(InvoiceResult::Existing(name)) => {
            log.mark_processed(&name);
            OrderOutcome::Skipped {
                amazon_order_id,
                sales_invoice: Some(name),
            }
        }
        Ok(InvoiceResult::Duplicate) => {
            let existing = store.invoice_for_order(&amazon_order_id).await?;
            if let Some(name) = &existing {
                log.mark_processed(name);
            }
            OrderOutcome::Skipped {
                amazon_order_id,
                sales_invoice: existing,
            }
        }
        Err(e) => {
            let error = format!("{:#}", e);
            tracing::error!("Order {} failed: {}", amazon_order_id, error);
            log.mark_error(error.clone());
            OrderOutcome::Failed {
                amazon_order_id,
                error,
            }
        }
    };

    store.save_order_log(log).await?;
    Ok(outcome)
}

enum InvoiceResult {
    Existing(String),
    Inserted { name: String, lines: usize },
    Duplicate,
}

async fn invoice_logged_order(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    log: &AmazonOrderLog,
    submit: bool,
) -> anyhow::Result<InvoiceResult> {
    if log.source != OrderLogSource::OrdersApi {
        anyhow::bail!("MTR lines are invoiced by processing the MTR file again");
    }
    if let Some(existing) = store.invoice_for_order(&log.amazon_order_id).await? {
        return Ok(InvoiceResult::Existing(existing));
    }

    let logged: LoggedOrder =
        serde_json::from_str(&log.raw_json).context("Stored order payload is not valid")?;
    let common = store.common_settings().await?;
    let mut invoice = build_order_invoice(store, settings, &common, &logged, Utc::now().date_naive())
        .await?;
    if submit {
        invoice.submit();
    }

    match store.insert_invoice(&mut invoice, settings).await? {
        InsertOutcome::Inserted(name) => Ok(InvoiceResult::Inserted {
            name,
            lines: invoice.items.len(),
        }),
        InsertOutcome::Duplicate => Ok(InvoiceResult::Duplicate),
    }
}

/// Черновик счета по заказу Orders API: общий B2C-клиент, контакт
/// покупателя и адрес доставки создаются при необходимости
pub async fn build_order_invoice(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    common: &CommonSettings,
    logged: &LoggedOrder,
    today: NaiveDate,
) -> anyhow::Result<SalesInvoice> {
    let order = &logged.order;
    let customer = common.b2c_customer.trim();
    if customer.is_empty() {
        anyhow::bail!("B2C customer is not configured in common settings");
    }

    let email = order.buyer_info.as_ref().and_then(|b| b.buyer_email.clone());
    let contact = store
        .ensure_contact(Contact::for_b2c_buyer(&order.amazon_order_id, customer, email))
        .await?;

    let shipping = order.shipping_address.clone().unwrap_or_default();
    let mut address = Address::shipping_for_order(
        &order.amazon_order_id,
        shipping.city,
        shipping.state_or_region,
        shipping.postal_code,
        shipping.country_code.as_deref(),
    );
    address.link_customer = Some(customer.to_string());
    let address = store.ensure_address(address).await?;

    let posting_date = parse_amz_date(&order.purchase_date).unwrap_or(today);
    let mut invoice = SalesInvoice::new_draft(
        settings.invoice_series().to_string(),
        settings.company.clone(),
        customer.to_string(),
        order.amazon_order_id.clone(),
        settings.base.code.clone(),
        posting_date,
    );
    invoice.contact_person = Some(contact);
    invoice.shipping_address_name = Some(address);
    invoice.marketplace_id = order
        .marketplace_id
        .clone()
        .or_else(|| Some(settings.marketplace_id.clone()));
    invoice.gst_category = CommonSettings::gst_category_for(None).to_string();
    invoice.debit_to = settings.debit_to.clone().filter(|d| !d.trim().is_empty());
    let warehouse = settings
        .default_warehouse
        .clone()
        .filter(|w| !w.trim().is_empty());

    for order_item in &logged.items {
        let qty = line_qty(order_item);
        if qty <= 0.0 {
            continue;
        }
        let value = lookup_value(settings.item_lookup_field, order_item).ok_or_else(|| {
            anyhow::anyhow!(
                "Order item {} has no {}",
                order_item.order_item_id,
                settings.item_lookup_field.code()
            )
        })?;
        let item = store
            .find_item(settings.item_lookup_field, value)
            .await?
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "No item with {} = {}",
                    settings.item_lookup_field.code(),
                    value
                )
            })?;

        let price = order_item.item_price.as_ref().map(|m| m.value()).unwrap_or(0.0);
        let tax = order_item.item_tax.as_ref().map(|m| m.value()).unwrap_or(0.0);

        let position = invoice
            .items
            .iter()
            .position(|l| l.item_code == item.item_code());
        let line = match position {
            Some(index) => &mut invoice.items[index],
            None => {
                let mut line = SalesInvoiceLine::new(
                    item.item_code().to_string(),
                    item.item_name().to_string(),
                    order_item
                        .title
                        .clone()
                        .unwrap_or_else(|| item.item_description.clone()),
                );
                line.stock_uom = item.stock_uom.clone();
                line.warehouse = warehouse.clone();
                line.gst_hsn_code = item.gst_hsn_code.clone();
                invoice.items.push(line);
                let last = invoice.items.len() - 1;
                &mut invoice.items[last]
            }
        };
        line.accumulate(qty, price - tax, price);
    }

    invoice.recompute_totals();
    invoice
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    Ok(invoice)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::erp_store::DbErpStore;
    use crate::usecases::fixtures::{seeded_db, SETTINGS_CODE};
    use crate::usecases::u502_fetch_orders::pagination::tests::{order, order_item};
    use contracts::domain::a004_amazon_order_log::aggregate::OrderLogStatus;

    fn pending_log(items: Vec<OrderItem>) -> AmazonOrderLog {
        let logged = LoggedOrder {
            order: order("408-5550001"),
            items,
        };
        AmazonOrderLog::pending_order(
            "408-5550001",
            SETTINGS_CODE,
            serde_json::to_string(&logged).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_invoice_from_pending_log() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());
        let mut log = pending_log(vec![
            order_item("B0ASIN1", "SKU1", 2, "236.00", "36.00"),
            order_item("B0ASIN2", "SKU2", 1, "118.00", "18.00"),
        ]);
        store.insert_order_log(log.clone()).await.unwrap();

        let outcome = create_invoice_from_log(&store, &settings, &mut log, false)
            .await
            .unwrap();
        let name = match outcome {
            OrderOutcome::Created { sales_invoice, lines, .. } => {
                assert_eq!(lines, 2);
                sales_invoice
            }
            other => panic!("unexpected outcome {:?}", other),
        };
        assert_eq!(log.status, OrderLogStatus::Processed);
        assert_eq!(log.sales_invoice.as_deref(), Some(name.as_str()));

        let invoice = crate::domain::a005_sales_invoice::repository::get_by_code(&db, &name)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.posting_date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        assert_eq!(invoice.items[0].net_amount, 200.0);
        assert_eq!(invoice.items[0].warehouse.as_deref(), Some("Stores - TC"));
        assert_eq!(invoice.grand_total, 354.0);

        // Повторная обработка не создаёт второй счёт
        let again = create_invoice_from_log(&store, &settings, &mut log, false)
            .await
            .unwrap();
        assert!(matches!(again, OrderOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn test_unknown_asin_marks_error() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db);
        let mut log = pending_log(vec![order_item("B0MISSING", "SKU9", 1, "10", "0")]);
        store.insert_order_log(log.clone()).await.unwrap();

        let outcome = create_invoice_from_log(&store, &settings, &mut log, false)
            .await
            .unwrap();
        assert!(matches!(outcome, OrderOutcome::Failed { .. }));
        assert_eq!(log.status, OrderLogStatus::Error);
        assert!(log.error_message.unwrap().contains("B0MISSING"));
    }

    #[test]
    fn test_lookup_value_by_field() {
        let item = order_item("B0ASIN1", "SKU1", 1, "1", "0");
        assert_eq!(lookup_value(ItemLookupField::Asin, &item), Some("B0ASIN1"));
        assert_eq!(lookup_value(ItemLookupField::ItemCode, &item), Some("SKU1"));
    }
}
