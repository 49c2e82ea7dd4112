use chrono::NaiveDate;
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a002_common_settings::aggregate::{CommonSettings, GstComponent};
use contracts::domain::a005_sales_invoice::aggregate::{
    SalesInvoice, SalesInvoiceLine, SalesInvoiceTax,
};
use contracts::domain::a009_item::aggregate::Item;

use super::parser::{MtrOrder, MtrRow};
use super::resolver::Party;
use crate::shared::format::parse_amz_date;

/// Строка MTR с найденными товаром, складом и шаблоном налога
#[derive(Debug, Clone)]
pub struct ResolvedLine<'a> {
    pub row: &'a MtrRow,
    pub item: Item,
    pub warehouse: String,
    pub tax_template: Option<String>,
}

/// Дата проводки из `Invoice Date` первой строки заказа
pub fn posting_date(order: &MtrOrder, today: NaiveDate) -> anyhow::Result<NaiveDate> {
    match order.first().invoice_date.as_deref() {
        Some(value) => parse_amz_date(value).ok_or_else(|| {
            anyhow::anyhow!("Invalid invoice date '{}' in order {}", value, order.order_id)
        }),
        None => Ok(today),
    }
}

/// Собрать черновик счета по заказу.
///
/// Строки с одинаковыми товаром, складом и шаблоном налога складываются в
/// одну строку счета. Суммы налогов CGST/SGST/IGST суммируются по заказу и
/// попадают в таблицу налогов, если для них задан счёт учёта.
pub fn build_invoice(
    settings: &AmazonSpSettings,
    common: &CommonSettings,
    order: &MtrOrder,
    party: &Party,
    lines: &[ResolvedLine<'_>],
    posting_date: NaiveDate,
) -> anyhow::Result<SalesInvoice> {
    let first = order.first();

    let mut invoice = SalesInvoice::new_draft(
        settings.invoice_series().to_string(),
        settings.company.clone(),
        party.customer.clone(),
        order.order_id.clone(),
        settings.base.code.clone(),
        posting_date,
    );
    invoice.contact_person = Some(party.contact.clone());
    invoice.shipping_address_name = Some(party.address.clone());
    invoice.marketplace_id = Some(settings.marketplace_id.clone());
    invoice.tax_category = common.tax_category_for(first.sgst_rate, first.igst_rate);
    invoice.gst_category = CommonSettings::gst_category_for(party.gstin.as_deref()).to_string();
    invoice.billing_gstin = party.gstin.clone();
    invoice.debit_to = settings.debit_to.clone().filter(|d| !d.trim().is_empty());

    for line in lines {
        let position = invoice.items.iter().position(|existing| {
            existing.item_code == line.item.item_code()
                && existing.warehouse.as_deref() == Some(line.warehouse.as_str())
                && existing.item_tax_template == line.tax_template
        });
        let target = match position {
            Some(index) => &mut invoice.items[index],
            None => {
                let mut new_line = SalesInvoiceLine::new(
                    line.item.item_code().to_string(),
                    line.item.item_name().to_string(),
                    line.item.item_description.clone(),
                );
                new_line.stock_uom = line.item.stock_uom.clone();
                new_line.warehouse = Some(line.warehouse.clone());
                new_line.item_tax_template = line.tax_template.clone();
                new_line.gst_hsn_code = line
                    .row
                    .hsn_sac
                    .clone()
                    .or_else(|| line.item.gst_hsn_code.clone());
                invoice.items.push(new_line);
                let last = invoice.items.len() - 1;
                &mut invoice.items[last]
            }
        };
        target.accumulate(
            line.row.quantity,
            line.row.tax_exclusive_gross,
            line.row.invoice_amount,
        );
    }

    let components = [
        (GstComponent::Cgst, order.rows.iter().map(|r| r.cgst_tax).sum::<f64>()),
        (GstComponent::Sgst, order.rows.iter().map(|r| r.sgst_tax).sum::<f64>()),
        (GstComponent::Igst, order.rows.iter().map(|r| r.igst_tax).sum::<f64>()),
    ];
    for (component, amount) in components {
        if amount.abs() < f64::EPSILON {
            continue;
        }
        match common.account_for(component) {
            Some(account) => invoice.taxes.push(SalesInvoiceTax::actual(
                account.to_string(),
                component.label().to_string(),
                amount,
            )),
            None => tracing::warn!(
                "No {} account configured, tax row skipped for order {}",
                component.label(),
                order.order_id
            ),
        }
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
    use crate::usecases::u501_process_mtr::parser::{group_by_order, parse_mtr};

    fn settings() -> AmazonSpSettings {
        let mut s = AmazonSpSettings::new_for_insert(
            "IN-MAIN".into(),
            "India".into(),
            "Test Co".into(),
            "client".into(),
            "secret".into(),
            "app".into(),
            "A21TJRUUN4KGV".into(),
        );
        s.debit_to = Some("Debtors - TC".into());
        s
    }

    fn common() -> CommonSettings {
        let mut c = CommonSettings::new_default();
        c.b2c_customer = "Amazon B2C".into();
        c.cgst_account = Some("Output CGST - TC".into());
        c.sgst_account = Some("Output SGST - TC".into());
        c
    }

    fn party() -> Party {
        Party {
            customer: "Amazon B2C".into(),
            contact: "Buyer-408-1234567".into(),
            address: "408-1234567 - Shipping".into(),
            gstin: None,
        }
    }

    #[test]
    fn test_same_sku_rows_make_one_line() {
        let csv = "Invoice Date,Transaction Type,Order Id,Quantity,Sku,Hsn/sac,Tax Exclusive Gross,Invoice Amount,Cgst Rate,Sgst Rate,Cgst Tax,Sgst Tax,Igst Tax\n\
                   2024-04-02 10:11:12,Shipment,408-1234567,1,SKU1,8471,100,105,0.025,0.025,2.5,2.5,0\n\
                   2024-04-02 10:11:12,Shipment,408-1234567,2,SKU1,8471,200,210,0.025,0.025,5,5,0\n";
        let table = parse_mtr(csv.as_bytes().to_vec()).unwrap();
        let orders = group_by_order(table.shipment_rows());
        let order = &orders[0];
        let item = Item::new_for_insert("ITEM1".into(), "Item one".into());
        let lines: Vec<ResolvedLine> = order
            .rows
            .iter()
            .map(|row| ResolvedLine {
                row,
                item: item.clone(),
                warehouse: "Stores - TC".into(),
                tax_template: Some("GST 5% In State".into()),
            })
            .collect();

        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let date = posting_date(order, today).unwrap();
        let invoice = build_invoice(&settings(), &common(), order, &party(), &lines, date).unwrap();

        assert_eq!(invoice.posting_date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
        assert_eq!(invoice.due_date, invoice.posting_date);
        assert_eq!(invoice.items.len(), 1);
        let line = &invoice.items[0];
        assert_eq!(line.qty, 3.0);
        assert_eq!(line.net_amount, 300.0);
        assert_eq!(line.rate, 100.0);
        assert_eq!(line.gst_hsn_code.as_deref(), Some("8471"));
        assert_eq!(invoice.tax_category, "In-State");
        assert_eq!(invoice.gst_category, "Unregistered");
        assert_eq!(invoice.taxes.len(), 2);
        assert_eq!(invoice.total_taxes, 15.0);
        assert_eq!(invoice.grand_total, 315.0);
        assert_eq!(invoice.debit_to.as_deref(), Some("Debtors - TC"));
    }

    #[test]
    fn test_bad_invoice_date_is_error() {
        let csv = "Invoice Date,Transaction Type,Order Id,Quantity,Sku\nsoon,Shipment,408-1,1,SKU1\n";
        let table = parse_mtr(csv.as_bytes().to_vec()).unwrap();
        let orders = group_by_order(table.shipment_rows());
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert!(posting_date(&orders[0], today).is_err());
    }

    #[test]
    fn test_day_first_invoice_datetime() {
        let csv = "Invoice Date,Transaction Type,Order Id,Quantity,Sku\n02-04-2024 10:11:12,Shipment,408-1,1,SKU1\n";
        let table = parse_mtr(csv.as_bytes().to_vec()).unwrap();
        let orders = group_by_order(table.shipment_rows());
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            posting_date(&orders[0], today).unwrap(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
        );
    }
}
