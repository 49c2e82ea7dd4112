use crate::domain::common::{AggregateRoot, BaseAggregate, EntityMetadata, Origin};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// ID Type
// ============================================================================

crate::uuid_aggregate_id!(
    /// Идентификатор счета на продажу
    SalesInvoiceId
);

pub const DEFAULT_STOCK_UOM: &str = "Nos";

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DocStatus {
    #[default]
    Draft,
    Submitted,
}

impl DocStatus {
    pub fn as_i32(&self) -> i32 {
        match self {
            DocStatus::Draft => 0,
            DocStatus::Submitted => 1,
        }
    }

    pub fn from_i32(value: i32) -> Self {
        if value == 1 {
            DocStatus::Submitted
        } else {
            DocStatus::Draft
        }
    }
}

// ============================================================================
// Nested parts
// ============================================================================

/// Строка товаров счета
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesInvoiceLine {
    pub item_code: String,
    pub item_name: String,
    pub description: String,
    pub qty: f64,
    /// Цена за единицу без налога
    pub rate: f64,
    /// Сумма без налога (Tax Exclusive Gross)
    pub net_amount: f64,
    /// Сумма с налогом (Invoice Amount)
    pub grand_total: f64,
    pub stock_uom: String,
    pub conversion_factor: f64,
    pub warehouse: Option<String>,
    pub item_tax_template: Option<String>,
    pub gst_hsn_code: Option<String>,
}

impl SalesInvoiceLine {
    pub fn new(item_code: String, item_name: String, description: String) -> Self {
        Self {
            item_code,
            item_name,
            description,
            qty: 0.0,
            rate: 0.0,
            net_amount: 0.0,
            grand_total: 0.0,
            stock_uom: DEFAULT_STOCK_UOM.to_string(),
            conversion_factor: 1.0,
            warehouse: None,
            item_tax_template: None,
            gst_hsn_code: None,
        }
    }

    /// Добавить количество и суммы ещё одной строки источника
    pub fn accumulate(&mut self, qty: f64, net_amount: f64, grand_total: f64) {
        self.qty += qty;
        self.net_amount += net_amount;
        self.grand_total += grand_total;
        self.rate = if self.qty > 0.0 {
            self.net_amount / self.qty
        } else {
            0.0
        };
    }
}

/// Строка налогов счета
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SalesInvoiceTax {
    /// Тип начисления; для Amazon всегда "Actual" - суммы берутся из отчёта
    pub charge_type: String,
    pub account_head: String,
    pub description: String,
    pub tax_amount: f64,
}

impl SalesInvoiceTax {
    pub fn actual(account_head: String, description: String, tax_amount: f64) -> Self {
        Self {
            charge_type: "Actual".to_string(),
            account_head,
            description,
            tax_amount,
        }
    }
}

// ============================================================================
// Aggregate Root
// ============================================================================

/// Счет на продажу, выставленный по заказу Amazon.
///
/// `code` - имя документа по серии нумерации; присваивается при записи.
/// На один `amazon_order_id` существует не более одного счета.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesInvoice {
    #[serde(flatten)]
    pub base: BaseAggregate<SalesInvoiceId>,

    pub naming_series: String,
    pub company: String,
    pub customer: String,
    pub contact_person: Option<String>,
    pub shipping_address_name: Option<String>,
    pub amazon_order_id: String,
    pub marketplace_id: Option<String>,
    pub settings_code: String,
    pub posting_date: NaiveDate,
    pub due_date: NaiveDate,
    pub tax_category: String,
    pub gst_category: String,
    pub billing_gstin: Option<String>,
    pub debit_to: Option<String>,
    pub docstatus: DocStatus,

    pub items: Vec<SalesInvoiceLine>,
    pub taxes: Vec<SalesInvoiceTax>,

    pub net_total: f64,
    pub total_taxes: f64,
    pub grand_total: f64,
}

impl SalesInvoice {
    /// Черновик счета по заказу. Оплата у Amazon предварительная,
    /// поэтому срок оплаты совпадает с датой проводки.
    pub fn new_draft(
        naming_series: String,
        company: String,
        customer: String,
        amazon_order_id: String,
        settings_code: String,
        posting_date: NaiveDate,
    ) -> Self {
        let description = format!("Amazon order {}", amazon_order_id);
        Self {
            base: BaseAggregate::new(SalesInvoiceId::new_v4(), String::new(), description),
            naming_series,
            company,
            customer,
            contact_person: None,
            shipping_address_name: None,
            amazon_order_id,
            marketplace_id: None,
            settings_code,
            posting_date,
            due_date: posting_date,
            tax_category: String::new(),
            gst_category: String::new(),
            billing_gstin: None,
            debit_to: None,
            docstatus: DocStatus::Draft,
            items: Vec::new(),
            taxes: Vec::new(),
            net_total: 0.0,
            total_taxes: 0.0,
            grand_total: 0.0,
        }
    }

    pub fn recompute_totals(&mut self) {
        self.net_total = round2(self.items.iter().map(|i| i.net_amount).sum());
        self.total_taxes = round2(self.taxes.iter().map(|t| t.tax_amount).sum());
        let line_total: f64 = self.items.iter().map(|i| i.grand_total).sum();
        self.grand_total = if line_total > 0.0 {
            round2(line_total)
        } else {
            round2(self.net_total + self.total_taxes)
        };
    }

    pub fn submit(&mut self) {
        self.docstatus = DocStatus::Submitted;
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.amazon_order_id.trim().is_empty() {
            return Err("Amazon order id must not be empty".into());
        }
        if self.customer.trim().is_empty() {
            return Err("Customer must be set".into());
        }
        if self.company.trim().is_empty() {
            return Err("Company must be set".into());
        }
        if self.items.is_empty() {
            return Err(format!(
                "Invoice for order {} has no items",
                self.amazon_order_id
            ));
        }
        if let Some(line) = self.items.iter().find(|l| l.qty <= 0.0) {
            return Err(format!("Item {} has non-positive quantity", line.item_code));
        }
        if self.due_date < self.posting_date {
            return Err("Due date must not be before posting date".into());
        }
        Ok(())
    }

    pub fn before_write(&mut self) {
        self.recompute_totals();
        self.base.touch();
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl AggregateRoot for SalesInvoice {
    type Id = SalesInvoiceId;

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
        "a005"
    }

    fn collection_name() -> &'static str {
        "sales_invoice"
    }

    fn element_name() -> &'static str {
        "Sales Invoice"
    }

    fn list_name() -> &'static str {
        "Sales Invoices"
    }

    fn origin() -> Origin {
        Origin::Erp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoice() -> SalesInvoice {
        SalesInvoice::new_draft(
            "ACC-SINV-.YYYY.-".into(),
            "Acme India".into(),
            "Amazon B2C".into(),
            "408-1234567".into(),
            "Default".into(),
            NaiveDate::from_ymd_opt(2024, 4, 2).unwrap(),
        )
    }

    #[test]
    fn test_accumulate_recomputes_rate() {
        let mut line = SalesInvoiceLine::new("ITEM1".into(), "Item".into(), "Item".into());
        line.accumulate(1.0, 100.0, 105.0);
        line.accumulate(2.0, 200.0, 210.0);
        assert_eq!(line.qty, 3.0);
        assert!((line.rate - 100.0).abs() < 1e-9);
        assert_eq!(line.grand_total, 315.0);
    }

    #[test]
    fn test_totals_and_validation() {
        let mut inv = invoice();
        assert!(inv.validate().is_err());
        let mut line = SalesInvoiceLine::new("ITEM1".into(), "Item".into(), "Item".into());
        line.accumulate(2.0, 190.48, 200.0);
        inv.items.push(line);
        inv.taxes.push(SalesInvoiceTax::actual("SGST - AC".into(), "SGST".into(), 4.76));
        inv.taxes.push(SalesInvoiceTax::actual("CGST - AC".into(), "CGST".into(), 4.76));
        inv.before_write();
        assert!(inv.validate().is_ok());
        assert_eq!(inv.net_total, 190.48);
        assert_eq!(inv.total_taxes, 9.52);
        assert_eq!(inv.grand_total, 200.0);
        assert_eq!(inv.due_date, inv.posting_date);
    }

    #[test]
    fn test_docstatus_codes() {
        assert_eq!(DocStatus::from_i32(DocStatus::Submitted.as_i32()), DocStatus::Submitted);
        assert_eq!(DocStatus::from_i32(0), DocStatus::Draft);
    }
}
