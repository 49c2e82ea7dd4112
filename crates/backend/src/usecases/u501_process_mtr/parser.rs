use std::collections::HashMap;

use serde_json::{Map, Value};

use super::mtr_columns as col;
use crate::shared::format::parse_amount;
use crate::shared::marketplaces::amazon::document::unwrap_zip;
use crate::shared::marketplaces::amazon::DocumentError;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, thiserror::Error)]
pub enum MtrError {
    #[error("MTR archive could not be read: {0}")]
    Archive(#[from] DocumentError),

    #[error("MTR file is not valid CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("MTR file is missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("Invalid value '{value}' in column '{column}' at line {line}")]
    InvalidValue {
        line: u64,
        column: &'static str,
        value: String,
    },
}

/// Строка MTR-отчёта
#[derive(Debug, Clone, PartialEq)]
pub struct MtrRow {
    pub line: u64,
    pub order_id: String,
    pub transaction_type: String,
    pub quantity: f64,
    pub sku: String,
    pub asin: Option<String>,
    pub invoice_date: Option<String>,
    /// Shipment Item Id, а если его нет - Invoice Number
    pub line_ref: Option<String>,
    pub ship_to_city: Option<String>,
    pub ship_to_state: Option<String>,
    pub ship_to_country: Option<String>,
    pub ship_to_postal_code: Option<String>,
    pub hsn_sac: Option<String>,
    pub tax_exclusive_gross: f64,
    pub invoice_amount: f64,
    pub cgst_rate: Option<f64>,
    pub sgst_rate: Option<f64>,
    pub igst_rate: Option<f64>,
    pub cgst_tax: f64,
    pub sgst_tax: f64,
    pub igst_tax: f64,
    pub warehouse_id: Option<String>,
    pub gstin: Option<String>,
    pub buyer_name: Option<String>,
    /// Строка как есть, для журнала заказов
    pub raw: Map<String, Value>,
}

impl MtrRow {
    pub fn is_shipment(&self) -> bool {
        self.transaction_type.eq_ignore_ascii_case(col::SHIPMENT) && self.quantity > 0.0
    }

    pub fn raw_json(&self) -> String {
        Value::Object(self.raw.clone()).to_string()
    }
}

/// Разобранный MTR-файл
#[derive(Debug, Clone, Default)]
pub struct MtrTable {
    pub headers: Vec<String>,
    pub rows: Vec<MtrRow>,
    /// B2B-отчёт: есть колонка GSTIN покупателя
    pub is_b2b: bool,
}

impl MtrTable {
    pub fn shipment_rows(&self) -> impl Iterator<Item = &MtrRow> {
        self.rows.iter().filter(|r| r.is_shipment())
    }
}

/// Строки одного заказа в порядке появления в файле
#[derive(Debug, Clone)]
pub struct MtrOrder {
    pub order_id: String,
    pub rows: Vec<MtrRow>,
}

impl MtrOrder {
    pub fn first(&self) -> &MtrRow {
        &self.rows[0]
    }
}

/// Разобрать MTR-файл (CSV или zip с CSV внутри)
pub fn parse_mtr(content: Vec<u8>) -> Result<MtrTable, MtrError> {
    let data = unwrap_zip(content)?;
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(&data);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_string()).collect();
    let index: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.as_str(), i))
        .collect();
    for required in col::REQUIRED {
        if !index.contains_key(required) {
            return Err(MtrError::MissingColumn(required));
        }
    }
    let is_b2b = index.contains_key(col::CUSTOMER_BILL_TO_GSTID);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cells = Cells {
            record: &record,
            index: &index,
            line,
        };

        let mut raw = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let value = record.get(i).unwrap_or_default();
            raw.insert(header.clone(), Value::String(value.to_string()));
        }

        rows.push(MtrRow {
            line,
            order_id: cells.text(col::ORDER_ID).unwrap_or_default(),
            transaction_type: cells.text(col::TRANSACTION_TYPE).unwrap_or_default(),
            quantity: cells.amount(col::QUANTITY)?,
            sku: cells.text(col::SKU).unwrap_or_default(),
            asin: cells.text(col::ASIN),
            invoice_date: cells.text(col::INVOICE_DATE),
            line_ref: cells
                .text(col::SHIPMENT_ITEM_ID)
                .or_else(|| cells.text(col::INVOICE_NUMBER)),
            ship_to_city: cells.text(col::SHIP_TO_CITY),
            ship_to_state: cells.text(col::SHIP_TO_STATE),
            ship_to_country: cells.text(col::SHIP_TO_COUNTRY),
            ship_to_postal_code: cells.text(col::SHIP_TO_POSTAL_CODE),
            hsn_sac: cells.text(col::HSN_SAC),
            tax_exclusive_gross: cells.amount(col::TAX_EXCLUSIVE_GROSS)?,
            invoice_amount: cells.amount(col::INVOICE_AMOUNT)?,
            cgst_rate: cells.rate(col::CGST_RATE)?,
            sgst_rate: cells.rate(col::SGST_RATE)?,
            igst_rate: cells.rate(col::IGST_RATE)?,
            cgst_tax: cells.amount(col::CGST_TAX)?,
            sgst_tax: cells.amount(col::SGST_TAX)?,
            igst_tax: cells.amount(col::IGST_TAX)?,
            warehouse_id: cells.text(col::WAREHOUSE_ID),
            gstin: cells.text(col::CUSTOMER_BILL_TO_GSTID),
            buyer_name: cells.text(col::BUYER_NAME),
            raw,
        });
    }

    tracing::debug!(
        "Parsed MTR file: {} rows, {} columns, b2b={}",
        rows.len(),
        headers.len(),
        is_b2b
    );

    Ok(MtrTable {
        headers,
        rows,
        is_b2b,
    })
}

/// Сгруппировать строки отгрузок по номеру заказа
pub fn group_by_order<'a>(rows: impl Iterator<Item = &'a MtrRow>) -> Vec<MtrOrder> {
    let mut orders: Vec<MtrOrder> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in rows {
        if row.order_id.is_empty() {
            continue;
        }
        match positions.get(&row.order_id) {
            Some(&pos) => orders[pos].rows.push(row.clone()),
            None => {
                positions.insert(row.order_id.clone(), orders.len());
                orders.push(MtrOrder {
                    order_id: row.order_id.clone(),
                    rows: vec![row.clone()],
                });
            }
        }
    }
    orders
}

struct Cells<'a> {
    record: &'a csv::StringRecord,
    index: &'a HashMap<&'a str, usize>,
    line: u64,
}

impl Cells<'_> {
    fn raw(&self, column: &str) -> Option<&str> {
        self.index
            .get(column)
            .and_then(|&i| self.record.get(i))
            .map(str::trim)
    }

    fn text(&self, column: &str) -> Option<String> {
        self.raw(column)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn amount(&self, column: &'static str) -> Result<f64, MtrError> {
        let value = self.raw(column).unwrap_or_default();
        parse_amount(value).ok_or_else(|| MtrError::InvalidValue {
            line: self.line,
            column,
            value: value.to_string(),
        })
    }

    /// Ставка налога: пусто или 0 → нет ставки
    fn rate(&self, column: &'static str) -> Result<Option<f64>, MtrError> {
        let rate = self.amount(column)?;
        Ok(Some(rate).filter(|r| *r > 0.0))
    }
}
