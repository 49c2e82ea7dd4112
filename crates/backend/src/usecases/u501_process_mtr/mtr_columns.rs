//! Заголовки колонок MTR-отчёта (GST Merchant Tax Report)

pub const ORDER_ID: &str = "Order Id";
pub const TRANSACTION_TYPE: &str = "Transaction Type";
pub const QUANTITY: &str = "Quantity";
pub const SKU: &str = "Sku";
pub const ASIN: &str = "Asin";
pub const INVOICE_DATE: &str = "Invoice Date";
pub const INVOICE_NUMBER: &str = "Invoice Number";
pub const SHIPMENT_ITEM_ID: &str = "Shipment Item Id";
pub const SHIP_TO_CITY: &str = "Ship To City";
pub const SHIP_TO_STATE: &str = "Ship To State";
pub const SHIP_TO_COUNTRY: &str = "Ship To Country";
pub const SHIP_TO_POSTAL_CODE: &str = "Ship To Postal Code";
pub const HSN_SAC: &str = "Hsn/sac";
pub const TAX_EXCLUSIVE_GROSS: &str = "Tax Exclusive Gross";
pub const INVOICE_AMOUNT: &str = "Invoice Amount";
pub const CGST_RATE: &str = "Cgst Rate";
pub const SGST_RATE: &str = "Sgst Rate";
pub const IGST_RATE: &str = "Igst Rate";
pub const CGST_TAX: &str = "Cgst Tax";
pub const SGST_TAX: &str = "Sgst Tax";
pub const IGST_TAX: &str = "Igst Tax";
pub const WAREHOUSE_ID: &str = "Warehouse Id";

/// Есть только в B2B-отчёте
pub const CUSTOMER_BILL_TO_GSTID: &str = "Customer Bill To Gstid";
pub const BUYER_NAME: &str = "Buyer Name";

/// Без этих колонок файл не обрабатывается
pub const REQUIRED: &[&str] = &[ORDER_ID, TRANSACTION_TYPE, QUANTITY, SKU];

pub const SHIPMENT: &str = "Shipment";

/// Префикс имени MTR-файла (B2B и B2C)
pub const MTR_FILE_PREFIX: &str = "GST_MTR_B2";
