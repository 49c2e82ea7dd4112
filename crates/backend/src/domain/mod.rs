pub mod a001_amazon_sp_settings;
pub mod a002_common_settings;
pub mod a003_on_demand_report;
pub mod a004_amazon_order_log;
pub mod a005_sales_invoice;
pub mod a006_customer;
pub mod a007_contact;
pub mod a008_address;
pub mod a009_item;
pub mod a010_warehouse;
pub mod a011_item_tax_template;
