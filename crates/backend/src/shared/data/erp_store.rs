//! Доступ к документам ERP для сверки MTR и выставления счетов по заказам.
//!
//! Use case'ы работают через трейт `ErpStore`, а не напрямую с репозиториями.

use async_trait::async_trait;
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a002_common_settings::aggregate::CommonSettings;
use contracts::domain::a004_amazon_order_log::aggregate::AmazonOrderLog;
use contracts::domain::a005_sales_invoice::aggregate::SalesInvoice;
use contracts::domain::a006_customer::aggregate::Customer;
use contracts::domain::a007_contact::aggregate::Contact;
use contracts::domain::a008_address::aggregate::Address;
use contracts::domain::a009_item::aggregate::Item;
use contracts::enums::{ItemLookupField, TaxColumn};
use sea_orm::DatabaseConnection;

use crate::domain::{
    a002_common_settings, a004_amazon_order_log, a005_sales_invoice, a006_customer, a007_contact,
    a008_address, a009_item, a010_warehouse, a011_item_tax_template,
};

pub use crate::domain::a005_sales_invoice::repository::InsertOutcome;

#[async_trait]
pub trait ErpStore: Send + Sync {
    /// Имя счета, уже выставленного по заказу
    async fn invoice_for_order(&self, amazon_order_id: &str) -> anyhow::Result<Option<String>>;

    async fn common_settings(&self) -> anyhow::Result<CommonSettings>;

    /// Товар для позиции Orders API по полю из настроек продавца
    async fn find_item(&self, field: ItemLookupField, value: &str) -> anyhow::Result<Option<Item>>;

    /// Товар для строки MTR
    async fn find_item_for_sku(&self, sku: &str, asin: Option<&str>) -> anyhow::Result<Option<Item>>;

    /// Склад организации для кода fulfilment center
    async fn find_warehouse(&self, company: &str, fulfilment_center: &str) -> anyhow::Result<Option<String>>;

    /// Шаблон налога по колонке MTR и ставке
    async fn find_tax_template(&self, column: TaxColumn, rate: f64) -> anyhow::Result<Option<String>>;

    async fn ensure_customer(&self, customer: Customer) -> anyhow::Result<String>;

    async fn ensure_contact(&self, contact: Contact) -> anyhow::Result<String>;

    async fn ensure_address(&self, address: Address) -> anyhow::Result<String>;

    /// Записать счёт. `Duplicate`, если по заказу счёт уже есть.
    async fn insert_invoice(
        &self,
        invoice: &mut SalesInvoice,
        settings: &AmazonSpSettings,
    ) -> anyhow::Result<InsertOutcome>;

    async fn insert_order_log(&self, log: AmazonOrderLog) -> anyhow::Result<()>;

    async fn save_order_log(&self, log: &mut AmazonOrderLog) -> anyhow::Result<()>;
}

/// `ErpStore` поверх SQLite-репозиториев
#[derive(Clone)]
pub struct DbErpStore {
    db: DatabaseConnection,
}

impl DbErpStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl ErpStore for DbErpStore {
    async fn invoice_for_order(&self, amazon_order_id: &str) -> anyhow::Result<Option<String>> {
        let invoice =
            a005_sales_invoice::repository::get_by_amazon_order_id(&self.db, amazon_order_id).await?;
        Ok(invoice.map(|i| i.base.code))
    }

    async fn common_settings(&self) -> anyhow::Result<CommonSettings> {
        a002_common_settings::service::get(&self.db).await
    }

    async fn find_item(&self, field: ItemLookupField, value: &str) -> anyhow::Result<Option<Item>> {
        a009_item::service::find_for_order_item(&self.db, field, value).await
    }

    async fn find_item_for_sku(&self, sku: &str, asin: Option<&str>) -> anyhow::Result<Option<Item>> {
        a009_item::service::find_for_mtr_line(&self.db, sku, asin).await
    }

    async fn find_warehouse(&self, company: &str, fulfilment_center: &str) -> anyhow::Result<Option<String>> {
        let warehouse =
            a010_warehouse::repository::find_by_fulfilment_center(&self.db, company, fulfilment_center)
                .await?;
        Ok(warehouse.map(|w| w.base.code))
    }

    async fn find_tax_template(&self, column: TaxColumn, rate: f64) -> anyhow::Result<Option<String>> {
        let template =
            a011_item_tax_template::repository::find_by_column_and_rate(&self.db, column, rate).await?;
        Ok(template.map(|t| t.base.code))
    }

    async fn ensure_customer(&self, customer: Customer) -> anyhow::Result<String> {
        a006_customer::service::ensure(&self.db, customer).await
    }

    async fn ensure_contact(&self, contact: Contact) -> anyhow::Result<String> {
        a007_contact::service::ensure(&self.db, contact).await
    }

    async fn ensure_address(&self, address: Address) -> anyhow::Result<String> {
        a008_address::service::ensure(&self.db, address).await
    }

    async fn insert_invoice(
        &self,
        invoice: &mut SalesInvoice,
        settings: &AmazonSpSettings,
    ) -> anyhow::Result<InsertOutcome> {
        a005_sales_invoice::service::create(&self.db, invoice, |year| {
            settings.invoice_name_prefix(year)
        })
        .await
    }

    async fn insert_order_log(&self, log: AmazonOrderLog) -> anyhow::Result<()> {
        a004_amazon_order_log::service::create(&self.db, log).await?;
        Ok(())
    }

    async fn save_order_log(&self, log: &mut AmazonOrderLog) -> anyhow::Result<()> {
        a004_amazon_order_log::service::save(&self.db, log).await
    }
}
