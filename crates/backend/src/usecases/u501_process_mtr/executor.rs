use anyhow::Context;
use chrono::{NaiveDate, Utc};
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a002_common_settings::aggregate::CommonSettings;
use contracts::domain::a004_amazon_order_log::aggregate::AmazonOrderLog;
use contracts::usecases::common::{BatchCounters, OrderOutcome, UseCaseMetadata};
use contracts::usecases::u501_process_mtr::ProcessMtr;
use contracts::usecases::u501_process_mtr::request::ProcessMtrRequest;
use contracts::usecases::u501_process_mtr::response::MtrBatchReport;
use sea_orm::DatabaseConnection;

use super::builder::{build_invoice, posting_date, ResolvedLine};
use super::mtr_columns::MTR_FILE_PREFIX;
use super::parser::{group_by_order, parse_mtr, MtrOrder};
use super::resolver::{resolve_item, resolve_party, resolve_tax_template, resolve_warehouse};
use crate::domain::a001_amazon_sp_settings;
use crate::shared::data::erp_store::{DbErpStore, ErpStore, InsertOutcome};
use crate::shared::data::file_storage;
use crate::shared::logger;

/// Параметры прогона сверки
#[derive(Debug, Clone, Default)]
pub struct MtrRunOptions {
    /// Проводить созданные счета
    pub submit: bool,
    /// Задание отчёта, из которого взят файл
    pub report_job_id: Option<String>,
}

enum OrderResult {
    Existing(String),
    Inserted { name: String, lines: usize },
    Duplicate,
}

/// Сверка содержимого MTR-файла: по счету на каждый заказ из строк отгрузок.
///
/// Ошибка разбора файла прерывает весь прогон. Ошибка по заказу
/// записывается в журнал заказов и не мешает остальным заказам.
pub async fn process_mtr_content(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    content: Vec<u8>,
    options: &MtrRunOptions,
) -> anyhow::Result<MtrBatchReport> {
    let table = parse_mtr(content)?;
    let common = store.common_settings().await?;
    let today = Utc::now().date_naive();

    let shipment_rows = table.shipment_rows().count();
    let orders = group_by_order(table.shipment_rows());
    tracing::info!(
        "Processing MTR for '{}': {} rows, {} shipment rows, {} orders (b2b={})",
        settings.base.code,
        table.rows.len(),
        shipment_rows,
        orders.len(),
        table.is_b2b
    );

    let mut outcomes = Vec::with_capacity(orders.len());
    for order in &orders {
        let outcome =
            process_order(store, settings, &common, order, table.is_b2b, options, today).await;
        outcomes.push(outcome);
    }

    Ok(MtrBatchReport {
        file_name: None,
        total_rows: table.rows.len(),
        shipment_rows,
        orders: orders.len(),
        counters: BatchCounters::from_outcomes(&outcomes),
        outcomes,
    })
}

async fn process_order(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    common: &CommonSettings,
    order: &MtrOrder,
    is_b2b: bool,
    options: &MtrRunOptions,
    today: NaiveDate,
) -> OrderOutcome {
    let amazon_order_id = order.order_id.clone();
    match invoice_order(store, settings, common, order, is_b2b, options, today).await {
        Ok(OrderResult::Existing(name)) => {
            tracing::debug!("Order {} already invoiced as {}", amazon_order_id, name);
            OrderOutcome::Skipped {
                amazon_order_id,
                sales_invoice: Some(name),
            }
        }
        Ok(OrderResult::Duplicate) => {
            tracing::info!("Order {} was invoiced concurrently, skipped", amazon_order_id);
            OrderOutcome::Skipped {
                amazon_order_id,
                sales_invoice: None,
            }
        }
        Ok(OrderResult::Inserted { name, lines }) => {
            for row in &order.rows {
                let log = AmazonOrderLog::processed_line(
                    &order.order_id,
                    &settings.base.code,
                    row.line_ref.clone(),
                    row.raw_json(),
                    &name,
                )
                .with_report_job(options.report_job_id.clone());
                write_log(store, log).await;
            }
            tracing::info!("Created sales invoice {} for order {}", name, amazon_order_id);
            OrderOutcome::Created {
                amazon_order_id,
                sales_invoice: name,
                lines,
            }
        }
        Err(e) => {
            let error = format!("{:#}", e);
            tracing::error!("Order {} failed: {}", amazon_order_id, error);
            for row in &order.rows {
                let log = AmazonOrderLog::error_line(
                    &order.order_id,
                    &settings.base.code,
                    row.line_ref.clone(),
                    row.raw_json(),
                    error.clone(),
                )
                .with_report_job(options.report_job_id.clone());
                write_log(store, log).await;
            }
            OrderOutcome::Failed {
                amazon_order_id,
                error,
            }
        }
    }
}

async fn invoice_order(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    common: &CommonSettings,
    order: &MtrOrder,
    is_b2b: bool,
    options: &MtrRunOptions,
    today: NaiveDate,
) -> anyhow::Result<OrderResult> {
    if let Some(existing) = store.invoice_for_order(&order.order_id).await? {
        return Ok(OrderResult::Existing(existing));
    }

    let party = resolve_party(store, settings, common, order, is_b2b).await?;

    let mut lines = Vec::with_capacity(order.rows.len());
    for row in &order.rows {
        lines.push(ResolvedLine {
            row,
            item: resolve_item(store, row).await?,
            warehouse: resolve_warehouse(store, settings, row).await?,
            tax_template: resolve_tax_template(store, row).await?,
        });
    }

    let date = posting_date(order, today)?;
    let mut invoice = build_invoice(settings, common, order, &party, &lines, date)?;
    if options.submit {
        invoice.submit();
    }

    match store.insert_invoice(&mut invoice, settings).await? {
        InsertOutcome::Inserted(name) => Ok(OrderResult::Inserted {
            name,
            lines: invoice.items.len(),
        }),
        InsertOutcome::Duplicate => Ok(OrderResult::Duplicate),
    }
}

async fn write_log(store: &dyn ErpStore, log: AmazonOrderLog) {
    let order_id = log.amazon_order_id.clone();
    if let Err(e) = store.insert_order_log(log).await {
        tracing::error!("Failed to write order log for {}: {:#}", order_id, e);
    }
}

/// Сверка сохранённого MTR-файла.
///
/// Без `file_id` берётся последний загруженный файл `GST_MTR_B2*`.
pub async fn process_mtr_file(
    db: &DatabaseConnection,
    request: &ProcessMtrRequest,
    report_job_id: Option<String>,
) -> anyhow::Result<MtrBatchReport> {
    let settings = a001_amazon_sp_settings::service::resolve(db, Some(&request.settings_code)).await?;

    let file = match request.file_id.as_deref().filter(|id| !id.is_empty()) {
        Some(id) => file_storage::get_file(db, id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("File {} not found", id))?,
        None => file_storage::latest_by_prefix(db, MTR_FILE_PREFIX)
            .await?
            .ok_or_else(|| anyhow::anyhow!("No {}* file to process", MTR_FILE_PREFIX))?,
    };

    let options = MtrRunOptions {
        submit: request.submit,
        report_job_id,
    };
    let store = DbErpStore::new(db.clone());
    let result = process_mtr_content(&store, &settings, file.content, &options)
        .await
        .with_context(|| format!("Failed to process MTR file '{}'", file.file_name));

    match result {
        Ok(mut report) => {
            report.file_name = Some(file.file_name);
            tracing::info!("MTR run finished: {}", report.summary());
            Ok(report)
        }
        Err(e) => {
            logger::log_error(db, &ProcessMtr::full_name(), &format!("{:#}", e)).await;
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{a004_amazon_order_log, a005_sales_invoice};
    use crate::usecases::fixtures::{seeded_db, SETTINGS_CODE};
    use contracts::domain::a004_amazon_order_log::aggregate::OrderLogStatus;

    const B2C_HEADER: &str = "Invoice Date,Transaction Type,Order Id,Shipment Item Id,Quantity,Asin,Hsn/sac,Sku,Ship To City,Ship To State,Ship To Country,Ship To Postal Code,Invoice Amount,Tax Exclusive Gross,Cgst Rate,Sgst Rate,Igst Rate,Cgst Tax,Sgst Tax,Igst Tax,Warehouse Id";

    fn two_row_b2c_csv() -> Vec<u8> {
        format!(
            "{}\n\
             2024-04-02 10:11:12,Shipment,408-1234567,S1,1,B0ASIN1,8471,SKU1,Pune,Maharashtra,IN,411001,105,100,0.025,0.025,,2.5,2.5,0,BOM7\n\
             2024-04-02 10:11:12,Shipment,408-1234567,S2,1,B0ASIN1,8471,SKU1,Pune,Maharashtra,IN,411001,105,100,0.025,0.025,,2.5,2.5,0,BOM7\n",
            B2C_HEADER
        )
        .into_bytes()
    }

    #[tokio::test]
    async fn test_two_rows_one_invoice_two_logs() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());

        let report = process_mtr_content(&store, &settings, two_row_b2c_csv(), &Default::default())
            .await
            .unwrap();
        assert_eq!(report.orders, 1);
        assert_eq!(report.counters.created, 1);

        let invoice = a005_sales_invoice::repository::get_by_amazon_order_id(&db, "408-1234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.base.code, "ACC-SINV-2024-00001");
        assert_eq!(invoice.customer, "Amazon B2C");
        assert_eq!(invoice.contact_person.as_deref(), Some("Buyer-408-1234567"));
        assert_eq!(invoice.shipping_address_name.as_deref(), Some("408-1234567 - Shipping"));
        assert_eq!(invoice.items.len(), 1);
        assert_eq!(invoice.items[0].item_code, "ITEM1");
        assert_eq!(invoice.items[0].qty, 2.0);
        assert_eq!(invoice.items[0].warehouse.as_deref(), Some("Amazon BOM7 - TC"));

        let logs = a004_amazon_order_log::service::list_for_order(&db, "408-1234567")
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
        assert!(logs.iter().all(|l| l.status == OrderLogStatus::Processed
            && l.sales_invoice.as_deref() == Some("ACC-SINV-2024-00001")));
    }

    #[tokio::test]
    async fn test_rerun_creates_nothing() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());
        let options = MtrRunOptions::default();

        process_mtr_content(&store, &settings, two_row_b2c_csv(), &options)
            .await
            .unwrap();
        let rerun = process_mtr_content(&store, &settings, two_row_b2c_csv(), &options)
            .await
            .unwrap();

        assert_eq!(rerun.counters.created, 0);
        assert_eq!(rerun.counters.skipped, 1);
        assert_eq!(
            a005_sales_invoice::service::list_recent(&db, 10).await.unwrap().len(),
            1
        );
        let logs = a004_amazon_order_log::service::list_for_order(&db, "408-1234567")
            .await
            .unwrap();
        assert_eq!(logs.len(), 2);
    }

    #[tokio::test]
    async fn test_b2b_templates_by_state() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());
        let csv = format!(
            "{},Customer Bill To Gstid,Buyer Name\n\
             2024-04-02,Shipment,408-0000001,S1,1,B0ASIN1,8471,SKU1,Pune,Maharashtra,IN,411001,105,100,0.05,0.05,,5,5,0,BOM7,27ABCDE1234F1Z5,Acme Traders\n\
             2024-04-02,Shipment,408-0000002,S2,1,B0ASIN2,8471,SKU2,Delhi,Delhi,IN,110001,105,100,,,0.05,0,0,5,BOM7,07ABCDE1234F1Z5,Delhi Retail\n",
            B2C_HEADER
        );

        let report = process_mtr_content(&store, &settings, csv.into_bytes(), &Default::default())
            .await
            .unwrap();
        assert_eq!(report.counters.created, 2);

        let in_state = a005_sales_invoice::repository::get_by_amazon_order_id(&db, "408-0000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(in_state.customer, "Acme Traders");
        assert_eq!(in_state.billing_gstin.as_deref(), Some("27ABCDE1234F1Z5"));
        assert_eq!(in_state.gst_category, "Registered Regular");
        assert_eq!(
            in_state.items[0].item_tax_template.as_deref(),
            Some("GST 5% In State")
        );

        let out_state = a005_sales_invoice::repository::get_by_amazon_order_id(&db, "408-0000002")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            out_state.items[0].item_tax_template.as_deref(),
            Some("GST 5% Out State")
        );
        assert_eq!(out_state.tax_category, "Out-State");
    }

    #[tokio::test]
    async fn test_missing_item_fails_only_that_order() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());
        let csv = format!(
            "{}\n\
             2024-04-02,Shipment,408-0000003,S1,1,B0NOPE,8471,SKU-UNKNOWN,Pune,Maharashtra,IN,411001,105,100,0.025,0.025,,2.5,2.5,0,BOM7\n\
             2024-04-02,Shipment,408-0000004,S2,1,B0ASIN2,8471,SKU2,Pune,Maharashtra,IN,411001,105,100,0.025,0.025,,2.5,2.5,0,BOM7\n",
            B2C_HEADER
        );

        let report = process_mtr_content(&store, &settings, csv.into_bytes(), &Default::default())
            .await
            .unwrap();
        assert_eq!(report.counters.failed, 1);
        assert_eq!(report.counters.created, 1);
        match &report.outcomes[0] {
            OrderOutcome::Failed { error, .. } => assert!(error.contains("SKU-UNKNOWN")),
            other => panic!("unexpected outcome {:?}", other),
        }

        let logs = a004_amazon_order_log::service::list_for_order(&db, "408-0000003")
            .await
            .unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, OrderLogStatus::Error);
        assert!(logs[0].raw_json.contains("SKU-UNKNOWN"));
    }

    #[tokio::test]
    async fn test_missing_tax_template_fails_order() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());
        let csv = format!(
            "{}\n2024-04-02,Shipment,408-0000005,S1,1,B0ASIN1,8471,SKU1,Pune,Maharashtra,IN,411001,128,100,0.14,0.14,,14,14,0,BOM7\n",
            B2C_HEADER
        );
        let report = process_mtr_content(&store, &settings, csv.into_bytes(), &Default::default())
            .await
            .unwrap();
        assert_eq!(report.counters.failed, 1);
    }

    #[tokio::test]
    async fn test_process_latest_file_and_bad_file() {
        let (db, _) = seeded_db().await;
        file_storage::save_file(&db, "GST_MTR_B2C_old.csv", b"garbage".to_vec(), None)
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        file_storage::save_file(&db, "GST_MTR_B2C_new.csv", two_row_b2c_csv(), None)
            .await
            .unwrap();

        let request = ProcessMtrRequest {
            settings_code: SETTINGS_CODE.into(),
            file_id: None,
            submit: true,
        };
        let report = process_mtr_file(&db, &request, None).await.unwrap();
        assert_eq!(report.file_name.as_deref(), Some("GST_MTR_B2C_new.csv"));
        assert_eq!(report.counters.created, 1);

        let invoice = a005_sales_invoice::repository::get_by_amazon_order_id(&db, "408-1234567")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.docstatus.as_i32(), 1);
    }

    #[tokio::test]
    async fn test_malformed_file_fails_run() {
        let (db, settings) = seeded_db().await;
        let store = DbErpStore::new(db.clone());
        let err = process_mtr_content(
            &store,
            &settings,
            b"Order Id,Sku\n408-1,SKU1\n".to_vec(),
            &Default::default(),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Transaction Type"));
    }
}
