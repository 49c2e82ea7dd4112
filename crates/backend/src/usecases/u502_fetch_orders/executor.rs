use std::collections::HashMap;

use chrono::{Duration, Utc};
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a004_amazon_order_log::aggregate::{AmazonOrderLog, OrderLogSource};
use contracts::usecases::common::{BatchCounters, OrderOutcome, UseCaseMetadata};
use contracts::usecases::u502_fetch_orders::FetchOrders;
use contracts::usecases::u502_fetch_orders::request::{FetchOrdersRequest, ProcessPendingRequest};
use contracts::usecases::u502_fetch_orders::response::{FetchOrdersResponse, ProcessPendingResponse};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::order_invoice::{create_invoice_from_log, lookup_value, LoggedOrder};
use super::pagination::{fetch_all_order_items, fetch_all_orders};
use crate::domain::{a001_amazon_sp_settings, a004_amazon_order_log};
use crate::shared::data::erp_store::{DbErpStore, ErpStore};
use crate::shared::format::to_amz_utc;
use crate::shared::logger;
use crate::shared::marketplaces::amazon::models::{OrderItem, OrdersQuery};
use crate::shared::marketplaces::amazon::OrdersApi;

/// Загрузить отгруженные FBA-заказы и записать их в журнал.
///
/// Заказ, уже записанный в журнал, пропускается. Заказ с позицией без
/// товара в справочнике записывается со статусом Error.
pub async fn fetch_and_log_orders(
    db: &DatabaseConnection,
    api: &dyn OrdersApi,
    request: &FetchOrdersRequest,
) -> anyhow::Result<FetchOrdersResponse> {
    let settings = a001_amazon_sp_settings::service::resolve(db, Some(&request.settings_code)).await?;
    let created_after = request
        .created_after
        .unwrap_or_else(|| Utc::now() - Duration::days(settings.orders_created_after_days));
    let query = OrdersQuery::shipped_fba(&settings.marketplace_id, to_amz_utc(created_after));

    let orders = fetch_all_orders(api, &query).await?;
    tracing::info!(
        "Fetched {} orders for '{}' created after {}",
        orders.len(),
        settings.base.code,
        query.created_after
    );

    let store = DbErpStore::new(db.clone());
    let mut response = FetchOrdersResponse {
        fetched: orders.len(),
        ..Default::default()
    };

    for order in orders {
        let order_id = order.amazon_order_id.clone();
        if a004_amazon_order_log::repository::exists_for_order(db, &order_id, OrderLogSource::OrdersApi)
            .await?
        {
            response.already_logged += 1;
            continue;
        }

        let items = fetch_all_order_items(api, &order_id).await?;
        let unmapped = unmapped_items(&store, &settings, &items).await?;
        let raw_json = serde_json::to_string(&LoggedOrder { order, items })?;

        let log = if unmapped.is_empty() {
            response.logged += 1;
            AmazonOrderLog::pending_order(&order_id, &settings.base.code, raw_json)
        } else {
            response.rejected += 1;
            let error = format!("No item mapping for {}", unmapped.join(", "));
            tracing::warn!("Order {}: {}", order_id, error);
            logger::log_error(db, &FetchOrders::full_name(), &format!("Order {}: {}", order_id, error))
                .await;
            AmazonOrderLog::rejected_order(&order_id, &settings.base.code, raw_json, error)
        };
        a004_amazon_order_log::service::create(db, log).await?;
    }

    tracing::info!(
        "Order log for '{}': {} new, {} rejected, {} already logged",
        settings.base.code,
        response.logged,
        response.rejected,
        response.already_logged
    );
    Ok(response)
}

/// Позиции заказа, для которых нет товара по полю поиска из настроек
async fn unmapped_items(
    store: &dyn ErpStore,
    settings: &AmazonSpSettings,
    items: &[OrderItem],
) -> anyhow::Result<Vec<String>> {
    let field = settings.item_lookup_field;
    let mut unmapped = Vec::new();
    for item in items {
        let found = match lookup_value(field, item) {
            Some(value) => store.find_item(field, value).await?.is_some(),
            None => false,
        };
        if !found {
            unmapped.push(format!(
                "{} {}",
                field.code(),
                lookup_value(field, item).unwrap_or(&item.order_item_id)
            ));
        }
    }
    Ok(unmapped)
}

/// Выставить счета по всем записям журнала, ожидающим счета
pub async fn process_pending_logs(
    db: &DatabaseConnection,
    request: &ProcessPendingRequest,
) -> anyhow::Result<ProcessPendingResponse> {
    let logs =
        a004_amazon_order_log::repository::list_pending(db, request.settings_code.as_deref()).await?;
    tracing::info!("Processing {} pending order logs", logs.len());

    let store = DbErpStore::new(db.clone());
    let mut settings_by_code: HashMap<String, AmazonSpSettings> = HashMap::new();
    let mut outcomes = Vec::with_capacity(logs.len());

    for mut log in logs {
        if !settings_by_code.contains_key(&log.settings_code) {
            match a001_amazon_sp_settings::service::resolve(db, Some(&log.settings_code)).await {
                Ok(settings) => {
                    settings_by_code.insert(log.settings_code.clone(), settings);
                }
                Err(e) => {
                    outcomes.push(OrderOutcome::Failed {
                        amazon_order_id: log.amazon_order_id.clone(),
                        error: format!("{:#}", e),
                    });
                    continue;
                }
            }
        }
        let Some(settings) = settings_by_code.get(&log.settings_code) else {
            continue;
        };

        let outcome = match create_invoice_from_log(&store, settings, &mut log, request.submit).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Order log {} could not be saved: {:#}", log.base.id.value(), e);
                OrderOutcome::Failed {
                    amazon_order_id: log.amazon_order_id.clone(),
                    error: format!("{:#}", e),
                }
            }
        };
        outcomes.push(outcome);
    }

    Ok(ProcessPendingResponse {
        counters: BatchCounters::from_outcomes(&outcomes),
        outcomes,
    })
}

/// Выставить счёт по одной записи журнала (повторная обработка)
pub async fn process_order_log(
    db: &DatabaseConnection,
    id: Uuid,
    submit: bool,
) -> anyhow::Result<OrderOutcome> {
    let mut log = a004_amazon_order_log::service::get_by_id(db, id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Order log {} not found", id))?;
    let settings = a001_amazon_sp_settings::service::resolve(db, Some(&log.settings_code)).await?;
    let store = DbErpStore::new(db.clone());
    create_invoice_from_log(&store, &settings, &mut log, submit).await
}
