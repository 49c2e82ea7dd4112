use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a004_amazon_order_log::aggregate::{AmazonOrderLog, OrderLogStatus};
use contracts::usecases::common::OrderOutcome;
use serde::Deserialize;

use super::{api_error, bad_request, parse_uuid, ApiError};
use crate::domain::a004_amazon_order_log;
use crate::state::AppState;
use crate::usecases::u502_fetch_orders;

#[derive(Debug, Default, Deserialize)]
pub struct OrderLogListParams {
    pub status: Option<String>,
    pub amazon_order_id: Option<String>,
    pub limit: Option<u64>,
}

/// GET /api/order_log
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<OrderLogListParams>,
) -> Result<Json<Vec<AmazonOrderLog>>, StatusCode> {
    let result = match params.amazon_order_id.as_deref().filter(|id| !id.is_empty()) {
        Some(order_id) => a004_amazon_order_log::service::list_for_order(&state.db, order_id).await,
        None => {
            let status = match params.status.as_deref().filter(|s| !s.is_empty()) {
                Some(s) => Some(OrderLogStatus::from_str_opt(s).ok_or(StatusCode::BAD_REQUEST)?),
                None => None,
            };
            let limit = params.limit.unwrap_or(200).clamp(1, 1000);
            a004_amazon_order_log::service::list_recent(&state.db, status, limit).await
        }
    };

    match result {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list order logs: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/order_log/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AmazonOrderLog>, StatusCode> {
    let uuid = parse_uuid(&id)?;
    match a004_amazon_order_log::service::get_by_id(&state.db, uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessLogRequest {
    #[serde(default)]
    pub submit: bool,
}

/// POST /api/order_log/:id/process
///
/// Выставляет счёт по сохранённым данным записи. Записи со счётом
/// или в статусе Error не обрабатываются.
pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ProcessLogRequest>>,
) -> Result<Json<OrderOutcome>, ApiError> {
    let uuid = parse_uuid(&id).map_err(|status| api_error(status, "Invalid ID"))?;
    let log = a004_amazon_order_log::service::get_by_id(&state.db, uuid)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Order log not found"))?;

    if let Some(invoice) = &log.sales_invoice {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("Order {} is already invoiced as {}", log.amazon_order_id, invoice),
        ));
    }
    if log.status == OrderLogStatus::Error {
        return Err(api_error(
            StatusCode::CONFLICT,
            format!("Order log for {} is in Error status", log.amazon_order_id),
        ));
    }

    let submit = body.map(|Json(b)| b.submit).unwrap_or_default();
    let _guard = state.locks.lock(&log.settings_code).await;
    u502_fetch_orders::process_order_log(&state.db, uuid, submit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Reprocessing order log {} failed: {:#}", id, e);
            bad_request(format!("{:#}", e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    #[tokio::test]
    async fn test_list_rejects_unknown_status() {
        let state = test_state().await;
        let params = OrderLogListParams {
            status: Some("Bogus".into()),
            ..Default::default()
        };
        assert_eq!(
            list(State(state.clone()), Query(params)).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );

        let params = OrderLogListParams {
            status: Some("Pending".into()),
            ..Default::default()
        };
        let Json(logs) = list(State(state), Query(params)).await.unwrap();
        assert!(logs.is_empty());
    }

    #[tokio::test]
    async fn test_process_unknown_log() {
        let state = test_state().await;
        let (status, _) = process(
            State(state),
            Path(uuid::Uuid::new_v4().to_string()),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
