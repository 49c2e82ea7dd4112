use axum::extract::State;
use axum::Json;
use contracts::usecases::u502_fetch_orders::request::{FetchOrdersRequest, ProcessPendingRequest};
use contracts::usecases::u502_fetch_orders::response::{FetchOrdersResponse, ProcessPendingResponse};

use super::{bad_request, ApiError};
use crate::domain::a001_amazon_sp_settings;
use crate::state::AppState;
use crate::usecases::u502_fetch_orders;

/// POST /api/orders/fetch
pub async fn fetch(
    State(state): State<AppState>,
    Json(request): Json<FetchOrdersRequest>,
) -> Result<Json<FetchOrdersResponse>, ApiError> {
    let settings =
        a001_amazon_sp_settings::service::resolve(&state.db, Some(&request.settings_code))
            .await
            .map_err(bad_request)?;
    let api = state.factory.orders(&settings).map_err(bad_request)?;

    let _guard = state.locks.lock(&settings.base.code).await;
    u502_fetch_orders::fetch_and_log_orders(&state.db, api.as_ref(), &request)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Order fetch for '{}' failed: {:#}", request.settings_code, e);
            bad_request(format!("{:#}", e))
        })
}

/// POST /api/orders/process_pending
pub async fn process_pending(
    State(state): State<AppState>,
    Json(request): Json<ProcessPendingRequest>,
) -> Result<Json<ProcessPendingResponse>, ApiError> {
    u502_fetch_orders::process_pending_logs(&state.db, &request)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Processing of pending order logs failed: {:#}", e);
            bad_request(format!("{:#}", e))
        })
}
