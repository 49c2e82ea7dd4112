use axum::extract::State;
use axum::Json;
use contracts::usecases::u503_fetch_report::request::FetchReportRequest;
use contracts::usecases::u503_fetch_report::response::FetchReportResponse;

use super::{bad_request, ApiError};
use crate::domain::a001_amazon_sp_settings;
use crate::state::AppState;
use crate::usecases::u503_fetch_report;

/// POST /api/reports/fetch
///
/// Синхронно: создать отчёт, дождаться конечного статуса, скачать документ.
pub async fn fetch(
    State(state): State<AppState>,
    Json(request): Json<FetchReportRequest>,
) -> Result<Json<FetchReportResponse>, ApiError> {
    let settings =
        a001_amazon_sp_settings::service::resolve(&state.db, Some(&request.settings_code))
            .await
            .map_err(bad_request)?;
    let api = state.factory.reports(&settings).map_err(bad_request)?;

    let _guard = state.locks.lock(&settings.base.code).await;
    u503_fetch_report::fetch_report(&state.db, api.as_ref(), &request, &state.polling)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Report fetch for '{}' failed: {:#}", request.settings_code, e);
            bad_request(format!("{:#}", e))
        })
}
