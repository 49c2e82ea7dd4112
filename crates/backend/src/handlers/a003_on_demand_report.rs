use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a003_on_demand_report::aggregate::{OnDemandReport, OnDemandReportDto};
use contracts::usecases::u501_process_mtr::response::MtrBatchReport;
use serde::Deserialize;

use super::{bad_request, parse_uuid, ApiError, ListParams};
use crate::domain::{a001_amazon_sp_settings, a003_on_demand_report};
use crate::state::AppState;
use crate::usecases::u503_fetch_report;

/// GET /api/on_demand_report
pub async fn list_recent(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<OnDemandReport>>, StatusCode> {
    match a003_on_demand_report::service::list_recent(&state.db, params.limit_or(100)).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list report jobs: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/on_demand_report/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<OnDemandReport>, StatusCode> {
    let uuid = parse_uuid(&id)?;
    match a003_on_demand_report::service::get_by_id(&state.db, uuid).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/on_demand_report
///
/// Сохраняет задание и отправляет его в Amazon в фоне. Ответ содержит
/// задание в статусе NEW; дальнейшие статусы видны через GET.
pub async fn create(
    State(state): State<AppState>,
    Json(dto): Json<OnDemandReportDto>,
) -> Result<Json<OnDemandReport>, ApiError> {
    let settings = a001_amazon_sp_settings::service::resolve(&state.db, Some(&dto.settings_code))
        .await
        .map_err(bad_request)?;
    let api = state.factory.reports(&settings).map_err(bad_request)?;

    let job = a003_on_demand_report::service::create(&state.db, dto)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create report job: {}", e);
            bad_request(e)
        })?;

    let job_id = job.base.id.value();
    let db = state.db.clone();
    let locks = state.locks.clone();
    let policy = state.polling.clone();
    let max_age = state.report_job_max_age();
    tokio::spawn(async move {
        match u503_fetch_report::run_report_job(db, api, locks, job_id, policy, max_age).await {
            Ok(status) => tracing::info!("Report job {} finished with {}", job_id, status),
            Err(e) => tracing::error!("Report job {} failed: {:#}", job_id, e),
        }
    });

    Ok(Json(job))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessJobRequest {
    /// Проводить созданные счета
    #[serde(default)]
    pub submit: bool,
}

/// POST /api/on_demand_report/:id/process
pub async fn process(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<ProcessJobRequest>>,
) -> Result<Json<MtrBatchReport>, ApiError> {
    let uuid = parse_uuid(&id).map_err(|status| super::api_error(status, "Invalid ID"))?;
    let submit = body.map(|Json(b)| b.submit).unwrap_or_default();

    u503_fetch_report::process_report_job(&state.db, uuid, submit)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Processing of report job {} failed: {:#}", id, e);
            bad_request(format!("{:#}", e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use crate::usecases::fixtures::SETTINGS_CODE;

    #[tokio::test]
    async fn test_create_rejects_unknown_settings() {
        let state = test_state().await;
        let (status, _) = create(
            State(state.clone()),
            Json(OnDemandReportDto {
                settings_code: "NOPE".into(),
                report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
                start_time: None,
                end_time: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let Json(jobs) = list_recent(State(state), Query(ListParams { limit: None }))
            .await
            .unwrap();
        assert!(jobs.is_empty());
    }

    #[tokio::test]
    async fn test_process_job_without_file() {
        let state = test_state().await;
        let job = a003_on_demand_report::service::create(
            &state.db,
            OnDemandReportDto {
                settings_code: SETTINGS_CODE.into(),
                report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
                start_time: None,
                end_time: None,
            },
        )
        .await
        .unwrap();

        let (status, Json(body)) = process(
            State(state.clone()),
            Path(job.base.id.value().to_string()),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("no downloaded file"));

        assert_eq!(
            get_by_id(State(state), Path("not-a-uuid".into())).await.unwrap_err(),
            StatusCode::BAD_REQUEST
        );
    }
}
