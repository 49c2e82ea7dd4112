use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a002_common_settings::aggregate::{CommonSettings, CommonSettingsDto};

use super::{bad_request, ApiError};
use crate::domain::a002_common_settings;
use crate::state::AppState;

/// GET /api/amazon_sp_common_settings
pub async fn get(State(state): State<AppState>) -> Result<Json<CommonSettings>, StatusCode> {
    match a002_common_settings::service::get(&state.db).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to load common settings: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// POST /api/amazon_sp_common_settings
pub async fn save(
    State(state): State<AppState>,
    Json(dto): Json<CommonSettingsDto>,
) -> Result<Json<CommonSettings>, ApiError> {
    a002_common_settings::service::save(&state.db, dto)
        .await
        .map(Json)
        .map_err(|e| {
            tracing::error!("Failed to save common settings: {}", e);
            bad_request(e)
        })
}
