use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a001_amazon_sp_settings::aggregate::{
    AmazonSpSettingsDto, AmazonSpSettingsView,
};
use serde_json::json;

use super::{bad_request, ApiError};
use crate::domain::a001_amazon_sp_settings;
use crate::shared::marketplaces::amazon::SpApiClient;
use crate::shared::marketplaces::TestConnectionResult;
use crate::state::AppState;

/// GET /api/amazon_sp_settings
pub async fn list_all(
    State(state): State<AppState>,
) -> Result<Json<Vec<AmazonSpSettingsView>>, StatusCode> {
    match a001_amazon_sp_settings::service::list_all(&state.db).await {
        Ok(v) => Ok(Json(v.into_iter().map(Into::into).collect())),
        Err(e) => {
            tracing::error!("Failed to list Amazon SP settings: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/amazon_sp_settings/:code
pub async fn get_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<AmazonSpSettingsView>, StatusCode> {
    match a001_amazon_sp_settings::repository::get_by_code(&state.db, &code).await {
        Ok(Some(v)) => Ok(Json(v.into())),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/amazon_sp_settings
///
/// С `id` обновляет существующие настройки, без него создаёт новые.
/// Пустой `client_secret` при обновлении оставляет сохранённый.
pub async fn upsert(
    State(state): State<AppState>,
    Json(dto): Json<AmazonSpSettingsDto>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = if dto.id.is_some() {
        let id = dto.id.clone().unwrap_or_default();
        a001_amazon_sp_settings::service::update(&state.db, dto)
            .await
            .map(|_| id)
    } else {
        a001_amazon_sp_settings::service::create(&state.db, dto)
            .await
            .map(|id| id.to_string())
    };

    match result {
        Ok(id) => Ok(Json(json!({ "id": id }))),
        Err(e) => {
            tracing::error!("Failed to save Amazon SP settings: {}", e);
            Err(bad_request(e))
        }
    }
}

/// DELETE /api/amazon_sp_settings/:code
pub async fn delete(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<(), StatusCode> {
    let settings = match a001_amazon_sp_settings::repository::get_by_code(&state.db, &code).await {
        Ok(Some(v)) => v,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };
    match a001_amazon_sp_settings::service::delete(&state.db, settings.base.id.0).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// POST /api/amazon_sp_settings/:code/test
pub async fn test_connection(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<TestConnectionResult>, StatusCode> {
    let settings = match a001_amazon_sp_settings::repository::get_by_code(&state.db, &code).await {
        Ok(Some(v)) => v,
        Ok(None) => return Err(StatusCode::NOT_FOUND),
        Err(_) => return Err(StatusCode::INTERNAL_SERVER_ERROR),
    };

    let result = match SpApiClient::from_settings(state.http.clone(), &state.config.sp_api, &settings)
    {
        Ok(client) => client.test_connection().await,
        Err(e) => TestConnectionResult {
            success: false,
            message: "Settings are not authorized".into(),
            details: Some(e.to_string()),
        },
    };
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;
    use crate::usecases::fixtures::SETTINGS_CODE;

    #[tokio::test]
    async fn test_list_hides_secrets() {
        let state = test_state().await;
        let Json(list) = list_all(State(state)).await.unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].is_authorized);
        assert_eq!(list[0].settings.client_secret, "****");
        assert_eq!(list[0].settings.refresh_token.as_deref(), Some("****"));
    }

    #[tokio::test]
    async fn test_upsert_and_delete_by_code() {
        let state = test_state().await;
        let dto = AmazonSpSettingsDto {
            code: Some("IN-SECOND".into()),
            description: "Second seller".into(),
            company: "Test Co".into(),
            is_enabled: true,
            client_id: "amzn1.application-oa2-client.y".into(),
            client_secret: Some("secret".into()),
            application_id: "amzn1.sp.solution.y".into(),
            marketplace_id: "A21TJRUUN4KGV".into(),
            ..Default::default()
        };
        upsert(State(state.clone()), Json(dto.clone())).await.unwrap();

        // Повторное создание с тем же кодом отклоняется
        let (status, _) = upsert(State(state.clone()), Json(dto)).await.unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let Json(view) = get_by_code(State(state.clone()), Path("IN-SECOND".into()))
            .await
            .unwrap();
        assert!(!view.is_authorized);

        delete(State(state.clone()), Path("IN-SECOND".into())).await.unwrap();
        assert_eq!(
            get_by_code(State(state.clone()), Path("IN-SECOND".into())).await.unwrap_err(),
            StatusCode::NOT_FOUND
        );
        assert!(get_by_code(State(state), Path(SETTINGS_CODE.into())).await.is_ok());
    }
}
