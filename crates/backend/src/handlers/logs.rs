use axum::extract::{Query, State};
use axum::Json;
use contracts::shared::logger::LogEntry;

use super::ListParams;
use crate::shared::logger;
use crate::state::AppState;

/// GET /api/logs
pub async fn list_all(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<LogEntry>>, axum::http::StatusCode> {
    match logger::repository::get_all_logs(&state.db, params.limit_or(500)).await {
        Ok(logs) => Ok(Json(logs)),
        Err(_) => Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// DELETE /api/logs
pub async fn clear_all(State(state): State<AppState>) -> axum::http::StatusCode {
    match logger::repository::clear_all_logs(&state.db).await {
        Ok(_) => axum::http::StatusCode::OK,
        Err(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    #[tokio::test]
    async fn test_list_and_clear() {
        let state = test_state().await;
        logger::log_error(&state.db, "mtr", "Item not found for SKU9").await;

        let Json(logs) = list_all(State(state.clone()), Query(ListParams { limit: None }))
            .await
            .unwrap();
        assert!(logs.iter().any(|l| l.message == "Item not found for SKU9"));

        assert_eq!(clear_all(State(state.clone())).await, axum::http::StatusCode::OK);
        let Json(logs) = list_all(State(state), Query(ListParams { limit: None }))
            .await
            .unwrap();
        assert!(logs.is_empty());
    }
}
