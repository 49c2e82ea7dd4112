use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a005_sales_invoice::aggregate::SalesInvoice;

use super::ListParams;
use crate::domain::a005_sales_invoice;
use crate::state::AppState;

/// GET /api/sales_invoice
pub async fn list_recent(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<SalesInvoice>>, StatusCode> {
    match a005_sales_invoice::service::list_recent(&state.db, params.limit_or(100)).await {
        Ok(v) => Ok(Json(v)),
        Err(e) => {
            tracing::error!("Failed to list sales invoices: {}", e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// GET /api/sales_invoice/:name
pub async fn get_by_name(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SalesInvoice>, StatusCode> {
    match a005_sales_invoice::service::get_by_code(&state.db, &name).await {
        Ok(Some(v)) => Ok(Json(v)),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}
