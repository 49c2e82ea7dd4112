//! Справочники ERP, по которым сопоставляются строки MTR и заказы:
//! товары, склады, шаблоны налогов.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a009_item::aggregate::{Item, ItemDto};
use contracts::domain::a010_warehouse::aggregate::{Warehouse, WarehouseDto};
use contracts::domain::a011_item_tax_template::aggregate::{ItemTaxTemplate, ItemTaxTemplateDto};
use serde_json::json;

use super::{bad_request, parse_uuid, ApiError};
use crate::domain::{a009_item, a010_warehouse, a011_item_tax_template};
use crate::state::AppState;

fn saved(result: anyhow::Result<String>, what: &str) -> Result<Json<serde_json::Value>, ApiError> {
    match result {
        Ok(id) => Ok(Json(json!({ "id": id }))),
        Err(e) => {
            tracing::error!("Failed to save {}: {}", what, e);
            Err(bad_request(e))
        }
    }
}

fn deleted(result: anyhow::Result<bool>) -> Result<(), StatusCode> {
    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err(StatusCode::NOT_FOUND),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

// ============================================================================
// Item
// ============================================================================

/// GET /api/item
pub async fn list_items(State(state): State<AppState>) -> Result<Json<Vec<Item>>, StatusCode> {
    a009_item::service::list_all(&state.db)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /api/item
pub async fn upsert_item(
    State(state): State<AppState>,
    Json(dto): Json<ItemDto>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = match dto.id.clone() {
        Some(id) => a009_item::service::update(&state.db, dto).await.map(|_| id),
        None => a009_item::service::create(&state.db, dto)
            .await
            .map(|id| id.to_string()),
    };
    saved(result, "item")
}

/// DELETE /api/item/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = parse_uuid(&id)?;
    deleted(a009_item::service::delete(&state.db, uuid).await)
}

// ============================================================================
// Warehouse
// ============================================================================

/// GET /api/warehouse
pub async fn list_warehouses(
    State(state): State<AppState>,
) -> Result<Json<Vec<Warehouse>>, StatusCode> {
    a010_warehouse::service::list_all(&state.db)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /api/warehouse
pub async fn upsert_warehouse(
    State(state): State<AppState>,
    Json(dto): Json<WarehouseDto>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = match dto.id.clone() {
        Some(id) => a010_warehouse::service::update(&state.db, dto).await.map(|_| id),
        None => a010_warehouse::service::create(&state.db, dto)
            .await
            .map(|id| id.to_string()),
    };
    saved(result, "warehouse")
}

/// DELETE /api/warehouse/:id
pub async fn delete_warehouse(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = parse_uuid(&id)?;
    deleted(a010_warehouse::service::delete(&state.db, uuid).await)
}

// ============================================================================
// Item tax template
// ============================================================================

/// GET /api/item_tax_template
pub async fn list_tax_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemTaxTemplate>>, StatusCode> {
    a011_item_tax_template::service::list_all(&state.db)
        .await
        .map(Json)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// POST /api/item_tax_template
pub async fn upsert_tax_template(
    State(state): State<AppState>,
    Json(dto): Json<ItemTaxTemplateDto>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let result = match dto.id.clone() {
        Some(id) => a011_item_tax_template::service::update(&state.db, dto)
            .await
            .map(|_| id),
        None => a011_item_tax_template::service::create(&state.db, dto)
            .await
            .map(|id| id.to_string()),
    };
    saved(result, "item tax template")
}

/// DELETE /api/item_tax_template/:id
pub async fn delete_tax_template(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<(), StatusCode> {
    let uuid = parse_uuid(&id)?;
    deleted(a011_item_tax_template::service::delete(&state.db, uuid).await)
}
