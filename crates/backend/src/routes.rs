use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // ========================================
        // OAUTH (Seller Central consent)
        // ========================================
        .route("/authorize", get(handlers::oauth::authorize))
        .route("/oauth/redirect", get(handlers::oauth::redirect))
        // ========================================
        // SETTINGS
        // ========================================
        .route(
            "/api/amazon_sp_settings",
            get(handlers::a001_amazon_sp_settings::list_all)
                .post(handlers::a001_amazon_sp_settings::upsert),
        )
        .route(
            "/api/amazon_sp_settings/:code",
            get(handlers::a001_amazon_sp_settings::get_by_code)
                .delete(handlers::a001_amazon_sp_settings::delete),
        )
        .route(
            "/api/amazon_sp_settings/:code/test",
            post(handlers::a001_amazon_sp_settings::test_connection),
        )
        .route(
            "/api/amazon_sp_common_settings",
            get(handlers::a002_common_settings::get).post(handlers::a002_common_settings::save),
        )
        // ========================================
        // REPORTS AND MTR
        // ========================================
        .route(
            "/api/on_demand_report",
            get(handlers::a003_on_demand_report::list_recent)
                .post(handlers::a003_on_demand_report::create),
        )
        .route(
            "/api/on_demand_report/:id",
            get(handlers::a003_on_demand_report::get_by_id),
        )
        .route(
            "/api/on_demand_report/:id/process",
            post(handlers::a003_on_demand_report::process),
        )
        .route("/api/reports/fetch", post(handlers::reports::fetch))
        .route("/api/mtr/process", post(handlers::mtr::process))
        .route("/api/mtr/upload", post(handlers::mtr::upload))
        // ========================================
        // ORDERS
        // ========================================
        .route("/api/orders/fetch", post(handlers::orders::fetch))
        .route(
            "/api/orders/process_pending",
            post(handlers::orders::process_pending),
        )
        .route("/api/order_log", get(handlers::a004_amazon_order_log::list))
        .route(
            "/api/order_log/:id",
            get(handlers::a004_amazon_order_log::get_by_id),
        )
        .route(
            "/api/order_log/:id/process",
            post(handlers::a004_amazon_order_log::process),
        )
        .route(
            "/api/sales_invoice",
            get(handlers::a005_sales_invoice::list_recent),
        )
        .route(
            "/api/sales_invoice/:name",
            get(handlers::a005_sales_invoice::get_by_name),
        )
        // ========================================
        // MASTER DATA
        // ========================================
        .route(
            "/api/item",
            get(handlers::master_data::list_items).post(handlers::master_data::upsert_item),
        )
        .route(
            "/api/item/:id",
            delete(handlers::master_data::delete_item),
        )
        .route(
            "/api/warehouse",
            get(handlers::master_data::list_warehouses)
                .post(handlers::master_data::upsert_warehouse),
        )
        .route(
            "/api/warehouse/:id",
            delete(handlers::master_data::delete_warehouse),
        )
        .route(
            "/api/item_tax_template",
            get(handlers::master_data::list_tax_templates)
                .post(handlers::master_data::upsert_tax_template),
        )
        .route(
            "/api/item_tax_template/:id",
            delete(handlers::master_data::delete_tax_template),
        )
        // ========================================
        // SYSTEM
        // ========================================
        .route(
            "/api/logs",
            get(handlers::logs::list_all).delete(handlers::logs::clear_all),
        )
        .route(
            "/api/sys/scheduled_tasks",
            get(handlers::sys_scheduled_task::list_scheduled_tasks)
                .post(handlers::sys_scheduled_task::create_scheduled_task),
        )
        .route(
            "/api/sys/scheduled_tasks/:id",
            get(handlers::sys_scheduled_task::get_scheduled_task)
                .put(handlers::sys_scheduled_task::update_scheduled_task)
                .delete(handlers::sys_scheduled_task::delete_scheduled_task),
        )
        .route(
            "/api/sys/scheduled_tasks/:id/toggle_enabled",
            post(handlers::sys_scheduled_task::toggle_scheduled_task_enabled),
        )
        .route(
            "/api/sys/scheduled_tasks/:id/log/:session_id",
            get(handlers::sys_scheduled_task::get_task_log),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state;

    /// Поднять роутер на случайном порту
    async fn serve() -> String {
        let app = configure_routes(test_state().await);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_routes_are_wired() {
        let base = serve().await;
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap();

        let health = http.get(format!("{}/health", base)).send().await.unwrap();
        assert_eq!(health.text().await.unwrap(), "ok");

        let authorize = http.get(format!("{}/authorize", base)).send().await.unwrap();
        assert_eq!(authorize.status(), reqwest::StatusCode::FOUND);

        let settings: serde_json::Value = http
            .get(format!("{}/api/amazon_sp_settings", base))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(settings.as_array().map(Vec::len), Some(1));

        let pending = http
            .post(format!("{}/api/orders/process_pending", base))
            .json(&serde_json::json!({ "submit": false }))
            .send()
            .await
            .unwrap();
        assert!(pending.status().is_success());
    }
}
