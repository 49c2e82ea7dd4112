use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr,
    Statement,
};
use std::path::Path;

/// Открыть (или создать) файл SQLite и подготовить схему.
///
/// Соединение возвращается вызывающему и дальше передаётся явно через `AppState`.
pub async fn initialize_database(db_file: &Path) -> anyhow::Result<DatabaseConnection> {
    if let Some(parent) = db_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let absolute_path = if db_file.is_absolute() {
        db_file.to_path_buf()
    } else {
        std::env::current_dir()?.join(db_file)
    };
    // Normalize path separators and ensure proper URL form on Windows
    let normalized = absolute_path.to_string_lossy().replace('\\', "/");
    let needs_leading_slash = !normalized.starts_with('/') && normalized.contains(':');
    let prefix = if needs_leading_slash { "/" } else { "" };
    let db_url = format!("sqlite://{}{}?mode=rwc", prefix, normalized);

    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    let conn = Database::connect(options).await?;

    execute_sql(&conn, "PRAGMA journal_mode=WAL;").await?;
    bootstrap_schema(&conn).await?;

    tracing::info!("Database ready: {}", absolute_path.display());
    Ok(conn)
}

async fn execute_sql(conn: &DatabaseConnection, sql: &str) -> Result<(), DbErr> {
    conn.execute(Statement::from_string(DatabaseBackend::Sqlite, sql.to_string()))
        .await?;
    Ok(())
}

/// Ensure required tables exist (minimal schema bootstrap)
pub async fn bootstrap_schema(conn: &DatabaseConnection) -> anyhow::Result<()> {
    for ddl in SCHEMA {
        execute_sql(conn, ddl).await?;
    }
    Ok(())
}

/// Нарушение UNIQUE-ограничения по указанной колонке
pub fn is_unique_violation(err: &DbErr, column: &str) -> bool {
    let message = err.to_string();
    message.contains("UNIQUE constraint failed") && message.contains(column)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS a001_amazon_sp_settings (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        company TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0,
        is_enabled INTEGER NOT NULL DEFAULT 1,
        client_id TEXT NOT NULL,
        client_secret TEXT NOT NULL,
        refresh_token TEXT,
        application_id TEXT NOT NULL DEFAULT '',
        seller_central_url TEXT NOT NULL,
        oauth_path TEXT NOT NULL,
        oauth_redirect_uri TEXT NOT NULL,
        oauth_token_url TEXT,
        public_base_url TEXT,
        marketplace_id TEXT NOT NULL,
        sp_api_endpoint TEXT,
        report_types_json TEXT NOT NULL DEFAULT '[]',
        orders_created_after_days INTEGER NOT NULL DEFAULT 1,
        sales_invoice_series TEXT,
        debit_to TEXT,
        default_warehouse TEXT,
        customer_group TEXT NOT NULL DEFAULT '',
        territory TEXT NOT NULL DEFAULT '',
        customer_type TEXT NOT NULL DEFAULT '',
        item_lookup_field TEXT NOT NULL DEFAULT 'asin',
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a002_common_settings (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        b2c_customer TEXT NOT NULL DEFAULT '',
        in_state_tax_category TEXT NOT NULL,
        out_state_tax_category TEXT NOT NULL,
        cgst_account TEXT,
        sgst_account TEXT,
        igst_account TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a003_on_demand_report (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        settings_code TEXT NOT NULL,
        report_type TEXT NOT NULL,
        start_time TEXT,
        end_time TEXT,
        report_id TEXT,
        report_document_id TEXT,
        status TEXT NOT NULL DEFAULT 'NEW',
        submitted_at TEXT,
        last_polled_at TEXT,
        poll_attempts INTEGER NOT NULL DEFAULT 0,
        time_taken_secs INTEGER,
        file_id TEXT,
        is_processed INTEGER NOT NULL DEFAULT 0,
        processing_summary TEXT,
        error_message TEXT,
        status_log_json TEXT NOT NULL DEFAULT '[]',
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a003_status ON a003_on_demand_report (status, is_processed);",
    r#"
    CREATE TABLE IF NOT EXISTS a004_amazon_order_log (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        amazon_order_id TEXT NOT NULL,
        settings_code TEXT NOT NULL,
        source TEXT NOT NULL,
        line_ref TEXT,
        status TEXT NOT NULL,
        raw_json TEXT NOT NULL DEFAULT '{}',
        sales_invoice TEXT,
        error_message TEXT,
        report_job_id TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a004_order ON a004_amazon_order_log (amazon_order_id);",
    "CREATE INDEX IF NOT EXISTS idx_a004_status ON a004_amazon_order_log (status);",
    r#"
    CREATE TABLE IF NOT EXISTS a005_sales_invoice (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        naming_series TEXT NOT NULL,
        company TEXT NOT NULL,
        customer TEXT NOT NULL,
        contact_person TEXT,
        shipping_address_name TEXT,
        amazon_order_id TEXT NOT NULL UNIQUE,
        marketplace_id TEXT,
        settings_code TEXT NOT NULL,
        posting_date TEXT NOT NULL,
        due_date TEXT NOT NULL,
        tax_category TEXT NOT NULL DEFAULT '',
        gst_category TEXT NOT NULL DEFAULT '',
        billing_gstin TEXT,
        debit_to TEXT,
        docstatus INTEGER NOT NULL DEFAULT 0,
        items_json TEXT NOT NULL,
        taxes_json TEXT NOT NULL,
        net_total REAL NOT NULL DEFAULT 0,
        total_taxes REAL NOT NULL DEFAULT 0,
        grand_total REAL NOT NULL DEFAULT 0,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a006_customer (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        customer_group TEXT NOT NULL DEFAULT '',
        territory TEXT NOT NULL DEFAULT '',
        customer_type TEXT NOT NULL DEFAULT '',
        gstin TEXT,
        gst_category TEXT NOT NULL DEFAULT '',
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a007_contact (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        first_name TEXT NOT NULL,
        link_customer TEXT NOT NULL,
        email TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a008_address (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        address_title TEXT NOT NULL,
        address_type TEXT NOT NULL,
        address_line1 TEXT NOT NULL,
        city TEXT NOT NULL,
        state TEXT,
        pincode TEXT,
        country TEXT NOT NULL,
        link_customer TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a009_item (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        item_description TEXT NOT NULL DEFAULT '',
        asin TEXT,
        amazon_sku TEXT,
        stock_uom TEXT NOT NULL DEFAULT 'Nos',
        gst_hsn_code TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    "CREATE INDEX IF NOT EXISTS idx_a009_asin ON a009_item (asin);",
    "CREATE INDEX IF NOT EXISTS idx_a009_sku ON a009_item (amazon_sku);",
    r#"
    CREATE TABLE IF NOT EXISTS a010_warehouse (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        company TEXT NOT NULL,
        fba_fulfilment_center TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS a011_item_tax_template (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL UNIQUE,
        description TEXT NOT NULL DEFAULT '',
        comment TEXT,
        company TEXT,
        mtr_tax_column TEXT NOT NULL,
        mtr_tax_rate REAL NOT NULL,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT,
        version INTEGER NOT NULL DEFAULT 0
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS file_attachment (
        id TEXT PRIMARY KEY NOT NULL,
        file_name TEXT NOT NULL,
        is_private INTEGER NOT NULL DEFAULT 1,
        attached_to_doctype TEXT,
        attached_to_name TEXT,
        content BLOB NOT NULL,
        size INTEGER NOT NULL,
        created_at TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS system_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        source TEXT NOT NULL,
        category TEXT NOT NULL,
        message TEXT NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sys_tasks (
        id TEXT PRIMARY KEY NOT NULL,
        code TEXT NOT NULL,
        description TEXT,
        comment TEXT,
        task_type TEXT NOT NULL,
        schedule_cron TEXT,
        config_json TEXT,
        is_enabled INTEGER NOT NULL DEFAULT 1,
        last_run_at TEXT,
        next_run_at TEXT,
        last_run_status TEXT,
        last_run_log_file TEXT,
        is_deleted INTEGER NOT NULL DEFAULT 0,
        created_at TEXT,
        updated_at TEXT
    );
    "#,
];

/// Отдельная in-memory БД для тестов.
///
/// Пул ограничен одним соединением: у каждого соединения SQLite `:memory:`
/// своя база.
#[cfg(test)]
pub async fn connect_in_memory() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let conn = Database::connect(options)
        .await
        .expect("in-memory sqlite");
    bootstrap_schema(&conn).await.expect("schema bootstrap");
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_schema_bootstrap_is_idempotent() {
        let conn = connect_in_memory().await;
        bootstrap_schema(&conn).await.unwrap();
        let rows = conn
            .query_all(Statement::from_string(
                DatabaseBackend::Sqlite,
                "SELECT name FROM sqlite_master WHERE type='table' AND name LIKE 'a0%'".to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(rows.len(), 11);
    }

    #[tokio::test]
    async fn test_invoice_order_id_is_unique() {
        let conn = connect_in_memory().await;
        let insert = |code: &str| {
            format!(
                "INSERT INTO a005_sales_invoice (id, code, naming_series, company, customer, \
                 amazon_order_id, settings_code, posting_date, due_date, items_json, taxes_json) \
                 VALUES ('{code}', '{code}', 's', 'c', 'cu', '408-1', 'Default', '2024-01-01', \
                 '2024-01-01', '[]', '[]')"
            )
        };
        execute_sql(&conn, &insert("A")).await.unwrap();
        let err = execute_sql(&conn, &insert("B")).await.unwrap_err();
        assert!(is_unique_violation(&err, "amazon_order_id"));
    }
}
