use super::repository;
use contracts::domain::a004_amazon_order_log::aggregate::{AmazonOrderLog, OrderLogStatus};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub async fn create(db: &DatabaseConnection, mut log: AmazonOrderLog) -> anyhow::Result<Uuid> {
    log.validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    log.before_write();
    repository::insert(db, &log).await
}

pub async fn save(db: &DatabaseConnection, log: &mut AmazonOrderLog) -> anyhow::Result<()> {
    log.validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    log.before_write();
    repository::update(db, log).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<AmazonOrderLog>> {
    repository::get_by_id(db, id).await
}

pub async fn list_recent(
    db: &DatabaseConnection,
    status: Option<OrderLogStatus>,
    limit: u64,
) -> anyhow::Result<Vec<AmazonOrderLog>> {
    repository::list_recent(db, status, limit).await
}

pub async fn list_for_order(
    db: &DatabaseConnection,
    amazon_order_id: &str,
) -> anyhow::Result<Vec<AmazonOrderLog>> {
    repository::list_for_order(db, amazon_order_id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a004_amazon_order_log::aggregate::OrderLogSource;

    #[tokio::test]
    async fn test_pending_log_lifecycle() {
        let db = connect_in_memory().await;
        let id = create(&db, AmazonOrderLog::pending_order("408-1", "IN-MAIN", "{}".into()))
            .await
            .unwrap();
        assert!(repository::exists_for_order(&db, "408-1", OrderLogSource::OrdersApi)
            .await
            .unwrap());
        assert!(!repository::exists_for_order(&db, "408-1", OrderLogSource::MtrReport)
            .await
            .unwrap());
        assert_eq!(repository::list_pending(&db, Some("IN-MAIN")).await.unwrap().len(), 1);
        assert!(repository::list_pending(&db, Some("OTHER")).await.unwrap().is_empty());

        let mut log = get_by_id(&db, id).await.unwrap().unwrap();
        log.mark_processed("ACC-SINV-2024-00001");
        save(&db, &mut log).await.unwrap();
        assert!(repository::list_pending(&db, None).await.unwrap().is_empty());
        assert_eq!(
            list_recent(&db, Some(OrderLogStatus::Processed), 10).await.unwrap().len(),
            1
        );
    }
}
