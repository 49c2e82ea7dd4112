use super::repository;
use chrono::Utc;
use contracts::domain::a003_on_demand_report::aggregate::{OnDemandReport, OnDemandReportDto};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

/// Создать задание на отчёт (ещё не отправленное в Amazon)
pub async fn create(db: &DatabaseConnection, dto: OnDemandReportDto) -> anyhow::Result<OnDemandReport> {
    let mut aggregate = OnDemandReport::new_for_insert(
        dto.settings_code,
        dto.report_type,
        dto.start_time,
        dto.end_time,
    );
    aggregate.apply_window_defaults(Utc::now());

    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();

    repository::insert(db, &aggregate).await?;
    Ok(aggregate)
}

pub async fn save(db: &DatabaseConnection, aggregate: &mut OnDemandReport) -> anyhow::Result<()> {
    aggregate
        .validate()
        .map_err(|e| anyhow::anyhow!("Validation failed: {}", e))?;
    aggregate.before_write();
    repository::update(db, aggregate).await
}

pub async fn get_by_id(db: &DatabaseConnection, id: Uuid) -> anyhow::Result<Option<OnDemandReport>> {
    repository::get_by_id(db, id).await
}

pub async fn list_recent(db: &DatabaseConnection, limit: u64) -> anyhow::Result<Vec<OnDemandReport>> {
    repository::list_recent(db, limit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::data::db::connect_in_memory;
    use contracts::domain::a003_on_demand_report::aggregate::ProcessingStatus;

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let db = connect_in_memory().await;
        let mut job = create(
            &db,
            OnDemandReportDto {
                settings_code: "IN-MAIN".into(),
                report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
                start_time: None,
                end_time: None,
            },
        )
        .await
        .unwrap();
        assert!(job.start_time.is_some() && job.end_time.is_some());

        job.mark_submitted("rep-1".into(), Utc::now());
        save(&db, &mut job).await.unwrap();
        assert_eq!(repository::list_waiting(&db).await.unwrap().len(), 1);

        job.record_poll(ProcessingStatus::Done, Some("doc-1".into()), serde_json::json!({}), Utc::now());
        job.file_id = Some("file-1".into());
        save(&db, &mut job).await.unwrap();
        assert_eq!(repository::list_ready(&db).await.unwrap().len(), 1);

        let id = job.base.id.value();
        assert!(repository::claim_for_processing(&db, id).await.unwrap());
        assert!(!repository::claim_for_processing(&db, id).await.unwrap());
        assert!(repository::list_ready(&db).await.unwrap().is_empty());

        let stored = get_by_id(&db, id).await.unwrap().unwrap();
        assert_eq!(stored.status_log.len(), 1);
        assert_eq!(stored.report_document_id.as_deref(), Some("doc-1"));
    }
}
