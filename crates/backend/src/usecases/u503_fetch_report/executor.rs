use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use contracts::domain::a001_amazon_sp_settings::aggregate::AmazonSpSettings;
use contracts::domain::a003_on_demand_report::aggregate::{
    OnDemandReport, OnDemandReportDto, ProcessingStatus,
};
use contracts::usecases::u501_process_mtr::request::ProcessMtrRequest;
use contracts::usecases::u501_process_mtr::response::MtrBatchReport;
use contracts::usecases::common::UseCaseMetadata;
use contracts::usecases::u503_fetch_report::request::FetchReportRequest;
use contracts::usecases::u503_fetch_report::response::{FetchReportResponse, FetchReportStatus};
use contracts::usecases::u503_fetch_report::FetchReport;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::poller::{poll_report, PollOutcome, PollPolicy};
use crate::domain::{a001_amazon_sp_settings, a003_on_demand_report};
use crate::shared::data::file_storage::{self, Attachment};
use crate::shared::format::to_amz_utc;
use crate::shared::logger;
use crate::shared::marketplaces::amazon::models::CreateReportSpecification;
use crate::shared::marketplaces::amazon::{ReportsApi, SpApiFactory};
use crate::system::tenant_locks::TenantLocks;
use crate::usecases::u501_process_mtr::process_mtr_file;

fn log_source() -> String {
    FetchReport::full_name()
}

/// Тип документа, к которому прикладываются скачанные отчёты
pub const REPORT_JOB_DOCTYPE: &str = "a003_on_demand_report";

/// Итог прохода по заданиям
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl JobRunSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

fn report_spec(
    settings: &AmazonSpSettings,
    report_type: &str,
    start: Option<chrono::DateTime<Utc>>,
    end: Option<chrono::DateTime<Utc>>,
) -> CreateReportSpecification {
    CreateReportSpecification {
        report_type: report_type.to_string(),
        marketplace_ids: vec![settings.marketplace_id.clone()],
        data_start_time: start.map(to_amz_utc),
        data_end_time: end.map(to_amz_utc),
    }
}

// ============================================================================
// Synchronous fetch
// ============================================================================

/// Запросить отчёт, дождаться его и сохранить документ файлом.
///
/// FATAL/CANCELLED и истечение времени не являются ошибками вызова:
/// статус и ответ Amazon возвращаются в `FetchReportResponse`.
pub async fn fetch_report(
    db: &DatabaseConnection,
    api: &dyn ReportsApi,
    request: &FetchReportRequest,
    policy: &PollPolicy,
) -> anyhow::Result<FetchReportResponse> {
    let settings = a001_amazon_sp_settings::service::resolve(db, Some(&request.settings_code)).await?;
    let requested_at = Utc::now();
    // Окно по умолчанию: последний час
    let start = request
        .start_time
        .unwrap_or(requested_at - ChronoDuration::hours(1));
    let end = request.end_time.unwrap_or(requested_at);
    let spec = report_spec(&settings, &request.report_type, Some(start), Some(end));

    let report_id = api.create_report(&spec).await?;
    let outcome = poll_report(api, &report_id, policy).await?;
    let attempts = outcome.attempts();

    match outcome {
        PollOutcome::Done { report, .. } => {
            let document_id = report
                .report_document_id
                .clone()
                .ok_or_else(|| anyhow::anyhow!("Report {} is DONE without a document", report_id))?;
            let content = api.download_report_document(&document_id).await?;
            let size = content.len();
            let file_name = format!(
                "{}_response_{}.csv",
                request.report_type,
                requested_at.format("%Y-%m-%dT%H%M%S")
            );
            let file_id = file_storage::save_file(db, &file_name, content, None).await?;

            Ok(FetchReportResponse {
                status: FetchReportStatus::Done,
                report_id,
                processing_status: report.processing_status,
                file_id: Some(file_id),
                file_name: Some(file_name),
                size: Some(size),
                poll_attempts: attempts,
                payload: None,
            })
        }
        PollOutcome::Failed { report, .. } => {
            let payload = serde_json::to_value(&report)?;
            logger::log_error(
                db,
                &log_source(),
                &format!(
                    "Report {} finished with {}: {}",
                    report_id, report.processing_status, payload
                ),
            )
            .await;
            Ok(FetchReportResponse {
                status: FetchReportStatus::Failed,
                report_id,
                processing_status: report.processing_status,
                file_id: None,
                file_name: None,
                size: None,
                poll_attempts: attempts,
                payload: Some(payload),
            })
        }
        PollOutcome::TimedOut { last, .. } => {
            let processing_status = last
                .map(|r| r.processing_status)
                .unwrap_or_else(|| ProcessingStatus::InQueue.as_str().to_string());
            logger::log_error(
                db,
                &log_source(),
                &format!(
                    "Report {} not ready after {} polls (last status {})",
                    report_id, attempts, processing_status
                ),
            )
            .await;
            Ok(FetchReportResponse {
                status: FetchReportStatus::TimedOut,
                report_id,
                processing_status,
                file_id: None,
                file_name: None,
                size: None,
                poll_attempts: attempts,
                payload: None,
            })
        }
    }
}

// ============================================================================
// Report jobs
// ============================================================================

/// Отправить задание в Amazon
pub async fn submit_report_job(
    db: &DatabaseConnection,
    api: &dyn ReportsApi,
    job: &mut OnDemandReport,
) -> anyhow::Result<()> {
    let settings = a001_amazon_sp_settings::service::resolve(db, Some(&job.settings_code)).await?;
    let spec = report_spec(&settings, &job.report_type, job.start_time, job.end_time);

    match api.create_report(&spec).await {
        Ok(report_id) => {
            tracing::info!("Report job {} submitted as {}", job.base.code, report_id);
            job.mark_submitted(report_id, Utc::now());
            a003_on_demand_report::service::save(db, job).await
        }
        Err(e) => {
            let message = format!("createReport failed: {}", e);
            job.mark_failed(ProcessingStatus::Fatal, message.clone());
            a003_on_demand_report::service::save(db, job).await?;
            logger::log_error(db, &log_source(), &format!("{}: {}", job.base.code, message)).await;
            Err(e.into())
        }
    }
}

/// Один опрос задания.
///
/// На DONE документ скачивается и прикладывается к заданию. Если скачать не
/// удалось, задание остаётся в ожидании и документ запрашивается при
/// следующем опросе.
pub async fn poll_report_job(
    db: &DatabaseConnection,
    api: &dyn ReportsApi,
    job: &mut OnDemandReport,
    max_age: ChronoDuration,
) -> anyhow::Result<ProcessingStatus> {
    let Some(report_id) = job.report_id.clone().filter(|_| job.needs_polling()) else {
        return Ok(job.status);
    };

    let now = Utc::now();
    if job.is_overdue(now, max_age) {
        let message = format!(
            "Report {} not ready after {} minutes",
            report_id,
            max_age.num_minutes()
        );
        job.mark_failed(ProcessingStatus::TimedOut, message.clone());
        a003_on_demand_report::service::save(db, job).await?;
        logger::log_error(db, &log_source(), &format!("{}: {}", job.base.code, message)).await;
        return Ok(job.status);
    }

    let report = api.get_report(&report_id).await?;
    let status = match ProcessingStatus::from_remote(&report.processing_status) {
        Some(status) => status,
        None => {
            tracing::warn!(
                "Unknown processing status '{}' for report {}",
                report.processing_status,
                report_id
            );
            job.status
        }
    };
    let payload = serde_json::to_value(&report)?;
    job.record_poll(status, report.report_document_id.clone(), payload.clone(), now);

    match status {
        ProcessingStatus::Done => {
            if let Err(e) = attach_document(db, api, job).await {
                job.status = ProcessingStatus::InProgress;
                job.error_message = Some(format!("{:#}", e));
                a003_on_demand_report::service::save(db, job).await?;
                logger::log_error(
                    db,
                    &log_source(),
                    &format!("{}: document download failed: {:#}", job.base.code, e),
                )
                .await;
                return Err(e);
            }
            job.error_message = None;
        }
        ProcessingStatus::Fatal | ProcessingStatus::Cancelled => {
            let message = format!("Amazon returned {}: {}", status, payload);
            job.mark_failed(status, message.clone());
            logger::log_error(db, &log_source(), &format!("{}: {}", job.base.code, message)).await;
        }
        _ => {}
    }

    a003_on_demand_report::service::save(db, job).await?;
    Ok(job.status)
}

async fn attach_document(
    db: &DatabaseConnection,
    api: &dyn ReportsApi,
    job: &mut OnDemandReport,
) -> anyhow::Result<()> {
    if job.file_id.is_some() {
        return Ok(());
    }
    let document_id = job
        .report_document_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Report is DONE without a document id"))?;
    let content = api.download_report_document(&document_id).await?;

    let job_id = job.base.id.value().to_string();
    let file_id = file_storage::save_file(
        db,
        &job.document_file_name(),
        content,
        Some(Attachment {
            doctype: REPORT_JOB_DOCTYPE,
            name: &job_id,
        }),
    )
    .await?;
    job.file_id = Some(file_id);
    Ok(())
}

/// Фоновое выполнение задания: отправка и опрос до конечного статуса.
///
/// Каждый шаг выполняется под блокировкой продавца.
pub async fn run_report_job(
    db: DatabaseConnection,
    api: Arc<dyn ReportsApi>,
    locks: Arc<TenantLocks>,
    job_id: Uuid,
    policy: PollPolicy,
    max_age: ChronoDuration,
) -> anyhow::Result<ProcessingStatus> {
    let mut job = a003_on_demand_report::service::get_by_id(&db, job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Report job {} not found", job_id))?;

    if job.report_id.is_none() {
        let _guard = locks.lock(&job.settings_code).await;
        submit_report_job(&db, api.as_ref(), &mut job).await?;
    }

    for attempt in 1..=policy.max_attempts {
        if !job.needs_polling() {
            break;
        }
        tokio::time::sleep(policy.delay_for(attempt)).await;
        let _guard = locks.lock(&job.settings_code).await;
        poll_report_job(&db, api.as_ref(), &mut job, max_age).await?;
    }

    if job.needs_polling() {
        tracing::warn!(
            "Report job {} still {} after {} polls, leaving it to the scheduler",
            job.base.code,
            job.status,
            policy.max_attempts
        );
    }
    Ok(job.status)
}

/// Создать и отправить задания по включённым продавцам и их типам отчётов.
///
/// `only` ограничивает проход одними настройками.
pub async fn create_reports_scheduled(
    db: &DatabaseConnection,
    factory: &dyn SpApiFactory,
    only: Option<&str>,
) -> anyhow::Result<JobRunSummary> {
    let mut summary = JobRunSummary::default();

    let enabled = a001_amazon_sp_settings::repository::list_enabled(db).await?;
    for settings in enabled
        .into_iter()
        .filter(|s| only.map_or(true, |code| s.base.code == code))
    {
        let api = match factory.reports(&settings) {
            Ok(api) => api,
            Err(e) => {
                logger::log_error(
                    db,
                    &log_source(),
                    &format!("No SP-API client for '{}': {}", settings.base.code, e),
                )
                .await;
                summary.failed += 1;
                continue;
            }
        };

        for report_type in settings.effective_report_types() {
            let mut job = a003_on_demand_report::service::create(
                db,
                OnDemandReportDto {
                    settings_code: settings.base.code.clone(),
                    report_type,
                    start_time: None,
                    end_time: None,
                },
            )
            .await?;
            match submit_report_job(db, api.as_ref(), &mut job).await {
                Ok(()) => summary.succeeded += 1,
                Err(_) => summary.failed += 1,
            }
        }
    }

    Ok(summary)
}

/// Опросить все ожидающие задания, группируя их по продавцу
pub async fn poll_reports_scheduled(
    db: &DatabaseConnection,
    factory: &dyn SpApiFactory,
    locks: &TenantLocks,
    max_age: ChronoDuration,
) -> anyhow::Result<JobRunSummary> {
    let mut by_tenant: BTreeMap<String, Vec<OnDemandReport>> = BTreeMap::new();
    for job in a003_on_demand_report::repository::list_waiting(db).await? {
        by_tenant.entry(job.settings_code.clone()).or_default().push(job);
    }

    let mut summary = JobRunSummary::default();
    for (tenant, jobs) in by_tenant {
        let _guard = locks.lock(&tenant).await;

        let api = match a001_amazon_sp_settings::service::resolve(db, Some(&tenant))
            .await
            .and_then(|settings| factory.reports(&settings).map_err(Into::into))
        {
            Ok(api) => api,
            Err(e) => {
                logger::log_error(
                    db,
                    &log_source(),
                    &format!("Cannot poll reports for '{}': {:#}", tenant, e),
                )
                .await;
                summary.failed += jobs.len();
                continue;
            }
        };

        for mut job in jobs {
            match poll_report_job(db, api.as_ref(), &mut job, max_age).await {
                Ok(status) => {
                    tracing::debug!("Report job {} is {}", job.base.code, status);
                    summary.succeeded += 1;
                }
                Err(e) => {
                    tracing::error!("Polling report job {} failed: {:#}", job.base.code, e);
                    summary.failed += 1;
                }
            }
        }
    }

    Ok(summary)
}

async fn reconcile_job(
    db: &DatabaseConnection,
    job: &OnDemandReport,
    submit: bool,
) -> anyhow::Result<MtrBatchReport> {
    let job_id = job.base.id.value();
    let request = ProcessMtrRequest {
        settings_code: job.settings_code.clone(),
        file_id: job.file_id.clone(),
        submit,
    };
    let result = process_mtr_file(db, &request, Some(job_id.to_string())).await;

    let (summary, error) = match &result {
        Ok(report) => (Some(report.summary()), None),
        Err(e) => (None, Some(format!("{:#}", e))),
    };
    a003_on_demand_report::repository::set_processing_result(db, job_id, summary, error).await?;
    result
}

/// Сверить файлы готовых заданий. Каждое задание обрабатывается один раз:
/// флаг обработки ставится до сверки и не снимается при ошибке.
pub async fn process_done_reports(db: &DatabaseConnection) -> anyhow::Result<JobRunSummary> {
    let mut summary = JobRunSummary::default();

    for job in a003_on_demand_report::repository::list_ready(db).await? {
        if !a003_on_demand_report::repository::claim_for_processing(db, job.base.id.value()).await? {
            tracing::debug!("Report job {} already claimed", job.base.code);
            continue;
        }
        match reconcile_job(db, &job, false).await {
            Ok(report) => {
                tracing::info!("Report job {}: {}", job.base.code, report.summary());
                summary.succeeded += 1;
            }
            Err(e) => {
                tracing::error!("Report job {} reconciliation failed: {:#}", job.base.code, e);
                summary.failed += 1;
            }
        }
    }

    Ok(summary)
}

/// Ручная сверка файла задания
pub async fn process_report_job(
    db: &DatabaseConnection,
    job_id: Uuid,
    submit: bool,
) -> anyhow::Result<MtrBatchReport> {
    let job = a003_on_demand_report::service::get_by_id(db, job_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("Report job {} not found", job_id))?;
    if job.file_id.is_none() {
        anyhow::bail!("Report job {} has no downloaded file", job.base.code);
    }

    a003_on_demand_report::repository::claim_for_processing(db, job_id).await?;
    reconcile_job(db, &job, submit).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::a005_sales_invoice;
    use contracts::domain::a005_sales_invoice::aggregate::DocStatus;
    use crate::shared::logger::repository::get_all_logs;
    use crate::shared::format::parse_amz_datetime;
    use crate::shared::marketplaces::amazon::{OrdersApi, SpApiError};
    use crate::usecases::fixtures::{seeded_db, SETTINGS_CODE};
    use crate::usecases::u503_fetch_report::poller::tests::{fast_policy, FakeReportsApi};
    use std::sync::Mutex;

    const MTR_DOCUMENT: &str = "Invoice Date,Transaction Type,Order Id,Shipment Item Id,Quantity,Asin,Hsn/sac,Sku,Ship To City,Ship To State,Ship To Country,Ship To Postal Code,Invoice Amount,Tax Exclusive Gross,Cgst Rate,Sgst Rate,Igst Rate,Cgst Tax,Sgst Tax,Igst Tax,Warehouse Id\n\
        2024-04-02 10:11:12,Shipment,408-7000001,S1,1,B0ASIN1,8471,SKU1,Pune,Maharashtra,IN,411001,105,100,0.025,0.025,,2.5,2.5,0,BOM7\n";

    fn max_age() -> ChronoDuration {
        ChronoDuration::minutes(240)
    }

    async fn new_job(db: &DatabaseConnection) -> OnDemandReport {
        a003_on_demand_report::service::create(
            db,
            OnDemandReportDto {
                settings_code: SETTINGS_CODE.into(),
                report_type: "GET_GST_MTR_B2C_CUSTOM".into(),
                start_time: None,
                end_time: None,
            },
        )
        .await
        .unwrap()
    }

    struct FakeFactory {
        reports: Arc<FakeReportsApi>,
        requested: Mutex<Vec<String>>,
    }

    impl SpApiFactory for FakeFactory {
        fn reports(&self, settings: &AmazonSpSettings) -> Result<Arc<dyn ReportsApi>, SpApiError> {
            self.requested.lock().unwrap().push(settings.base.code.clone());
            let api: Arc<dyn ReportsApi> = self.reports.clone();
            Ok(api)
        }

        fn orders(&self, settings: &AmazonSpSettings) -> Result<Arc<dyn OrdersApi>, SpApiError> {
            Err(SpApiError::NotAuthorized(settings.base.code.clone()))
        }
    }

    #[tokio::test]
    async fn test_fetch_report_downloads_once() {
        let (db, _) = seeded_db().await;
        let api = FakeReportsApi::new(&["IN_QUEUE", "IN_PROGRESS", "DONE"], b"a,b\n1,2\n");
        let request = FetchReportRequest {
            settings_code: SETTINGS_CODE.into(),
            report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
            start_time: None,
            end_time: None,
        };

        let response = fetch_report(&db, &api, &request, &fast_policy(10)).await.unwrap();
        assert_eq!(response.status, FetchReportStatus::Done);
        assert_eq!(response.poll_attempts, 3);
        assert_eq!(response.size, Some(8));
        assert_eq!(api.downloads(), 1);
        let spec = api.created.lock().unwrap()[0].clone();
        assert_eq!(spec.marketplace_ids, vec!["A21TJRUUN4KGV"]);
        let start = spec.data_start_time.as_deref().and_then(parse_amz_datetime).unwrap();
        let end = spec.data_end_time.as_deref().and_then(parse_amz_datetime).unwrap();
        assert_eq!(end - start, ChronoDuration::hours(1));

        let file = file_storage::get_file(&db, response.file_id.as_deref().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert!(file.file_name.starts_with("GET_GST_MTR_B2B_CUSTOM_response_"));
        assert!(file.attached_to_doctype.is_none());
    }

    #[tokio::test]
    async fn test_fetch_report_fatal_surfaces_payload() {
        let (db, _) = seeded_db().await;
        let api = FakeReportsApi::new(&["IN_QUEUE", "FATAL"], b"");
        let request = FetchReportRequest {
            settings_code: SETTINGS_CODE.into(),
            report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
            start_time: None,
            end_time: None,
        };

        let response = fetch_report(&db, &api, &request, &fast_policy(10)).await.unwrap();
        assert_eq!(response.status, FetchReportStatus::Failed);
        assert_eq!(response.processing_status, "FATAL");
        assert!(response.payload.is_some());
        assert!(response.file_id.is_none());
        assert_eq!(api.downloads(), 0);

        let logs = get_all_logs(&db, 10).await.unwrap();
        assert!(logs.iter().any(|l| l.source == log_source() && l.message.contains("FATAL")));
    }

    #[tokio::test]
    async fn test_job_polls_until_done_then_reconciles_once() {
        let (db, _) = seeded_db().await;
        let api = FakeReportsApi::new(&["IN_QUEUE", "IN_PROGRESS", "DONE"], MTR_DOCUMENT.as_bytes());
        let mut job = new_job(&db).await;

        submit_report_job(&db, &api, &mut job).await.unwrap();
        assert_eq!(job.status, ProcessingStatus::InQueue);
        assert_eq!(job.report_id.as_deref(), Some("REPORT-1"));

        assert_eq!(poll_report_job(&db, &api, &mut job, max_age()).await.unwrap(), ProcessingStatus::InQueue);
        assert_eq!(poll_report_job(&db, &api, &mut job, max_age()).await.unwrap(), ProcessingStatus::InProgress);
        assert_eq!(poll_report_job(&db, &api, &mut job, max_age()).await.unwrap(), ProcessingStatus::Done);
        // Готовое задание больше не опрашивается
        assert_eq!(poll_report_job(&db, &api, &mut job, max_age()).await.unwrap(), ProcessingStatus::Done);
        assert_eq!(api.downloads(), 1);
        assert_eq!(*api.get_calls.lock().unwrap(), 3);

        let stored = a003_on_demand_report::service::get_by_id(&db, job.base.id.value())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.poll_attempts, 3);
        assert_eq!(stored.status_log.len(), 3);
        let job_id = job.base.id.value().to_string();
        let file = file_storage::first_attached_to(
            &db,
            Attachment {
                doctype: REPORT_JOB_DOCTYPE,
                name: &job_id,
            },
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(file.file_name, stored.document_file_name());

        let first = process_done_reports(&db).await.unwrap();
        assert_eq!(first, JobRunSummary { succeeded: 1, failed: 0 });
        let invoice = a005_sales_invoice::repository::get_by_amazon_order_id(&db, "408-7000001")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(invoice.docstatus, DocStatus::Draft);

        let second = process_done_reports(&db).await.unwrap();
        assert_eq!(second.total(), 0);

        let processed = a003_on_demand_report::service::get_by_id(&db, job.base.id.value())
            .await
            .unwrap()
            .unwrap();
        assert!(processed.is_processed);
        assert!(processed.processing_summary.unwrap().contains("1 created"));
    }

    #[tokio::test]
    async fn test_cancelled_job_is_not_downloaded() {
        let (db, _) = seeded_db().await;
        let api = FakeReportsApi::new(&["CANCELLED"], b"");
        let mut job = new_job(&db).await;
        submit_report_job(&db, &api, &mut job).await.unwrap();

        let status = poll_report_job(&db, &api, &mut job, max_age()).await.unwrap();
        assert_eq!(status, ProcessingStatus::Cancelled);
        assert!(job.error_message.unwrap().contains("CANCELLED"));
        assert_eq!(api.downloads(), 0);
        assert!(process_done_reports(&db).await.unwrap().total() == 0);
    }

    #[tokio::test]
    async fn test_overdue_job_times_out_without_polling() {
        let (db, _) = seeded_db().await;
        let api = FakeReportsApi::new(&["IN_PROGRESS"], b"");
        let mut job = new_job(&db).await;
        job.mark_submitted("REPORT-OLD".into(), Utc::now() - ChronoDuration::hours(5));
        a003_on_demand_report::service::save(&db, &mut job).await.unwrap();

        let status = poll_report_job(&db, &api, &mut job, max_age()).await.unwrap();
        assert_eq!(status, ProcessingStatus::TimedOut);
        assert_eq!(*api.get_calls.lock().unwrap(), 0);
        assert!(a003_on_demand_report::repository::list_waiting(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_create_and_poll() {
        let (db, _) = seeded_db().await;
        let factory = FakeFactory {
            reports: Arc::new(FakeReportsApi::new(&["DONE"], MTR_DOCUMENT.as_bytes())),
            requested: Mutex::new(Vec::new()),
        };
        let locks = TenantLocks::new();

        let created = create_reports_scheduled(&db, &factory, None).await.unwrap();
        assert_eq!(created, JobRunSummary { succeeded: 1, failed: 0 });
        let spec = factory.reports.created.lock().unwrap()[0].clone();
        assert_eq!(spec.report_type, "GET_GST_MTR_B2B_CUSTOM");
        assert!(spec.data_start_time.unwrap().ends_with('Z'));

        let polled = poll_reports_scheduled(&db, &factory, &locks, max_age()).await.unwrap();
        assert_eq!(polled.succeeded, 1);
        assert_eq!(a003_on_demand_report::repository::list_ready(&db).await.unwrap().len(), 1);
        assert_eq!(factory.requested.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_background_run_reaches_done() {
        let (db, _) = seeded_db().await;
        let api = Arc::new(FakeReportsApi::new(&["IN_QUEUE", "DONE"], MTR_DOCUMENT.as_bytes()));
        let job = new_job(&db).await;

        let status = run_report_job(
            db.clone(),
            api.clone(),
            Arc::new(TenantLocks::new()),
            job.base.id.value(),
            fast_policy(10),
            max_age(),
        )
        .await
        .unwrap();
        assert_eq!(status, ProcessingStatus::Done);
        assert_eq!(api.downloads(), 1);

        let report = process_report_job(&db, job.base.id.value(), true).await.unwrap();
        assert_eq!(report.counters.created, 1);
    }
}
