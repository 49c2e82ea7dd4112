use std::time::Duration;

use contracts::domain::a003_on_demand_report::aggregate::ProcessingStatus;
use tokio::time::Instant;

use crate::shared::config::ReportPollingConfig;
use crate::shared::marketplaces::amazon::models::Report;
use crate::shared::marketplaces::amazon::{ReportsApi, SpApiError};

/// Ограниченный опрос статуса отчёта с экспоненциальной паузой
#[derive(Debug, Clone, PartialEq)]
pub struct PollPolicy {
    pub initial_interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub timeout: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &ReportPollingConfig) -> Self {
        Self {
            initial_interval: Duration::from_secs(config.initial_interval_secs),
            max_interval: Duration::from_secs(config.max_interval_secs),
            backoff_factor: config.backoff_factor.max(1.0),
            max_attempts: config.max_attempts.max(1),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Пауза перед попыткой `attempt` (с единицы)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        self.initial_interval
            .mul_f64(factor)
            .min(self.max_interval.max(self.initial_interval))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Done { report: Report, attempts: u32 },
    /// FATAL или CANCELLED
    Failed { report: Report, attempts: u32 },
    TimedOut {
        last: Option<Report>,
        attempts: u32,
    },
}

impl PollOutcome {
    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Done { attempts, .. }
            | PollOutcome::Failed { attempts, .. }
            | PollOutcome::TimedOut { attempts, .. } => *attempts,
        }
    }
}

/// Опрашивать отчёт, пока Amazon его формирует.
///
/// Перед каждой попыткой выдерживается пауза политики. Опрос прекращается
/// на DONE, FATAL/CANCELLED, по числу попыток или по общему таймауту.
pub async fn poll_report(
    api: &dyn ReportsApi,
    report_id: &str,
    policy: &PollPolicy,
) -> Result<PollOutcome, SpApiError> {
    let started = Instant::now();
    let mut last = None;

    for attempt in 1..=policy.max_attempts {
        let delay = policy.delay_for(attempt);
        if started.elapsed() + delay > policy.timeout {
            tracing::warn!("Report {} polling timed out after {} attempts", report_id, attempt - 1);
            return Ok(PollOutcome::TimedOut {
                last,
                attempts: attempt - 1,
            });
        }
        tokio::time::sleep(delay).await;

        let report = api.get_report(report_id).await?;
        tracing::debug!(
            "Report {} attempt {}: {}",
            report_id,
            attempt,
            report.processing_status
        );
        match ProcessingStatus::from_remote(&report.processing_status) {
            Some(ProcessingStatus::Done) => {
                return Ok(PollOutcome::Done {
                    report,
                    attempts: attempt,
                })
            }
            Some(ProcessingStatus::Fatal) | Some(ProcessingStatus::Cancelled) => {
                return Ok(PollOutcome::Failed {
                    report,
                    attempts: attempt,
                })
            }
            Some(_) => {}
            None => tracing::warn!(
                "Unknown processing status '{}' for report {}",
                report.processing_status,
                report_id
            ),
        }
        last = Some(report);
    }

    Ok(PollOutcome::TimedOut {
        last,
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::shared::marketplaces::amazon::models::CreateReportSpecification;
    use async_trait::async_trait;
    use std::sync::Mutex;

    pub fn report(id: &str, status: &str, document: Option<&str>) -> Report {
        Report {
            report_id: id.to_string(),
            report_type: "GET_GST_MTR_B2B_CUSTOM".into(),
            processing_status: status.to_string(),
            report_document_id: document.map(str::to_string),
            data_start_time: None,
            data_end_time: None,
            created_time: None,
            processing_start_time: None,
            processing_end_time: None,
        }
    }

    pub fn fast_policy(max_attempts: u32) -> PollPolicy {
        PollPolicy {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(2),
            backoff_factor: 2.0,
            max_attempts,
            timeout: Duration::from_secs(5),
        }
    }

    /// Reports API, отдающий статусы по очереди
    pub struct FakeReportsApi {
        pub statuses: Mutex<Vec<&'static str>>,
        pub document: Vec<u8>,
        pub created: Mutex<Vec<CreateReportSpecification>>,
        pub get_calls: Mutex<u32>,
        pub downloads: Mutex<u32>,
    }

    impl FakeReportsApi {
        pub fn new(statuses: &[&'static str], document: &[u8]) -> Self {
            Self {
                statuses: Mutex::new(statuses.to_vec()),
                document: document.to_vec(),
                created: Mutex::new(Vec::new()),
                get_calls: Mutex::new(0),
                downloads: Mutex::new(0),
            }
        }

        pub fn downloads(&self) -> u32 {
            *self.downloads.lock().unwrap()
        }
    }

    #[async_trait]
    impl ReportsApi for FakeReportsApi {
        async fn create_report(
            &self,
            spec: &CreateReportSpecification,
        ) -> Result<String, SpApiError> {
            let mut created = self.created.lock().unwrap();
            created.push(spec.clone());
            Ok(format!("REPORT-{}", created.len()))
        }

        async fn get_report(&self, report_id: &str) -> Result<Report, SpApiError> {
            *self.get_calls.lock().unwrap() += 1;
            let mut statuses = self.statuses.lock().unwrap();
            let status = if statuses.len() > 1 {
                statuses.remove(0)
            } else {
                statuses.first().copied().unwrap_or("IN_QUEUE")
            };
            let document = (status == "DONE").then_some("amzn1.spdoc.1");
            Ok(report(report_id, status, document))
        }

        async fn download_report_document(&self, _document_id: &str) -> Result<Vec<u8>, SpApiError> {
            *self.downloads.lock().unwrap() += 1;
            Ok(self.document.clone())
        }
    }

    #[tokio::test]
    async fn test_queue_progress_done() {
        let api = FakeReportsApi::new(&["IN_QUEUE", "IN_PROGRESS", "DONE"], b"");
        let outcome = poll_report(&api, "R1", &fast_policy(10)).await.unwrap();
        match outcome {
            PollOutcome::Done { report, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(report.report_document_id.as_deref(), Some("amzn1.spdoc.1"));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fatal_and_cancelled_fail() {
        for status in ["FATAL", "CANCELLED"] {
            let api = FakeReportsApi::new(&["IN_QUEUE", status], b"");
            let outcome = poll_report(&api, "R1", &fast_policy(10)).await.unwrap();
            assert!(matches!(outcome, PollOutcome::Failed { attempts: 2, .. }));
        }
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let api = FakeReportsApi::new(&["IN_PROGRESS"], b"");
        let outcome = poll_report(&api, "R1", &fast_policy(3)).await.unwrap();
        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 3, .. }));
        assert_eq!(*api.get_calls.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn test_timeout_stops_before_sleeping_past_it() {
        let api = FakeReportsApi::new(&["IN_PROGRESS"], b"");
        let policy = PollPolicy {
            timeout: Duration::from_millis(0),
            ..fast_policy(10)
        };
        let outcome = poll_report(&api, "R1", &policy).await.unwrap();
        assert!(matches!(outcome, PollOutcome::TimedOut { attempts: 0, last: None }));
    }

    #[test]
    fn test_backoff_is_capped() {
        let policy = PollPolicy::from_config(&ReportPollingConfig::default());
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(2), Duration::from_millis(7500));
        assert_eq!(policy.delay_for(50), Duration::from_secs(60));
    }
}
