pub mod executor;
pub mod poller;

pub use executor::{
    create_reports_scheduled, fetch_report, poll_reports_scheduled, process_done_reports,
    process_report_job, run_report_job, JobRunSummary,
};
pub use poller::PollPolicy;
