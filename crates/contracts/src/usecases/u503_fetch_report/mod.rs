pub mod request;
pub mod response;

use super::common::UseCaseMetadata;

pub struct FetchReport;

impl UseCaseMetadata for FetchReport {
    fn usecase_index() -> &'static str {
        "u503"
    }

    fn usecase_name() -> &'static str {
        "fetch_report"
    }

    fn display_name() -> &'static str {
        "Fetch Amazon report"
    }
}
