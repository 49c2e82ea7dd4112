pub mod request;
pub mod response;

use super::common::UseCaseMetadata;

pub struct ProcessMtr;

impl UseCaseMetadata for ProcessMtr {
    fn usecase_index() -> &'static str {
        "u501"
    }

    fn usecase_name() -> &'static str {
        "process_mtr"
    }

    fn display_name() -> &'static str {
        "Process MTR report"
    }
}
