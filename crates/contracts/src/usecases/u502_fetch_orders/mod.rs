pub mod request;
pub mod response;

use super::common::UseCaseMetadata;

pub struct FetchOrders;

impl UseCaseMetadata for FetchOrders {
    fn usecase_index() -> &'static str {
        "u502"
    }

    fn usecase_name() -> &'static str {
        "fetch_orders"
    }

    fn display_name() -> &'static str {
        "Fetch Amazon orders"
    }
}
