mod create_amazon_reports;
mod fetch_amazon_orders;
mod poll_amazon_reports;
mod process_done_reports;

pub use create_amazon_reports::CreateAmazonReportsManager;
pub use fetch_amazon_orders::FetchAmazonOrdersManager;
pub use poll_amazon_reports::PollAmazonReportsManager;
pub use process_done_reports::ProcessDoneReportsManager;
