pub mod executor;
pub mod order_invoice;
pub mod pagination;

pub use executor::{fetch_and_log_orders, process_order_log, process_pending_logs};
