pub mod common;

pub mod u501_process_mtr;
pub mod u502_fetch_orders;
pub mod u503_fetch_report;
