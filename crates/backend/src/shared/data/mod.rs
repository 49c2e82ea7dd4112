pub mod db;
pub mod erp_store;
pub mod file_storage;
