pub mod files;
pub mod logger;
