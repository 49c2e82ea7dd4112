pub mod builder;
pub mod executor;
pub mod mtr_columns;
pub mod parser;
pub mod resolver;

pub use executor::{process_mtr_content, process_mtr_file, MtrRunOptions};
