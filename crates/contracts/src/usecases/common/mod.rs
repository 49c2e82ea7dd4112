//! Common types and traits for all UseCases

pub mod order_outcome;
pub mod usecase_metadata;

pub use order_outcome::{BatchCounters, OrderOutcome};
pub use usecase_metadata::UseCaseMetadata;
