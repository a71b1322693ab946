//! Amazon-specific modules for page extraction, scrubbing, and data models.

pub mod extract;
pub mod marketplace;
pub mod models;
pub mod scrub;
pub mod selectors;

pub use extract::{ExtractError, NextPage, ReviewExtractor};
pub use marketplace::Marketplace;
pub use models::{MediaFilter, ProductSummary, ReviewBatch, ReviewRecord, StarFilter};
