//! amz-reviews - Amazon review collection CLI
//!
//! Walks a product's review listing star filter by star filter with
//! browser-like pacing, extracts structured review records, and ships
//! them to an ingest backend.

pub mod amazon;
pub mod browser;
pub mod collector;
pub mod commands;
pub mod config;
pub mod filters;
pub mod format;
pub mod upload;

pub use amazon::models::{MediaFilter, ReviewBatch, ReviewRecord, StarFilter};
pub use amazon::Marketplace;
pub use collector::{CollectPlan, CollectionEvent, Supervisor};
pub use config::Config;
