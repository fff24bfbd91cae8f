pub mod api;
pub mod catalog;
pub mod config;
pub mod enrich;
pub mod error;
pub mod media;
pub mod normalization;
pub mod repository;
pub mod sync;
pub mod taxonomy;
pub mod tracing;

pub mod util {
    pub mod env;
}

#[cfg(test)]
pub(crate) mod testing;

pub use config::SyncConfig;
pub use error::SyncError;
pub use sync::{CatalogSynchronizer, ItemOutcome, SyncReport};

/// Fixed acknowledgment returned to whoever triggered a run.
pub const COMPLETION_MESSAGE: &str = "Finished populating!";
