use thiserror::Error;

use crate::repository::TaxonomyKind;

/// Failure classes of a sync run.
///
/// Only [`SyncError::CatalogFetch`] aborts a run; every other variant is
/// logged where it happens and recorded on the item outcome.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("catalog fetch failed: {0:#}")]
    CatalogFetch(anyhow::Error),

    #[error("{kind} lookup failed for {name:?}: {error:#}")]
    EntityLookup {
        kind: TaxonomyKind,
        name: String,
        error: anyhow::Error,
    },

    #[error("{kind} create failed for {name:?}: {error:#}")]
    EntityCreate {
        kind: TaxonomyKind,
        name: String,
        error: anyhow::Error,
    },

    #[error("product page fetch failed for {slug}: {error:#}")]
    DetailFetch { slug: String, error: anyhow::Error },

    #[error("product page for {slug} has no description element")]
    DetailParse { slug: String },

    #[error("image fetch failed for {url}: {error:#}")]
    MediaFetch { url: String, error: anyhow::Error },

    #[error("{field} upload failed for game {game_id}: {error:#}")]
    MediaUpload {
        field: &'static str,
        game_id: i64,
        error: anyhow::Error,
    },
}

impl SyncError {
    /// Whether this failure must stop the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::CatalogFetch(_))
    }
}
