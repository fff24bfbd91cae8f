//! Persistence seam for games and their taxonomy.
//!
//! The pipeline only needs exact-name lookups and single-row creates; every
//! call is treated as an atomic operation with no batching or transactions
//! spanning calls.

pub mod memory;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::normalization::AgeRating;

pub use memory::MemoryRepository;
pub use postgres::PgRepository;

/// The four shared reference kinds linked many-to-many to games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Developer,
    Publisher,
    Category,
    Platform,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 4] = [
        TaxonomyKind::Developer,
        TaxonomyKind::Publisher,
        TaxonomyKind::Category,
        TaxonomyKind::Platform,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyKind::Developer => "developer",
            TaxonomyKind::Publisher => "publisher",
            TaxonomyKind::Category => "category",
            TaxonomyKind::Platform => "platform",
        }
    }

    /// Backing table name.
    pub fn table(&self) -> &'static str {
        match self {
            TaxonomyKind::Developer => "developers",
            TaxonomyKind::Publisher => "publishers",
            TaxonomyKind::Category => "categories",
            TaxonomyKind::Platform => "platforms",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyEntity {
    pub id: i64,
    pub kind: TaxonomyKind,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaxonomy {
    pub name: String,
    pub slug: String,
}

/// Creation payload for a game. Reference ids are already resolved; names
/// that could not be resolved are simply absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub name: String,
    pub slug: String,
    pub price: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<AgeRating>,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub categories: Vec<i64>,
    pub developers: Vec<i64>,
    pub platforms: Vec<i64>,
    pub publishers: Vec<i64>,
}

impl NewGame {
    pub fn references(&self, kind: TaxonomyKind) -> &[i64] {
        match kind {
            TaxonomyKind::Developer => &self.developers,
            TaxonomyKind::Publisher => &self.publishers,
            TaxonomyKind::Category => &self.categories,
            TaxonomyKind::Platform => &self.platforms,
        }
    }

    pub fn references_mut(&mut self, kind: TaxonomyKind) -> &mut Vec<i64> {
        match kind {
            TaxonomyKind::Developer => &mut self.developers,
            TaxonomyKind::Publisher => &mut self.publishers,
            TaxonomyKind::Category => &mut self.categories,
            TaxonomyKind::Platform => &mut self.platforms,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: i64,
    #[serde(flatten)]
    pub fields: NewGame,
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// All taxonomy rows of `kind` whose name equals `name` exactly.
    async fn find_taxonomy(&self, kind: TaxonomyKind, name: &str) -> Result<Vec<TaxonomyEntity>>;

    async fn create_taxonomy(&self, kind: TaxonomyKind, new: NewTaxonomy) -> Result<TaxonomyEntity>;

    /// All games whose name equals `name` exactly.
    async fn find_games(&self, name: &str) -> Result<Vec<Game>>;

    async fn create_game(&self, new: NewGame) -> Result<Game>;
}
