//! Dedup-and-upsert of developers, publishers, categories and platforms.
//!
//! Every distinct `(kind, name)` gets one reservation cell per run. The first
//! task to reach a cell runs lookup-then-create; any concurrent task asking
//! for the same key awaits that same cell, so a name is created at most once
//! no matter how many items reference it.

use futures::{stream, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::catalog::CatalogItem;
use crate::error::SyncError;
use crate::normalization::taxonomy_slug;
use crate::repository::{NewTaxonomy, Repository, TaxonomyKind};

pub type TaxonomyKey = (TaxonomyKind, String);

/// Distinct names per kind referenced anywhere in the batch.
pub fn collect_names(items: &[CatalogItem]) -> BTreeMap<TaxonomyKind, BTreeSet<String>> {
    let mut out: BTreeMap<TaxonomyKind, BTreeSet<String>> = BTreeMap::new();
    for item in items {
        for kind in TaxonomyKind::ALL {
            let names = out.entry(kind).or_default();
            for name in item_names(item, kind) {
                let name = name.trim();
                if !name.is_empty() {
                    names.insert(name.to_string());
                }
            }
        }
    }
    out
}

/// Names of one kind referenced by a single item.
pub fn item_names(item: &CatalogItem, kind: TaxonomyKind) -> Vec<&str> {
    match kind {
        TaxonomyKind::Developer => item.developers.iter().map(String::as_str).collect(),
        TaxonomyKind::Publisher => item.publishers.iter().map(String::as_str).collect(),
        TaxonomyKind::Category => item.genres.iter().map(|g| g.name.as_str()).collect(),
        TaxonomyKind::Platform => item.operating_systems.iter().map(String::as_str).collect(),
    }
}

#[derive(Default)]
struct Counters {
    created: AtomicUsize,
    existing: AtomicUsize,
    failed: AtomicUsize,
}

/// Per-run single-flight table keyed by `(kind, name)`.
#[derive(Default)]
pub struct Reservations {
    cells: Mutex<HashMap<TaxonomyKey, Arc<OnceCell<Option<i64>>>>>,
}

impl Reservations {
    async fn cell(&self, key: &TaxonomyKey) -> Arc<OnceCell<Option<i64>>> {
        let mut cells = self.cells.lock().await;
        cells.entry(key.clone()).or_default().clone()
    }
}

/// Resolved ids after reconciliation. Names whose lookup or create failed
/// are absent.
#[derive(Debug, Default, Clone)]
pub struct TaxonomyIndex {
    ids: HashMap<TaxonomyKey, i64>,
    pub created: usize,
    pub existing: usize,
    pub failed: usize,
}

impl TaxonomyIndex {
    pub fn get(&self, kind: TaxonomyKind, name: &str) -> Option<i64> {
        self.ids.get(&(kind, name.trim().to_string())).copied()
    }

    /// Ids for `names` in order, without duplicates, plus the names that did not resolve.
    pub fn resolve<'a, I>(&self, kind: TaxonomyKind, names: I) -> (Vec<i64>, Vec<String>)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids = Vec::new();
        let mut missing = Vec::new();
        for name in names {
            if name.trim().is_empty() {
                continue;
            }
            match self.get(kind, name) {
                Some(id) if !ids.contains(&id) => ids.push(id),
                Some(_) => {}
                None => missing.push(name.to_string()),
            }
        }
        (ids, missing)
    }
}

pub struct TaxonomyReconciler {
    repo: Arc<dyn Repository>,
    reservations: Reservations,
    counters: Counters,
    concurrency: usize,
}

impl TaxonomyReconciler {
    pub fn new(repo: Arc<dyn Repository>, concurrency: usize) -> Self {
        Self {
            repo,
            reservations: Reservations::default(),
            counters: Counters::default(),
            concurrency: concurrency.max(1),
        }
    }

    /// Make sure one stored entity exists for `(kind, name)`.
    ///
    /// `None` means the entity is unavailable for the rest of this run; the
    /// failure has already been logged.
    pub async fn ensure(&self, kind: TaxonomyKind, name: &str) -> Option<i64> {
        let key = (kind, name.trim().to_string());
        let cell = self.reservations.cell(&key).await;
        let id = *cell
            .get_or_init(|| async {
                match self.lookup_or_create(kind, &key.1).await {
                    Ok(id) => Some(id),
                    Err(err) => {
                        self.counters.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            %kind,
                            name = %key.1,
                            error = %err,
                            "taxonomy entity unavailable this run"
                        );
                        None
                    }
                }
            })
            .await;
        id
    }

    async fn lookup_or_create(&self, kind: TaxonomyKind, name: &str) -> Result<i64, SyncError> {
        let found = self
            .repo
            .find_taxonomy(kind, name)
            .await
            .map_err(|error| SyncError::EntityLookup {
                kind,
                name: name.to_string(),
                error,
            })?;
        if let Some(existing) = found.first() {
            self.counters.existing.fetch_add(1, Ordering::Relaxed);
            return Ok(existing.id);
        }
        let created = self
            .repo
            .create_taxonomy(
                kind,
                NewTaxonomy {
                    name: name.to_string(),
                    slug: taxonomy_slug(name),
                },
            )
            .await
            .map_err(|error| SyncError::EntityCreate {
                kind,
                name: name.to_string(),
                error,
            })?;
        self.counters.created.fetch_add(1, Ordering::Relaxed);
        debug!(%kind, name, id = created.id, "taxonomy entity created");
        Ok(created.id)
    }

    /// Ensure every name referenced by the batch, all kinds fanned out together.
    pub async fn reconcile(&self, items: &[CatalogItem]) -> TaxonomyIndex {
        let keys: Vec<TaxonomyKey> = collect_names(items)
            .into_iter()
            .flat_map(|(kind, names)| names.into_iter().map(move |n| (kind, n)))
            .collect();
        let total = keys.len();

        let resolved: Vec<(TaxonomyKey, Option<i64>)> = stream::iter(keys)
            .map(|key| async move {
                let id = self.ensure(key.0, &key.1).await;
                (key, id)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let index = TaxonomyIndex {
            ids: resolved
                .into_iter()
                .filter_map(|(key, id)| id.map(|id| (key, id)))
                .collect(),
            created: self.counters.created.load(Ordering::Relaxed),
            existing: self.counters.existing.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        };
        info!(
            distinct = total,
            created = index.created,
            existing = index.existing,
            failed = index.failed,
            "taxonomy reconciled"
        );
        index
    }
}
