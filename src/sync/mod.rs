//! Catalog synchronization: fetch, reconcile taxonomy, then create each new
//! game with its descriptions and images.

pub mod pacer;
pub mod report;

use anyhow::Result;
use futures::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::catalog::{provider::http_client, CatalogItem, CatalogSource, GogCatalogProvider};
use crate::config::SyncConfig;
use crate::enrich::{DetailEnricher, DetailSource, HttpDetailSource};
use crate::error::SyncError;
use crate::media::{AssetStorage, HttpAssetStorage, HttpImageSource, ImageSource, MediaUploader};
use crate::normalization::{parse_price, parse_release_date, storage_slug};
use crate::repository::{NewGame, Repository, TaxonomyKind};
use crate::taxonomy::{item_names, TaxonomyIndex, TaxonomyReconciler};

pub use pacer::{Pacer, PacingPolicy};
pub use report::{ItemOutcome, SyncReport};

/// Build the creation payload for an item from catalog fields alone.
///
/// Returns the payload and the `kind name` labels that did not resolve;
/// unresolved references are left out rather than failing the item.
pub fn map_game(item: &CatalogItem, index: &TaxonomyIndex) -> (NewGame, Vec<String>) {
    let mut game = NewGame {
        name: item.title.trim().to_string(),
        slug: storage_slug(&item.slug),
        price: item.formatted_price().and_then(parse_price),
        release_date: item.release_date.as_deref().and_then(parse_release_date),
        ..Default::default()
    };
    let mut unresolved = Vec::new();
    for kind in TaxonomyKind::ALL {
        let (ids, missing) = index.resolve(kind, item_names(item, kind));
        *game.references_mut(kind) = ids;
        unresolved.extend(missing.into_iter().map(|name| format!("{kind} {name:?}")));
    }
    (game, unresolved)
}

pub struct CatalogSynchronizer {
    catalog: Arc<dyn CatalogSource>,
    repo: Arc<dyn Repository>,
    enricher: DetailEnricher,
    media: MediaUploader,
    config: SyncConfig,
}

impl CatalogSynchronizer {
    pub fn new(
        catalog: Arc<dyn CatalogSource>,
        repo: Arc<dyn Repository>,
        details: Arc<dyn DetailSource>,
        images: Arc<dyn ImageSource>,
        storage: Arc<dyn AssetStorage>,
        config: SyncConfig,
    ) -> Self {
        Self {
            catalog,
            repo,
            enricher: DetailEnricher::new(details),
            media: MediaUploader::new(images, storage),
            config,
        }
    }

    /// Wire the HTTP collaborators described by `config` around `repo`.
    pub fn from_config(config: SyncConfig, repo: Arc<dyn Repository>) -> Result<Self> {
        config.validate()?;
        let http = http_client(config.http_timeout)?;
        Ok(Self::new(
            Arc::new(GogCatalogProvider::new(http.clone(), config.catalog.clone())),
            repo,
            Arc::new(HttpDetailSource::new(http.clone(), &config.product_page_url)),
            Arc::new(HttpImageSource::new(http.clone())),
            Arc::new(HttpAssetStorage::new(
                http,
                &config.storage_url,
                config.storage_token.clone(),
            )),
            config,
        ))
    }

    /// One full pass over the first catalog page.
    ///
    /// Only a failed listing fetch is returned as an error. Taxonomy is fully
    /// reconciled before the first game is looked at.
    pub async fn run(&self) -> Result<SyncReport, SyncError> {
        let items = self
            .catalog
            .fetch_page()
            .await
            .map_err(SyncError::CatalogFetch)?;
        let mut report = SyncReport::new(items.len());

        let reconciler =
            TaxonomyReconciler::new(self.repo.clone(), self.config.taxonomy_concurrency);
        let index = reconciler.reconcile(&items).await;
        report.record_taxonomy(&index);

        let mut seen: HashSet<String> = HashSet::new();
        let mut queue = Vec::with_capacity(items.len());
        for item in items {
            if seen.insert(item.title.trim().to_string()) {
                queue.push(item);
            } else {
                debug!(title = %item.title, "duplicate title in listing");
                report.record(&item.title, ItemOutcome::DuplicateInBatch);
            }
        }

        let pacer = Pacer::new(self.config.pacing, self.config.item_delay);
        let outcomes: Vec<(String, ItemOutcome)> = stream::iter(queue)
            .map(|item| {
                let pacer = &pacer;
                let index = &index;
                async move {
                    pacer.acquire().await;
                    let outcome = self.sync_item(&item, index).await;
                    pacer.finished().await;
                    (item.title, outcome)
                }
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;
        for (title, outcome) in outcomes {
            report.record(&title, outcome);
        }

        info!(
            fetched = report.fetched,
            created = report.created,
            degraded = report.degraded,
            skipped = report.skipped,
            duplicates = report.duplicates,
            failed = report.failed,
            taxonomy_created = report.taxonomy_created,
            taxonomy_failed = report.taxonomy_failed,
            "catalog sync finished"
        );
        Ok(report)
    }

    /// Check, map, enrich, persist, then attach images for one item.
    pub async fn sync_item(&self, item: &CatalogItem, index: &TaxonomyIndex) -> ItemOutcome {
        let title = item.title.trim();
        match self.repo.find_games(title).await {
            Ok(existing) if !existing.is_empty() => {
                debug!(%title, id = existing[0].id, "game already stored");
                return ItemOutcome::Skipped {
                    existing_id: existing[0].id,
                };
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%title, error = %err, "game lookup failed");
                return ItemOutcome::Failed {
                    reason: format!("lookup: {err:#}"),
                };
            }
        }

        let (mut payload, mut issues) = map_game(item, index);
        for label in &issues {
            warn!(%title, reference = %label, "unresolved reference omitted");
        }

        match self.enricher.enrich(&item.slug).await {
            Ok(detail) => {
                payload.rating = Some(detail.rating);
                payload.short_description = Some(detail.short_description);
                payload.description = Some(detail.description);
            }
            Err(err) => {
                warn!(%title, error = %err, "enrichment skipped");
                issues.push(err.to_string());
            }
        }

        let game = match self.repo.create_game(payload).await {
            Ok(game) => game,
            Err(err) => {
                warn!(%title, error = %err, "game create failed");
                return ItemOutcome::Failed {
                    reason: format!("create: {err:#}"),
                };
            }
        };
        info!(%title, id = game.id, slug = %game.fields.slug, "game created");

        let media = self
            .media
            .attach_images(
                game.id,
                &game.fields.slug,
                item.cover_horizontal.as_deref(),
                &item.screenshots,
                self.config.gallery_limit,
            )
            .await;
        debug!(
            %title,
            attempted = media.attempted,
            uploaded = media.uploaded,
            "images attached"
        );
        issues.extend(media.failures.iter().map(ToString::to_string));

        if issues.is_empty() {
            ItemOutcome::Created { id: game.id }
        } else {
            ItemOutcome::CreatedDegraded {
                id: game.id,
                issues,
            }
        }
    }
}
