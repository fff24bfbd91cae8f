//! In-process doubles for the network collaborators.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::catalog::{CatalogGenre, CatalogItem, CatalogPrice, CatalogSource};
use crate::enrich::DetailSource;
use crate::media::{AssetStorage, ImageSource, Upload};
use crate::repository::MemoryRepository;
use crate::{CatalogSynchronizer, SyncConfig};

pub fn item(title: &str, slug: &str) -> CatalogItem {
    CatalogItem {
        title: title.to_string(),
        slug: slug.to_string(),
        price: Some(CatalogPrice {
            final_price: Some("BR$59.90".to_string()),
        }),
        release_date: Some("2020-02-20".to_string()),
        genres: vec![CatalogGenre {
            name: "Action".to_string(),
        }],
        developers: vec!["Acme".to_string()],
        publishers: vec!["Acme Publishing".to_string()],
        operating_systems: vec!["windows".to_string()],
        cover_horizontal: Some(format!("https://img/{slug}_cover.png")),
        screenshots: (0..3)
            .map(|i| format!("https://img/{slug}_{i}_{{formatter}}.jpg"))
            .collect(),
    }
}

/// Synchronizer over fresh in-memory doubles with no pacing delay.
pub fn offline_synchronizer(catalog: ScriptedCatalog) -> CatalogSynchronizer {
    let config = SyncConfig {
        item_delay: Duration::ZERO,
        ..SyncConfig::default()
    };
    CatalogSynchronizer::new(
        Arc::new(catalog),
        Arc::new(MemoryRepository::new()),
        Arc::new(ScriptedPages::default()),
        Arc::new(ScriptedImages::default()),
        Arc::new(RecordingStorage::default()),
        config,
    )
}

pub struct ScriptedCatalog {
    items: Option<Vec<CatalogItem>>,
}

impl ScriptedCatalog {
    pub fn new(items: Vec<CatalogItem>) -> Self {
        Self { items: Some(items) }
    }

    pub fn unavailable() -> Self {
        Self { items: None }
    }
}

#[async_trait]
impl CatalogSource for ScriptedCatalog {
    async fn fetch_page(&self) -> Result<Vec<CatalogItem>> {
        self.items
            .clone()
            .ok_or_else(|| anyhow!("503 Service Unavailable"))
    }
}

/// Serves a description block for every slug except the listed ones.
#[derive(Default)]
pub struct ScriptedPages {
    bare: HashSet<String>,
    down: HashSet<String>,
}

impl ScriptedPages {
    /// Page exists but lacks the description element.
    pub fn bare(mut self, page_slug: &str) -> Self {
        self.bare.insert(page_slug.to_string());
        self
    }

    /// Page request fails outright.
    pub fn down(mut self, page_slug: &str) -> Self {
        self.down.insert(page_slug.to_string());
        self
    }
}

#[async_trait]
impl DetailSource for ScriptedPages {
    async fn fetch_markup(&self, page_slug: &str) -> Result<String> {
        if self.down.contains(page_slug) {
            bail!("connection reset fetching {page_slug}");
        }
        if self.bare.contains(page_slug) {
            return Ok("<html><body><h1>Coming soon</h1></body></html>".to_string());
        }
        Ok(format!(
            r#"<html><body><div class="description"><p>About {page_slug}.</p></div></body></html>"#
        ))
    }
}

#[derive(Default)]
pub struct ScriptedImages {
    failing: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl ScriptedImages {
    pub fn failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub async fn requested(&self) -> Vec<String> {
        self.requested.lock().await.clone()
    }
}

#[async_trait]
impl ImageSource for ScriptedImages {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        self.requested.lock().await.push(url.to_string());
        if self.failing.contains(url) {
            bail!("404 Not Found");
        }
        Ok(Bytes::from_static(b"\xff\xd8\xff\xe0"))
    }
}

#[derive(Default)]
pub struct RecordingStorage {
    reject: bool,
    uploads: Mutex<Vec<Upload>>,
}

impl RecordingStorage {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub async fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().await.clone()
    }

    pub async fn uploads_by_record(&self) -> HashMap<i64, usize> {
        let mut out = HashMap::new();
        for u in self.uploads.lock().await.iter() {
            *out.entry(u.record_id).or_insert(0) += 1;
        }
        out
    }
}

#[async_trait]
impl AssetStorage for RecordingStorage {
    async fn upload(&self, upload: Upload) -> Result<()> {
        if self.reject {
            bail!("413 Payload Too Large");
        }
        self.uploads.lock().await.push(upload);
        Ok(())
    }
}
