//! Image download and multipart attachment to a stored game.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::catalog::provider::truncate_for_log;
use crate::error::SyncError;

/// Placeholder token carried by upstream image URL templates.
pub const FORMATTER_TOKEN: &str = "_{formatter}";
/// Crop requested for gallery images.
pub const GALLERY_CROP: &str = "_product_card_v2_mobile_slider_639";
/// Collection the uploaded files are attached to.
pub const OWNER_COLLECTION: &str = "game";
pub const IMAGE_EXTENSION: &str = "jpg";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaField {
    Cover,
    Gallery,
}

impl MediaField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaField::Cover => "cover",
            MediaField::Gallery => "gallery",
        }
    }
}

/// Resolve an upstream URL template for the target field.
pub fn image_url(template: &str, field: MediaField) -> String {
    match field {
        MediaField::Cover => template.replace(FORMATTER_TOKEN, ""),
        MediaField::Gallery => template.replace(FORMATTER_TOKEN, GALLERY_CROP),
    }
}

/// One file attachment handed to storage.
#[derive(Debug, Clone)]
pub struct Upload {
    pub collection: &'static str,
    pub record_id: i64,
    pub field: MediaField,
    pub filename: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

#[async_trait]
pub trait AssetStorage: Send + Sync {
    async fn upload(&self, upload: Upload) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpImageSource {
    http: Client,
}

impl HttpImageSource {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("image fetch failed: {status} url={url}"));
        }
        resp.bytes().await.context("read image bytes")
    }
}

/// Multipart upload endpoint at `{base_url}/upload`.
#[derive(Debug, Clone)]
pub struct HttpAssetStorage {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpAssetStorage {
    pub fn new(http: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        }
    }

    fn form(upload: Upload) -> Result<Form> {
        let part = Part::bytes(upload.bytes.to_vec())
            .file_name(upload.filename)
            .mime_str("image/jpeg")?;
        Ok(Form::new()
            .text("ref", upload.collection)
            .text("refId", upload.record_id.to_string())
            .text("field", upload.field.as_str())
            .part("files", part))
    }
}

#[async_trait]
impl AssetStorage for HttpAssetStorage {
    async fn upload(&self, upload: Upload) -> Result<()> {
        let url = format!("{}/upload", self.base_url);
        let mut req = self.http.post(&url).multipart(Self::form(upload)?);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        let resp = req.send().await.with_context(|| format!("POST {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 1000);
            return Err(anyhow!("upload rejected: {status} url={url} body={body}"));
        }
        Ok(())
    }
}

/// Result of attaching every image of one game.
#[derive(Debug, Default)]
pub struct MediaReport {
    pub attempted: usize,
    pub uploaded: usize,
    pub failures: Vec<SyncError>,
}

pub struct MediaUploader {
    images: Arc<dyn ImageSource>,
    storage: Arc<dyn AssetStorage>,
}

impl MediaUploader {
    pub fn new(images: Arc<dyn ImageSource>, storage: Arc<dyn AssetStorage>) -> Self {
        Self { images, storage }
    }

    /// Fetch one image and attach it to the game. Not idempotent: calling
    /// twice attaches two files.
    pub async fn upload(
        &self,
        template: &str,
        game_id: i64,
        game_slug: &str,
        field: MediaField,
    ) -> Result<(), SyncError> {
        let url = image_url(template, field);
        let bytes = self
            .images
            .fetch(&url)
            .await
            .map_err(|error| SyncError::MediaFetch {
                url: url.clone(),
                error,
            })?;
        debug!(%url, bytes = bytes.len(), field = field.as_str(), "image fetched");
        self.storage
            .upload(Upload {
                collection: OWNER_COLLECTION,
                record_id: game_id,
                field,
                filename: format!("{game_slug}.{IMAGE_EXTENSION}"),
                bytes,
            })
            .await
            .map_err(|error| SyncError::MediaUpload {
                field: field.as_str(),
                game_id,
                error,
            })
    }

    /// Cover first, then at most `gallery_limit` screenshots, in order.
    /// Each image fails on its own; siblings are still attempted.
    pub async fn attach_images(
        &self,
        game_id: i64,
        game_slug: &str,
        cover: Option<&str>,
        screenshots: &[String],
        gallery_limit: usize,
    ) -> MediaReport {
        let mut report = MediaReport::default();
        let jobs = cover
            .map(|c| (c, MediaField::Cover))
            .into_iter()
            .chain(
                screenshots
                    .iter()
                    .take(gallery_limit)
                    .map(|s| (s.as_str(), MediaField::Gallery)),
            );
        for (template, field) in jobs {
            report.attempted += 1;
            match self.upload(template, game_id, game_slug, field).await {
                Ok(()) => report.uploaded += 1,
                Err(err) => {
                    warn!(
                        game_id,
                        slug = %game_slug,
                        field = field.as_str(),
                        error = %err,
                        "image skipped"
                    );
                    report.failures.push(err);
                }
            }
        }
        report
    }
}
