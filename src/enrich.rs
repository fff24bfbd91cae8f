//! Product-page scrape supplying rating and descriptions for a game.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::provider::truncate_for_log;
use crate::error::SyncError;
use crate::normalization::{product_page_slug, truncate_chars, AgeRating};

/// CSS selector of the descriptive block on a product page.
pub const DESCRIPTION_SELECTOR: &str = ".description";
pub const SHORT_DESCRIPTION_CHARS: usize = 160;

#[derive(Debug, Clone, PartialEq)]
pub struct GameDetail {
    pub rating: AgeRating,
    pub short_description: String,
    pub description: String,
}

#[async_trait]
pub trait DetailSource: Send + Sync {
    /// Raw markup of the product page for an already page-formatted slug.
    async fn fetch_markup(&self, page_slug: &str) -> Result<String>;
}

/// Fetches `{base_url}/{page_slug}` over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDetailSource {
    http: Client,
    base_url: String,
}

impl HttpDetailSource {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn page_url(&self, page_slug: &str) -> String {
        format!("{}/{}", self.base_url, page_slug)
    }
}

#[async_trait]
impl DetailSource for HttpDetailSource {
    async fn fetch_markup(&self, page_slug: &str) -> Result<String> {
        let url = self.page_url(page_slug);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 500);
            return Err(anyhow!("product page failed: {status} url={url} body={body}"));
        }
        resp.text().await.context("read product page body")
    }
}

fn description_selector() -> Result<Selector> {
    Selector::parse(DESCRIPTION_SELECTOR)
        .map_err(|e| anyhow!("invalid selector {DESCRIPTION_SELECTOR:?}: {e:?}"))
}

fn visible_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the description block. `None` when the page has no such element.
pub fn parse_detail(markup: &str) -> Option<GameDetail> {
    let selector = description_selector().ok()?;
    let document = Html::parse_document(markup);
    let element = document.select(&selector).next()?;
    Some(GameDetail {
        rating: AgeRating::PLACEHOLDER,
        short_description: truncate_chars(&visible_text(element), SHORT_DESCRIPTION_CHARS),
        description: element.inner_html().trim().to_string(),
    })
}

pub struct DetailEnricher {
    source: Arc<dyn DetailSource>,
}

impl DetailEnricher {
    pub fn new(source: Arc<dyn DetailSource>) -> Self {
        Self { source }
    }

    /// Scrape the product page for a catalog slug (either separator style).
    pub async fn enrich(&self, slug: &str) -> Result<GameDetail, SyncError> {
        let page_slug = product_page_slug(slug);
        let markup = self
            .source
            .fetch_markup(&page_slug)
            .await
            .map_err(|error| SyncError::DetailFetch {
                slug: page_slug.clone(),
                error,
            })?;
        debug!(slug = %page_slug, bytes = markup.len(), "product page fetched");
        parse_detail(&markup).ok_or(SyncError::DetailParse { slug: page_slug })
    }
}
