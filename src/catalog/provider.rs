use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;

use super::{CatalogEnvelope, CatalogItem, CatalogSource};
use crate::config::CatalogConfig;

const USER_AGENT: &str = concat!("catalog-sync/", env!("CARGO_PKG_VERSION"));

pub(crate) fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}

/// Shared HTTP client for every upstream call of a run.
pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .build()
        .context("build http client")
}

/// GOG catalog listing. Only the first page is ever requested and there is
/// no retry at this layer.
#[derive(Debug, Clone)]
pub struct GogCatalogProvider {
    http: Client,
    config: CatalogConfig,
}

impl GogCatalogProvider {
    pub fn new(http: Client, config: CatalogConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl CatalogSource for GogCatalogProvider {
    async fn fetch_page(&self) -> Result<Vec<CatalogItem>> {
        let url = &self.config.url;
        let resp = self
            .http
            .get(url)
            .header("Accept", "application/json")
            .query(&self.config.query())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 2000);
            return Err(anyhow!("catalog listing failed: {status} url={url} body={body}"));
        }
        let envelope: CatalogEnvelope = resp.json().await.context("decode catalog listing")?;
        info!(count = envelope.products.len(), "catalog page fetched");
        Ok(envelope.products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_truncation_keeps_utf8_valid() {
        let s = truncate_for_log("ééééé".to_string(), 3);
        assert_eq!(s, "é…");
        assert_eq!(truncate_for_log("ok".to_string(), 10), "ok");
    }
}
