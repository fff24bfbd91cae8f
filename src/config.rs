use anyhow::{Context, Result};
use std::time::Duration;
use url::Url;

use crate::sync::PacingPolicy;
use crate::util::env::{env_opt, env_parse};

pub const DEFAULT_CATALOG_URL: &str = "https://catalog.gog.com/v1/catalog";
pub const DEFAULT_PRODUCT_PAGE_URL: &str = "https://www.gog.com/en/game";
pub const DEFAULT_STORAGE_URL: &str = "http://localhost:1337";

/// Listing order and product-type filter are not configurable.
pub const CATALOG_ORDER: &str = "desc:bestselling";
pub const CATALOG_PRODUCT_TYPES: &str = "in:game,pack,dlc,extras";

/// Upstream listing query parameters.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub url: String,
    pub limit: u32,
    pub country_code: String,
    pub locale: String,
    pub currency_code: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CATALOG_URL.to_string(),
            limit: 48,
            country_code: "BR".to_string(),
            locale: "en-US".to_string(),
            currency_code: "BRL".to_string(),
        }
    }
}

impl CatalogConfig {
    /// Query string pairs for the first listing page.
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("limit", self.limit.to_string()),
            ("order", CATALOG_ORDER.to_string()),
            ("productType", CATALOG_PRODUCT_TYPES.to_string()),
            ("page", "1".to_string()),
            ("countryCode", self.country_code.clone()),
            ("locale", self.locale.clone()),
            ("currencyCode", self.currency_code.clone()),
        ]
    }
}

/// Every tunable of a sync run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub catalog: CatalogConfig,
    pub product_page_url: String,
    pub storage_url: String,
    pub storage_token: Option<String>,
    pub http_timeout: Duration,
    /// Spacing between per-item chains, measured per `pacing`.
    pub item_delay: Duration,
    /// Number of per-item chains allowed in flight at once.
    pub concurrency: usize,
    pub pacing: PacingPolicy,
    pub gallery_limit: usize,
    pub taxonomy_concurrency: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig::default(),
            product_page_url: DEFAULT_PRODUCT_PAGE_URL.to_string(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            storage_token: None,
            http_timeout: Duration::from_secs(20),
            item_delay: Duration::from_millis(2500),
            concurrency: 1,
            pacing: PacingPolicy::AfterFinish,
            gallery_limit: 5,
            taxonomy_concurrency: 8,
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        let catalog = CatalogConfig {
            url: env_opt("CATALOG_URL").unwrap_or(d.catalog.url),
            limit: env_parse("CATALOG_LIMIT", d.catalog.limit),
            country_code: env_opt("CATALOG_COUNTRY").unwrap_or(d.catalog.country_code),
            locale: env_opt("CATALOG_LOCALE").unwrap_or(d.catalog.locale),
            currency_code: env_opt("CATALOG_CURRENCY").unwrap_or(d.catalog.currency_code),
        };
        Self {
            catalog,
            product_page_url: env_opt("PRODUCT_PAGE_URL").unwrap_or(d.product_page_url),
            storage_url: env_opt("STORAGE_URL").unwrap_or(d.storage_url),
            storage_token: env_opt("STORAGE_TOKEN"),
            http_timeout: Duration::from_secs(env_parse("HTTP_TIMEOUT_SECS", 20u64)),
            item_delay: Duration::from_millis(env_parse("SYNC_ITEM_DELAY_MS", 2500u64)),
            concurrency: env_parse("SYNC_CONCURRENCY", d.concurrency).max(1),
            pacing: env_opt("SYNC_PACING")
                .and_then(|p| p.parse().ok())
                .unwrap_or(d.pacing),
            gallery_limit: env_parse("SYNC_GALLERY_LIMIT", d.gallery_limit),
            taxonomy_concurrency: env_parse("SYNC_TAXONOMY_CONCURRENCY", d.taxonomy_concurrency)
                .max(1),
        }
    }
}

impl SyncConfig {
    /// Reject endpoints that are not absolute URLs before any request goes out.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("CATALOG_URL", &self.catalog.url),
            ("PRODUCT_PAGE_URL", &self.product_page_url),
            ("STORAGE_URL", &self.storage_url),
        ] {
            Url::parse(value).with_context(|| format!("{name} is not a valid URL: {value}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_query_pins_order_and_region() {
        let query = CatalogConfig::default().query();
        let get = |k: &str| {
            query
                .iter()
                .find(|(key, _)| *key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("limit"), Some("48"));
        assert_eq!(get("order"), Some("desc:bestselling"));
        assert_eq!(get("productType"), Some("in:game,pack,dlc,extras"));
        assert_eq!(get("page"), Some("1"));
        assert_eq!(get("countryCode"), Some("BR"));
        assert_eq!(get("currencyCode"), Some("BRL"));
        assert_eq!(get("locale"), Some("en-US"));
    }

    #[test]
    fn defaults_serialize_item_chains() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.concurrency, 1);
        assert_eq!(cfg.gallery_limit, 5);
        assert_eq!(cfg.item_delay, Duration::from_millis(2500));
    }

    #[test]
    fn validate_rejects_relative_endpoints() {
        assert!(SyncConfig::default().validate().is_ok());
        let cfg = SyncConfig {
            storage_url: "/srv/storage".to_string(),
            ..SyncConfig::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("STORAGE_URL"));
    }
}
