//! Upstream catalog listing: item shape and the first-page fetcher.

pub mod provider;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

pub use provider::GogCatalogProvider;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPrice {
    /// Formatted final price with currency prefix, e.g. `"R$59.90"`.
    #[serde(rename = "final", default)]
    pub final_price: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogGenre {
    pub name: String,
}

/// One product entry of the listing. Absent or `null` lists deserialize as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub price: Option<CatalogPrice>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub genres: Vec<CatalogGenre>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub developers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub publishers: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub operating_systems: Vec<String>,
    /// Cover URL, possibly carrying a `_{formatter}` token.
    #[serde(default)]
    pub cover_horizontal: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub screenshots: Vec<String>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

impl CatalogItem {
    pub fn formatted_price(&self) -> Option<&str> {
        self.price.as_ref().and_then(|p| p.final_price.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CatalogEnvelope {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub products: Vec<CatalogItem>,
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// First listing page, in upstream order.
    async fn fetch_page(&self) -> Result<Vec<CatalogItem>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_listing_envelope() {
        let body = r#"{
            "pages": 3,
            "products": [{
                "id": "1207658924",
                "title": "The Witcher 3: Wild Hunt",
                "slug": "the_witcher_3_wild_hunt",
                "price": {"final": "R$59.90", "base": "R$129.99"},
                "releaseDate": "2015.05.18",
                "genres": [{"name": "Role-playing", "slug": "rpg"}],
                "developers": ["CD PROJEKT RED"],
                "publishers": ["CD PROJEKT RED"],
                "operatingSystems": ["windows"],
                "coverHorizontal": "https://images.gog-statics.com/abc.png",
                "screenshots": ["https://images.gog-statics.com/s1_{formatter}.jpg"]
            }, {
                "title": "Sparse",
                "slug": "sparse"
            }]
        }"#;
        let env: CatalogEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(env.products.len(), 2);
        let first = &env.products[0];
        assert_eq!(first.formatted_price(), Some("R$59.90"));
        assert_eq!(first.genres[0].name, "Role-playing");
        assert_eq!(first.operating_systems, vec!["windows"]);
        assert_eq!(first.screenshots.len(), 1);

        let sparse = &env.products[1];
        assert!(sparse.developers.is_empty());
        assert!(sparse.formatted_price().is_none());
        assert!(sparse.cover_horizontal.is_none());
    }

    #[test]
    fn null_lists_do_not_reject_the_page() {
        let body = r#"{"products": [
            {"title": "Good", "slug": "good", "developers": ["Acme"]},
            {"title": "Odd", "slug": "odd", "screenshots": null, "developers": null,
             "genres": null, "publishers": null, "operatingSystems": null}
        ]}"#;
        let env: CatalogEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(env.products.len(), 2);
        assert_eq!(env.products[0].developers, vec!["Acme"]);
        let odd = &env.products[1];
        assert!(odd.screenshots.is_empty());
        assert!(odd.developers.is_empty());
        assert!(odd.genres.is_empty());
        assert!(odd.operating_systems.is_empty());
    }
}
