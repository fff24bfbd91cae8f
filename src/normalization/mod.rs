//! Pure field normalization shared by the reconciler and the game mapper.

pub mod price;
pub mod rating;
pub mod slug;

pub use price::{parse_price, parse_release_date};
pub use rating::AgeRating;
pub use slug::{product_page_slug, storage_slug, taxonomy_slug, truncate_chars};
