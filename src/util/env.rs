//! Environment helpers: centralized dotenv loading and ergonomic getters.
//! Call `init_env()` once early in each binary (or rely on lazy Once).
use std::str::FromStr;
use std::sync::Once;
use tracing::{info, warn};

static INIT: Once = Once::new();

/// Load .env exactly once. Safe to call many times.
pub fn init_env() {
    INIT.call_once(|| {
        if dotenv::dotenv().is_err() {
            // Fallback to the crate root so `cargo run` from a subdirectory still works.
            let candidate = format!("{}/.env", env!("CARGO_MANIFEST_DIR"));
            let _ = dotenv::from_filename(candidate);
        }
    });
}

/// Common bootstrap for binaries:
///   * initialize dotenv/env once
///   * log which upstream/storage endpoints are overridden
pub fn bootstrap_cli(bin_name: &str) {
    init_env();

    for key in ["CATALOG_URL", "PRODUCT_PAGE_URL", "STORAGE_URL"] {
        if let Some(v) = env_opt(key) {
            info!(target = "bootstrap", bin = bin_name, key, value = %v, "endpoint override");
        }
    }
    if db_url().is_err() {
        warn!(
            target = "bootstrap",
            bin = bin_name,
            "no DATABASE_URL configured; only --dry-run runs are possible"
        );
    }
}

/// Get optional env var (None if unset or empty).
pub fn env_opt(key: &str) -> Option<String> {
    init_env();
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

/// Get parsed value with default fallback.
pub fn env_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Clone,
{
    init_env();
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Boolean flag; accepts 1/true/on/yes (case-insensitive) as true.
pub fn env_flag(key: &str, default: bool) -> bool {
    init_env();
    match std::env::var(key) {
        Ok(raw) => {
            let v = raw.trim().to_ascii_lowercase();
            matches!(v.as_str(), "1" | "true" | "on" | "yes")
        }
        Err(_) => default,
    }
}

/// Database URL (tries specific -> generic). Returns first found.
pub fn db_url() -> anyhow::Result<String> {
    for k in ["DATABASE_URL", "DB_URL"] {
        if let Some(v) = env_opt(k) {
            return Ok(v);
        }
    }
    Err(anyhow::anyhow!("no database URL env vars set"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_parse_falls_back_on_garbage() {
        std::env::set_var("CATALOG_SYNC_TEST_PARSE", "not-a-number");
        assert_eq!(env_parse("CATALOG_SYNC_TEST_PARSE", 7u32), 7);
        std::env::set_var("CATALOG_SYNC_TEST_PARSE", " 12 ");
        assert_eq!(env_parse("CATALOG_SYNC_TEST_PARSE", 7u32), 12);
    }

    #[test]
    fn env_flag_accepts_common_truthy_values() {
        std::env::set_var("CATALOG_SYNC_TEST_FLAG", "Yes");
        assert!(env_flag("CATALOG_SYNC_TEST_FLAG", false));
        std::env::set_var("CATALOG_SYNC_TEST_FLAG", "0");
        assert!(!env_flag("CATALOG_SYNC_TEST_FLAG", true));
        assert!(env_flag("CATALOG_SYNC_TEST_FLAG_UNSET", true));
    }

    #[test]
    fn env_opt_treats_blank_as_unset() {
        std::env::set_var("CATALOG_SYNC_TEST_BLANK", "   ");
        assert_eq!(env_opt("CATALOG_SYNC_TEST_BLANK"), None);
    }
}
