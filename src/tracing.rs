use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Directives appended to every fallback filter; the pool and HTTP stacks are chatty at info.
const QUIET_DEPENDENCIES: &[&str] = &["sqlx=warn", "hyper=warn", "reqwest=warn"];

/// Sets up the global tracing subscriber with a fmt formatter and env filter.
///
/// `RUST_LOG` wins when set. Otherwise `default_filter` is used, extended with
/// [`QUIET_DEPENDENCIES`] for any crate the caller did not mention.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(fallback_filter(default_filter)));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

fn fallback_filter(default_filter: &str) -> String {
    let mut directives: Vec<String> = default_filter
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();
    for quiet in QUIET_DEPENDENCIES {
        let krate = quiet.split('=').next().unwrap_or_default();
        if !directives.iter().any(|d| d.starts_with(krate)) {
            directives.push((*quiet).to_string());
        }
    }
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::fallback_filter;

    #[test]
    fn appends_quiet_directives_once() {
        assert_eq!(
            fallback_filter("info"),
            "info,sqlx=warn,hyper=warn,reqwest=warn"
        );
        assert_eq!(
            fallback_filter("debug, sqlx=info"),
            "debug,sqlx=info,hyper=warn,reqwest=warn"
        );
    }
}
