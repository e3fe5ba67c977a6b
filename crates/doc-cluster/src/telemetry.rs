// crates/doc-cluster/src/telemetry.rs

use tracing_subscriber::{fmt, EnvFilter};

/// Crate output at `info`, everything else only when it warns.
pub const DEFAULT_FILTER: &str = "warn,doc_cluster=info";

/// `RUST_LOG` when it holds something, otherwise [`DEFAULT_FILTER`].
pub fn filter_directives(rust_log: Option<String>) -> String {
    rust_log
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global fmt subscriber for the clustering CLI.
///
/// Timestamps are UTC RFC 3339.
/// A second call leaves the first subscriber in place.
pub fn init_tracing() {
    let directives = filter_directives(std::env::var("RUST_LOG").ok());
    let env_filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(false)
        .with_thread_names(true)
        .with_level(true)
        .compact()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_when_unset_or_blank() {
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
        assert_eq!(filter_directives(Some("  ".into())), DEFAULT_FILTER);
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_rust_log_overrides_default() {
        assert_eq!(filter_directives(Some("doc_cluster=debug".into())), "doc_cluster=debug");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing();
        init_tracing();
    }
}
