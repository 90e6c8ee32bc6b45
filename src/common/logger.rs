use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the directives come from
/// [`LoggingConfig`](crate::config::LoggingConfig): a base level plus
/// optional per-target filters, e.g. level `"info"` with filters
/// `"ytstream::webm=debug,ytstream::youtube=trace"`. Does nothing if the
/// host already installed a subscriber.
pub fn init(config: &Config) {
    let logging = &config.logging;
    let directives = match (logging.level.as_deref(), logging.filters.as_deref()) {
        (Some(level), Some(filters)) => format!("{},{}", level, filters),
        (Some(level), None) => level.to_string(),
        (None, Some(filters)) => format!("info,{}", filters),
        (None, None) => "info".to_string(),
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
