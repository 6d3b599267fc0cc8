use std::sync::Once;

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static LOG_INIT: Once = Once::new();

/// Filter used when neither `RUST_LOG` nor an explicit default is provided.
const DEFAULT_FILTER: &str = "info";

/// Install the global tracing subscriber, once per process.
///
/// The `RUST_LOG` environment variable wins over `default_filter`, which in
/// turn wins over `info`. Subsequent calls are no-ops, so every test may call
/// this function without coordination.
pub fn log_init(default_filter: Option<&str>) {
    LOG_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(default_filter.unwrap_or(DEFAULT_FILTER))
        });
        tracing_setup(filter);
    });
}

fn tracing_setup(filter: EnvFilter) {
    let format = tracing_subscriber::fmt::layer()
        .with_level(true)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true)
        .compact();

    // another subscriber may already be installed by the embedding process
    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .try_init()
    {
        eprintln!("tracing subscriber already installed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::log_init;

    #[test]
    fn test_log_init_is_idempotent() {
        log_init(Some("debug"));
        log_init(None);
        tracing::debug!("logger initialized twice without panicking");
    }
}
