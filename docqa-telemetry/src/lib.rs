//! # docqa-telemetry
//!
//! Tracing subscriber setup shared by docqa binaries.
//!
//! Both initializers honor `RUST_LOG` and fall back to `info` when it is unset
//! or invalid. Calling either one more than once is harmless: only the first
//! call installs a subscriber.
//!
//! ```rust
//! docqa_telemetry::init_telemetry("docqa");
//! tracing::info!("ready");
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info";

/// Build the env filter, falling back to `default` when `RUST_LOG` is unusable.
pub fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install a human-readable subscriber writing to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_telemetry(service: &str) -> bool {
    let installed = tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(service, "telemetry initialized");
    }
    installed
}

/// Install a subscriber emitting one JSON object per event to stderr.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_json_telemetry(service: &str) -> bool {
    let installed = tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .try_init()
        .is_ok();
    if installed {
        tracing::debug!(service, format = "json", "telemetry initialized");
    }
    installed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init_telemetry("test");
        assert!(!init_telemetry("test"));
        assert!(!init_json_telemetry("test"));
    }

    #[tokio::test]
    async fn test_logging_after_init_does_not_panic() {
        init_json_telemetry("test");
        tracing::info!(chunk_count = 3, "indexed");
    }
}
