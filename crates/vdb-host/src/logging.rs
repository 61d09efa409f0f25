//! Log output for the plugin.
//!
//! The host process owns stdout/stderr, so the subscriber is only installed
//! when asked for and only once per process. The filter is read from
//! `VDB_LOG`, then `RUST_LOG`, then falls back to [`LogConfig::default_filter`].

use once_cell::sync::OnceCell;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Environment variable checked before `RUST_LOG`.
pub const LOG_ENV: &str = "VDB_LOG";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub default_filter: String,
    pub with_target: bool,
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            default_filter: "warn".to_string(),
            with_target: true,
            ansi: false,
        }
    }
}

impl LogConfig {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new(&self.default_filter))
    }
}

/// Installs a global fmt subscriber. Later calls, or a subscriber installed
/// by someone else, leave the existing one in place.
///
/// Returns `true` when this call installed the subscriber.
pub fn init(config: &LogConfig) -> bool {
    let mut installed = false;
    INSTALLED.get_or_init(|| {
        installed = tracing_subscriber::registry()
            .with(config.filter())
            .with(
                fmt::layer()
                    .with_target(config.with_target)
                    .with_ansi(config.ansi),
            )
            .try_init()
            .is_ok();
    });
    installed
}
