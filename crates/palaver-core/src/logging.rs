//! Tracing setup.
//!
//! The TUI owns the terminal, so log output goes to a file under
//! `${PALAVER_HOME}/logs/` instead of stderr.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::paths;

/// Environment variable holding a filter directive; wins over the config value.
pub const LOG_ENV: &str = "PALAVER_LOG";

const DEFAULT_DIRECTIVE: &str = "palaver=info";
const LOG_FILE: &str = "palaver.log";

/// Builds the filter from `PALAVER_LOG`, then `configured`, then the default.
///
/// An unparsable directive falls through to the next source.
pub fn build_filter(env_value: Option<&str>, configured: Option<&str>) -> EnvFilter {
    [env_value, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .find_map(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber writing to `${PALAVER_HOME}/logs/palaver.log`.
///
/// Returns the appender guard; dropping it flushes and stops the writer, so
/// the caller keeps it alive for the whole process. Returns `None` when the
/// log directory cannot be created or a subscriber is already installed.
pub fn init(configured: Option<&str>) -> Option<WorkerGuard> {
    init_in(&paths::logs_dir(), configured)
}

/// Same as [`init`] with an explicit log directory.
pub fn init_in(dir: &Path, configured: Option<&str>) -> Option<WorkerGuard> {
    if std::fs::create_dir_all(dir).is_err() {
        return None;
    }

    let env_value = std::env::var(LOG_ENV).ok();
    let filter = build_filter(env_value.as_deref(), configured);

    let appender = tracing_appender::rolling::never(dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .ok()?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "palaver starting");
    Some(guard)
}
