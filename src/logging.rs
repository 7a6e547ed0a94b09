//! Tracing subscriber for the binary
//!
//! Human readable events go to stderr; the same events are appended as JSON
//! lines to `{data_dir}/updater.log`.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LOG_ENV, data_dir, log_path};

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file output is flushed; `None` means file logging is unavailable.
pub fn init() -> Option<WorkerGuard> {
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    let dir = data_dir();
    if let Err(e) = std::fs::create_dir_all(&dir) {
        tracing_subscriber::registry()
            .with(filter())
            .with(stderr)
            .init();
        tracing::warn!("Logging to stderr only, cannot create {:?}: {}", dir, e);
        return None;
    }

    let path = log_path();
    let file_name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_else(|| "updater.log".into());
    let appender = tracing_appender::rolling::never(&dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let file = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(writer);

    tracing_subscriber::registry()
        .with(filter())
        .with(stderr)
        .with(file)
        .init();

    Some(guard)
}
