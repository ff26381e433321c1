//! Logging initialisation for panes.
//!
//! When `PANES_LOG=1`, structured logs are also written to `panes.log` in the
//! OS log directory and the default filter rises to `info`. Otherwise only
//! stderr output (filtered by `RUST_LOG`, default `warn`) is enabled.
//!
//! The returned guard flushes buffered file output on drop; keep it alive
//! for the duration of the process.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::paths;

pub struct LogGuard {
    _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

pub fn init() -> LogGuard {
    let file_guard = if std::env::var("PANES_LOG").as_deref() == Ok("1") {
        let dir = paths::log_dir().unwrap_or_else(|| std::path::PathBuf::from("/tmp"));
        let _ = std::fs::create_dir_all(&dir);
        let file_appender = tracing_appender::rolling::never(dir, "panes.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(file_layer)
            .init();

        Some(guard)
    } else {
        tracing_subscriber::registry()
            .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();

        None
    };

    LogGuard { _file_guard: file_guard }
}
