use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TASKTRACK_LOG";
pub const LOG_FILE: &str = "tasktrack.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// CLI logging goes to stderr so stdout stays parseable
pub fn init_cli_logging() {
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter())
        .try_init();
}

/// TUI logging goes to `tasktrack.log` in the store directory; the terminal
/// belongs to the UI. Keep the guard alive until exit to flush the writer.
pub fn init_tui_logging(store_dir: &Path) -> WorkerGuard {
    let appender = tracing_appender::rolling::never(store_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let _ = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_writer(writer)
        .with_env_filter(env_filter())
        .try_init();
    guard
}
