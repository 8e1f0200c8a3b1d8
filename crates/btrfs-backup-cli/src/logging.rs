use std::env;

use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Set up stdout logging, plus a plain-text log file when `LOG_FILE_PATH`
/// is set. `TRACING_LEVEL` overrides the level chosen by `verbose`.
///
/// Keep the returned guard alive until exit so the file writer flushes.
pub fn init_logger(verbose: bool) -> Option<WorkerGuard> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = env::var("TRACING_LEVEL").unwrap_or_else(|_| default_level.to_string());
    let filter_layer = EnvFilter::new(filter);
    let ansi = env::var_os("NO_COLOR").is_none();

    let (file_layer, guard) = match env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let file_appender = tracing_appender::rolling::never("./", log_file_path);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = fmt::layer().with_writer(non_blocking).with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .pretty()
                .with_file(false)
                .with_line_number(false)
                .without_time()
                .with_ansi(ansi),
        )
        .with(file_layer)
        .with(filter_layer)
        .init();

    debug!(
        "Tracing is configured for stdout{}",
        if guard.is_some() { " and file logging" } else { "" }
    );

    guard
}
