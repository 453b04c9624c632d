//! Setup of the `tracing` subscriber used by all binaries.

use std::fs;
use std::path::Path;

use exn::{Exn, OptionExt as _, ResultExt as _};
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;

use crate::error::ErrorMessage;

/// Map the number of `-v` flags to the most verbose level that gets recorded.
pub const fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the global subscriber.
///
/// Without a log file, events go to stderr. With a log file, everything down to the chosen level
/// is appended to that file by a background writer. The returned guard flushes that writer when
/// dropped, so it must be kept alive until the program ends.
pub fn init(verbosity: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>, Exn<ErrorMessage>> {
    let level = level_for(verbosity);

    let Some(log_file) = log_file else {
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let err = || {
        let path = log_file.display();
        ErrorMessage::new(format!("Could not log to \"{path}\""))
    };

    let file_name = log_file.file_name().ok_or_raise(err)?;
    let dir = match log_file.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).or_raise(err)?;

    let appender = tracing_appender::rolling::never(dir, file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}
