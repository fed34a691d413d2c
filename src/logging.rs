//! Debug logging to a file.
//!
//! The terminal is owned by the UI, so logs never go to stdout or stderr
//! while it runs.

use std::fs::OpenOptions;
use std::path::Path;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

/// Install a file subscriber at DEBUG level.
///
/// The returned guard must live until shutdown so buffered lines are flushed.
pub fn init_file_logging(path: &Path) -> std::io::Result<WorkerGuard> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name"))?;

    // rolling::never panics on an unwritable path; probe it first.
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(file_name))?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(Level::DEBUG)
        .try_init()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;
    Ok(guard)
}
