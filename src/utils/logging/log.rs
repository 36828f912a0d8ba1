//! Logging utilities
//!
//! `env_logger` setup and the message formats shared by every table pass.

use std::path::Path;
use std::time::Duration;

use log::{info, warn};

/// Initialise `env_logger`, defaulting to `info` when `RUST_LOG` is unset
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .try_init();
}

/// Log the start of a pass over a file
pub fn log_operation_start(operation: &str, path: &Path) {
    info!("{operation} {}", path.display());
}

/// Log the rows a pass over a file handled, with the throughput when timed
///
/// # Arguments
/// * `operation` - What was done, e.g. `"Wrote"`
/// * `path` - File that was read or written
/// * `rows` - Number of rows handled
/// * `elapsed` - Optional elapsed time
pub fn log_operation_complete(operation: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(elapsed) if !elapsed.is_zero() => {
            #[allow(clippy::cast_precision_loss)]
            let rate = rows as f64 / elapsed.as_secs_f64();
            info!(
                "{operation} {rows} rows of {} in {elapsed:.2?} ({rate:.0} rows/s)",
                path.display()
            );
        }
        _ => info!("{operation} {rows} rows of {}", path.display()),
    }
}

/// Warn about a file, or about the run as a whole when `path` is `None`
pub fn log_warning(message: &str, path: Option<&Path>) {
    match path {
        Some(path) => warn!("{message}: {}", path.display()),
        None => warn!("{message}"),
    }
}
