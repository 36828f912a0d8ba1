//! Progress reporting utilities for long-running operations
//!
//! Chunked tables have no known row count up front, so their progress is
//! reported as rows seen on a spinner-style bar.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Style for the rows-processed bar of a chunked table
pub const CHUNK_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] {human_pos} rows ({per_sec}) {msg}";

/// Create a bar counting processed rows of a chunked table
///
/// # Arguments
/// * `description` - Message shown next to the counter
/// * `visible` - A hidden bar is returned when false, so callers need no branching
#[must_use]
pub fn create_chunk_progress_bar(description: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template(CHUNK_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(description.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Finish a progress bar with a completion message
///
/// # Arguments
/// * `pb` - The `ProgressBar` to finish
/// * `message` - Optional completion message
pub fn finish_progress_bar(pb: &ProgressBar, message: Option<&str>) {
    if let Some(msg) = message {
        pb.finish_with_message(msg.to_string());
    } else {
        pb.finish();
    }
}
