//! IO utilities for file operations
//!
//! This module provides utilities for checking paths and for reading and
//! writing the CSV tables and side files of a pipeline run.

pub mod csv;

use std::fs;
use std::path::Path;

use crate::error::{IoResultExt, PipelineError, Result};

pub use self::csv::{
    CsvChunks, CsvTable, DEFAULT_BATCH_SIZE, StagedRewrite, TableWriter, read_subject_ids,
    rewrite_excluding, stage_excluding, write_subject_ids, write_table,
};

/// Validates that a directory exists and is a directory
///
/// # Errors
/// Returns `InvalidRoot` if the directory does not exist or is not a directory,
/// and an IO error if it cannot be listed
pub fn validate_directory(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(PipelineError::InvalidRoot(dir.to_path_buf()));
    }
    fs::read_dir(dir).with_path(dir)?;
    Ok(())
}

/// Fail with `MissingFile` unless `path` is an existing file
pub fn require_file(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::MissingFile(path.to_path_buf()))
    }
}
