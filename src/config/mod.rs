//! Configuration for a pipeline run.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Datelike;

use crate::error::{PipelineError, Result};
use crate::table::Table;

/// Default number of rows per chunk for the event tables
pub const DEFAULT_CHUNK_SIZE: usize = 500_000;

/// File holding the retained subject identifiers read by the event stages
pub const SUBJECT_IDS_FILE: &str = "pp-subject-ids.json";

/// What to do with lab/chart event rows whose rebased dates are invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventDatePolicy {
    /// Rebase event dates but never check them
    #[default]
    Ignore,
    /// Disqualify the owning patient and cascade the purge to every output
    Disqualify,
}

impl FromStr for EventDatePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "disqualify" => Ok(Self::Disqualify),
            other => Err(format!(
                "unknown event date policy '{other}' (expected 'ignore' or 'disqualify')"
            )),
        }
    }
}

impl fmt::Display for EventDatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignore => write!(f, "ignore"),
            Self::Disqualify => write!(f, "disqualify"),
        }
    }
}

/// Configuration for the `PipelineDriver`
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory of the MIMIC-IV style dataset
    pub root: PathBuf,
    /// Directory receiving the `pp-*.csv` outputs
    pub output_dir: PathBuf,
    /// Rows per chunk for chunked tables and purge rewrites
    pub chunk_size: usize,
    /// Seed for synthetic identities; `None` draws from the OS
    pub seed: Option<u64>,
    /// Calendar year real ages and birth years are computed against
    pub reference_year: i32,
    /// Date validity handling for lab and chart events
    pub event_date_policy: EventDatePolicy,
    /// Draw progress bars while streaming chunked tables
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
            seed: None,
            reference_year: chrono::Local::now().year(),
            event_date_policy: EventDatePolicy::default(),
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    #[must_use]
    pub const fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub const fn with_reference_year(mut self, year: i32) -> Self {
        self.reference_year = year;
        self
    }

    #[must_use]
    pub const fn with_event_date_policy(mut self, policy: EventDatePolicy) -> Self {
        self.event_date_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Check the settings that do not depend on the filesystem
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(PipelineError::Config(
                "chunk size must be greater than zero".to_string(),
            ));
        }
        if !(1..=9999).contains(&self.reference_year) {
            return Err(PipelineError::Config(format!(
                "reference year {} is outside 1..=9999",
                self.reference_year
            )));
        }
        Ok(())
    }

    /// Location of a raw source table under the dataset root
    #[must_use]
    pub fn source_path(&self, table: Table) -> PathBuf {
        self.root.join(table.source_relative_path())
    }

    /// Location of a processed output table
    #[must_use]
    pub fn output_path(&self, table: Table) -> PathBuf {
        self.output_dir.join(table.output_file_name())
    }

    #[must_use]
    pub fn subject_ids_path(&self) -> PathBuf {
        self.output_dir.join(SUBJECT_IDS_FILE)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}
