//! A Rust library for re-basing MIMIC-IV style clinical tables onto synthetic
//! anchor years, with cross-table purging of patients whose re-based dates are
//! invalid.

pub mod anchor;
pub mod config;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod pipeline;
pub mod purge;
pub mod rebase;
pub mod synth;
pub mod table;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use anchor::{AnchorMapping, AnchorPair};
pub use config::{EventDatePolicy, PipelineConfig};
pub use error::{PipelineError, Result};
pub use pipeline::{PipelineDriver, RunSummary};
pub use purge::{CascadePurger, PurgeReport};
pub use table::{Table, TableOutcome, TableProcessor};

// Arrow types
pub use arrow::record_batch::RecordBatch;

// Filtering capabilities
pub use filter::{SubjectFilter, SubjectSet};

// Re-basing
pub use rebase::{adjust_year, is_valid_datetime};
