//! Subject filtering
//!
//! Keeps or drops rows by their `subject_id`. Restricting event tables to the
//! retained patients and purging disqualified patients both go through here.

use arrow::array::{Array, BooleanArray};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashSet;

use crate::error::{PipelineError, Result};
use crate::filter::core::{BatchFilter, filter_record_batch};
use crate::utils::arrow::{SUBJECT_ID, parse_identifier, string_column};

/// A set of patient identifiers
pub type SubjectSet = FxHashSet<i64>;

/// Whether matching rows are kept or dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubjectFilterMode {
    /// Keep only rows whose subject is in the set
    Retain,
    /// Drop rows whose subject is in the set
    Exclude,
}

/// A filter over the `subject_id` column
#[derive(Debug, Clone)]
pub struct SubjectFilter<'a> {
    subjects: &'a SubjectSet,
    mode: SubjectFilterMode,
    table: &'a str,
}

impl<'a> SubjectFilter<'a> {
    /// Keep rows of known subjects; rows of unknown subjects are silently dropped
    #[must_use]
    pub const fn retain(subjects: &'a SubjectSet, table: &'a str) -> Self {
        Self {
            subjects,
            mode: SubjectFilterMode::Retain,
            table,
        }
    }

    /// Drop rows of the given subjects
    #[must_use]
    pub const fn exclude(subjects: &'a SubjectSet, table: &'a str) -> Self {
        Self {
            subjects,
            mode: SubjectFilterMode::Exclude,
            table,
        }
    }

    /// Build the keep-mask for a batch
    ///
    /// # Errors
    /// Fails if the batch has no `subject_id` column or an identifier is not an integer
    pub fn mask(&self, batch: &RecordBatch) -> Result<BooleanArray> {
        let ids = string_column(batch, self.table, SUBJECT_ID)?;
        let mut keep = Vec::with_capacity(ids.len());

        for row in 0..ids.len() {
            if ids.is_null(row) {
                return Err(PipelineError::invalid_value(self.table, SUBJECT_ID, ""));
            }
            let raw = ids.value(row);
            let id = parse_identifier(raw)
                .ok_or_else(|| PipelineError::invalid_value(self.table, SUBJECT_ID, raw))?;
            let member = self.subjects.contains(&id);
            keep.push(match self.mode {
                SubjectFilterMode::Retain => member,
                SubjectFilterMode::Exclude => !member,
            });
        }

        Ok(BooleanArray::from(keep))
    }
}

impl BatchFilter for SubjectFilter<'_> {
    fn filter(&self, batch: &RecordBatch) -> Result<RecordBatch> {
        // Nothing to drop
        if self.mode == SubjectFilterMode::Exclude && self.subjects.is_empty() {
            return Ok(batch.clone());
        }
        let mask = self.mask(batch)?;
        filter_record_batch(batch, &mask)
    }

    fn required_column(&self) -> &str {
        SUBJECT_ID
    }
}
