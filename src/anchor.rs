//! Per-patient anchor years
//!
//! Each patient carries the real `anchor_year` their dates were shifted
//! around and a synthetic `chosen_anchor_year` picked from their
//! `anchor_year_group`. The mapping is built once from the finalized patients
//! table and only ever shrinks during a run.

use arrow::array::Array;
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::{PipelineError, Result};
use crate::filter::SubjectSet;
use crate::utils::arrow::{parse_identifier, string_column, subject_ids};

pub const ANCHOR_YEAR: &str = "anchor_year";
pub const ANCHOR_YEAR_GROUP: &str = "anchor_year_group";
pub const CHOSEN_ANCHOR_YEAR: &str = "chosen_anchor_year";

/// The pair of years one patient's dates are rebased with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorPair {
    pub anchor_year: i32,
    pub chosen_anchor_year: i32,
}

impl AnchorPair {
    #[must_use]
    pub const fn new(anchor_year: i32, chosen_anchor_year: i32) -> Self {
        Self {
            anchor_year,
            chosen_anchor_year,
        }
    }
}

/// Leap year test for the proleptic Gregorian calendar
#[must_use]
pub const fn is_leap_year(year: i32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Pick the synthetic anchor year for an `anchor_year_group` such as `"2008 - 2010"`
///
/// The first leap year in the inclusive range wins so that shifted Feb 29
/// dates keep landing on a real day; a range without one falls back to its
/// start year.
#[must_use]
pub fn choose_best_year(anchor_year_group: &str) -> Option<i32> {
    let (start, end) = anchor_year_group.split_once('-')?;
    let start: i32 = start.trim().parse().ok()?;
    let end: i32 = end.trim().parse().ok()?;

    Some((start..=end).find(|&year| is_leap_year(year)).unwrap_or(start))
}

/// Mapping from subject identifier to its anchor pair
#[derive(Debug, Clone, Default)]
pub struct AnchorMapping {
    pairs: FxHashMap<i64, AnchorPair>,
}

impl AnchorMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the mapping from batches of the processed patients table
    ///
    /// # Errors
    ///
    /// Fails if `subject_id`, `anchor_year` or `chosen_anchor_year` is
    /// missing or holds a non-integer value.
    pub fn from_batches(batches: &[RecordBatch], table: &str) -> Result<Self> {
        let mut mapping = Self::new();
        for batch in batches {
            mapping.extend_from_batch(batch, table)?;
        }
        Ok(mapping)
    }

    /// Add the anchor pairs of one patients batch
    pub fn extend_from_batch(&mut self, batch: &RecordBatch, table: &str) -> Result<()> {
        let ids = subject_ids(batch, table)?;
        let anchors = string_column(batch, table, ANCHOR_YEAR)?;
        let chosen = string_column(batch, table, CHOSEN_ANCHOR_YEAR)?;

        for (row, id) in ids.into_iter().enumerate() {
            let anchor_year = parse_year(anchors, row, table, ANCHOR_YEAR)?;
            let chosen_anchor_year = parse_year(chosen, row, table, CHOSEN_ANCHOR_YEAR)?;
            self.insert(id, AnchorPair::new(anchor_year, chosen_anchor_year));
        }
        Ok(())
    }

    pub fn insert(&mut self, subject_id: i64, pair: AnchorPair) {
        self.pairs.insert(subject_id, pair);
    }

    #[must_use]
    pub fn get(&self, subject_id: i64) -> Option<AnchorPair> {
        self.pairs.get(&subject_id).copied()
    }

    #[must_use]
    pub fn contains(&self, subject_id: i64) -> bool {
        self.pairs.contains_key(&subject_id)
    }

    /// Drop disqualified patients
    pub fn remove_all(&mut self, subjects: &SubjectSet) {
        self.pairs.retain(|id, _| !subjects.contains(id));
    }

    /// The identifiers currently present
    #[must_use]
    pub fn subjects(&self) -> SubjectSet {
        self.pairs.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Look up the pair of every row; all identifiers must be known
    pub fn pairs_for(&self, ids: &[i64], table: &str) -> Result<Vec<AnchorPair>> {
        ids.iter()
            .map(|id| {
                self.get(*id).ok_or_else(|| {
                    PipelineError::invalid_value(table, "subject_id", id.to_string())
                })
            })
            .collect()
    }
}

fn parse_year(
    array: &arrow::array::StringArray,
    row: usize,
    table: &str,
    column: &str,
) -> Result<i32> {
    let raw = if array.is_null(row) { "" } else { array.value(row) };
    parse_identifier(raw)
        .and_then(|year| i32::try_from(year).ok())
        .ok_or_else(|| PipelineError::invalid_value(table, column, raw.trim()))
}
