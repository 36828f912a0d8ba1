//! Calendar validity of rebased date columns.

use arrow::array::{Array, BooleanArray};
use arrow::record_batch::RecordBatch;
use chrono::{NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::filter::SubjectSet;
use crate::utils::arrow::{string_column, subject_ids};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Whether a string names a real calendar date or date-time
///
/// A leap day moved onto a common year (`"2019-02-29"`) is rejected.
#[must_use]
pub fn is_valid_datetime(value: &str) -> bool {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .any(|format| NaiveDateTime::parse_from_str(value, format).is_ok())
        || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
}

/// A column whose rebased values must be valid dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRule {
    pub column: &'static str,
    /// Null counts as invalid when set; otherwise only non-null values are checked
    pub required: bool,
}

impl DateRule {
    #[must_use]
    pub const fn required(column: &'static str) -> Self {
        Self {
            column,
            required: true,
        }
    }

    #[must_use]
    pub const fn optional(column: &'static str) -> Self {
        Self {
            column,
            required: false,
        }
    }
}

/// Mark the rows breaking at least one rule
///
/// # Errors
///
/// Fails only when a rule names a column the batch does not have.
pub fn invalid_row_mask(batch: &RecordBatch, table: &str, rules: &[DateRule]) -> Result<BooleanArray> {
    let mut invalid = vec![false; batch.num_rows()];

    for rule in rules {
        let column = string_column(batch, table, rule.column)?;
        for (row, flag) in invalid.iter_mut().enumerate() {
            if *flag {
                continue;
            }
            *flag = if column.is_null(row) {
                rule.required
            } else {
                !is_valid_datetime(column.value(row))
            };
        }
    }

    Ok(BooleanArray::from(invalid))
}

/// Collect the owners of the rows flagged in `mask`
pub fn disqualified_subjects(
    batch: &RecordBatch,
    table: &str,
    mask: &BooleanArray,
) -> Result<SubjectSet> {
    if mask.true_count() == 0 {
        return Ok(SubjectSet::default());
    }

    let ids = subject_ids(batch, table)?;
    Ok(ids
        .into_iter()
        .enumerate()
        .filter(|(row, _)| mask.value(*row))
        .map(|(_, id)| id)
        .collect())
}
