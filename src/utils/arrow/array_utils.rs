//! Utilities for working with the string columns of CSV-backed record batches.
//!
//! Every table is read with an all-`Utf8` schema, so the helpers here only
//! deal with `StringArray`s and with rebuilding batches after a column has
//! been rewritten.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{PipelineError, Result};

/// Name of the column linking every table to its patient
pub const SUBJECT_ID: &str = "subject_id";

/// Get a column from a record batch as a `StringArray`
///
/// # Arguments
///
/// * `batch` - The record batch containing the column
/// * `table` - Table name used for error context
/// * `column_name` - The name of the column to extract
///
/// # Errors
///
/// Returns `MissingColumn` if the column is absent and a configuration error if
/// it was not read as `Utf8`.
pub fn string_column<'a>(
    batch: &'a RecordBatch,
    table: &str,
    column_name: &str,
) -> Result<&'a StringArray> {
    let idx = batch
        .schema()
        .index_of(column_name)
        .map_err(|_| PipelineError::missing_column(table, column_name))?;

    batch
        .column(idx)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| {
            PipelineError::Config(format!(
                "Column '{column_name}' of table '{table}' is not a string column"
            ))
        })
}

/// Parse the `subject_id` column of a batch into integers
///
/// Identifiers are written by pandas in some exports as `"10000032.0"`, so a
/// float with no fractional part is accepted as well.
pub fn subject_ids(batch: &RecordBatch, table: &str) -> Result<Vec<i64>> {
    let array = string_column(batch, table, SUBJECT_ID)?;
    (0..array.len())
        .map(|row| {
            if array.is_null(row) {
                return Err(PipelineError::invalid_value(table, SUBJECT_ID, ""));
            }
            parse_identifier(array.value(row))
                .ok_or_else(|| PipelineError::invalid_value(table, SUBJECT_ID, array.value(row)))
        })
        .collect()
}

/// Parse an integer identifier, tolerating a `.0` suffix
#[must_use]
pub fn parse_identifier(value: &str) -> Option<i64> {
    let value = value.trim();
    if let Ok(id) = value.parse::<i64>() {
        return Some(id);
    }
    let float = value.parse::<f64>().ok()?;
    #[allow(clippy::cast_possible_truncation)]
    (float.is_finite() && float.fract() == 0.0).then_some(float as i64)
}

/// Return a batch with one column replaced, keeping the schema unchanged
pub fn replace_column(
    batch: &RecordBatch,
    table: &str,
    column_name: &str,
    values: ArrayRef,
) -> Result<RecordBatch> {
    let idx = batch
        .schema()
        .index_of(column_name)
        .map_err(|_| PipelineError::missing_column(table, column_name))?;

    let mut columns = batch.columns().to_vec();
    columns[idx] = values;
    Ok(RecordBatch::try_new(batch.schema(), columns)?)
}

/// Return a batch with extra string columns appended after the existing ones
///
/// An existing column with the same name is overwritten in place instead, so
/// re-running enrichment over an already enriched table keeps one copy.
pub fn with_string_columns(
    batch: &RecordBatch,
    extra: Vec<(&str, StringArray)>,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();

    for (name, values) in extra {
        let values: ArrayRef = Arc::new(values);
        if let Ok(idx) = schema.index_of(name) {
            columns[idx] = values;
        } else {
            fields.push(Field::new(name, DataType::Utf8, true));
            columns.push(values);
        }
    }

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Lower-case every non-null value of a string column
pub fn lowercase_column(batch: &RecordBatch, table: &str, column_name: &str) -> Result<RecordBatch> {
    let array = string_column(batch, table, column_name)?;
    let lowered: StringArray = array
        .iter()
        .map(|value| value.map(str::to_lowercase))
        .collect();
    replace_column(batch, table, column_name, Arc::new(lowered))
}
