//! CSV to JSON-lines fixtures
//!
//! Converts a processed table into fixture objects of the form
//! `{"model": ..., "fields": {...}, "pk": ...}`, one per line, ready to be
//! loaded into the application database. A JSON config names the CSV file,
//! the model, an optional primary key column and the columns to copy.

pub mod field;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use arrow::array::Array;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{IoResultExt, PipelineError, Result};
use crate::utils::arrow::string_column;
use crate::utils::io::{CsvTable, DEFAULT_BATCH_SIZE, require_file};
use crate::utils::logging::{
    create_chunk_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
};

pub use field::{FieldSpec, FieldType};

/// Columns copied into the fixture `fields` object
#[derive(Debug, Clone, Deserialize)]
pub struct FieldsConfig {
    /// Column name to `"<type>[:<rename>]"`, in output order
    pub copy: Map<String, Value>,
}

/// Conversion settings read from the JSON config file
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureConfig {
    pub csv: PathBuf,
    pub model: String,
    #[serde(default)]
    pub pk: Option<String>,
    /// Expected row count, used for progress reporting only
    #[serde(default)]
    pub total: Option<u64>,
    pub fields: FieldsConfig,
}

impl FixtureConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        require_file(path)?;
        let file = File::open(path).with_path(path)?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    /// Parsed field specs in config order
    pub fn field_specs(&self) -> Result<Vec<FieldSpec>> {
        self.fields
            .copy
            .iter()
            .map(|(column, spec)| {
                let spec = spec.as_str().ok_or_else(|| {
                    PipelineError::Config(format!("field spec of '{column}' must be a string"))
                })?;
                FieldSpec::parse(column, spec)
            })
            .collect()
    }

    /// `<csv stem>.jsonl` next to the CSV file
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.csv.with_extension("jsonl")
    }
}

/// Result of one conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSummary {
    pub output: PathBuf,
    pub rows: usize,
}

/// Convert the configured CSV file into a JSON-lines fixture file
///
/// # Errors
/// Fails when the CSV or a named column is missing, when a row does not have
/// as many fields as the header, or when a typed value cannot be parsed.
pub fn convert_to_fixture(config: &FixtureConfig, show_progress: bool) -> Result<FixtureSummary> {
    let start = Instant::now();
    let specs = config.field_specs()?;
    let output = config.output_path();
    log_operation_start("Converting to fixtures", &config.csv);

    let source = CsvTable::open(&config.csv, &config.model)?;
    let mut required: Vec<&str> = specs.iter().map(|s| s.column.as_str()).collect();
    if let Some(pk) = &config.pk {
        required.push(pk);
    }
    source.require_columns(&required)?;

    let progress = create_chunk_progress_bar(&config.model, show_progress);
    if let Some(total) = config.total {
        progress.set_length(total);
    }

    let file = File::create(&output).with_path(&output)?;
    let mut writer = BufWriter::new(file);
    let mut rows = 0;

    for chunk in source.chunks(DEFAULT_BATCH_SIZE)? {
        let chunk = chunk?;
        let columns = specs
            .iter()
            .map(|spec| string_column(&chunk, &config.model, &spec.column))
            .collect::<Result<Vec<_>>>()?;
        let pk = config
            .pk
            .as_deref()
            .map(|pk| string_column(&chunk, &config.model, pk))
            .transpose()?;

        for row in 0..chunk.num_rows() {
            let mut fields = Map::with_capacity(specs.len());
            for (spec, values) in specs.iter().zip(&columns) {
                let value = (!values.is_null(row)).then(|| values.value(row));
                fields.insert(spec.rename.clone(), spec.convert(&config.model, value)?);
            }

            let mut fixture = Map::new();
            fixture.insert("model".to_string(), Value::String(config.model.clone()));
            fixture.insert("fields".to_string(), Value::Object(fields));
            if let Some(pk) = pk {
                let key = if pk.is_null(row) { "" } else { pk.value(row) };
                fixture.insert("pk".to_string(), Value::String(key.to_string()));
            }

            serde_json::to_writer(&mut writer, &fixture)?;
            writer.write_all(b"\n").with_path(&output)?;
        }

        rows += chunk.num_rows();
        progress.inc(chunk.num_rows() as u64);
    }

    writer.flush().with_path(&output)?;
    finish_progress_bar(&progress, Some(&format!("{rows} fixtures written")));
    log_operation_complete("Converted", &output, rows, Some(start.elapsed()));

    Ok(FixtureSummary { output, rows })
}
