//! Table processors
//!
//! One processor per source table. Each knows its date columns, which of them
//! must come out as valid dates, and any field normalization; the shared
//! [`process_table`] function does the loading, restriction to known
//! patients, re-basing, validation and writing.
//!
//! Available tables:
//! - patients: enrichment with synthetic identities, `dod` re-basing
//! - admissions: admit/discharge/death/ED times, lower-cased categoricals
//! - icustays: ICU in/out times
//! - labevents, chartevents: chunked, chart/store times

pub mod admissions;
pub mod events;
pub mod icustays;
pub mod patients;

use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use log::{debug, info};

use crate::anchor::AnchorMapping;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::filter::{BatchFilter, SubjectFilter, SubjectSet};
use crate::rebase::{DateRule, adjust_year_column, disqualified_subjects, invalid_row_mask};
use crate::utils::arrow::{SUBJECT_ID, replace_column, string_column, subject_ids};
use crate::utils::io::{CsvTable, TableWriter, write_table};
use crate::utils::logging::{
    create_chunk_progress_bar, finish_progress_bar, log_operation_complete, log_operation_start,
    log_warning,
};

pub use admissions::AdmissionsProcessor;
pub use events::EventsProcessor;
pub use icustays::IcuStaysProcessor;
pub use patients::{PatientsProcessor, process_patients};

/// The source tables, in pipeline dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Patients,
    Admissions,
    IcuStays,
    LabEvents,
    ChartEvents,
}

impl Table {
    pub const ALL: [Self; 5] = [
        Self::Patients,
        Self::Admissions,
        Self::IcuStays,
        Self::LabEvents,
        Self::ChartEvents,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Patients => "patients",
            Self::Admissions => "admissions",
            Self::IcuStays => "icustays",
            Self::LabEvents => "labevents",
            Self::ChartEvents => "chartevents",
        }
    }

    /// Path of the raw table relative to the dataset root
    #[must_use]
    pub const fn source_relative_path(self) -> &'static str {
        match self {
            Self::Patients => "core/patients.csv",
            Self::Admissions => "core/admissions.csv",
            Self::IcuStays => "icu/icustays.csv",
            Self::LabEvents => "hosp/labevents.csv",
            Self::ChartEvents => "icu/chartevents.csv",
        }
    }

    #[must_use]
    pub const fn output_file_name(self) -> &'static str {
        match self {
            Self::Patients => "pp-patients.csv",
            Self::Admissions => "pp-admissions.csv",
            Self::IcuStays => "pp-icustays.csv",
            Self::LabEvents => "pp-labevents.csv",
            Self::ChartEvents => "pp-chartevents.csv",
        }
    }

    /// Streamed in bounded chunks instead of loaded in full
    #[must_use]
    pub const fn is_chunked(self) -> bool {
        matches!(self, Self::LabEvents | Self::ChartEvents)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|table| table.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "unknown table '{s}' (expected one of: {})",
                    Self::ALL.iter().map(|t| t.name()).join(", ")
                )
            })
    }
}

/// Result of one table pass
#[derive(Debug, Clone)]
pub struct TableOutcome {
    pub table: Table,
    pub output: PathBuf,
    /// Rows in the source table
    pub rows_in: usize,
    /// Rows written to the output
    pub rows_out: usize,
    /// Patients whose rebased dates in this table were invalid
    pub disqualified: SubjectSet,
}

/// Per-table behaviour plugged into [`process_table`]
pub trait TableProcessor {
    fn table(&self) -> Table;

    /// Columns holding `"<year>-<rest>"` values to re-base
    fn date_columns(&self) -> &'static [&'static str];

    /// Rebased columns that must hold valid dates
    fn date_rules(&self) -> Vec<DateRule>;

    /// Free-text columns normalized after re-basing
    fn normalized_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Every column the processor reads
    fn required_columns(&self) -> Vec<&'static str> {
        std::iter::once(SUBJECT_ID)
            .chain(self.date_columns().iter().copied())
            .chain(self.normalized_columns().iter().copied())
            .unique()
            .collect()
    }

    /// Field normalization applied after re-basing
    fn normalize(&self, batch: RecordBatch) -> Result<RecordBatch> {
        Ok(batch)
    }
}

/// Re-base, normalize and validate one batch of known patients
///
/// Returns the batch without the rows of disqualified patients, and the set
/// of those patients.
pub fn rebase_batch(
    processor: &dyn TableProcessor,
    batch: &RecordBatch,
    anchors: &AnchorMapping,
) -> Result<(RecordBatch, SubjectSet)> {
    let table = processor.table().name();
    let ids = subject_ids(batch, table)?;
    let pairs = anchors.pairs_for(&ids, table)?;

    let mut rebased = batch.clone();
    for column in processor.date_columns() {
        let values = string_column(&rebased, table, column)?;
        let (adjusted, malformed) = adjust_year_column(values, &pairs);
        if malformed > 0 {
            debug!("{malformed} values of {table}.{column} have no numeric year");
        }
        rebased = replace_column(&rebased, table, column, Arc::new(adjusted))?;
    }

    let normalized = processor.normalize(rebased)?;

    let mask = invalid_row_mask(&normalized, table, &processor.date_rules())?;
    let disqualified = disqualified_subjects(&normalized, table, &mask)?;
    let cleaned = SubjectFilter::exclude(&disqualified, table).filter(&normalized)?;

    Ok((cleaned, disqualified))
}

/// Run one table through the pipeline and write its output
///
/// Rows of patients outside `retained` are dropped silently. Chunked tables
/// are streamed with `config.chunk_size` rows at a time; if a chunked pass
/// fails, its partial output is deleted before the error is returned.
pub fn process_table(
    processor: &dyn TableProcessor,
    config: &PipelineConfig,
    anchors: &AnchorMapping,
    retained: &SubjectSet,
) -> Result<TableOutcome> {
    let table = processor.table();
    let start = Instant::now();
    let source_path = config.source_path(table);
    let output = config.output_path(table);
    log_operation_start(&format!("Processing {table} from"), &source_path);

    let source = CsvTable::open(&source_path, table.name())?;
    source.require_columns(&processor.required_columns())?;

    let outcome = if table.is_chunked() {
        let result = process_chunked(processor, &source, config, anchors, retained, output.clone());
        if result.is_err() && output.exists() {
            log_warning("Discarding partial output", Some(&output));
            let _ = fs::remove_file(&output);
        }
        result?
    } else {
        let batch = source.read_all()?;
        let rows_in = batch.num_rows();
        let known = SubjectFilter::retain(retained, table.name()).filter(&batch)?;
        let (cleaned, disqualified) = rebase_batch(processor, &known, anchors)?;
        let rows_out = write_table(&output, &cleaned)?;

        TableOutcome {
            table,
            output,
            rows_in,
            rows_out,
            disqualified,
        }
    };

    log_operation_complete(
        "Wrote",
        &outcome.output,
        outcome.rows_out,
        Some(start.elapsed()),
    );
    if !outcome.disqualified.is_empty() {
        info!(
            "{} patients disqualified by invalid dates in {table}",
            outcome.disqualified.len()
        );
    }
    Ok(outcome)
}

fn process_chunked(
    processor: &dyn TableProcessor,
    source: &CsvTable,
    config: &PipelineConfig,
    anchors: &AnchorMapping,
    retained: &SubjectSet,
    output: PathBuf,
) -> Result<TableOutcome> {
    let table = processor.table();
    let progress = create_chunk_progress_bar(table.name(), config.show_progress);
    let retain = SubjectFilter::retain(retained, table.name());

    let mut writer = TableWriter::create(&output, source.schema())?;
    let mut disqualified = SubjectSet::default();
    let mut rows_in = 0;

    for (index, chunk) in source.chunks(config.chunk_size)?.enumerate() {
        let chunk = chunk?;
        rows_in += chunk.num_rows();

        let known = retain.filter(&chunk)?;
        let (cleaned, found) = rebase_batch(processor, &known, anchors)?;
        disqualified.extend(found);

        // Patients disqualified in an earlier chunk stay out of later ones
        let cleaned = SubjectFilter::exclude(&disqualified, table.name()).filter(&cleaned)?;
        writer.write(&cleaned)?;

        debug!(
            "{table} chunk {index}: {} rows in, {} rows out",
            chunk.num_rows(),
            cleaned.num_rows()
        );
        progress.inc(chunk.num_rows() as u64);
    }

    let rows_out = writer.finish()?;
    finish_progress_bar(&progress, Some(&format!("{table}: {rows_out} rows written")));

    Ok(TableOutcome {
        table,
        output,
        rows_in,
        rows_out,
        disqualified,
    })
}
