//! Patients
//!
//! The patients pass is the root of every run: it picks each patient's
//! synthetic anchor year, attaches a synthetic identity and ethnicity, re-bases
//! the date of death and yields the anchor mapping every later table uses.

use std::slice;
use std::time::Instant;

use arrow::array::{Array, StringArray};
use arrow::record_batch::RecordBatch;
use log::info;
use rustc_hash::FxHashMap;

use super::{Table, TableOutcome, TableProcessor, rebase_batch};
use crate::anchor::{ANCHOR_YEAR, ANCHOR_YEAR_GROUP, AnchorMapping, CHOSEN_ANCHOR_YEAR, choose_best_year};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::rebase::DateRule;
use crate::synth::{IdentityGenerator, Sex};
use crate::utils::arrow::{SUBJECT_ID, parse_identifier, string_column, subject_ids, with_string_columns};
use crate::utils::io::{CsvTable, write_table};
use crate::utils::logging::{log_operation_complete, log_operation_start};

const DATE_COLUMNS: &[&str] = &["dod"];
const SOURCE_COLUMNS: &[&str] = &[
    SUBJECT_ID,
    "gender",
    "anchor_age",
    ANCHOR_YEAR,
    ANCHOR_YEAR_GROUP,
    "dod",
];

/// Admissions columns the ethnicity is taken from, in order of preference
const ETHNICITY_COLUMNS: &[&str] = &["ethnicity", "race"];

pub const UNKNOWN_ETHNICITY: &str = "unknown";

#[derive(Debug, Clone, Copy, Default)]
pub struct PatientsProcessor;

impl TableProcessor for PatientsProcessor {
    fn table(&self) -> Table {
        Table::Patients
    }

    fn date_columns(&self) -> &'static [&'static str] {
        DATE_COLUMNS
    }

    fn date_rules(&self) -> Vec<DateRule> {
        vec![DateRule::optional("dod")]
    }

    fn required_columns(&self) -> Vec<&'static str> {
        SOURCE_COLUMNS.to_vec()
    }
}

/// Lower-case an ethnicity, folding the non-answers into `unknown`
#[must_use]
pub fn normalize_ethnicity(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "" | "other" | "unable to obtain" => UNKNOWN_ETHNICITY.to_string(),
        _ => lowered,
    }
}

/// Map each subject to the ethnicity of its admissions
///
/// When a patient has several admissions the last one read wins.
pub fn ethnicity_mapping(config: &PipelineConfig) -> Result<FxHashMap<i64, String>> {
    let table = Table::Admissions.name();
    let source = CsvTable::open(&config.source_path(Table::Admissions), table)?;
    source.require_columns(&[SUBJECT_ID])?;

    let schema = source.schema();
    let column = ETHNICITY_COLUMNS
        .iter()
        .find(|column| schema.index_of(column).is_ok())
        .ok_or_else(|| PipelineError::missing_column(table, ETHNICITY_COLUMNS[0]))?;

    let batch = source.read_all()?;
    let ids = subject_ids(&batch, table)?;
    let values = string_column(&batch, table, column)?;

    let mut mapping = FxHashMap::default();
    for (row, id) in ids.into_iter().enumerate() {
        let ethnicity = if values.is_null(row) {
            UNKNOWN_ETHNICITY.to_string()
        } else {
            normalize_ethnicity(values.value(row))
        };
        mapping.insert(id, ethnicity);
    }
    Ok(mapping)
}

/// Append `chosen_anchor_year`, `real_age`, `national_id`, `name` and `ethnicity`
///
/// `real_age` is the patient's age in `reference_year` when their anchor age
/// is pinned to the chosen anchor year; the synthetic national ID encodes the
/// matching birth year.
pub fn enrich_patients(
    batch: &RecordBatch,
    ethnicities: &FxHashMap<i64, String>,
    generator: &mut IdentityGenerator,
    reference_year: i32,
) -> Result<RecordBatch> {
    let table = Table::Patients.name();
    let ids = subject_ids(batch, table)?;
    let genders = string_column(batch, table, "gender")?;
    let ages = string_column(batch, table, "anchor_age")?;
    let groups = string_column(batch, table, ANCHOR_YEAR_GROUP)?;

    let rows = batch.num_rows();
    let mut chosen_years = Vec::with_capacity(rows);
    let mut real_ages = Vec::with_capacity(rows);
    let mut national_ids = Vec::with_capacity(rows);
    let mut names = Vec::with_capacity(rows);
    let mut ethnicity = Vec::with_capacity(rows);

    for (row, id) in ids.into_iter().enumerate() {
        let group = required_value(groups, row, ANCHOR_YEAR_GROUP)?;
        let chosen = choose_best_year(group)
            .ok_or_else(|| PipelineError::invalid_value(table, ANCHOR_YEAR_GROUP, group))?;

        let raw_age = required_value(ages, row, "anchor_age")?;
        let anchor_age = parse_identifier(raw_age)
            .and_then(|age| i32::try_from(age).ok())
            .ok_or_else(|| PipelineError::invalid_value(table, "anchor_age", raw_age))?;

        let raw_gender = required_value(genders, row, "gender")?;
        let sex: Sex = raw_gender
            .parse()
            .map_err(|_| PipelineError::invalid_value(table, "gender", raw_gender))?;

        let real_age = reference_year - chosen + anchor_age;
        let birth_year = reference_year - real_age;
        let identity = generator.identity(birth_year, sex).ok_or_else(|| {
            PipelineError::invalid_value(table, "anchor_age", raw_age)
        })?;

        chosen_years.push(chosen.to_string());
        real_ages.push(real_age.to_string());
        national_ids.push(identity.national_id);
        names.push(identity.name);
        ethnicity.push(
            ethnicities
                .get(&id)
                .cloned()
                .unwrap_or_else(|| UNKNOWN_ETHNICITY.to_string()),
        );
    }

    with_string_columns(
        batch,
        vec![
            (CHOSEN_ANCHOR_YEAR, StringArray::from(chosen_years)),
            ("real_age", StringArray::from(real_ages)),
            ("national_id", StringArray::from(national_ids)),
            ("name", StringArray::from(names)),
            ("ethnicity", StringArray::from(ethnicity)),
        ],
    )
}

/// Run the patients pass and return the anchor mapping of the kept patients
pub fn process_patients(
    config: &PipelineConfig,
    generator: &mut IdentityGenerator,
) -> Result<(TableOutcome, AnchorMapping)> {
    let table = Table::Patients;
    let start = Instant::now();
    let source_path = config.source_path(table);
    let output = config.output_path(table);
    log_operation_start("Processing patients from", &source_path);

    let ethnicities = ethnicity_mapping(config)?;

    let source = CsvTable::open(&source_path, table.name())?;
    source.require_columns(&PatientsProcessor.required_columns())?;
    let batch = source.read_all()?;
    let rows_in = batch.num_rows();

    let enriched = enrich_patients(&batch, &ethnicities, generator, config.reference_year)?;
    let mut anchors = AnchorMapping::from_batches(slice::from_ref(&enriched), table.name())?;

    let (cleaned, disqualified) = rebase_batch(&PatientsProcessor, &enriched, &anchors)?;
    anchors.remove_all(&disqualified);
    let rows_out = write_table(&output, &cleaned)?;

    log_operation_complete("Wrote", &output, rows_out, Some(start.elapsed()));
    if !disqualified.is_empty() {
        info!(
            "{} patients disqualified by an invalid date of death",
            disqualified.len()
        );
    }

    Ok((
        TableOutcome {
            table,
            output,
            rows_in,
            rows_out,
            disqualified,
        },
        anchors,
    ))
}

fn required_value<'a>(array: &'a StringArray, row: usize, column: &str) -> Result<&'a str> {
    if array.is_null(row) {
        return Err(PipelineError::invalid_value(Table::Patients.name(), column, ""));
    }
    Ok(array.value(row))
}
