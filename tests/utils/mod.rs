use std::fs;
use std::path::{Path, PathBuf};

use arrow::array::Array;
use mimic_rebase::utils::arrow::{string_column, subject_ids};
use mimic_rebase::utils::io::CsvTable;
use mimic_rebase::{PipelineConfig, RunSummary, Table};
use tempfile::TempDir;

pub const PATIENTS: &str = "\
subject_id,gender,anchor_age,anchor_year,anchor_year_group,dod
1,M,52,2150,2008 - 2010,
2,F,60,2153,2017 - 2019,
3,M,45,2160,2011 - 2013,2161-05-01
4,F,30,2170,2014 - 2016,
";

pub const ADMISSIONS: &str = "\
subject_id,hadm_id,admittime,dischtime,deathtime,admission_type,marital_status,ethnicity,edregtime,edouttime
1,100,2150-03-01 10:00:00,2150-03-05 12:00:00,,EW EMER.,MARRIED,WHITE,,
2,200,2153-06-01 08:00:00,2153-06-02 08:00:00,,URGENT,SINGLE,OTHER,2153-06-01 06:00:00,2153-06-01 07:30:00
4,400,2172-02-29 09:00:00,2172-03-02 09:00:00,,ELECTIVE,,ASIAN,,
4,401,2173-01-01 09:00:00,2173-01-03 09:00:00,,ELECTIVE,,ASIAN,,
9,900,2150-01-01 00:00:00,2150-01-02 00:00:00,,URGENT,,WHITE,,
";

pub const ICUSTAYS: &str = "\
subject_id,hadm_id,stay_id,first_careunit,intime,outtime,los
1,100,1000,MICU,2150-03-01 12:00:00,2150-03-03 12:00:00,2.0
2,200,2000,SICU,2153-06-01 09:00:00,,
4,400,4000,MICU,2172-02-29 10:00:00,2172-03-01 10:00:00,1.0
";

pub const LABEVENTS: &str = "\
labevent_id,subject_id,hadm_id,itemid,charttime,storetime,value,valuenum
1,1,100,50912,2150-03-01 11:00:00,2150-03-01 12:00:00,1.1,1.1
2,2,200,50912,2153-06-01 09:00:00,2153-06-01 10:00:00,0.9,0.9
3,3,,50931,2160-02-29 07:00:00,,\"98, fasting\",98
4,1,100,50931,2150-03-02 07:00:00,2150-03-02 08:00:00,105,105
5,4,400,50912,2172-02-29 11:00:00,2172-02-29 12:00:00,0.8,0.8
";

pub const CHARTEVENTS: &str = "\
subject_id,hadm_id,stay_id,charttime,storetime,itemid,value,valuenum
1,100,1000,2150-03-01 13:00:00,2150-03-01 13:05:00,220045,80,80
3,,,2161-02-28 01:00:00,2161-02-28 01:10:00,220045,72,72
1,100,1000,2150-03-01 14:00:00,,220045,82,82
";

/// A chart event of patient 1 that lands on 2010-02-29 once re-based
pub const INVALID_CHART_EVENT: &str = "1,100,1000,2152-02-29 02:00:00,,220045,90,90\n";

/// A scratch dataset root with its own output directory
pub struct Dataset {
    dir: TempDir,
}

impl Dataset {
    /// Write the standard tables
    #[must_use]
    pub fn new() -> Self {
        let dataset = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        dataset.write(Table::Patients, PATIENTS);
        dataset.write(Table::Admissions, ADMISSIONS);
        dataset.write(Table::IcuStays, ICUSTAYS);
        dataset.write(Table::LabEvents, LABEVENTS);
        dataset.write(Table::ChartEvents, CHARTEVENTS);
        dataset
    }

    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("mimic")
    }

    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }

    pub fn write(&self, table: Table, contents: &str) {
        let path = self.root().join(table.source_relative_path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    pub fn append(&self, table: Table, contents: &str) {
        let path = self.root().join(table.source_relative_path());
        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str(contents);
        fs::write(path, text).unwrap();
    }

    pub fn remove(&self, table: Table) {
        fs::remove_file(self.root().join(table.source_relative_path())).unwrap();
    }

    /// Seeded, quiet configuration with small chunks
    #[must_use]
    pub fn config(&self) -> PipelineConfig {
        PipelineConfig::new(self.root())
            .with_output_dir(self.output_dir())
            .with_chunk_size(2)
            .with_seed(42)
            .with_reference_year(2024)
            .with_progress(false)
    }

    #[must_use]
    pub fn output(&self, table: Table) -> PathBuf {
        self.output_dir().join(table.output_file_name())
    }

    #[must_use]
    pub fn read_output(&self, table: Table) -> String {
        fs::read_to_string(self.output(table)).unwrap()
    }
}

/// Column names of a CSV file, in order
#[must_use]
pub fn header(path: &Path) -> Vec<String> {
    CsvTable::open(path, "test")
        .unwrap()
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect()
}

/// Values of one named column, with empty cells as `""`
#[must_use]
pub fn column(path: &Path, name: &str) -> Vec<String> {
    let batch = CsvTable::open(path, "test").unwrap().read_all().unwrap();
    let values = string_column(&batch, "test", name).unwrap();
    (0..values.len())
        .map(|row| {
            if values.is_null(row) {
                String::new()
            } else {
                values.value(row).to_string()
            }
        })
        .collect()
}

/// Sorted distinct subject identifiers of an output
#[must_use]
pub fn subjects(path: &Path) -> Vec<i64> {
    let batch = CsvTable::open(path, "test").unwrap().read_all().unwrap();
    let mut ids = subject_ids(&batch, "test").unwrap();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Sorted disqualified identifiers reported for one stage
#[must_use]
pub fn disqualified(summary: &RunSummary, table: Table) -> Vec<i64> {
    let mut ids: Vec<i64> = summary
        .outcome(table)
        .unwrap()
        .disqualified
        .iter()
        .copied()
        .collect();
    ids.sort_unstable();
    ids
}
