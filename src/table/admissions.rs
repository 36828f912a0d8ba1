//! Hospital admissions

use arrow::record_batch::RecordBatch;

use super::{Table, TableProcessor};
use crate::error::Result;
use crate::rebase::DateRule;
use crate::utils::arrow::lowercase_column;

const DATE_COLUMNS: &[&str] = &["admittime", "dischtime", "deathtime", "edregtime", "edouttime"];
const LOWERCASE_COLUMNS: &[&str] = &["admission_type", "marital_status"];

#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionsProcessor;

impl TableProcessor for AdmissionsProcessor {
    fn table(&self) -> Table {
        Table::Admissions
    }

    fn date_columns(&self) -> &'static [&'static str] {
        DATE_COLUMNS
    }

    fn date_rules(&self) -> Vec<DateRule> {
        vec![
            DateRule::required("admittime"),
            DateRule::required("dischtime"),
            DateRule::optional("deathtime"),
            DateRule::optional("edregtime"),
            DateRule::optional("edouttime"),
        ]
    }

    fn normalized_columns(&self) -> &'static [&'static str] {
        LOWERCASE_COLUMNS
    }

    fn normalize(&self, batch: RecordBatch) -> Result<RecordBatch> {
        LOWERCASE_COLUMNS.iter().try_fold(batch, |batch, column| {
            lowercase_column(&batch, self.table().name(), column)
        })
    }
}
