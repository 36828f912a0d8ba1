//! ICU stays

use super::{Table, TableProcessor};
use crate::rebase::DateRule;

const DATE_COLUMNS: &[&str] = &["intime", "outtime"];

#[derive(Debug, Clone, Copy, Default)]
pub struct IcuStaysProcessor;

impl TableProcessor for IcuStaysProcessor {
    fn table(&self) -> Table {
        Table::IcuStays
    }

    fn date_columns(&self) -> &'static [&'static str] {
        DATE_COLUMNS
    }

    fn date_rules(&self) -> Vec<DateRule> {
        vec![DateRule::required("intime"), DateRule::required("outtime")]
    }
}
