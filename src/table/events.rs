//! Lab and chart events
//!
//! Both tables are far larger than the others and are streamed in chunks.
//! Their dates are always re-based; whether invalid results disqualify a
//! patient is decided by the configured [`EventDatePolicy`].

use super::{Table, TableProcessor};
use crate::config::EventDatePolicy;
use crate::rebase::DateRule;

const DATE_COLUMNS: &[&str] = &["charttime", "storetime"];

#[derive(Debug, Clone, Copy)]
pub struct EventsProcessor {
    table: Table,
    policy: EventDatePolicy,
}

impl EventsProcessor {
    #[must_use]
    pub const fn lab_events(policy: EventDatePolicy) -> Self {
        Self {
            table: Table::LabEvents,
            policy,
        }
    }

    #[must_use]
    pub const fn chart_events(policy: EventDatePolicy) -> Self {
        Self {
            table: Table::ChartEvents,
            policy,
        }
    }

    #[must_use]
    pub const fn policy(&self) -> EventDatePolicy {
        self.policy
    }
}

impl TableProcessor for EventsProcessor {
    fn table(&self) -> Table {
        self.table
    }

    fn date_columns(&self) -> &'static [&'static str] {
        DATE_COLUMNS
    }

    fn date_rules(&self) -> Vec<DateRule> {
        match self.policy {
            EventDatePolicy::Ignore => Vec::new(),
            EventDatePolicy::Disqualify => DATE_COLUMNS
                .iter()
                .copied()
                .map(DateRule::optional)
                .collect(),
        }
    }
}
