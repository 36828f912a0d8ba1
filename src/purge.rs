//! Cascade purge of disqualified patients
//!
//! Every finalized output is registered with the [`CascadePurger`]. When a
//! later table disqualifies patients, their rows are removed from all
//! registered outputs so no table ever references a patient another table
//! dropped.

use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use crate::error::Result;
use crate::filter::SubjectSet;
use crate::table::Table;
use crate::utils::io::{StagedRewrite, stage_excluding};

/// Rows removed from one output by a purge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub table: Table,
    pub rows_removed: usize,
}

/// Registry of finalized outputs and the patients already purged from them
#[derive(Debug, Clone)]
pub struct CascadePurger {
    outputs: Vec<(Table, PathBuf)>,
    purged: SubjectSet,
    chunk_size: usize,
}

impl CascadePurger {
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            outputs: Vec::new(),
            purged: SubjectSet::default(),
            chunk_size,
        }
    }

    /// Register a finalized output, replacing an earlier path for the same table
    pub fn register(&mut self, table: Table, path: impl Into<PathBuf>) {
        let path = path.into();
        debug!("Registering {table} output {}", path.display());
        if let Some(entry) = self.outputs.iter_mut().find(|(t, _)| *t == table) {
            entry.1 = path;
        } else {
            self.outputs.push((table, path));
            self.outputs.sort_by_key(|(t, _)| *t);
        }
    }

    #[must_use]
    pub fn is_registered(&self, table: Table) -> bool {
        self.outputs.iter().any(|(t, _)| *t == table)
    }

    /// Registered outputs in processing order
    pub fn outputs(&self) -> impl Iterator<Item = (Table, &Path)> {
        self.outputs.iter().map(|(t, p)| (*t, p.as_path()))
    }

    /// Every patient purged so far
    #[must_use]
    pub const fn purged(&self) -> &SubjectSet {
        &self.purged
    }

    /// Remove the rows of `subjects` from every registered output
    ///
    /// Patients already purged are skipped, so a set with nothing new touches
    /// no file and returns an empty report.
    ///
    /// Filtered copies of all outputs are written first and only then swapped
    /// in, so a failure while filtering leaves every output as it was. A
    /// failed rename during the swap can leave earlier outputs purged and
    /// later ones not; rerun from the patients stage in that case.
    pub fn purge(&mut self, subjects: &SubjectSet) -> Result<Vec<PurgeReport>> {
        let fresh: SubjectSet = subjects
            .iter()
            .filter(|id| !self.purged.contains(id))
            .copied()
            .collect();
        if fresh.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let mut staged: Vec<(Table, StagedRewrite)> = Vec::with_capacity(self.outputs.len());
        for (table, path) in &self.outputs {
            match stage_excluding(path, table.name(), &fresh, self.chunk_size) {
                Ok(rewrite) => staged.push((*table, rewrite)),
                Err(e) => {
                    staged.into_iter().for_each(|(_, rewrite)| rewrite.discard());
                    return Err(e);
                }
            }
        }

        let mut reports = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();
        while let Some((table, rewrite)) = pending.next() {
            let path = rewrite.path().to_path_buf();
            let rows_removed = match rewrite.commit() {
                Ok(rows_removed) => rows_removed,
                Err(e) => {
                    pending.for_each(|(_, rewrite)| rewrite.discard());
                    return Err(e);
                }
            };
            debug!("Purged {rows_removed} rows from {}", path.display());
            reports.push(PurgeReport {
                table,
                rows_removed,
            });
        }

        self.purged.extend(fresh.iter().copied());
        info!(
            "Purged {} patients from {} outputs in {:?}",
            fresh.len(),
            reports.len(),
            start.elapsed()
        );
        Ok(reports)
    }
}
