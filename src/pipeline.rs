//! Pipeline driver
//!
//! This module runs the table passes in dependency order, feeds each pass's
//! disqualified patients to the cascade purger and keeps the anchor mapping
//! and retained subject set in step with what has been purged.

use std::fs;
use std::slice;
use std::time::{Duration, Instant};

use log::info;

use crate::anchor::AnchorMapping;
use crate::config::PipelineConfig;
use crate::error::{IoResultExt, Result};
use crate::filter::SubjectSet;
use crate::purge::{CascadePurger, PurgeReport};
use crate::synth::IdentityGenerator;
use crate::table::{
    AdmissionsProcessor, EventsProcessor, IcuStaysProcessor, Table, TableOutcome, TableProcessor,
    process_patients, process_table,
};
use crate::utils::io::{
    CsvTable, read_subject_ids, require_file, validate_directory, write_subject_ids,
};
use crate::utils::logging::log_warning;

/// What a pipeline run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Outcome of every stage that ran, in order
    pub outcomes: Vec<TableOutcome>,
    /// Rows removed from finalized outputs by cascade purges
    pub purges: Vec<PurgeReport>,
    pub elapsed: Duration,
}

impl RunSummary {
    #[must_use]
    pub fn outcome(&self, table: Table) -> Option<&TableOutcome> {
        self.outcomes.iter().find(|o| o.table == table)
    }

    /// Patients disqualified across all stages
    #[must_use]
    pub fn disqualified(&self) -> SubjectSet {
        self.outcomes
            .iter()
            .flat_map(|o| o.disqualified.iter().copied())
            .collect()
    }

    /// Rows purged from the output of `table` over the whole run
    #[must_use]
    pub fn rows_purged(&self, table: Table) -> usize {
        self.purges
            .iter()
            .filter(|p| p.table == table)
            .map(|p| p.rows_removed)
            .sum()
    }

    pub fn log(&self) {
        for outcome in &self.outcomes {
            info!(
                "{}: {} rows in, {} rows out, {} patients disqualified, {} rows purged later",
                outcome.table,
                outcome.rows_in,
                outcome.rows_out,
                outcome.disqualified.len(),
                self.rows_purged(outcome.table)
            );
        }
        info!(
            "Pipeline finished in {:?}: {} stages, {} patients disqualified",
            self.elapsed,
            self.outcomes.len(),
            self.disqualified().len()
        );
    }
}

/// Runs the table passes and the cascade purge
#[derive(Debug)]
pub struct PipelineDriver {
    config: PipelineConfig,
    purger: CascadePurger,
    generator: IdentityGenerator,
}

impl PipelineDriver {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let purger = CascadePurger::new(config.chunk_size);
        let generator = IdentityGenerator::new(config.seed);
        Ok(Self {
            config,
            purger,
            generator,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage from `from` onwards
    ///
    /// Starting after the patients stage resumes from the finalized outputs
    /// of a previous run in the output directory.
    pub fn run(&mut self, from: Table) -> Result<RunSummary> {
        let start = Instant::now();
        validate_directory(self.config.root())?;
        fs::create_dir_all(&self.config.output_dir).with_path(&self.config.output_dir)?;
        info!(
            "Running pipeline from {from} over {}",
            self.config.root().display()
        );

        let mut outcomes = Vec::new();
        let mut purges = Vec::new();

        let mut anchors = if from == Table::Patients {
            let (outcome, anchors) = process_patients(&self.config, &mut self.generator)?;
            self.purger.register(Table::Patients, outcome.output.clone());
            outcomes.push(outcome);
            anchors
        } else {
            self.resume(from)?
        };

        let upstream: [&dyn TableProcessor; 2] = [&AdmissionsProcessor, &IcuStaysProcessor];
        for processor in upstream {
            let table = processor.table();
            if table < from {
                continue;
            }
            let retained = anchors.subjects();
            let outcome = process_table(processor, &self.config, &anchors, &retained)?;
            purges.extend(self.purger.purge(&outcome.disqualified)?);
            self.purger.register(table, outcome.output.clone());
            anchors.remove_all(&outcome.disqualified);
            outcomes.push(outcome);
        }

        let ids_path = self.config.subject_ids_path();
        if from <= Table::IcuStays {
            write_subject_ids(&ids_path, &anchors.subjects())?;
        }
        let mut retained = read_subject_ids(&ids_path)?;
        let unknown: SubjectSet = anchors
            .subjects()
            .into_iter()
            .filter(|id| !retained.contains(id))
            .collect();
        anchors.remove_all(&unknown);
        // Ids purged from the patients output after the side file was written
        retained.retain(|id| anchors.contains(*id));

        let policy = self.config.event_date_policy;
        let events = [
            EventsProcessor::lab_events(policy),
            EventsProcessor::chart_events(policy),
        ];
        for processor in &events {
            let table = processor.table();
            if table < from {
                continue;
            }
            let outcome = process_table(processor, &self.config, &anchors, &retained)?;
            self.purger.register(table, outcome.output.clone());
            if !outcome.disqualified.is_empty() {
                // Also reaches rows of earlier chunks of this same table
                purges.extend(self.purger.purge(&outcome.disqualified)?);
                retained.retain(|id| !outcome.disqualified.contains(id));
                anchors.remove_all(&outcome.disqualified);
                write_subject_ids(&ids_path, &retained)?;
            }
            outcomes.push(outcome);
        }

        Ok(RunSummary {
            outcomes,
            purges,
            elapsed: start.elapsed(),
        })
    }

    /// Rebuild the anchor mapping and purger registry from finalized outputs
    fn resume(&mut self, from: Table) -> Result<AnchorMapping> {
        let patients = self.config.output_path(Table::Patients);
        require_file(&patients)?;
        info!("Resuming from finalized {}", patients.display());

        let batch = CsvTable::open(&patients, Table::Patients.name())?.read_all()?;
        let anchors = AnchorMapping::from_batches(slice::from_ref(&batch), Table::Patients.name())?;

        for table in Table::ALL.into_iter().filter(|t| *t < from) {
            let output = self.config.output_path(table);
            if table.is_chunked() {
                if output.is_file() {
                    self.purger.register(table, output);
                } else {
                    log_warning(&format!("No finalized {table} output"), Some(&output));
                }
            } else {
                require_file(&output)?;
                self.purger.register(table, output);
            }
        }
        Ok(anchors)
    }
}
