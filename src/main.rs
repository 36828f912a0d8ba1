use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use mimic_rebase::config::{DEFAULT_CHUNK_SIZE, EventDatePolicy, PipelineConfig};
use mimic_rebase::pipeline::PipelineDriver;
use mimic_rebase::table::Table;
use mimic_rebase::utils::logging::init_logging;

#[derive(Parser)]
#[command(name = "mimic-rebase")]
#[command(about = "Re-base MIMIC-IV dates onto synthetic anchor years and purge inconsistent patients")]
#[command(version)]
struct Cli {
    /// Root directory of the MIMIC-IV dataset
    #[arg(long)]
    root: PathBuf,

    /// Rows per chunk for the lab and chart event tables
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Directory receiving the pp-*.csv outputs
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// First stage to run: patients, admissions, icustays, labevents or chartevents
    #[arg(long, default_value = "patients")]
    from_stage: Table,

    /// Seed for the synthetic identities
    #[arg(long)]
    seed: Option<u64>,

    /// Year real ages are computed against (defaults to the current year)
    #[arg(long)]
    reference_year: Option<i32>,

    /// What invalid lab/chart event dates do: ignore or disqualify
    #[arg(long, default_value = "ignore")]
    event_dates: EventDatePolicy,

    /// Hide progress bars
    #[arg(long)]
    quiet: bool,
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = PipelineConfig::new(&cli.root)
        .with_output_dir(&cli.output_dir)
        .with_chunk_size(cli.chunk_size)
        .with_event_date_policy(cli.event_dates)
        .with_progress(!cli.quiet);
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }
    if let Some(year) = cli.reference_year {
        config = config.with_reference_year(year);
    }

    let mut driver = PipelineDriver::new(config).context("invalid pipeline configuration")?;
    let summary = driver
        .run(cli.from_stage)
        .with_context(|| format!("pipeline failed for dataset {}", cli.root.display()))?;
    summary.log();
    Ok(())
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => {
            info!("Done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
