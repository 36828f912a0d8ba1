use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use mimic_rebase::fixture::{FixtureConfig, convert_to_fixture};
use mimic_rebase::utils::logging::init_logging;

#[derive(Parser)]
#[command(name = "csv_to_fixture")]
#[command(about = "Convert a processed CSV table into JSON-lines database fixtures")]
#[command(version)]
struct Cli {
    /// Path of the JSON conversion config
    #[arg(long)]
    config: PathBuf,

    /// Hide the progress bar
    #[arg(long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    let config = FixtureConfig::from_file(&cli.config)
        .with_context(|| format!("failed to read config {}", cli.config.display()))?;
    let summary = convert_to_fixture(&config, !cli.quiet)
        .with_context(|| format!("failed to convert {}", config.csv.display()))?;

    info!(
        "Wrote {} fixtures to {}",
        summary.rows,
        summary.output.display()
    );
    Ok(())
}
