use crate::utils::{Dataset, INVALID_CHART_EVENT};
use mimic_rebase::{EventDatePolicy, PipelineDriver, Result, Table};

fn run_with_chunk_size(chunk_size: usize, policy: EventDatePolicy) -> Result<Vec<String>> {
    let dataset = Dataset::new();
    dataset.append(Table::ChartEvents, INVALID_CHART_EVENT);
    let config = dataset
        .config()
        .with_chunk_size(chunk_size)
        .with_event_date_policy(policy);
    PipelineDriver::new(config)?.run(Table::Patients)?;

    Ok(Table::ALL
        .into_iter()
        .map(|table| dataset.read_output(table))
        .collect())
}

/// Chunk boundaries must not show up in any output
#[test]
fn test_chunk_size_does_not_change_outputs() -> Result<()> {
    for policy in [EventDatePolicy::Ignore, EventDatePolicy::Disqualify] {
        let whole = run_with_chunk_size(1_000, policy)?;
        for chunk_size in [1, 2, 3] {
            assert_eq!(
                run_with_chunk_size(chunk_size, policy)?,
                whole,
                "chunk size {chunk_size} with policy {policy}"
            );
        }
    }
    Ok(())
}
