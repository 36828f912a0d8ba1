use std::fs;

use crate::utils::{Dataset, subjects};
use mimic_rebase::{PipelineDriver, PipelineError, Result, Table};

#[test]
fn test_resume_from_event_stages_matches_full_run() -> Result<()> {
    let dataset = Dataset::new();
    PipelineDriver::new(dataset.config())?.run(Table::Patients)?;
    let labevents = dataset.read_output(Table::LabEvents);
    let chartevents = dataset.read_output(Table::ChartEvents);

    fs::remove_file(dataset.output(Table::LabEvents)).unwrap();
    fs::remove_file(dataset.output(Table::ChartEvents)).unwrap();

    let summary = PipelineDriver::new(dataset.config())?.run(Table::LabEvents)?;
    assert_eq!(
        summary.outcomes.iter().map(|o| o.table).collect::<Vec<_>>(),
        vec![Table::LabEvents, Table::ChartEvents]
    );
    assert_eq!(dataset.read_output(Table::LabEvents), labevents);
    assert_eq!(dataset.read_output(Table::ChartEvents), chartevents);
    Ok(())
}

#[test]
fn test_resume_from_icustays_reuses_finalized_patients() -> Result<()> {
    let dataset = Dataset::new();
    PipelineDriver::new(dataset.config())?.run(Table::Patients)?;
    let patients = dataset.read_output(Table::Patients);

    // Drop the rest of the run and redo it from the ICU stays
    for table in [Table::IcuStays, Table::LabEvents, Table::ChartEvents] {
        fs::remove_file(dataset.output(table)).unwrap();
    }
    let config = dataset.config().with_seed(7);
    let summary = PipelineDriver::new(config)?.run(Table::IcuStays)?;

    assert!(summary.outcome(Table::Patients).is_none());
    // Patients are not regenerated, whatever the seed
    assert_eq!(dataset.read_output(Table::Patients), patients);
    assert_eq!(subjects(&dataset.output(Table::IcuStays)), vec![1]);
    Ok(())
}

#[test]
fn test_resume_without_finalized_patients_is_fatal() -> Result<()> {
    let dataset = Dataset::new();
    let result = PipelineDriver::new(dataset.config())?.run(Table::Admissions);
    assert!(matches!(result, Err(PipelineError::MissingFile(_))));
    Ok(())
}

#[test]
fn test_resume_at_events_requires_upstream_outputs() -> Result<()> {
    let dataset = Dataset::new();
    PipelineDriver::new(dataset.config())?.run(Table::Patients)?;
    fs::remove_file(dataset.output(Table::IcuStays)).unwrap();

    let result = PipelineDriver::new(dataset.config())?.run(Table::LabEvents);
    assert!(matches!(result, Err(PipelineError::MissingFile(path)) if path.ends_with("pp-icustays.csv")));
    Ok(())
}

#[test]
fn test_resume_ignores_retained_ids_without_finalized_patients() -> Result<()> {
    let dataset = Dataset::new();
    PipelineDriver::new(dataset.config())?.run(Table::Patients)?;
    let labevents = dataset.read_output(Table::LabEvents);

    // Patient 2 was purged from pp-patients.csv but is still in the side file
    fs::write(dataset.output_dir().join("pp-subject-ids.json"), "[1,2,3]").unwrap();
    fs::remove_file(dataset.output(Table::LabEvents)).unwrap();
    fs::remove_file(dataset.output(Table::ChartEvents)).unwrap();

    PipelineDriver::new(dataset.config())?.run(Table::LabEvents)?;

    assert_eq!(dataset.read_output(Table::LabEvents), labevents);
    for table in [Table::LabEvents, Table::ChartEvents] {
        let ids = subjects(&dataset.output(table));
        assert!(!ids.contains(&2), "{table} kept patient 2: {ids:?}");
    }
    Ok(())
}
