use crate::utils::Dataset;
use mimic_rebase::{PipelineDriver, PipelineError, Result, Table};

#[test]
fn test_missing_source_table_is_fatal() -> Result<()> {
    let dataset = Dataset::new();
    dataset.remove(Table::IcuStays);

    let result = PipelineDriver::new(dataset.config())?.run(Table::Patients);

    assert!(matches!(result, Err(PipelineError::MissingFile(path)) if path.ends_with("icu/icustays.csv")));
    // Earlier stages stay finalized
    assert!(dataset.output(Table::Admissions).is_file());
    assert!(!dataset.output(Table::IcuStays).exists());
    Ok(())
}

#[test]
fn test_missing_date_column_is_fatal() -> Result<()> {
    let dataset = Dataset::new();
    dataset.write(
        Table::Admissions,
        "subject_id,hadm_id,admittime,deathtime,admission_type,marital_status,ethnicity,edregtime,edouttime\n\
         1,100,2150-03-01 10:00:00,,URGENT,,WHITE,,\n",
    );

    let result = PipelineDriver::new(dataset.config())?.run(Table::Patients);

    assert!(matches!(
        result,
        Err(PipelineError::MissingColumn { ref column, .. }) if column == "dischtime"
    ));
    Ok(())
}

#[test]
fn test_failed_chunked_stage_leaves_no_partial_output() -> Result<()> {
    let dataset = Dataset::new();
    // Third chunk with the default chunk size of 2
    dataset.append(
        Table::LabEvents,
        "6,1,100,50912,2150-03-03 11:00:00,,1.0,1.0\nx,not-a-number,,50912,2150-03-03 11:00:00,,1.0,1.0\n",
    );

    let result = PipelineDriver::new(dataset.config())?.run(Table::Patients);

    assert!(matches!(result, Err(PipelineError::InvalidValue { .. })));
    assert!(!dataset.output(Table::LabEvents).exists());
    assert!(dataset.output(Table::IcuStays).is_file());
    Ok(())
}

#[test]
fn test_bad_root_is_fatal() -> Result<()> {
    let dataset = Dataset::new();
    let config = dataset.config();
    let config = mimic_rebase::PipelineConfig {
        root: config.root.join("nowhere"),
        ..config
    };

    let result = PipelineDriver::new(config)?.run(Table::Patients);
    assert!(matches!(result, Err(PipelineError::InvalidRoot(_))));
    Ok(())
}
