use crate::utils::{Dataset, column, disqualified, header, subjects};
use mimic_rebase::synth::validate_national_id;
use mimic_rebase::utils::io::read_subject_ids;
use mimic_rebase::{EventDatePolicy, PipelineDriver, Result, Table};

/// Full run over the standard dataset
#[test]
fn test_full_run_keeps_tables_consistent() -> Result<()> {
    let dataset = Dataset::new();
    let mut driver = PipelineDriver::new(dataset.config())?;
    let summary = driver.run(Table::Patients)?;

    // Patient 4's admission lands on 2018-02-29, patient 2 has no ICU outtime
    assert_eq!(disqualified(&summary, Table::Patients), Vec::<i64>::new());
    assert_eq!(disqualified(&summary, Table::Admissions), vec![4]);
    assert_eq!(disqualified(&summary, Table::IcuStays), vec![2]);
    assert_eq!(summary.outcomes.len(), 5);

    let patients = dataset.output(Table::Patients);
    assert_eq!(subjects(&patients), vec![1, 3]);
    for table in Table::ALL {
        let ids = subjects(&dataset.output(table));
        assert!(
            ids.iter().all(|id| [1, 3].contains(id)),
            "{table} references purged patients: {ids:?}"
        );
    }

    let side_file = read_subject_ids(&dataset.output_dir().join("pp-subject-ids.json"))?;
    let mut retained: Vec<i64> = side_file.into_iter().collect();
    retained.sort_unstable();
    assert_eq!(retained, vec![1, 3]);

    assert_eq!(summary.rows_purged(Table::Patients), 2);
    assert_eq!(summary.rows_purged(Table::Admissions), 1);
    Ok(())
}

#[test]
fn test_patients_are_enriched_and_rebased() -> Result<()> {
    let dataset = Dataset::new();
    PipelineDriver::new(dataset.config())?.run(Table::Patients)?;

    let path = dataset.output(Table::Patients);
    let header = header(&path);
    assert_eq!(
        &header[header.len() - 5..],
        ["chosen_anchor_year", "real_age", "national_id", "name", "ethnicity"]
    );
    assert_eq!(column(&path, "chosen_anchor_year"), ["2008", "2012"]);
    assert_eq!(column(&path, "real_age"), ["68", "57"]);
    assert_eq!(column(&path, "ethnicity"), ["white", "unknown"]);
    assert_eq!(column(&path, "dod"), ["", "2013-05-01"]);
    // Untouched source columns
    assert_eq!(column(&path, "anchor_year"), ["2150", "2160"]);
    assert_eq!(column(&path, "anchor_year_group"), ["2008 - 2010", "2011 - 2013"]);

    for id in column(&path, "national_id") {
        assert!(validate_national_id(&id), "invalid national id {id}");
    }
    Ok(())
}

#[test]
fn test_dates_are_rebased_per_patient() -> Result<()> {
    let dataset = Dataset::new();
    PipelineDriver::new(dataset.config())?.run(Table::Patients)?;

    let admissions = dataset.output(Table::Admissions);
    assert_eq!(column(&admissions, "hadm_id"), ["100"]);
    assert_eq!(column(&admissions, "admittime"), ["2008-03-01 10:00:00"]);
    assert_eq!(column(&admissions, "dischtime"), ["2008-03-05 12:00:00"]);
    assert_eq!(column(&admissions, "admission_type"), ["ew emer."]);
    assert_eq!(column(&admissions, "marital_status"), ["married"]);
    // Not normalized
    assert_eq!(column(&admissions, "ethnicity"), ["WHITE"]);

    let icustays = dataset.output(Table::IcuStays);
    assert_eq!(column(&icustays, "intime"), ["2008-03-01 12:00:00"]);
    assert_eq!(column(&icustays, "los"), ["2.0"]);

    let labevents = dataset.output(Table::LabEvents);
    assert_eq!(column(&labevents, "labevent_id"), ["1", "3", "4"]);
    assert_eq!(
        column(&labevents, "charttime"),
        ["2008-03-01 11:00:00", "2012-02-29 07:00:00", "2008-03-02 07:00:00"]
    );
    assert_eq!(column(&labevents, "storetime"), ["2008-03-01 12:00:00", "", "2008-03-02 08:00:00"]);
    assert_eq!(column(&labevents, "value"), ["1.1", "98, fasting", "105"]);

    let chartevents = dataset.output(Table::ChartEvents);
    assert_eq!(
        column(&chartevents, "charttime"),
        ["2008-03-01 13:00:00", "2013-02-28 01:00:00", "2008-03-01 14:00:00"]
    );
    Ok(())
}

#[test]
fn test_invalid_event_dates_are_kept_by_default() -> Result<()> {
    let dataset = Dataset::new();
    dataset.append(Table::ChartEvents, crate::utils::INVALID_CHART_EVENT);

    let summary = PipelineDriver::new(dataset.config())?.run(Table::Patients)?;

    assert!(disqualified(&summary, Table::ChartEvents).is_empty());
    let chartevents = dataset.output(Table::ChartEvents);
    assert_eq!(column(&chartevents, "charttime").last().unwrap(), "2010-02-29 02:00:00");
    assert_eq!(subjects(&dataset.output(Table::Patients)), vec![1, 3]);
    Ok(())
}

#[test]
fn test_invalid_event_dates_cascade_when_disqualifying() -> Result<()> {
    let dataset = Dataset::new();
    dataset.append(Table::ChartEvents, crate::utils::INVALID_CHART_EVENT);
    let config = dataset
        .config()
        .with_event_date_policy(EventDatePolicy::Disqualify);

    let summary = PipelineDriver::new(config)?.run(Table::Patients)?;

    assert_eq!(disqualified(&summary, Table::ChartEvents), vec![1]);
    // The first chunk of chart events was already written with patient 1's rows
    for table in Table::ALL {
        let ids = subjects(&dataset.output(table));
        assert!(!ids.contains(&1), "{table} still references patient 1");
    }
    assert_eq!(subjects(&dataset.output(Table::Patients)), vec![3]);
    assert_eq!(column(&dataset.output(Table::LabEvents), "labevent_id"), ["3"]);

    // Emptied tables keep their header
    let admissions = dataset.read_output(Table::Admissions);
    assert_eq!(
        admissions,
        "subject_id,hadm_id,admittime,dischtime,deathtime,admission_type,marital_status,ethnicity,edregtime,edouttime\n"
    );

    let retained = read_subject_ids(&dataset.output_dir().join("pp-subject-ids.json"))?;
    assert_eq!(retained.into_iter().collect::<Vec<_>>(), vec![3]);
    Ok(())
}

#[test]
fn test_seeded_runs_are_reproducible() -> Result<()> {
    let first = Dataset::new();
    let second = Dataset::new();
    PipelineDriver::new(first.config())?.run(Table::Patients)?;
    PipelineDriver::new(second.config())?.run(Table::Patients)?;

    assert_eq!(
        first.read_output(Table::Patients),
        second.read_output(Table::Patients)
    );
    Ok(())
}

/// Same real anchor year, three different synthetic anchor years
#[test]
fn test_shared_anchor_year_rebases_to_each_chosen_year() -> Result<()> {
    let dataset = Dataset::new();
    dataset.write(
        Table::Patients,
        "\
subject_id,gender,anchor_age,anchor_year,anchor_year_group,dod
1,M,40,2150,2148 - 2150,
2,F,50,2150,2149 - 2151,
3,M,60,2150,2150 - 2151,
",
    );
    dataset.write(
        Table::Admissions,
        "\
subject_id,hadm_id,admittime,dischtime,deathtime,admission_type,marital_status,ethnicity,edregtime,edouttime
1,10,2150-01-10 00:00:00,2150-01-12 00:00:00,,URGENT,,WHITE,,
2,20,2150-01-10 00:00:00,2150-01-12 00:00:00,,URGENT,,BLACK,,
3,30,2150-01-10 00:00:00,2150-01-12 00:00:00,,URGENT,,ASIAN,,
",
    );
    dataset.write(
        Table::IcuStays,
        "subject_id,hadm_id,stay_id,first_careunit,intime,outtime,los\n",
    );
    dataset.write(
        Table::LabEvents,
        "labevent_id,subject_id,hadm_id,itemid,charttime,storetime,value,valuenum\n",
    );
    dataset.write(
        Table::ChartEvents,
        "subject_id,hadm_id,stay_id,charttime,storetime,itemid,value,valuenum\n",
    );

    let config = dataset.config().with_reference_year(2200);
    let summary = PipelineDriver::new(config)?.run(Table::Patients)?;

    assert!(summary.disqualified().is_empty());
    let patients = dataset.output(Table::Patients);
    assert_eq!(column(&patients, "chosen_anchor_year"), ["2148", "2149", "2150"]);

    let admissions = dataset.output(Table::Admissions);
    assert_eq!(subjects(&admissions), vec![1, 2, 3]);
    assert_eq!(
        column(&admissions, "admittime"),
        ["2148-01-10 00:00:00", "2149-01-10 00:00:00", "2150-01-10 00:00:00"]
    );
    assert_eq!(
        column(&admissions, "dischtime"),
        ["2148-01-12 00:00:00", "2149-01-12 00:00:00", "2150-01-12 00:00:00"]
    );
    assert!(subjects(&dataset.output(Table::IcuStays)).is_empty());
    Ok(())
}
