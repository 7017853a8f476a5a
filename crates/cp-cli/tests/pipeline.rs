//! End-to-end tests: CSV inputs in, CSV outputs out.

use std::fs;
use std::path::Path;

fn write_inputs(dir: &Path, nodes: &str, arcs: &str, od_pairs: &str, params: &str) {
    fs::write(dir.join("nodes.csv"), nodes).unwrap();
    fs::write(dir.join("arcs.csv"), arcs).unwrap();
    fs::write(dir.join("od_pairs.csv"), od_pairs).unwrap();
    fs::write(dir.join("parameters.json"), params).unwrap();
}

#[test]
fn min_cost_run_builds_the_charging_stop() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    // One pair that can only be driven with a recharge at station 2.
    write_inputs(
        input.path(),
        "ID,TYPE,COST\n1,SITE,0\n2,STATION,5\n3,SITE,0\n",
        "TAIL_ID,HEAD_ID,TIME,DISTANCE\n1,2,100,100\n2,3,100,20\n",
        "ORIGIN_ID,DESTINATION_ID,DEMAND\n1,3,1\n",
        "{}",
    );

    cp_cli::run(input.path(), output.path()).unwrap();

    let stations = fs::read_to_string(output.path().join("stations.csv")).unwrap();
    let mut lines = stations.lines();
    assert_eq!(lines.next().unwrap(), "ID,TYPE,DEMAND,ENERGY");
    let row = lines.next().expect("station 2 must be built");
    assert!(row.starts_with("2,STATION,1,"));

    let coverage = fs::read_to_string(output.path().join("od_coverage.csv")).unwrap();
    let row = coverage.lines().nth(1).unwrap();
    // FEASIBLE, STATIONS, FUEL_STOPS
    assert!(row.contains("true,2,1,"));

    let unknown = fs::read_to_string(output.path().join("unknown_sites.csv")).unwrap();
    assert_eq!(unknown.trim(), "ID");
}

#[test]
fn unknown_od_endpoints_are_reported() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    write_inputs(
        input.path(),
        "ID,TYPE,COST\n1,SITE,0\n3,SITE,0\n",
        "TAIL_ID,HEAD_ID,TIME,DISTANCE\n1,3,10,10\n",
        "ORIGIN_ID,DESTINATION_ID\n1,3\n1,99\n",
        "{}",
    );

    cp_cli::run(input.path(), output.path()).unwrap();

    let unknown = fs::read_to_string(output.path().join("unknown_sites.csv")).unwrap();
    assert_eq!(unknown.trim(), "ID\n99");

    // The valid pair is still processed.
    let coverage = fs::read_to_string(output.path().join("od_coverage.csv")).unwrap();
    assert_eq!(coverage.lines().count(), 2);
}

#[test]
fn direct_site_to_site_arcs_do_not_count() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();

    // Site-to-site arcs are filtered out; without a station the pair is
    // infeasible even though a direct arc exists in the input.
    write_inputs(
        input.path(),
        "ID,TYPE,COST\n1,SITE,0\n3,SITE,0\n",
        "TAIL_ID,HEAD_ID,TIME,DISTANCE\n1,3,10,10\n",
        "ORIGIN_ID,DESTINATION_ID\n1,3\n",
        "{}",
    );

    cp_cli::run(input.path(), output.path()).unwrap();

    let coverage = fs::read_to_string(output.path().join("od_coverage.csv")).unwrap();
    let row = coverage.lines().nth(1).unwrap();
    assert!(row.contains("false"));
}

#[test]
fn missing_input_file_fails() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    fs::write(input.path().join("nodes.csv"), "ID,TYPE,COST\n1,SITE,0\n").unwrap();

    let err = cp_cli::run(input.path(), output.path()).unwrap_err();
    assert!(format!("{err:#}").contains("arcs.csv"));
}

#[test]
fn invalid_parameters_fail() {
    let input = tempfile::tempdir().unwrap();
    let output = tempfile::tempdir().unwrap();
    write_inputs(
        input.path(),
        "ID,TYPE,COST\n1,SITE,0\n",
        "TAIL_ID,HEAD_ID,TIME,DISTANCE\n",
        "ORIGIN_ID,DESTINATION_ID\n",
        r#"{ "dev_factor": 0.2 }"#,
    );
    assert!(cp_cli::run(input.path(), output.path()).is_err());
}
