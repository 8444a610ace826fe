//! Tests of the simulator binary's argument handling and synthetic bus.

use boatdata_lib::config::Config;
use boatdata_lib::pipeline::Pipeline;

use crate::{parse_args, SyntheticBus, DEFAULT_CYCLES};

fn args(list: &[&str]) -> Vec<String> {
    std::iter::once("boatdata-sim")
        .chain(list.iter().copied())
        .map(String::from)
        .collect()
}

#[test]
fn parse_defaults() {
    let options = parse_args(&args(&[])).unwrap();
    assert!(!options.stdout);
    assert!(!options.json);
    assert_eq!(options.cycles, DEFAULT_CYCLES);
    assert_eq!(options.chart, "TWD");
}

#[test]
fn parse_modes_and_values() {
    let options = parse_args(&args(&["--stdout", "--cycles", "90", "--chart", "AWS", "--seed", "4"])).unwrap();
    assert!(options.stdout);
    assert_eq!(options.cycles, 90);
    assert_eq!(options.chart, "AWS");
    assert_eq!(options.seed, 4);

    assert!(parse_args(&args(&["--json"])).unwrap().json);
}

#[test]
fn parse_rejects_bad_input() {
    assert!(parse_args(&args(&["--cycles"])).is_err());
    assert!(parse_args(&args(&["--cycles", "many"])).is_err());
    assert!(parse_args(&args(&["--verbose"])).is_err());
}

#[test]
fn synthetic_bus_has_wind_outages() {
    let mut bus = SyntheticBus::new(3);
    assert!(bus.snapshot(0).get("AWA").is_some());
    assert!(bus.snapshot(129).get("AWS").is_some());

    let outage = bus.snapshot(140);
    assert!(outage.get("AWA").is_none());
    assert!(outage.get("AWS").is_none());
    assert!(outage.get("STW").is_some());
    assert!(outage.get("HDM").is_some());
}

#[test]
fn synthetic_run_leaves_gaps_in_history() {
    let mut pipeline = Pipeline::from_config(&Config::default());
    let mut bus = SyntheticBus::new(8);
    for cycle in 0..300 {
        pipeline.process_cycle(&bus.snapshot(cycle));
    }

    let twd = pipeline.history().buffer("TWD").unwrap();
    assert_eq!(twd.len(), 260);
    let mid = twd.to_si(twd.median().unwrap()).to_degrees();
    assert!(mid > 0.0 && mid < 360.0);
}
