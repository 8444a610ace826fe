//! End-to-end processing cycles driven from a configuration file.

use std::io::Write;
use tempfile::NamedTempFile;

use boatdata_lib::chart::{ChartGeometry, ChartScaler, ChartState};
use boatdata_lib::config::Config;
use boatdata_lib::pipeline::Pipeline;
use boatdata_lib::units::{SpeedUnit, MPS_PER_KNOT};
use boatdata_lib::{BoatValue, BoatValueList, ValueFormat};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file
}

fn bus(awa_deg: f64, aws_kn: f64, stw_kn: f64, hdm_deg: f64, var_deg: f64) -> BoatValueList {
    [
        BoatValue::new("AWA", ValueFormat::Wind).with_value(awa_deg.to_radians()),
        BoatValue::new("AWS", ValueFormat::Knots).with_value(aws_kn * MPS_PER_KNOT),
        BoatValue::new("STW", ValueFormat::Knots).with_value(stw_kn * MPS_PER_KNOT),
        BoatValue::new("HDM", ValueFormat::Course).with_value(hdm_deg.to_radians()),
        BoatValue::new("VAR", ValueFormat::Wind).with_value(var_deg.to_radians()),
    ]
    .into_iter()
    .collect()
}

/// Calibration in user units from the file reaches the derived wind.
#[test]
fn configured_calibration_applies_in_user_units() {
    let file = config_file(
        r#"
[units]
speed = "kn"
wind_speed = "kn"

[[calibration]]
instance = "AWA"
offset = -10.0

[[calibration]]
instance = "STW"
slope = 1.0
offset = 1.0

[history]
capacity = 120
tracked = ["TWD", "TWS", "STW"]
"#,
    );
    let config = Config::try_load_from_path(file.path()).unwrap();
    assert_eq!(config.units.speed, SpeedUnit::Knots);
    let mut pipeline = Pipeline::from_config(&config);

    // HDM 355° + VAR 5° gives true heading 0°
    let values = pipeline.process_cycle(&bus(55.0, 10.0, 4.0, 355.0, 5.0));

    assert!((values.get("AWA").unwrap().to_degrees() - 45.0).abs() < 1e-9);
    assert!((values.get("STW").unwrap() / MPS_PER_KNOT - 5.0).abs() < 1e-9);
    assert!((values.get("TWD").unwrap().to_degrees() - 73.675).abs() < 1e-2);
    assert!((values.get("TWS").unwrap() / MPS_PER_KNOT - 7.3681).abs() < 1e-3);

    let history = pipeline.history();
    assert_eq!(history.buffer("STW").unwrap().capacity(), 120);
    assert_eq!(history.buffer("STW").unwrap().last(), Some(2572));
    assert!(history.buffer("AWS").is_none());
}

/// A wind outage without simulation adds no samples to history.
#[test]
fn outage_without_simulation_adds_no_samples() {
    let mut config = Config::default();
    config.history.tracked = vec!["TWD".to_string()];
    config.chart.axis_length = 100;
    config.chart.value_length = 120;
    config.chart.reserved_margin = 20;
    let mut pipeline = Pipeline::from_config(&config);

    for cycle in 0..30 {
        let mut raw = bus(45.0, 10.0, 5.0, 0.0, 0.0);
        if (10..15).contains(&cycle) {
            raw.find_mut("AWA").unwrap().invalidate();
        }
        pipeline.process_cycle(&raw);
    }

    let twd = pipeline.history().buffer("TWD").unwrap();
    assert_eq!(twd.len(), 25);
    assert_eq!(twd.total_added(), 25);

    let mut scaler = ChartScaler::for_buffer(ChartGeometry::from(&config.chart), twd, config.chart.interval);
    let frame = scaler.update(twd).unwrap();
    assert_eq!(scaler.state(), ChartState::RangeStable);
    assert_eq!(frame.points, 25);
    assert_eq!(frame.splits, 0);
    // Without simulation the outage is simply missing time, so the line is continuous
    assert!(frame.range.mid.to_degrees() > 60.0 && frame.range.mid.to_degrees() < 80.0);
}

/// With simulation on, history keeps moving through an outage.
#[test]
fn simulation_fills_outage() {
    let file = config_file(
        r#"
simulation = true

[history]
tracked = ["TWS", "DBT"]
"#,
    );
    let config = Config::try_load_from_path(file.path()).unwrap();
    let mut pipeline = Pipeline::from_config(&config);

    for _ in 0..5 {
        pipeline.process_cycle(&BoatValueList::new());
    }
    let history = pipeline.history();
    assert_eq!(history.buffer("TWS").unwrap().len(), 5);
    let depth = history.buffer("DBT").unwrap().median().unwrap();
    let depth = history.buffer("DBT").unwrap().to_si(depth);
    assert!((18.0..=28.0).contains(&depth));
}

/// Repeated cycles keep a centred wind chart stable across the 0° boundary.
#[test]
fn northerly_wind_chart_stays_centred() {
    let mut config = Config::default();
    config.history.tracked = vec!["TWD".to_string()];
    let mut pipeline = Pipeline::from_config(&config);

    // Wind backs and veers around north: TWD swings about 350..10°
    for cycle in 0..120 {
        let twd = 10.0 * (cycle as f64 / 10.0).sin();
        let mut raw = BoatValueList::new();
        raw.upsert(BoatValue::new("TWD", ValueFormat::Course).with_value(twd.to_radians().rem_euclid(std::f64::consts::TAU)));
        pipeline.process_cycle(&raw);
    }

    let twd = pipeline.history().buffer("TWD").unwrap();
    let mut scaler = ChartScaler::for_buffer(ChartGeometry::from(&config.chart), twd, 1);
    let frame = scaler.update(twd).unwrap();

    assert!(frame.range.mid.abs() < 1e-9 || (frame.range.mid - std::f64::consts::TAU).abs() < 1e-9);
    assert!((frame.range.span.to_degrees() - 120.0).abs() < 1e-6);
    assert_eq!(frame.splits, 0);
}
