//! # Processing Cycle
//!
//! [`Pipeline`] runs one tick of the instrument: calibrate and smooth the
//! provider snapshot, derive missing wind values, then record history.
//! Charts read the history buffers afterwards on their own, slower cadence.

use crate::calibration::CalibrationStore;
use crate::config::Config;
use crate::formatter::{DisplayFormatter, FormattedValue, ValueFormatter};
use crate::history::HistoryRecorder;
use crate::wind::add_winds;
use crate::BoatValueList;

/// Values that [`add_winds`] may fill in
const DERIVED: [&str; 4] = ["TWD", "TWS", "TWA", "AWD"];

/// Calibration, wind solver and history recorder for one boat.
#[derive(Debug)]
pub struct Pipeline {
    calibration: CalibrationStore,
    history: HistoryRecorder,
    formatter: DisplayFormatter,
    cycles: u64,
}

impl Pipeline {
    pub fn new(calibration: CalibrationStore, history: HistoryRecorder, formatter: DisplayFormatter) -> Self {
        Pipeline {
            calibration,
            history,
            formatter,
            cycles: 0,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            CalibrationStore::from_config(&config.calibration, &config.units),
            HistoryRecorder::from_config(&config.history, config.simulation),
            DisplayFormatter::new(config.units, config.simulation),
        )
    }

    /// Run one processing cycle on a provider snapshot.
    ///
    /// Returns the processed values: calibrated, smoothed and completed with
    /// derived wind. `raw` itself is left as the provider delivered it.
    pub fn process_cycle(&mut self, raw: &BoatValueList) -> BoatValueList {
        let mut values = raw.clone();
        for value in values.iter_mut() {
            self.calibration.process(value);
        }

        let preset: Vec<&str> = DERIVED
            .iter()
            .copied()
            .filter(|name| values.get(name).is_some())
            .collect();
        if add_winds(&mut values) {
            for name in DERIVED.iter().filter(|name| !preset.contains(name)) {
                if let Some(value) = values.find_mut(name) {
                    self.calibration.process(value);
                }
            }
        }

        let recorded = self.history.handle_cycle(&values, None, &mut self.formatter);
        self.cycles += 1;
        tracing::debug!(cycle = self.cycles, values = values.len(), recorded, "cycle complete");
        values
    }

    /// Display text for `name` out of a processed snapshot.
    pub fn format(&mut self, values: &BoatValueList, name: &str) -> Option<FormattedValue> {
        values.find(name).map(|value| self.formatter.format(value))
    }

    pub fn calibration(&self) -> &CalibrationStore {
        &self.calibration
    }

    pub fn calibration_mut(&mut self) -> &mut CalibrationStore {
        &mut self.calibration
    }

    pub fn history(&self) -> &HistoryRecorder {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut HistoryRecorder {
        &mut self.history
    }

    pub fn formatter(&self) -> &DisplayFormatter {
        &self.formatter
    }

    pub fn formatter_mut(&mut self) -> &mut DisplayFormatter {
        &mut self.formatter
    }

    /// Number of completed cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationEntry;
    use crate::config::HistoryConfig;
    use crate::simulation::Simulator;
    use crate::units::{UnitSettings, MPS_PER_KNOT};
    use crate::{BoatValue, ValueFormat};

    fn pipeline(calibration: CalibrationStore, simulation: bool) -> Pipeline {
        Pipeline::new(
            calibration,
            HistoryRecorder::from_config(&HistoryConfig::default(), simulation),
            DisplayFormatter::with_simulator(UnitSettings::default(), simulation, Simulator::seeded(9)),
        )
    }

    fn bus(awa_deg: f64, aws_kn: f64, stw_kn: f64, hdt_deg: f64) -> BoatValueList {
        [
            BoatValue::new("AWA", ValueFormat::Wind).with_value(awa_deg.to_radians()),
            BoatValue::new("AWS", ValueFormat::Knots).with_value(aws_kn * MPS_PER_KNOT),
            BoatValue::new("STW", ValueFormat::Knots).with_value(stw_kn * MPS_PER_KNOT),
            BoatValue::new("HDT", ValueFormat::Course).with_value(hdt_deg.to_radians()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_cycle_derives_and_records_true_wind() {
        let mut pipeline = pipeline(CalibrationStore::new(), false);
        let raw = bus(45.0, 10.0, 5.0, 0.0);
        let values = pipeline.process_cycle(&raw);

        let tws = values.get("TWS").unwrap();
        assert!((tws / MPS_PER_KNOT - 7.3681).abs() < 1e-3);
        assert!((values.get("TWD").unwrap().to_degrees() - 73.675).abs() < 1e-2);
        assert!(raw.find("TWD").is_none());

        let history = pipeline.history();
        for name in ["TWD", "TWS", "AWD", "AWS"] {
            assert_eq!(history.buffer(name).unwrap().len(), 1, "{name} not recorded");
        }
        let recorded = history.buffer("TWS").unwrap().get_si(0).unwrap();
        assert!((recorded - tws).abs() < 1e-3);
        assert_eq!(pipeline.cycles(), 1);
    }

    #[test]
    fn test_calibration_feeds_wind_solver() {
        let mut store = CalibrationStore::new();
        // Fix a masthead unit mounted 45° off
        store.insert("AWA", CalibrationEntry::new(-45f64.to_radians(), 1.0, 0.0));
        let mut pipeline = pipeline(store, false);

        let raw = bus(90.0, 10.0, 5.0, 0.0);
        let values = pipeline.process_cycle(&raw);
        assert!((values.get("AWA").unwrap().to_degrees() - 45.0).abs() < 1e-9);
        assert!((values.get("TWD").unwrap().to_degrees() - 73.675).abs() < 1e-2);
        assert!((raw.get("AWA").unwrap().to_degrees() - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_derived_values_are_calibrated_once() {
        let mut store = CalibrationStore::new();
        store.insert("TWS", CalibrationEntry::new(1.0, 1.0, 0.0));
        let mut pipeline = pipeline(store, false);

        let values = pipeline.process_cycle(&bus(45.0, 10.0, 5.0, 0.0));
        let tws = values.get("TWS").unwrap();
        assert!((tws - (7.3681 * MPS_PER_KNOT + 1.0)).abs() < 1e-3);

        // A bus TWS is calibrated in the first pass only
        let mut raw = bus(45.0, 10.0, 5.0, 0.0);
        raw.upsert(BoatValue::new("TWS", ValueFormat::Knots).with_value(3.0));
        let values = pipeline.process_cycle(&raw);
        assert!((values.get("TWS").unwrap() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_smoothing_carries_over_cycles() {
        let mut store = CalibrationStore::new();
        store.insert("STW", CalibrationEntry::new(0.0, 1.0, 10.0));
        let mut pipeline = pipeline(store, false);
        let stw = |v: f64| -> BoatValueList {
            [BoatValue::new("STW", ValueFormat::Knots).with_value(v)]
                .into_iter()
                .collect()
        };

        assert_eq!(pipeline.process_cycle(&stw(2.0)).get("STW"), Some(2.0));
        let second = pipeline.process_cycle(&stw(4.0)).get("STW").unwrap();
        assert!(second > 2.0 && second < 3.0, "smoothed STW {second}");
    }

    #[test]
    fn test_outage_records_nothing_without_simulation() {
        let mut pipeline = pipeline(CalibrationStore::new(), false);
        pipeline.process_cycle(&bus(45.0, 10.0, 5.0, 0.0));

        let mut raw = bus(45.0, 10.0, 5.0, 0.0);
        raw.find_mut("AWA").unwrap().invalidate();
        raw.find_mut("AWS").unwrap().invalidate();
        let values = pipeline.process_cycle(&raw);

        assert_eq!(values.get("TWD"), None);
        assert_eq!(pipeline.history().buffer("TWD").unwrap().len(), 1);
        assert_eq!(pipeline.history().buffer("AWS").unwrap().len(), 1);
    }

    #[test]
    fn test_awd_recorded_without_full_wind_solution() {
        let mut pipeline = pipeline(CalibrationStore::new(), false);

        // Bus TWA: only TWD and AWD are derived
        for _ in 0..10 {
            let mut raw = bus(45.0, 10.0, 5.0, 10.0);
            raw.upsert(BoatValue::new("TWA", ValueFormat::Wind).with_value(60f64.to_radians()));
            let values = pipeline.process_cycle(&raw);
            assert!((values.get("AWD").unwrap().to_degrees() - 55.0).abs() < 1e-9);
        }
        assert_eq!(pipeline.history().buffer("AWD").unwrap().len(), 10);
        assert_eq!(pipeline.history().buffer("TWD").unwrap().len(), 10);
        assert!(pipeline.history().buffer("TWS").unwrap().is_empty());

        // No speed reference: no true wind, AWD still follows AWA and heading
        let mut raw = bus(45.0, 10.0, 5.0, 10.0);
        raw.find_mut("STW").unwrap().invalidate();
        let values = pipeline.process_cycle(&raw);
        assert_eq!(values.get("TWD"), None);
        assert_eq!(pipeline.history().buffer("AWD").unwrap().len(), 11);
        assert_eq!(pipeline.history().buffer("TWD").unwrap().len(), 10);
    }

    #[test]
    fn test_outage_with_simulation_fills_history() {
        let mut pipeline = pipeline(CalibrationStore::new(), true);
        pipeline.process_cycle(&BoatValueList::new());
        for name in ["TWD", "TWS", "AWD", "AWS"] {
            assert_eq!(pipeline.history().buffer(name).unwrap().len(), 1, "{name} not simulated");
        }
    }

    #[test]
    fn test_format_processed_value() {
        let mut pipeline = pipeline(CalibrationStore::new(), false);
        let values = pipeline.process_cycle(&bus(45.0, 10.0, 5.0, 0.0));
        let twd = pipeline.format(&values, "TWD").unwrap();
        assert_eq!(twd.svalue, "074");
        assert_eq!(twd.unit, "Deg");
        assert!(pipeline.format(&values, "DBT").is_none());
    }
}
