//! # Calibration and Smoothing
//!
//! Per-instance linear calibration (`value × slope + offset`) followed by an
//! exponential smoothing filter. One [`CalibrationStore`] is owned by the
//! processing task and handed by reference to whoever needs it.
//!
//! ## Units
//! Offsets are entered in the user's display units and converted to SI once,
//! when the store is built from configuration. Slopes are dimensionless, except
//! for Fahrenheit temperatures where the slope is rescaled as well.
//!
//! ## Smoothing Factor
//! The user enters a smoothing strength in `[0.01, 10]`. It is mapped linearly
//! onto `[0.3, 0.95]` and inverted (`factor = 1 - mapped`), so larger input
//! means heavier smoothing. The filter then computes
//! `state += factor × (value - state)`. An input of 0 or less disables
//! smoothing entirely.

use std::collections::HashMap;

use crate::config::CalibrationConfig;
use crate::units::UnitSettings;
use crate::wind::{to_2pi, to_pi};
use crate::{BoatValue, KELVIN_OFFSET};

/// Bounds of the user-facing smoothing input
const SMOOTH_INPUT_MIN: f64 = 0.01;
const SMOOTH_INPUT_MAX: f64 = 10.0;
/// Bounds the input is mapped onto before inversion
const SMOOTH_MAPPED_MIN: f64 = 0.3;
const SMOOTH_MAPPED_MAX: f64 = 0.95;

/// Physical kind of a calibratable instance; decides the unit conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Quantity {
    Angle,
    BoatSpeed,
    WindSpeed,
    Length,
    Temperature,
}

/// Instances the store accepts calibration data for.
fn quantity_of(instance: &str) -> Option<Quantity> {
    match instance {
        "AWA" | "AWD" | "COG" | "HDM" | "HDT" | "TWA" | "TWD" => Some(Quantity::Angle),
        "STW" | "SOG" => Some(Quantity::BoatSpeed),
        "AWS" | "TWS" => Some(Quantity::WindSpeed),
        "DBT" => Some(Quantity::Length),
        "WTemp" => Some(Quantity::Temperature),
        _ => None,
    }
}

/// Calibration state of one named instance.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationEntry {
    /// SI offset added after scaling
    pub offset: f64,
    /// Scale factor, never 0
    pub slope: f64,
    /// Filter weight of a new sample in [0, 1); `None` disables smoothing
    pub smoothing: Option<f64>,
    /// Last calibrated value
    pub last_result: Option<f64>,
    /// True if the last call produced a calibrated value
    pub is_calibrated: bool,
}

impl CalibrationEntry {
    /// Build an entry from SI offset, slope and the raw user smoothing input.
    pub fn new(offset: f64, slope: f64, smoothing_input: f64) -> Self {
        let slope = if slope == 0.0 {
            tracing::debug!("calibration slope 0 replaced by 1");
            1.0
        } else {
            slope
        };
        Self {
            offset,
            slope,
            smoothing: smoothing_factor(smoothing_input),
            last_result: None,
            is_calibrated: false,
        }
    }
}

/// Map the user smoothing input onto the internal filter weight.
///
/// `None` for inputs of 0 or less; otherwise a weight in [0.05, 0.7].
pub fn smoothing_factor(input: f64) -> Option<f64> {
    if input <= 0.0 || !input.is_finite() {
        return None;
    }
    let input = input.clamp(SMOOTH_INPUT_MIN, SMOOTH_INPUT_MAX);
    let mapped = SMOOTH_MAPPED_MIN
        + (input - SMOOTH_INPUT_MIN) * (SMOOTH_MAPPED_MAX - SMOOTH_MAPPED_MIN)
            / (SMOOTH_INPUT_MAX - SMOOTH_INPUT_MIN);
    Some(1.0 - mapped)
}

/// Name-keyed calibration and smoothing state.
#[derive(Clone, Debug, Default)]
pub struct CalibrationStore {
    entries: HashMap<String, CalibrationEntry>,
    /// Last smoothed value per instance
    smoothed: HashMap<String, f64>,
}

impl CalibrationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from configuration given in user units.
    ///
    /// Instances the pipeline does not know are logged and skipped.
    pub fn from_config(configs: &[CalibrationConfig], units: &UnitSettings) -> Self {
        let mut store = Self::new();
        for config in configs {
            let Some(quantity) = quantity_of(&config.instance) else {
                tracing::warn!(instance = %config.instance, "unknown calibration instance skipped");
                continue;
            };

            let mut slope = config.slope;
            let offset = match quantity {
                Quantity::Angle => config.offset.to_radians(),
                Quantity::BoatSpeed => units.speed.to_si(config.offset),
                Quantity::WindSpeed => units.wind_speed.to_si(config.offset),
                Quantity::Length => units.length.to_si(config.offset),
                Quantity::Temperature => {
                    if units.temperature == crate::units::TemperatureUnit::Fahrenheit {
                        slope = units.temperature.offset_to_si(slope);
                    }
                    units.temperature.offset_to_si(config.offset)
                }
            };

            let entry = CalibrationEntry::new(offset, slope, config.smoothing);
            tracing::info!(
                instance = %config.instance,
                offset = entry.offset,
                slope = entry.slope,
                smoothing = ?entry.smoothing,
                "stored calibration data"
            );
            store.insert(&config.instance, entry);
        }
        store
    }

    /// Add or replace the entry for `instance` (values already SI).
    pub fn insert(&mut self, instance: &str, entry: CalibrationEntry) {
        self.smoothed.remove(instance);
        self.entries.insert(instance.to_string(), entry);
    }

    pub fn entry(&self, instance: &str) -> Option<&CalibrationEntry> {
        self.entries.get(instance)
    }

    pub fn contains(&self, instance: &str) -> bool {
        self.entries.contains_key(instance)
    }

    /// Apply offset and slope to `value` in place.
    ///
    /// Unknown instances and invalid values are left untouched; a known
    /// instance with an invalid value is marked as not calibrated.
    pub fn calibrate(&mut self, value: &mut BoatValue) {
        let Some(entry) = self.entries.get_mut(&value.name) else {
            return;
        };
        if !value.valid {
            entry.is_calibrated = false;
            return;
        }

        let result = if value.format.is_kelvin() {
            (value.value - KELVIN_OFFSET) * entry.slope + entry.offset + KELVIN_OFFSET
        } else {
            value.value * entry.slope + entry.offset
        };
        let result = if value.format.is_direction() {
            to_2pi(result)
        } else {
            result
        };

        tracing::debug!(
            instance = %value.name,
            offset = entry.offset,
            slope = entry.slope,
            result,
            "calibrated"
        );
        value.value = result;
        entry.last_result = Some(result);
        entry.is_calibrated = true;
    }

    /// Exponentially smooth `value` in place.
    ///
    /// The first sample seen for an instance is passed through and becomes the
    /// filter state. Directions are smoothed along the shorter arc.
    pub fn smooth(&mut self, value: &mut BoatValue) {
        if !value.valid {
            return;
        }
        let Some(factor) = self.entries.get(&value.name).and_then(|e| e.smoothing) else {
            return;
        };

        let smoothed = match self.smoothed.get(&value.name) {
            None => value.value,
            Some(&state) if value.format.is_direction() => {
                to_2pi(state + factor * to_pi(value.value - state))
            }
            Some(&state) => state + factor * (value.value - state),
        };
        self.smoothed.insert(value.name.clone(), smoothed);
        value.value = smoothed;
    }

    /// Calibrate, then smooth.
    pub fn process(&mut self, value: &mut BoatValue) {
        self.calibrate(value);
        self.smooth(value);
    }
}
