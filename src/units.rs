//! # User Unit Selections
//!
//! The configuration stores calibration constants and display preferences in the
//! units the user picked. Everything inside the pipeline is SI, so these types
//! carry the conversion factors in both directions.

use serde::{Deserialize, Serialize};

/// m/s per knot
pub const MPS_PER_KNOT: f64 = 1.0 / 1.94384;
/// m/s per km/h
pub const MPS_PER_KMH: f64 = 1.0 / 3.6;
/// Rough m/s per Beaufort step, as used for offsets
pub const MPS_PER_BFT: f64 = 0.5;
/// metres per foot
pub const METRES_PER_FOOT: f64 = 0.3048;

/// Boat speed display unit (`m/s|km/h|kn`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeedUnit {
    #[serde(rename = "m/s")]
    MetresPerSecond,
    #[serde(rename = "km/h")]
    KilometresPerHour,
    #[default]
    #[serde(rename = "kn")]
    Knots,
    /// Beaufort; only meaningful for wind speed
    #[serde(rename = "bft")]
    Beaufort,
}

impl SpeedUnit {
    /// Convert a value (or offset) in this unit to m/s.
    pub fn to_si(self, value: f64) -> f64 {
        match self {
            SpeedUnit::MetresPerSecond => value,
            SpeedUnit::KilometresPerHour => value * MPS_PER_KMH,
            SpeedUnit::Knots => value * MPS_PER_KNOT,
            SpeedUnit::Beaufort => value * MPS_PER_BFT,
        }
    }

    /// Convert m/s into this unit.
    pub fn from_si(self, mps: f64) -> f64 {
        match self {
            SpeedUnit::MetresPerSecond => mps,
            SpeedUnit::KilometresPerHour => mps / MPS_PER_KMH,
            SpeedUnit::Knots => mps / MPS_PER_KNOT,
            SpeedUnit::Beaufort => beaufort(mps),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SpeedUnit::MetresPerSecond => "m/s",
            SpeedUnit::KilometresPerHour => "km/h",
            SpeedUnit::Knots => "kn",
            SpeedUnit::Beaufort => "bft",
        }
    }
}

/// Beaufort force for a wind speed in m/s.
fn beaufort(mps: f64) -> f64 {
    const LIMITS: [f64; 12] = [0.3, 1.6, 3.4, 5.5, 8.0, 10.8, 13.9, 17.2, 20.8, 24.5, 28.5, 32.7];
    LIMITS.iter().take_while(|&&limit| mps >= limit).count() as f64
}

/// Length and depth unit (`m|ft`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    #[default]
    #[serde(rename = "m")]
    Metres,
    #[serde(rename = "ft")]
    Feet,
}

impl LengthUnit {
    pub fn to_si(self, value: f64) -> f64 {
        match self {
            LengthUnit::Metres => value,
            LengthUnit::Feet => value * METRES_PER_FOOT,
        }
    }

    pub fn from_si(self, metres: f64) -> f64 {
        match self {
            LengthUnit::Metres => metres,
            LengthUnit::Feet => metres / METRES_PER_FOOT,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LengthUnit::Metres => "m",
            LengthUnit::Feet => "ft",
        }
    }
}

/// Temperature unit (`K|C|F`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureUnit {
    #[serde(rename = "K")]
    Kelvin,
    #[default]
    #[serde(rename = "C")]
    Celsius,
    #[serde(rename = "F")]
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a temperature *difference* (calibration offset) to Kelvin.
    pub fn offset_to_si(self, delta: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin | TemperatureUnit::Celsius => delta,
            TemperatureUnit::Fahrenheit => delta * 5.0 / 9.0,
        }
    }

    /// Convert an absolute temperature in Kelvin into this unit.
    pub fn from_si(self, kelvin: f64) -> f64 {
        match self {
            TemperatureUnit::Kelvin => kelvin,
            TemperatureUnit::Celsius => kelvin - crate::KELVIN_OFFSET,
            TemperatureUnit::Fahrenheit => (kelvin - crate::KELVIN_OFFSET) * 9.0 / 5.0 + 32.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TemperatureUnit::Kelvin => "K",
            TemperatureUnit::Celsius => "Deg C",
            TemperatureUnit::Fahrenheit => "Deg F",
        }
    }
}

/// Active unit selections of the user.
///
/// Angles are always entered in degrees and stored in radians.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSettings {
    /// Boat speed (STW, SOG)
    #[serde(default)]
    pub speed: SpeedUnit,
    /// Wind speed (AWS, TWS)
    #[serde(default)]
    pub wind_speed: SpeedUnit,
    /// Depth and length
    #[serde(default)]
    pub length: LengthUnit,
    /// Water and air temperature
    #[serde(default)]
    pub temperature: TemperatureUnit,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_conversions() {
        assert!((SpeedUnit::Knots.to_si(1.94384) - 1.0).abs() < 1e-9);
        assert!((SpeedUnit::KilometresPerHour.to_si(3.6) - 1.0).abs() < 1e-9);
        assert!((SpeedUnit::Beaufort.to_si(4.0) - 2.0).abs() < 1e-9);
        assert!((SpeedUnit::Knots.from_si(SpeedUnit::Knots.to_si(7.5)) - 7.5).abs() < 1e-9);
    }

    #[test]
    fn test_beaufort_scale() {
        assert_eq!(SpeedUnit::Beaufort.from_si(0.1), 0.0);
        assert_eq!(SpeedUnit::Beaufort.from_si(6.0), 4.0);
        assert_eq!(SpeedUnit::Beaufort.from_si(40.0), 12.0);
    }

    #[test]
    fn test_temperature_conversions() {
        assert!((TemperatureUnit::Fahrenheit.offset_to_si(9.0) - 5.0).abs() < 1e-9);
        assert!((TemperatureUnit::Celsius.from_si(293.15) - 20.0).abs() < 1e-9);
        assert!((TemperatureUnit::Fahrenheit.from_si(273.15) - 32.0).abs() < 1e-9);
    }

    #[test]
    fn test_units_from_toml() {
        let units: UnitSettings =
            toml::from_str("speed = \"km/h\"\nwind_speed = \"bft\"\nlength = \"ft\"\ntemperature = \"F\"")
                .unwrap();
        assert_eq!(units.speed, SpeedUnit::KilometresPerHour);
        assert_eq!(units.wind_speed, SpeedUnit::Beaufort);
        assert_eq!(units.length, LengthUnit::Feet);
        assert_eq!(units.temperature, TemperatureUnit::Fahrenheit);
    }
}
