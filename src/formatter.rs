//! # Display Formatting
//!
//! Turns SI boat values into display text in the user's units. The
//! [`ValueFormatter`] trait is the seam to the display code; [`DisplayFormatter`]
//! is the implementation used by the pipeline and the simulator binary.
//!
//! With simulation enabled, missing values are replaced by simulated ones here,
//! and the SI number behind the text is returned as well. The history recorder
//! stores that number, so simulated charts match the simulated digits.

use serde::Serialize;

use crate::simulation::Simulator;
use crate::units::{SpeedUnit, UnitSettings};
use crate::{BoatValue, ValueFormat};

/// Placeholder for a value without data
pub const NO_DATA: &str = "---";

/// Formatted text of one boat value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FormattedValue {
    /// Value text, `"---"` without data
    pub svalue: String,
    /// Unit label
    pub unit: String,
    /// SI value behind `svalue`, live or simulated
    pub raw: Option<f64>,
}

impl FormattedValue {
    fn missing() -> Self {
        FormattedValue {
            svalue: NO_DATA.to_string(),
            unit: String::new(),
            raw: None,
        }
    }
}

/// Anything that turns boat values into display text.
pub trait ValueFormatter {
    fn format(&mut self, value: &BoatValue) -> FormattedValue;
}

/// Unit-aware formatter with optional simulation.
#[derive(Debug)]
pub struct DisplayFormatter {
    units: UnitSettings,
    simulation: bool,
    simulator: Simulator,
}

impl DisplayFormatter {
    pub fn new(units: UnitSettings, simulation: bool) -> Self {
        Self::with_simulator(units, simulation, Simulator::new())
    }

    pub fn with_simulator(units: UnitSettings, simulation: bool, simulator: Simulator) -> Self {
        DisplayFormatter {
            units,
            simulation,
            simulator,
        }
    }

    pub fn simulation(&self) -> bool {
        self.simulation
    }

    pub fn units(&self) -> &UnitSettings {
        &self.units
    }

    /// Display text of a known SI value, without unit and without simulation.
    pub fn text(&self, name: &str, format: &ValueFormat, si: f64) -> String {
        self.convert(name, format, si).0
    }

    /// Convert an SI value into display number and unit label.
    fn convert(&self, name: &str, format: &ValueFormat, si: f64) -> (String, String) {
        match format {
            ValueFormat::Course | ValueFormat::Wind => (format!("{:03.0}", si.to_degrees()), "Deg".into()),
            ValueFormat::Knots => {
                let unit = match name {
                    "AWS" | "TWS" | "MaxAws" | "MaxTws" => self.units.wind_speed,
                    _ => self.units.speed,
                };
                let speed = unit.from_si(si);
                let text = if unit == SpeedUnit::Beaufort {
                    format!("{:2.0}", speed)
                } else {
                    by_magnitude(speed)
                };
                (text, unit.label().into())
            }
            ValueFormat::Depth | ValueFormat::Xte => {
                let unit = self.units.length;
                (by_magnitude(unit.from_si(si)), unit.label().into())
            }
            ValueFormat::KelvinToC | ValueFormat::XdrKelvin => {
                let unit = self.units.temperature;
                (by_magnitude(unit.from_si(si)), unit.label().into())
            }
            ValueFormat::Rot => {
                let rot = si.to_degrees().clamp(-99.0, 99.0);
                let text = if rot.abs() < 10.0 {
                    format!("{:3.2}", rot)
                } else {
                    format!("{:3.0}", rot)
                };
                (text, "Deg/s".into())
            }
            ValueFormat::Fixed0 => (format!("{:3.0}", si), String::new()),
            ValueFormat::Other(_) => (format!("{:.2}", si), String::new()),
        }
    }
}

/// Two decimals below 10, one below 100, none above.
fn by_magnitude(v: f64) -> String {
    if v.abs() < 10.0 {
        format!("{:3.2}", v)
    } else if v.abs() < 100.0 {
        format!("{:3.1}", v)
    } else {
        format!("{:3.0}", v)
    }
}

impl ValueFormatter for DisplayFormatter {
    fn format(&mut self, value: &BoatValue) -> FormattedValue {
        let si = match value.get() {
            Some(si) => si,
            None if self.simulation => match self.simulator.value(&value.name, &value.format) {
                Some(si) => si,
                None => return FormattedValue::missing(),
            },
            None => return FormattedValue::missing(),
        };

        let (svalue, unit) = self.convert(&value.name, &value.format, si);
        FormattedValue {
            svalue,
            unit,
            raw: Some(si),
        }
    }
}
