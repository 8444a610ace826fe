//! # Boat Data Pipeline Core Library
//!
//! This library turns raw, already-decoded bus measurements (wind, heading, speed,
//! depth, temperature) into calibrated, smoothed, historically buffered and derived
//! values for numeric display and real-time strip charts.
//!
//! ## Design Philosophy
//!
//! ### Bounded, Synchronous Work
//! - **One cycle, no threads**: every call runs to completion on the caller's
//!   processing tick; nothing blocks, nothing is retried
//! - **Fixed memory**: history lives in fixed-capacity [`ring_buffer::RingBuffer`]s
//!   that store fixed-point integers, so 960 samples of wind direction cost 1.9 KB
//! - **Missing data is normal**: invalid inputs travel as a validity flag or as
//!   `None`, never as an error
//!
//! ### Data Flow
//! 1. **Provider**: the bus task fills a [`BoatValueList`] with SI values
//! 2. **Calibrate**: [`calibration::CalibrationStore`] applies offset/slope and smoothing
//! 3. **Derive**: [`wind::add_winds`] fills true wind values the bus did not send
//! 4. **Record**: [`history::HistoryRecorder`] appends to the history buffers
//! 5. **Chart**: [`chart::ChartScaler`] turns a buffer into a range and plot commands
//!
//! The [`pipeline::Pipeline`] type runs steps 2 to 4 as one processing cycle.
//!
//! ## Core Types
//! - [`BoatValue`]: a named SI measurement with validity flag and format tag
//! - [`ValueFormat`]: the format tag, which also decides angular vs. linear handling
//! - [`BoatValueList`]: the per-cycle snapshot handed over by the provider

use serde::{Deserialize, Serialize};

// Module declarations
pub mod calibration;
pub mod chart;
pub mod config;
pub mod formatter;
pub mod history;
pub mod pipeline;
pub mod renderer;
pub mod ring_buffer;
pub mod simulation;
pub mod units;
pub mod wind;

/// Offset between Kelvin and Celsius.
pub const KELVIN_OFFSET: f64 = 273.15;

/// Format tag of a boat value.
///
/// The tag names how the value is meant to be displayed. The pipeline uses it
/// to pick angular (wrap-around) or linear arithmetic and the Kelvin shift for
/// temperature calibration.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueFormat {
    /// Absolute course or direction in radians (`formatCourse`)
    Course,
    /// Wind angle or direction in radians (`formatWind`)
    Wind,
    /// Rate of turn in rad/s (`formatRot`)
    Rot,
    /// Speed in m/s (`formatKnots`)
    Knots,
    /// Depth in metres (`formatDepth`)
    Depth,
    /// Cross track error in metres (`formatXte`)
    Xte,
    /// Temperature in Kelvin, shown in Celsius (`kelvinToC`)
    KelvinToC,
    /// Transducer temperature in Kelvin (`formatXdr:C:K`)
    XdrKelvin,
    /// Plain number without decimals (`formatFixed0`)
    Fixed0,
    /// Any other tag, passed through untouched
    Other(String),
}

impl ValueFormat {
    /// Bus tag string of this format.
    pub fn tag(&self) -> &str {
        match self {
            ValueFormat::Course => "formatCourse",
            ValueFormat::Wind => "formatWind",
            ValueFormat::Rot => "formatRot",
            ValueFormat::Knots => "formatKnots",
            ValueFormat::Depth => "formatDepth",
            ValueFormat::Xte => "formatXte",
            ValueFormat::KelvinToC => "kelvinToC",
            ValueFormat::XdrKelvin => "formatXdr:C:K",
            ValueFormat::Fixed0 => "formatFixed0",
            ValueFormat::Other(tag) => tag,
        }
    }

    /// Parse a bus tag; unknown tags are kept as [`ValueFormat::Other`].
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "formatCourse" => ValueFormat::Course,
            "formatWind" => ValueFormat::Wind,
            "formatRot" => ValueFormat::Rot,
            "formatKnots" => ValueFormat::Knots,
            "formatDepth" => ValueFormat::Depth,
            "formatXte" => ValueFormat::Xte,
            "kelvinToC" => ValueFormat::KelvinToC,
            "formatXdr:C:K" => ValueFormat::XdrKelvin,
            "formatFixed0" => ValueFormat::Fixed0,
            other => ValueFormat::Other(other.to_string()),
        }
    }

    /// Directions that wrap at 2π and are calibrated into [0, 2π).
    pub fn is_direction(&self) -> bool {
        matches!(self, ValueFormat::Course | ValueFormat::Wind)
    }

    /// Quantities charted on a circular axis.
    pub fn is_circular(&self) -> bool {
        matches!(self, ValueFormat::Course | ValueFormat::Wind | ValueFormat::Rot)
    }

    /// Temperatures stored in Kelvin.
    pub fn is_kelvin(&self) -> bool {
        matches!(self, ValueFormat::KelvinToC | ValueFormat::XdrKelvin)
    }
}

impl From<String> for ValueFormat {
    fn from(tag: String) -> Self {
        ValueFormat::from_tag(&tag)
    }
}

impl From<ValueFormat> for String {
    fn from(format: ValueFormat) -> Self {
        format.tag().to_string()
    }
}

/// A single named measurement as delivered by the boat-value provider.
///
/// Values are always SI: radians, m/s, metres, Kelvin. `valid` is false when the
/// bus has not delivered a fresh value; `value` is then meaningless.
///
/// # Example
/// ```
/// use boatdata_lib::{BoatValue, ValueFormat};
///
/// let awa = BoatValue::new("AWA", ValueFormat::Wind).with_value(0.785);
/// assert!(awa.valid);
/// assert_eq!(awa.get(), Some(0.785));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoatValue {
    /// Bus name, e.g. `"AWA"`
    pub name: String,
    /// SI value; only meaningful while `valid`
    pub value: f64,
    /// True if `value` holds a current measurement
    pub valid: bool,
    /// Display format tag
    pub format: ValueFormat,
}

impl BoatValue {
    /// Create an invalid value with the given name and format.
    pub fn new(name: impl Into<String>, format: ValueFormat) -> Self {
        Self {
            name: name.into(),
            value: 0.0,
            valid: false,
            format,
        }
    }

    /// Builder variant that sets a valid value.
    pub fn with_value(mut self, value: f64) -> Self {
        self.set(value);
        self
    }

    /// Store a valid value.
    pub fn set(&mut self, value: f64) {
        self.value = value;
        self.valid = true;
    }

    /// Mark the value as stale.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }

    /// The value if valid.
    pub fn get(&self) -> Option<f64> {
        self.valid.then_some(self.value)
    }
}

/// Per-cycle snapshot of all boat values, looked up by name.
///
/// The provider owns the real data and serialises access to it; the pipeline
/// only ever sees one consistent snapshot per cycle.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BoatValueList {
    values: Vec<BoatValue>,
}

impl BoatValueList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value by name.
    pub fn upsert(&mut self, value: BoatValue) {
        match self.values.iter_mut().find(|v| v.name == value.name) {
            Some(existing) => *existing = value,
            None => self.values.push(value),
        }
    }

    pub fn find(&self, name: &str) -> Option<&BoatValue> {
        self.values.iter().find(|v| v.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut BoatValue> {
        self.values.iter_mut().find(|v| v.name == name)
    }

    /// Find a value or create an invalid one with `format`.
    ///
    /// Derived quantities (TWD, AWD, ...) use this so they exist even when the
    /// bus never reported them.
    pub fn find_or_create(&mut self, name: &str, format: ValueFormat) -> &mut BoatValue {
        let index = match self.values.iter().position(|v| v.name == name) {
            Some(index) => index,
            None => {
                self.values.push(BoatValue::new(name, format));
                self.values.len() - 1
            }
        };
        &mut self.values[index]
    }

    /// The value of `name` if present and valid.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.find(name).and_then(BoatValue::get)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoatValue> {
        self.values.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BoatValue> {
        self.values.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<BoatValue> for BoatValueList {
    fn from_iter<I: IntoIterator<Item = BoatValue>>(iter: I) -> Self {
        let mut list = BoatValueList::new();
        for value in iter {
            list.upsert(value);
        }
        list
    }
}
