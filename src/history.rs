//! # History Recording
//!
//! Once per processing cycle the recorder appends the latest value of each
//! tracked boat data type to its own [`RingBuffer`].
//!
//! ## Type Table
//! Only types listed in [`HISTORY_TYPES`] can be recorded. Each entry fixes the
//! fixed-point multiplier and the accepted SI domain, chosen so the largest
//! accepted value stays below the `u16` sentinel:
//!
//! | type | format | multiplier | domain |
//! |---|---|---|---|
//! | TWD, AWD | course | 1000 | 0..2π rad |
//! | TWS, AWS, STW, SOG | knots | 1000 | 0..65 m/s |
//! | DBT | depth | 100 | 0..650 m |
//! | WTemp | kelvinToC | 100 | 0..650 K |
//!
//! ## Gaps
//! - **Valid value**: recorded, optionally through calibration
//! - **Invalid, simulation on**: the simulated value the display shows is recorded
//! - **Invalid, simulation off**: nothing is recorded; the buffer just sees
//!   fewer samples for that stretch of time
//! - **Out of domain**: dropped by [`RingBuffer::add_si`]

use std::collections::HashSet;
use std::f64::consts::TAU;

use crate::calibration::CalibrationStore;
use crate::config::HistoryConfig;
use crate::formatter::ValueFormatter;
use crate::ring_buffer::{BufferMeta, RingBuffer};
use crate::{BoatValue, BoatValueList, ValueFormat};

/// Update interval of all history buffers in ms
pub const HISTORY_UPDATE_MS: u32 = 1000;

/// Declarative description of one recordable type.
#[derive(Debug)]
pub struct HistoryType {
    pub name: &'static str,
    pub format: ValueFormat,
    pub multiplier: f64,
    pub min: f64,
    pub max: f64,
}

/// Supported history types
pub const HISTORY_TYPES: &[HistoryType] = &[
    HistoryType { name: "TWD", format: ValueFormat::Course, multiplier: 1000.0, min: 0.0, max: TAU },
    HistoryType { name: "TWS", format: ValueFormat::Knots, multiplier: 1000.0, min: 0.0, max: 65.0 },
    HistoryType { name: "AWD", format: ValueFormat::Course, multiplier: 1000.0, min: 0.0, max: TAU },
    HistoryType { name: "AWS", format: ValueFormat::Knots, multiplier: 1000.0, min: 0.0, max: 65.0 },
    HistoryType { name: "STW", format: ValueFormat::Knots, multiplier: 1000.0, min: 0.0, max: 65.0 },
    HistoryType { name: "SOG", format: ValueFormat::Knots, multiplier: 1000.0, min: 0.0, max: 65.0 },
    HistoryType { name: "DBT", format: ValueFormat::Depth, multiplier: 100.0, min: 0.0, max: 650.0 },
    HistoryType { name: "WTemp", format: ValueFormat::KelvinToC, multiplier: 100.0, min: 0.0, max: 650.0 },
];

impl HistoryType {
    pub fn lookup(name: &str) -> Option<&'static HistoryType> {
        HISTORY_TYPES.iter().find(|t| t.name == name)
    }

    pub fn meta(&self) -> BufferMeta {
        BufferMeta {
            name: self.name.to_string(),
            format: self.format.clone(),
            update_ms: HISTORY_UPDATE_MS,
            multiplier: self.multiplier,
            min: self.min,
            max: self.max,
        }
    }
}

/// Set of history buffers fed once per cycle.
#[derive(Debug)]
pub struct HistoryRecorder {
    capacity: usize,
    simulation: bool,
    buffers: Vec<RingBuffer<u16>>,
    /// Names already reported as unsupported
    unsupported: HashSet<String>,
}

impl HistoryRecorder {
    pub fn new(capacity: usize, simulation: bool) -> Self {
        HistoryRecorder {
            capacity: capacity.max(1),
            simulation,
            buffers: Vec::new(),
            unsupported: HashSet::new(),
        }
    }

    /// Recorder with buffers for every tracked type of the configuration.
    pub fn from_config(config: &HistoryConfig, simulation: bool) -> Self {
        let mut recorder = Self::new(config.capacity, simulation);
        for name in &config.tracked {
            recorder.add_buffer(name);
        }
        recorder
    }

    /// Create the buffer for `name` unless it exists.
    ///
    /// Returns false for types missing from [`HISTORY_TYPES`]; each such name
    /// is logged once.
    pub fn add_buffer(&mut self, name: &str) -> bool {
        if self.buffer(name).is_some() {
            return true;
        }
        if self.unsupported.contains(name) {
            return false;
        }
        match HistoryType::lookup(name) {
            Some(history_type) => {
                tracing::debug!(name, capacity = self.capacity, "history buffer created");
                self.buffers
                    .push(RingBuffer::with_meta(self.capacity, history_type.meta()));
                true
            }
            None => {
                tracing::warn!(name, "no history support for this type");
                self.unsupported.insert(name.to_string());
                false
            }
        }
    }

    pub fn buffer(&self, name: &str) -> Option<&RingBuffer<u16>> {
        self.buffers.iter().find(|b| b.name() == name)
    }

    pub fn buffer_mut(&mut self, name: &str) -> Option<&mut RingBuffer<u16>> {
        self.buffers.iter_mut().find(|b| b.name() == name)
    }

    pub fn buffers(&self) -> impl Iterator<Item = &RingBuffer<u16>> {
        self.buffers.iter()
    }

    pub fn simulation(&self) -> bool {
        self.simulation
    }

    pub fn set_simulation(&mut self, simulation: bool) {
        self.simulation = simulation;
    }

    /// Record one cycle of values.
    ///
    /// With a calibration store, valid values are calibrated on a copy first;
    /// the list itself is never changed. Pass `None` when `values` went through
    /// calibration already. Returns the number of samples stored.
    pub fn handle_cycle<F: ValueFormatter + ?Sized>(
        &mut self,
        values: &BoatValueList,
        mut calibration: Option<&mut CalibrationStore>,
        formatter: &mut F,
    ) -> usize {
        let mut recorded = 0;
        for buffer in &mut self.buffers {
            let meta = buffer.meta();
            let mut value = values
                .find(&meta.name)
                .cloned()
                .unwrap_or_else(|| BoatValue::new(meta.name.clone(), meta.format.clone()));

            let sample = if value.valid {
                if let Some(store) = calibration.as_deref_mut() {
                    store.calibrate(&mut value);
                }
                Some(value.value)
            } else if self.simulation {
                formatter.format(&value).raw
            } else {
                None
            };

            if let Some(sample) = sample {
                if buffer.add_si(sample) {
                    recorded += 1;
                }
            }
        }
        tracing::debug!(recorded, buffers = self.buffers.len(), "history cycle");
        recorded
    }
}
