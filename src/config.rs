//! # Configuration Management
//!
//! This module handles loading and saving the pipeline configuration from
//! `boatdata.toml`. It covers the user's unit selections, per-instance
//! calibration constants, history buffer layout, chart geometry and the
//! simulation switch.
//!
//! Calibration constants are stored exactly as the user entered them, in the
//! units selected under `[units]`. Conversion to SI happens once, when the
//! [`crate::calibration::CalibrationStore`] is built.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::chart::Orientation;
use crate::units::UnitSettings;

/// Default configuration file name
pub const CONFIG_FILE: &str = "boatdata.toml";

/// Errors while reading or writing the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file format: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config serialization failed: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from boatdata.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Record simulated values while live data is missing
    pub simulation: bool,
    /// Active unit selections
    pub units: UnitSettings,
    /// Calibration entries in user units
    pub calibration: Vec<CalibrationConfig>,
    /// History buffer layout
    pub history: HistoryConfig,
    /// Strip chart geometry
    pub chart: ChartConfig,
}

/// One calibration entry as entered by the user
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalibrationConfig {
    /// Boat data name, e.g. "AWA" or "STW"
    pub instance: String,
    /// Additive offset in the user's unit (degrees for angles)
    #[serde(default)]
    pub offset: f64,
    /// Multiplicative factor; 0 is treated as 1
    #[serde(default = "default_slope")]
    pub slope: f64,
    /// Smoothing strength [0.01..10]; 0 disables smoothing
    #[serde(default)]
    pub smoothing: f64,
}

fn default_slope() -> f64 {
    1.0
}

/// History buffer configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Samples per buffer; 960 covers 16 minutes at 1 Hz
    pub capacity: usize,
    /// Boat data names to record
    pub tracked: Vec<String>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            capacity: 960,
            tracked: ["TWD", "TWS", "AWD", "AWS"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Strip chart geometry
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Pixels along the time axis
    pub axis_length: u32,
    /// Pixels along the value axis
    pub value_length: u32,
    /// Pixels of the time axis kept free when a window is (re)started
    pub reserved_margin: u32,
    /// Samples per plotted point [1..4]
    pub interval: u32,
    /// Direction of the time axis
    pub orientation: Orientation,
}

impl Default for ChartConfig {
    fn default() -> Self {
        ChartConfig {
            axis_length: 230,  // 300 px panel minus header and footer
            value_length: 400, // 4.2" panel width
            reserved_margin: 60,
            interval: 1,
            orientation: Orientation::TimeVertical,
        }
    }
}

impl Config {
    /// Load configuration from boatdata.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(CONFIG_FILE)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match Self::try_load_from_path(&path) {
            Ok(config) => {
                tracing::info!(
                    path = %path.as_ref().display(),
                    calibrations = config.calibration.len(),
                    tracked = ?config.history.tracked,
                    "loaded configuration"
                );
                config
            }
            Err(ConfigError::Io(e)) => {
                tracing::info!(path = %path.as_ref().display(), error = %e, "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.as_ref().display(), error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from specified path, reporting any failure
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;
        config.sanitize();
        Ok(config)
    }

    /// Save current configuration to boatdata.toml
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to_path(CONFIG_FILE)
    }

    /// Save current configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(&path, contents)?;
        tracing::info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Pull out-of-range values back into their valid ranges.
    fn sanitize(&mut self) {
        let chart = &mut self.chart;
        if !(1..=4).contains(&chart.interval) {
            tracing::warn!(interval = chart.interval, "chart interval out of range [1..4]");
            chart.interval = chart.interval.clamp(1, 4);
        }
        if chart.reserved_margin >= chart.axis_length {
            tracing::warn!(
                margin = chart.reserved_margin,
                axis = chart.axis_length,
                "reserved margin exceeds chart axis"
            );
            chart.reserved_margin = chart.axis_length / 4;
        }
        if self.history.capacity == 0 {
            tracing::warn!("history capacity 0 raised to 1");
            self.history.capacity = 1;
        }
    }
}
