//! # Simulated Boat Data
//!
//! Synthetic SI values for bench testing without a bus connection. When the
//! simulation flag is on, the display formatter asks this module for a value
//! whenever a live one is missing, and history records what the display shows.
//!
//! ## Model
//! Each quantity is a slow sine drift tied to the real-time clock plus a small
//! random jitter, kept inside a plausible band:
//! - **Course / wind angle**: 90° ± 10°
//! - **Boat speed (STW, SOG)**: 1..8 m/s
//! - **Wind speed (AWS, TWS)**: 4..8 m/s
//! - **Depth**: 18..28 m
//! - **Water temperature**: 296..297 K
//! - **Rate of turn**: 0.04..0.14 rad/s
//!
//! The phase advances with wall-clock time, so a running chart shows a wandering
//! line instead of pure noise.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f64::consts::{FRAC_PI_2, TAU};

use crate::{ValueFormat, KELVIN_OFFSET};

/// Period of the slow drift in seconds
const DRIFT_PERIOD_SECS: f64 = 600.0;

/// Band of a simulated quantity: centre and half-width in SI units.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Band {
    centre: f64,
    half_width: f64,
}

impl Band {
    const fn new(low: f64, high: f64) -> Self {
        Band {
            centre: (low + high) / 2.0,
            half_width: (high - low) / 2.0,
        }
    }
}

fn band_for(name: &str, format: &ValueFormat) -> Option<Band> {
    let band = match format {
        ValueFormat::Course | ValueFormat::Wind => Band {
            centre: FRAC_PI_2,
            half_width: 0.17,
        },
        ValueFormat::Knots if matches!(name, "AWS" | "TWS") => Band::new(4.0, 8.0),
        ValueFormat::Knots => Band::new(1.0, 8.0),
        ValueFormat::Depth => Band::new(18.0, 28.0),
        ValueFormat::KelvinToC => Band::new(296.0, 297.0),
        ValueFormat::XdrKelvin => Band::new(KELVIN_OFFSET + 21.8, KELVIN_OFFSET + 26.8),
        ValueFormat::Rot => Band::new(0.04, 0.14),
        ValueFormat::Xte => Band::new(6.0, 10.0),
        ValueFormat::Fixed0 => Band::new(8.0, 9.0),
        ValueFormat::Other(_) => return None,
    };
    Some(band)
}

/// Generator of plausible boat values.
#[derive(Debug)]
pub struct Simulator {
    rng: StdRng,
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator {
    /// Simulator seeded from the operating system.
    pub fn new() -> Self {
        Simulator {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible simulator for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Simulator {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Simulated SI value for `name`, or `None` for formats without a model.
    /// If `now` is `None`, fall back to `Utc::now()`.
    pub fn value_at(&mut self, name: &str, format: &ValueFormat, now: Option<DateTime<Utc>>) -> Option<f64> {
        let band = band_for(name, format)?;
        let now = now.unwrap_or_else(Utc::now);

        // Offset the phase per name so quantities do not move in lockstep
        let name_offset = name.bytes().map(f64::from).sum::<f64>();
        let secs = now.timestamp_millis() as f64 / 1000.0;
        let phase = (secs / DRIFT_PERIOD_SECS + name_offset / 10.0) * TAU;

        let drift = 0.6 * phase.sin();
        let jitter = self.rng.gen_range(-0.4..=0.4);
        Some(band.centre + band.half_width * (drift + jitter))
    }

    /// Simulated SI value at the current time.
    pub fn value(&mut self, name: &str, format: &ValueFormat) -> Option<f64> {
        self.value_at(name, format, None)
    }
}
