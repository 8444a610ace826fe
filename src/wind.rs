//! # True Wind Solver
//!
//! Stateless angle and vector helpers plus the wind triangle.
//!
//! ## Conventions
//! - Angles are radians, compass style: 0 is "up" (north or bow), clockwise positive
//! - Polar → Cartesian uses `x = r·sin(φ)`, `y = r·cos(φ)`
//! - Unknown inputs are `None`
//!
//! ## Heading Priority
//! A true heading is chosen in this order, and the order matters:
//! 1. `HDT` from the bus (checked by the caller)
//! 2. `HDM + VAR`, with VAR taken as 0 when unknown
//! 3. `COG`, but only while `SOG >= 0.1 m/s`; slower GPS courses are noise
//! 4. unknown
//!
//! ## Fill Gaps, Never Override
//! [`add_winds`] only writes derived values the bus did not deliver itself.
//! Sensor-reported true wind always wins over the computed solution.

use std::f64::consts::{FRAC_PI_2, PI, TAU};

use crate::{BoatValueList, ValueFormat};

/// SOG below this (m/s) makes COG untrustworthy
pub const MIN_SOG_FOR_COG: f64 = 0.1;

/// Normalise an angle into [0, 2π).
pub fn to_2pi(a: f64) -> f64 {
    let a = a % TAU;
    let a = if a < 0.0 { a + TAU } else { a };
    // -1e-17 % TAU + TAU rounds to TAU itself
    if a >= TAU {
        0.0
    } else {
        a
    }
}

/// Normalise an angle into [-π, π).
pub fn to_pi(a: f64) -> f64 {
    to_2pi(a + PI) - PI
}

/// Normalise degrees into [0, 360).
pub fn to_360(a: f64) -> f64 {
    let a = a % 360.0;
    let a = if a < 0.0 { a + 360.0 } else { a };
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

/// Normalise degrees into [-180, 180).
pub fn to_180(a: f64) -> f64 {
    to_360(a + 180.0) - 180.0
}

/// Polar (compass angle, length) to Cartesian.
pub fn to_cart(phi: f64, r: f64) -> (f64, f64) {
    (r * phi.sin(), r * phi.cos())
}

/// Cartesian to polar (compass angle in [0, 2π), length).
pub fn to_pol(x: f64, y: f64) -> (f64, f64) {
    let phi = to_2pi(FRAC_PI_2 - y.atan2(x));
    let r = (x * x + y * y).sqrt();
    (phi, r)
}

/// Vector sum of two polar vectors.
pub fn add_polar(phi1: f64, r1: f64, phi2: f64, r2: f64) -> (f64, f64) {
    let (x1, y1) = to_cart(phi1, r1);
    let (x2, y2) = to_cart(phi2, r2);
    to_pol(x1 + x2, y1 + y2)
}

/// Heading from magnetic heading, variation or course over ground.
///
/// HDT itself is not an input: callers use it directly when the bus has it.
pub fn calc_hdt(hdm: Option<f64>, var: Option<f64>, cog: Option<f64>, sog: Option<f64>) -> Option<f64> {
    match (hdm, cog) {
        (Some(hdm), _) => Some(to_2pi(hdm + var.unwrap_or(0.0))),
        (None, Some(cog)) if cog_trusted(sog) => Some(cog),
        _ => None,
    }
}

fn cog_trusted(sog: Option<f64>) -> bool {
    sog.is_some_and(|sog| sog >= MIN_SOG_FOR_COG)
}

/// Wind-related inputs of one processing cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WindSample {
    pub awa: Option<f64>,
    pub aws: Option<f64>,
    pub cog: Option<f64>,
    pub stw: Option<f64>,
    pub sog: Option<f64>,
    pub hdt: Option<f64>,
    pub hdm: Option<f64>,
    pub var: Option<f64>,
}

impl WindSample {
    /// Collect the valid inputs from a value snapshot.
    pub fn from_values(values: &BoatValueList) -> Self {
        Self {
            awa: values.get("AWA"),
            aws: values.get("AWS"),
            cog: values.get("COG"),
            stw: values.get("STW"),
            sog: values.get("SOG"),
            hdt: values.get("HDT"),
            hdm: values.get("HDM"),
            var: values.get("VAR"),
        }
    }

    /// True heading by the priority chain.
    pub fn heading(&self) -> Option<f64> {
        self.hdt
            .or_else(|| calc_hdt(self.hdm, self.var, self.cog, self.sog))
    }
}

/// Solved wind triangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrueWind {
    /// True wind direction [0, 2π)
    pub twd: f64,
    /// True wind speed, m/s
    pub tws: f64,
    /// True wind angle [-π, π)
    pub twa: f64,
    /// Apparent wind direction [0, 2π)
    pub awd: f64,
}

/// Wind triangle for known apparent wind, course through water, speed and heading.
pub fn calc_twd_sa(awa: f64, aws: f64, ctw: f64, stw: f64, hdt: f64) -> TrueWind {
    let awd = to_2pi(awa + hdt);
    let (twd, tws) = add_polar(awd, aws, ctw, -stw);
    let twd = to_2pi(twd);
    TrueWind {
        twd,
        tws,
        twa: to_pi(twd - hdt),
        awd,
    }
}

/// Solve true wind from one cycle of inputs.
///
/// `None` when apparent wind, a speed reference (STW, else SOG) or a heading
/// is missing.
pub fn calc_winds(sample: &WindSample) -> Option<TrueWind> {
    let (Some(awa), Some(aws)) = (sample.awa, sample.aws) else {
        return None;
    };
    let hdt = sample.heading()?;
    let ctw = match sample.cog {
        Some(cog) if cog_trusted(sample.sog) => cog,
        _ => hdt,
    };
    let stw = sample.stw.or(sample.sog)?;

    Some(calc_twd_sa(awa, aws, ctw, stw, hdt))
}

/// Fill derived wind values into `values` where the bus left gaps.
///
/// AWD only needs AWA and a heading and is filled whenever both are known. If
/// the bus reports TWA, only TWD is derived from it. Otherwise the full
/// triangle is solved and TWD, TWS, TWA and AWD are written only where they are
/// not already valid. Returns true if anything was computed.
pub fn add_winds(values: &mut BoatValueList) -> bool {
    let sample = WindSample::from_values(values);
    let heading = sample.heading();

    let mut derived = false;
    if let (Some(awa), Some(hdt)) = (sample.awa, heading) {
        let awd = values.find_or_create("AWD", ValueFormat::Course);
        if !awd.valid {
            awd.set(to_2pi(awa + hdt));
        }
        derived = true;
    }

    if let Some(twa) = values.get("TWA") {
        let Some(hdt) = heading else {
            return derived;
        };
        let twd = values.find_or_create("TWD", ValueFormat::Course);
        if !twd.valid {
            twd.set(to_2pi(twa + hdt));
        }
        tracing::debug!(twa, hdt, "TWD derived from bus TWA");
        return true;
    }

    let Some(wind) = calc_winds(&sample) else {
        tracing::debug!(?sample, "true wind not computable");
        return derived;
    };

    for (name, format, value) in [
        ("TWD", ValueFormat::Course, wind.twd),
        ("TWS", ValueFormat::Knots, wind.tws),
        ("TWA", ValueFormat::Wind, wind.twa),
        ("AWD", ValueFormat::Course, wind.awd),
    ] {
        let target = values.find_or_create(name, format);
        if !target.valid {
            target.set(value);
        }
    }
    tracing::debug!(
        twd = wind.twd.to_degrees(),
        tws = wind.tws,
        twa = wind.twa.to_degrees(),
        "true wind calculated"
    );
    true
}
