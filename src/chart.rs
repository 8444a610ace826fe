//! # Strip Chart Scaling
//!
//! Computes the visible value range of a history buffer and maps its samples
//! to chart coordinates. Drawing is left to a [`RenderSurface`]; this module
//! only produces [`PlotCommand`]s and axis labels, so it can be tested without
//! any display.
//!
//! ## Window
//! The time axis shows one point per `interval` samples. On a new interval, a
//! cold start or when the line reaches the far end of the axis, the window is
//! restarted with `(axis_length - reserved_margin) × interval` samples. Between
//! restarts it grows by the number of samples added since the last refresh.
//!
//! ## Circular Mode
//! Course and wind directions are plotted around a centre (`mid`), the circular
//! mean of the window rounded to the scale step. The centre only moves when a
//! recalculation is due, so the chart does not jitter. The half-span follows the
//! largest circular deviation from `mid`:
//! - **Widen** to the deviation rounded up to a step
//! - **Narrow** when the deviation is more than one step inside, never below
//!   the default half-span
//!
//! A line step longer than half a turn crosses the wrap boundary of the chart
//! and is split into two pieces ending at the near edges.
//!
//! ## Linear Mode
//! Bounds are the window's min/max snapped outward to the step. They widen
//! when a sample falls more than one step outside them and narrow once the
//! data uses more than one step less. The floor sticks to the buffer's domain minimum when the data is
//! within one step of it, and the span never drops below the default span.
//!
//! ## State
//! `Uninitialized → RangeStable ⇄ Recalculating`

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::config::ChartConfig;
use crate::renderer::RenderSurface;
use crate::ring_buffer::{BufferSample, RingBuffer};
use crate::wind::{to_2pi, to_pi};
use crate::ValueFormat;

/// Direction of the time axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Time runs bottom to top, values left to right
    #[default]
    TimeVertical,
    /// Time runs left to right, values bottom to top
    TimeHorizontal,
}

/// Pixel position on the render surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PlotPoint {
    pub x: i32,
    pub y: i32,
}

impl PlotPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        PlotPoint { x, y }
    }
}

/// One step of a plotted line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum PlotCommand {
    MoveTo(PlotPoint),
    LineTo(PlotPoint),
}

/// Value label on the value axis.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChartLabel {
    pub at: PlotPoint,
    /// SI value shown at `at`
    pub value: f64,
}

/// Currently visible value range, in SI units.
///
/// In circular mode `min` and `max` are the left and right edges in [0, 2π)
/// and may wrap, so `min > max` is normal.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ChartRange {
    pub min: f64,
    pub mid: f64,
    pub max: f64,
    pub span: f64,
    pub step: f64,
    /// Set when this range came from a recalculation
    pub recalc: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChartState {
    Uninitialized,
    RangeStable,
    Recalculating,
}

/// Placement and size of the chart area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChartGeometry {
    /// Top left corner
    pub origin: PlotPoint,
    /// Pixels along the time axis
    pub axis_length: u32,
    /// Pixels along the value axis
    pub value_length: u32,
    /// Free pixels on the time axis after a window restart
    pub reserved_margin: u32,
    pub orientation: Orientation,
    /// Put high values near the origin side of the value axis
    pub invert: bool,
}

impl From<&ChartConfig> for ChartGeometry {
    fn from(config: &ChartConfig) -> Self {
        ChartGeometry {
            origin: PlotPoint::default(),
            axis_length: config.axis_length.max(1),
            value_length: config.value_length.max(1),
            reserved_margin: config.reserved_margin,
            orientation: config.orientation,
            invert: false,
        }
    }
}

/// Default span and step of a quantity, in SI units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleDefaults {
    pub default_span: f64,
    pub step: f64,
}

impl ScaleDefaults {
    pub fn for_format(format: &ValueFormat) -> Self {
        let (default_span, step) = match format {
            f if f.is_circular() => (120f64.to_radians(), 10f64.to_radians()),
            ValueFormat::Knots => (10.0, 1.0),
            ValueFormat::Depth => (20.0, 5.0),
            ValueFormat::KelvinToC | ValueFormat::XdrKelvin => (5.0, 1.0),
            _ => (10.0, 1.0),
        };
        ScaleDefaults { default_span, step }
    }
}

/// Output of one chart refresh.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartFrame {
    pub range: ChartRange,
    pub commands: Vec<PlotCommand>,
    pub labels: Vec<ChartLabel>,
    /// Number of wrap splits in `commands`
    pub splits: usize,
    /// Plotted points, one per interval
    pub points: usize,
}

impl ChartFrame {
    /// Draw the frame; `label_text` turns label values into text.
    pub fn replay<S, F>(&self, surface: &mut S, label_text: F)
    where
        S: RenderSurface + ?Sized,
        F: Fn(f64) -> String,
    {
        for command in &self.commands {
            match *command {
                PlotCommand::MoveTo(p) => surface.move_to(p),
                PlotCommand::LineTo(p) => surface.line_to(p),
            }
        }
        for label in &self.labels {
            surface.draw_text(label.at, &label_text(label.value));
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Window {
    start: usize,
    num: usize,
    /// Interval the window was built for; 0 before the first build
    interval: u32,
    /// `total_added` of the buffer at the last refresh
    seen: u64,
}

/// Adaptive range and point mapping for one chart.
#[derive(Clone, Debug)]
pub struct ChartScaler {
    geometry: ChartGeometry,
    defaults: ScaleDefaults,
    circular: bool,
    interval: u32,
    state: ChartState,
    range: Option<ChartRange>,
    window: Window,
    recalc: bool,
}

impl ChartScaler {
    pub fn new(geometry: ChartGeometry, format: &ValueFormat, interval: u32) -> Self {
        ChartScaler {
            geometry,
            defaults: ScaleDefaults::for_format(format),
            circular: format.is_circular(),
            interval: interval.clamp(1, 4),
            state: ChartState::Uninitialized,
            range: None,
            window: Window::default(),
            recalc: true,
        }
    }

    /// Scaler matching the format of `buffer`.
    pub fn for_buffer<T: BufferSample>(geometry: ChartGeometry, buffer: &RingBuffer<T>, interval: u32) -> Self {
        Self::new(geometry, buffer.format(), interval)
    }

    pub fn with_defaults(mut self, defaults: ScaleDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn state(&self) -> ChartState {
        self.state
    }

    pub fn range(&self) -> Option<&ChartRange> {
        self.range.as_ref()
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    /// Window as (first logical index, number of samples).
    pub fn window(&self) -> (usize, usize) {
        (self.window.start, self.window.num)
    }

    pub fn is_circular(&self) -> bool {
        self.circular
    }

    /// Select a new time interval [1..4].
    pub fn set_interval(&mut self, interval: u32) {
        let interval = interval.clamp(1, 4);
        if interval != self.interval {
            self.interval = interval;
            self.request_recalc();
        }
    }

    /// Force a new centre and window on the next refresh.
    pub fn request_recalc(&mut self) {
        self.recalc = true;
        if self.state != ChartState::Uninitialized {
            self.state = ChartState::Recalculating;
        }
    }

    /// Refresh range and plot commands from `buffer`.
    ///
    /// `None` while the buffer holds no valid sample and no range was ever
    /// committed.
    pub fn update<T: BufferSample>(&mut self, buffer: &RingBuffer<T>) -> Option<ChartFrame> {
        let count = buffer.len();
        if count == 0 {
            return None;
        }

        self.select_window(count, buffer.total_added());
        if self.recalc {
            self.state = ChartState::Recalculating;
        }

        let window: Vec<f64> = (self.window.start..count)
            .filter_map(|i| buffer.get_si(i))
            .collect();
        // Without samples in view the old range is kept and a pending recalc waits
        let fresh = !window.is_empty();
        let range = if !fresh {
            self.range.map(|r| ChartRange { recalc: false, ..r })
        } else if self.circular {
            Some(self.circular_range(&window))
        } else {
            let lo = buffer.min_of_last(self.window.num).map(|v| buffer.to_si(v.to_f64()));
            let hi = buffer.max_of_last(self.window.num).map(|v| buffer.to_si(v.to_f64()));
            lo.zip(hi)
                .map(|(lo, hi)| self.linear_range(lo, hi, buffer.meta().min))
        };
        let Some(range) = range else {
            self.state = ChartState::Uninitialized;
            return None;
        };

        if range.recalc {
            tracing::debug!(
                buffer = buffer.name(),
                min = range.min,
                mid = range.mid,
                max = range.max,
                span = range.span,
                start = self.window.start,
                num = self.window.num,
                "chart range recalculated"
            );
        } else if self.range.map_or(true, |r| r.span != range.span || r.min != range.min) {
            tracing::debug!(buffer = buffer.name(), min = range.min, span = range.span, "chart range adjusted");
        }

        self.range = Some(range);
        if fresh {
            self.recalc = false;
            self.state = ChartState::RangeStable;
        }

        let (commands, splits, points) = self.plot(buffer, &range);
        Some(ChartFrame {
            range,
            commands,
            labels: self.labels(&range),
            splits,
            points,
        })
    }

    fn select_window(&mut self, count: usize, total_added: u64) {
        let added = total_added.saturating_sub(self.window.seen) as usize;
        self.window.seen = total_added;

        let fresh = self.recalc
            || self.window.interval != self.interval
            || count == 1
            || self.state == ChartState::Uninitialized;
        if fresh {
            self.restart_window(count);
        } else {
            self.window.num = (self.window.num + added).min(count);
        }

        if self.window.num / self.interval as usize >= self.geometry.axis_length as usize {
            tracing::debug!(num = self.window.num, "chart edge reached");
            self.restart_window(count);
        }
        self.window.start = count - self.window.num;
    }

    fn restart_window(&mut self, count: usize) {
        let usable = self
            .geometry
            .axis_length
            .saturating_sub(self.geometry.reserved_margin)
            .max(1) as usize;
        self.window.num = count.min(usable * self.interval as usize);
        self.window.interval = self.interval;
        self.recalc = true;
    }

    fn circular_range(&self, window: &[f64]) -> ChartRange {
        let step = self.defaults.step;
        let default_half = self.defaults.default_span / 2.0;

        let (mut mid, mut half) = match self.range {
            Some(r) if !self.recalc => (r.mid, r.span / 2.0),
            _ => (round_to_step(circular_mean(window), step), default_half),
        };
        let mut dev = max_deviation(window, mid);
        half = adjust_half(half, dev, default_half, step);

        // Keep the smaller arc: try the opposite centre for very wide spreads
        if self.recalc && 2.0 * half > PI {
            let flipped = to_2pi(mid + PI);
            let flipped_dev = max_deviation(window, flipped);
            if flipped_dev < dev {
                mid = flipped;
                dev = flipped_dev;
                half = adjust_half(default_half, dev, default_half, step);
            }
        }

        ChartRange {
            min: to_2pi(mid - half),
            mid,
            max: to_2pi(mid + half),
            span: 2.0 * half,
            step,
            recalc: self.recalc,
        }
    }

    fn linear_range(&self, lo: f64, hi: f64, domain_min: f64) -> ChartRange {
        let step = self.defaults.step;
        let low = (lo / step).floor() * step;
        let high = (hi / step).ceil() * step;

        let (mut min, mut max) = match self.range {
            Some(r) if !self.recalc => {
                let (mut min, mut max) = (r.min, r.min + r.span);
                // Samples within one step outside are clamped to the edge
                if lo < min - step {
                    min = low;
                }
                if hi > max + step {
                    max = high;
                }
                // Compare with the padded data span so the default span alone never narrows
                if (high - low).max(self.defaults.default_span) + step < (max - min) {
                    min = low;
                    max = high;
                }
                (min, max)
            }
            _ => (low, high),
        };

        if lo >= domain_min && min < domain_min + step {
            min = domain_min;
        }
        if max - min < self.defaults.default_span {
            max = min + self.defaults.default_span;
        }

        ChartRange {
            min,
            mid: (min + max) / 2.0,
            max,
            span: max - min,
            step,
            recalc: self.recalc,
        }
    }

    /// Position of an SI value along the value axis, 0..=value_length.
    pub fn value_position(&self, range: &ChartRange, value: f64) -> f64 {
        let len = self.geometry.value_length as f64;
        let offset = if self.circular {
            to_2pi(value - range.min)
        } else {
            value - range.min
        };
        (offset * len / range.span).clamp(0.0, len)
    }

    /// Pixel of time step `t` (0 = oldest) at value-axis position `p`.
    fn to_pixel(&self, t: usize, p: f64) -> PlotPoint {
        let g = &self.geometry;
        let len = g.value_length as f64;
        let t = t as i32;
        match g.orientation {
            Orientation::TimeVertical => {
                let p = if g.invert { len - p } else { p };
                PlotPoint::new(g.origin.x + p.round() as i32, g.origin.y + g.axis_length as i32 - t)
            }
            Orientation::TimeHorizontal => {
                let p = if g.invert { p } else { len - p };
                PlotPoint::new(g.origin.x + t, g.origin.y + p.round() as i32)
            }
        }
    }

    fn plot<T: BufferSample>(&self, buffer: &RingBuffer<T>, range: &ChartRange) -> (Vec<PlotCommand>, usize, usize) {
        let interval = self.interval as usize;
        let points = self.window.num / interval;
        let len = self.geometry.value_length as f64;

        let mut commands = Vec::with_capacity(points + 1);
        let mut splits = 0;
        let mut prev: Option<f64> = None;

        for t in 0..points {
            let Some(value) = buffer.get_si(self.window.start + t * interval) else {
                prev = None;
                continue;
            };
            let at = self.to_pixel(t, self.value_position(range, value));

            match prev {
                None => commands.push(PlotCommand::MoveTo(at)),
                Some(prev_value) if self.circular => {
                    let prev_rel = to_pi(prev_value - range.mid);
                    let rel = to_pi(value - range.mid);
                    if (rel - prev_rel).abs() > PI {
                        let (near, far) = if prev_rel > 0.0 { (len, 0.0) } else { (0.0, len) };
                        commands.push(PlotCommand::LineTo(self.to_pixel(t, near)));
                        commands.push(PlotCommand::MoveTo(self.to_pixel(t, far)));
                        splits += 1;
                    }
                    commands.push(PlotCommand::LineTo(at));
                }
                Some(_) => commands.push(PlotCommand::LineTo(at)),
            }
            prev = Some(value);
        }
        (commands, splits, points)
    }

    fn labels(&self, range: &ChartRange) -> Vec<ChartLabel> {
        let len = self.geometry.value_length as f64;
        let g = &self.geometry;
        [(0.0, range.min), (len / 2.0, range.mid), (len, range.max)]
            .into_iter()
            .map(|(p, value)| {
                let on_axis = self.to_pixel(0, p);
                let at = match g.orientation {
                    Orientation::TimeVertical => PlotPoint::new(on_axis.x, g.origin.y),
                    Orientation::TimeHorizontal => PlotPoint::new(g.origin.x, on_axis.y),
                };
                ChartLabel { at, value }
            })
            .collect()
    }
}

/// Circular mean; the first value if the mean direction is undefined.
pub fn circular_mean(values: &[f64]) -> f64 {
    let (sin, cos) = values
        .iter()
        .fold((0.0, 0.0), |(s, c), v| (s + v.sin(), c + v.cos()));
    if sin.hypot(cos) < 1e-9 {
        return values.first().copied().map_or(0.0, to_2pi);
    }
    to_2pi(sin.atan2(cos))
}

/// Largest circular distance of any value from `centre`, at most π.
pub fn max_deviation(values: &[f64], centre: f64) -> f64 {
    values
        .iter()
        .map(|v| to_pi(v - centre).abs())
        .fold(0.0, f64::max)
        .min(PI)
}

fn round_to_step(angle: f64, step: f64) -> f64 {
    to_2pi((angle / step).round() * step)
}

fn ceil_to_step(value: f64, step: f64) -> f64 {
    // Tolerance keeps exact multiples from rounding up a step
    ((value / step) - 1e-9).ceil().max(0.0) * step
}

fn adjust_half(half: f64, dev: f64, default_half: f64, step: f64) -> f64 {
    let needed = ceil_to_step(dev, step).min(PI);
    if dev > half {
        needed
    } else if dev + step < half {
        needed.max(default_half)
    } else {
        half
    }
}
