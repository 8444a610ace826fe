//! # Boat Data Simulator Entry Point
//!
//! This binary drives the processing pipeline with synthetic bus data, so
//! calibration, true wind and chart scaling can be checked without a boat.
//!
//! ## Modes
//! - **Default**: print a summary of every history buffer
//! - **`--stdout`**: draw an ASCII strip chart of one buffer
//! - **`--json`**: print the chart frame as JSON
//!
//! ## Options
//! - `--cycles N`: number of one-second cycles to run (default 600)
//! - `--chart NAME`: history buffer to chart (default TWD)
//! - `--seed N`: seed of the synthetic bus (default 1)
//!
//! Every 150 cycles the wind sensor drops out for 20 cycles, which shows up as
//! a gap in the chart unless simulation is enabled in `boatdata.toml`.

// Test modules
#[cfg(test)]
mod tests;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::env;
use tracing_subscriber::EnvFilter;

use boatdata_lib::chart::{ChartFrame, ChartGeometry, ChartScaler, Orientation};
use boatdata_lib::config::Config;
use boatdata_lib::pipeline::Pipeline;
use boatdata_lib::renderer::AsciiSurface;
use boatdata_lib::simulation::Simulator;
use boatdata_lib::{BoatValue, BoatValueList, ValueFormat};

const DEFAULT_CYCLES: u64 = 600;
const OUTAGE_EVERY: u64 = 150;
const OUTAGE_CYCLES: u64 = 20;
const ASCII_COLS: usize = 72;
const ASCII_ROWS: usize = 36;

/// Command line options.
#[derive(Debug)]
struct Options {
    stdout: bool,
    json: bool,
    cycles: u64,
    chart: String,
    seed: u64,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut options = Options {
        stdout: false,
        json: false,
        cycles: DEFAULT_CYCLES,
        chart: "TWD".to_string(),
        seed: 1,
    };
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--stdout" => options.stdout = true,
            "--json" => options.json = true,
            "--cycles" => {
                let value = iter.next().context("--cycles needs a value")?;
                options.cycles = value.parse().context("--cycles is not a number")?;
            }
            "--chart" => {
                options.chart = iter.next().context("--chart needs a buffer name")?.clone();
            }
            "--seed" => {
                let value = iter.next().context("--seed needs a value")?;
                options.seed = value.parse().context("--seed is not a number")?;
            }
            other => return Err(anyhow!("unknown argument: {other}")),
        }
    }
    Ok(options)
}

/// Synthetic bus: the simulator's drift sampled on a virtual one-second clock.
struct SyntheticBus {
    simulator: Simulator,
    start: DateTime<Utc>,
}

impl SyntheticBus {
    fn new(seed: u64) -> Self {
        SyntheticBus {
            simulator: Simulator::seeded(seed),
            start: Utc::now(),
        }
    }

    /// Snapshot for `cycle`; wind values are invalid during outages.
    fn snapshot(&mut self, cycle: u64) -> BoatValueList {
        let now = self.start + Duration::seconds(cycle as i64);
        let outage = cycle % OUTAGE_EVERY >= OUTAGE_EVERY - OUTAGE_CYCLES;

        let mut values = BoatValueList::new();
        for (name, format) in [
            ("AWA", ValueFormat::Wind),
            ("AWS", ValueFormat::Knots),
            ("STW", ValueFormat::Knots),
            ("HDM", ValueFormat::Course),
            ("VAR", ValueFormat::Wind),
            ("DBT", ValueFormat::Depth),
            ("WTemp", ValueFormat::KelvinToC),
        ] {
            let mut value = BoatValue::new(name, format);
            let wind_sensor = matches!(name, "AWA" | "AWS");
            if !(outage && wind_sensor) {
                if let Some(si) = self.simulator.value_at(name, &value.format, Some(now)) {
                    // Small easterly variation instead of the generic angle band
                    let si = if name == "VAR" { si - std::f64::consts::FRAC_PI_2 } else { si };
                    value.set(si);
                }
            }
            values.upsert(value);
        }
        values
    }
}

/// JSON document of `--json`.
#[derive(Serialize)]
struct ChartReport<'a> {
    buffer: &'a str,
    generated: DateTime<Utc>,
    cycles: u64,
    samples: usize,
    frame: &'a ChartFrame,
}

fn print_summary(pipeline: &Pipeline) {
    println!("{:<6} {:>6} {:>8} {:>8} {:>8} {:>8}", "type", "count", "last", "min", "max", "median");
    let formatter = pipeline.formatter();
    for buffer in pipeline.history().buffers() {
        let format = buffer.format();
        let text = |raw: Option<f64>| {
            raw.map(|v| formatter.text(buffer.name(), format, buffer.to_si(v)))
                .unwrap_or_else(|| "---".to_string())
        };
        println!(
            "{:<6} {:>6} {:>8} {:>8} {:>8} {:>8}",
            buffer.name(),
            buffer.len(),
            text(buffer.last().map(f64::from)),
            text(buffer.min().map(f64::from)),
            text(buffer.max().map(f64::from)),
            text(buffer.median()),
        );
    }
}

/// Main application entry point.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    let options = parse_args(&args)?;
    let config = Config::load();

    let mut pipeline = Pipeline::from_config(&config);
    if !pipeline.history_mut().add_buffer(&options.chart) {
        return Err(anyhow!("no history support for {}", options.chart));
    }

    let mut bus = SyntheticBus::new(options.seed);
    for cycle in 0..options.cycles {
        let snapshot = bus.snapshot(cycle);
        pipeline.process_cycle(&snapshot);
    }
    tracing::info!(cycles = pipeline.cycles(), simulation = config.simulation, "simulation finished");

    if !options.stdout && !options.json {
        print_summary(&pipeline);
        return Ok(());
    }

    let buffer = pipeline
        .history()
        .buffer(&options.chart)
        .with_context(|| format!("history buffer {} missing", options.chart))?;
    let geometry = ChartGeometry::from(&config.chart);
    let mut scaler = ChartScaler::for_buffer(geometry, buffer, config.chart.interval);
    let Some(frame) = scaler.update(buffer) else {
        eprintln!("No samples recorded for {}", options.chart);
        return Ok(());
    };

    if options.json {
        let report = ChartReport {
            buffer: &options.chart,
            generated: Utc::now(),
            cycles: pipeline.cycles(),
            samples: buffer.len(),
            frame: &frame,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    if options.stdout {
        let (width, height) = match geometry.orientation {
            Orientation::TimeVertical => (geometry.value_length, geometry.axis_length),
            Orientation::TimeHorizontal => (geometry.axis_length, geometry.value_length),
        };
        let mut surface = AsciiSurface::new(ASCII_COLS, ASCII_ROWS, width, height);
        let formatter = pipeline.formatter();
        frame.replay(&mut surface, |v| formatter.text(buffer.name(), buffer.format(), v));

        println!(
            "{} over {} samples, range {} .. {}",
            options.chart,
            buffer.len(),
            formatter.text(buffer.name(), buffer.format(), frame.range.min),
            formatter.text(buffer.name(), buffer.format(), frame.range.max),
        );
        println!("{}", surface.render());
    }

    Ok(())
}
