//! qhist command-line interface.
//!
//! Bins plain-text event lists into a 3D histogram and reports summary
//! statistics as JSON.
#![allow(clippy::cast_precision_loss, clippy::too_many_lines)]

mod input;

use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::info;
use qhist_algorithms::{
    Binner, EdgeBinner, EventList, Histogram3D, HistogramConfig, ProjectionBinner, UniformBinner,
    Vector3, Weighting,
};
use serde::Serialize;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Core error: {0}")]
    Core(#[from] qhist_core::Error),

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// 3D event histogramming for time-of-flight neutron scattering.
#[derive(Parser)]
#[command(name = "qhist")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bin an event file into a 3D histogram and print a JSON summary
    Bin {
        /// Event file with `x y z [code]` lines
        input: PathBuf,

        /// Lower bound of every axis
        #[arg(long, default_value = "-10.0", allow_hyphen_values = true)]
        min: f64,

        /// Upper bound of every axis
        #[arg(long, default_value = "10.0", allow_hyphen_values = true)]
        max: f64,

        /// Bins along every axis
        #[arg(long, default_value = "100")]
        bins: usize,

        /// Column axis direction
        #[arg(long, default_value = "1,0,0", value_parser = input::parse_vector, allow_hyphen_values = true)]
        x_dir: Vector3,

        /// Row axis direction
        #[arg(long, default_value = "0,1,0", value_parser = input::parse_vector, allow_hyphen_values = true)]
        y_dir: Vector3,

        /// Page axis direction
        #[arg(long, default_value = "0,0,1", value_parser = input::parse_vector, allow_hyphen_values = true)]
        z_dir: Vector3,

        /// Number of page segments binned in parallel
        #[arg(long, default_value = "4")]
        segments: usize,

        /// Count every event once instead of adding its code
        #[arg(long)]
        unit_weights: bool,

        /// Intensity level boundaries for event extraction, e.g. `1,10,100`
        #[arg(long, value_parser = input::parse_levels)]
        levels: Option<input::Levels>,
    },

    /// Show information about an event file
    Info {
        /// Event file with `x y z [code]` lines
        input: PathBuf,
    },
}

#[derive(Serialize)]
struct LevelReport {
    level: usize,
    lower: f64,
    /// `None` for the overflow level.
    upper: Option<f64>,
    events: usize,
}

#[derive(Serialize)]
struct BinReport {
    /// Binner shared by the three axes.
    axis: UniformBinner,
    config: HistogramConfig,
    /// Pages, rows, columns.
    shape: [usize; 3],
    events_read: usize,
    sum: f64,
    min: f32,
    max: f32,
    elapsed_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    levels: Option<Vec<LevelReport>>,
}

fn level_report(hist: &Histogram3D, levels: &dyn Binner) -> Vec<LevelReport> {
    let lists = hist.merged_event_lists(levels);
    lists
        .iter()
        .enumerate()
        .map(|(level, list)| {
            let (lower, upper) = if level < levels.num_bins() {
                (levels.min_of(level), Some(levels.max_of(level)))
            } else {
                (levels.max_val(), None)
            };
            LevelReport {
                level,
                lower,
                upper,
                events: list.as_ref().map_or(0, EventList::len),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Bin {
            input,
            min,
            max,
            bins,
            x_dir,
            y_dir,
            z_dir,
            segments,
            unit_weights,
            levels,
        } => {
            let start = Instant::now();
            let events = input::read_events(&input)?;
            info!("read {} events from {}", events.len(), input.display());

            let binner = UniformBinner::new(min, max, bins)?;
            let x = ProjectionBinner::from_binner(binner.clone(), x_dir)?;
            let y = ProjectionBinner::from_binner(binner.clone(), y_dir)?;
            let z = ProjectionBinner::from_binner(binner.clone(), z_dir)?;

            let weighting = if unit_weights {
                Weighting::Unit
            } else {
                Weighting::Codes
            };
            let config = HistogramConfig::default()
                .with_segments(segments)
                .with_weighting(weighting);
            let mut hist = Histogram3D::new(x, y, z, config)?;
            let sum = hist.add_events(&events);

            let levels = match levels {
                Some(input::Levels(edges)) => {
                    let level_binner = EdgeBinner::new(edges)?;
                    Some(level_report(&hist, &level_binner))
                }
                None => None,
            };

            let shape = hist.shape();
            let report = BinReport {
                axis: binner,
                config: hist.config().clone(),
                shape: [shape.pages, shape.rows, shape.cols],
                events_read: events.len(),
                sum,
                min: hist.min_val(),
                max: hist.max_val(),
                elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
                levels,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Info { input } => {
            let events = input::read_events(&input)?;

            println!("File: {}", input.display());
            println!("Events: {}", events.len());
            println!("Total code: {}", events.total_code());
            if let Some(extent) = events.extent() {
                for (name, [lo, hi]) in ["X", "Y", "Z"].iter().zip(extent) {
                    println!("{name} range: {lo} - {hi}");
                }
            }
        }
    }

    Ok(())
}
