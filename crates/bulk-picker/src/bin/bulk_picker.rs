//! Offline tools for a picking station: run the vision steps on saved frames,
//! fit and query the coordinate model, and sample the distance sensor.

use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use bulk_picker::aruco::{Dictionary, MarkerDetector};
use bulk_picker::core::to_gray;
use bulk_picker::estimator::{annotate_candidates, PickCandidate, PickablePointEstimator};
use bulk_picker::sensor::{reduce_distance, DepthSampler, SerialDepthSampler};
use bulk_picker::transform::{CalibrationSample, CoordinateTransformer};
use bulk_picker::{load_color_image, save_color_image, PickerConfig};
use clap::{Parser, Subcommand};
use log::info;
use nalgebra::Point2;
use serde::Serialize;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "bulk-picker", version, about = "Vision-guided bulk picking tools")]
struct Cli {
    /// Picker configuration JSON. Defaults are used if omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rank pickable points on a bulk image and print them as JSON.
    Estimate {
        image: PathBuf,
        /// Write a copy of the frame with the top candidates marked.
        #[arg(long)]
        annotate: Option<PathBuf>,
        /// Number of candidates drawn by `--annotate`.
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Suction window side in pixels.
        #[arg(long)]
        picker_size: Option<usize>,
        /// Use the frame as stored, even if the config mirrors frames.
        #[arg(long)]
        no_mirror: bool,
    },
    /// Detect calibration markers on an image and print them as JSON.
    Markers {
        image: PathBuf,
        /// Dictionary JSON; falls back to the config's `dictionary_path`.
        #[arg(long)]
        dictionary: Option<PathBuf>,
    },
    /// Fit the coordinate model from a JSON list of calibration samples.
    Fit {
        samples: PathBuf,
        /// Model file to write; falls back to the config's `model_path`.
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Map an image point into arm coordinates.
    #[command(allow_negative_numbers = true)]
    Predict {
        u: f64,
        v: f64,
        #[arg(long)]
        model: Option<PathBuf>,
    },
    /// Read the distance sensor and print the filtered median.
    Measure {
        /// Readings to collect; falls back to the config's motion settings.
        #[arg(long)]
        samples: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
struct EstimateReport {
    width: usize,
    height: usize,
    candidates: Vec<PickCandidate>,
    target: Option<TargetReport>,
}

#[derive(Debug, Serialize)]
struct TargetReport {
    rank: usize,
    point: Point2<f32>,
}

#[derive(Debug, Serialize)]
struct FitReport {
    model: PathBuf,
    coefficients: [[f64; 3]; 2],
    rms_residual: f64,
    residuals: Vec<f64>,
}

#[derive(Debug, Serialize)]
struct MeasureReport {
    readings: usize,
    distance: f64,
}

fn main() {
    init_logging();
    if let Err(err) = try_main() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

#[cfg(feature = "tracing")]
fn init_logging() {
    bulk_picker::core::init_tracing(false);
}

#[cfg(not(feature = "tracing"))]
fn init_logging() {
    let _ = bulk_picker::core::init_from_env(log::LevelFilter::Warn);
}

fn try_main() -> CliResult<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PickerConfig::load_json(path)?,
        None => PickerConfig::default(),
    };

    let json = match cli.command {
        Commands::Estimate {
            image,
            annotate,
            limit,
            picker_size,
            no_mirror,
        } => run_estimate(&config, &image, annotate.as_deref(), limit, picker_size, no_mirror)?,
        Commands::Markers { image, dictionary } => {
            run_markers(&config, &image, dictionary.as_deref())?
        }
        Commands::Fit { samples, model } => {
            run_fit(&samples, model.unwrap_or_else(|| config.model_path.clone()))?
        }
        Commands::Predict { u, v, model } => {
            let transformer =
                CoordinateTransformer::open(model.unwrap_or_else(|| config.model_path.clone()))?;
            let p = transformer.predict(Point2::new(u, v))?;
            serde_json::to_string_pretty(&p)?
        }
        Commands::Measure { samples } => run_measure(&config, samples)?,
    };
    println!("{json}");
    Ok(())
}

fn run_estimate(
    config: &PickerConfig,
    image: &Path,
    annotate: Option<&Path>,
    limit: usize,
    picker_size: Option<usize>,
    no_mirror: bool,
) -> CliResult<String> {
    let mut frame = load_color_image(image)?;
    if config.mirror_frames && !no_mirror {
        frame = frame.mirrored_horizontally();
    }
    let mut adjust = config.adjust.clone();
    if let Some(size) = picker_size {
        adjust = adjust.with_picker_size(size);
    }

    let estimator = PickablePointEstimator::new(config.estimator.clone());
    let candidates = estimator.estimate_pickable_points(&frame);
    let target = estimator
        .select_target(&frame, &candidates, &adjust)
        .map(|(rank, c)| TargetReport {
            rank,
            point: c.point,
        });

    if let Some(out) = annotate {
        save_color_image(&annotate_candidates(&frame, &candidates, limit), out)?;
        info!("annotated frame written to {}", out.display());
    }

    Ok(serde_json::to_string_pretty(&EstimateReport {
        width: frame.width,
        height: frame.height,
        candidates,
        target,
    })?)
}

fn run_markers(
    config: &PickerConfig,
    image: &Path,
    dictionary: Option<&Path>,
) -> CliResult<String> {
    let dict_path = dictionary
        .or(config.dictionary_path.as_deref())
        .ok_or("no marker dictionary given")?;
    let detector = MarkerDetector::new(Dictionary::load_json(dict_path)?, config.markers.clone());

    let mut frame = load_color_image(image)?;
    if config.mirror_frames {
        frame = frame.mirrored_horizontally();
    }
    let detections = detector.detect(&to_gray(&frame).view());
    info!("{} markers detected", detections.len());
    Ok(serde_json::to_string_pretty(&detections)?)
}

fn run_fit(samples: &Path, model: PathBuf) -> CliResult<String> {
    let samples: Vec<CalibrationSample> = serde_json::from_str(&fs::read_to_string(samples)?)?;
    let mut transformer = CoordinateTransformer::open(&model)?;
    let fitted = *transformer.fit(&samples)?;
    let residuals = transformer.residuals(&samples)?;
    Ok(serde_json::to_string_pretty(&FitReport {
        model,
        coefficients: fitted.coefficients,
        rms_residual: fitted.rms_residual,
        residuals,
    })?)
}

fn run_measure(config: &PickerConfig, samples: Option<usize>) -> CliResult<String> {
    let times = samples.unwrap_or(config.motion.distance_samples);
    let mut sensor = SerialDepthSampler::new(config.sensor.clone());
    let readings = sensor.acquire_distance(times)?;
    let distance = reduce_distance(&readings, config.motion.max_valid_distance)?;
    Ok(serde_json::to_string_pretty(&MeasureReport {
        readings: readings.len(),
        distance,
    })?)
}
