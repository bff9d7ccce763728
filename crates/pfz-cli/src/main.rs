//! `pfz`: predict potential fishing zones for one date.
//! Logs go to stderr; stdout carries only the run summary.

use std::fs;
use std::hash::Hasher;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use rustc_hash::FxHasher;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pfz_core::export::to_feature_collection;
use pfz_core::{PfzPredictor, PipelineConfig, PredictionResult};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "pfz", about = "Predict potential fishing zones along the Tunisian coast")]
struct Args {
    /// Prediction date (YYYY-MM-DD). Defaults to today.
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// JSON pipeline configuration. Missing fields take their defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model artifact (JSON). Overrides the config.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Feature scaler (JSON). Overrides the config.
    #[arg(long)]
    scaler: Option<PathBuf>,

    /// Land polygons (GeoJSON). Overrides the config.
    #[arg(long)]
    land_polygons: Option<PathBuf>,

    /// Linkage distance for HIGH zone clustering, km.
    #[arg(long)]
    cluster_distance_km: Option<f64>,

    /// Write the full result as JSON.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write areas and singleton zones as a GeoJSON FeatureCollection.
    #[arg(long)]
    geojson: Option<PathBuf>,

    /// Reuse results stored here for the same date and configuration.
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    dump_config: bool,
}

// ── Setup ─────────────────────────────────────────────────────────────────────

fn setup_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("invalid log filter {level:?}"))?;
    let layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("logger initialization failed")?;
    Ok(())
}

/// Base config from `--config` (or defaults) with command-line overrides.
fn effective_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(p) = &args.model {
        config.resources.model = Some(p.clone());
    }
    if let Some(p) = &args.scaler {
        config.resources.scaler = Some(p.clone());
    }
    if let Some(p) = &args.land_polygons {
        config.resources.land_polygons = Some(p.clone());
    }
    if let Some(km) = args.cluster_distance_km {
        config.cluster_distance_km = km;
    }
    Ok(config)
}

// ── Cache ─────────────────────────────────────────────────────────────────────

/// Fingerprint of a configuration's serialized form.
fn config_fingerprint(config: &PipelineConfig) -> Result<u64> {
    let bytes = serde_json::to_vec(config).context("serializing config")?;
    let mut h = FxHasher::default();
    h.write(&bytes);
    Ok(h.finish())
}

fn cache_path(dir: &Path, date: NaiveDate, config: &PipelineConfig) -> Result<PathBuf> {
    let key = config_fingerprint(config)?;
    Ok(dir.join(format!("pfz-{}-{key:016x}.json", date.format("%Y-%m-%d"))))
}

/// A cached result, if present and readable. Unreadable entries are ignored.
fn read_cache(path: &Path) -> Option<PredictionResult> {
    let text = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&text) {
        Ok(r) => Some(r),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable cache entry");
            None
        }
    }
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn run(config: PipelineConfig, date: NaiveDate, cache_dir: Option<&Path>) -> Result<PredictionResult> {
    let cached = match cache_dir {
        Some(dir) => Some(cache_path(dir, date, &config)?),
        None => None,
    };
    if let Some(path) = &cached {
        if let Some(result) = read_cache(path) {
            info!(path = %path.display(), "using cached prediction");
            return Ok(result);
        }
        debug!(path = %path.display(), "no cached prediction");
    }

    let predictor = PfzPredictor::from_config(config).context("building predictor")?;
    let result = predictor.predict(date).context("running prediction")?;

    if let Some(path) = &cached {
        write_json(path, &result)?;
        debug!(path = %path.display(), "cached prediction");
    }
    Ok(result)
}

// ── Entry ─────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args.log_level)?;

    let config = effective_config(&args)?;
    if args.dump_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    config.validate().context("invalid configuration")?;

    let date = args.date.unwrap_or_else(|| chrono::Local::now().date_naive());
    let result = run(config, date, args.cache_dir.as_deref())?;

    if let Some(path) = &args.output {
        write_json(path, &result)?;
        info!(path = %path.display(), "wrote prediction");
    }
    if let Some(path) = &args.geojson {
        write_json(path, &to_feature_collection(&result))?;
        info!(path = %path.display(), "wrote geojson");
    }

    let d = &result.diagnostics;
    println!("date:          {}", result.date);
    println!("classifier:    {:?}", d.classifier);
    println!("water cells:   {} of {}", result.water_cell_count, d.candidate_cells);
    println!("HIGH/MED/LOW:  {}/{}/{}", d.high_cells, d.medium_cells, d.low_cells);
    println!("areas:         {}", result.areas.len());
    println!("singletons:    {}", result.singletons.len());
    for (i, a) in result.areas.iter().enumerate() {
        println!(
            "  area {i:>3}: {:>4} zones  centre ({:.3}, {:.3})  avg confidence {:.2}",
            a.count, a.center_lat, a.center_lon, a.avg_confidence
        );
    }
    Ok(())
}
