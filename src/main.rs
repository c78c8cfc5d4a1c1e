use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use citytemp::{
    annotate,
    config::{DEFAULT_SIGMA, DEFAULT_WINDOW, DEFAULT_WORKERS},
    group_readings, is_anomaly, smooth, Config, Dataset, Error, Parallel, Season, Sequential,
};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Flags temperature readings that fall outside their city/season baseline.
#[derive(Parser, Debug)]
#[command(name = "citytemp")]
#[command(version)]
struct Args {
    /// Historical CSV with timestamp, city, season and temperature columns
    #[arg(short, long, env = "CITYTEMP_INPUT", default_value = "temperature_data.csv")]
    input: PathBuf,

    /// Rolling average window, in readings
    #[arg(long, default_value_t = DEFAULT_WINDOW, env = "CITYTEMP_WINDOW")]
    window: usize,

    /// Worker threads for the parallel run
    #[arg(long, default_value_t = DEFAULT_WORKERS, env = "CITYTEMP_WORKERS")]
    workers: usize,

    /// Half-width of the acceptance band, in standard deviations
    #[arg(long, default_value_t = DEFAULT_SIGMA, env = "CITYTEMP_SIGMA")]
    sigma: f64,

    /// City to check a live reading for
    #[arg(long, requires = "temperature")]
    city: Option<String>,

    /// Season of the live reading; defaults to the current one
    #[arg(long)]
    season: Option<Season>,

    /// Live temperature to check
    #[arg(long, requires = "city", allow_negative_numbers = true)]
    temperature: Option<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "citytemp=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config {
        window: args.window,
        workers: args.workers,
        sigma: args.sigma,
    };
    config.validate()?;

    let dataset = Dataset::from_path(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    info!(rows = dataset.len(), cities = dataset.cities().len(), "dataset loaded");

    let smoothed = smooth(dataset.readings(), config.window);
    let groups = group_readings(&smoothed);

    let serial = annotate(&groups, &Sequential, config.sigma);
    let parallel = annotate(&groups, &Parallel::from(&config), config.sigma);
    info!(
        sequential_ms = serial.elapsed.as_secs_f64() * 1000.0,
        parallel_ms = parallel.elapsed.as_secs_f64() * 1000.0,
        identical = serial.readings == parallel.readings,
        "strategies compared"
    );
    info!(anomalies = serial.anomalies().count(), "historical anomalies");
    for row in serial.anomalies() {
        debug!(
            reading = %row.reading.reading,
            lower = row.lower_bound,
            upper = row.upper_bound,
            "anomalous reading"
        );
    }

    if let (Some(city), Some(temperature)) = (args.city, args.temperature) {
        let season = args.season.unwrap_or_else(|| Season::of(Local::now().date_naive()));
        match is_anomaly(temperature, &serial.baselines, &city, season) {
            Ok(anomalous) => {
                if let Some(baseline) = serial.baselines.get(&city, season) {
                    info!(%city, %season, temperature, %baseline, "historical baseline");
                }
                println!(
                    "{city} ({season}): {temperature:.1} is {}",
                    if anomalous { "anomalous" } else { "normal" }
                );
            }
            Err(err @ Error::NoBaseline { .. }) => {
                warn!(%err, "not enough data");
                println!("{city} ({season}): not enough historical data");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}
