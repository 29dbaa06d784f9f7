//! Analyst research simulation - main binary
//!
//! Builds an analyst population from archetypes, runs it against a market
//! event feed, and writes every research action to the configured sinks.
//!
//! ```text
//! ┌──────────────┐   events    ┌──────────────┐   actions   ┌──────────────┐
//! │  Feed        │ ──────────► │  Simulation  │ ──────────► │  Sinks       │
//! │ (synthetic / │   prices    │  (analysts,  │   records   │ (jsonl,      │
//! │  JSON file)  │ ◄────────── │  lifecycle)  │   summary   │  sqlite)     │
//! └──────────────┘             └──────────────┘             └──────────────┘
//! ```
//!
//! # Example
//!
//! ```text
//! analyst-sim --start 2021-01-01 --end 2023-12-31 --seed 42 \
//!     --population oracle=5,follower=20 --sink jsonl:actions.jsonl
//! ```

mod config;
mod error;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use archetypes::ArchetypeDefinition;
use chrono::NaiveDate;
use clap::Parser;
use feed::{SyntheticMarket, SyntheticMarketConfig, SyntheticMarketGenerator};
use simulation::{
    CalibrationReport, Checkpoint, MetricsHook, PopulationEntry, RunSummary, Simulation,
    SimulationConfig,
};
use storage::{Sink, SinkSpec};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::{DEFAULT_POPULATION, FeedSource, RunConfig, RunFile, parse_population};
use crate::error::AppError;

/// Analyst research simulation
#[derive(Parser, Debug)]
#[command(name = "analyst-sim")]
#[command(about = "Synthesizes multi-year analyst research histories from archetype personas")]
#[command(version)]
struct Args {
    /// JSON run file; flags below override its fields
    #[arg(long, env = "SIM_CONFIG")]
    config: Option<PathBuf>,

    /// First day of the run (YYYY-MM-DD)
    #[arg(long, env = "SIM_START")]
    start: Option<NaiveDate>,

    /// Last day of the run, inclusive (YYYY-MM-DD)
    #[arg(long, env = "SIM_END")]
    end: Option<NaiveDate>,

    /// Run seed
    #[arg(long, env = "SIM_SEED")]
    seed: Option<u64>,

    /// Analysts per archetype, e.g. `oracle=5,follower=10`
    #[arg(long, env = "SIM_POPULATION")]
    population: Option<String>,

    /// JSON archetype definitions; may be repeated
    #[arg(long = "archetypes", env = "SIM_ARCHETYPES", value_delimiter = ',')]
    archetype_files: Vec<PathBuf>,

    /// Event feed: `synthetic`, `synthetic:<seed>`, or a JSON file path
    #[arg(long, env = "SIM_FEED")]
    feed: Option<String>,

    /// Securities in a synthetic market [default: 40]
    #[arg(long, env = "SIM_SECURITIES")]
    securities: Option<usize>,

    /// Output sink: `jsonl:<path>`, `sqlite:<path>`, or `memory`; may be repeated
    #[arg(long = "sink", env = "SIM_SINK", value_delimiter = ',')]
    sinks: Vec<String>,

    /// Write a checkpoint after this many ticks
    #[arg(long, env = "SIM_CHECKPOINT_AT")]
    checkpoint_at: Option<u64>,

    /// Checkpoint file [default: analyst-sim.checkpoint.json]
    #[arg(long, env = "SIM_CHECKPOINT")]
    checkpoint: Option<PathBuf>,

    /// Replay and verify a checkpoint before running
    #[arg(long, env = "SIM_RESUME")]
    resume: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long, env = "SIM_SUMMARY_JSON")]
    summary_json: Option<PathBuf>,

    /// Print the calibration report against archetype target ranges
    #[arg(long, env = "SIM_CALIBRATION")]
    calibration: bool,

    /// Run the relevance scan sequentially even when built with `parallel`
    #[arg(long, env = "SIM_SEQUENTIAL")]
    sequential: bool,
}

impl Args {
    /// Merge flags over the run file (if any) over defaults.
    fn into_config(self) -> Result<RunConfig, AppError> {
        let file = match &self.config {
            Some(path) => RunFile::load(path)?,
            None => RunFile::default(),
        };
        let defaults = RunConfig::default();

        let mut simulation = file.simulation.unwrap_or_default();
        if let Some(start) = self.start {
            simulation.start = start;
        }
        if let Some(end) = self.end {
            simulation.end = end;
        }
        if let Some(seed) = self.seed {
            simulation.seed = seed;
        }
        if self.sequential {
            simulation.force_sequential = true;
        }

        let population = self
            .population
            .or(file.population)
            .unwrap_or_else(|| DEFAULT_POPULATION.to_string());
        let feed = match self.feed.or(file.feed) {
            Some(feed) => feed.parse::<FeedSource>()?,
            None => defaults.feed,
        };
        let sinks = if self.sinks.is_empty() {
            file.sinks
        } else {
            self.sinks
        };
        let sinks = sinks
            .iter()
            .map(|s| s.parse::<SinkSpec>())
            .collect::<Result<Vec<_>, _>>()?;
        let archetype_files = if self.archetype_files.is_empty() {
            file.archetypes
        } else {
            self.archetype_files
        };

        Ok(RunConfig {
            simulation,
            population: parse_population(&population)?,
            archetype_files,
            feed,
            securities: self
                .securities
                .or(file.securities)
                .unwrap_or(defaults.securities),
            sinks,
            checkpoint_at: self.checkpoint_at.or(file.checkpoint_at),
            checkpoint_path: self
                .checkpoint
                .or(file.checkpoint)
                .unwrap_or(defaults.checkpoint_path),
            resume: self.resume,
            summary_json: self.summary_json.or(file.summary_json),
            calibration: self.calibration || file.calibration,
        })
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = Args::parse().into_config().and_then(|config| run(&config));
    match result {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "run failed");
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Setup
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve population names against archetype files first, then built-ins.
fn build_population(config: &RunConfig) -> Result<Vec<PopulationEntry>, AppError> {
    let mut custom: BTreeMap<String, Arc<ArchetypeDefinition>> = BTreeMap::new();
    for path in &config.archetype_files {
        for definition in archetypes::load_archetypes(path)? {
            info!(archetype = definition.name(), file = %path.display(), "loaded archetype");
            custom.insert(definition.name().to_ascii_lowercase(), Arc::new(definition));
        }
    }

    config
        .population
        .iter()
        .map(|p| {
            let key = p.archetype.to_ascii_lowercase();
            let archetype = match custom.get(&key) {
                Some(definition) => Arc::clone(definition),
                None => archetypes::registry::shared(&p.archetype)?,
            };
            Ok(PopulationEntry::new(archetype, p.count))
        })
        .collect()
}

fn load_market(config: &RunConfig) -> Result<SyntheticMarket, AppError> {
    match &config.feed {
        FeedSource::Synthetic { .. } => {
            let sim = &config.simulation;
            let market_config = SyntheticMarketConfig::default()
                .with_dates(sim.start, sim.end)
                .with_securities(config.securities);
            Ok(SyntheticMarketGenerator::new(market_config, config.market_seed()).generate()?)
        }
        FeedSource::File(path) => Ok(feed::load_feed(path)?),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Run
// ─────────────────────────────────────────────────────────────────────────────

fn run(config: &RunConfig) -> Result<RunSummary, AppError> {
    let population = build_population(config)?;
    let market = load_market(config)?;
    info!(
        feed = %config.feed,
        events = market.feed.len(),
        analysts = config.total_analysts(),
        "inputs ready"
    );

    let mut sim = Simulation::new(
        config.simulation.clone(),
        market.feed,
        Arc::new(market.provider),
        &population,
    )?;

    if let Some(path) = &config.resume {
        let checkpoint = Checkpoint::load(path)?;
        sim.resume(&checkpoint)?;
    }

    let sinks: Vec<Sink> = config
        .sinks
        .iter()
        .map(SinkSpec::open)
        .collect::<Result<_, _>>()?;
    for sink in &sinks {
        info!(?sink, "sink attached");
        sim.add_hook(sink.hook());
    }
    let metrics = Arc::new(MetricsHook::new());
    sim.add_hook(metrics.clone());

    if let Some(at) = config.checkpoint_at {
        while sim.tick() < at && sim.step()?.is_some() {}
        let checkpoint = sim.checkpoint();
        checkpoint.save(&config.checkpoint_path)?;
        info!(
            tick = checkpoint.tick,
            path = %config.checkpoint_path.display(),
            "checkpoint written"
        );
    }

    let summary = sim.run()?;

    // Report every sink failure before failing the run.
    let mut first_failure = None;
    for sink in &sinks {
        if let Err(e) = sink.finish() {
            error!(?sink, error = %e, "sink failed");
            first_failure.get_or_insert(e);
        }
    }
    if let Some(e) = first_failure {
        return Err(e.into());
    }

    let snapshot = metrics.snapshot();
    info!(
        ticks = snapshot.total_ticks,
        actions = snapshot.total_actions,
        peak_actions_per_tick = snapshot.peak_actions_per_tick,
        mean_forecast_error = ?snapshot.mean_forecast_error,
        "metrics"
    );

    if config.calibration {
        let report = CalibrationReport::from_simulation(&sim);
        report.log_mismatches();
        println!("{report}");
    }

    if let Some(path) = &config.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(path, json).map_err(|source| AppError::Io {
            path: path.clone(),
            source,
        })?;
    }

    Ok(summary)
}
