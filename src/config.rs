//! Run configuration assembled from the command line.
//!
//! Everything the binary needs to build and drive one simulation run:
//! the engine config, which archetypes to spawn and how many, where the
//! market comes from, and where output goes.
//!
//! Values come from an optional JSON run file ([`RunFile`]); command line
//! flags override it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use simulation::SimulationConfig;
use storage::SinkSpec;

use crate::error::AppError;

/// Default population when none is given: one of each built-in archetype.
pub const DEFAULT_POPULATION: &str = "oracle=2,follower=4,sprayer=2,specialist=2,contrarian=2";

// ─────────────────────────────────────────────────────────────────────────────
// Population
// ─────────────────────────────────────────────────────────────────────────────

/// `name=count` pair from `--population`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopulationArg {
    pub archetype: String,
    pub count: usize,
}

/// Parse `oracle=5,follower=10`. A bare name means one analyst.
pub fn parse_population(s: &str) -> Result<Vec<PopulationArg>, AppError> {
    let mut out = Vec::new();
    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (name, count) = match part.split_once('=') {
            Some((name, count)) => {
                let count = count.trim().parse::<usize>().map_err(|_| {
                    AppError::InvalidArgument(format!("bad count in population entry '{part}'"))
                })?;
                (name.trim(), count)
            }
            None => (part, 1),
        };
        if name.is_empty() {
            return Err(AppError::InvalidArgument(format!(
                "missing archetype name in population entry '{part}'"
            )));
        }
        out.push(PopulationArg {
            archetype: name.to_string(),
            count,
        });
    }
    if out.is_empty() {
        return Err(AppError::InvalidArgument("population is empty".into()));
    }
    Ok(out)
}

// ─────────────────────────────────────────────────────────────────────────────
// Feed source
// ─────────────────────────────────────────────────────────────────────────────

/// Where market events and price history come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSource {
    /// Seeded synthetic market; `None` reuses the run seed.
    Synthetic { seed: Option<u64> },
    /// JSON feed file (see `feed::load_feed`).
    File(PathBuf),
}

impl FromStr for FeedSource {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "synthetic" {
            return Ok(Self::Synthetic { seed: None });
        }
        if let Some(seed) = s.strip_prefix("synthetic:") {
            let seed = seed
                .parse::<u64>()
                .map_err(|_| AppError::InvalidArgument(format!("bad synthetic seed '{seed}'")))?;
            return Ok(Self::Synthetic { seed: Some(seed) });
        }
        let path = s.strip_prefix("file:").unwrap_or(s);
        if path.is_empty() {
            return Err(AppError::InvalidArgument("empty feed source".into()));
        }
        Ok(Self::File(path.into()))
    }
}

impl fmt::Display for FeedSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Synthetic { seed: None } => f.write_str("synthetic"),
            Self::Synthetic { seed: Some(seed) } => write!(f, "synthetic:{seed}"),
            Self::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Run file
// ─────────────────────────────────────────────────────────────────────────────

/// JSON run file. Every field is optional.
///
/// ```json
/// {
///   "simulation": { "start": "2021-01-01", "end": "2023-12-31", "seed": 42 },
///   "population": "oracle=5,follower=20",
///   "sinks": ["jsonl:actions.jsonl"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunFile {
    pub simulation: Option<SimulationConfig>,
    pub population: Option<String>,
    pub archetypes: Vec<PathBuf>,
    pub feed: Option<String>,
    pub securities: Option<usize>,
    pub sinks: Vec<String>,
    pub checkpoint_at: Option<u64>,
    pub checkpoint: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    pub calibration: bool,
}

impl RunFile {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path).map_err(|source| AppError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// RunConfig
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub simulation: SimulationConfig,
    pub population: Vec<PopulationArg>,
    /// Extra archetype definitions; names here shadow built-ins.
    pub archetype_files: Vec<PathBuf>,
    pub feed: FeedSource,
    /// Securities in a synthetic market.
    pub securities: usize,
    pub sinks: Vec<SinkSpec>,
    /// Write a checkpoint after this many ticks.
    pub checkpoint_at: Option<u64>,
    pub checkpoint_path: PathBuf,
    /// Replay and verify this checkpoint before running.
    pub resume: Option<PathBuf>,
    pub summary_json: Option<PathBuf>,
    pub calibration: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            population: Vec::new(),
            archetype_files: Vec::new(),
            feed: FeedSource::Synthetic { seed: None },
            securities: 40,
            sinks: Vec::new(),
            checkpoint_at: None,
            checkpoint_path: PathBuf::from("analyst-sim.checkpoint.json"),
            resume: None,
            summary_json: None,
            calibration: false,
        }
    }
}

impl RunConfig {
    /// Seed for the synthetic market.
    pub fn market_seed(&self) -> u64 {
        match self.feed {
            FeedSource::Synthetic { seed: Some(seed) } => seed,
            _ => self.simulation.seed,
        }
    }

    pub fn total_analysts(&self) -> usize {
        self.population.iter().map(|p| p.count).sum()
    }
}
