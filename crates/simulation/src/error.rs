//! Fatal simulation errors.
//!
//! Recoverable problems (capacity violations, data gaps) are not errors;
//! they are recorded as [`crate::Incident`]s and the run continues.

use std::path::PathBuf;

use archetypes::ConfigurationError;
use feed::FeedError;
use performance::PerformanceError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimulationError>;

/// Resume-time mismatch between a checkpoint and the current run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReproducibilityError {
    #[error("fingerprint mismatch: checkpoint {expected}, current run {actual}")]
    Fingerprint { expected: String, actual: String },

    #[error("action log diverged at tick {tick}: checkpoint {expected}, replay {actual}")]
    ActionLog {
        tick: u64,
        expected: String,
        actual: String,
    },

    #[error("replay ended at tick {reached} before checkpoint tick {tick}")]
    Truncated { tick: u64, reached: u64 },

    #[error("resume requires a fresh simulation, {0} ticks already processed")]
    AlreadyStarted(u64),
}

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    Performance(#[from] PerformanceError),

    #[error(transparent)]
    Reproducibility(#[from] ReproducibilityError),

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),

    #[error("population is empty")]
    EmptyPopulation,

    #[error("no security matches the coverage constraints of archetype {0}")]
    NoEligibleCoverage(String),

    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
