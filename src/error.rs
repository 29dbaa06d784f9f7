use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors of a run. Any of these aborts with a non-zero exit code.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Simulation(#[from] simulation::SimulationError),

    #[error(transparent)]
    Storage(#[from] storage::StorageError),

    #[error(transparent)]
    Configuration(#[from] archetypes::ConfigurationError),

    #[error(transparent)]
    Feed(#[from] feed::FeedError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
