//! Archetype configuration errors.
//!
//! Every variant is fatal: a run never starts with an invalid persona.

use std::path::PathBuf;

use behaviors::{Dimension, UnknownDimension, ValidationError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigurationError>;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("archetype name must not be empty")]
    EmptyName,

    #[error("archetype '{archetype}': {source}")]
    Behavior {
        archetype: String,
        #[source]
        source: ValidationError,
    },

    #[error("archetype '{archetype}' is missing the {dimension} dimension")]
    MissingDimension {
        archetype: String,
        dimension: Dimension,
    },

    #[error("archetype '{archetype}': interaction {source_dim}->{target} references undeclared dimension {dimension}")]
    UndeclaredDimension {
        archetype: String,
        source_dim: Dimension,
        target: Dimension,
        dimension: Dimension,
    },

    #[error("archetype '{archetype}': unsupported interaction {source_dim}->{target}")]
    UnsupportedInteraction {
        archetype: String,
        source_dim: Dimension,
        target: Dimension,
    },

    #[error("archetype '{archetype}': interaction {source_dim}->{target} declared twice")]
    DuplicateInteraction {
        archetype: String,
        source_dim: Dimension,
        target: Dimension,
    },

    #[error("archetype '{archetype}': interaction factor {factor} must be within [-1, 1]")]
    InvalidFactor { archetype: String, factor: f64 },

    #[error("archetype '{archetype}': {field} range ({lo}, {hi}) is empty or out of bounds")]
    InvalidRange {
        archetype: String,
        field: &'static str,
        lo: f64,
        hi: f64,
    },

    #[error("archetype '{archetype}': sector whitelist is empty")]
    EmptyWhitelist { archetype: String },

    #[error("archetype '{archetype}': max target revision {value} must be > 0")]
    InvalidRevisionCap { archetype: String, value: f64 },

    #[error("unknown archetype '{0}'")]
    UnknownArchetype(String),

    #[error(transparent)]
    UnknownDimension(#[from] UnknownDimension),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid archetype JSON: {0}")]
    Json(#[from] serde_json::Error),
}
