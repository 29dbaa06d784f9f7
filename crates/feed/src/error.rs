//! Feed construction and loading errors.

use std::path::PathBuf;

use thiserror::Error;
use types::{EventId, Field, SecurityId};

pub type Result<T> = std::result::Result<T, FeedError>;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("{id}: {reason}")]
    InvalidEvent { id: EventId, reason: String },

    #[error("duplicate event id {0}")]
    DuplicateEvent(EventId),

    #[error("invalid {field:?} value {value} for {security}")]
    InvalidValue {
        security: SecurityId,
        field: Field,
        value: f64,
    },

    #[error("invalid generator config: {0}")]
    InvalidConfig(String),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid feed JSON: {0}")]
    Json(#[from] serde_json::Error),
}
