//! Storage error types.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown sink '{0}' (expected jsonl:<path>, sqlite:<path>, or memory)")]
    InvalidSink(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;
