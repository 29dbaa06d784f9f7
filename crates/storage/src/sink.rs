//! Sink identifiers and opened sinks.
//!
//! | id              | sink                 |
//! |-----------------|----------------------|
//! | `jsonl:<path>`  | [`JsonLinesSink`]    |
//! | `sqlite:<path>` | [`SqliteSink`]       |
//! | `memory`        | [`MemorySink`]       |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use simulation::SimulationHook;

use crate::error::{Result, StorageError};
use crate::jsonl::JsonLinesSink;
use crate::memory::MemorySink;
use crate::sqlite::SqliteSink;

/// Parsed output sink identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSpec {
    JsonLines(PathBuf),
    Sqlite(PathBuf),
    Memory,
}

impl FromStr for SinkSpec {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("memory") {
            return Ok(Self::Memory);
        }
        match s.split_once(':') {
            Some(("jsonl", path)) if !path.is_empty() => Ok(Self::JsonLines(path.into())),
            Some(("sqlite", path)) if !path.is_empty() => Ok(Self::Sqlite(path.into())),
            _ => Err(StorageError::InvalidSink(s.to_string())),
        }
    }
}

impl fmt::Display for SinkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JsonLines(path) => write!(f, "jsonl:{}", path.display()),
            Self::Sqlite(path) => write!(f, "sqlite:{}", path.display()),
            Self::Memory => f.write_str("memory"),
        }
    }
}

impl SinkSpec {
    pub fn open(&self) -> Result<Sink> {
        Ok(match self {
            Self::JsonLines(path) => Sink::JsonLines(Arc::new(JsonLinesSink::create(path)?)),
            Self::Sqlite(path) => Sink::Sqlite(Arc::new(SqliteSink::open(path)?)),
            Self::Memory => Sink::Memory(Arc::new(MemorySink::new())),
        })
    }
}

/// An opened sink: register [`Sink::hook`] with the simulation, then call
/// [`Sink::finish`] after the run.
#[derive(Clone)]
pub enum Sink {
    JsonLines(Arc<JsonLinesSink>),
    Sqlite(Arc<SqliteSink>),
    Memory(Arc<MemorySink>),
}

impl Sink {
    pub fn hook(&self) -> Arc<dyn SimulationHook> {
        match self {
            Self::JsonLines(s) => s.clone(),
            Self::Sqlite(s) => s.clone(),
            Self::Memory(s) => s.clone(),
        }
    }

    /// Flush and surface the first write failure.
    pub fn finish(&self) -> Result<()> {
        match self {
            Self::JsonLines(s) => s.finish(),
            Self::Sqlite(s) => s.finish(),
            Self::Memory(_) => Ok(()),
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sink").field(&self.hook().name()).finish()
    }
}
