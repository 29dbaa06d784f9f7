//! Output sinks for the analyst simulation.
//!
//! Every sink is a [`simulation::SimulationHook`]: the core never does I/O,
//! sinks observe owned copies of what each tick produced.
//!
//! - [`JsonLinesSink`]: one tagged JSON object per line
//! - [`SqliteSink`]: normalized tables, one transaction per tick
//! - [`MemorySink`]: keeps everything in memory
//!
//! Hook callbacks cannot return errors, so each sink keeps its first write
//! failure, logs it, stops writing, and reports it from `finish()`.

pub mod error;
mod jsonl;
mod memory;
mod schema;
mod sink;
mod sqlite;

pub use error::{Result, StorageError};
pub use jsonl::JsonLinesSink;
pub use memory::MemorySink;
pub use schema::init_schema;
pub use sink::{Sink, SinkSpec};
pub use sqlite::SqliteSink;
