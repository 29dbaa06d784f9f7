//! Simulation crate: the discrete-event loop for the analyst research engine.
//!
//! This crate turns archetypes and a market event feed into a stream of
//! research actions:
//! - Analyst population spawned from archetypes
//! - Decision engine (relevance, timing, idea lifecycle, forecasts)
//! - Consensus snapshots shared by all analysts at each tick
//! - Outcome evaluation feeding rolling confidence back into decisions
//! - Hook-based observation (output sinks, metrics)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                Simulation.step()                 │
//! │                                                  │
//! │  1. Hook: on_tick_start                          │
//! │  2. Evaluate due forecasts → rolling performance │
//! │  3. Commit consensus snapshot                    │
//! │  4. Relevance scan of new events (parallel)      │
//! │  5. Periodic catch-up review                     │
//! │  6. Resolve due pending actions                  │
//! │  7. Hooks: records, actions, incidents, tick end │
//! │                                                  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use feed::{SyntheticMarketConfig, SyntheticMarketGenerator};
//! use simulation::{MetricsHook, PopulationEntry, Simulation, SimulationConfig};
//!
//! let market = SyntheticMarketGenerator::new(SyntheticMarketConfig::default(), 7).generate()?;
//! let population = vec![PopulationEntry::new(archetypes::registry::shared("Oracle")?, 5)];
//! let mut sim = Simulation::new(
//!     SimulationConfig::default(),
//!     market.feed,
//!     Arc::new(market.provider),
//!     &population,
//! )?;
//! let metrics = Arc::new(MetricsHook::new());
//! sim.add_hook(metrics.clone());
//!
//! let summary = sim.run()?;
//! println!("{summary}");
//! ```
//!
//! # Parallel Execution
//!
//! With the `parallel` feature, the per-event relevance scan runs on rayon.
//! Everything that draws random numbers or mutates state stays sequential
//! in analyst-id order, so results do not depend on the feature.

pub mod action;
pub mod analyst;
pub mod calibration;
pub mod checkpoint;
pub mod config;
pub mod consensus;
pub mod decision;
pub mod error;
pub mod factory;
pub mod hooks;
pub mod incident;
mod metrics;
pub mod parallel;
mod runner;
pub mod summary;

pub use action::{ContentPayload, ResearchAction};
pub use analyst::{AnalystInstance, AnalystProfile, AnalystState};
pub use calibration::{CalibrationReport, CalibrationStatus};
pub use checkpoint::Checkpoint;
pub use config::SimulationConfig;
pub use consensus::{ConsensusEntry, ConsensusSnapshot};
pub use error::{ReproducibilityError, Result, SimulationError};
pub use factory::{PopulationEntry, PopulationSpec, spawn_population};
pub use incident::{CapacityViolation, DataGapError, Incident};
pub use runner::{Response, Simulation, TickStats};
pub use summary::{AnalystSummary, RunSummary};

// Re-export hook types
pub use hooks::{HookContext, HookRunner, NoOpHook, SimulationHook};
pub use metrics::{MetricsHook, MetricsSnapshot};
