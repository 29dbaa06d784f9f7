//! Simulation hooks for observing the run.
//!
//! Hooks are **observers**: they receive owned copies of what a tick
//! produced and cannot modify simulation state. Output sinks (JSON lines,
//! SQLite) and metrics are hooks, which keeps the core free of I/O.
//!
//! # Example
//!
//! ```ignore
//! use simulation::hooks::{HookContext, SimulationHook};
//! use simulation::ResearchAction;
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct ActionCounter {
//!     count: AtomicU64,
//! }
//!
//! impl SimulationHook for ActionCounter {
//!     fn name(&self) -> &str { "ActionCounter" }
//!
//!     fn on_actions(&self, actions: Vec<ResearchAction>, _ctx: &HookContext) {
//!         self.count.fetch_add(actions.len() as u64, Ordering::Relaxed);
//!     }
//! }
//! ```

use std::sync::Arc;

use performance::PerformanceRecord;
use types::Timestamp;

use crate::action::ResearchAction;
use crate::incident::Incident;
use crate::runner::TickStats;
use crate::summary::RunSummary;

// ─────────────────────────────────────────────────────────────────────────────
// Hook Context
// ─────────────────────────────────────────────────────────────────────────────

/// Owned snapshot of the runner at a hook call.
#[derive(Debug, Clone, PartialEq)]
pub struct HookContext {
    /// Tick number, starting at 1.
    pub tick: u64,
    pub timestamp: Timestamp,
    /// Version of the consensus snapshot analysts saw this tick.
    pub consensus_version: u64,
    pub analysts: usize,
    pub pending_actions: usize,
    pub pending_evaluations: usize,
}

impl HookContext {
    pub fn new(tick: u64, timestamp: Timestamp) -> Self {
        Self {
            tick,
            timestamp,
            consensus_version: 0,
            analysts: 0,
            pending_actions: 0,
            pending_evaluations: 0,
        }
    }

    pub fn with_consensus_version(mut self, version: u64) -> Self {
        self.consensus_version = version;
        self
    }

    pub fn with_analysts(mut self, analysts: usize) -> Self {
        self.analysts = analysts;
        self
    }

    pub fn with_pending(mut self, actions: usize, evaluations: usize) -> Self {
        self.pending_actions = actions;
        self.pending_evaluations = evaluations;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SimulationHook Trait
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for simulation observers.
///
/// Use interior mutability (`Mutex`, atomics) for hook-owned state.
///
/// # Lifecycle
///
/// ```text
/// Simulation.step()
///   on_tick_start()
///   on_records()      ← performance records evaluated this tick
///   on_actions()      ← research actions emitted this tick, in order
///   on_incidents()    ← capacity violations, data gaps
///   on_tick_end()
/// after the last tick:
///   on_simulation_end()
/// ```
pub trait SimulationHook: Send + Sync {
    /// Human-readable name for logging and debugging.
    fn name(&self) -> &str;

    #[allow(unused_variables)]
    fn on_tick_start(&self, ctx: &HookContext) {}

    /// Called with every action emitted in the tick. Not called for empty ticks.
    #[allow(unused_variables)]
    fn on_actions(&self, actions: Vec<ResearchAction>, ctx: &HookContext) {}

    /// Called with records created by evaluations that closed in the tick.
    #[allow(unused_variables)]
    fn on_records(&self, records: Vec<PerformanceRecord>, ctx: &HookContext) {}

    #[allow(unused_variables)]
    fn on_incidents(&self, incidents: Vec<Incident>, ctx: &HookContext) {}

    #[allow(unused_variables)]
    fn on_tick_end(&self, stats: &TickStats, ctx: &HookContext) {}

    /// Called once when the run completes.
    #[allow(unused_variables)]
    fn on_simulation_end(&self, summary: &RunSummary) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// HookRunner
// ─────────────────────────────────────────────────────────────────────────────

/// Manages hook registration and sequential invocation.
///
/// Hooks are called in registration order.
#[derive(Default)]
pub struct HookRunner {
    hooks: Vec<Arc<dyn SimulationHook>>,
}

impl HookRunner {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook. Hooks are called in registration order.
    pub fn add(&mut self, hook: Arc<dyn SimulationHook>) {
        self.hooks.push(hook);
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Get hook names for debugging.
    pub fn hook_names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn on_tick_start(&self, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_tick_start(ctx);
        }
    }

    /// Clones actions for each hook to keep the owned-data contract.
    pub fn on_actions(&self, actions: &[ResearchAction], ctx: &HookContext) {
        if actions.is_empty() {
            return;
        }
        for hook in &self.hooks {
            hook.on_actions(actions.to_vec(), ctx);
        }
    }

    pub fn on_records(&self, records: &[PerformanceRecord], ctx: &HookContext) {
        if records.is_empty() {
            return;
        }
        for hook in &self.hooks {
            hook.on_records(records.to_vec(), ctx);
        }
    }

    pub fn on_incidents(&self, incidents: &[Incident], ctx: &HookContext) {
        if incidents.is_empty() {
            return;
        }
        for hook in &self.hooks {
            hook.on_incidents(incidents.to_vec(), ctx);
        }
    }

    pub fn on_tick_end(&self, stats: &TickStats, ctx: &HookContext) {
        for hook in &self.hooks {
            hook.on_tick_end(stats, ctx);
        }
    }

    pub fn on_simulation_end(&self, summary: &RunSummary) {
        for hook in &self.hooks {
            hook.on_simulation_end(summary);
        }
    }
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookRunner")
            .field("hooks", &self.hook_names())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Built-in Hooks
// ─────────────────────────────────────────────────────────────────────────────

/// A no-op hook useful for testing.
#[derive(Debug, Default)]
pub struct NoOpHook;

impl SimulationHook for NoOpHook {
    fn name(&self) -> &str {
        "NoOp"
    }
}
