//! End-of-run summary.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use performance::PerformanceSnapshot;
use serde::{Deserialize, Serialize};
use types::{ActionType, AnalystId};

use crate::incident::Incident;

/// Per-analyst totals and rolling performance at the end of the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystSummary {
    pub analyst_id: AnalystId,
    pub name: String,
    pub archetype: String,
    pub actions: u64,
    pub ideas_opened: u64,
    pub ideas_open: usize,
    pub ideas_exited: usize,
    pub ideas_passed: usize,
    pub performance: PerformanceSnapshot,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub seed: u64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub ticks: u64,
    pub total_actions: u64,
    pub actions_by_type: BTreeMap<ActionType, u64>,
    pub ideas_opened: u64,
    pub ideas_exited: u64,
    pub ideas_passed: u64,
    pub capacity_violations: u64,
    pub data_gaps: u64,
    pub incidents: Vec<Incident>,
    /// Performance records created.
    pub records: u64,
    /// Evaluations still waiting for their horizon when the run ended.
    pub pending_evaluations: usize,
    pub analysts: Vec<AnalystSummary>,
    /// SHA-256 over the serialized action log.
    pub action_log_hash: String,
}

impl RunSummary {
    pub fn actions_of(&self, action_type: ActionType) -> u64 {
        self.actions_by_type.get(&action_type).copied().unwrap_or(0)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} .. {} (seed {}, {} ticks)",
            self.start, self.end, self.seed, self.ticks
        )?;
        writeln!(f, "  actions: {}", self.total_actions)?;
        for (action_type, count) in &self.actions_by_type {
            writeln!(f, "    {:<22} {count}", action_type.to_string())?;
        }
        writeln!(
            f,
            "  ideas: {} opened, {} exited, {} passed",
            self.ideas_opened, self.ideas_exited, self.ideas_passed
        )?;
        writeln!(
            f,
            "  incidents: {} capacity violations, {} data gaps",
            self.capacity_violations, self.data_gaps
        )?;
        writeln!(
            f,
            "  evaluations: {} records, {} pending",
            self.records, self.pending_evaluations
        )?;
        for a in &self.analysts {
            let accuracy = a
                .performance
                .accuracy
                .map_or_else(|| "-".to_string(), |v| format!("{v:.3}"));
            writeln!(
                f,
                "  {:>4} {:<16} {:<12} actions {:>5}  accuracy {:>6}  confidence {:.2}  {:?}",
                a.analyst_id.0,
                a.name,
                a.archetype,
                a.actions,
                accuracy,
                a.performance.confidence,
                a.performance.state,
            )?;
        }
        write!(f, "  action log sha256: {}", self.action_log_hash)
    }
}
