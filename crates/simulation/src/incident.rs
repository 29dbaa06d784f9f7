//! Recoverable incidents recorded in the run summary.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use types::{AnalystId, EventId, Field, SecurityId, Timestamp};

/// A NewIdea attempted while the analyst was at coverage capacity.
///
/// The action is downgraded to a no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{analyst} at capacity ({active}/{max}) could not open {security} at {at}")]
pub struct CapacityViolation {
    pub analyst: AnalystId,
    pub security: SecurityId,
    pub at: Timestamp,
    pub active: usize,
    pub max: usize,
}

/// Data needed for a decision or evaluation was missing.
///
/// The affected analyst is skipped for that decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{analyst}: no {field:?} for {security} as of {as_of} (needed at {at})")]
pub struct DataGapError {
    pub analyst: AnalystId,
    pub security: SecurityId,
    pub field: Field,
    pub as_of: chrono::NaiveDate,
    pub at: Timestamp,
    pub trigger: Option<EventId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Incident {
    CapacityViolation(CapacityViolation),
    DataGap(DataGapError),
}

impl Incident {
    pub fn analyst(&self) -> AnalystId {
        match self {
            Incident::CapacityViolation(v) => v.analyst,
            Incident::DataGap(g) => g.analyst,
        }
    }

    pub fn at(&self) -> Timestamp {
        match self {
            Incident::CapacityViolation(v) => v.at,
            Incident::DataGap(g) => g.at,
        }
    }
}

impl std::fmt::Display for Incident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Incident::CapacityViolation(v) => write!(f, "capacity violation: {v}"),
            Incident::DataGap(g) => write!(f, "data gap: {g}"),
        }
    }
}

impl From<CapacityViolation> for Incident {
    fn from(v: CapacityViolation) -> Self {
        Incident::CapacityViolation(v)
    }
}

impl From<DataGapError> for Incident {
    fn from(g: DataGapError) -> Self {
        Incident::DataGap(g)
    }
}
