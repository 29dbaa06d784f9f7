//! Core identifier types for the analyst simulation.
//!
//! Every entity the engine emits or tracks is addressed by a newtype id so
//! that analyst, action, and record ids can never be mixed up.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Core ID Types
// =============================================================================

/// Unique identifier for a simulated analyst.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct AnalystId(pub u64);

impl fmt::Display for AnalystId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Analyst#{}", self.0)
    }
}

/// Unique identifier for an emitted research action.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct ActionId(pub u64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action#{}", self.0)
    }
}

/// Unique identifier for a performance record.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct RecordId(pub u64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record#{}", self.0)
    }
}

/// Unique identifier for a market event in the input feed.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct EventId(pub u64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Event#{}", self.0)
    }
}

/// Identifier of a research idea.
///
/// The owning analyst is part of the id: an idea's history belongs to one
/// analyst for its whole lifetime, so there is no way to address an idea
/// without also naming its owner.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct IdeaId {
    /// Analyst that opened (and owns) the idea.
    pub analyst: AnalystId,
    /// Per-analyst sequence number, starting at 1.
    pub seq: u32,
}

impl IdeaId {
    pub fn new(analyst: AnalystId, seq: u32) -> Self {
        Self { analyst, seq }
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Idea#{}-{}", self.analyst.0, self.seq)
    }
}

// =============================================================================
// Security Type
// =============================================================================

/// Security identifier (e.g., "AAPL US Equity").
pub type SecurityId = String;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idea_id_orders_by_analyst_then_seq() {
        let a = IdeaId::new(AnalystId(1), 9);
        let b = IdeaId::new(AnalystId(2), 1);
        let c = IdeaId::new(AnalystId(2), 3);
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b.to_string(), "Idea#2-1");
    }

    #[test]
    fn test_newtype_conversions() {
        let id: AnalystId = 7u64.into();
        let raw: u64 = id.into();
        assert_eq!(raw, 7);
        assert_eq!(ActionId(3).to_string(), "Action#3");
    }
}
