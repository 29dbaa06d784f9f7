//! Research-side enums: recommendations, content and action kinds, idea
//! stages, and analyst performance states.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Recommendation
// =============================================================================

/// Five-level investment recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Recommendation {
    /// Map an expected return (upside of target vs. current price) to a rating.
    pub fn from_upside(upside: f64) -> Self {
        if upside > 0.15 {
            Recommendation::StrongBuy
        } else if upside > 0.05 {
            Recommendation::Buy
        } else if upside >= -0.05 {
            Recommendation::Hold
        } else if upside >= -0.15 {
            Recommendation::Sell
        } else {
            Recommendation::StrongSell
        }
    }

    /// Numeric score used for consensus averaging (+2 strong buy .. -2 strong sell).
    pub fn score(self) -> f64 {
        match self {
            Recommendation::StrongBuy => 2.0,
            Recommendation::Buy => 1.0,
            Recommendation::Hold => 0.0,
            Recommendation::Sell => -1.0,
            Recommendation::StrongSell => -2.0,
        }
    }

    /// Sign of the directional call (0 for Hold).
    pub fn direction(self) -> f64 {
        match self {
            Recommendation::StrongBuy | Recommendation::Buy => 1.0,
            Recommendation::Hold => 0.0,
            Recommendation::Sell | Recommendation::StrongSell => -1.0,
        }
    }
}

// =============================================================================
// ContentType
// =============================================================================

/// Kind of document the publishing layer renders for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentType {
    CompanyModel,
    EarningsPreview,
    SectorResearch,
    QuickUpdate,
    InitiationCoverage,
    MeetingNote,
    ThesisUpdate,
}

// =============================================================================
// ActionType
// =============================================================================

/// Kind of decision recorded in a research action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ActionType {
    /// Opens coverage of a security with a new idea.
    NewIdea,
    /// Note on an existing idea without a new target.
    Update,
    /// Revised target price (and possibly rating) on an active idea.
    TargetPriceRevision,
    /// Moves an idea forward in its lifecycle (NewIdea→WIP, WIP→Active).
    StageTransition,
    /// Drops a WIP idea without publishing.
    Pass,
    /// Closes an active idea.
    Exit,
}

impl ActionType {
    pub fn all() -> &'static [ActionType] {
        &[
            ActionType::NewIdea,
            ActionType::Update,
            ActionType::TargetPriceRevision,
            ActionType::StageTransition,
            ActionType::Pass,
            ActionType::Exit,
        ]
    }

    /// Actions permitted when the analyst is at coverage capacity.
    pub fn allowed_at_capacity(self) -> bool {
        !matches!(self, ActionType::NewIdea)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ActionType::NewIdea => "new_idea",
            ActionType::Update => "update",
            ActionType::TargetPriceRevision => "target_price_revision",
            ActionType::StageTransition => "stage_transition",
            ActionType::Pass => "pass",
            ActionType::Exit => "exit",
        };
        f.write_str(s)
    }
}

// =============================================================================
// IdeaStage
// =============================================================================

/// Lifecycle stage of a research idea.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdeaStage {
    NewIdea,
    Wip,
    Active,
    Exit,
    Pass,
}

impl IdeaStage {
    /// Exit and Pass are terminal; an idea never leaves them.
    pub fn is_terminal(self) -> bool {
        matches!(self, IdeaStage::Exit | IdeaStage::Pass)
    }
}

impl fmt::Display for IdeaStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IdeaStage::NewIdea => "NewIdea",
            IdeaStage::Wip => "WIP",
            IdeaStage::Active => "Active",
            IdeaStage::Exit => "Exit",
            IdeaStage::Pass => "Pass",
        };
        f.write_str(s)
    }
}

// =============================================================================
// PerformanceState
// =============================================================================

/// Coarse classification of an analyst's recent track record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PerformanceState {
    HotStreak,
    ColdStreak,
    #[default]
    Neutral,
    Recovering,
    Declining,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommendation_from_upside() {
        assert_eq!(Recommendation::from_upside(0.30), Recommendation::StrongBuy);
        assert_eq!(Recommendation::from_upside(0.10), Recommendation::Buy);
        assert_eq!(Recommendation::from_upside(0.0), Recommendation::Hold);
        assert_eq!(Recommendation::from_upside(-0.10), Recommendation::Sell);
        assert_eq!(Recommendation::from_upside(-0.40), Recommendation::StrongSell);
    }

    #[test]
    fn test_recommendation_direction() {
        assert_eq!(Recommendation::Buy.direction(), 1.0);
        assert_eq!(Recommendation::Hold.direction(), 0.0);
        assert_eq!(Recommendation::StrongSell.direction(), -1.0);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(IdeaStage::Exit.is_terminal());
        assert!(IdeaStage::Pass.is_terminal());
        assert!(!IdeaStage::Active.is_terminal());
    }

    #[test]
    fn test_only_new_idea_blocked_at_capacity() {
        for action in ActionType::all() {
            assert_eq!(
                action.allowed_at_capacity(),
                *action != ActionType::NewIdea
            );
        }
    }
}
