//! Outcome horizon per action type.

use serde::{Deserialize, Serialize};
use types::ActionType;

/// Days between an action and the evaluation of its forecast.
///
/// Pass and Exit close an idea without a forward-looking forecast and are
/// never evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Horizons {
    pub new_idea: u32,
    pub update: u32,
    pub target_price_revision: u32,
    pub stage_transition: u32,
}

impl Default for Horizons {
    fn default() -> Self {
        Self {
            new_idea: 180,
            update: 60,
            target_price_revision: 90,
            stage_transition: 90,
        }
    }
}

impl Horizons {
    /// Same horizon for every evaluated action type.
    pub fn uniform(days: u32) -> Self {
        Self {
            new_idea: days,
            update: days,
            target_price_revision: days,
            stage_transition: days,
        }
    }

    pub fn days_for(&self, action: ActionType) -> Option<u32> {
        let days = match action {
            ActionType::NewIdea => self.new_idea,
            ActionType::Update => self.update,
            ActionType::TargetPriceRevision => self.target_price_revision,
            ActionType::StageTransition => self.stage_transition,
            ActionType::Pass | ActionType::Exit => return None,
        };
        (days > 0).then_some(days)
    }

    pub fn longest(&self) -> u32 {
        self.new_idea
            .max(self.update)
            .max(self.target_price_revision)
            .max(self.stage_transition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closing_actions_have_no_horizon() {
        let horizons = Horizons::default();
        assert_eq!(horizons.days_for(ActionType::Pass), None);
        assert_eq!(horizons.days_for(ActionType::Exit), None);
        assert_eq!(horizons.days_for(ActionType::TargetPriceRevision), Some(90));
    }

    #[test]
    fn test_zero_disables_evaluation() {
        let horizons = Horizons {
            update: 0,
            ..Horizons::default()
        };
        assert_eq!(horizons.days_for(ActionType::Update), None);
        assert_eq!(horizons.longest(), 180);
    }
}
