//! Productivity policy: output cadence and how fast ideas progress.

use rand::Rng;
use serde::{Deserialize, Serialize};
use types::IdeaStage;

use crate::distributions;
use crate::error::{Result, ValidationError, check_positive, check_span, check_unit};

const COMPONENT: &str = "productivity";

/// Window over which `volume_target` is measured.
pub const BUDGET_WINDOW_DAYS: f64 = 30.0;

/// Declarative productivity parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductivityParams {
    /// Target research actions per 30 days.
    pub volume_target: f64,
    /// Base time-in-stage in days, `(min, max)`.
    pub progression_speed_days: (f64, f64),
    /// Probability a WIP idea becomes Active rather than being passed on.
    pub idea_completion_rate: f64,
    /// Probability an Active idea is closed at a given review.
    pub exit_rate: f64,
    /// Multiple of `volume_target` tolerated in a busy window.
    pub burst_allowance: f64,
}

impl Default for ProductivityParams {
    fn default() -> Self {
        Self {
            volume_target: 6.0,
            progression_speed_days: (10.0, 30.0),
            idea_completion_rate: 0.7,
            exit_rate: 0.15,
            burst_allowance: 1.5,
        }
    }
}

/// Validated productivity policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProductivityParams", into = "ProductivityParams")]
pub struct ProductivityBehavior {
    params: ProductivityParams,
}

impl ProductivityBehavior {
    pub fn new(params: ProductivityParams) -> Result<Self> {
        check_positive(COMPONENT, "volume_target", params.volume_target)?;
        check_span(
            COMPONENT,
            "progression_speed_days",
            params.progression_speed_days,
            0.0,
        )?;
        if params.progression_speed_days.0 <= 0.0 {
            return Err(ValidationError::new(
                COMPONENT,
                "progression_speed_days",
                params.progression_speed_days,
                "min must be > 0",
            ));
        }
        check_unit(COMPONENT, "idea_completion_rate", params.idea_completion_rate)?;
        check_unit(COMPONENT, "exit_rate", params.exit_rate)?;
        if !(params.burst_allowance.is_finite() && params.burst_allowance >= 1.0) {
            return Err(ValidationError::new(
                COMPONENT,
                "burst_allowance",
                params.burst_allowance,
                "must be finite and >= 1",
            ));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &ProductivityParams {
        &self.params
    }

    pub fn volume_target(&self) -> f64 {
        self.params.volume_target
    }

    /// Maximum actions per 30-day window including burst headroom.
    pub fn action_budget(&self) -> f64 {
        self.params.volume_target * self.params.burst_allowance
    }

    /// Cadence budget: another action fits if the trailing-30-day count is under budget.
    pub fn within_budget(&self, recent_actions: usize) -> bool {
        self.within_scaled_budget(recent_actions, 1.0)
    }

    /// Budget check with the window budget multiplied by `publication_scale`.
    pub fn within_scaled_budget(&self, recent_actions: usize, publication_scale: f64) -> bool {
        (recent_actions as f64) < self.action_budget() * publication_scale.max(0.0)
    }

    /// Actions-per-window load relative to target (1.0 = on target).
    pub fn workload(&self, recent_actions: usize) -> f64 {
        recent_actions as f64 / self.params.volume_target
    }

    /// Minimum time-in-stage for an idea entering `stage`, in days.
    ///
    /// Active ideas are held three times longer than the base draw; terminal
    /// stages have no duration.
    pub fn sample_stage_duration<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        stage: IdeaStage,
        scale: f64,
    ) -> f64 {
        let multiplier = match stage {
            IdeaStage::NewIdea => 0.5,
            IdeaStage::Wip => 1.0,
            IdeaStage::Active => 3.0,
            IdeaStage::Exit | IdeaStage::Pass => return 0.0,
        };
        let (min, max) = self.params.progression_speed_days;
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        distributions::uniform(rng, min, max) * multiplier * scale
    }

    /// Whether a WIP idea is promoted to Active.
    pub fn completes_idea<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        distributions::chance(rng, self.params.idea_completion_rate)
    }

    /// Whether an Active idea is exited at this review.
    pub fn exits_idea<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        distributions::chance(rng, self.params.exit_rate)
    }
}

impl TryFrom<ProductivityParams> for ProductivityBehavior {
    type Error = ValidationError;

    fn try_from(params: ProductivityParams) -> Result<Self> {
        Self::new(params)
    }
}

impl From<ProductivityBehavior> for ProductivityParams {
    fn from(behavior: ProductivityBehavior) -> Self {
        behavior.params
    }
}
