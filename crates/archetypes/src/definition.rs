//! Immutable archetype definitions.
//!
//! An [`ArchetypeDefinition`] composes exactly one policy per behavior
//! dimension plus the rules describing how those policies influence each
//! other. Definitions are validated once by [`ArchetypeBuilder`] and then
//! shared read-only (`Arc`) by every analyst instantiated from them.
//!
//! [`ArchetypeBuilder`]: crate::ArchetypeBuilder

use std::collections::BTreeSet;

use behaviors::{
    AccuracyBehavior, BiasBehavior, CoverageBehavior, Dimension, ProductivityBehavior,
    TimingBehavior,
};
use serde::{Deserialize, Serialize};
use types::Sector;

// =============================================================================
// Interaction Rules
// =============================================================================

/// Cross-dimension coupling supported by the engine.
///
/// Only the pairs in [`SUPPORTED_INTERACTIONS`] have defined semantics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRule {
    pub source: Dimension,
    pub target: Dimension,
    /// Coupling strength in `[-1, 1]`; negative values invert the effect.
    pub factor: f64,
}

impl InteractionRule {
    pub fn new(source: Dimension, target: Dimension, factor: f64) -> Self {
        Self {
            source,
            target,
            factor,
        }
    }
}

/// `(source, target)` pairs with defined semantics.
///
/// - Bias -> Accuracy: a strong bias costs `factor * strength` accuracy.
/// - Accuracy -> Timing: rolling confidence above 0.5 shortens delays.
/// - Accuracy -> Bias: low rolling confidence strengthens the bias.
/// - Productivity -> Accuracy: workload above target dilutes accuracy.
/// - Coverage -> Productivity: depth preference lengthens time-in-stage.
pub const SUPPORTED_INTERACTIONS: &[(Dimension, Dimension)] = &[
    (Dimension::Bias, Dimension::Accuracy),
    (Dimension::Accuracy, Dimension::Timing),
    (Dimension::Accuracy, Dimension::Bias),
    (Dimension::Productivity, Dimension::Accuracy),
    (Dimension::Coverage, Dimension::Productivity),
];

pub fn is_supported(source: Dimension, target: Dimension) -> bool {
    SUPPORTED_INTERACTIONS.contains(&(source, target))
}

/// Analyst-specific inputs to the interaction rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionInputs {
    /// Rolling confidence (0.0 to 1.0).
    pub confidence: f64,
    /// Trailing-window actions relative to the volume target (1.0 = on target).
    pub workload: f64,
}

impl Default for InteractionInputs {
    fn default() -> Self {
        Self {
            confidence: 0.5,
            workload: 1.0,
        }
    }
}

/// Resolved adjustments handed to the behavior policies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionEffects {
    /// Accuracy points removed before sampling errors.
    pub accuracy_dampening: f64,
    /// Multiplier on response delays.
    pub delay_scale: f64,
    /// Multiplier on bias strength.
    pub bias_strength_scale: f64,
    /// Multiplier on sampled stage durations.
    pub stage_duration_scale: f64,
    /// Multiplier on the action budget, from the timing policy's
    /// publication frequency.
    pub publication_scale: f64,
}

impl Default for InteractionEffects {
    fn default() -> Self {
        Self {
            accuracy_dampening: 0.0,
            delay_scale: 1.0,
            bias_strength_scale: 1.0,
            stage_duration_scale: 1.0,
            publication_scale: 1.0,
        }
    }
}

const MIN_SCALE: f64 = 0.1;

// =============================================================================
// Constraints & Targets
// =============================================================================

/// Hard limits applied to every action an analyst of this archetype emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Constraints {
    /// Sectors this archetype may cover; `None` means all.
    pub sector_whitelist: Option<BTreeSet<Sector>>,
    /// Stated confidence is clamped into this range.
    pub confidence_range: (f64, f64),
    /// Largest relative target-price change allowed in one action.
    pub max_target_revision: Option<f64>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            sector_whitelist: None,
            confidence_range: (0.0, 1.0),
            max_target_revision: None,
        }
    }
}

impl Constraints {
    pub fn allows_sector(&self, sector: Sector) -> bool {
        self.sector_whitelist
            .as_ref()
            .is_none_or(|sectors| sectors.contains(&sector))
    }

    pub fn clamp_confidence(&self, confidence: f64) -> f64 {
        let (lo, hi) = self.confidence_range;
        confidence.clamp(lo, hi)
    }

    /// Limit a new target to the allowed revision from the previous one.
    pub fn clamp_revision(&self, previous: Option<f64>, target: f64) -> f64 {
        match (previous, self.max_target_revision) {
            (Some(prev), Some(cap)) if prev > 0.0 => {
                target.clamp(prev * (1.0 - cap).max(0.0), prev * (1.0 + cap))
            }
            _ => target,
        }
    }
}

/// Expected outcome bands, used only for calibration reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetRanges {
    /// Directional hit rate.
    pub accuracy: (f64, f64),
    /// Actions per 30 days relative to the volume target.
    pub productivity: (f64, f64),
    /// Percentile of response delay among all analysts (0 = fastest).
    pub timing_percentile: (f64, f64),
}

impl Default for TargetRanges {
    fn default() -> Self {
        Self {
            accuracy: (0.4, 0.8),
            productivity: (0.5, 2.0),
            timing_percentile: (0.2, 0.8),
        }
    }
}

// =============================================================================
// ArchetypeDefinition
// =============================================================================

/// A validated, immutable analyst persona.
///
/// Fields are private; construct through [`crate::ArchetypeBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchetypeDefinition {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) accuracy: AccuracyBehavior,
    pub(crate) timing: TimingBehavior,
    pub(crate) coverage: CoverageBehavior,
    pub(crate) bias: BiasBehavior,
    pub(crate) productivity: ProductivityBehavior,
    pub(crate) interactions: Vec<InteractionRule>,
    pub(crate) constraints: Constraints,
    pub(crate) targets: TargetRanges,
}

impl ArchetypeDefinition {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn accuracy(&self) -> &AccuracyBehavior {
        &self.accuracy
    }

    pub fn timing(&self) -> &TimingBehavior {
        &self.timing
    }

    pub fn coverage(&self) -> &CoverageBehavior {
        &self.coverage
    }

    pub fn bias(&self) -> &BiasBehavior {
        &self.bias
    }

    pub fn productivity(&self) -> &ProductivityBehavior {
        &self.productivity
    }

    pub fn interactions(&self) -> &[InteractionRule] {
        &self.interactions
    }

    pub fn constraints(&self) -> &Constraints {
        &self.constraints
    }

    pub fn targets(&self) -> &TargetRanges {
        &self.targets
    }

    fn factor(&self, source: Dimension, target: Dimension) -> Option<f64> {
        self.interactions
            .iter()
            .find(|r| r.source == source && r.target == target)
            .map(|r| r.factor)
    }

    /// Resolve every declared interaction rule for one analyst's current state.
    ///
    /// Dimensions without a rule are left at their neutral effect.
    pub fn effects(&self, inputs: InteractionInputs) -> InteractionEffects {
        let mut effects = InteractionEffects {
            publication_scale: self.timing.publication_frequency(),
            ..InteractionEffects::default()
        };
        let confidence = inputs.confidence.clamp(0.0, 1.0);

        if let Some(f) = self.factor(Dimension::Bias, Dimension::Accuracy) {
            effects.accuracy_dampening += f * self.bias.strength();
        }
        if let Some(f) = self.factor(Dimension::Productivity, Dimension::Accuracy) {
            effects.accuracy_dampening += f * (inputs.workload - 1.0).max(0.0);
        }
        if let Some(f) = self.factor(Dimension::Accuracy, Dimension::Timing) {
            effects.delay_scale = (1.0 - f * (confidence - 0.5) * 2.0).max(MIN_SCALE);
        }
        if let Some(f) = self.factor(Dimension::Accuracy, Dimension::Bias) {
            effects.bias_strength_scale = (1.0 + f * (0.5 - confidence) * 2.0).max(0.0);
        }
        if let Some(f) = self.factor(Dimension::Coverage, Dimension::Productivity) {
            effects.stage_duration_scale =
                (1.0 + f * self.coverage.depth_preference()).max(MIN_SCALE);
        }
        effects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates;

    #[test]
    fn test_supported_table() {
        assert!(is_supported(Dimension::Bias, Dimension::Accuracy));
        assert!(!is_supported(Dimension::Timing, Dimension::Coverage));
    }

    #[test]
    fn test_effects_neutral_without_rules() {
        let def = crate::ArchetypeBuilder::from_definition(&templates::follower().unwrap())
            .clear_interactions()
            .build()
            .unwrap();
        let effects = def.effects(InteractionInputs {
            confidence: 0.9,
            workload: 3.0,
        });
        assert_eq!(effects, InteractionEffects::default());
    }

    #[test]
    fn test_publication_frequency_scales_budget() {
        let sprayer = templates::sprayer().unwrap();
        let oracle = templates::oracle().unwrap();
        let inputs = InteractionInputs::default();
        assert_eq!(
            sprayer.effects(inputs).publication_scale,
            sprayer.timing().publication_frequency()
        );
        assert!(
            sprayer.effects(inputs).publication_scale > oracle.effects(inputs).publication_scale
        );
    }

    #[test]
    fn test_confident_analyst_responds_faster() {
        let def = crate::ArchetypeBuilder::from_definition(&templates::oracle().unwrap())
            .clear_interactions()
            .interaction(Dimension::Accuracy, Dimension::Timing, 0.5)
            .build()
            .unwrap();
        let confident = def.effects(InteractionInputs {
            confidence: 0.9,
            workload: 1.0,
        });
        let shaky = def.effects(InteractionInputs {
            confidence: 0.1,
            workload: 1.0,
        });
        assert!(confident.delay_scale < 1.0);
        assert!(shaky.delay_scale > 1.0);
    }

    #[test]
    fn test_revision_cap() {
        let constraints = Constraints {
            max_target_revision: Some(0.2),
            ..Default::default()
        };
        assert!((constraints.clamp_revision(Some(100.0), 150.0) - 120.0).abs() < 1e-9);
        assert!((constraints.clamp_revision(Some(100.0), 50.0) - 80.0).abs() < 1e-9);
        assert_eq!(constraints.clamp_revision(None, 150.0), 150.0);
    }

    #[test]
    fn test_whitelist() {
        let constraints = Constraints {
            sector_whitelist: Some([Sector::Energy].into_iter().collect()),
            ..Default::default()
        };
        assert!(constraints.allows_sector(Sector::Energy));
        assert!(!constraints.allows_sector(Sector::Utilities));
        assert!(Constraints::default().allows_sector(Sector::Utilities));
    }
}
