//! Fluent construction and validation of archetype definitions.

use behaviors::{
    AccuracyBehavior, BehaviorComponent, BiasBehavior, CoverageBehavior, Dimension,
    ProductivityBehavior, TimingBehavior,
};
use types::Sector;

use crate::definition::{
    ArchetypeDefinition, Constraints, InteractionRule, TargetRanges, is_supported,
};
use crate::error::{ConfigurationError, Result};

/// Builder for [`ArchetypeDefinition`].
///
/// Every dimension must be supplied before [`build`](Self::build) succeeds.
/// Start from an existing definition with [`from_definition`](Self::from_definition)
/// to derive a variant, or pull selected dimensions from another archetype
/// with [`merge_from`](Self::merge_from) to create a hybrid.
#[derive(Debug, Clone, Default)]
pub struct ArchetypeBuilder {
    name: String,
    description: String,
    accuracy: Option<AccuracyBehavior>,
    timing: Option<TimingBehavior>,
    coverage: Option<CoverageBehavior>,
    bias: Option<BiasBehavior>,
    productivity: Option<ProductivityBehavior>,
    interactions: Vec<InteractionRule>,
    constraints: Constraints,
    targets: TargetRanges,
}

impl ArchetypeBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Start from a copy of an existing definition.
    pub fn from_definition(def: &ArchetypeDefinition) -> Self {
        Self {
            name: def.name.clone(),
            description: def.description.clone(),
            accuracy: Some(def.accuracy.clone()),
            timing: Some(def.timing.clone()),
            coverage: Some(def.coverage.clone()),
            bias: Some(def.bias.clone()),
            productivity: Some(def.productivity.clone()),
            interactions: def.interactions.clone(),
            constraints: def.constraints.clone(),
            targets: def.targets.clone(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn accuracy(mut self, behavior: AccuracyBehavior) -> Self {
        self.accuracy = Some(behavior);
        self
    }

    pub fn timing(mut self, behavior: TimingBehavior) -> Self {
        self.timing = Some(behavior);
        self
    }

    pub fn coverage(mut self, behavior: CoverageBehavior) -> Self {
        self.coverage = Some(behavior);
        self
    }

    pub fn bias(mut self, behavior: BiasBehavior) -> Self {
        self.bias = Some(behavior);
        self
    }

    pub fn productivity(mut self, behavior: ProductivityBehavior) -> Self {
        self.productivity = Some(behavior);
        self
    }

    /// Set whichever dimension the component belongs to.
    pub fn component(self, component: BehaviorComponent) -> Self {
        match component {
            BehaviorComponent::Accuracy(b) => self.accuracy(b),
            BehaviorComponent::Timing(b) => self.timing(b),
            BehaviorComponent::Coverage(b) => self.coverage(b),
            BehaviorComponent::Bias(b) => self.bias(b),
            BehaviorComponent::Productivity(b) => self.productivity(b),
        }
    }

    /// Copy the listed dimensions from another archetype.
    pub fn merge_from(mut self, other: &ArchetypeDefinition, dimensions: &[Dimension]) -> Self {
        for dimension in dimensions {
            match dimension {
                Dimension::Accuracy => self.accuracy = Some(other.accuracy.clone()),
                Dimension::Timing => self.timing = Some(other.timing.clone()),
                Dimension::Coverage => self.coverage = Some(other.coverage.clone()),
                Dimension::Bias => self.bias = Some(other.bias.clone()),
                Dimension::Productivity => {
                    self.productivity = Some(other.productivity.clone())
                }
            }
        }
        self
    }

    pub fn interaction(mut self, source: Dimension, target: Dimension, factor: f64) -> Self {
        self.interactions
            .push(InteractionRule::new(source, target, factor));
        self
    }

    pub fn clear_interactions(mut self) -> Self {
        self.interactions.clear();
        self
    }

    pub fn constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn sector_whitelist(mut self, sectors: impl IntoIterator<Item = Sector>) -> Self {
        self.constraints.sector_whitelist = Some(sectors.into_iter().collect());
        self
    }

    pub fn targets(mut self, targets: TargetRanges) -> Self {
        self.targets = targets;
        self
    }

    fn is_declared(&self, dimension: Dimension) -> bool {
        match dimension {
            Dimension::Accuracy => self.accuracy.is_some(),
            Dimension::Timing => self.timing.is_some(),
            Dimension::Coverage => self.coverage.is_some(),
            Dimension::Bias => self.bias.is_some(),
            Dimension::Productivity => self.productivity.is_some(),
        }
    }

    fn validate_interactions(&self) -> Result<()> {
        for (i, rule) in self.interactions.iter().enumerate() {
            if !(rule.factor.is_finite() && (-1.0..=1.0).contains(&rule.factor)) {
                return Err(ConfigurationError::InvalidFactor {
                    archetype: self.name.clone(),
                    factor: rule.factor,
                });
            }
            for dimension in [rule.source, rule.target] {
                if !self.is_declared(dimension) {
                    return Err(ConfigurationError::UndeclaredDimension {
                        archetype: self.name.clone(),
                        source_dim: rule.source,
                        target: rule.target,
                        dimension,
                    });
                }
            }
            if !is_supported(rule.source, rule.target) {
                return Err(ConfigurationError::UnsupportedInteraction {
                    archetype: self.name.clone(),
                    source_dim: rule.source,
                    target: rule.target,
                });
            }
            let duplicate = self.interactions[..i]
                .iter()
                .any(|r| r.source == rule.source && r.target == rule.target);
            if duplicate {
                return Err(ConfigurationError::DuplicateInteraction {
                    archetype: self.name.clone(),
                    source_dim: rule.source,
                    target: rule.target,
                });
            }
        }
        Ok(())
    }

    fn check_range(&self, field: &'static str, (lo, hi): (f64, f64), bounds: (f64, f64)) -> Result<()> {
        let ok = lo.is_finite() && hi.is_finite() && lo <= hi && lo >= bounds.0 && hi <= bounds.1;
        if ok {
            Ok(())
        } else {
            Err(ConfigurationError::InvalidRange {
                archetype: self.name.clone(),
                field,
                lo,
                hi,
            })
        }
    }

    fn validate_ranges(&self) -> Result<()> {
        if self
            .constraints
            .sector_whitelist
            .as_ref()
            .is_some_and(|s| s.is_empty())
        {
            return Err(ConfigurationError::EmptyWhitelist {
                archetype: self.name.clone(),
            });
        }
        self.check_range("confidence_range", self.constraints.confidence_range, (0.0, 1.0))?;
        if let Some(cap) = self.constraints.max_target_revision
            && !(cap.is_finite() && cap > 0.0)
        {
            return Err(ConfigurationError::InvalidRevisionCap {
                archetype: self.name.clone(),
                value: cap,
            });
        }
        self.check_range("targets.accuracy", self.targets.accuracy, (0.0, 1.0))?;
        self.check_range(
            "targets.productivity",
            self.targets.productivity,
            (0.0, f64::MAX),
        )?;
        self.check_range(
            "targets.timing_percentile",
            self.targets.timing_percentile,
            (0.0, 1.0),
        )
    }

    /// Validate and freeze the definition.
    ///
    /// Checks run in order: name, interaction rules, dimension completeness,
    /// constraint and target ranges.
    pub fn build(self) -> Result<ArchetypeDefinition> {
        if self.name.trim().is_empty() {
            return Err(ConfigurationError::EmptyName);
        }
        self.validate_interactions()?;
        if let Some(&dimension) = Dimension::all().iter().find(|d| !self.is_declared(**d)) {
            return Err(ConfigurationError::MissingDimension {
                archetype: self.name,
                dimension,
            });
        }
        self.validate_ranges()?;

        match (
            self.accuracy,
            self.timing,
            self.coverage,
            self.bias,
            self.productivity,
        ) {
            (Some(accuracy), Some(timing), Some(coverage), Some(bias), Some(productivity)) => {
                Ok(ArchetypeDefinition {
                    name: self.name,
                    description: self.description,
                    accuracy,
                    timing,
                    coverage,
                    bias,
                    productivity,
                    interactions: self.interactions,
                    constraints: self.constraints,
                    targets: self.targets,
                })
            }
            _ => Err(ConfigurationError::MissingDimension {
                archetype: self.name,
                dimension: Dimension::Accuracy,
            }),
        }
    }
}
