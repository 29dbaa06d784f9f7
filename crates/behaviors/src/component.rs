//! Behavior dimensions and the tagged union over the five policies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{AccuracyBehavior, BiasBehavior, CoverageBehavior, ProductivityBehavior, TimingBehavior};

/// One of the five behavioral axes an archetype composes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Accuracy,
    Timing,
    Coverage,
    Bias,
    Productivity,
}

/// Name table used for parsing dimension names in config files.
const DIMENSION_NAMES: &[(&str, Dimension)] = &[
    ("accuracy", Dimension::Accuracy),
    ("timing", Dimension::Timing),
    ("coverage", Dimension::Coverage),
    ("bias", Dimension::Bias),
    ("productivity", Dimension::Productivity),
];

impl Dimension {
    pub fn all() -> &'static [Dimension] {
        &[
            Dimension::Accuracy,
            Dimension::Timing,
            Dimension::Coverage,
            Dimension::Bias,
            Dimension::Productivity,
        ]
    }

    pub fn name(self) -> &'static str {
        DIMENSION_NAMES
            .iter()
            .find(|(_, d)| *d == self)
            .map(|(name, _)| *name)
            .unwrap_or("unknown")
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized dimension name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown behavior dimension '{0}'")]
pub struct UnknownDimension(pub String);

impl FromStr for Dimension {
    type Err = UnknownDimension;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        DIMENSION_NAMES
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, d)| *d)
            .ok_or_else(|| UnknownDimension(s.to_string()))
    }
}

/// Any one behavior policy, tagged by its dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "params", rename_all = "snake_case")]
pub enum BehaviorComponent {
    Accuracy(AccuracyBehavior),
    Timing(TimingBehavior),
    Coverage(CoverageBehavior),
    Bias(BiasBehavior),
    Productivity(ProductivityBehavior),
}

impl BehaviorComponent {
    pub fn dimension(&self) -> Dimension {
        match self {
            BehaviorComponent::Accuracy(_) => Dimension::Accuracy,
            BehaviorComponent::Timing(_) => Dimension::Timing,
            BehaviorComponent::Coverage(_) => Dimension::Coverage,
            BehaviorComponent::Bias(_) => Dimension::Bias,
            BehaviorComponent::Productivity(_) => Dimension::Productivity,
        }
    }
}

impl From<AccuracyBehavior> for BehaviorComponent {
    fn from(b: AccuracyBehavior) -> Self {
        BehaviorComponent::Accuracy(b)
    }
}

impl From<TimingBehavior> for BehaviorComponent {
    fn from(b: TimingBehavior) -> Self {
        BehaviorComponent::Timing(b)
    }
}

impl From<CoverageBehavior> for BehaviorComponent {
    fn from(b: CoverageBehavior) -> Self {
        BehaviorComponent::Coverage(b)
    }
}

impl From<BiasBehavior> for BehaviorComponent {
    fn from(b: BiasBehavior) -> Self {
        BehaviorComponent::Bias(b)
    }
}

impl From<ProductivityBehavior> for BehaviorComponent {
    fn from(b: ProductivityBehavior) -> Self {
        BehaviorComponent::Productivity(b)
    }
}
