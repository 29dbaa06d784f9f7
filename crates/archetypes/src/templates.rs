//! Built-in archetype templates.
//!
//! | Template | Accuracy | Timing | Coverage | Bias |
//! |----------|----------|--------|----------|------|
//! | Oracle | high (0.75) | early mover | 8 of 12, deep | anchors on own prior, overconfident |
//! | Follower | medium (0.55) | trails consensus | 15 of 18 | anchors on consensus |
//! | Sprayer | medium-low (0.48) | fast, reactive | 25 of 35, broad | overconfident |
//! | Specialist | 0.68, +0.15 in tech | steady | 12 of 15, tech-focused | anchors on own prior |
//! | Contrarian | 0.58 | leads | 10 of 15 | leans against consensus |

use std::collections::BTreeMap;

use behaviors::{
    AccuracyBehavior, AccuracyParams, BiasBehavior, BiasParams, BiasType, CoverageBehavior,
    CoverageParams, Dimension, ProductivityBehavior, ProductivityParams, TimingBehavior,
    TimingParams,
};
use types::{EventType, Sector};

use crate::builder::ArchetypeBuilder;
use crate::definition::{ArchetypeDefinition, TargetRanges};
use crate::error::{ConfigurationError, Result};

/// Lift a behavior validation error into the archetype's configuration error.
fn behavior<T>(archetype: &str, result: behaviors::Result<T>) -> Result<T> {
    result.map_err(|source| ConfigurationError::Behavior {
        archetype: archetype.to_string(),
        source,
    })
}

/// High accuracy, independent, low volume but high impact.
pub fn oracle() -> Result<ArchetypeDefinition> {
    const NAME: &str = "Oracle";
    ArchetypeBuilder::new(NAME)
        .description("High accuracy, independent research, low volume but high impact")
        .accuracy(behavior(
            NAME,
            AccuracyBehavior::new(AccuracyParams {
                mean: 0.75,
                std: 0.15,
                confidence_correlation: 0.9,
                long_term_adjustment: 0.05,
                ..Default::default()
            }),
        )?)
        .timing(behavior(
            NAME,
            TimingBehavior::new(TimingParams {
                consensus_relationship: -0.3,
                response_delay_days: (0.0, 3.0),
                event_sensitivity_threshold: 0.08,
                publication_frequency: 0.6,
                base_response_rate: 0.7,
                event_speed: BTreeMap::from([(EventType::EarningsAnnouncement, 1.5)]),
            }),
        )?)
        .coverage(behavior(
            NAME,
            CoverageBehavior::new(CoverageParams {
                max_active_coverage: 12,
                ideal_coverage_size: 8,
                depth_vs_breadth_preference: 0.8,
                sector_concentration_limit: 0.5,
            }),
        )?)
        .bias(behavior(
            NAME,
            BiasBehavior::new(BiasParams {
                bias_type: BiasType::AnchoringPrior,
                strength: 0.2,
                overconfidence_factor: 0.2,
                confidence_sensitivity: 0.3,
            }),
        )?)
        .productivity(behavior(
            NAME,
            ProductivityBehavior::new(ProductivityParams {
                volume_target: 4.0,
                progression_speed_days: (14.0, 40.0),
                idea_completion_rate: 0.8,
                exit_rate: 0.1,
                burst_allowance: 1.5,
            }),
        )?)
        .interaction(Dimension::Accuracy, Dimension::Timing, 0.3)
        .interaction(Dimension::Coverage, Dimension::Productivity, 0.25)
        .targets(TargetRanges {
            accuracy: (0.6, 0.9),
            productivity: (0.5, 2.0),
            timing_percentile: (0.0, 0.4),
        })
        .build()
}

/// Consensus dependent, moderate accuracy, reactive publishing.
pub fn follower() -> Result<ArchetypeDefinition> {
    const NAME: &str = "Follower";
    ArchetypeBuilder::new(NAME)
        .description("Consensus dependent, moderate accuracy, reactive publishing")
        .accuracy(behavior(
            NAME,
            AccuracyBehavior::new(AccuracyParams {
                mean: 0.55,
                std: 0.12,
                confidence_correlation: 0.6,
                ..Default::default()
            }),
        )?)
        .timing(behavior(
            NAME,
            TimingBehavior::new(TimingParams {
                consensus_relationship: 0.6,
                response_delay_days: (1.0, 5.0),
                event_sensitivity_threshold: 0.05,
                publication_frequency: 1.0,
                base_response_rate: 0.6,
                event_speed: BTreeMap::new(),
            }),
        )?)
        .coverage(behavior(
            NAME,
            CoverageBehavior::new(CoverageParams {
                max_active_coverage: 18,
                ideal_coverage_size: 15,
                depth_vs_breadth_preference: 0.4,
                sector_concentration_limit: 0.6,
            }),
        )?)
        .bias(behavior(
            NAME,
            BiasBehavior::new(BiasParams {
                bias_type: BiasType::AnchoringConsensus,
                strength: 0.6,
                overconfidence_factor: -0.1,
                confidence_sensitivity: 0.7,
            }),
        )?)
        .productivity(behavior(
            NAME,
            ProductivityBehavior::new(ProductivityParams {
                volume_target: 6.0,
                progression_speed_days: (10.0, 30.0),
                idea_completion_rate: 0.7,
                exit_rate: 0.15,
                burst_allowance: 1.5,
            }),
        )?)
        .interaction(Dimension::Accuracy, Dimension::Bias, 0.5)
        .targets(TargetRanges {
            accuracy: (0.4, 0.7),
            productivity: (0.5, 2.0),
            timing_percentile: (0.5, 1.0),
        })
        .build()
}

/// High volume research, variable accuracy, rapid idea turnover.
pub fn sprayer() -> Result<ArchetypeDefinition> {
    const NAME: &str = "Sprayer";
    ArchetypeBuilder::new(NAME)
        .description("High volume research, variable accuracy, rapid idea turnover")
        .accuracy(behavior(
            NAME,
            AccuracyBehavior::new(AccuracyParams {
                mean: 0.48,
                std: 0.18,
                confidence_correlation: 0.5,
                estimate_precision_bias: 0.03,
                ..Default::default()
            }),
        )?)
        .timing(behavior(
            NAME,
            TimingBehavior::new(TimingParams {
                consensus_relationship: 0.2,
                response_delay_days: (0.0, 2.0),
                event_sensitivity_threshold: 0.03,
                publication_frequency: 2.0,
                base_response_rate: 0.8,
                event_speed: BTreeMap::new(),
            }),
        )?)
        .coverage(behavior(
            NAME,
            CoverageBehavior::new(CoverageParams {
                max_active_coverage: 35,
                ideal_coverage_size: 25,
                depth_vs_breadth_preference: 0.2,
                sector_concentration_limit: 0.4,
            }),
        )?)
        .bias(behavior(
            NAME,
            BiasBehavior::new(BiasParams {
                bias_type: BiasType::Overconfident,
                strength: 0.3,
                overconfidence_factor: 0.3,
                confidence_sensitivity: 0.4,
            }),
        )?)
        .productivity(behavior(
            NAME,
            ProductivityBehavior::new(ProductivityParams {
                volume_target: 14.0,
                progression_speed_days: (5.0, 15.0),
                idea_completion_rate: 0.55,
                exit_rate: 0.25,
                burst_allowance: 2.0,
            }),
        )?)
        .interaction(Dimension::Productivity, Dimension::Accuracy, 0.1)
        .interaction(Dimension::Bias, Dimension::Accuracy, 0.1)
        .targets(TargetRanges {
            accuracy: (0.3, 0.6),
            productivity: (0.8, 2.5),
            timing_percentile: (0.1, 0.6),
        })
        .build()
}

/// Sector-focused expert with deep domain knowledge.
pub fn specialist() -> Result<ArchetypeDefinition> {
    const NAME: &str = "Specialist";
    ArchetypeBuilder::new(NAME)
        .description("Sector-focused expert with deep domain knowledge")
        .accuracy(behavior(
            NAME,
            AccuracyBehavior::new(AccuracyParams {
                mean: 0.68,
                std: 0.13,
                sector_modifiers: BTreeMap::from([(Sector::InformationTechnology, 0.15)]),
                confidence_correlation: 0.75,
                ..Default::default()
            }),
        )?)
        .timing(behavior(
            NAME,
            TimingBehavior::new(TimingParams {
                consensus_relationship: 0.1,
                response_delay_days: (1.0, 3.0),
                event_sensitivity_threshold: 0.05,
                publication_frequency: 1.1,
                base_response_rate: 0.65,
                event_speed: BTreeMap::new(),
            }),
        )?)
        .coverage(behavior(
            NAME,
            CoverageBehavior::new(CoverageParams {
                max_active_coverage: 15,
                ideal_coverage_size: 12,
                depth_vs_breadth_preference: 0.6,
                sector_concentration_limit: 0.8,
            }),
        )?)
        .bias(behavior(
            NAME,
            BiasBehavior::new(BiasParams {
                bias_type: BiasType::AnchoringPrior,
                strength: 0.3,
                overconfidence_factor: 0.1,
                confidence_sensitivity: 0.3,
            }),
        )?)
        .productivity(behavior(
            NAME,
            ProductivityBehavior::new(ProductivityParams {
                volume_target: 7.0,
                progression_speed_days: (10.0, 25.0),
                idea_completion_rate: 0.75,
                exit_rate: 0.12,
                burst_allowance: 1.5,
            }),
        )?)
        .sector_whitelist([
            Sector::InformationTechnology,
            Sector::CommunicationServices,
        ])
        .targets(TargetRanges {
            accuracy: (0.55, 0.85),
            productivity: (0.5, 2.0),
            timing_percentile: (0.2, 0.7),
        })
        .build()
}

/// Leans against the street, often early, with uneven accuracy.
pub fn contrarian() -> Result<ArchetypeDefinition> {
    const NAME: &str = "Contrarian";
    ArchetypeBuilder::new(NAME)
        .description("Takes the other side of consensus, often early, uneven accuracy")
        .accuracy(behavior(
            NAME,
            AccuracyBehavior::new(AccuracyParams {
                mean: 0.58,
                std: 0.2,
                confidence_correlation: 0.5,
                long_term_adjustment: 0.05,
                short_term_adjustment: -0.05,
                ..Default::default()
            }),
        )?)
        .timing(behavior(
            NAME,
            TimingBehavior::new(TimingParams {
                consensus_relationship: -0.6,
                response_delay_days: (0.0, 4.0),
                event_sensitivity_threshold: 0.1,
                publication_frequency: 0.8,
                base_response_rate: 0.5,
                event_speed: BTreeMap::new(),
            }),
        )?)
        .coverage(behavior(
            NAME,
            CoverageBehavior::new(CoverageParams {
                max_active_coverage: 15,
                ideal_coverage_size: 10,
                depth_vs_breadth_preference: 0.6,
                sector_concentration_limit: 0.6,
            }),
        )?)
        .bias(behavior(
            NAME,
            BiasBehavior::new(BiasParams {
                bias_type: BiasType::Contrarian,
                strength: 0.4,
                overconfidence_factor: 0.15,
                confidence_sensitivity: 0.2,
            }),
        )?)
        .productivity(behavior(
            NAME,
            ProductivityBehavior::new(ProductivityParams {
                volume_target: 5.0,
                progression_speed_days: (12.0, 35.0),
                idea_completion_rate: 0.65,
                exit_rate: 0.15,
                burst_allowance: 1.5,
            }),
        )?)
        .interaction(Dimension::Bias, Dimension::Accuracy, 0.15)
        .targets(TargetRanges {
            accuracy: (0.35, 0.75),
            productivity: (0.5, 2.0),
            timing_percentile: (0.0, 0.5),
        })
        .build()
}
