//! Cognitive bias policy: how an analyst's published number drifts from
//! their unbiased estimate.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError, check_range, check_unit};

const COMPONENT: &str = "bias";

/// Kind of systematic distortion an analyst exhibits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BiasType {
    /// Sticks to their own previous number.
    AnchoringPrior,
    /// Gravitates toward the street consensus.
    AnchoringConsensus,
    /// Extrapolates the latest move.
    MomentumChaser,
    /// Leans away from consensus.
    Contrarian,
    /// Makes bolder calls than the evidence supports.
    Overconfident,
    /// Hedges toward the anchor.
    Underconfident,
}

/// Declarative bias parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasParams {
    pub bias_type: BiasType,
    /// Base strength of the distortion (0.0 to 1.0).
    pub strength: f64,
    /// Added to stated confidence (-0.5 to 0.5).
    pub overconfidence_factor: f64,
    /// How much low rolling confidence amplifies the bias (0.0 to 1.0).
    pub confidence_sensitivity: f64,
}

impl Default for BiasParams {
    fn default() -> Self {
        Self {
            bias_type: BiasType::AnchoringConsensus,
            strength: 0.3,
            overconfidence_factor: 0.0,
            confidence_sensitivity: 0.5,
        }
    }
}

/// Values a bias can anchor to or react against.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BiasContext {
    /// Analyst's own previous value for this security.
    pub prior: Option<f64>,
    /// Current consensus value for this security.
    pub consensus: Option<f64>,
    /// Analyst's rolling confidence (0.0 to 1.0).
    pub confidence: f64,
    /// Multiplier from interaction rules (1.0 = none).
    pub strength_scale: f64,
}

impl BiasContext {
    pub fn new(prior: Option<f64>, consensus: Option<f64>, confidence: f64) -> Self {
        Self {
            prior,
            consensus,
            confidence,
            strength_scale: 1.0,
        }
    }
}

/// Validated bias policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "BiasParams", into = "BiasParams")]
pub struct BiasBehavior {
    params: BiasParams,
}

impl BiasBehavior {
    pub fn new(params: BiasParams) -> Result<Self> {
        check_unit(COMPONENT, "strength", params.strength)?;
        check_range(
            COMPONENT,
            "overconfidence_factor",
            params.overconfidence_factor,
            -0.5,
            0.5,
        )?;
        check_unit(
            COMPONENT,
            "confidence_sensitivity",
            params.confidence_sensitivity,
        )?;
        Ok(Self { params })
    }

    pub fn with_type(bias_type: BiasType, strength: f64) -> Result<Self> {
        Self::new(BiasParams {
            bias_type,
            strength,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &BiasParams {
        &self.params
    }

    pub fn bias_type(&self) -> BiasType {
        self.params.bias_type
    }

    pub fn strength(&self) -> f64 {
        self.params.strength
    }

    /// Strength after confidence and interaction scaling, in `[0, 1]`.
    ///
    /// Confidence below 0.5 amplifies the bias, above 0.5 weakens it.
    pub fn effective_strength(&self, ctx: &BiasContext) -> f64 {
        let confidence = ctx.confidence.clamp(0.0, 1.0);
        let swing = self.params.confidence_sensitivity * (0.5 - confidence) * 2.0;
        let scale = if ctx.strength_scale.is_finite() {
            ctx.strength_scale.max(0.0)
        } else {
            1.0
        };
        (self.params.strength * (1.0 + swing) * scale).clamp(0.0, 1.0)
    }

    /// Apply the directional distortion to an unbiased estimate.
    ///
    /// Returns `raw` unchanged when the relevant anchor is missing.
    pub fn adjust(&self, raw: f64, ctx: &BiasContext) -> f64 {
        let s = self.effective_strength(ctx);
        let anchor = ctx.consensus.or(ctx.prior);
        match self.params.bias_type {
            BiasType::AnchoringPrior => match ctx.prior {
                Some(prior) => raw + s * (prior - raw),
                None => raw,
            },
            BiasType::AnchoringConsensus => match ctx.consensus {
                Some(consensus) => raw + s * (consensus - raw),
                None => raw,
            },
            BiasType::MomentumChaser => match ctx.prior {
                Some(prior) => raw + s * (raw - prior),
                None => raw,
            },
            BiasType::Contrarian => match ctx.consensus {
                Some(consensus) => raw + s * (raw - consensus),
                None => raw,
            },
            BiasType::Overconfident => match anchor {
                Some(anchor) => raw + s * (raw - anchor),
                None => raw,
            },
            BiasType::Underconfident => match anchor {
                Some(anchor) => raw + s * (anchor - raw),
                None => raw,
            },
        }
    }

    /// Shift stated confidence by the overconfidence factor.
    pub fn adjust_confidence(&self, confidence: f64) -> f64 {
        (confidence + self.params.overconfidence_factor).clamp(0.0, 1.0)
    }
}

impl TryFrom<BiasParams> for BiasBehavior {
    type Error = ValidationError;

    fn try_from(params: BiasParams) -> Result<Self> {
        Self::new(params)
    }
}

impl From<BiasBehavior> for BiasParams {
    fn from(behavior: BiasBehavior) -> Self {
        behavior.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_anchoring_moves_toward_anchor() {
        let bias = BiasBehavior::new(BiasParams {
            bias_type: BiasType::AnchoringConsensus,
            strength: 0.5,
            confidence_sensitivity: 0.0,
            ..Default::default()
        })
        .unwrap();
        let ctx = BiasContext::new(None, Some(100.0), 0.5);
        assert!((bias.adjust(120.0, &ctx) - 110.0).abs() < EPS);
    }

    #[test]
    fn test_contrarian_moves_away_from_consensus() {
        let bias = BiasBehavior::new(BiasParams {
            bias_type: BiasType::Contrarian,
            strength: 0.5,
            confidence_sensitivity: 0.0,
            ..Default::default()
        })
        .unwrap();
        let ctx = BiasContext::new(None, Some(100.0), 0.5);
        assert!((bias.adjust(120.0, &ctx) - 130.0).abs() < EPS);
        assert!((bias.adjust(80.0, &ctx) - 70.0).abs() < EPS);
    }

    #[test]
    fn test_missing_anchor_is_identity() {
        let bias = BiasBehavior::with_type(BiasType::AnchoringPrior, 0.9).unwrap();
        let ctx = BiasContext::new(None, Some(50.0), 0.2);
        assert_eq!(bias.adjust(42.0, &ctx), 42.0);
    }

    #[test]
    fn test_low_confidence_anchors_harder() {
        let bias = BiasBehavior::new(BiasParams {
            bias_type: BiasType::AnchoringPrior,
            strength: 0.4,
            confidence_sensitivity: 1.0,
            ..Default::default()
        })
        .unwrap();
        let low = bias.effective_strength(&BiasContext::new(Some(1.0), None, 0.1));
        let high = bias.effective_strength(&BiasContext::new(Some(1.0), None, 0.9));
        assert!(low > high);
    }

    #[test]
    fn test_adjust_confidence_clamps() {
        let bias = BiasBehavior::new(BiasParams {
            overconfidence_factor: 0.3,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(bias.adjust_confidence(0.9), 1.0);
        assert!((bias.adjust_confidence(0.4) - 0.7).abs() < EPS);
    }

    #[test]
    fn test_rejects_strength_above_one() {
        let err = BiasBehavior::with_type(BiasType::Contrarian, 1.5).unwrap_err();
        assert_eq!(err.parameter, "strength");
    }
}
