//! Accuracy policy: how far an analyst's published numbers land from the truth.
//!
//! The engine knows realized outcomes in hindsight. Accuracy is modeled as a
//! controlled distortion of that truth: the policy draws a signed relative
//! error whose typical magnitude is `1 - accuracy`.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use types::Sector;

use crate::distributions;
use crate::error::{Result, check_range, check_unit};

const COMPONENT: &str = "accuracy";

/// Forecasts at or below this horizon use the short-term adjustment.
pub const SHORT_TERM_DAYS: f64 = 90.0;
/// Forecasts at or below this horizon (and above short-term) use the medium-term adjustment.
pub const MEDIUM_TERM_DAYS: f64 = 365.0;

// =============================================================================
// AccuracyParams
// =============================================================================

/// Declarative accuracy parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccuracyParams {
    /// Mean accuracy (0.0 to 1.0). Typical error magnitude is `1 - mean`.
    pub mean: f64,
    /// Standard deviation of the error magnitude.
    pub std: f64,
    /// Additive accuracy modifier per sector (-1.0 to 1.0).
    pub sector_modifiers: BTreeMap<Sector, f64>,
    /// How closely stated confidence tracks realized accuracy (0.0 to 1.0).
    pub confidence_correlation: f64,
    /// Systematic over (+) / under (-) estimation added to every error.
    pub estimate_precision_bias: f64,
    /// Accuracy adjustment for horizons up to 90 days.
    pub short_term_adjustment: f64,
    /// Accuracy adjustment for horizons up to 365 days.
    pub medium_term_adjustment: f64,
    /// Accuracy adjustment for longer horizons.
    pub long_term_adjustment: f64,
}

impl Default for AccuracyParams {
    fn default() -> Self {
        Self {
            mean: 0.6,
            std: 0.1,
            sector_modifiers: BTreeMap::new(),
            confidence_correlation: 0.7,
            estimate_precision_bias: 0.0,
            short_term_adjustment: 0.0,
            medium_term_adjustment: 0.0,
            long_term_adjustment: 0.0,
        }
    }
}

// =============================================================================
// AccuracyBehavior
// =============================================================================

/// Inputs that modulate a single error draw.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AccuracyContext {
    /// Sector of the security being forecast.
    pub sector: Option<Sector>,
    /// Forecast horizon in days.
    pub horizon_days: f64,
    /// Accuracy points removed by interaction rules (e.g. bias, workload).
    pub dampening: f64,
}

/// A truth value after distortion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Perturbation {
    /// Published value.
    pub value: f64,
    /// Signed relative error applied to the truth.
    pub error: f64,
}

/// Validated accuracy policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AccuracyParams", into = "AccuracyParams")]
pub struct AccuracyBehavior {
    params: AccuracyParams,
}

impl AccuracyBehavior {
    /// Validate parameters and build the policy.
    pub fn new(params: AccuracyParams) -> Result<Self> {
        check_unit(COMPONENT, "mean", params.mean)?;
        check_range(COMPONENT, "std", params.std, 0.0, 1.0)?;
        check_unit(
            COMPONENT,
            "confidence_correlation",
            params.confidence_correlation,
        )?;
        check_range(
            COMPONENT,
            "estimate_precision_bias",
            params.estimate_precision_bias,
            -0.5,
            0.5,
        )?;
        for (name, value) in [
            ("short_term_adjustment", params.short_term_adjustment),
            ("medium_term_adjustment", params.medium_term_adjustment),
            ("long_term_adjustment", params.long_term_adjustment),
        ] {
            check_range(COMPONENT, name, value, -0.5, 0.5)?;
        }
        for (sector, modifier) in &params.sector_modifiers {
            check_range(
                COMPONENT,
                &format!("sector_modifiers[{sector}]"),
                *modifier,
                -1.0,
                1.0,
            )?;
        }
        Ok(Self { params })
    }

    /// Convenience constructor for the two headline parameters.
    pub fn with_mean_std(mean: f64, std: f64) -> Result<Self> {
        Self::new(AccuracyParams {
            mean,
            std,
            ..Default::default()
        })
    }

    pub fn params(&self) -> &AccuracyParams {
        &self.params
    }

    pub fn mean(&self) -> f64 {
        self.params.mean
    }

    pub fn confidence_correlation(&self) -> f64 {
        self.params.confidence_correlation
    }

    fn horizon_adjustment(&self, horizon_days: f64) -> f64 {
        if horizon_days <= SHORT_TERM_DAYS {
            self.params.short_term_adjustment
        } else if horizon_days <= MEDIUM_TERM_DAYS {
            self.params.medium_term_adjustment
        } else {
            self.params.long_term_adjustment
        }
    }

    /// Accuracy after sector, horizon, and interaction adjustments, in `[0, 1]`.
    pub fn effective_accuracy(&self, ctx: &AccuracyContext) -> f64 {
        let sector_mod = ctx
            .sector
            .and_then(|s| self.params.sector_modifiers.get(&s).copied())
            .unwrap_or(0.0);
        (self.params.mean + sector_mod + self.horizon_adjustment(ctx.horizon_days) - ctx.dampening)
            .clamp(0.0, 1.0)
    }

    /// Draw a signed relative error.
    ///
    /// Magnitude is `|N(1 - accuracy, std)|`, the sign is a fair coin, and the
    /// precision bias is added on top. Deterministic for a given RNG state.
    pub fn sample_error<R: Rng + ?Sized>(&self, rng: &mut R, ctx: &AccuracyContext) -> f64 {
        let center = 1.0 - self.effective_accuracy(ctx);
        let magnitude = distributions::folded_normal(rng, center, self.params.std);
        let sign = distributions::sign(rng);
        sign * magnitude + self.params.estimate_precision_bias
    }

    /// Distort a known-in-hindsight truth.
    ///
    /// The published value never drops below 1% of the truth, so a price
    /// target stays positive even for extreme draws.
    pub fn perturb<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        truth: f64,
        ctx: &AccuracyContext,
    ) -> Perturbation {
        let error = self.sample_error(rng, ctx);
        Perturbation {
            value: truth * (1.0 + error).max(0.01),
            error,
        }
    }

    /// Stated confidence (0.0 to 1.0) for a draw with the given error.
    ///
    /// With correlation 1.0 confidence is exactly `1 - |error|`; with 0.0 it
    /// is pure noise.
    pub fn confidence_for<R: Rng + ?Sized>(&self, rng: &mut R, error: f64) -> f64 {
        let corr = self.params.confidence_correlation;
        let signal = 1.0 - error.abs().min(1.0);
        let noise: f64 = rng.random();
        (corr * signal + (1.0 - corr) * noise).clamp(0.0, 1.0)
    }
}

impl TryFrom<AccuracyParams> for AccuracyBehavior {
    type Error = crate::ValidationError;

    fn try_from(params: AccuracyParams) -> Result<Self> {
        Self::new(params)
    }
}

impl From<AccuracyBehavior> for AccuracyParams {
    fn from(behavior: AccuracyBehavior) -> Self {
        behavior.params
    }
}
