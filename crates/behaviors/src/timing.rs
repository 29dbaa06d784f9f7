//! Timing policy: whether an analyst reacts to an event, and how fast.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use types::EventType;

use crate::distributions;
use crate::error::{Result, ValidationError, check_positive, check_range, check_span, check_unit};

const COMPONENT: &str = "timing";

/// Share of the delay position driven by consensus relationship; the rest is noise.
const RELATIONSHIP_WEIGHT: f64 = 0.75;

/// Declarative timing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingParams {
    /// -1.0 = always leads consensus, +1.0 = always follows.
    pub consensus_relationship: f64,
    /// Response delay in days, `(min, max)`.
    pub response_delay_days: (f64, f64),
    /// Minimum absolute event magnitude that triggers a reaction.
    pub event_sensitivity_threshold: f64,
    /// Relative publication frequency (1.0 = normal).
    pub publication_frequency: f64,
    /// Response probability at exactly the threshold.
    pub base_response_rate: f64,
    /// Per-event-type speed multipliers (>1.0 reacts faster).
    pub event_speed: BTreeMap<EventType, f64>,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            consensus_relationship: 0.0,
            response_delay_days: (1.0, 5.0),
            event_sensitivity_threshold: 0.05,
            publication_frequency: 1.0,
            base_response_rate: 0.6,
            event_speed: BTreeMap::new(),
        }
    }
}

/// Outcome of a respond/delay draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingDecision {
    pub will_respond: bool,
    /// Delay after the event, in days. Meaningful only when `will_respond`.
    pub delay_days: f64,
}

/// Validated timing policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TimingParams", into = "TimingParams")]
pub struct TimingBehavior {
    params: TimingParams,
}

impl TimingBehavior {
    pub fn new(params: TimingParams) -> Result<Self> {
        check_range(
            COMPONENT,
            "consensus_relationship",
            params.consensus_relationship,
            -1.0,
            1.0,
        )?;
        check_span(COMPONENT, "response_delay_days", params.response_delay_days, 0.0)?;
        check_unit(
            COMPONENT,
            "event_sensitivity_threshold",
            params.event_sensitivity_threshold,
        )?;
        check_positive(COMPONENT, "publication_frequency", params.publication_frequency)?;
        if !(params.base_response_rate > 0.0 && params.base_response_rate <= 1.0) {
            return Err(ValidationError::new(
                COMPONENT,
                "base_response_rate",
                params.base_response_rate,
                "must be within (0, 1]",
            ));
        }
        for (event_type, speed) in &params.event_speed {
            check_positive(COMPONENT, &format!("event_speed[{event_type:?}]"), *speed)?;
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &TimingParams {
        &self.params
    }

    pub fn consensus_relationship(&self) -> f64 {
        self.params.consensus_relationship
    }

    pub fn publication_frequency(&self) -> f64 {
        self.params.publication_frequency
    }

    /// Days of silence before a catch-up note is considered. Frequent
    /// publishers break silence sooner.
    pub fn silence_before_catch_up(&self, max_silence_days: f64) -> f64 {
        max_silence_days / self.params.publication_frequency
    }

    /// Whether an event of this magnitude crosses the sensitivity threshold.
    pub fn is_relevant(&self, magnitude: f64) -> bool {
        magnitude.abs() >= self.params.event_sensitivity_threshold
    }

    /// Probability of responding to an event of this magnitude.
    ///
    /// Zero below the threshold, the base rate at the threshold, rising
    /// linearly to 1.0 at magnitude 1.0.
    pub fn response_probability(&self, magnitude: f64) -> f64 {
        if !self.is_relevant(magnitude) {
            return 0.0;
        }
        let threshold = self.params.event_sensitivity_threshold;
        let base = self.params.base_response_rate;
        let headroom = 1.0 - threshold;
        let excess = if headroom > 0.0 {
            ((magnitude.abs() - threshold) / headroom).min(1.0)
        } else {
            1.0
        };
        base + (1.0 - base) * excess
    }

    fn speed(&self, event_type: EventType) -> f64 {
        self.params
            .event_speed
            .get(&event_type)
            .copied()
            .unwrap_or(1.0)
    }

    /// Draw whether to respond and with what delay.
    ///
    /// The position within the delay range is mostly fixed by
    /// `consensus_relationship` (leaders near `min`, followers near `max`)
    /// with a quarter of the range left to noise. `delay_scale` carries
    /// interaction-rule adjustments (e.g. confidence shortening delays).
    pub fn sample_response<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        magnitude: f64,
        event_type: EventType,
        delay_scale: f64,
    ) -> TimingDecision {
        let probability = self.response_probability(magnitude);
        let will_respond = distributions::chance(rng, probability);
        if !will_respond {
            return TimingDecision {
                will_respond,
                delay_days: 0.0,
            };
        }

        let (min, max) = self.params.response_delay_days;
        let position = (1.0 + self.params.consensus_relationship) / 2.0;
        let noise: f64 = rng.random();
        let fraction = RELATIONSHIP_WEIGHT * position + (1.0 - RELATIONSHIP_WEIGHT) * noise;
        let raw = min + (max - min) * fraction;
        let scale = if delay_scale.is_finite() && delay_scale > 0.0 {
            delay_scale
        } else {
            1.0
        };

        TimingDecision {
            will_respond,
            delay_days: (raw / self.speed(event_type) * scale).max(0.0),
        }
    }
}

impl TryFrom<TimingParams> for TimingBehavior {
    type Error = ValidationError;

    fn try_from(params: TimingParams) -> Result<Self> {
        Self::new(params)
    }
}

impl From<TimingBehavior> for TimingParams {
    fn from(behavior: TimingBehavior) -> Self {
        behavior.params
    }
}
